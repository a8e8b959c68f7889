//! # Boleta - ESC/POS Receipt Printing Library
//!
//! Boleta turns a small receipt markup language into the byte stream
//! understood by ESC/POS thermal printers. It provides:
//!
//! - **Markup parsing**: alignment columns, nested bold/underline/font styles
//! - **Layout**: exact space distribution on the printer's character grid
//! - **Protocol encoding**: text styles, raster and strip images, 1D barcodes, QR codes
//! - **Transport**: paced output to character devices, or to memory
//!
//! ## Quick Start
//!
//! ```no_run
//! use boleta::{Printer, PrinterProfile, transport::DeviceSink};
//!
//! let sink = DeviceSink::open("/dev/usb/lp0")?;
//! let mut printer = Printer::new(sink, PrinterProfile::mm80());
//!
//! printer.print_formatted_text_and_cut(
//!     "[C]<font size='big'>CAFE</font>\n\
//!      [L]Espresso[R]2.50\n\
//!      [L]Croissant[R]3.20\n\
//!      [L]<b>Total</b>[R]<b>5.70</b>\n\
//!      [C]<barcode type='ean13'>590123412345</barcode>",
//!     20.0,
//! )?;
//!
//! # Ok::<(), boleta::error::BoletaError>(())
//! ```
//!
//! ## Module Overview
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`markup`] | Markup parser and column layout |
//! | [`protocol`] | ESC/POS command builders and the session encoder |
//! | [`render`] | Bitmap dithering and QR scaling |
//! | [`printer`] | Printer profiles and the print session |
//! | [`transport`] | Byte sinks |
//! | [`error`] | Error types |

pub mod error;
pub mod markup;
pub mod printer;
pub mod protocol;
pub mod render;
pub mod transport;

// Re-exports for convenience
pub use error::BoletaError;
pub use printer::{Printer, PrinterProfile};
pub use transport::{MemorySink, Sink};
