//! # ESC/POS Protocol Implementation
//!
//! Command builders for the ESC/POS subset understood by most thermal
//! receipt printers, plus the session encoder that drives a sink with them.
//!
//! ## Module Structure
//!
//! - [`commands`]: Fixed commands (reset, feed, cut, cash drawer, line spacing)
//! - [`text`]: Justification, text styles and code pages
//! - [`cp437`]: IBM PC code page, which `encoding_rs` lacks
//! - [`graphics`]: GS v 0 raster images and ESC * strip transcoding
//! - [`barcode`]: 1D barcodes and the native QR command group
//! - [`encoder`]: Session encoder with style-change suppression
//!
//! ## Usage Example
//!
//! ```
//! use boleta::protocol::{commands, text};
//!
//! let mut data = Vec::new();
//! data.extend(commands::reset());
//! data.extend(text::align(text::Alignment::Center));
//! data.extend(text::Weight::Bold.command());
//! data.extend(b"RECEIPT\n");
//! data.extend(text::Weight::Normal.command());
//! data.extend(commands::feed_dots(80));
//! data.extend(commands::cut_partial());
//!
//! assert_eq!(&data[..5], &[0x1B, 0x40, 0x1B, 0x61, 0x01]);
//! ```

pub mod barcode;
pub mod commands;
pub mod cp437;
pub mod encoder;
pub mod graphics;
pub mod text;
