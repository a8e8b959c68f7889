//! # Printer Module
//!
//! A [`Printer`] ties a [`PrinterProfile`] to a [`Sink`] and prints receipt
//! markup on it.
//!
//! ## Modules
//!
//! - [`config`]: Printer geometry, presets and profile files
//!
//! ## Print Sequence
//!
//! ```text
//! parse (nothing is sent if this fails)
//! ESC @
//! for each line: emit elements, LF if the line ends with text
//! ESC J feed (or a bare flush when the feed is zero)
//! [GS V 1 cut] [ESC p drawer kick]
//! ```
//!
//! A print job that fails halfway leaves the paper in an unknown state.
//! Nothing is retried; the next job starts with a reset.

pub mod config;

use tracing::{debug, instrument};

use crate::error::Result;
use crate::markup;
use crate::protocol::encoder::ProtocolEncoder;
use crate::transport::Sink;

pub use config::PrinterProfile;

/// Feed after a receipt when none is given (millimeters)
pub const DEFAULT_FEED_MM: f32 = 20.0;

/// # Printer Session
///
/// ## Example
///
/// ```
/// use boleta::printer::{Printer, PrinterProfile};
/// use boleta::transport::MemorySink;
///
/// let mut printer = Printer::new(MemorySink::new(), PrinterProfile::mm58());
/// printer.print_formatted_text_and_cut("[C]<b>Hello</b>", 10.0)?;
///
/// let sent = printer.sink().sent();
/// assert_eq!(&sent[..2], &[0x1B, 0x40]);
/// assert_eq!(&sent[sent.len() - 3..], &[0x1D, 0x56, 0x01]);
/// # Ok::<(), boleta::error::BoletaError>(())
/// ```
pub struct Printer<S: Sink> {
    profile: PrinterProfile,
    encoder: ProtocolEncoder<S>,
}

impl<S: Sink> Printer<S> {
    pub fn new(sink: S, profile: PrinterProfile) -> Self {
        let encoder = ProtocolEncoder::new(sink, *profile.charset());
        Self { profile, encoder }
    }

    pub fn profile(&self) -> &PrinterProfile {
        &self.profile
    }

    pub fn encoder_mut(&mut self) -> &mut ProtocolEncoder<S> {
        &mut self.encoder
    }

    pub fn sink(&self) -> &S {
        self.encoder.sink()
    }

    pub fn into_sink(self) -> S {
        self.encoder.into_sink()
    }

    pub fn is_connected(&self) -> bool {
        self.encoder.is_connected()
    }

    /// See [`ProtocolEncoder::use_strip_raster`].
    pub fn use_strip_raster(&mut self, enable: bool) {
        self.encoder.use_strip_raster(enable);
    }

    /// Release the sink. Every later print is a no-op.
    pub fn disconnect(&mut self) {
        self.encoder.disconnect();
    }

    /// Print markup and feed [`DEFAULT_FEED_MM`].
    pub fn print_formatted_text(&mut self, text: &str) -> Result<()> {
        self.print_formatted_text_mm(text, DEFAULT_FEED_MM)
    }

    pub fn print_formatted_text_mm(&mut self, text: &str, feed_mm: f32) -> Result<()> {
        let dots = self.feed_dots(feed_mm);
        self.print_formatted_text_dots(text, dots)
    }

    /// Print markup, then feed `feed_dots` dot lines.
    ///
    /// Without a feed the buffer is flushed explicitly, so a trailing
    /// barcode or native QR code still reaches the printer.
    #[instrument(skip(self, text), fields(chars = text.len()))]
    pub fn print_formatted_text_dots(&mut self, text: &str, feed_dots: u32) -> Result<()> {
        let lines = markup::parse(text, &self.profile)?;

        self.encoder.reset()?;
        for line in &lines {
            for element in line.elements() {
                element.emit(&mut self.encoder)?;
            }
            if line.ends_with_text() {
                self.encoder.new_line(None)?;
            }
        }
        if feed_dots > 0 {
            self.encoder.feed_paper(feed_dots)?;
        } else {
            self.encoder.flush()?;
        }

        debug!(lines = lines.len(), "receipt printed");
        Ok(())
    }

    /// Print, feed `feed_mm` and cut.
    pub fn print_formatted_text_and_cut(&mut self, text: &str, feed_mm: f32) -> Result<()> {
        self.print_formatted_text_mm(text, feed_mm)?;
        self.encoder.cut_paper()
    }

    /// Print, feed `feed_mm`, cut and open the cash drawer.
    pub fn print_formatted_text_and_open_cash_drawer(
        &mut self,
        text: &str,
        feed_mm: f32,
    ) -> Result<()> {
        self.print_formatted_text_and_cut(text, feed_mm)?;
        self.encoder.open_cash_drawer()
    }

    pub fn print_charset_test(&mut self, id: u8) -> Result<()> {
        self.encoder.print_charset_test(id)
    }

    #[instrument(skip(self))]
    pub fn print_charset_tests(&mut self, ids: &[u8]) -> Result<()> {
        for &id in ids {
            self.encoder.print_charset_test(id)?;
        }
        Ok(())
    }

    /// Test page for every table id, 0 through 255.
    pub fn print_all_charset_tests(&mut self) -> Result<()> {
        let ids: Vec<u8> = (0..=u8::MAX).collect();
        self.print_charset_tests(&ids)
    }

    fn feed_dots(&self, mm: f32) -> u32 {
        self.profile.mm_to_px(mm).max(0) as u32
    }
}

// ============================================================================
// TESTS
// ============================================================================
