//! # Protocol Encoder
//!
//! Session-scoped command stream over a [`Sink`]. The encoder remembers the
//! last value sent for each of the six text styles and only emits an opcode
//! when a run asks for something different.
//!
//! ## Disconnected Sinks
//!
//! Every operation checks [`Sink::is_connected`] first and returns `Ok(())`
//! without writing anything when the sink is down. Callers that need to know
//! whether a job actually reached the printer check [`ProtocolEncoder::is_connected`]
//! before and after printing.
//!
//! ## Flush Points
//!
//! | Operation | Flush |
//! |-----------|-------|
//! | `print_text`, `print_barcode`, `print_qr`, `set_align`, `reset` | none (buffered) |
//! | `print_image` | after every chunk |
//! | `new_line` | after the LF |
//! | `feed_paper(n)` | extra delay `n` ms |
//! | `cut_paper`, `open_cash_drawer` | extra delay 100 ms |
//! | `flush` | no extra delay |

use tracing::debug;

use super::barcode::{BarcodeSpec, qr};
use super::commands::{self, LF};
use super::graphics::RasterImage;
use super::text::{self, Alignment, Charset, TextStyle};
use crate::error::Result;
use crate::transport::Sink;

/// Settling time after a cut or drawer kick (milliseconds)
const MECHANICAL_DELAY_MS: u64 = 100;

/// Line feeds closing a charset test page
const CHARSET_TEST_LINES: usize = 4;

pub struct ProtocolEncoder<S: Sink> {
    sink: S,
    charset: Charset,
    current: Option<TextStyle>,
    strip_raster: bool,
}

impl<S: Sink> ProtocolEncoder<S> {
    pub fn new(sink: S, charset: Charset) -> Self {
        Self {
            sink,
            charset,
            current: None,
            strip_raster: false,
        }
    }

    pub fn is_connected(&self) -> bool {
        self.sink.is_connected()
    }

    pub fn charset(&self) -> &Charset {
        &self.charset
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    /// Print images as 24-row strips (ESC *) instead of one raster (GS v 0).
    ///
    /// Older printers lack the raster opcode.
    pub fn use_strip_raster(&mut self, enable: bool) {
        self.strip_raster = enable;
    }

    pub fn strip_raster(&self) -> bool {
        self.strip_raster
    }

    /// Release the sink. Later operations become no-ops.
    pub fn disconnect(&mut self) {
        self.sink.disconnect();
        self.current = None;
    }

    /// ESC @. The printer forgets every style, so the snapshot is dropped too.
    pub fn reset(&mut self) -> Result<()> {
        if !self.active("reset") {
            return Ok(());
        }
        self.sink.write(&commands::reset());
        self.current = None;
        Ok(())
    }

    /// Justification for text and barcodes. Images ignore it.
    pub fn set_align(&mut self, alignment: Alignment) -> Result<()> {
        if !self.active("set_align") {
            return Ok(());
        }
        self.sink.write(&text::align(alignment));
        Ok(())
    }

    /// Print a text run in the configured code page.
    ///
    /// The text is encoded before anything is written, so an unencodable
    /// run leaves the stream untouched.
    ///
    /// ## Example
    ///
    /// ```
    /// use boleta::protocol::encoder::ProtocolEncoder;
    /// use boleta::protocol::text::{Charset, TextStyle, Weight};
    /// use boleta::transport::{MemorySink, Sink};
    ///
    /// let mut encoder = ProtocolEncoder::new(MemorySink::new(), Charset::default());
    /// let bold = TextStyle { weight: Weight::Bold, ..TextStyle::default() };
    /// encoder.print_text("A", bold).unwrap();
    /// encoder.print_text("B", bold).unwrap();
    /// encoder.sink_mut().send(0).unwrap();
    ///
    /// assert_eq!(
    ///     encoder.sink().sent(),
    ///     &[
    ///         0x1B, 0x74, 0x06,
    ///         0x1D, 0x21, 0x00, 0x1B, 0x47, 0x00, 0x1B, 0x2D, 0x00,
    ///         0x1B, 0x45, 0x01, 0x1B, 0x72, 0x00, 0x1D, 0x42, 0x00,
    ///         b'A',
    ///         0x1B, 0x74, 0x06,
    ///         b'B',
    ///     ]
    /// );
    /// ```
    pub fn print_text(&mut self, text: &str, style: TextStyle) -> Result<()> {
        if !self.active("print_text") {
            return Ok(());
        }
        let bytes = self.charset.encode(text)?;

        self.sink.write(&self.charset.command());
        let previous = self.current;
        let changed = |pick: fn(&TextStyle) -> [u8; 3]| match previous {
            Some(ref current) => pick(current) != pick(&style),
            None => true,
        };

        let mut styles = Vec::new();
        if changed(|s| s.size.command()) {
            styles.extend(style.size.command());
        }
        if changed(|s| s.double_strike.command()) {
            styles.extend(style.double_strike.command());
        }
        if changed(|s| s.underline.command()) {
            styles.extend(style.underline.command());
        }
        if changed(|s| s.weight.command()) {
            styles.extend(style.weight.command());
        }
        if changed(|s| s.color.command()) {
            styles.extend(style.color.command());
        }
        if changed(|s| s.reverse.command()) {
            styles.extend(style.reverse.command());
        }
        self.sink.write(&styles);
        self.current = Some(style);

        self.sink.write(&bytes);
        Ok(())
    }

    /// Print a raster image, as one GS v 0 envelope or as strips.
    pub fn print_image(&mut self, image: &RasterImage) -> Result<()> {
        if !self.active("print_image") {
            return Ok(());
        }
        let chunks = if self.strip_raster {
            image.to_strips()?
        } else {
            vec![image.to_envelope()]
        };
        for chunk in chunks {
            self.sink.write(&chunk);
            self.sink.send(0)?;
        }
        Ok(())
    }

    /// Text position, module width, module height, then the code itself.
    pub fn print_barcode(&mut self, barcode: &BarcodeSpec) -> Result<()> {
        if !self.active("print_barcode") {
            return Ok(());
        }
        self.sink.write(&barcode.command());
        Ok(())
    }

    /// Print a QR code rendered by the printer firmware.
    ///
    /// `module_size` is clamped to 1..=16 dots.
    pub fn print_qr(&mut self, model: qr::QrModel, text: &str, module_size: i32) -> Result<()> {
        if !self.active("print_qr") {
            return Ok(());
        }
        self.sink.write(&qr::generate(model, text, module_size));
        Ok(())
    }

    /// LF and flush, then optionally set the justification of the next line.
    pub fn new_line(&mut self, alignment: Option<Alignment>) -> Result<()> {
        if !self.active("new_line") {
            return Ok(());
        }
        self.sink.write(&commands::lf());
        self.sink.send(0)?;
        if let Some(alignment) = alignment {
            self.sink.write(&text::align(alignment));
        }
        Ok(())
    }

    /// Feed `dots` dot lines. Zero does nothing.
    pub fn feed_paper(&mut self, dots: u32) -> Result<()> {
        if !self.active("feed_paper") || dots == 0 {
            return Ok(());
        }
        self.sink.write(&commands::feed_dots(dots));
        self.sink.send(u64::from(dots))
    }

    /// Send whatever is still buffered.
    pub fn flush(&mut self) -> Result<()> {
        if !self.active("flush") {
            return Ok(());
        }
        self.sink.send(0)
    }

    /// Partial cut
    pub fn cut_paper(&mut self) -> Result<()> {
        if !self.active("cut_paper") {
            return Ok(());
        }
        self.sink.write(&commands::cut_partial());
        self.sink.send(MECHANICAL_DELAY_MS)
    }

    pub fn open_cash_drawer(&mut self) -> Result<()> {
        if !self.active("open_cash_drawer") {
            return Ok(());
        }
        self.sink.write(&commands::open_cash_drawer());
        self.sink.send(MECHANICAL_DELAY_MS)
    }

    /// Print every code point of table `id` under a `:::: Charset n°<id> : ` label.
    ///
    /// The printer is left in default styles.
    pub fn print_charset_test(&mut self, id: u8) -> Result<()> {
        if !self.active("print_charset_test") {
            return Ok(());
        }
        let defaults = TextStyle::default();
        self.sink.write(&commands::select_charset(id));
        self.sink.write(&defaults.size.command());
        self.sink.write(&defaults.color.command());
        self.sink.write(&defaults.reverse.command());
        self.sink.write(&defaults.weight.command());
        self.sink.write(&defaults.underline.command());
        self.sink.write(&defaults.double_strike.command());
        self.sink.write(format!(":::: Charset n°{} : ", id).as_bytes());
        let table: Vec<u8> = (0..=u8::MAX).collect();
        self.sink.write(&table);
        self.sink.write(&[LF; CHARSET_TEST_LINES]);
        self.current = Some(defaults);
        self.sink.send(0)
    }

    fn active(&self, operation: &'static str) -> bool {
        let connected = self.sink.is_connected();
        if !connected {
            debug!(operation, "sink disconnected, skipping");
        }
        connected
    }
}

// ============================================================================
// TESTS
// ============================================================================
