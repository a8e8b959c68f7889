//! # Receipt Markup
//!
//! Parses the line-oriented receipt markup into [`Line`]s of [`Column`]s of
//! [`Element`]s, laid out on the profile's character grid.
//!
//! ## Syntax
//!
//! ```text
//! [L]left column[R]right column        alignment markers split columns
//! [C]<b>bold</b> <u>underlined</u>     <u type='double'> for double-strike
//! [L]<font size='big' color='red'>x</font>
//! [C]<img>1d763000...</img>            hex GS v 0 image (sole content)
//! [C]<barcode type='ean13' height='10'>590123412345</barcode>
//! [C]<qrcode size='20'>https://example.com</qrcode>
//! ```
//!
//! Font sizes are `normal`, `tall`, `wide`, `big` and `big-2` to `big-6`.
//! Colors are `black` and `red` (`bg-black` and `bg-red` are aliases).
//! Barcode types are `ean8`, `ean13`, `upca`, `upce`, `128` and `39`, with
//! `text='none|above|below'` and `width`/`height` in millimeters.
//!
//! Tags other than these print literally. Style tags may span lines.
//!
//! ## Example
//!
//! ```
//! use boleta::markup;
//! use boleta::printer::config::PrinterProfile;
//!
//! let profile = PrinterProfile::mm58();
//! let lines = markup::parse("[L]Coffee[R]<b>2.50</b>\n[C]Thanks!", &profile)?;
//!
//! assert_eq!(lines.len(), 2);
//! assert_eq!(lines[0].columns().len(), 2);
//! assert_eq!(lines[0].width(), 32);
//! assert_eq!(lines[1].width(), 32);
//! # Ok::<(), boleta::error::BoletaError>(())
//! ```

pub mod column;
pub mod element;
pub mod style;
pub mod tag;

use tracing::debug;

use crate::error::Result;
use crate::printer::config::PrinterProfile;
use crate::render::qr::{QrCodeSource, QrMatrixSource};

pub use column::{Column, LineCarry};
pub use element::Element;
pub use style::FormattingState;

use element::TextRun;

/// One input line.
#[derive(Debug, Clone, PartialEq)]
pub struct Line {
    columns: Vec<Column>,
    chars_per_column: usize,
    carry: LineCarry,
}

impl Line {
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn chars_per_column(&self) -> usize {
        self.chars_per_column
    }

    /// Remainder characters still undistributed after the last column
    pub fn chars_owed(&self) -> i64 {
        self.carry.chars_owed
    }

    /// Overflow left after the last column (zero or negative)
    pub fn overflow(&self) -> i64 {
        self.carry.overflow
    }

    /// Characters used by every column, padding included.
    pub fn width(&self) -> usize {
        self.columns.iter().map(Column::width).sum()
    }

    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.columns.iter().flat_map(|c| c.elements())
    }

    /// Whether printing the line must end with a line feed.
    ///
    /// Image, barcode and QR lines advance the paper by themselves.
    pub fn ends_with_text(&self) -> bool {
        self.elements().last().is_some_and(Element::is_text)
    }
}

/// Parser state for one document.
///
/// Formatting opened on one line stays active on the following lines until
/// it is closed.
pub struct MarkupParser<'a> {
    profile: &'a PrinterProfile,
    qr_source: &'a dyn QrMatrixSource,
    state: FormattingState,
}

impl<'a> MarkupParser<'a> {
    pub fn new(profile: &'a PrinterProfile) -> Self {
        Self {
            profile,
            qr_source: &QrCodeSource,
            state: FormattingState::new(),
        }
    }

    /// Use another QR matrix generator for `<qrcode>` tags.
    pub fn with_qr_source(mut self, source: &'a dyn QrMatrixSource) -> Self {
        self.qr_source = source;
        self
    }

    /// Parse a whole document. Any error aborts the parse.
    pub fn parse(mut self, text: &str) -> Result<Vec<Line>> {
        let lines = split_lines(text)
            .into_iter()
            .map(|line| self.parse_line(line))
            .collect::<Result<Vec<_>>>()?;
        debug!(lines = lines.len(), "parsed receipt markup");
        Ok(lines)
    }

    fn parse_line(&mut self, line: &str) -> Result<Line> {
        let segments = column::split_columns(line);
        let count = segments.len();
        let chars_per_line = self.profile.chars_per_line();
        let chars_per_column = chars_per_line / count;
        let mut carry = LineCarry {
            chars_owed: (chars_per_line - chars_per_column * count) as i64,
            overflow: 0,
        };

        let mut columns = Vec::with_capacity(count);
        for segment in segments {
            columns.push(Column::parse(
                segment,
                count == 1,
                chars_per_column,
                &mut carry,
                self,
            )?);
        }

        Ok(Line {
            columns,
            chars_per_column,
            carry,
        })
    }

    /// Text run in the current style.
    fn text_run(&self, text: &str) -> Result<Element> {
        TextRun::new(text, self.state.current(), self.profile).map(Element::Text)
    }
}

/// Parse `text` for `profile`, rendering QR codes with the `qrcode` crate.
pub fn parse(text: &str, profile: &PrinterProfile) -> Result<Vec<Line>> {
    MarkupParser::new(profile).parse(text)
}

/// Split on `\n` and `\r\n`.
fn split_lines(text: &str) -> Vec<&str> {
    let mut lines = Vec::new();
    let mut rest = text;
    while let Some(end) = rest.find('\n') {
        let line = &rest[..end];
        lines.push(line.strip_suffix('\r').unwrap_or(line));
        rest = &rest[end + 1..];
    }
    lines.push(rest);
    lines
}

// ============================================================================
// TESTS
// ============================================================================
