//! # ESC/POS Text Styling Commands
//!
//! Text formatting commands and the code page used to encode text bytes.
//!
//! ## Text Styling Overview
//!
//! | Style | Command | Values |
//! |-------|---------|--------|
//! | Size | GS ! n | width/height nibbles |
//! | Bold | ESC E n | off, on |
//! | Underline | ESC - n | off, 1-dot, 2-dot |
//! | Double strike | ESC G n | off, on |
//! | Color | ESC r n | black, red |
//! | Reverse | GS B n | off, on |
//!
//! Each style is a small closed enum whose discriminant is the parameter
//! byte, so a [`TextStyle`] can be compared field by field to suppress
//! redundant commands.
//!
//! ## Text Alignment
//!
//! ```text
//! Left aligned (default)    |LEFT TEXT
//! Center aligned            |  CENTER TEXT
//! Right aligned             |      RIGHT TEXT
//! ```

use encoding_rs::Encoding;

use super::commands::{ESC, GS};
use super::cp437;
use crate::error::{BoletaError, Result};

// ============================================================================
// TEXT ALIGNMENT
// ============================================================================

/// Text alignment options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Alignment {
    #[default]
    Left = 0,
    Center = 1,
    Right = 2,
}

impl Alignment {
    /// Resolve the letter inside an `[L]`/`[C]`/`[R]` marker, ignoring case.
    pub fn from_marker(letter: char) -> Option<Self> {
        match letter.to_ascii_uppercase() {
            'L' => Some(Self::Left),
            'C' => Some(Self::Center),
            'R' => Some(Self::Right),
            _ => None,
        }
    }
}

/// # Set Justification (ESC a n)
///
/// Applies to text and barcodes. Raster images ignore it, so they are
/// padded with white bytes instead.
///
/// ## Example
///
/// ```
/// use boleta::protocol::text::{align, Alignment};
///
/// assert_eq!(align(Alignment::Center), vec![0x1B, 0x61, 0x01]);
/// ```
pub fn align(alignment: Alignment) -> Vec<u8> {
    vec![ESC, b'a', alignment as u8]
}

// ============================================================================
// CHARACTER SIZE
// ============================================================================

/// Character size (GS ! n). High nibble is width, low nibble is height.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextSize {
    #[default]
    Normal = 0x00,
    /// Double height
    Tall = 0x01,
    /// Double width
    Wide = 0x10,
    /// Double width and height
    Big = 0x11,
    Big2 = 0x22,
    Big3 = 0x33,
    Big4 = 0x44,
    Big5 = 0x55,
    Big6 = 0x66,
}

impl TextSize {
    /// Parse a `<font size='...'>` value.
    pub fn from_attr(value: &str) -> Option<Self> {
        match value {
            "normal" => Some(Self::Normal),
            "tall" => Some(Self::Tall),
            "wide" => Some(Self::Wide),
            "big" => Some(Self::Big),
            "big-2" => Some(Self::Big2),
            "big-3" => Some(Self::Big3),
            "big-4" => Some(Self::Big4),
            "big-5" => Some(Self::Big5),
            "big-6" => Some(Self::Big6),
            _ => None,
        }
    }

    /// How many character cells one glyph occupies horizontally.
    ///
    /// `Tall` keeps single width.
    pub fn width_factor(self) -> usize {
        match self {
            Self::Wide | Self::Big => 2,
            Self::Big2 => 3,
            Self::Big3 => 4,
            Self::Big4 => 5,
            Self::Big5 => 6,
            Self::Big6 => 7,
            Self::Normal | Self::Tall => 1,
        }
    }

    pub fn command(self) -> [u8; 3] {
        [GS, b'!', self as u8]
    }
}

// ============================================================================
// SIMPLE STYLE TOGGLES
// ============================================================================

/// Print color (ESC r n), for two-color paper
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextColor {
    #[default]
    Black = 0,
    Red = 1,
}

impl TextColor {
    pub fn command(self) -> [u8; 3] {
        [ESC, b'r', self as u8]
    }
}

/// White-on-black printing (GS B n)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Reverse {
    #[default]
    Off = 0,
    On = 1,
}

impl Reverse {
    pub fn command(self) -> [u8; 3] {
        [GS, b'B', self as u8]
    }
}

/// Emphasized mode (ESC E n)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Weight {
    #[default]
    Normal = 0,
    Bold = 1,
}

impl Weight {
    pub fn command(self) -> [u8; 3] {
        [ESC, b'E', self as u8]
    }
}

/// Underline mode (ESC - n)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Underline {
    #[default]
    Off = 0,
    /// 1-dot line
    On = 1,
    /// 2-dot line, what `<u>` produces
    Large = 2,
}

impl Underline {
    pub fn command(self) -> [u8; 3] {
        [ESC, b'-', self as u8]
    }
}

/// Double-strike mode (ESC G n)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DoubleStrike {
    #[default]
    Off = 0,
    On = 1,
}

impl DoubleStrike {
    pub fn command(self) -> [u8; 3] {
        [ESC, b'G', self as u8]
    }
}

/// The full set of text attributes a text run is printed with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TextStyle {
    pub size: TextSize,
    pub color: TextColor,
    pub reverse: Reverse,
    pub weight: Weight,
    pub underline: Underline,
    pub double_strike: DoubleStrike,
}

// ============================================================================
// CODE PAGE
// ============================================================================

/// Where a [`Charset`] gets its byte mapping from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CodePage {
    Whatwg(&'static Encoding),
    Cp437,
}

/// An 8-bit code page and the ESC t table id that selects it on the printer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Charset {
    code_page: CodePage,
    id: u8,
}

impl Charset {
    /// Windows-1252, table 6.
    pub const DEFAULT_LABEL: &'static str = "windows-1252";
    pub const DEFAULT_ID: u8 = 6;

    /// Resolve a WHATWG encoding label such as `"windows-1252"` or `"ibm866"`,
    /// or one of the [`cp437::LABELS`].
    pub fn new(label: &str, id: u8) -> Result<Self> {
        let label = label.trim();
        if cp437::is_label(label) {
            return Ok(Self {
                code_page: CodePage::Cp437,
                id,
            });
        }
        let encoding = Encoding::for_label(label.as_bytes())
            .ok_or_else(|| BoletaError::InvalidProfile(format!("Unknown charset: {}", label)))?;
        Ok(Self {
            code_page: CodePage::Whatwg(encoding),
            id,
        })
    }

    pub fn name(&self) -> &'static str {
        match self.code_page {
            CodePage::Whatwg(encoding) => encoding.name(),
            CodePage::Cp437 => cp437::NAME,
        }
    }

    pub fn id(&self) -> u8 {
        self.id
    }

    /// ESC t command selecting this table
    pub fn command(&self) -> [u8; 3] {
        [ESC, b't', self.id]
    }

    /// Encode text for the printer, failing on characters the table lacks.
    ///
    /// ## Example
    ///
    /// ```
    /// use boleta::protocol::text::Charset;
    ///
    /// let charset = Charset::default();
    /// assert_eq!(charset.encode("café").unwrap(), vec![b'c', b'a', b'f', 0xE9]);
    /// assert!(charset.encode("日本").is_err());
    ///
    /// let pc437 = Charset::new("cp437", 0).unwrap();
    /// assert_eq!(pc437.encode("café").unwrap(), vec![b'c', b'a', b'f', 0x82]);
    /// ```
    pub fn encode(&self, text: &str) -> Result<Vec<u8>> {
        let encoding = match self.code_page {
            CodePage::Whatwg(encoding) => encoding,
            CodePage::Cp437 => return cp437::encode(text),
        };
        let (bytes, _, had_errors) = encoding.encode(text);
        if had_errors {
            return Err(BoletaError::Encoding(format!(
                "{:?} cannot be represented in {}",
                text,
                encoding.name()
            )));
        }
        Ok(bytes.into_owned())
    }
}

impl Default for Charset {
    fn default() -> Self {
        Self {
            code_page: CodePage::Whatwg(encoding_rs::WINDOWS_1252),
            id: Self::DEFAULT_ID,
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_align() {
        assert_eq!(align(Alignment::Left), vec![0x1B, 0x61, 0x00]);
        assert_eq!(align(Alignment::Right), vec![0x1B, 0x61, 0x02]);
    }

    #[test]
    fn test_alignment_from_marker() {
        assert_eq!(Alignment::from_marker('C'), Some(Alignment::Center));
        assert_eq!(Alignment::from_marker('r'), Some(Alignment::Right));
        assert_eq!(Alignment::from_marker('X'), None);
    }

    #[test]
    fn test_size_commands() {
        assert_eq!(TextSize::Normal.command(), [0x1D, 0x21, 0x00]);
        assert_eq!(TextSize::Tall.command(), [0x1D, 0x21, 0x01]);
        assert_eq!(TextSize::Wide.command(), [0x1D, 0x21, 0x10]);
        assert_eq!(TextSize::Big6.command(), [0x1D, 0x21, 0x66]);
    }

    #[test]
    fn test_size_width_factor() {
        assert_eq!(TextSize::Tall.width_factor(), 1);
        assert_eq!(TextSize::Big.width_factor(), 2);
        assert_eq!(TextSize::Big4.width_factor(), 5);
    }

    #[test]
    fn test_size_from_attr() {
        assert_eq!(TextSize::from_attr("big-3"), Some(TextSize::Big3));
        assert_eq!(TextSize::from_attr("huge"), None);
    }

    #[test]
    fn test_toggle_commands() {
        assert_eq!(Weight::Bold.command(), [0x1B, 0x45, 0x01]);
        assert_eq!(Underline::Large.command(), [0x1B, 0x2D, 0x02]);
        assert_eq!(DoubleStrike::On.command(), [0x1B, 0x47, 0x01]);
        assert_eq!(TextColor::Red.command(), [0x1B, 0x72, 0x01]);
        assert_eq!(Reverse::On.command(), [0x1D, 0x42, 0x01]);
    }

    #[test]
    fn test_default_charset() {
        let charset = Charset::default();
        assert_eq!(charset.name(), "windows-1252");
        assert_eq!(charset.command(), [0x1B, 0x74, 0x06]);
    }

    #[test]
    fn test_charset_by_label() {
        let charset = Charset::new("ibm866", 17).unwrap();
        assert_eq!(charset.name(), "IBM866");
        assert_eq!(charset.encode("Ж").unwrap(), vec![0x86]);
    }

    #[test]
    fn test_cp437_charset() {
        let charset = Charset::new(" PC437 ", 0).unwrap();
        assert_eq!(charset.name(), "IBM437");
        assert_eq!(charset.command(), [0x1B, 0x74, 0x00]);
        assert_eq!(charset.encode("─┼─").unwrap(), vec![0xC4, 0xC5, 0xC4]);
        assert!(matches!(charset.encode("€"), Err(BoletaError::Encoding(_))));
    }

    #[test]
    fn test_unknown_charset() {
        assert!(matches!(
            Charset::new("klingon", 1),
            Err(BoletaError::InvalidProfile(_))
        ));
    }

    #[test]
    fn test_unrepresentable_text() {
        let err = Charset::default().encode("€ ok, ☃ not").unwrap_err();
        assert!(matches!(err, BoletaError::Encoding(_)));
    }
}
