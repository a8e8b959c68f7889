//! # Code Page 437
//!
//! IBM PC character set, table 0 on most ESC/POS printers. `encoding_rs`
//! only carries WHATWG encodings, which do not include it.
//!
//! The lower half is ASCII. The upper half maps one-to-one onto [`UPPER`].

use crate::error::{BoletaError, Result};

/// Labels accepted for this code page (compared case-insensitively)
pub const LABELS: &[&str] = &["cp437", "ibm437", "pc437", "437"];

/// Display name
pub const NAME: &str = "IBM437";

/// Characters for bytes 0x80..=0xFF, in byte order.
pub const UPPER: [char; 128] = [
    // 0x80
    'Ç', 'ü', 'é', 'â', 'ä', 'à', 'å', 'ç', 'ê', 'ë', 'è', 'ï', 'î', 'ì', 'Ä', 'Å',
    // 0x90
    'É', 'æ', 'Æ', 'ô', 'ö', 'ò', 'û', 'ù', 'ÿ', 'Ö', 'Ü', '¢', '£', '¥', '₧', 'ƒ',
    // 0xA0
    'á', 'í', 'ó', 'ú', 'ñ', 'Ñ', 'ª', 'º', '¿', '⌐', '¬', '½', '¼', '¡', '«', '»',
    // 0xB0
    '░', '▒', '▓', '│', '┤', '╡', '╢', '╖', '╕', '╣', '║', '╗', '╝', '╜', '╛', '┐',
    // 0xC0
    '└', '┴', '┬', '├', '─', '┼', '╞', '╟', '╚', '╔', '╩', '╦', '╠', '═', '╬', '╧',
    // 0xD0
    '╨', '╤', '╥', '╙', '╘', '╒', '╓', '╫', '╪', '┘', '┌', '█', '▄', '▌', '▐', '▀',
    // 0xE0
    'α', 'ß', 'Γ', 'π', 'Σ', 'σ', 'µ', 'τ', 'Φ', 'Θ', 'Ω', 'δ', '∞', 'φ', 'ε', '∩',
    // 0xF0
    '≡', '±', '≥', '≤', '⌠', '⌡', '÷', '≈', '°', '∙', '·', '√', 'ⁿ', '²', '■', '\u{A0}',
];

pub fn is_label(label: &str) -> bool {
    LABELS.iter().any(|l| l.eq_ignore_ascii_case(label))
}

/// Byte for `ch`, if the code page has it.
pub fn encode_char(ch: char) -> Option<u8> {
    if ch.is_ascii() {
        return Some(ch as u8);
    }
    UPPER
        .iter()
        .position(|&c| c == ch)
        .map(|i| 0x80 + i as u8)
}

/// Encode `text`, failing on the first character outside the code page.
///
/// ```
/// use boleta::protocol::cp437;
///
/// assert_eq!(cp437::encode("Año ½").unwrap(), vec![b'A', 0xA4, b'o', b' ', 0xAB]);
/// assert!(cp437::encode("€").is_err());
/// ```
pub fn encode(text: &str) -> Result<Vec<u8>> {
    text.chars()
        .map(|ch| {
            encode_char(ch).ok_or_else(|| {
                BoletaError::Encoding(format!(
                    "{:?} cannot be represented in {} (U+{:04X})",
                    text, NAME, ch as u32
                ))
            })
        })
        .collect()
}
