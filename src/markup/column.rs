//! # Column Layout
//!
//! A line is cut at every `[L]`, `[C]` or `[R]` marker. Each piece is a
//! column of `chars_per_line / columns` characters, and the remainder is
//! handed out one character at a time to the first columns.
//!
//! ## Padding
//!
//! ```text
//! free   = column width - content width
//! Left   : left = 0,        right = free
//! Center : left = free / 2, right = free - left
//! Right  : left = free,     right = 0
//! ```
//!
//! A column whose content overflows records the excess in the line's carry,
//! and the next column takes it out of its left padding (keeping at least one
//! space between the two). Padding that would still be negative is carried
//! forward again.

use super::MarkupParser;
use super::element::{BarcodeRun, Element, ImageRun, TextRun};
use super::tag::Tag;
use crate::error::Result;
use crate::protocol::text::{Alignment, TextSize, TextStyle, Weight};

const MARKERS: [&str; 3] = ["[L]", "[C]", "[R]"];

/// Counters shared by the columns of one line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LineCarry {
    /// Characters left over by the integer division, not yet given out
    pub chars_owed: i64,
    /// Negative when a previous column ran past its width
    pub overflow: i64,
}

/// Split a line before every alignment marker. Markers are case-sensitive
/// and stay at the start of their column.
///
/// ```
/// use boleta::markup::column::split_columns;
///
/// assert_eq!(split_columns("[L]Item[R]9.99"), vec!["[L]Item", "[R]9.99"]);
/// assert_eq!(split_columns("Total[R]9.99"), vec!["Total", "[R]9.99"]);
/// assert_eq!(split_columns("[l]no split"), vec!["[l]no split"]);
/// ```
pub fn split_columns(line: &str) -> Vec<&str> {
    let mut columns = Vec::new();
    let mut last = 0;
    for (start, _) in line.match_indices('[') {
        if !MARKERS.iter().any(|m| line[start..].starts_with(m)) {
            continue;
        }
        if start > 0 {
            columns.push(&line[last..start]);
        }
        last = start;
    }
    columns.push(&line[last..]);
    columns
}

/// Left and right padding of one column, updating the line carry.
///
/// ```
/// use boleta::markup::column::{distribute, LineCarry};
/// use boleta::protocol::text::Alignment;
///
/// let mut carry = LineCarry::default();
/// assert_eq!(distribute(Alignment::Center, 32, 5, &mut carry), (13, 14));
/// ```
pub fn distribute(
    alignment: Alignment,
    column_width: i64,
    content_width: i64,
    carry: &mut LineCarry,
) -> (usize, usize) {
    let free = column_width - content_width;
    let (mut left, mut right) = match alignment {
        Alignment::Left => (0, free),
        Alignment::Center => (free / 2, free - free / 2),
        Alignment::Right => (free, 0),
    };

    if carry.chars_owed > 0 {
        carry.chars_owed -= 1;
        right += 1;
    }

    if carry.overflow < 0 {
        left += carry.overflow;
        carry.overflow = 0;
        if left < 1 {
            right += left - 1;
            left = 1;
        }
    }

    if left < 0 {
        carry.overflow += left;
        left = 0;
    }
    if right < 0 {
        carry.overflow += right;
        right = 0;
    }

    (left as usize, right as usize)
}

/// One alignment segment of a line.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    alignment: Alignment,
    elements: Vec<Element>,
}

impl Column {
    pub(super) fn parse(
        segment: &str,
        sole: bool,
        column_width: usize,
        carry: &mut LineCarry,
        parser: &mut MarkupParser<'_>,
    ) -> Result<Self> {
        let (alignment, text) = split_marker(segment);

        if sole {
            if let Some(element) = content_element(text.trim(), alignment, parser)? {
                return Ok(Self {
                    alignment,
                    elements: vec![element],
                });
            }
        }

        let start = parser.state.current();
        let mut elements = Vec::new();
        let mut offset = 0;
        loop {
            let Some(open) = text[offset..].find('<').map(|i| offset + i) else {
                elements.push(parser.text_run(&text[offset..])?);
                break;
            };
            let Some(close) = text[open..].find('>').map(|i| open + i) else {
                // unterminated tag, keep the rest as text
                elements.push(parser.text_run(&text[offset..])?);
                break;
            };

            elements.push(parser.text_run(&text[offset..open])?);
            if parser.state.apply(&Tag::parse(&text[open..=close])) {
                offset = close + 1;
            } else {
                elements.push(parser.text_run("<")?);
                offset = open + 1;
            }
        }

        let content: usize = elements.iter().map(Element::width).sum();
        let (left, right) = distribute(alignment, column_width as i64, content as i64, carry);

        if left > 0 {
            let pad = TextRun::new(" ".repeat(left), padding_style(start), parser.profile)?;
            elements.insert(0, Element::Text(pad));
        }
        if right > 0 {
            let style = padding_style(parser.state.current());
            let pad = TextRun::new(" ".repeat(right), style, parser.profile)?;
            elements.push(Element::Text(pad));
        }

        Ok(Self {
            alignment,
            elements,
        })
    }

    pub fn alignment(&self) -> Alignment {
        self.alignment
    }

    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    /// Characters used, padding included.
    pub fn width(&self) -> usize {
        self.elements.iter().map(Element::width).sum()
    }
}

/// Padding is always normal size and weight; lines and colors carry over.
fn padding_style(style: TextStyle) -> TextStyle {
    TextStyle {
        size: TextSize::Normal,
        weight: Weight::Normal,
        ..style
    }
}

/// Strip a leading marker. The letter is matched case-insensitively here.
fn split_marker(segment: &str) -> (Alignment, &str) {
    let bytes = segment.as_bytes();
    if bytes.len() > 2 && bytes[0] == b'[' && bytes[2] == b']' {
        if let Some(alignment) = Alignment::from_marker(bytes[1] as char) {
            return (alignment, &segment[3..]);
        }
    }
    (Alignment::Left, segment)
}

/// `<img>`, `<barcode>` or `<qrcode>` filling the whole column.
fn content_element(
    trimmed: &str,
    alignment: Alignment,
    parser: &MarkupParser<'_>,
) -> Result<Option<Element>> {
    if !trimmed.starts_with('<') {
        return Ok(None);
    }
    let Some(open_end) = trimmed[1..].find('>').map(|i| i + 2) else {
        return Ok(None);
    };
    let tag = Tag::parse(&trimmed[..open_end]);
    if !matches!(tag.name(), "img" | "barcode" | "qrcode") {
        return Ok(None);
    }

    let close = format!("</{}>", tag.name());
    let inner = match trimmed.strip_suffix(close.as_str()) {
        Some(body) if body.len() >= open_end => &body[open_end..],
        _ => return Ok(None),
    };

    let profile = parser.profile;
    let element = match tag.name() {
        "img" => Element::Image(ImageRun::from_hex(inner, alignment, profile)?),
        "barcode" => Element::Barcode(BarcodeRun::from_attributes(
            inner,
            tag.attributes(),
            alignment,
            profile,
        )?),
        _ => Element::Qr(ImageRun::qr_code(
            inner,
            tag.attributes(),
            alignment,
            profile,
            parser.qr_source,
        )?),
    };
    Ok(Some(element))
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_columns() {
        assert_eq!(split_columns(""), vec![""]);
        assert_eq!(split_columns("plain"), vec!["plain"]);
        assert_eq!(split_columns("[C]x"), vec!["[C]x"]);
        assert_eq!(
            split_columns("[L]a[C]b[R]c"),
            vec!["[L]a", "[C]b", "[R]c"]
        );
        assert_eq!(split_columns("[L][R]x"), vec!["[L]", "[R]x"]);
        assert_eq!(split_columns("[[R]x"), vec!["[", "[R]x"]);
    }

    #[test]
    fn test_split_marker() {
        assert_eq!(split_marker("[R]x"), (Alignment::Right, "x"));
        assert_eq!(split_marker("[c]x"), (Alignment::Center, "x"));
        assert_eq!(split_marker("[X]x"), (Alignment::Left, "[X]x"));
        assert_eq!(split_marker("[é]"), (Alignment::Left, "[é]"));
        assert_eq!(split_marker("ab"), (Alignment::Left, "ab"));
    }

    #[test]
    fn test_distribute_alignments() {
        let mut carry = LineCarry::default();
        assert_eq!(distribute(Alignment::Left, 10, 4, &mut carry), (0, 6));
        assert_eq!(distribute(Alignment::Right, 10, 4, &mut carry), (6, 0));
        assert_eq!(distribute(Alignment::Center, 10, 3, &mut carry), (3, 4));
        assert_eq!(carry, LineCarry::default());
    }

    #[test]
    fn test_owed_characters_go_right() {
        let mut carry = LineCarry {
            chars_owed: 2,
            overflow: 0,
        };
        assert_eq!(distribute(Alignment::Left, 10, 1, &mut carry), (0, 10));
        assert_eq!(distribute(Alignment::Center, 10, 1, &mut carry), (4, 6));
        assert_eq!(distribute(Alignment::Right, 10, 1, &mut carry), (9, 0));
        assert_eq!(carry.chars_owed, 0);
    }

    #[test]
    fn test_overflow_is_taken_from_next_column() {
        let mut carry = LineCarry::default();
        // 15 characters in a 10 character column
        assert_eq!(distribute(Alignment::Left, 10, 15, &mut carry), (0, 0));
        assert_eq!(carry.overflow, -5);

        assert_eq!(distribute(Alignment::Right, 10, 1, &mut carry), (4, 0));
        assert_eq!(carry.overflow, 0);
    }

    #[test]
    fn test_overflow_keeps_one_space() {
        let mut carry = LineCarry {
            chars_owed: 0,
            overflow: -8,
        };
        // left 6 - 8 = -2 -> 1, right 0 + (-2 - 1) = -3 carried on
        assert_eq!(distribute(Alignment::Right, 10, 4, &mut carry), (1, 0));
        assert_eq!(carry.overflow, -3);
    }
}
