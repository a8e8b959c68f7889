//! `<name attr='value'>` spans.
//!
//! A span that does not start with `<` and end with `>` parses to an empty
//! tag, which no handler recognizes, so the caller prints it literally.

use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Tag {
    name: String,
    attributes: HashMap<String, String>,
    closing: bool,
}

impl Tag {
    /// Parse one `<...>` span.
    ///
    /// ```
    /// use boleta::markup::tag::Tag;
    ///
    /// let tag = Tag::parse("<FONT size='big' color=\"red\">");
    /// assert_eq!(tag.name(), "font");
    /// assert_eq!(tag.attribute("size"), Some("big"));
    /// assert_eq!(tag.attribute("color"), Some("red"));
    /// assert!(!tag.is_closing());
    ///
    /// assert!(Tag::parse("</b>").is_closing());
    /// assert!(Tag::parse("b>").is_empty());
    /// ```
    pub fn parse(span: &str) -> Self {
        let span = span.trim();
        if span.len() < 2 || !span.starts_with('<') || !span.ends_with('>') {
            return Self::default();
        }
        // Both delimiters are ASCII, so byte offsets are char boundaries.
        let close = span.find('>').unwrap_or(span.len() - 1);

        let (raw_name, attributes) = match span.find(' ') {
            Some(space) if space < close => {
                (&span[1..space], parse_attributes(span[space..close].trim()))
            }
            _ => (&span[1..close], HashMap::new()),
        };

        let raw_name = raw_name.to_lowercase();
        let (name, closing) = match raw_name.strip_prefix('/') {
            Some(name) => (name.to_string(), true),
            None => (raw_name, false),
        };

        Self {
            name,
            attributes,
            closing,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_closing(&self) -> bool {
        self.closing
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_empty()
    }

    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }

    pub fn attributes(&self) -> &HashMap<String, String> {
        &self.attributes
    }
}

/// `a='1' b="2"`. Parsing stops at the first unterminated value.
fn parse_attributes(mut rest: &str) -> HashMap<String, String> {
    let mut attributes = HashMap::new();

    while let Some((equal, quote)) = next_assignment(rest) {
        let value_start = equal + 2;
        let Some(len) = rest[value_start..].find(quote) else {
            break;
        };
        let key = rest[..equal].trim();
        let value = &rest[value_start..value_start + len];
        if !key.is_empty() {
            attributes.insert(key.to_string(), value.to_string());
        }
        rest = rest[value_start + len + 1..].trim();
    }

    attributes
}

/// Position of the first `='` or `="` and the quote it opens.
fn next_assignment(s: &str) -> Option<(usize, char)> {
    let single = s.find("='").map(|i| (i, '\''));
    let double = s.find("=\"").map(|i| (i, '"'));
    match (single, double) {
        (Some(a), Some(b)) => Some(if a.0 < b.0 { a } else { b }),
        (a, b) => a.or(b),
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_tags() {
        let tag = Tag::parse("<b>");
        assert_eq!(tag.name(), "b");
        assert!(!tag.is_closing());
        assert!(tag.attributes().is_empty());

        let tag = Tag::parse("</U>");
        assert_eq!(tag.name(), "u");
        assert!(tag.is_closing());
    }

    #[test]
    fn test_attributes() {
        let tag = Tag::parse("<barcode type='128' width='40' text='none'>");
        assert_eq!(tag.name(), "barcode");
        assert_eq!(tag.attribute("type"), Some("128"));
        assert_eq!(tag.attribute("width"), Some("40"));
        assert_eq!(tag.attribute("text"), Some("none"));
        assert_eq!(tag.attribute("height"), None);
    }

    #[test]
    fn test_attribute_values_keep_spaces_and_case() {
        let tag = Tag::parse("<x label='Hello World' >");
        assert_eq!(tag.attribute("label"), Some("Hello World"));
    }

    #[test]
    fn test_unterminated_value_stops_parsing() {
        let tag = Tag::parse("<font size='big color='red>");
        // `big color=` is taken as the size, then `red>` never closes
        assert_eq!(tag.attribute("size"), Some("big color="));
        assert_eq!(tag.attribute("color"), None);
    }

    #[test]
    fn test_invalid_spans_are_empty() {
        assert!(Tag::parse("b").is_empty());
        assert!(Tag::parse("<b").is_empty());
        assert!(Tag::parse(">").is_empty());
        assert!(Tag::parse("<>").is_empty());
        assert!(Tag::parse("< b>").is_empty());
    }

    #[test]
    fn test_surrounding_whitespace_is_ignored() {
        assert_eq!(Tag::parse("  <b>  ").name(), "b");
    }
}
