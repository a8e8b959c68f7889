//! Nested text formatting.
//!
//! Each style attribute has its own stack. Opening a format tag pushes onto
//! the stacks it governs and the matching closing tag pops them again, so
//! `<u>` and `</u>` always move underline and double-strike together even
//! when only one of them visibly changes.

use super::tag::Tag;
use crate::protocol::text::{
    DoubleStrike, Reverse, TextColor, TextSize, TextStyle, Underline, Weight,
};

/// A stack that always holds at least one value.
///
/// Popping the last value is a no-op, so unbalanced closing tags fall back
/// to the defaults instead of failing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleStack<T> {
    values: Vec<T>,
}

impl<T: Copy> StyleStack<T> {
    pub fn new(initial: T) -> Self {
        Self {
            values: vec![initial],
        }
    }

    pub fn top(&self) -> T {
        // The constructor seeds one value and pop never removes it
        self.values[self.values.len() - 1]
    }

    pub fn push(&mut self, value: T) {
        self.values.push(value);
    }

    /// Re-push the current top, keeping depth in step with a later pop.
    pub fn repeat(&mut self) {
        self.push(self.top());
    }

    pub fn pop(&mut self) {
        if self.values.len() > 1 {
            self.values.pop();
        }
    }

    pub fn depth(&self) -> usize {
        self.values.len()
    }
}

impl<T: Copy + Default> Default for StyleStack<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

/// The six style stacks of one parse.
#[derive(Debug, Clone, Default)]
pub struct FormattingState {
    size: StyleStack<TextSize>,
    color: StyleStack<TextColor>,
    reverse: StyleStack<Reverse>,
    weight: StyleStack<Weight>,
    underline: StyleStack<Underline>,
    double_strike: StyleStack<DoubleStrike>,
}

impl FormattingState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every stack top.
    pub fn current(&self) -> TextStyle {
        TextStyle {
            size: self.size.top(),
            color: self.color.top(),
            reverse: self.reverse.top(),
            weight: self.weight.top(),
            underline: self.underline.top(),
            double_strike: self.double_strike.top(),
        }
    }

    /// Apply a `<b>`, `<u>` or `<font>` tag (opening or closing).
    ///
    /// Returns `false` for any other tag, which leaves the state untouched.
    ///
    /// ```
    /// use boleta::markup::style::FormattingState;
    /// use boleta::markup::tag::Tag;
    /// use boleta::protocol::text::{TextSize, Weight};
    ///
    /// let mut state = FormattingState::new();
    /// assert!(state.apply(&Tag::parse("<b>")));
    /// assert!(state.apply(&Tag::parse("<font size='wide'>")));
    /// assert_eq!(state.current().weight, Weight::Bold);
    /// assert_eq!(state.current().size, TextSize::Wide);
    ///
    /// assert!(state.apply(&Tag::parse("</font>")));
    /// assert_eq!(state.current().size, TextSize::Normal);
    /// assert!(!state.apply(&Tag::parse("<i>")));
    /// ```
    pub fn apply(&mut self, tag: &Tag) -> bool {
        match (tag.name(), tag.is_closing()) {
            ("b", false) => self.weight.push(Weight::Bold),
            ("b", true) => self.weight.pop(),
            ("u", false) => self.open_underline(tag),
            ("u", true) => {
                self.underline.pop();
                self.double_strike.pop();
            }
            ("font", false) => self.open_font(tag),
            ("font", true) => {
                self.size.pop();
                self.color.pop();
                self.reverse.pop();
            }
            _ => return false,
        }
        true
    }

    fn open_underline(&mut self, tag: &Tag) {
        match tag.attribute("type") {
            None | Some("normal") => {
                self.underline.push(Underline::Large);
                self.double_strike.repeat();
            }
            Some("double") => {
                self.underline.repeat();
                self.double_strike.push(DoubleStrike::On);
            }
            Some(_) => {}
        }
    }

    fn open_font(&mut self, tag: &Tag) {
        match tag.attribute("size") {
            Some(value) => {
                if let Some(size) = TextSize::from_attr(value) {
                    self.size.push(size);
                }
            }
            None => self.size.repeat(),
        }

        // bg-* colors select the plain color; reverse video stays off
        let color = match tag.attribute("color") {
            Some("black" | "bg-black") => Some(TextColor::Black),
            Some("red" | "bg-red") => Some(TextColor::Red),
            Some(_) => None,
            None => {
                self.color.repeat();
                self.reverse.repeat();
                None
            }
        };
        if let Some(color) = color {
            self.color.push(color);
            self.reverse.push(Reverse::Off);
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
