//! # ESC/POS Protocol Commands
//!
//! Fixed command builders for ESC/POS-compatible thermal receipt printers.
//!
//! ## Escape Sequence Structure
//!
//! Commands follow these patterns:
//! - Single byte: `LF`
//! - Two bytes: `ESC @`
//! - Multi-byte with parameters: `ESC J n`, `GS V m`, `ESC p m t1 t2`
//!
//! ## Byte Order
//!
//! Multi-byte integers use **little-endian** encoding:
//! - `u16` value 0x1234 is sent as bytes `[0x34, 0x12]`

// ============================================================================
// ESCAPE SEQUENCE CONSTANTS
// ============================================================================

/// ESC (Escape) - Command prefix byte
pub const ESC: u8 = 0x1B;

/// GS (Group Separator) - Extended command prefix
///
/// Used for graphics, barcodes, character size and the cutter.
pub const GS: u8 = 0x1D;

/// LF (Line Feed) - Print and advance one line
pub const LF: u8 = 0x0A;

/// Split a `u16` into its little-endian low/high bytes.
#[inline]
pub fn u16_le(value: u16) -> [u8; 2] {
    value.to_le_bytes()
}

// ============================================================================
// INITIALIZATION
// ============================================================================

/// # Reset Printer (ESC @)
///
/// Clears the print buffer and returns every text style to its power-on
/// default.
///
/// | Format  | Bytes |
/// |---------|-------|
/// | ASCII   | ESC @ |
/// | Hex     | 1B 40 |
///
/// ## Example
///
/// ```
/// use boleta::protocol::commands;
///
/// assert_eq!(commands::reset(), vec![0x1B, 0x40]);
/// ```
#[inline]
pub fn reset() -> Vec<u8> {
    vec![ESC, b'@']
}

/// # Select Character Code Table (ESC t n)
///
/// The table id is printer specific. Windows-1252 is id 6 on most
/// Epson-compatible firmware.
#[inline]
pub fn select_charset(id: u8) -> Vec<u8> {
    vec![ESC, b't', id]
}

// ============================================================================
// PAPER CONTROL
// ============================================================================

/// # Feed Paper (ESC J n)
///
/// Prints the buffer and feeds `n` dots. Values above 255 are truncated to
/// the low byte, as the firmware only reads one parameter byte.
#[inline]
pub fn feed_dots(dots: u32) -> Vec<u8> {
    vec![ESC, b'J', dots as u8]
}

/// # Partial Cut (GS V 1)
///
/// | Format  | Bytes    |
/// |---------|----------|
/// | ASCII   | GS V 1   |
/// | Hex     | 1D 56 01 |
#[inline]
pub fn cut_partial() -> Vec<u8> {
    vec![GS, b'V', 0x01]
}

/// # Cash Drawer Kick (ESC p 0 t1 t2)
///
/// Pulses drawer pin 2 for 60ms on and 255ms off (`t1 = 0x3C`, `t2 = 0xFF`).
#[inline]
pub fn open_cash_drawer() -> Vec<u8> {
    vec![ESC, b'p', 0x00, 0x3C, 0xFF]
}

/// Line feed
#[inline]
pub fn lf() -> Vec<u8> {
    vec![LF]
}

// ============================================================================
// LINE SPACING
// ============================================================================

/// # Set Line Spacing (ESC 3 n)
///
/// Strip raster output sets 24 dots while printing strips so that they butt
/// against each other, then restores 30 dots.
#[inline]
pub fn line_spacing(dots: u8) -> Vec<u8> {
    vec![ESC, b'3', dots]
}

/// Line spacing used between strip raster commands
pub const STRIP_LINE_SPACING: u8 = 0x18;

/// Line spacing restored after strip raster output
pub const DEFAULT_LINE_SPACING: u8 = 0x1E;

// ============================================================================
// TESTS
// ============================================================================
