//! # ESC/POS Raster Graphics Commands
//!
//! Two image opcodes are supported:
//!
//! | Mode | Command | Description |
//! |------|---------|-------------|
//! | Raster | GS v 0 | Whole image, arbitrary height |
//! | Strip | ESC * 33 | 24-dot strips, for printers without GS v 0 |
//!
//! Images travel through the crate in raster form ([`RasterImage`]) and are
//! transcoded to strips only when the encoder runs in compatibility mode.
//!
//! ## Bit Packing
//!
//! - Bit 7 (MSB) = leftmost dot
//! - Bit 0 (LSB) = rightmost dot
//! - 1 = black (print), 0 = white (no print)
//!
//! ## Raster Envelope
//!
//! ```text
//! 1D 76 30 00 xL xH yL yH d1...dk
//!
//! bytes_per_row = xL + xH * 256
//! rows          = yL + yH * 256
//! k             = bytes_per_row * rows
//! ```

use tracing::debug;

use super::commands::{self, ESC, GS, LF, u16_le};
use crate::error::{BoletaError, Result};

/// Size of the GS v 0 header
pub const ENVELOPE_LEN: usize = 8;

/// Print-head rows covered by one strip command
pub const STRIP_ROWS: usize = 24;

/// # Raster Envelope Header (GS v 0 m xL xH yL yH)
///
/// ## Example
///
/// ```
/// use boleta::protocol::graphics::envelope_header;
///
/// assert_eq!(
///     envelope_header(72, 300),
///     [0x1D, 0x76, 0x30, 0x00, 72, 0, 0x2C, 0x01]
/// );
/// ```
pub fn envelope_header(bytes_per_row: u16, rows: u16) -> [u8; ENVELOPE_LEN] {
    let [x_l, x_h] = u16_le(bytes_per_row);
    let [y_l, y_h] = u16_le(rows);
    [GS, b'v', b'0', 0x00, x_l, x_h, y_l, y_h]
}

// ============================================================================
// RASTER IMAGE
// ============================================================================

/// A packed monochrome image in GS v 0 layout.
///
/// Rows are stored top to bottom, `bytes_per_row` bytes each, MSB leftmost.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RasterImage {
    bytes_per_row: usize,
    rows: usize,
    data: Vec<u8>,
}

impl RasterImage {
    /// Wrap packed rows, checking that the data covers every row.
    pub fn new(bytes_per_row: usize, rows: usize, data: Vec<u8>) -> Result<Self> {
        if bytes_per_row > u16::MAX as usize || rows > u16::MAX as usize {
            return Err(BoletaError::Image(format!(
                "{}x{} exceeds the raster envelope limits",
                bytes_per_row, rows
            )));
        }
        if data.len() != bytes_per_row * rows {
            return Err(BoletaError::Image(format!(
                "expected {} bytes for {} rows of {} bytes, got {}",
                bytes_per_row * rows,
                rows,
                bytes_per_row,
                data.len()
            )));
        }
        Ok(Self {
            bytes_per_row,
            rows,
            data,
        })
    }

    /// A 0x0 image. Printing it emits only the envelope header.
    pub fn empty() -> Self {
        Self {
            bytes_per_row: 0,
            rows: 0,
            data: Vec::new(),
        }
    }

    /// Parse a complete GS v 0 command (header + data).
    ///
    /// Bytes past the declared size are ignored.
    pub fn from_envelope(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < ENVELOPE_LEN {
            return Err(BoletaError::Image(format!(
                "raster envelope needs {} header bytes, got {}",
                ENVELOPE_LEN,
                bytes.len()
            )));
        }
        let bytes_per_row = u16::from_le_bytes([bytes[4], bytes[5]]) as usize;
        let rows = u16::from_le_bytes([bytes[6], bytes[7]]) as usize;
        let end = ENVELOPE_LEN + bytes_per_row * rows;
        let data = bytes.get(ENVELOPE_LEN..end).ok_or_else(|| {
            BoletaError::Image(format!(
                "raster envelope declares {} rows of {} bytes but carries {} data bytes",
                rows,
                bytes_per_row,
                bytes.len() - ENVELOPE_LEN
            ))
        })?;
        Self::new(bytes_per_row, rows, data.to_vec())
    }

    /// Decode the hex payload of an `<img>` tag.
    pub fn from_hex(hex_str: &str) -> Result<Self> {
        let bytes = hex::decode(hex_str.trim())
            .map_err(|e| BoletaError::Image(format!("invalid image hex: {}", e)))?;
        Self::from_envelope(&bytes)
    }

    /// Lowercase hex of the full envelope, the `<img>` payload format.
    pub fn to_hex(&self) -> String {
        hex::encode(self.to_envelope())
    }

    /// Header followed by the packed rows.
    pub fn to_envelope(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(ENVELOPE_LEN + self.data.len());
        out.extend(envelope_header(self.bytes_per_row as u16, self.rows as u16));
        out.extend_from_slice(&self.data);
        out
    }

    pub fn bytes_per_row(&self) -> usize {
        self.bytes_per_row
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Width in dots (always a multiple of 8)
    pub fn width_px(&self) -> usize {
        self.bytes_per_row * 8
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Whether the dot at (x, y) is black. Out of range reads as white.
    pub fn is_black(&self, x: usize, y: usize) -> bool {
        if x >= self.width_px() || y >= self.rows {
            return false;
        }
        self.data[y * self.bytes_per_row + x / 8] & (0x80 >> (x % 8)) != 0
    }

    /// Shift the image right by prepending `count` white bytes to every row.
    pub fn pad_left(&self, count: usize) -> Result<Self> {
        if count == 0 {
            return Ok(self.clone());
        }
        let new_row = self.bytes_per_row + count;
        let mut data = vec![0u8; new_row * self.rows];
        for (src, dst) in self
            .data
            .chunks_exact(self.bytes_per_row.max(1))
            .zip(data.chunks_exact_mut(new_row))
        {
            dst[count..].copy_from_slice(src);
        }
        Self::new(new_row, self.rows, data)
    }

    // ========================================================================
    // STRIP TRANSCODING (ESC * 33)
    // ========================================================================

    /// # Transcode to 24-dot Strip Commands (ESC * 33 nL nH d1...dk LF)
    ///
    /// Returns one chunk per command, to be written and flushed one at a
    /// time:
    ///
    /// ```text
    /// [ESC 3 24] [strip 0] [strip 1] ... [strip n-1] [ESC 3 30]
    /// n = ceil(rows / 24)
    /// ```
    ///
    /// ## Data Layout
    ///
    /// Each strip carries three bytes per dot column. Byte `i` of a strip
    /// covers column `i / 3` and rows `strip*24 + (i % 3)*8 ..+8`, MSB on
    /// top. Rows past the bottom of the image print white.
    ///
    /// Images wider than 65535 dots cannot be described by nL/nH and are
    /// rejected.
    ///
    /// ## Example
    ///
    /// ```
    /// use boleta::protocol::graphics::RasterImage;
    ///
    /// let image = RasterImage::new(1, 30, vec![0xFF; 30]).unwrap();
    /// let chunks = image.to_strips().unwrap();
    /// assert_eq!(chunks.len(), 2 + 2);
    /// assert_eq!(&chunks[1][..5], &[0x1B, 0x2A, 0x21, 8, 0]);
    /// ```
    pub fn to_strips(&self) -> Result<Vec<Vec<u8>>> {
        let dots = self.width_px();
        let width = u16::try_from(dots).map_err(|_| {
            BoletaError::Image(format!("{} dots is too wide for strip printing", dots))
        })?;
        let [n_l, n_h] = u16_le(width);
        let strips = self.rows.div_ceil(STRIP_ROWS);
        debug!(strips, dots, rows = self.rows, "transcoding raster to strips");

        let mut chunks = Vec::with_capacity(strips + 2);
        chunks.push(commands::line_spacing(commands::STRIP_LINE_SPACING));

        for strip in 0..strips {
            let base_row = strip * STRIP_ROWS;
            let mut cmd = Vec::with_capacity(6 + dots * 3);
            cmd.extend([ESC, b'*', 0x21, n_l, n_h]);
            for i in 0..dots * 3 {
                let column = i / 3;
                let top = base_row + (i % 3) * 8;
                let mut byte = 0u8;
                for k in 0..8 {
                    if top + k >= self.rows {
                        break;
                    }
                    if self.is_black(column, top + k) {
                        byte |= 0x80 >> k;
                    }
                }
                cmd.push(byte);
            }
            cmd.push(LF);
            chunks.push(cmd);
        }

        chunks.push(commands::line_spacing(commands::DEFAULT_LINE_SPACING));
        Ok(chunks)
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_header() {
        assert_eq!(
            envelope_header(2, 3),
            [0x1D, 0x76, 0x30, 0x00, 0x02, 0x00, 0x03, 0x00]
        );
        assert_eq!(envelope_header(0, 0)[4..], [0, 0, 0, 0]);
    }

    #[test]
    fn test_envelope_roundtrip_through_hex() {
        let image = RasterImage::new(2, 2, vec![0xF0, 0x0F, 0xAA, 0x55]).unwrap();
        let hex = image.to_hex();
        assert_eq!(hex, "1d76300002000200f00faa55");
        assert_eq!(RasterImage::from_hex(&hex.to_uppercase()).unwrap(), image);
    }

    #[test]
    fn test_from_envelope_truncated() {
        let mut bytes = envelope_header(4, 4).to_vec();
        bytes.extend([0u8; 10]);
        assert!(matches!(
            RasterImage::from_envelope(&bytes),
            Err(BoletaError::Image(_))
        ));
        assert!(RasterImage::from_envelope(&[0x1D, 0x76]).is_err());
    }

    #[test]
    fn test_from_hex_rejects_garbage() {
        assert!(RasterImage::from_hex("zz").is_err());
        assert!(RasterImage::from_hex("1d7").is_err());
    }

    #[test]
    fn test_new_checks_length() {
        assert!(RasterImage::new(2, 2, vec![0; 3]).is_err());
    }

    #[test]
    fn test_pad_left() {
        let image = RasterImage::new(1, 2, vec![0xFF, 0x81]).unwrap();
        let padded = image.pad_left(2).unwrap();
        assert_eq!(padded.bytes_per_row(), 3);
        assert_eq!(padded.data(), &[0, 0, 0xFF, 0, 0, 0x81]);
        assert_eq!(image.pad_left(0).unwrap(), image);
    }

    #[test]
    fn test_is_black() {
        let image = RasterImage::new(1, 1, vec![0b1000_0001]).unwrap();
        assert!(image.is_black(0, 0));
        assert!(!image.is_black(1, 0));
        assert!(image.is_black(7, 0));
        assert!(!image.is_black(8, 0));
        assert!(!image.is_black(0, 1));
    }

    #[test]
    fn test_strip_count() {
        for (rows, strips) in [(1, 1), (24, 1), (25, 2), (48, 2), (49, 3)] {
            let image = RasterImage::new(1, rows, vec![0; rows]).unwrap();
            let chunks = image.to_strips().unwrap();
            assert_eq!(chunks.len(), strips + 2, "rows = {}", rows);
            assert_eq!(chunks[0], vec![0x1B, 0x33, 0x18]);
            assert_eq!(chunks[chunks.len() - 1], vec![0x1B, 0x33, 0x1E]);
        }
    }

    #[test]
    fn test_strip_layout() {
        // 8 dots wide, 24 rows: only the leftmost dot of row 0 and the
        // rightmost dot of row 23 are black
        let mut data = vec![0u8; 24];
        data[0] = 0x80;
        data[23] = 0x01;
        let image = RasterImage::new(1, 24, data).unwrap();
        let chunks = image.to_strips().unwrap();
        let strip = &chunks[1];

        assert_eq!(strip.len(), 5 + 8 * 3 + 1);
        assert_eq!(&strip[..5], &[0x1B, 0x2A, 0x21, 0x08, 0x00]);
        assert_eq!(*strip.last().unwrap(), LF);

        let body = &strip[5..5 + 24];
        // Column 0, first byte group, row 0 is the top bit
        assert_eq!(body[0], 0x80);
        // Column 7, third byte group, row 23 is the bottom bit
        assert_eq!(body[7 * 3 + 2], 0x01);
        assert_eq!(body.iter().filter(|&&b| b != 0).count(), 2);
    }

    #[test]
    fn test_strip_rejects_wide_image() {
        let image = RasterImage::new(8192, 1, vec![0xFF; 8192]).unwrap();
        assert!(matches!(image.to_strips(), Err(BoletaError::Image(_))));

        // 8191 bytes = 65528 dots still fits
        let image = RasterImage::new(8191, 1, vec![0; 8191]).unwrap();
        let chunks = image.to_strips().unwrap();
        assert_eq!(&chunks[1][..5], &[0x1B, 0x2A, 0x21, 0xF8, 0xFF]);
    }

    #[test]
    fn test_strip_partial_rows_print_white() {
        let image = RasterImage::new(1, 10, vec![0xFF; 10]).unwrap();
        let chunks = image.to_strips().unwrap();
        let body = &chunks[1][5..5 + 24];
        for column in 0..8 {
            assert_eq!(body[column * 3], 0xFF);
            assert_eq!(body[column * 3 + 1], 0xC0);
            assert_eq!(body[column * 3 + 2], 0x00);
        }
    }
}
