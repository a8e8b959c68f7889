//! # Bitmap to Raster Conversion
//!
//! Converts an RGB bitmap into the 1-bit [`RasterImage`] layout printed by
//! `GS v 0`.
//!
//! ## Threshold Mode
//!
//! A pixel prints black when any of its channels is below 160. Good for
//! logos and line art.
//!
//! ## Gradient Mode
//!
//! Grayscale is approximated with an ordered pattern. Each pixel compares
//! its channel sum (0..=765) against a threshold picked from 96 levels:
//!
//! ```text
//! level     = coefficient * 6 + (y mod 6)      coefficient in 0..16
//! threshold = level * 765 / 95
//! ```
//!
//! The coefficient walks a fixed recurrence rather than a lookup matrix:
//!
//! ```text
//! row start:  c0(y+1) = c0(y) + 2, wrapping to 0 past 15
//! per pixel:  c(x+1)  = c(x) + 5,  minus 16 past 15
//! ```
//!
//! The per-pixel walk continues across byte boundaries for the whole row.
//! Printers tuned for this pattern expect it exactly, so it is not
//! replaced with a Bayer matrix.
//!
//! Alpha is ignored; transparent pixels print by their RGB value.

use image::RgbImage;

use crate::error::Result;
use crate::protocol::graphics::RasterImage;

/// Rows in one gradient cycle
pub const GRADIENT_ROWS: usize = 6;

/// Channel value under which threshold mode prints black
pub const BLACK_CHANNEL_LIMIT: u8 = 160;

/// Distance between two adjacent gradient levels, in channel-sum units
const LEVEL_STEP: f64 = 765.0 / (15 * GRADIENT_ROWS + GRADIENT_ROWS - 1) as f64;

/// Threshold-mode test for one pixel.
#[inline]
pub fn is_dark(rgb: [u8; 3]) -> bool {
    rgb.iter().any(|&c| c < BLACK_CHANNEL_LIMIT)
}

/// Gradient-mode test for one pixel.
///
/// ## Example
///
/// ```
/// use boleta::render::dither::gradient_prints;
///
/// // Black always prints except at the very first level
/// assert!(gradient_prints([0, 0, 0], 1, 0));
/// assert!(!gradient_prints([0, 0, 0], 0, 0));
/// // White never prints
/// assert!(!gradient_prints([255, 255, 255], 15, 5));
/// ```
#[inline]
pub fn gradient_prints(rgb: [u8; 3], coefficient: usize, y: usize) -> bool {
    let sum: u32 = rgb.iter().map(|&c| c as u32).sum();
    let level = coefficient * GRADIENT_ROWS + y % GRADIENT_ROWS;
    (sum as f64) < level as f64 * LEVEL_STEP
}

#[inline]
fn next_pixel_coefficient(c: usize) -> usize {
    let c = c + 5;
    if c > 15 { c - 16 } else { c }
}

#[inline]
fn next_row_coefficient(c: usize) -> usize {
    let c = c + 2;
    if c > 15 { 0 } else { c }
}

/// Pack a row of boolean pixel values into bytes.
///
/// - Bit 7 (MSB) = leftmost pixel
/// - 1 = black (print dot), 0 = white (no dot)
///
/// A trailing partial byte is padded with white.
///
/// ```
/// use boleta::render::dither::pack_row;
///
/// let row = vec![true; 12];
/// assert_eq!(pack_row(&row), vec![0xFF, 0xF0]);
/// ```
pub fn pack_row(pixels: &[bool]) -> Vec<u8> {
    let mut bytes = vec![0u8; pixels.len().div_ceil(8)];
    for (i, &pixel) in pixels.iter().enumerate() {
        if pixel {
            bytes[i / 8] |= 0x80 >> (i % 8);
        }
    }
    bytes
}

/// Convert a bitmap to a raster image, one bit per pixel.
///
/// `bytes_per_row = ceil(width / 8)`; the image is not resized here, see
/// [`PrinterProfile::image_to_raster`](crate::printer::PrinterProfile::image_to_raster)
/// for the bounded variant.
pub fn bitmap_to_raster(bitmap: &RgbImage, gradient: bool) -> Result<RasterImage> {
    let (width, height) = (bitmap.width() as usize, bitmap.height() as usize);
    let bytes_per_row = width.div_ceil(8);
    let mut data = Vec::with_capacity(bytes_per_row * height);

    let mut row_coefficient = 0;
    let mut row = Vec::with_capacity(width);
    for y in 0..height {
        let mut coefficient = row_coefficient;
        row.clear();
        for x in 0..width {
            let rgb = bitmap.get_pixel(x as u32, y as u32).0;
            let black = if gradient {
                gradient_prints(rgb, coefficient, y)
            } else {
                is_dark(rgb)
            };
            row.push(black);
            coefficient = next_pixel_coefficient(coefficient);
        }
        data.extend(pack_row(&row));
        row_coefficient = next_row_coefficient(row_coefficient);
    }

    RasterImage::new(bytes_per_row, height, data)
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn test_level_step() {
        assert!((LEVEL_STEP - 8.052_631).abs() < 1e-5);
    }

    #[test]
    fn test_is_dark() {
        assert!(is_dark([159, 255, 255]));
        assert!(is_dark([255, 255, 0]));
        assert!(!is_dark([160, 160, 160]));
    }

    #[test]
    fn test_pixel_coefficient_walk() {
        let mut c = 0;
        let walk: Vec<usize> = (0..5)
            .map(|_| {
                c = next_pixel_coefficient(c);
                c
            })
            .collect();
        assert_eq!(walk, vec![5, 10, 15, 4, 9]);
    }

    #[test]
    fn test_row_coefficient_walk() {
        let mut c = 0;
        let walk: Vec<usize> = (0..9)
            .map(|_| {
                c = next_row_coefficient(c);
                c
            })
            .collect();
        assert_eq!(walk, vec![2, 4, 6, 8, 10, 12, 14, 0, 2]);
    }

    #[test]
    fn test_threshold_mode() {
        let mut bitmap = RgbImage::from_pixel(10, 2, Rgb([255, 255, 255]));
        bitmap.put_pixel(0, 0, Rgb([0, 0, 0]));
        bitmap.put_pixel(9, 1, Rgb([100, 200, 200]));

        let raster = bitmap_to_raster(&bitmap, false).unwrap();
        assert_eq!(raster.bytes_per_row(), 2);
        assert_eq!(raster.rows(), 2);
        assert_eq!(raster.data(), &[0x80, 0x00, 0x00, 0x40]);
    }

    #[test]
    fn test_gradient_black_row() {
        // Black prints wherever the level is above zero. Row 0 starts at
        // coefficient 0, so only its first pixel stays white.
        let bitmap = RgbImage::from_pixel(8, 1, Rgb([0, 0, 0]));
        let raster = bitmap_to_raster(&bitmap, true).unwrap();
        assert_eq!(raster.data(), &[0x7F]);
    }

    #[test]
    fn test_gradient_white_never_prints() {
        let bitmap = RgbImage::from_pixel(16, 12, Rgb([255, 255, 255]));
        let raster = bitmap_to_raster(&bitmap, true).unwrap();
        assert!(raster.data().iter().all(|&b| b == 0));
    }

    #[test]
    fn test_gradient_mid_gray_is_partial() {
        let bitmap = RgbImage::from_pixel(64, 48, Rgb([128, 128, 128]));
        let raster = bitmap_to_raster(&bitmap, true).unwrap();
        let black: u32 = raster.data().iter().map(|b| b.count_ones()).sum();
        let total = 64 * 48;
        assert!(black > total / 4 && black < total * 3 / 4, "black = {}", black);
    }
}
