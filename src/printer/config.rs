//! # Printer Configuration
//!
//! Printer geometry and millimeter/dot conversion.
//!
//! ## Built-in Profiles
//!
//! | Name | Resolution | Print width | Characters per line |
//! |------|------------|-------------|---------------------|
//! | 58mm | 203 DPI | 48 mm | 32 |
//! | 80mm | 203 DPI | 72 mm | 48 |
//!
//! ## Usage
//!
//! ```
//! use boleta::printer::PrinterProfile;
//!
//! let profile = PrinterProfile::mm58();
//! assert_eq!(profile.mm_to_px(20.0), 160);
//! assert_eq!(profile.width_px(), 384);
//! assert_eq!(profile.char_width_px(), 12);
//! ```

use std::path::Path;

use image::DynamicImage;
use image::imageops::FilterType;
use serde::Deserialize;
use tracing::debug;

use crate::error::{BoletaError, Result};
use crate::protocol::graphics::RasterImage;
use crate::protocol::text::Charset;
use crate::render::dither;

/// Millimeters per inch
pub const INCH_TO_MM: f32 = 25.4;

/// Tallest image accepted by [`PrinterProfile::image_to_raster`]
pub const MAX_IMAGE_HEIGHT: u32 = 256;

/// # Printer Profile
///
/// Immutable geometry of one printer, plus the code page its text is
/// encoded with.
///
/// ## Derived Widths
///
/// ```text
/// raster_px     = mm_to_px(width_mm)
/// width_px      = raster_px + raster_px mod 8
/// char_width_px = raster_px / chars_per_line
/// ```
///
/// `width_px` grows by the remainder instead of rounding up to the next
/// byte boundary. Image and barcode sizing depend on this exact value, so
/// it is kept as firmware-tuned layouts expect it.
#[derive(Debug, Clone, PartialEq)]
pub struct PrinterProfile {
    dpi: u32,
    width_mm: f32,
    chars_per_line: usize,
    width_px: usize,
    char_width_px: usize,
    charset: Charset,
}

impl PrinterProfile {
    /// Create a profile, rejecting geometry that cannot lay out text.
    pub fn new(dpi: u32, width_mm: f32, chars_per_line: usize) -> Result<Self> {
        if dpi == 0 {
            return Err(BoletaError::InvalidProfile("dpi must be positive".into()));
        }
        if !width_mm.is_finite() || width_mm <= 0.0 {
            return Err(BoletaError::InvalidProfile(format!(
                "paper width must be positive, got {}",
                width_mm
            )));
        }
        if chars_per_line == 0 {
            return Err(BoletaError::InvalidProfile(
                "characters per line must be positive".into(),
            ));
        }

        let raster_px = mm_to_px(dpi, width_mm).max(0) as usize;
        Ok(Self {
            dpi,
            width_mm,
            chars_per_line,
            width_px: raster_px + raster_px % 8,
            char_width_px: raster_px / chars_per_line,
            charset: Charset::default(),
        })
    }

    /// 58mm roll: 203 DPI, 48mm printable, 32 characters
    pub fn mm58() -> Self {
        Self {
            dpi: 203,
            width_mm: 48.0,
            chars_per_line: 32,
            width_px: 384,
            char_width_px: 12,
            charset: Charset::default(),
        }
    }

    /// 80mm roll: 203 DPI, 72mm printable, 48 characters
    pub fn mm80() -> Self {
        Self {
            dpi: 203,
            width_mm: 72.0,
            chars_per_line: 48,
            width_px: 582,
            char_width_px: 11,
            charset: Charset::default(),
        }
    }

    /// Replace the code page used for text.
    pub fn with_charset(mut self, charset: Charset) -> Self {
        self.charset = charset;
        self
    }

    pub fn dpi(&self) -> u32 {
        self.dpi
    }

    pub fn width_mm(&self) -> f32 {
        self.width_mm
    }

    pub fn chars_per_line(&self) -> usize {
        self.chars_per_line
    }

    /// Printable width in dots
    pub fn width_px(&self) -> usize {
        self.width_px
    }

    /// Dots covered by one normal-size character
    pub fn char_width_px(&self) -> usize {
        self.char_width_px
    }

    pub fn charset(&self) -> &Charset {
        &self.charset
    }

    /// Convert millimeters to dots, rounding half up.
    ///
    /// ```
    /// use boleta::printer::PrinterProfile;
    ///
    /// let profile = PrinterProfile::mm58();
    /// assert_eq!(profile.mm_to_px(0.0), 0);
    /// assert_eq!(profile.mm_to_px(10.0), 80);
    /// ```
    #[inline]
    pub fn mm_to_px(&self, mm: f32) -> i32 {
        mm_to_px(self.dpi, mm)
    }

    /// Fit an image inside `(width_px, 256)` and convert it to raster.
    ///
    /// Oversized images are downscaled with a bilinear filter, keeping the
    /// aspect ratio. Smaller images are never enlarged.
    pub fn image_to_raster(&self, image: &DynamicImage, gradient: bool) -> Result<RasterImage> {
        let (mut width, mut height) = (image.width(), image.height());
        let max_width = self.width_px as u32;
        let mut resized = false;

        if width > max_width {
            height = round_half_up(height as f32 * max_width as f32 / width as f32).max(1) as u32;
            width = max_width;
            resized = true;
        }
        if height > MAX_IMAGE_HEIGHT {
            width = round_half_up(width as f32 * MAX_IMAGE_HEIGHT as f32 / height as f32).max(1)
                as u32;
            height = MAX_IMAGE_HEIGHT;
            resized = true;
        }

        let rgb = if resized {
            debug!(
                from = ?(image.width(), image.height()),
                to = ?(width, height),
                "downscaling image"
            );
            image.resize_exact(width, height, FilterType::Triangle).to_rgb8()
        } else {
            image.to_rgb8()
        };

        dither::bitmap_to_raster(&rgb, gradient)
    }

    /// Parse a profile name.
    ///
    /// Formats:
    /// - `"58mm"` / `"80mm"` → built-in profiles
    /// - `"DPI:WIDTH_MM:CHARS"` → custom geometry (e.g. `"180:72:42"`)
    pub fn parse(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "58mm" | "58" => Ok(Self::mm58()),
            "80mm" | "80" => Ok(Self::mm80()),
            other => {
                let parts: Vec<&str> = other.split(':').collect();
                let [dpi, width, chars] = parts.as_slice() else {
                    return Err(BoletaError::InvalidProfile(format!(
                        "Unknown profile '{}'. Use '58mm', '80mm' or 'DPI:WIDTH_MM:CHARS'",
                        s
                    )));
                };
                let dpi = dpi
                    .parse()
                    .map_err(|_| BoletaError::InvalidProfile(format!("Invalid dpi: {}", dpi)))?;
                let width = width
                    .parse()
                    .map_err(|_| BoletaError::InvalidProfile(format!("Invalid width: {}", width)))?;
                let chars = chars.parse().map_err(|_| {
                    BoletaError::InvalidProfile(format!("Invalid characters per line: {}", chars))
                })?;
                Self::new(dpi, width, chars)
            }
        }
    }

    /// Load a profile from a JSON file, see [`ProfileFile`].
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    /// Load a profile from JSON text, see [`ProfileFile`].
    pub fn from_json(text: &str) -> Result<Self> {
        let file: ProfileFile = serde_json::from_str(text)
            .map_err(|e| BoletaError::InvalidProfile(format!("Invalid profile JSON: {}", e)))?;
        file.into_profile()
    }
}

impl Default for PrinterProfile {
    fn default() -> Self {
        Self::mm58()
    }
}

fn mm_to_px(dpi: u32, mm: f32) -> i32 {
    round_half_up(mm * dpi as f32 / INCH_TO_MM)
}

#[inline]
fn round_half_up(value: f32) -> i32 {
    (value + 0.5).floor() as i32
}

// ============================================================================
// PROFILE FILE
// ============================================================================

/// On-disk profile description.
///
/// ```json
/// {
///   "dpi": 203,
///   "width_mm": 48,
///   "chars_per_line": 32,
///   "charset": { "label": "ibm866", "id": 17 }
/// }
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct ProfileFile {
    pub dpi: u32,
    pub width_mm: f32,
    pub chars_per_line: usize,
    #[serde(default)]
    pub charset: Option<CharsetConfig>,
}

/// Code page section of a [`ProfileFile`]
#[derive(Debug, Clone, Deserialize)]
pub struct CharsetConfig {
    pub label: String,
    pub id: u8,
}

impl ProfileFile {
    pub fn into_profile(self) -> Result<PrinterProfile> {
        let profile = PrinterProfile::new(self.dpi, self.width_mm, self.chars_per_line)?;
        match self.charset {
            Some(c) => Ok(profile.with_charset(Charset::new(&c.label, c.id)?)),
            None => Ok(profile),
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    #[test]
    fn test_presets_match_new() {
        assert_eq!(PrinterProfile::new(203, 48.0, 32).unwrap(), PrinterProfile::mm58());
        assert_eq!(PrinterProfile::new(203, 72.0, 48).unwrap(), PrinterProfile::mm80());
    }

    #[test]
    fn test_width_px_adds_remainder() {
        // 72mm at 203 DPI is 575 dots; 575 % 8 = 7, so width is 582 (not 576)
        let profile = PrinterProfile::mm80();
        assert_eq!(profile.mm_to_px(72.0), 575);
        assert_eq!(profile.width_px(), 582);
        // char width uses the unadjusted dot count
        assert_eq!(profile.char_width_px(), 575 / 48);
    }

    #[test]
    fn test_mm_to_px_rounds_half_up() {
        let profile = PrinterProfile::new(254, 10.0, 10).unwrap();
        // 254 dpi = 10 dots per mm
        assert_eq!(profile.mm_to_px(0.05), 1);
        assert_eq!(profile.mm_to_px(0.04), 0);
    }

    #[test]
    fn test_mm_to_px_monotonic() {
        let profile = PrinterProfile::mm58();
        let mut last = profile.mm_to_px(0.0);
        assert_eq!(last, 0);
        for step in 1..2000 {
            let px = profile.mm_to_px(step as f32 * 0.05);
            assert!(px >= last);
            last = px;
        }
    }

    #[test]
    fn test_new_rejects_invalid() {
        assert!(PrinterProfile::new(0, 48.0, 32).is_err());
        assert!(PrinterProfile::new(203, 0.0, 32).is_err());
        assert!(PrinterProfile::new(203, f32::NAN, 32).is_err());
        assert!(PrinterProfile::new(203, 48.0, 0).is_err());
    }

    #[test]
    fn test_parse() {
        assert_eq!(PrinterProfile::parse("58mm").unwrap(), PrinterProfile::mm58());
        assert_eq!(PrinterProfile::parse("80MM").unwrap(), PrinterProfile::mm80());
        let custom = PrinterProfile::parse("180:72:42").unwrap();
        assert_eq!(custom.dpi(), 180);
        assert_eq!(custom.chars_per_line(), 42);
        assert!(PrinterProfile::parse("tsp650").is_err());
        assert!(PrinterProfile::parse("203:x:32").is_err());
    }

    #[test]
    fn test_from_json() {
        let profile = PrinterProfile::from_json(
            r#"{ "dpi": 203, "width_mm": 48, "chars_per_line": 32,
                 "charset": { "label": "ibm866", "id": 17 } }"#,
        )
        .unwrap();
        assert_eq!(profile.width_px(), 384);
        assert_eq!(profile.charset().id(), 17);

        let plain =
            PrinterProfile::from_json(r#"{ "dpi": 203, "width_mm": 48, "chars_per_line": 32 }"#)
                .unwrap();
        assert_eq!(plain.charset(), &Charset::default());

        assert!(PrinterProfile::from_json(r#"{ "dpi": 203 }"#).is_err());
        assert!(
            PrinterProfile::from_json(
                r#"{ "dpi": 203, "width_mm": 48, "chars_per_line": 32,
                     "charset": { "label": "nope", "id": 1 } }"#
            )
            .is_err()
        );
    }

    #[test]
    fn test_image_to_raster_keeps_small_images() {
        let image = DynamicImage::ImageRgb8(RgbImage::from_pixel(20, 10, Rgb([0, 0, 0])));
        let raster = PrinterProfile::mm58().image_to_raster(&image, false).unwrap();
        assert_eq!(raster.bytes_per_row(), 3);
        assert_eq!(raster.rows(), 10);
    }

    #[test]
    fn test_image_to_raster_bounds() {
        let profile = PrinterProfile::mm58();

        let wide = DynamicImage::ImageRgb8(RgbImage::new(768, 100));
        let raster = profile.image_to_raster(&wide, false).unwrap();
        assert_eq!(raster.width_px(), 384);
        assert_eq!(raster.rows(), 50);

        let tall = DynamicImage::ImageRgb8(RgbImage::new(100, 512));
        let raster = profile.image_to_raster(&tall, false).unwrap();
        assert_eq!(raster.rows(), 256);
        assert_eq!(raster.bytes_per_row(), 50usize.div_ceil(8));
    }
}
