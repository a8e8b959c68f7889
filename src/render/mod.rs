//! # Rendering Module
//!
//! Turns pictures into printer rasters.
//!
//! ## Modules
//!
//! - [`dither`]: RGB bitmap to 1-bit raster, thresholded or with an ordered gradient
//! - [`qr`]: QR module matrix to raster, scaled to a physical size
//!
//! ## Usage Example
//!
//! ```
//! use boleta::render::dither::bitmap_to_raster;
//! use image::{Rgb, RgbImage};
//!
//! let bitmap = RgbImage::from_pixel(16, 2, Rgb([0, 0, 0]));
//! let raster = bitmap_to_raster(&bitmap, false).unwrap();
//!
//! assert_eq!(raster.bytes_per_row(), 2);
//! assert_eq!(raster.data(), &[0xFF; 4]);
//! ```

pub mod dither;
pub mod qr;
