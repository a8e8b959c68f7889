//! # QR Code Rasterization
//!
//! The QR matrix itself comes from a [`QrMatrixSource`]; this module only
//! scales that matrix into a [`RasterImage`].
//!
//! ## Scaling
//!
//! ```text
//! coefficient   = round(size_px / matrix_width)
//! image width   = matrix_width * coefficient   (dots)
//! bytes_per_row = ceil(image width / 8)
//! ```
//!
//! Every module becomes a `coefficient x coefficient` block of dots. A
//! coefficient below 1 means the symbol cannot be drawn at the requested
//! size, and an empty 0x0 raster is produced instead of an error. A symbol
//! wider or taller than 65535 dots is an error.

use qrcode::{Color, EcLevel, QrCode};
use tracing::warn;

use crate::error::{BoletaError, Result};
use crate::protocol::graphics::RasterImage;

/// A square grid of QR modules, row-major, `true` = dark.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QrMatrix {
    width: usize,
    modules: Vec<bool>,
}

impl QrMatrix {
    /// Build from row-major modules. The grid must be square.
    pub fn new(width: usize, modules: Vec<bool>) -> Result<Self> {
        if modules.len() != width * width {
            return Err(BoletaError::Barcode(format!(
                "QR matrix of width {} needs {} modules, got {}",
                width,
                width * width,
                modules.len()
            )));
        }
        Ok(Self { width, modules })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn is_dark(&self, x: usize, y: usize) -> bool {
        x < self.width && y < self.width && self.modules[y * self.width + x]
    }
}

/// Produces the module matrix for a piece of text.
pub trait QrMatrixSource {
    fn matrix(&self, text: &str) -> Result<QrMatrix>;
}

/// [`QrMatrixSource`] backed by the `qrcode` crate, error correction level L,
/// byte mode over the UTF-8 text.
#[derive(Debug, Clone, Copy, Default)]
pub struct QrCodeSource;

impl QrMatrixSource for QrCodeSource {
    fn matrix(&self, text: &str) -> Result<QrMatrix> {
        let code = QrCode::with_error_correction_level(text.as_bytes(), EcLevel::L)
            .map_err(|e| BoletaError::Barcode(format!("Unable to encode QR code: {}", e)))?;
        let modules = code
            .to_colors()
            .into_iter()
            .map(|c| c == Color::Dark)
            .collect();
        QrMatrix::new(code.width(), modules)
    }
}

/// Largest side a GS v 0 envelope can carry, in dots (rows are a u16).
const MAX_DOTS: usize = u16::MAX as usize;

/// Half-up rounding, as used for every pixel computation.
#[inline]
fn round_half_up(value: f32) -> i32 {
    (value + 0.5).floor() as i32
}

/// Scale a matrix so that it spans roughly `size_px` dots.
///
/// ## Example
///
/// ```
/// use boleta::render::qr::{QrMatrix, scale_matrix};
///
/// let matrix = QrMatrix::new(2, vec![true, false, false, true]).unwrap();
/// let raster = scale_matrix(&matrix, 8).unwrap();
/// // coefficient 4: 8 dots wide, 8 rows
/// assert_eq!(raster.bytes_per_row(), 1);
/// assert_eq!(raster.rows(), 8);
/// assert_eq!(raster.data()[0], 0xF0);
/// assert_eq!(raster.data()[7], 0x0F);
/// ```
pub fn scale_matrix(matrix: &QrMatrix, size_px: i32) -> Result<RasterImage> {
    let width = matrix.width();
    if width == 0 {
        return Ok(RasterImage::empty());
    }
    let coefficient = round_half_up(size_px as f32 / width as f32);
    if coefficient < 1 {
        warn!(size_px, width, "QR code does not fit the requested size");
        return Ok(RasterImage::empty());
    }
    let coefficient = coefficient as usize;
    let dots = width
        .checked_mul(coefficient)
        .filter(|&dots| dots <= MAX_DOTS)
        .ok_or_else(|| {
            BoletaError::Image(format!(
                "QR code of {} dots exceeds the raster envelope limits",
                size_px
            ))
        })?;
    let bytes_per_row = dots.div_ceil(8);
    let mut data = Vec::with_capacity(bytes_per_row * dots);

    for y in 0..width {
        let mut line = vec![0u8; bytes_per_row];
        for px in 0..bytes_per_row * 8 {
            if matrix.is_dark(px / coefficient, y) {
                line[px / 8] |= 0x80 >> (px % 8);
            }
        }
        for _ in 0..coefficient {
            data.extend_from_slice(&line);
        }
    }

    RasterImage::new(bytes_per_row, dots, data)
}

// ============================================================================
// TESTS
// ============================================================================
