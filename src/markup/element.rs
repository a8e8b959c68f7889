//! Printable pieces of a column.
//!
//! | Element | Width (characters) | Emits |
//! |---------|--------------------|-------|
//! | Text | encoded bytes x size width factor | charset, changed styles, bytes |
//! | Image | ceil(image dots / char width) | raster (envelope or strips) |
//! | Barcode | characters per line | justification, barcode |
//! | Qr | same as image | raster |
//!
//! Widths are computed once, when the element is built.

use std::collections::HashMap;

use crate::error::{BoletaError, Result};
use crate::printer::config::PrinterProfile;
use crate::protocol::barcode::{BarcodeSpec, Symbology, TextPosition};
use crate::protocol::encoder::ProtocolEncoder;
use crate::protocol::graphics::RasterImage;
use crate::protocol::text::{Alignment, TextStyle};
use crate::render::qr::{QrMatrixSource, scale_matrix};
use crate::transport::Sink;

/// Default barcode height (millimeters)
const BARCODE_HEIGHT_MM: f32 = 10.0;

/// Default QR code side (millimeters)
pub const QR_SIZE_MM: f32 = 20.0;

#[derive(Debug, Clone, PartialEq)]
pub enum Element {
    Text(TextRun),
    Image(ImageRun),
    Barcode(BarcodeRun),
    Qr(ImageRun),
}

impl Element {
    /// Characters this element occupies on the line.
    pub fn width(&self) -> usize {
        match self {
            Self::Text(run) => run.width,
            Self::Image(run) | Self::Qr(run) => run.width,
            Self::Barcode(run) => run.width,
        }
    }

    pub fn is_text(&self) -> bool {
        matches!(self, Self::Text(_))
    }

    pub fn emit<S: Sink>(&self, encoder: &mut ProtocolEncoder<S>) -> Result<()> {
        match self {
            Self::Text(run) => encoder.print_text(&run.text, run.style),
            Self::Image(run) | Self::Qr(run) => encoder.print_image(&run.image),
            Self::Barcode(run) => {
                encoder.set_align(run.alignment)?;
                encoder.print_barcode(&run.barcode)
            }
        }
    }
}

/// Text printed with one fixed style.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextRun {
    text: String,
    style: TextStyle,
    width: usize,
}

impl TextRun {
    /// Fails when `text` has no representation in the profile's code page.
    pub fn new(text: impl Into<String>, style: TextStyle, profile: &PrinterProfile) -> Result<Self> {
        let text = text.into();
        let width = profile.charset().encode(&text)?.len() * style.size.width_factor();
        Ok(Self { text, style, width })
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn style(&self) -> TextStyle {
        self.style
    }
}

/// A raster image shifted into place with white bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRun {
    image: RasterImage,
    width: usize,
}

impl ImageRun {
    /// Position `image` on the paper. Left alignment leaves it untouched.
    ///
    /// ```
    /// use boleta::markup::element::ImageRun;
    /// use boleta::printer::config::PrinterProfile;
    /// use boleta::protocol::graphics::RasterImage;
    /// use boleta::protocol::text::Alignment;
    ///
    /// let profile = PrinterProfile::mm58(); // 384 dots
    /// let image = RasterImage::new(8, 1, vec![0xFF; 8]).unwrap();
    ///
    /// // (384 - 64) / 8 = 40 spare bytes, half of them on the left
    /// let run = ImageRun::new(image, Alignment::Center, &profile).unwrap();
    /// assert_eq!(run.image().bytes_per_row(), 28);
    /// assert_eq!(run.width(), 6);
    /// ```
    pub fn new(image: RasterImage, alignment: Alignment, profile: &PrinterProfile) -> Result<Self> {
        let dots = image.width_px();
        let spare_bytes = (profile.width_px() as i64 - dots as i64) / 8;
        let insert = match alignment {
            Alignment::Left => 0,
            Alignment::Center => spare_bytes / 2,
            Alignment::Right => spare_bytes,
        };
        let width = dots.div_ceil(profile.char_width_px().max(1));
        let image = if insert > 0 {
            image.pad_left(insert as usize)?
        } else {
            image
        };
        Ok(Self { image, width })
    }

    /// Decode an `<img>` hex payload.
    pub fn from_hex(hex: &str, alignment: Alignment, profile: &PrinterProfile) -> Result<Self> {
        Self::new(RasterImage::from_hex(hex)?, alignment, profile)
    }

    /// Render `<qrcode>` data through `source` and scale it to `attributes["size"]` mm.
    pub fn qr_code(
        data: &str,
        attributes: &HashMap<String, String>,
        alignment: Alignment,
        profile: &PrinterProfile,
        source: &dyn QrMatrixSource,
    ) -> Result<Self> {
        let size_mm = parse_mm(attributes, "size", QR_SIZE_MM, "Invalid QR code size value")?;
        let data = data.trim_matches(|c: char| c <= ' ');
        let matrix = source.matrix(data)?;
        let raster = scale_matrix(&matrix, profile.mm_to_px(size_mm))?;
        Self::new(raster, alignment, profile)
    }

    pub fn image(&self) -> &RasterImage {
        &self.image
    }

    pub fn width(&self) -> usize {
        self.width
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BarcodeRun {
    barcode: BarcodeSpec,
    alignment: Alignment,
    width: usize,
}

impl BarcodeRun {
    /// Build from `<barcode>` attributes: `type` (default ean13), `width` and
    /// `height` in mm (defaults 0 and 10), `text` position (default below).
    pub fn from_attributes(
        code: &str,
        attributes: &HashMap<String, String>,
        alignment: Alignment,
        profile: &PrinterProfile,
    ) -> Result<Self> {
        let height = parse_mm(attributes, "height", BARCODE_HEIGHT_MM, "Invalid barcode height value")?;
        let width = parse_mm(attributes, "width", 0.0, "Invalid barcode width value")?;
        let text_position = attributes
            .get("text")
            .map(|v| TextPosition::from_attr(v))
            .unwrap_or_default();
        let kind = attributes.get("type").map(String::as_str).unwrap_or("ean13");
        let symbology = Symbology::from_attr(kind)
            .ok_or_else(|| BoletaError::Parse(format!("Invalid barcode attribute: {}", kind)))?;

        let barcode = BarcodeSpec::new(profile, symbology, code.trim(), width, height, text_position)?;
        Ok(Self {
            barcode,
            alignment,
            width: profile.chars_per_line(),
        })
    }

    pub fn barcode(&self) -> &BarcodeSpec {
        &self.barcode
    }

    pub fn alignment(&self) -> Alignment {
        self.alignment
    }
}

fn parse_mm(
    attributes: &HashMap<String, String>,
    key: &str,
    default: f32,
    message: &str,
) -> Result<f32> {
    match attributes.get(key) {
        Some(value) => value
            .trim()
            .parse::<f32>()
            .map_err(|_| BoletaError::Parse(message.to_string())),
        None => Ok(default),
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::text::TextSize;
    use crate::render::qr::QrMatrix;
    use crate::transport::MemorySink;

    struct FixedMatrix(usize);

    impl QrMatrixSource for FixedMatrix {
        fn matrix(&self, _text: &str) -> Result<QrMatrix> {
            QrMatrix::new(self.0, vec![true; self.0 * self.0])
        }
    }

    fn attrs(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_text_width_uses_size_factor() {
        let profile = PrinterProfile::mm58();
        let style = TextStyle {
            size: TextSize::Big2,
            ..TextStyle::default()
        };
        let run = TextRun::new("café", style, &profile).unwrap();
        assert_eq!(Element::Text(run).width(), 12);

        let tall = TextStyle {
            size: TextSize::Tall,
            ..TextStyle::default()
        };
        assert_eq!(Element::Text(TextRun::new("ab", tall, &profile).unwrap()).width(), 2);
    }

    #[test]
    fn test_text_outside_charset_fails() {
        let profile = PrinterProfile::mm58();
        assert!(matches!(
            TextRun::new("Ω", TextStyle::default(), &profile),
            Err(BoletaError::Encoding(_))
        ));
    }

    #[test]
    fn test_image_alignment_padding() {
        let profile = PrinterProfile::mm58();
        let image = || RasterImage::new(8, 2, vec![0xFF; 16]).unwrap();

        let left = ImageRun::new(image(), Alignment::Left, &profile).unwrap();
        assert_eq!(left.image().bytes_per_row(), 8);

        let right = ImageRun::new(image(), Alignment::Right, &profile).unwrap();
        assert_eq!(right.image().bytes_per_row(), 48);
        assert!(right.image().data()[..40].iter().all(|&b| b == 0));
        assert_eq!(right.image().data()[40], 0xFF);
        // width follows the unpadded image
        assert_eq!(right.width(), 6);
    }

    #[test]
    fn test_image_wider_than_paper_is_not_shifted() {
        let profile = PrinterProfile::mm58();
        let image = RasterImage::new(50, 1, vec![0xFF; 50]).unwrap();
        let run = ImageRun::new(image, Alignment::Right, &profile).unwrap();
        assert_eq!(run.image().bytes_per_row(), 50);
        // 400 dots / 12
        assert_eq!(run.width(), 34);
    }

    #[test]
    fn test_barcode_defaults() {
        let profile = PrinterProfile::mm58();
        let run = BarcodeRun::from_attributes(" 590123412345 ", &HashMap::new(), Alignment::Center, &profile)
            .unwrap();
        assert_eq!(run.barcode().symbology(), Symbology::Ean13);
        assert_eq!(run.barcode().code(), "5901234123457");
        assert_eq!(run.barcode().text_position(), TextPosition::Below);
        assert_eq!(run.barcode().height_px(), 80);
        assert_eq!(Element::Barcode(run).width(), 32);
    }

    #[test]
    fn test_barcode_attribute_errors() {
        let profile = PrinterProfile::mm58();
        let err = BarcodeRun::from_attributes("1", &attrs(&[("type", "qr")]), Alignment::Left, &profile)
            .unwrap_err();
        assert_eq!(err.to_string(), "Parse error: Invalid barcode attribute: qr");

        let err = BarcodeRun::from_attributes("1", &attrs(&[("height", "tall")]), Alignment::Left, &profile)
            .unwrap_err();
        assert_eq!(err.to_string(), "Parse error: Invalid barcode height value");

        let err = BarcodeRun::from_attributes("1", &attrs(&[("width", "")]), Alignment::Left, &profile)
            .unwrap_err();
        assert_eq!(err.to_string(), "Parse error: Invalid barcode width value");
    }

    #[test]
    fn test_barcode_emits_alignment_first() {
        let profile = PrinterProfile::mm58();
        let run = BarcodeRun::from_attributes(
            "ABC",
            &attrs(&[("type", "128"), ("text", "none")]),
            Alignment::Right,
            &profile,
        )
        .unwrap();
        let command = run.barcode().command();
        let element = Element::Barcode(run);

        let mut encoder = ProtocolEncoder::new(MemorySink::new(), Default::default());
        element.emit(&mut encoder).unwrap();
        let pending = encoder.sink().pending();
        assert_eq!(&pending[..3], &[0x1B, 0x61, 0x02]);
        assert_eq!(&pending[3..], command.as_slice());
    }

    #[test]
    fn test_qr_code_scaled_to_size() {
        let profile = PrinterProfile::mm58();
        // 20mm = 160 dots, 20 modules -> 8 dots each
        let run = ImageRun::qr_code("data", &HashMap::new(), Alignment::Left, &profile, &FixedMatrix(20))
            .unwrap();
        assert_eq!(run.image().bytes_per_row(), 20);
        assert_eq!(run.image().rows(), 160);
        assert_eq!(run.width(), 14);
    }

    #[test]
    fn test_qr_code_too_large_is_empty() {
        let profile = PrinterProfile::mm58();
        // 1mm = 8 dots, 21 modules do not fit
        let run = ImageRun::qr_code("data", &attrs(&[("size", "1")]), Alignment::Left, &profile, &FixedMatrix(21))
            .unwrap();
        assert_eq!(run.image(), &RasterImage::empty());
        assert_eq!(run.width(), 0);
    }

    #[test]
    fn test_qr_size_beyond_envelope_is_rejected() {
        let profile = PrinterProfile::mm58();
        let err = ImageRun::qr_code(
            "x",
            &attrs(&[("size", "1000000")]),
            Alignment::Center,
            &profile,
            &FixedMatrix(21),
        )
        .unwrap_err();
        assert!(matches!(err, BoletaError::Image(_)));
    }

    #[test]
    fn test_qr_code_bad_size() {
        let profile = PrinterProfile::mm58();
        let err = ImageRun::qr_code("x", &attrs(&[("size", "big")]), Alignment::Left, &profile, &FixedMatrix(21))
            .unwrap_err();
        assert_eq!(err.to_string(), "Parse error: Invalid QR code size value");
    }
}
