//! # ESC/POS Barcode Commands
//!
//! 1D barcodes (`GS k`) and the native QR command group (`GS ( k`).
//!
//! ## Supported 1D Symbologies
//!
//! | Type | GS k m | Code length | Check digit |
//! |------|--------|-------------|-------------|
//! | UPC-A | 65 | 12 | computed |
//! | UPC-E | 66 | 6 | none |
//! | EAN-13 | 67 | 13 | computed |
//! | EAN-8 | 68 | 8 | computed |
//! | Code39 | 69 | data length | none |
//! | Code128 | 73 | data length | none |
//!
//! ## Module Width
//!
//! The module (narrowest bar) width is chosen so that the whole symbol
//! spans a target width, 70% of the paper unless specified:
//!
//! ```text
//! col_width = round(target_px / cols_count)
//! if col_width * cols_count > paper_px { col_width -= 1 }
//! ```
//!
//! ## Print Sequence
//!
//! ```
//! use boleta::printer::PrinterProfile;
//! use boleta::protocol::barcode::{BarcodeSpec, Symbology, TextPosition};
//!
//! let profile = PrinterProfile::mm58();
//! let spec = BarcodeSpec::new(&profile, Symbology::Ean13, "590123412345", 0.0, 10.0,
//!     TextPosition::Below).unwrap();
//! assert_eq!(spec.code(), "5901234123457");
//!
//! let cmd = spec.command();
//! assert_eq!(&cmd[..9], &[0x1D, 0x48, 0x02, 0x1D, 0x77, 0x03, 0x1D, 0x68, 80]);
//! ```

use super::commands::GS;
use crate::error::{BoletaError, Result};
use crate::printer::PrinterProfile;

// ============================================================================
// SYMBOLOGIES
// ============================================================================

/// 1D barcode symbology
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Symbology {
    UpcA,
    UpcE,
    Ean13,
    Ean8,
    Code39,
    Code128,
}

/// How many characters a symbology carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodeLength {
    Fixed(usize),
    /// Whatever the caller supplies
    Data,
}

/// Validation applied to the code before printing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodeRule {
    /// Digits only; the last digit is replaced by a computed check digit
    CheckDigit,
    /// Digits only, truncated to the code length
    Digits,
    /// Any ASCII
    Ascii,
}

/// Validation and sizing parameters of one symbology.
///
/// `cols_count = code_length * cols_per_char + cols_overhead`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SymbologyParams {
    /// `m` parameter of `GS k`
    pub type_code: u8,
    pub code_length: CodeLength,
    pub rule: CodeRule,
    pub cols_per_char: usize,
    pub cols_overhead: usize,
}

impl Symbology {
    pub fn params(self) -> SymbologyParams {
        let (type_code, code_length, rule, cols_per_char, cols_overhead) = match self {
            Self::UpcA => (65, CodeLength::Fixed(12), CodeRule::CheckDigit, 7, 11),
            Self::UpcE => (66, CodeLength::Fixed(6), CodeRule::Digits, 7, 16),
            Self::Ean13 => (67, CodeLength::Fixed(13), CodeRule::CheckDigit, 7, 11),
            Self::Ean8 => (68, CodeLength::Fixed(8), CodeRule::CheckDigit, 7, 11),
            Self::Code39 => (69, CodeLength::Data, CodeRule::Ascii, 16, 64),
            Self::Code128 => (73, CodeLength::Data, CodeRule::Ascii, 11, 55),
        };
        SymbologyParams {
            type_code,
            code_length,
            rule,
            cols_per_char,
            cols_overhead,
        }
    }

    /// Parse the `type` attribute of a `<barcode>` tag.
    pub fn from_attr(value: &str) -> Option<Self> {
        match value {
            "upca" => Some(Self::UpcA),
            "upce" => Some(Self::UpcE),
            "ean13" => Some(Self::Ean13),
            "ean8" => Some(Self::Ean8),
            "39" => Some(Self::Code39),
            "128" => Some(Self::Code128),
            _ => None,
        }
    }
}

/// Human readable text placement (GS H n)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextPosition {
    None = 0,
    Above = 1,
    #[default]
    Below = 2,
}

impl TextPosition {
    /// Parse the `text` attribute; unknown values keep the default.
    pub fn from_attr(value: &str) -> Self {
        match value {
            "none" => Self::None,
            "above" => Self::Above,
            _ => Self::Below,
        }
    }
}

// ============================================================================
// CHECK DIGIT
// ============================================================================

/// Compute the weighted check digit of a numeric payload.
///
/// Digits are weighted 3, 1, 3, ... starting from the rightmost one.
///
/// ```
/// use boleta::protocol::barcode::check_digit;
///
/// assert_eq!(check_digit("590123412345").unwrap(), '7');
/// assert_eq!(check_digit("9638507").unwrap(), '4');
/// assert!(check_digit("12a").is_err());
/// ```
pub fn check_digit(payload: &str) -> Result<char> {
    let mut sum = 0u32;
    for (i, c) in payload.chars().rev().enumerate() {
        let digit = c
            .to_digit(10)
            .ok_or_else(|| BoletaError::Barcode("Invalid barcode number".into()))?;
        sum += if i % 2 == 0 { digit * 3 } else { digit };
    }
    let check = (10 - sum % 10) % 10;
    Ok(char::from(b'0' + check as u8))
}

// ============================================================================
// BARCODE SPEC
// ============================================================================

/// A validated barcode, sized for one printer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BarcodeSpec {
    symbology: Symbology,
    code: String,
    text_position: TextPosition,
    col_width: u32,
    height_px: i32,
}

impl BarcodeSpec {
    /// Validate `code`, complete its check digit and size it for `profile`.
    ///
    /// `width_mm` of 0 targets 70% of the paper; widths above the paper
    /// width are capped to it.
    pub fn new(
        profile: &PrinterProfile,
        symbology: Symbology,
        code: &str,
        width_mm: f32,
        height_mm: f32,
        text_position: TextPosition,
    ) -> Result<Self> {
        let params = symbology.params();
        let code = normalize_code(code, &params)?;
        let code_length = match params.code_length {
            CodeLength::Fixed(n) => n,
            CodeLength::Data => code.len(),
        };
        let cols_count = code_length * params.cols_per_char + params.cols_overhead;
        let col_width = col_width(profile, width_mm, cols_count)?;

        Ok(Self {
            symbology,
            code,
            text_position,
            col_width,
            height_px: profile.mm_to_px(height_mm),
        })
    }

    pub fn symbology(&self) -> Symbology {
        self.symbology
    }

    /// The code as printed, check digit included
    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn text_position(&self) -> TextPosition {
        self.text_position
    }

    /// Module width in dots
    pub fn col_width(&self) -> u32 {
        self.col_width
    }

    /// Bar height in dots
    pub fn height_px(&self) -> i32 {
        self.height_px
    }

    /// # Full Barcode Sequence
    ///
    /// ```text
    /// GS H pos     text position
    /// GS w n       module width
    /// GS h n       bar height
    /// GS k m len code...
    /// ```
    ///
    /// Width and height are sent as their low byte.
    pub fn command(&self) -> Vec<u8> {
        let mut cmd = Vec::with_capacity(13 + self.code.len());
        cmd.extend([GS, b'H', self.text_position as u8]);
        cmd.extend([GS, b'w', self.col_width as u8]);
        cmd.extend([GS, b'h', self.height_px as u8]);
        cmd.extend([
            GS,
            b'k',
            self.symbology.params().type_code,
            self.code.len() as u8,
        ]);
        cmd.extend(self.code.bytes());
        cmd
    }
}

fn normalize_code(code: &str, params: &SymbologyParams) -> Result<String> {
    match (params.rule, params.code_length) {
        (CodeRule::CheckDigit, CodeLength::Fixed(len)) => {
            let payload_len = len - 1;
            if code.chars().count() < payload_len {
                return Err(BoletaError::Barcode(
                    "Code is too short for the barcode type.".into(),
                ));
            }
            let payload: String = code.chars().take(payload_len).collect();
            let check = check_digit(&payload)?;
            Ok(format!("{}{}", payload, check))
        }
        (CodeRule::Digits, CodeLength::Fixed(len)) => {
            if code.chars().count() < len {
                return Err(BoletaError::Barcode(
                    "Code is too short for the barcode type.".into(),
                ));
            }
            let digits: String = code.chars().take(len).collect();
            if !digits.chars().all(|c| c.is_ascii_digit()) {
                return Err(BoletaError::Barcode("Invalid barcode number".into()));
            }
            Ok(digits)
        }
        _ => {
            if !code.is_ascii() {
                return Err(BoletaError::Barcode(format!(
                    "Barcode data must be ASCII: {:?}",
                    code
                )));
            }
            Ok(code.to_string())
        }
    }
}

fn col_width(profile: &PrinterProfile, width_mm: f32, cols_count: usize) -> Result<u32> {
    let paper_px = profile.width_px() as i64;
    let target_mm = if width_mm == 0.0 {
        profile.width_mm() * 0.7
    } else {
        width_mm
    };
    let target_px = if target_mm > profile.width_mm() {
        paper_px
    } else {
        profile.mm_to_px(target_mm) as i64
    };

    let cols = cols_count as i64;
    let mut col_width = (target_px as f64 / cols as f64 + 0.5).floor() as i64;
    if col_width * cols > paper_px {
        col_width -= 1;
    }
    if col_width <= 0 {
        return Err(BoletaError::Barcode(
            "Barcode is too long for the paper size.".into(),
        ));
    }
    Ok(col_width as u32)
}

// ============================================================================
// NATIVE QR CODE (GS ( k)
// ============================================================================

/// Printer-rendered QR codes.
///
/// ```text
/// GS ( k 04 00 31 41 model 00     select model
/// GS ( k 03 00 31 43 size         module size in dots (1..=16)
/// GS ( k 03 00 31 45 30           error correction L
/// GS ( k pL pH 31 50 30 data...   store data, p = len + 3
/// GS ( k 03 00 31 51 30           print
/// ```
pub mod qr {
    use super::GS;
    use crate::protocol::commands::u16_le;

    /// QR code model
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    #[repr(u8)]
    pub enum QrModel {
        Model1 = 49,
        #[default]
        Model2 = 50,
    }

    pub fn set_model(model: QrModel) -> Vec<u8> {
        vec![GS, b'(', b'k', 0x04, 0x00, 0x31, 0x41, model as u8, 0x00]
    }

    /// Module size, clamped to the 1..=16 range the firmware accepts.
    pub fn set_module_size(size: i32) -> Vec<u8> {
        let size = size.clamp(1, 16) as u8;
        vec![GS, b'(', b'k', 0x03, 0x00, 0x31, 0x43, size]
    }

    /// Error correction level L
    pub fn set_error_correction() -> Vec<u8> {
        vec![GS, b'(', b'k', 0x03, 0x00, 0x31, 0x45, 0x30]
    }

    pub fn store(data: &[u8]) -> Vec<u8> {
        let [p_l, p_h] = u16_le((data.len() + 3) as u16);
        let mut cmd = Vec::with_capacity(8 + data.len());
        cmd.extend([GS, b'(', b'k', p_l, p_h, 0x31, 0x50, 0x30]);
        cmd.extend_from_slice(data);
        cmd
    }

    pub fn print() -> Vec<u8> {
        vec![GS, b'(', b'k', 0x03, 0x00, 0x31, 0x51, 0x30]
    }

    /// Complete sequence for `text`, encoded as UTF-8.
    pub fn generate(model: QrModel, text: &str, module_size: i32) -> Vec<u8> {
        let mut cmd = Vec::new();
        cmd.extend(set_model(model));
        cmd.extend(set_module_size(module_size));
        cmd.extend(set_error_correction());
        cmd.extend(store(text.as_bytes()));
        cmd.extend(print());
        cmd
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn ean13(code: &str) -> Result<BarcodeSpec> {
        BarcodeSpec::new(
            &PrinterProfile::mm58(),
            Symbology::Ean13,
            code,
            0.0,
            10.0,
            TextPosition::Below,
        )
    }

    #[test]
    fn test_check_digit_known_values() {
        // EAN-13 4006381333931
        assert_eq!(check_digit("400638133393").unwrap(), '1');
        // UPC-A 036000291452
        assert_eq!(check_digit("03600029145").unwrap(), '2');
        // sum % 10 == 0 gives 0
        assert_eq!(check_digit("0000000").unwrap(), '0');
    }

    #[test]
    fn test_check_digit_stable_on_prefix() {
        for payload in ["590123412345", "9638507", "12345678901"] {
            let digit = check_digit(payload).unwrap();
            let full = format!("{}{}", payload, digit);
            let prefix = &full[..full.len() - 1];
            assert_eq!(check_digit(prefix).unwrap(), digit);
        }
    }

    #[test]
    fn test_ean13_appends_check_digit() {
        let spec = ean13("590123412345").unwrap();
        assert_eq!(spec.code(), "5901234123457");
    }

    #[test]
    fn test_ean13_replaces_wrong_check_digit() {
        let spec = ean13("5901234123450").unwrap();
        assert_eq!(spec.code(), "5901234123457");
    }

    #[test]
    fn test_ean13_too_short() {
        let err = ean13("12345").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Barcode error: Code is too short for the barcode type."
        );
    }

    #[test]
    fn test_ean13_not_numeric() {
        let err = ean13("59012341234X").unwrap_err();
        assert_eq!(err.to_string(), "Barcode error: Invalid barcode number");
    }

    #[test]
    fn test_upce_truncates_without_check_digit() {
        let spec = BarcodeSpec::new(
            &PrinterProfile::mm58(),
            Symbology::UpcE,
            "01234567",
            0.0,
            10.0,
            TextPosition::None,
        )
        .unwrap();
        assert_eq!(spec.code(), "012345");
    }

    #[test]
    fn test_col_width_default_target() {
        // 58mm: target 33.6mm -> 269 dots; EAN-13 has 102 cols -> round(2.64) = 3,
        // but 3 * 102 = 306 fits in 384 dots
        let spec = ean13("590123412345").unwrap();
        assert_eq!(spec.col_width(), 3);
        assert_eq!(spec.height_px(), 80);
    }

    #[test]
    fn test_col_width_decrements_to_fit() {
        // Target wider than the paper is capped to 384 dots.
        // Code128 of 30 chars: 385 cols -> round(0.997) = 1, 1 * 385 > 384 -> 0
        let err = BarcodeSpec::new(
            &PrinterProfile::mm58(),
            Symbology::Code128,
            &"A".repeat(30),
            100.0,
            10.0,
            TextPosition::Below,
        )
        .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Barcode error: Barcode is too long for the paper size."
        );
    }

    #[test]
    fn test_code128_command() {
        let spec = BarcodeSpec::new(
            &PrinterProfile::mm58(),
            Symbology::Code128,
            "AB12",
            0.0,
            5.0,
            TextPosition::Above,
        )
        .unwrap();
        // 99 cols, target 269 dots -> round(2.72) = 3
        assert_eq!(
            spec.command(),
            vec![
                0x1D, 0x48, 0x01, 0x1D, 0x77, 0x03, 0x1D, 0x68, 40, 0x1D, 0x6B, 73, 4, b'A', b'B',
                b'1', b'2'
            ]
        );
    }

    #[test]
    fn test_code39_rejects_non_ascii() {
        assert!(
            BarcodeSpec::new(
                &PrinterProfile::mm58(),
                Symbology::Code39,
                "ÉTÉ",
                0.0,
                10.0,
                TextPosition::Below,
            )
            .is_err()
        );
    }

    #[test]
    fn test_symbology_from_attr() {
        assert_eq!(Symbology::from_attr("ean8"), Some(Symbology::Ean8));
        assert_eq!(Symbology::from_attr("128"), Some(Symbology::Code128));
        assert_eq!(Symbology::from_attr("qr"), None);
        assert_eq!(TextPosition::from_attr("bogus"), TextPosition::Below);
    }

    #[test]
    fn test_native_qr_sequence() {
        let cmd = qr::generate(qr::QrModel::Model2, "hi", 20);
        assert_eq!(
            cmd,
            vec![
                0x1D, 0x28, 0x6B, 0x04, 0x00, 0x31, 0x41, 50, 0x00, //
                0x1D, 0x28, 0x6B, 0x03, 0x00, 0x31, 0x43, 16, //
                0x1D, 0x28, 0x6B, 0x03, 0x00, 0x31, 0x45, 0x30, //
                0x1D, 0x28, 0x6B, 0x05, 0x00, 0x31, 0x50, 0x30, b'h', b'i', //
                0x1D, 0x28, 0x6B, 0x03, 0x00, 0x31, 0x51, 0x30,
            ]
        );
        assert_eq!(qr::set_module_size(0)[7], 1);
    }
}
