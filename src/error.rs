//! # Error Types
//!
//! This module defines error types used throughout the boleta library.
//!
//! Every error is reported to the immediate caller of the print operation.
//! Nothing is retried internally, and bytes already flushed to the sink
//! before a failure stay on the paper.

use thiserror::Error;

/// Main error type for boleta operations
#[derive(Debug, Error)]
pub enum BoletaError {
    /// Malformed markup: bad numeric attribute or unknown barcode type
    #[error("Parse error: {0}")]
    Parse(String),

    /// Barcode code rejected by its symbology or too wide for the paper
    #[error("Barcode error: {0}")]
    Barcode(String),

    /// Text not representable in the configured code page
    #[error("Encoding error: {0}")]
    Encoding(String),

    /// Sink not connected, or the flush to the device failed
    #[error("Connection error: {0}")]
    Connection(String),

    /// Printer geometry or charset that cannot be used
    #[error("Invalid profile: {0}")]
    InvalidProfile(String),

    /// Raster payload that is not a valid image envelope
    #[error("Image error: {0}")]
    Image(String),

    /// I/O error wrapper
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, BoletaError>;
