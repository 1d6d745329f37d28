//! Error types for qrsuite operations

use thiserror::Error;

/// Result type alias using qrsuite's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for qrsuite operations
#[derive(Error, Debug)]
pub enum Error {
    /// QR code encoding failed
    #[error("Failed to encode QR code: {0}")]
    QrEncode(String),

    /// QR code decoding failed
    #[error("Failed to decode QR code: {0}")]
    QrDecode(String),

    /// No QR code found in image
    #[error("No QR code found in image")]
    NoQrCodeFound,

    /// A color string could not be parsed
    #[error("Invalid color '{0}'")]
    InvalidColor(String),

    /// Font lookup or parsing failed
    #[error("Font error: {0}")]
    Font(String),

    /// The preview surface is not mounted, so there is nothing to capture
    #[error("Capture target is not mounted")]
    CaptureTargetMissing,

    /// The capture backend rejected the request
    #[error("Capture failed: {0}")]
    Capture(String),

    /// Another export is already running
    #[error("An export is already in progress")]
    ExportInFlight,

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Image processing error
    #[error("Image processing error: {0}")]
    Image(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl From<image::ImageError> for Error {
    fn from(e: image::ImageError) -> Self {
        Error::Image(e.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Other(format!("JSON error: {}", e))
    }
}
