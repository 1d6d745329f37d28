//! QR code encoder

use crate::error::{Error, Result};
use crate::qr::QrPayload;
use qrcode::{Color, EcLevel, QrCode};
use serde::Serialize;

/// Quiet zone drawn around the symbol, in modules
pub const MARGIN_MODULES: usize = 4;

/// Dark/light module grid of an encoded symbol, without quiet zone
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QrMatrix {
    width: usize,
    modules: Vec<bool>,
}

impl QrMatrix {
    /// Modules per side, excluding the quiet zone
    pub fn width(&self) -> usize {
        self.width
    }

    pub fn is_dark(&self, x: usize, y: usize) -> bool {
        x < self.width && y < self.width && self.modules[y * self.width + x]
    }

    /// Modules per side including the quiet zone
    pub fn cells_with_margin(&self) -> usize {
        self.width + 2 * MARGIN_MODULES
    }

    /// Whether the quiet-zone-inclusive cell at `(cx, cy)` is dark.
    pub fn is_dark_cell(&self, cx: usize, cy: usize) -> bool {
        cx >= MARGIN_MODULES
            && cy >= MARGIN_MODULES
            && self.is_dark(cx - MARGIN_MODULES, cy - MARGIN_MODULES)
    }
}

/// QR code encoder
pub struct QrEncoder {
    /// Error correction level
    ecc_level: EcLevel,
}

impl QrEncoder {
    /// Create a new QR encoder at the highest correction level (H)
    pub fn new() -> Self {
        Self {
            ecc_level: EcLevel::H,
        }
    }

    #[cfg(test)]
    fn with_ecc_level(ecc_level: EcLevel) -> Self {
        Self { ecc_level }
    }

    /// Build the symbol itself, for renderers that draw from a `QrCode`
    pub fn symbol(&self, data: &[u8]) -> Result<QrCode> {
        QrCode::with_error_correction_level(data, self.ecc_level)
            .map_err(|e| Error::QrEncode(format!("Failed to create QR code: {}", e)))
    }

    /// Encode a payload into its module matrix
    pub fn encode(&self, payload: &QrPayload) -> Result<QrMatrix> {
        let code = self.symbol(&payload.data)?;

        let modules = code
            .to_colors()
            .into_iter()
            .map(|color| color == Color::Dark)
            .collect();

        tracing::debug!(
            width = code.width(),
            bytes = payload.data.len(),
            "Encoded QR symbol"
        );

        Ok(QrMatrix {
            width: code.width(),
            modules,
        })
    }

    /// Encode a string into its module matrix
    pub fn encode_str(&self, data: &str) -> Result<QrMatrix> {
        let payload = QrPayload::from_string(data.to_string());
        self.encode(&payload)
    }
}

impl Default for QrEncoder {
    fn default() -> Self {
        Self::new()
    }
}
