//! Transient user notifications raised by download actions

use crate::export::ExportFormat;
use serde::Serialize;
use std::fmt;

/// Visual weight of a notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Variant {
    Default,
    Destructive,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub title: String,
    pub description: String,
    pub variant: Variant,
}

impl Notification {
    pub fn downloaded(format: ExportFormat) -> Self {
        Self {
            title: "Success!".to_string(),
            description: format!("QR Code downloaded as {}.", format.label()),
            variant: Variant::Default,
        }
    }

    pub fn download_failed() -> Self {
        Self {
            title: "Download Failed".to_string(),
            description: "Could not generate QR code image.".to_string(),
            variant: Variant::Destructive,
        }
    }

    pub fn target_missing() -> Self {
        Self {
            title: "Error".to_string(),
            description: "QR code element not found.".to_string(),
            variant: Variant::Destructive,
        }
    }

    pub fn is_failure(&self) -> bool {
        self.variant == Variant::Destructive
    }

    /// Log the notification at a level matching its variant.
    pub fn emit(&self) {
        match self.variant {
            Variant::Default => tracing::info!(title = %self.title, "{}", self.description),
            Variant::Destructive => tracing::warn!(title = %self.title, "{}", self.description),
        }
    }
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.title, self.description)
    }
}
