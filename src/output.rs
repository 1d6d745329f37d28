//! Helpers for rendering download results for the terminal or as JSON

use crate::download::DownloadOutcome;
use crate::qr::QrPayload;
use serde_json::{Map, Value, json};

/// Combined structured and human-readable representation of a download
#[derive(Debug, Clone)]
pub struct RenderedOutcome {
    /// Structured JSON representation suitable for downstream consumers
    pub json: Value,
    /// Human-readable lines for terminal presentation
    pub human: Vec<String>,
}

/// Result of decoding an exported raster back into its payload
#[derive(Debug, Clone)]
pub enum Verification {
    /// The decoded payload matched the configured content
    Matched(QrPayload),
    /// A symbol was decoded but carried different content
    Mismatch(QrPayload),
    /// Decoding failed
    Failed(String),
    /// Vector output is not decoded
    Skipped,
}

impl Verification {
    fn label(&self) -> &'static str {
        match self {
            Verification::Matched(_) => "matched",
            Verification::Mismatch(_) => "mismatch",
            Verification::Failed(_) => "failed",
            Verification::Skipped => "skipped",
        }
    }

    fn value(&self) -> Value {
        let mut root = Map::new();
        root.insert("status".to_string(), Value::from(self.label()));
        match self {
            Verification::Matched(payload) | Verification::Mismatch(payload) => {
                root.insert("decoded".to_string(), json!(payload.as_str()));
                root.insert(
                    "byte_length".to_string(),
                    Value::from(payload.as_bytes().len()),
                );
            }
            Verification::Failed(reason) => {
                root.insert("error".to_string(), Value::from(reason.as_str()));
            }
            Verification::Skipped => {}
        }
        Value::Object(root)
    }
}

/// Render a download outcome into both JSON and human-readable forms.
pub fn render_outcome(
    outcome: &DownloadOutcome,
    include_data_uri: bool,
    verification: Option<&Verification>,
) -> RenderedOutcome {
    let mut root = Map::new();
    let mut human = Vec::new();

    match outcome {
        DownloadOutcome::Saved {
            path,
            artifact,
            notification,
        } => {
            root.insert("status".to_string(), Value::from("saved"));
            root.insert("format".to_string(), Value::from(artifact.format.extension()));
            root.insert("mime_type".to_string(), Value::from(artifact.format.mime_type()));
            root.insert(
                "path".to_string(),
                Value::from(path.display().to_string()),
            );
            root.insert("byte_length".to_string(), Value::from(artifact.bytes.len()));

            human.push(notification.to_string());
            human.push(format!("  File: {}", path.display()));
            human.push(format!("  Size: {} bytes", artifact.bytes.len()));

            if include_data_uri {
                let uri = artifact.data_uri();
                human.push(format!("  Data URI: {uri}"));
                root.insert("data_uri".to_string(), Value::from(uri));
            }
        }
        DownloadOutcome::Failed {
            format,
            error,
            notification,
        } => {
            root.insert("status".to_string(), Value::from("failed"));
            root.insert("format".to_string(), Value::from(format.extension()));
            root.insert("error".to_string(), Value::from(error.as_str()));

            human.push(notification.to_string());
            human.push(format!("  Reason: {error}"));
        }
        DownloadOutcome::Ignored { format } => {
            root.insert("status".to_string(), Value::from("ignored"));
            root.insert("format".to_string(), Value::from(format.extension()));
            human.push(format!(
                "{} export ignored: another export is in progress",
                format.label()
            ));
        }
    }

    if let Some(notification) = outcome.notification() {
        root.insert("notification".to_string(), json!(notification));
    }

    if let Some(verification) = verification {
        root.insert("verification".to_string(), verification.value());
        match verification {
            Verification::Matched(_) => human.push("  Verified: decoded content matches".to_string()),
            Verification::Mismatch(payload) => human.push(format!(
                "  Verification mismatch: decoded {:?}",
                payload.as_str().unwrap_or("<binary>")
            )),
            Verification::Failed(reason) => human.push(format!("  Verification failed: {reason}")),
            Verification::Skipped => {}
        }
    }

    RenderedOutcome {
        json: Value::Object(root),
        human,
    }
}
