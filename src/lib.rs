//! qrsuite - QR codes with a styled caption, exported as PNG, JPEG or SVG
//!
//! The library models a small generator widget: a configuration store edited
//! through form inputs, a preview surface composing the QR symbol with an
//! optional text label underneath, and an export pipeline that captures that
//! surface into an image file.
//!
//! # Features
//!
//! - **Composite Surface**: Symbol, padding and wrapped label laid out as one unit
//! - **Exports**: PNG/JPEG through `image` + `fontdue`, SVG as a standalone document
//! - **Single-flight**: Only one export runs at a time; extra requests are ignored
//! - **Async-first**: Built on Tokio; capture runs on the blocking pool
//!
//! # Example
//!
//! ```no_run
//! use qrsuite::{ExportFormat, FormInput, QrSuiteConfig, QrWidget};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let widget = QrWidget::mount(&QrSuiteConfig::default())?;
//!     widget.apply(FormInput::LabelText("Menu".to_string()))?;
//!
//!     let outcome = widget.download(ExportFormat::Svg).await;
//!     if let Some(notification) = outcome.notification() {
//!         println!("{notification}");
//!     }
//!     Ok(())
//! }
//! ```

#![warn(rust_2024_compatibility)]

pub mod color;
pub mod config;
pub mod download;
pub mod error;
pub mod export;
pub mod font;
pub mod input;
pub mod layout;
pub mod logging;
pub mod metrics;
pub mod notify;
pub mod output;
pub mod qr;
pub mod store;
pub mod surface;
pub mod widget;

// Re-exports for convenience
pub use error::{Error, Result};

pub use color::Rgba;
pub use config::{DefaultsOptions, ExportOptions, LogRotation, LoggingOptions, QrSuiteConfig};
pub use download::{DownloadOutcome, Downloader};
pub use export::{
    CaptureBackend, CaptureOptions, DefaultCapture, ExportArtifact, ExportFormat, ExportJob,
    ExportPipeline, ExportState,
};
pub use font::{FontFamily, FontResolver};
pub use input::FormInput;
pub use layout::LabelStyle;
pub use notify::{Notification, Variant};
pub use qr::{QrDecoder, QrEncoder, QrPayload};
pub use store::{ConfigStore, LabelConfig, QrConfig, WidgetConfig};
pub use surface::{CompositeSurface, PreviewSurface, SurfaceHandle};
pub use widget::QrWidget;
