//! The labeled QR widget: form state, live preview and download actions

use crate::config::QrSuiteConfig;
use crate::download::{self, DownloadOutcome, Downloader};
use crate::error::Result;
use crate::export::{CaptureBackend, DefaultCapture, ExportArtifact, ExportFormat, ExportJob, ExportPipeline};
use crate::input::FormInput;
use crate::output::Verification;
use crate::qr::QrDecoder;
use crate::store::{ConfigStore, WidgetConfig};
use crate::surface::PreviewSurface;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::debug;

/// One mounted widget instance
///
/// Owns its configuration store, so separate widgets never share state. Edits
/// go through [`QrWidget::apply`], which re-renders the preview before
/// returning; the store itself is only readable from outside.
pub struct QrWidget {
    store: ConfigStore,
    preview: PreviewSurface,
    pipeline: ExportPipeline,
    downloader: Downloader,
}

impl QrWidget {
    /// Mount with the default capture backend and the configured defaults applied.
    pub fn mount(config: &QrSuiteConfig) -> Result<Self> {
        let backend = DefaultCapture::new(config.export.font_resolver());
        Self::with_backend(config, Arc::new(backend))
    }

    pub fn with_backend(config: &QrSuiteConfig, backend: Arc<dyn CaptureBackend>) -> Result<Self> {
        let store = ConfigStore::default();
        for input in config.defaults.inputs() {
            store.apply(input);
        }

        let preview = PreviewSurface::new();
        preview.render(&store.snapshot())?;
        debug!(output_dir = %config.export.output_dir.display(), "Widget mounted");

        Ok(Self {
            store,
            preview,
            pipeline: ExportPipeline::new(backend),
            downloader: Downloader::new(&config.export.output_dir),
        })
    }

    /// Current form values
    pub fn config(&self) -> WidgetConfig {
        self.store.snapshot()
    }

    /// Observe form changes
    pub fn subscribe(&self) -> watch::Receiver<WidgetConfig> {
        self.store.subscribe()
    }

    pub fn preview(&self) -> &PreviewSurface {
        &self.preview
    }

    pub fn pipeline(&self) -> &ExportPipeline {
        &self.pipeline
    }

    pub fn downloader(&self) -> &Downloader {
        &self.downloader
    }

    /// Apply a form edit and re-render the preview.
    ///
    /// A failed render leaves the preview unmounted until the next successful edit.
    pub fn apply(&self, input: FormInput) -> Result<()> {
        self.store.apply(input);
        self.preview.render(&self.store.snapshot())
    }

    /// Export the preview in `format` and save it, as the matching button would.
    pub async fn download(&self, format: ExportFormat) -> DownloadOutcome {
        // Export exactly what the preview shows, backdrop included
        let background = match self.preview.handle().current() {
            Some(surface) => surface.background.clone(),
            None => self.store.snapshot().qr.background_color,
        };
        let job = ExportJob::new(format, self.preview.handle(), background);
        download::download(&self.pipeline, &self.downloader, job).await
    }

    /// Decode a raster artifact and compare it with the current content.
    pub fn verify(&self, artifact: &ExportArtifact) -> Verification {
        if !artifact.format.is_raster() {
            return Verification::Skipped;
        }

        match QrDecoder::new().decode_bytes(&artifact.bytes) {
            Ok(payload) => {
                let content = self.store.snapshot().qr.content;
                if payload.as_str() == Some(content.as_str()) {
                    Verification::Matched(payload)
                } else {
                    Verification::Mismatch(payload)
                }
            }
            Err(err) => Verification::Failed(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DefaultsOptions;

    #[test]
    fn test_mount_applies_defaults_through_clamping() {
        let config = QrSuiteConfig {
            defaults: DefaultsOptions {
                content: Some("hello".to_string()),
                label_font_size: Some(500),
                qr_size: Some(100),
                ..DefaultsOptions::default()
            },
            ..QrSuiteConfig::default()
        };

        let widget = QrWidget::mount(&config).unwrap();
        let snapshot = widget.config();
        assert_eq!(snapshot.qr.content, "hello");
        assert_eq!(snapshot.label.font_size_px, 72);
        assert_eq!(snapshot.qr.size, 96);
        assert!(widget.preview().handle().is_mounted());
    }

    #[test]
    fn test_apply_rerenders_preview() {
        let widget = QrWidget::mount(&QrSuiteConfig::default()).unwrap();
        widget.apply(FormInput::QrSize(512)).unwrap();
        let surface = widget.preview().handle().current().unwrap();
        assert_eq!(surface.qr.size, 512);
        assert_eq!(surface.width, 544);

        widget.apply(FormInput::LabelText(String::new())).unwrap();
        let surface = widget.preview().handle().current().unwrap();
        assert!(surface.label.is_none());
        assert_eq!(surface.height, 544);
    }

    #[test]
    fn test_oversized_content_unmounts_preview() {
        let widget = QrWidget::mount(&QrSuiteConfig::default()).unwrap();
        assert!(widget.apply(FormInput::Content("x".repeat(4000))).is_err());
        assert!(!widget.preview().handle().is_mounted());

        widget.apply(FormInput::Content("ok".to_string())).unwrap();
        assert!(widget.preview().handle().is_mounted());
    }

    #[tokio::test]
    async fn test_edit_then_download_exports_the_edit() {
        let dir = std::env::temp_dir().join(format!(
            "qrsuite-widget-{}",
            crate::download::next_stamp()
        ));
        let mut config = QrSuiteConfig::default();
        config.export.output_dir = dir.clone();
        let widget = QrWidget::mount(&config).unwrap();
        let mut updates = widget.subscribe();

        widget.apply(FormInput::LabelText(String::new())).unwrap();
        widget
            .apply(FormInput::QrBackground("#EEEEEE".to_string()))
            .unwrap();
        assert!(updates.has_changed().unwrap());
        assert_eq!(updates.borrow_and_update().qr.background_color, "#EEEEEE");

        let outcome = widget.download(ExportFormat::Svg).await;
        let DownloadOutcome::Saved { artifact, .. } = &outcome else {
            panic!("expected a saved export, got {outcome:?}");
        };
        let doc = String::from_utf8(artifact.bytes.clone()).unwrap();
        assert!(!doc.contains("Scan Me!"));
        assert!(doc.contains(r##"height="288" fill="#EEEEEE""##));

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_svg_is_not_verified() {
        let widget = QrWidget::mount(&QrSuiteConfig::default()).unwrap();
        let artifact = ExportArtifact {
            format: ExportFormat::Svg,
            bytes: Vec::new(),
        };
        assert!(matches!(widget.verify(&artifact), Verification::Skipped));
    }
}
