//! Export pipeline
//!
//! Captures the mounted [`CompositeSurface`] as PNG, JPEG or SVG. At most one
//! export runs at a time: [`ExportPipeline::try_begin`] flips the state from
//! idle to exporting and the returned [`ExportGuard`] flips it back when
//! dropped, whatever the outcome.

mod raster;
mod svg;

use crate::error::{Error, Result};
use crate::font::FontResolver;
use crate::surface::{CompositeSurface, SurfaceHandle};
use async_trait::async_trait;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tokio::sync::watch;

/// Fixed JPEG quality factor
pub const JPEG_QUALITY: f32 = 0.95;

/// Output image format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Png,
    Jpeg,
    Svg,
}

impl ExportFormat {
    pub const ALL: [ExportFormat; 3] = [ExportFormat::Png, ExportFormat::Jpeg, ExportFormat::Svg];

    /// File extension, also the format's identifier
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Png => "png",
            ExportFormat::Jpeg => "jpeg",
            ExportFormat::Svg => "svg",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            ExportFormat::Png => "image/png",
            ExportFormat::Jpeg => "image/jpeg",
            ExportFormat::Svg => "image/svg+xml",
        }
    }

    /// Upper-case name used in notifications
    pub fn label(&self) -> &'static str {
        match self {
            ExportFormat::Png => "PNG",
            ExportFormat::Jpeg => "JPEG",
            ExportFormat::Svg => "SVG",
        }
    }

    pub fn is_raster(&self) -> bool {
        !matches!(self, ExportFormat::Svg)
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(value: &str) -> std::result::Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "png" => Ok(ExportFormat::Png),
            "jpeg" | "jpg" => Ok(ExportFormat::Jpeg),
            "svg" => Ok(ExportFormat::Svg),
            other => Err(format!(
                "Unsupported export format '{other}', expected png, jpeg or svg"
            )),
        }
    }
}

/// Options handed to the capture backend
#[derive(Debug, Clone, PartialEq)]
pub struct CaptureOptions {
    pub format: ExportFormat,
    /// Color composited beneath the surface
    pub background: String,
    /// Lossy quality in `0.0..=1.0`, JPEG only
    pub quality: Option<f32>,
}

/// Turns a surface into encoded image bytes
#[async_trait]
pub trait CaptureBackend: Send + Sync {
    async fn capture(
        &self,
        surface: Arc<CompositeSurface>,
        options: CaptureOptions,
    ) -> Result<Vec<u8>>;
}

/// Raster output through `image`/`fontdue`, vector output as an SVG document
#[derive(Debug, Clone, Default)]
pub struct DefaultCapture {
    fonts: FontResolver,
}

impl DefaultCapture {
    pub fn new(fonts: FontResolver) -> Self {
        Self { fonts }
    }
}

#[async_trait]
impl CaptureBackend for DefaultCapture {
    async fn capture(
        &self,
        surface: Arc<CompositeSurface>,
        options: CaptureOptions,
    ) -> Result<Vec<u8>> {
        let fonts = self.fonts.clone();
        tokio::task::spawn_blocking(move || match options.format {
            ExportFormat::Svg => svg::render(&surface, &options),
            ExportFormat::Png | ExportFormat::Jpeg => raster::render(&surface, &options, &fonts),
        })
        .await
        .map_err(|e| Error::Capture(format!("capture task failed: {e}")))?
    }
}

/// A single export request
#[derive(Debug, Clone)]
pub struct ExportJob {
    pub format: ExportFormat,
    pub source: SurfaceHandle,
    pub background_color: String,
}

impl ExportJob {
    pub fn new(
        format: ExportFormat,
        source: SurfaceHandle,
        background_color: impl Into<String>,
    ) -> Self {
        Self {
            format,
            source,
            background_color: background_color.into(),
        }
    }

    fn capture_options(&self) -> CaptureOptions {
        CaptureOptions {
            format: self.format,
            background: self.background_color.clone(),
            quality: (self.format == ExportFormat::Jpeg).then_some(JPEG_QUALITY),
        }
    }
}

/// Encoded image produced by an export
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportArtifact {
    pub format: ExportFormat,
    pub bytes: Vec<u8>,
}

impl ExportArtifact {
    /// `data:<mime>;base64,<payload>`
    pub fn data_uri(&self) -> String {
        let encoded = base64::engine::general_purpose::STANDARD.encode(&self.bytes);
        format!("data:{};base64,{}", self.format.mime_type(), encoded)
    }
}

/// Whether an export is running
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportState {
    Idle,
    Exporting,
}

/// Serializes exports through a capture backend, one at a time
pub struct ExportPipeline {
    backend: Arc<dyn CaptureBackend>,
    state: watch::Sender<ExportState>,
}

impl ExportPipeline {
    pub fn new(backend: Arc<dyn CaptureBackend>) -> Self {
        let (state, _) = watch::channel(ExportState::Idle);
        Self { backend, state }
    }

    pub fn state(&self) -> ExportState {
        *self.state.borrow()
    }

    /// True while export triggers are disabled
    pub fn is_busy(&self) -> bool {
        self.state() == ExportState::Exporting
    }

    pub fn subscribe(&self) -> watch::Receiver<ExportState> {
        self.state.subscribe()
    }

    /// Enter the exporting state, or fail with [`Error::ExportInFlight`].
    pub fn try_begin(&self) -> Result<ExportGuard<'_>> {
        let entered = self.state.send_if_modified(|state| {
            if *state == ExportState::Idle {
                *state = ExportState::Exporting;
                true
            } else {
                false
            }
        });

        if entered {
            Ok(ExportGuard { state: &self.state })
        } else {
            Err(Error::ExportInFlight)
        }
    }

    /// Run `job` to completion, rejecting it if another export is in flight.
    pub async fn export(&self, job: ExportJob) -> Result<ExportArtifact> {
        let _guard = self.try_begin()?;
        self.capture(&job).await
    }

    async fn capture(&self, job: &ExportJob) -> Result<ExportArtifact> {
        let surface = job.source.current().ok_or(Error::CaptureTargetMissing)?;
        let bytes = self
            .backend
            .capture(surface, job.capture_options())
            .await?;

        Ok(ExportArtifact {
            format: job.format,
            bytes,
        })
    }
}

/// Returns the pipeline to idle when dropped
#[must_use = "dropping the guard immediately ends the export"]
pub struct ExportGuard<'a> {
    state: &'a watch::Sender<ExportState>,
}

impl Drop for ExportGuard<'_> {
    fn drop(&mut self) {
        self.state.send_replace(ExportState::Idle);
    }
}

/// Escape text for XML content and attribute values
pub(crate) fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(ch),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::WidgetConfig;
    use crate::surface::PreviewSurface;

    #[test]
    fn test_format_parsing() {
        assert_eq!("PNG".parse::<ExportFormat>(), Ok(ExportFormat::Png));
        assert_eq!("jpg".parse::<ExportFormat>(), Ok(ExportFormat::Jpeg));
        assert_eq!("svg".parse::<ExportFormat>(), Ok(ExportFormat::Svg));
        assert!("gif".parse::<ExportFormat>().is_err());
    }

    #[test]
    fn test_jpeg_gets_fixed_quality() {
        let job = ExportJob::new(ExportFormat::Jpeg, SurfaceHandle::default(), "#FFFFFF");
        assert_eq!(job.capture_options().quality, Some(0.95));
        let job = ExportJob::new(ExportFormat::Png, SurfaceHandle::default(), "#FFFFFF");
        assert_eq!(job.capture_options().quality, None);
    }

    #[test]
    fn test_data_uri() {
        let artifact = ExportArtifact {
            format: ExportFormat::Svg,
            bytes: b"<svg/>".to_vec(),
        };
        assert_eq!(artifact.data_uri(), "data:image/svg+xml;base64,PHN2Zy8+");
    }

    #[test]
    fn test_guard_releases_state() {
        let pipeline = ExportPipeline::new(Arc::new(DefaultCapture::default()));
        {
            let _guard = pipeline.try_begin().unwrap();
            assert!(pipeline.is_busy());
            assert!(matches!(pipeline.try_begin(), Err(Error::ExportInFlight)));
        }
        assert_eq!(pipeline.state(), ExportState::Idle);
    }

    #[tokio::test]
    async fn test_missing_target_returns_to_idle() {
        let pipeline = ExportPipeline::new(Arc::new(DefaultCapture::default()));
        let job = ExportJob::new(ExportFormat::Svg, SurfaceHandle::default(), "#FFFFFF");
        let err = pipeline.export(job).await.unwrap_err();
        assert!(matches!(err, Error::CaptureTargetMissing));
        assert!(!pipeline.is_busy());
    }

    #[tokio::test]
    async fn test_svg_export_through_default_backend() {
        let preview = PreviewSurface::new();
        preview.render(&WidgetConfig::default()).unwrap();

        let pipeline = ExportPipeline::new(Arc::new(DefaultCapture::default()));
        let job = ExportJob::new(ExportFormat::Svg, preview.handle(), "#FFFFFF");
        let artifact = pipeline.export(job).await.unwrap();
        let doc = String::from_utf8(artifact.bytes).unwrap();
        assert!(doc.starts_with("<svg"));
        assert!(doc.contains("Scan Me!"));
    }

    #[test]
    fn test_escape_xml() {
        assert_eq!(escape_xml("a<b & \"c\""), "a&lt;b &amp; &quot;c&quot;");
    }
}
