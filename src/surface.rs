//! Composite preview surface
//!
//! A [`CompositeSurface`] is the single block that gets captured on export:
//! the QR symbol over a background fill, plus an optional label laid out
//! beneath it. [`PreviewSurface`] keeps the latest rendering mounted behind a
//! shareable [`SurfaceHandle`].

use crate::error::{Error, Result};
use crate::layout::{ApproxMeasure, LabelStyle, TextMeasure};
use crate::qr::{QrEncoder, QrMatrix};
use crate::store::WidgetConfig;
use serde::Serialize;
use std::sync::{Arc, RwLock};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Padding around the symbol and label, in pixels
pub const SURFACE_PADDING: u32 = 16;
/// Background of the symbol itself; the surface fill shows through
pub const SYMBOL_BACKGROUND: &str = "transparent";
/// Correction level every symbol is encoded with
pub const SYMBOL_EC_LEVEL: char = 'H';
/// Largest symbol edge a surface accepts; keeps every surface dimension in `u32`
pub const MAX_SYMBOL_SIZE: u32 = 1 << 16;

/// The QR symbol node
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QrNode {
    /// Encoded text
    pub content: String,
    pub matrix: QrMatrix,
    /// Edge length in pixels, quiet zone included
    pub size: u32,
    pub foreground: String,
    pub background: &'static str,
    pub ec_level: char,
    pub include_margin: bool,
    /// Top-left corner within the surface
    pub origin: (u32, u32),
}

impl QrNode {
    /// Whether the pixel at `(px, py)` (relative to the node origin) lies on a dark module.
    pub fn is_dark_at(&self, px: u32, py: u32) -> bool {
        if px >= self.size || py >= self.size {
            return false;
        }
        let cells = self.matrix.cells_with_margin() as u64;
        let cx = (px as u64 * cells / self.size as u64) as usize;
        let cy = (py as u64 * cells / self.size as u64) as usize;
        self.matrix.is_dark_cell(cx, cy)
    }

    /// Pixels per module (fractional)
    pub fn module_scale(&self) -> f32 {
        self.size as f32 / self.matrix.cells_with_margin() as f32
    }
}

/// The label node, present only when label text is non-empty
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LabelNode {
    pub text: String,
    pub style: LabelStyle,
    /// Wrapped lines, in order
    pub lines: Vec<String>,
    /// Top-left of the label box before translation
    pub origin: (u32, u32),
    pub box_width: u32,
}

impl LabelNode {
    /// Height of the text block, excluding the top margin
    pub fn block_height(&self) -> u32 {
        (self.lines.len() as f32 * self.style.line_height_px()).ceil() as u32
    }

    /// Top-left of the label box after its translation
    pub fn position(&self) -> (i32, i32) {
        (
            self.origin.0 as i32 + self.style.translate.0,
            self.origin.1 as i32 + self.style.translate.1,
        )
    }
}

/// Symbol plus optional label, the unit of export
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompositeSurface {
    pub background: String,
    pub width: u32,
    pub height: u32,
    pub qr: QrNode,
    pub label: Option<LabelNode>,
}

impl CompositeSurface {
    /// Build the surface for a configuration, wrapping with glyph width estimates.
    pub fn build(config: &WidgetConfig) -> Result<Self> {
        Self::build_with(config, &ApproxMeasure)
    }

    /// Build the surface, wrapping the label with `measure`.
    pub fn build_with(config: &WidgetConfig, measure: &dyn TextMeasure) -> Result<Self> {
        let size = config.qr.size.max(1);
        if size > MAX_SYMBOL_SIZE {
            return Err(Error::Config(format!(
                "QR size {size}px exceeds the {MAX_SYMBOL_SIZE}px limit"
            )));
        }
        let matrix = QrEncoder::new().encode_str(&config.qr.content)?;

        let qr = QrNode {
            content: config.qr.content.clone(),
            matrix,
            size,
            foreground: config.qr.foreground_color.clone(),
            background: SYMBOL_BACKGROUND,
            ec_level: SYMBOL_EC_LEVEL,
            include_margin: true,
            origin: (SURFACE_PADDING, SURFACE_PADDING),
        };

        let label = if config.label.text.is_empty() {
            None
        } else {
            let style = LabelStyle::compute(&config.label, size);
            Some(LabelNode {
                text: config.label.text.clone(),
                lines: Vec::new(),
                origin: (
                    SURFACE_PADDING,
                    SURFACE_PADDING + size + style.margin_top_px,
                ),
                box_width: size,
                style,
            })
        };

        let mut surface = Self {
            background: config.qr.background_color.clone(),
            width: size + 2 * SURFACE_PADDING,
            height: 0,
            qr,
            label,
        };
        surface.relayout(measure);

        debug!(
            width = surface.width,
            height = surface.height,
            label_lines = surface.label.as_ref().map(|l| l.lines.len()).unwrap_or(0),
            "Built composite surface"
        );

        Ok(surface)
    }

    /// Re-wrap the label with `measure` and recompute the surface height.
    pub fn relayout(&mut self, measure: &dyn TextMeasure) {
        let mut height = self.qr.size + 2 * SURFACE_PADDING;
        if let Some(label) = self.label.as_mut() {
            label.lines = label.style.wrap(&label.text, measure);
            height = height
                .saturating_add(label.style.margin_top_px)
                .saturating_add(label.block_height());
        }
        self.height = height;
    }
}

/// Shared reference to whatever surface is currently mounted
#[derive(Debug, Clone, Default)]
pub struct SurfaceHandle {
    inner: Arc<RwLock<Option<Arc<CompositeSurface>>>>,
}

impl SurfaceHandle {
    /// The mounted surface, if any
    pub fn current(&self) -> Option<Arc<CompositeSurface>> {
        self.inner.read().expect("surface lock poisoned").clone()
    }

    pub fn is_mounted(&self) -> bool {
        self.inner.read().expect("surface lock poisoned").is_some()
    }

    fn replace(&self, surface: Option<Arc<CompositeSurface>>) {
        *self.inner.write().expect("surface lock poisoned") = surface;
    }
}

/// Keeps the preview rendering in sync with the configuration
#[derive(Debug, Default)]
pub struct PreviewSurface {
    handle: SurfaceHandle,
}

impl PreviewSurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle for the export pipeline to capture
    pub fn handle(&self) -> SurfaceHandle {
        self.handle.clone()
    }

    /// Render `config` and mount the result.
    ///
    /// On failure the surface is unmounted so a stale rendering is never captured.
    pub fn render(&self, config: &WidgetConfig) -> Result<()> {
        render_into(&self.handle, config)
    }

    pub fn unmount(&self) {
        self.handle.replace(None);
    }

    /// Re-render on every configuration change until the store is dropped.
    pub fn spawn_live(&self, mut updates: watch::Receiver<WidgetConfig>) -> JoinHandle<()> {
        let handle = self.handle.clone();
        tokio::spawn(async move {
            while updates.changed().await.is_ok() {
                let config = updates.borrow_and_update().clone();
                if let Err(err) = render_into(&handle, &config) {
                    warn!("Preview render failed: {err}");
                }
            }
            debug!("Configuration store closed, live preview stopped");
        })
    }
}

fn render_into(handle: &SurfaceHandle, config: &WidgetConfig) -> Result<()> {
    match CompositeSurface::build(config) {
        Ok(surface) => {
            handle.replace(Some(Arc::new(surface)));
            Ok(())
        }
        Err(err) => {
            handle.replace(None);
            Err(err)
        }
    }
}
