//! Configuration store backing the live preview
//!
//! Holds every user-editable field of the widget. Setters replace a single
//! field and notify subscribers through a [`tokio::sync::watch`] channel; no
//! validation happens here (the input surface in [`crate::input`] clamps
//! numeric ranges before calling in).

use crate::font::FontFamily;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;

/// Placeholder content shown when the widget mounts
pub const DEFAULT_CONTENT: &str = "https://example.com";
/// Placeholder label greeting
pub const DEFAULT_LABEL_TEXT: &str = "Scan Me!";
pub const DEFAULT_QR_SIZE: u32 = 256;
pub const DEFAULT_LABEL_FONT_SIZE: u32 = 20;
/// Small gap below the symbol
pub const DEFAULT_LABEL_Y_OFFSET: i32 = 5;
pub const DEFAULT_FOREGROUND: &str = "#000000";
pub const DEFAULT_BACKGROUND: &str = "#FFFFFF";

/// Parameters of the QR symbol
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QrConfig {
    /// Text or URL encoded in the symbol
    pub content: String,
    /// Edge length of the symbol in pixels
    pub size: u32,
    pub foreground_color: String,
    pub background_color: String,
}

impl Default for QrConfig {
    fn default() -> Self {
        Self {
            content: DEFAULT_CONTENT.to_string(),
            size: DEFAULT_QR_SIZE,
            foreground_color: DEFAULT_FOREGROUND.to_string(),
            background_color: DEFAULT_BACKGROUND.to_string(),
        }
    }
}

/// Parameters of the text label drawn under the symbol
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelConfig {
    pub text: String,
    pub color: String,
    pub font_size_px: u32,
    pub font_family: FontFamily,
    pub x_offset_px: i32,
    pub y_offset_px: i32,
}

impl Default for LabelConfig {
    fn default() -> Self {
        Self {
            text: DEFAULT_LABEL_TEXT.to_string(),
            color: DEFAULT_FOREGROUND.to_string(),
            font_size_px: DEFAULT_LABEL_FONT_SIZE,
            font_family: FontFamily::default(),
            x_offset_px: 0,
            y_offset_px: DEFAULT_LABEL_Y_OFFSET,
        }
    }
}

/// Everything the preview and the export pipeline read
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WidgetConfig {
    pub qr: QrConfig,
    pub label: LabelConfig,
}

/// Observable holder for [`WidgetConfig`]
#[derive(Debug)]
pub struct ConfigStore {
    sender: watch::Sender<WidgetConfig>,
}

impl Default for ConfigStore {
    fn default() -> Self {
        Self::new(WidgetConfig::default())
    }
}

impl ConfigStore {
    pub fn new(initial: WidgetConfig) -> Self {
        let (sender, _) = watch::channel(initial);
        Self { sender }
    }

    /// Clone of the current configuration
    pub fn snapshot(&self) -> WidgetConfig {
        self.sender.borrow().clone()
    }

    /// Receiver that wakes on every effective change
    pub fn subscribe(&self) -> watch::Receiver<WidgetConfig> {
        self.sender.subscribe()
    }

    /// Replace one field, notifying subscribers only when the value changed.
    fn replace<T, F>(&self, value: T, field: F)
    where
        T: PartialEq,
        F: FnOnce(&mut WidgetConfig) -> &mut T,
    {
        self.sender.send_if_modified(|config| {
            let slot = field(config);
            if *slot == value {
                false
            } else {
                *slot = value;
                true
            }
        });
    }

    pub fn set_content(&self, content: impl Into<String>) {
        self.replace(content.into(), |c| &mut c.qr.content);
    }

    pub fn set_qr_size(&self, size: u32) {
        self.replace(size, |c| &mut c.qr.size);
    }

    pub fn set_foreground_color(&self, color: impl Into<String>) {
        self.replace(color.into(), |c| &mut c.qr.foreground_color);
    }

    pub fn set_background_color(&self, color: impl Into<String>) {
        self.replace(color.into(), |c| &mut c.qr.background_color);
    }

    pub fn set_label_text(&self, text: impl Into<String>) {
        self.replace(text.into(), |c| &mut c.label.text);
    }

    pub fn set_label_color(&self, color: impl Into<String>) {
        self.replace(color.into(), |c| &mut c.label.color);
    }

    pub fn set_label_font_size(&self, size: u32) {
        self.replace(size, |c| &mut c.label.font_size_px);
    }

    pub fn set_label_font_family(&self, family: FontFamily) {
        self.replace(family, |c| &mut c.label.font_family);
    }

    pub fn set_label_x_offset(&self, offset: i32) {
        self.replace(offset, |c| &mut c.label.x_offset_px);
    }

    pub fn set_label_y_offset(&self, offset: i32) {
        self.replace(offset, |c| &mut c.label.y_offset_px);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = WidgetConfig::default();
        assert_eq!(config.qr.content, "https://example.com");
        assert_eq!(config.qr.size, 256);
        assert_eq!(config.qr.foreground_color, "#000000");
        assert_eq!(config.qr.background_color, "#FFFFFF");
        assert_eq!(config.label.text, "Scan Me!");
        assert_eq!(config.label.font_size_px, 20);
        assert_eq!(config.label.font_family, FontFamily::GeistSans);
    }

    #[test]
    fn test_setters_replace_single_field() {
        let store = ConfigStore::default();
        store.set_label_text("Hello");
        store.set_qr_size(512);

        let snapshot = store.snapshot();
        assert_eq!(snapshot.label.text, "Hello");
        assert_eq!(snapshot.qr.size, 512);
        assert_eq!(snapshot.qr.content, DEFAULT_CONTENT);
    }

    #[test]
    fn test_subscribers_only_wake_on_change() {
        let store = ConfigStore::default();
        let mut rx = store.subscribe();

        store.set_content(DEFAULT_CONTENT);
        assert!(!rx.has_changed().unwrap());

        store.set_label_x_offset(-12);
        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().label.x_offset_px, -12);
    }
}
