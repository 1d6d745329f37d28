//! Form inputs and the clamping each control applies

use crate::font::FontFamily;
use crate::layout::{MAX_FONT_SIZE, MIN_FONT_SIZE};
use crate::store::ConfigStore;

pub const QR_SIZE_MIN: u32 = 64;
pub const QR_SIZE_MAX: u32 = 1024;
pub const QR_SIZE_STEP: u32 = 16;

/// One edit from the form, carrying the raw control value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormInput {
    /// Text or URL to encode
    Content(String),
    LabelText(String),
    LabelColor(String),
    /// Slider, 8..=72
    LabelFontSize(i64),
    LabelFontFamily(FontFamily),
    /// Numeric text field; unparsable input becomes 0
    LabelXOffset(String),
    LabelYOffset(String),
    /// Slider, 64..=1024 in steps of 16
    QrSize(i64),
    QrForeground(String),
    QrBackground(String),
}

/// Clamp a slider value into the label font size range.
pub fn clamp_font_size(value: i64) -> u32 {
    value.clamp(MIN_FONT_SIZE as i64, MAX_FONT_SIZE as i64) as u32
}

/// Clamp into the symbol size range and snap to the nearest slider step.
pub fn snap_qr_size(value: i64) -> u32 {
    let min = QR_SIZE_MIN as i64;
    let step = QR_SIZE_STEP as i64;
    let clamped = value.clamp(min, QR_SIZE_MAX as i64);
    let snapped = min + (clamped - min + step / 2) / step * step;
    snapped.clamp(min, QR_SIZE_MAX as i64) as u32
}

/// Integer parse with leading-prefix semantics: `"12px"` is 12, `"abc"` is 0.
pub fn parse_offset(text: &str) -> i32 {
    let trimmed = text.trim_start();
    let (negative, digits) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };

    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    if end == 0 {
        return 0;
    }

    let magnitude = digits[..end].parse::<i64>().unwrap_or(i64::MAX);
    let value = if negative { -magnitude } else { magnitude };
    value.clamp(i32::MIN as i64, i32::MAX as i64) as i32
}

impl ConfigStore {
    /// Apply a form edit after the control's own clamping/parsing.
    pub fn apply(&self, input: FormInput) {
        tracing::trace!(?input, "Applying form input");
        match input {
            FormInput::Content(value) => self.set_content(value),
            FormInput::LabelText(value) => self.set_label_text(value),
            FormInput::LabelColor(value) => self.set_label_color(value),
            FormInput::LabelFontSize(value) => self.set_label_font_size(clamp_font_size(value)),
            FormInput::LabelFontFamily(family) => self.set_label_font_family(family),
            FormInput::LabelXOffset(text) => self.set_label_x_offset(parse_offset(&text)),
            FormInput::LabelYOffset(text) => self.set_label_y_offset(parse_offset(&text)),
            FormInput::QrSize(value) => self.set_qr_size(snap_qr_size(value)),
            FormInput::QrForeground(value) => self.set_foreground_color(value),
            FormInput::QrBackground(value) => self.set_background_color(value),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_font_size_slider_bounds() {
        assert_eq!(clamp_font_size(-3), 8);
        assert_eq!(clamp_font_size(8), 8);
        assert_eq!(clamp_font_size(40), 40);
        assert_eq!(clamp_font_size(73), 72);
    }

    #[test]
    fn test_qr_size_slider_snaps_to_step() {
        assert_eq!(snap_qr_size(0), 64);
        assert_eq!(snap_qr_size(64), 64);
        assert_eq!(snap_qr_size(70), 64);
        assert_eq!(snap_qr_size(73), 80);
        assert_eq!(snap_qr_size(256), 256);
        assert_eq!(snap_qr_size(1020), 1024);
        assert_eq!(snap_qr_size(5000), 1024);
    }

    #[test]
    fn test_offset_parsing() {
        assert_eq!(parse_offset("12"), 12);
        assert_eq!(parse_offset("-7"), -7);
        assert_eq!(parse_offset("  +3"), 3);
        assert_eq!(parse_offset("15px"), 15);
        assert_eq!(parse_offset(""), 0);
        assert_eq!(parse_offset("abc"), 0);
        assert_eq!(parse_offset("-"), 0);
        assert_eq!(parse_offset("99999999999999"), i32::MAX);
    }

    #[test]
    fn test_apply_routes_to_store() {
        let store = ConfigStore::default();
        store.apply(FormInput::LabelFontSize(200));
        store.apply(FormInput::QrSize(300));
        store.apply(FormInput::LabelXOffset("oops".to_string()));
        store.apply(FormInput::LabelYOffset("-20".to_string()));
        store.apply(FormInput::LabelFontFamily(FontFamily::Impact));

        let config = store.snapshot();
        assert_eq!(config.label.font_size_px, 72);
        assert_eq!(config.qr.size, 304);
        assert_eq!(config.label.x_offset_px, 0);
        assert_eq!(config.label.y_offset_px, -20);
        assert_eq!(config.label.font_family, FontFamily::Impact);
    }
}
