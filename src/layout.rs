//! Label layout calculation
//!
//! Maps a [`LabelConfig`] plus the current symbol size to the style the
//! label is drawn with, and wraps label text to the resulting max width.

use crate::font::FontFamily;
use crate::store::LabelConfig;
use serde::Serialize;

pub const MIN_FONT_SIZE: u32 = 8;
pub const MAX_FONT_SIZE: u32 = 72;
/// Line height as a multiple of the font size
pub const LINE_HEIGHT: f32 = 1.2;
/// Spacing between the symbol and the label block
pub const LABEL_MARGIN_TOP: u32 = 8;

/// Horizontal alignment of label lines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    Center,
}

/// Resolved style for the label node
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LabelStyle {
    pub color: String,
    pub font_size_px: u32,
    pub font_family: FontFamily,
    /// Translation applied after layout, `(x, y)` in pixels
    pub translate: (i32, i32),
    pub text_align: TextAlign,
    pub max_width_px: u32,
    pub word_wrap: bool,
    pub line_height: f32,
    pub margin_top_px: u32,
}

impl LabelStyle {
    /// Compute the label style for a symbol of `qr_size` pixels.
    pub fn compute(label: &LabelConfig, qr_size: u32) -> Self {
        Self {
            color: label.color.clone(),
            font_size_px: label.font_size_px.clamp(MIN_FONT_SIZE, MAX_FONT_SIZE),
            font_family: label.font_family,
            translate: (label.x_offset_px, label.y_offset_px),
            text_align: TextAlign::Center,
            max_width_px: qr_size,
            word_wrap: true,
            line_height: LINE_HEIGHT,
            margin_top_px: LABEL_MARGIN_TOP,
        }
    }

    /// Line height in pixels, rounded to hundredths so `20 * 1.2` is exactly 24.
    pub fn line_height_px(&self) -> f32 {
        (self.font_size_px as f32 * self.line_height * 100.0).round() / 100.0
    }

    /// Inline CSS declarations equivalent to this style.
    pub fn to_css(&self) -> String {
        format!(
            "color: {}; font-size: {}px; font-family: {}; transform: translate({}px, {}px); \
             text-align: center; margin: {}px 0 0 0; max-width: {}px; word-break: break-word; \
             line-height: {}",
            self.color,
            self.font_size_px,
            self.font_family.css_value(),
            self.translate.0,
            self.translate.1,
            self.margin_top_px,
            self.max_width_px,
            self.line_height,
        )
    }

    /// Wrap `text` into lines no wider than the max width.
    pub fn wrap(&self, text: &str, measure: &dyn TextMeasure) -> Vec<String> {
        wrap_text(
            text,
            self.max_width_px as f32,
            self.font_size_px as f32,
            measure,
        )
    }
}

/// Horizontal text metrics used for wrapping
pub trait TextMeasure {
    /// Advance width of `ch` at `font_size` pixels
    fn advance(&self, ch: char, font_size: f32) -> f32;

    fn width(&self, text: &str, font_size: f32) -> f32 {
        text.chars().map(|ch| self.advance(ch, font_size)).sum()
    }
}

/// Font-independent estimate: every glyph is 0.6em wide.
#[derive(Debug, Clone, Copy, Default)]
pub struct ApproxMeasure;

impl TextMeasure for ApproxMeasure {
    fn advance(&self, _ch: char, font_size: f32) -> f32 {
        font_size * 0.6
    }
}

/// Greedy word wrap with `break-word` semantics.
///
/// Whitespace runs collapse to single spaces. A word that cannot fit on a
/// line by itself is split between characters.
pub fn wrap_text(
    text: &str,
    max_width: f32,
    font_size: f32,
    measure: &dyn TextMeasure,
) -> Vec<String> {
    let mut lines = Vec::new();
    let mut line = String::new();

    for word in text.split_whitespace() {
        if !line.is_empty() {
            let candidate = format!("{line} {word}");
            if measure.width(&candidate, font_size) <= max_width {
                line = candidate;
                continue;
            }
            lines.push(std::mem::take(&mut line));
        }

        if measure.width(word, font_size) <= max_width {
            line.push_str(word);
            continue;
        }

        for ch in word.chars() {
            let advance = measure.advance(ch, font_size);
            if !line.is_empty() && measure.width(&line, font_size) + advance > max_width {
                lines.push(std::mem::take(&mut line));
            }
            line.push(ch);
        }
    }

    if !line.is_empty() {
        lines.push(line);
    }

    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    fn label(font_size_px: u32) -> LabelConfig {
        LabelConfig {
            font_size_px,
            x_offset_px: -4,
            y_offset_px: 9,
            ..LabelConfig::default()
        }
    }

    #[test]
    fn test_font_size_is_clamped() {
        for (input, expected) in [(0, 8), (8, 8), (20, 20), (72, 72), (500, 72)] {
            let style = LabelStyle::compute(&label(input), 256);
            assert_eq!(style.font_size_px, expected, "input {input}");
        }
    }

    #[test]
    fn test_max_width_tracks_qr_size() {
        for size in [64, 256, 1024] {
            assert_eq!(LabelStyle::compute(&label(20), size).max_width_px, size);
        }
    }

    #[test]
    fn test_style_fields() {
        let style = LabelStyle::compute(&label(20), 256);
        assert_eq!(style.translate, (-4, 9));
        assert_eq!(style.text_align, TextAlign::Center);
        assert!(style.word_wrap);
        assert_eq!(style.line_height, 1.2);
        assert!((style.line_height_px() - 24.0).abs() < 1e-3);
    }

    #[test]
    fn test_css_output() {
        let css = LabelStyle::compute(&label(20), 256).to_css();
        assert!(css.contains("font-size: 20px"));
        assert!(css.contains("transform: translate(-4px, 9px)"));
        assert!(css.contains("max-width: 256px"));
        assert!(css.contains("line-height: 1.2"));
        assert!(css.contains("var(--font-geist-sans), Arial, sans-serif"));
    }

    #[test]
    fn test_wrap_short_text_is_single_line() {
        let lines = wrap_text("Scan Me!", 256.0, 20.0, &ApproxMeasure);
        assert_eq!(lines, vec!["Scan Me!".to_string()]);
    }

    #[test]
    fn test_wrap_breaks_on_words() {
        // 6px per glyph at 10px, so ten glyphs fit in 62px
        let lines = wrap_text("alpha beta gamma delta", 62.0, 10.0, &ApproxMeasure);
        assert_eq!(lines, vec!["alpha beta", "gamma", "delta"]);
    }

    #[test]
    fn test_wrap_breaks_long_words() {
        let lines = wrap_text("abcdefghijklmnop", 32.0, 10.0, &ApproxMeasure);
        assert_eq!(lines, vec!["abcde", "fghij", "klmno", "p"]);
    }

    #[test]
    fn test_wrap_empty_text() {
        assert!(wrap_text("   ", 100.0, 12.0, &ApproxMeasure).is_empty());
    }
}
