//! Bitmap capture of a composite surface

use super::{CaptureOptions, ExportFormat};
use crate::color::Rgba;
use crate::error::{Error, Result};
use crate::font::FontResolver;
use crate::layout::TextMeasure;
use crate::surface::{CompositeSurface, LabelNode};
use fontdue::Font;
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ExtendedColorType, ImageFormat, RgbImage, RgbaImage};
use std::io::Cursor;

/// Rasterize `surface` and encode it as PNG or JPEG.
pub(super) fn render(
    surface: &CompositeSurface,
    options: &CaptureOptions,
    fonts: &FontResolver,
) -> Result<Vec<u8>> {
    let backdrop = Rgba::parse(&options.background)?;
    let fill = Rgba::parse(&surface.background)?;
    let foreground = Rgba::parse(&surface.qr.foreground)?;

    // Lay the label out again with real glyph widths before sizing the canvas
    let mut surface = surface.clone();
    let label_font = match &surface.label {
        Some(label) => {
            let font = fonts.load(label.style.font_family)?;
            surface.relayout(&font);
            Some(font)
        }
        None => None,
    };

    let mut canvas = RgbaImage::from_pixel(surface.width, surface.height, backdrop.into());
    fill_rect(&mut canvas, fill);
    draw_symbol(&mut canvas, &surface, foreground);

    if let (Some(label), Some(font)) = (&surface.label, &label_font) {
        let color = Rgba::parse(&label.style.color)?;
        draw_label(&mut canvas, label, font, color);
    }

    encode(canvas, options)
}

fn fill_rect(canvas: &mut RgbaImage, color: Rgba) {
    if color.a == 0 {
        return;
    }
    for pixel in canvas.pixels_mut() {
        *pixel = color.over(Rgba::from(*pixel)).into();
    }
}

fn blend(canvas: &mut RgbaImage, x: i64, y: i64, color: Rgba) {
    if x < 0 || y < 0 || x >= canvas.width() as i64 || y >= canvas.height() as i64 {
        return;
    }
    let pixel = canvas.get_pixel_mut(x as u32, y as u32);
    *pixel = color.over(Rgba::from(*pixel)).into();
}

fn draw_symbol(canvas: &mut RgbaImage, surface: &CompositeSurface, color: Rgba) {
    let qr = &surface.qr;
    let (ox, oy) = qr.origin;
    for py in 0..qr.size {
        for px in 0..qr.size {
            if qr.is_dark_at(px, py) {
                blend(canvas, (ox + px) as i64, (oy + py) as i64, color);
            }
        }
    }
}

fn draw_label(canvas: &mut RgbaImage, label: &LabelNode, font: &Font, color: Rgba) {
    let size = label.style.font_size_px as f32;
    let line_height = label.style.line_height_px();
    let (ascent, descent) = match font.horizontal_line_metrics(size) {
        Some(metrics) => (metrics.ascent, metrics.descent),
        None => (size * 0.8, -size * 0.2),
    };
    // Half-leading: center the glyph box vertically inside each line box
    let leading = (line_height - (ascent - descent)) / 2.0;

    let (left, top) = label.position();
    for (index, line) in label.lines.iter().enumerate() {
        let line_width = font.width(line, size);
        let mut pen_x = left as f32 + (label.box_width as f32 - line_width) / 2.0;
        let baseline = top as f32 + index as f32 * line_height + leading + ascent;

        for ch in line.chars() {
            let (metrics, bitmap) = font.rasterize(ch, size);
            let glyph_left = (pen_x + metrics.xmin as f32).round() as i64;
            let glyph_top = (baseline - (metrics.height as i32 + metrics.ymin) as f32).round() as i64;

            for gy in 0..metrics.height {
                for gx in 0..metrics.width {
                    let coverage = bitmap[gy * metrics.width + gx];
                    if coverage > 0 {
                        blend(
                            canvas,
                            glyph_left + gx as i64,
                            glyph_top + gy as i64,
                            color.with_coverage(coverage),
                        );
                    }
                }
            }
            pen_x += metrics.advance_width;
        }
    }
}

fn encode(canvas: RgbaImage, options: &CaptureOptions) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    match options.format {
        ExportFormat::Png => {
            DynamicImage::ImageRgba8(canvas)
                .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;
        }
        ExportFormat::Jpeg => {
            let flat = flatten(&canvas);
            let quality = (options.quality.unwrap_or(super::JPEG_QUALITY) * 100.0)
                .round()
                .clamp(1.0, 100.0) as u8;
            JpegEncoder::new_with_quality(&mut bytes, quality).encode(
                flat.as_raw(),
                flat.width(),
                flat.height(),
                ExtendedColorType::Rgb8,
            )?;
        }
        ExportFormat::Svg => {
            return Err(Error::Capture("SVG is not a raster format".to_string()));
        }
    }
    Ok(bytes)
}

/// Drop the alpha channel, compositing any translucency onto white.
fn flatten(canvas: &RgbaImage) -> RgbImage {
    RgbImage::from_fn(canvas.width(), canvas.height(), |x, y| {
        let c = Rgba::from(*canvas.get_pixel(x, y)).over(Rgba::WHITE);
        image::Rgb([c.r, c.g, c.b])
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::font::FontFamily;
    use crate::qr::QrDecoder;
    use crate::store::WidgetConfig;

    fn label_free_surface(background: &str) -> CompositeSurface {
        let mut config = WidgetConfig::default();
        config.label.text.clear();
        config.qr.background_color = background.to_string();
        CompositeSurface::build(&config).unwrap()
    }

    fn options(format: ExportFormat, background: &str) -> CaptureOptions {
        CaptureOptions {
            format,
            background: background.to_string(),
            quality: (format == ExportFormat::Jpeg).then_some(0.95),
        }
    }

    #[test]
    fn test_png_dimensions_and_background() {
        let surface = label_free_surface("#FFFFFF");
        let bytes = render(
            &surface,
            &options(ExportFormat::Png, "#FFFFFF"),
            &FontResolver::default(),
        )
        .unwrap();

        let img = image::load_from_memory(&bytes).unwrap().to_rgba8();
        assert_eq!(img.dimensions(), (surface.width, surface.height));
        assert_eq!(img.get_pixel(0, 0).0, [255, 255, 255, 255]);
    }

    #[test]
    fn test_png_round_trips_through_decoder() {
        let surface = label_free_surface("#FFFFFF");
        let bytes = render(
            &surface,
            &options(ExportFormat::Png, "#FFFFFF"),
            &FontResolver::default(),
        )
        .unwrap();

        let payload = QrDecoder::new().decode_bytes(&bytes).unwrap();
        assert_eq!(payload.as_str(), Some("https://example.com"));
    }

    #[test]
    fn test_jpeg_is_encoded() {
        let surface = label_free_surface("#FFFFFF");
        let bytes = render(
            &surface,
            &options(ExportFormat::Jpeg, "#FFFFFF"),
            &FontResolver::default(),
        )
        .unwrap();
        assert_eq!(&bytes[..2], &[0xFF, 0xD8]);
    }

    #[test]
    fn test_transparent_fill_shows_backdrop() {
        let surface = label_free_surface("transparent");
        let bytes = render(
            &surface,
            &options(ExportFormat::Png, "#FF0000"),
            &FontResolver::default(),
        )
        .unwrap();
        let img = image::load_from_memory(&bytes).unwrap().to_rgba8();
        assert_eq!(img.get_pixel(1, 1).0, [255, 0, 0, 255]);
    }

    /// Bounding box of strongly red pixels
    fn red_ink(bytes: &[u8]) -> Option<(u32, u32, u32, u32)> {
        let img = image::load_from_memory(bytes).unwrap().to_rgba8();
        let mut bounds: Option<(u32, u32, u32, u32)> = None;
        for (x, y, pixel) in img.enumerate_pixels() {
            let [r, g, _, _] = pixel.0;
            if r as i32 - g as i32 > 100 {
                bounds = Some(match bounds {
                    Some((x0, y0, x1, y1)) => (x0.min(x), y0.min(y), x1.max(x), y1.max(y)),
                    None => (x, y, x, y),
                });
            }
        }
        bounds
    }

    #[test]
    fn test_label_is_drawn_below_symbol_at_offset() {
        let fonts = FontResolver::default();
        if fonts.load(FontFamily::GeistSans).is_err() {
            eprintln!("no label font installed, skipping");
            return;
        }

        let labelled = |x_offset: i32| {
            let mut config = WidgetConfig::default();
            config.label.color = "#FF0000".to_string();
            config.label.x_offset_px = x_offset;
            let surface = CompositeSurface::build(&config).unwrap();
            render(&surface, &options(ExportFormat::Png, "#FFFFFF"), &fonts).unwrap()
        };

        let centered = labelled(0);
        let shifted = labelled(40);

        let (x0, y0, _, _) = red_ink(&centered).expect("label pixels");
        // Label band starts after padding, symbol and margin
        assert!(y0 >= 16 + 256 + 8, "label ink at y={y0}");

        let (sx0, sy0, _, _) = red_ink(&shifted).expect("shifted label pixels");
        assert_eq!(sx0, x0 + 40);
        assert_eq!(sy0, y0);

        let payload = QrDecoder::new().decode_bytes(&centered).unwrap();
        assert_eq!(payload.as_str(), Some("https://example.com"));
    }

    #[test]
    fn test_invalid_color_rejects() {
        let surface = label_free_surface("#FFFFFF");
        let err = render(
            &surface,
            &options(ExportFormat::Png, "not-a-color"),
            &FontResolver::default(),
        )
        .unwrap_err();
        assert!(matches!(err, Error::InvalidColor(_)));
    }
}
