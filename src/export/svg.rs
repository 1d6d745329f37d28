//! Vector capture of a composite surface
//!
//! The symbol comes from `qrcode`'s SVG renderer at one unit per module,
//! nested in an `<svg>` viewport scaled to the node size. The label is
//! embedded as XHTML inside a `<foreignObject>` carrying the label's CSS, so
//! a browser wraps and positions it exactly like the preview.

use super::{CaptureOptions, escape_xml};
use crate::color::Rgba;
use crate::error::{Error, Result};
use crate::qr::QrEncoder;
use crate::surface::{CompositeSurface, LabelNode, QrNode, SYMBOL_BACKGROUND};
use qrcode::render::svg;
use std::fmt::{self, Write as _};

/// Serialize `surface` as a standalone SVG document.
pub(super) fn render(surface: &CompositeSurface, options: &CaptureOptions) -> Result<Vec<u8>> {
    // Validate colors up front; the document keeps the caller's spelling
    Rgba::parse(&options.background)?;
    let fill = Rgba::parse(&surface.background)?;
    Rgba::parse(&surface.qr.foreground)?;
    if let Some(label) = &surface.label {
        Rgba::parse(&label.style.color)?;
    }

    let symbol = symbol_markup(&surface.qr)?;
    let mut doc = String::new();
    write_document(&mut doc, surface, options, fill, &symbol)
        .map_err(|e| Error::Capture(format!("Failed to write SVG document: {e}")))?;
    Ok(doc.into_bytes())
}

fn write_document(
    doc: &mut String,
    surface: &CompositeSurface,
    options: &CaptureOptions,
    fill: Rgba,
    symbol: &str,
) -> fmt::Result {
    let (w, h) = (surface.width, surface.height);
    write!(
        doc,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#
    )?;
    write!(
        doc,
        r#"<rect width="{w}" height="{h}" fill="{}"/>"#,
        escape_xml(&options.background)
    )?;
    if fill.a > 0 && surface.background != options.background {
        write!(
            doc,
            r#"<rect width="{w}" height="{h}" fill="{}"/>"#,
            escape_xml(&surface.background)
        )?;
    }

    let qr = &surface.qr;
    let (ox, oy) = qr.origin;
    let cells = qr.matrix.cells_with_margin();
    write!(
        doc,
        r#"<svg x="{ox}" y="{oy}" width="{size}" height="{size}" viewBox="0 0 {cells} {cells}">{symbol}</svg>"#,
        size = qr.size,
    )?;

    if let Some(label) = &surface.label {
        write_label(doc, label, surface.height)?;
    }

    doc.push_str("</svg>");
    Ok(())
}

/// The symbol rendered by `qrcode`, one unit per module, quiet zone included.
fn symbol_markup(qr: &QrNode) -> Result<String> {
    let code = QrEncoder::new().symbol(qr.content.as_bytes())?;
    let foreground = escape_xml(&qr.foreground);
    let markup = code
        .render::<svg::Color>()
        .quiet_zone(true)
        .module_dimensions(1, 1)
        .dark_color(svg::Color(&foreground))
        .light_color(svg::Color(SYMBOL_BACKGROUND))
        .build();

    // Drop the XML declaration so the fragment can be nested
    let fragment = match markup.strip_prefix("<?xml") {
        Some(rest) => rest.split_once("?>").map(|(_, svg)| svg).unwrap_or(rest),
        None => markup.as_str(),
    };
    Ok(fragment.to_string())
}

fn write_label(doc: &mut String, label: &LabelNode, surface_height: u32) -> fmt::Result {
    let (x, y) = label.origin;
    // The foreignObject spans from the top of the label margin to the bottom edge
    let top = y - label.style.margin_top_px;
    let height = surface_height.saturating_sub(top);
    write!(
        doc,
        r#"<foreignObject x="{x}" y="{top}" width="{width}" height="{height}"><div xmlns="http://www.w3.org/1999/xhtml"><p style="{style}">{text}</p></div></foreignObject>"#,
        width = label.box_width,
        style = escape_xml(&label.style.to_css()),
        text = escape_xml(&label.text),
    )
}
