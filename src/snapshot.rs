//! Snapshot export: render a widget to SVG and, on native targets, PNG.
//!
//! The same renderer that paints on screen draws into an [`SvgSurface`], so a
//! snapshot shows exactly what the node shows.

use crate::render;
use crate::surface::Surface;
use crate::types::EntryList;
use eframe::egui;
use std::fmt::Write as _;

/// Errors raised while producing a snapshot.
#[derive(thiserror::Error, Debug)]
pub enum SnapshotError {
    /// The generated SVG could not be parsed for rasterization
    #[error("svg parse error: {0}")]
    Svg(String),
    /// The output pixmap could not be allocated
    #[error("cannot allocate a {0}x{1} pixmap")]
    Pixmap(u32, u32),
    /// PNG encoding failed
    #[error("png encoding failed: {0}")]
    Png(String),
    /// Writing the output failed
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Records surface primitives as SVG elements.
#[derive(Debug, Default)]
pub struct SvgSurface {
    body: String,
}

/// Approximate advance of one character relative to the font size.
const CHAR_ADVANCE: f32 = 0.55;

fn hex(color: egui::Color32) -> String {
    format!("#{:02x}{:02x}{:02x}", color.r(), color.g(), color.b())
}

fn escape_xml(input: &str) -> String {
    let mut s = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => s.push_str("&amp;"),
            '<' => s.push_str("&lt;"),
            '>' => s.push_str("&gt;"),
            '"' => s.push_str("&quot;"),
            '\'' => s.push_str("&apos;"),
            _ => s.push(ch),
        }
    }
    s
}

impl SvgSurface {
    /// Creates an empty surface.
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps the recorded elements in an SVG document of the given size.
    pub fn finish(self, width: u32, height: u32, background: Option<egui::Color32>) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{width}\" height=\"{height}\" viewBox=\"0 0 {width} {height}\">"
        );
        if let Some(bg) = background {
            let _ = writeln!(
                out,
                "<rect x=\"0\" y=\"0\" width=\"{width}\" height=\"{height}\" rx=\"6\" ry=\"6\" fill=\"{}\" />",
                hex(bg)
            );
        }
        out.push_str(&self.body);
        out.push_str("</svg>\n");
        out
    }
}

impl Surface for SvgSurface {
    fn fill_rounded_rect(&mut self, rect: egui::Rect, radius: f32, color: egui::Color32) {
        let _ = writeln!(
            self.body,
            "<rect x=\"{:.1}\" y=\"{:.1}\" width=\"{:.1}\" height=\"{:.1}\" rx=\"{r:.1}\" ry=\"{r:.1}\" fill=\"{}\" />",
            rect.min.x,
            rect.min.y,
            rect.width(),
            rect.height(),
            hex(color),
            r = radius,
        );
    }

    fn fill_circle(&mut self, center: egui::Pos2, radius: f32, color: egui::Color32) {
        let _ = writeln!(
            self.body,
            "<circle cx=\"{:.1}\" cy=\"{:.1}\" r=\"{:.1}\" fill=\"{}\" />",
            center.x,
            center.y,
            radius,
            hex(color)
        );
    }

    fn text(
        &mut self,
        pos: egui::Pos2,
        anchor: egui::Align2,
        text: &str,
        font: &egui::FontId,
        color: egui::Color32,
    ) {
        let text_anchor = match anchor.x() {
            egui::Align::Min => "start",
            egui::Align::Center => "middle",
            egui::Align::Max => "end",
        };
        let _ = writeln!(
            self.body,
            "<text x=\"{:.1}\" y=\"{:.1}\" font-family=\"sans-serif\" font-size=\"{}\" fill=\"{}\" text-anchor=\"{}\" dominant-baseline=\"central\">{}</text>",
            pos.x,
            pos.y,
            font.size,
            hex(color),
            text_anchor,
            escape_xml(text)
        );
    }

    fn text_width(&self, text: &str, font: &egui::FontId) -> f32 {
        text.chars().count() as f32 * font.size * CHAR_ADVANCE
    }
}

/// Node background used in snapshots.
pub const SNAPSHOT_BACKGROUND: egui::Color32 = egui::Color32::from_rgb(53, 53, 53);

/// Renders `entries` in a node of `size` to an SVG document.
///
/// Returns the document with its width and height; the height is grown to
/// the layout minimum like an on-screen draw.
pub fn render_svg(entries: &EntryList, size: egui::Vec2) -> (String, u32, u32) {
    let mut size = size;
    let mut surface = SvgSurface::new();
    render::draw(entries, &mut size, &mut surface);
    let width = size.x.ceil().max(1.0) as u32;
    let height = size.y.ceil().max(1.0) as u32;
    (
        surface.finish(width, height, Some(SNAPSHOT_BACKGROUND)),
        width,
        height,
    )
}

/// Rasterizes an SVG document to PNG bytes at `scale`.
#[cfg(not(target_arch = "wasm32"))]
pub fn render_png(
    svg: &str,
    width: u32,
    height: u32,
    scale: f32,
) -> Result<Vec<u8>, SnapshotError> {
    use std::sync::Arc;

    let mut opt = usvg::Options::default();
    let mut db = fontdb::Database::new();
    db.load_system_fonts();
    opt.fontdb = Arc::new(db);

    let tree = usvg::Tree::from_data(svg.as_bytes(), &opt)
        .map_err(|e| SnapshotError::Svg(e.to_string()))?;

    let scale = scale.clamp(0.25, 8.0);
    let out_w = ((width as f32) * scale).round().max(1.0) as u32;
    let out_h = ((height as f32) * scale).round().max(1.0) as u32;
    let mut pixmap =
        tiny_skia::Pixmap::new(out_w, out_h).ok_or(SnapshotError::Pixmap(out_w, out_h))?;

    let transform = tiny_skia::Transform::from_scale(scale, scale);
    resvg::render(&tree, transform, &mut pixmap.as_mut());

    pixmap
        .encode_png()
        .map_err(|e| SnapshotError::Png(e.to_string()))
}
