//! Drawing surface abstraction.
//!
//! The renderer only needs a handful of primitives. [`Surface`] names them in
//! node-local coordinates so the same drawing code can target an egui painter
//! on screen or an SVG document for snapshots.

use eframe::egui;

/// Primitive drawing operations in node-local coordinates.
pub trait Surface {
    /// Fills a rectangle with rounded corners.
    fn fill_rounded_rect(&mut self, rect: egui::Rect, radius: f32, color: egui::Color32);

    /// Fills a circle.
    fn fill_circle(&mut self, center: egui::Pos2, radius: f32, color: egui::Color32);

    /// Draws a single line of text anchored at `pos`.
    fn text(
        &mut self,
        pos: egui::Pos2,
        anchor: egui::Align2,
        text: &str,
        font: &egui::FontId,
        color: egui::Color32,
    );

    /// Measures the width of `text` in node-local units.
    fn text_width(&self, text: &str, font: &egui::FontId) -> f32;
}

/// Draws onto an egui painter, translating node-local coordinates to screen space.
pub struct EguiSurface<'a> {
    painter: &'a egui::Painter,
    origin: egui::Pos2,
    zoom: f32,
}

impl<'a> EguiSurface<'a> {
    /// Creates a surface whose local `(0, 0)` sits at `origin` on screen.
    pub fn new(painter: &'a egui::Painter, origin: egui::Pos2, zoom: f32) -> Self {
        Self {
            painter,
            origin,
            zoom,
        }
    }

    fn to_screen(&self, p: egui::Pos2) -> egui::Pos2 {
        self.origin + p.to_vec2() * self.zoom
    }

    fn scaled_font(&self, font: &egui::FontId) -> egui::FontId {
        egui::FontId::new((font.size * self.zoom).clamp(4.0, 48.0), font.family.clone())
    }
}

impl Surface for EguiSurface<'_> {
    fn fill_rounded_rect(&mut self, rect: egui::Rect, radius: f32, color: egui::Color32) {
        let screen = egui::Rect::from_min_max(self.to_screen(rect.min), self.to_screen(rect.max));
        self.painter.rect_filled(screen, radius * self.zoom, color);
    }

    fn fill_circle(&mut self, center: egui::Pos2, radius: f32, color: egui::Color32) {
        self.painter
            .circle_filled(self.to_screen(center), radius * self.zoom, color);
    }

    fn text(
        &mut self,
        pos: egui::Pos2,
        anchor: egui::Align2,
        text: &str,
        font: &egui::FontId,
        color: egui::Color32,
    ) {
        self.painter.text(
            self.to_screen(pos),
            anchor,
            text,
            self.scaled_font(font),
            color,
        );
    }

    fn text_width(&self, text: &str, font: &egui::FontId) -> f32 {
        // Measure at the unscaled size so truncation does not depend on zoom.
        self.painter
            .layout_no_wrap(text.to_string(), font.clone(), egui::Color32::WHITE)
            .size()
            .x
    }
}
