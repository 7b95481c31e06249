//! Geometry for the widget.
//!
//! [`layout`] is a pure function of the entry count and node width. It is
//! recomputed on every draw, hit-test and resize, and every rectangle the
//! renderer paints or the hit-tester checks comes from the methods here.

use crate::constants::*;
use eframe::egui;

/// Derived geometry for one node at one moment.
#[derive(Debug, Clone, PartialEq)]
pub struct Layout {
    /// Node width the geometry was computed for
    pub width: f32,
    /// Top of the header row, present only when there are entries
    pub header_y: Option<f32>,
    /// Top of each entry row, in display order
    pub row_ys: Vec<f32>,
    /// Top of the slot holding the add button
    pub add_button_y: f32,
    /// Minimum node width
    pub min_width: f32,
    /// Minimum node height for this entry count
    pub min_height: f32,
}

/// Minimum node height for `entry_count` entries.
pub fn min_height(entry_count: usize) -> f32 {
    let header = if entry_count > 0 { ROW_HEIGHT } else { 0.0 };
    BASE_HEIGHT + header + entry_count as f32 * ROW_HEIGHT
}

/// Computes the geometry for `entry_count` entries in a node `node_width` wide.
pub fn layout(entry_count: usize, node_width: f32) -> Layout {
    let header_y = (entry_count > 0).then_some(CONTENT_TOP);
    let first_row = CONTENT_TOP + if header_y.is_some() { ROW_HEIGHT } else { 0.0 };
    let row_ys = (0..entry_count)
        .map(|i| first_row + i as f32 * ROW_HEIGHT)
        .collect();

    Layout {
        width: node_width,
        header_y,
        row_ys,
        add_button_y: first_row + entry_count as f32 * ROW_HEIGHT,
        min_width: MIN_WIDTH,
        min_height: min_height(entry_count),
    }
}

impl Layout {
    /// Index of the entry row whose band contains `y`.
    pub fn row_at(&self, y: f32) -> Option<usize> {
        self.row_ys
            .iter()
            .position(|top| y >= *top && y < *top + ROW_HEIGHT)
    }

    /// Clickable zone of the toggle in a row whose top is `y`.
    pub fn toggle_zone(&self, y: f32) -> egui::Rect {
        egui::Rect::from_min_max(
            egui::pos2(MARGIN, y),
            egui::pos2(MARGIN + TOGGLE_WIDTH + TOGGLE_HIT_SLACK, y + ROW_HEIGHT),
        )
    }

    /// Drawn pill of the toggle in a row whose top is `y`.
    pub fn toggle_pill(&self, y: f32) -> egui::Rect {
        let mid_y = y + ROW_HEIGHT / 2.0;
        egui::Rect::from_min_size(
            egui::pos2(MARGIN, mid_y - TOGGLE_HEIGHT / 2.0),
            egui::vec2(TOGGLE_WIDTH, TOGGLE_HEIGHT),
        )
    }

    /// Centre of the toggle knob for the given state.
    pub fn knob_center(&self, y: f32, on: bool) -> egui::Pos2 {
        let pill = self.toggle_pill(y);
        let x = if on {
            pill.max.x - KNOB_RADIUS - KNOB_INSET
        } else {
            pill.min.x + KNOB_RADIUS + KNOB_INSET
        };
        egui::pos2(x, pill.center().y)
    }

    /// Left edge of the reference label.
    pub fn label_x(&self) -> f32 {
        MARGIN + TOGGLE_WIDTH + LABEL_GAP
    }

    /// Width available to the reference label before the stepper.
    pub fn label_max_width(&self) -> f32 {
        (self.width - self.label_x() - LABEL_RESERVE).max(0.0)
    }

    /// Centre x of the decrement glyph; the stepper is anchored on it.
    pub fn stepper_x(&self) -> f32 {
        self.width - MARGIN - STEPPER_OFFSET
    }

    /// Clickable zone of the reference label in a row whose top is `y`.
    pub fn reference_zone(&self, y: f32) -> egui::Rect {
        egui::Rect::from_min_max(
            egui::pos2(self.label_x(), y),
            egui::pos2(self.stepper_x() - STEPPER_LEAD, y + ROW_HEIGHT),
        )
    }

    /// Clickable zone of the decrement glyph.
    pub fn decrement_zone(&self, y: f32) -> egui::Rect {
        let sx = self.stepper_x();
        egui::Rect::from_min_max(
            egui::pos2(sx - STEPPER_LEAD, y),
            egui::pos2(sx + STEPPER_DECREMENT_END, y + ROW_HEIGHT),
        )
    }

    /// Clickable zone of the value text.
    pub fn value_zone(&self, y: f32) -> egui::Rect {
        let sx = self.stepper_x();
        egui::Rect::from_min_max(
            egui::pos2(sx + STEPPER_DECREMENT_END, y),
            egui::pos2(sx + STEPPER_VALUE_END, y + ROW_HEIGHT),
        )
    }

    /// Clickable zone of the increment glyph; it runs to the node's right edge.
    pub fn increment_zone(&self, y: f32) -> egui::Rect {
        let sx = self.stepper_x();
        egui::Rect::from_min_max(
            egui::pos2(sx + STEPPER_VALUE_END, y),
            egui::pos2(self.width, y + ROW_HEIGHT),
        )
    }

    /// Centres of the decrement glyph, value text and increment glyph.
    pub fn stepper_centers(&self, y: f32) -> [egui::Pos2; 3] {
        let sx = self.stepper_x();
        let mid_y = y + ROW_HEIGHT / 2.0;
        [
            egui::pos2(sx, mid_y),
            egui::pos2(sx + STEPPER_VALUE_OFFSET, mid_y),
            egui::pos2(sx + STEPPER_INCREMENT_OFFSET, mid_y),
        ]
    }

    /// Drawn and clickable rectangle of the add button.
    pub fn add_button(&self) -> egui::Rect {
        egui::Rect::from_min_max(
            egui::pos2(MARGIN, self.add_button_y + ADD_BUTTON_INSET),
            egui::pos2(self.width - MARGIN, self.add_button_y + ROW_HEIGHT),
        )
    }
}

/// Half-open containment: `min <= p < max` on both axes.
///
/// Adjacent zones share edges, so the closed [`egui::Rect::contains`] would
/// classify boundary points twice.
pub fn zone_contains(zone: egui::Rect, p: egui::Pos2) -> bool {
    p.x >= zone.min.x && p.x < zone.max.x && p.y >= zone.min.y && p.y < zone.max.y
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_min_height_formula_for_many_counts_and_widths() {
        for n in 0..50 {
            for w in [300.0, 340.5, 512.0, 1200.0] {
                let expected = 80.0 + if n > 0 { 24.0 } else { 0.0 } + n as f32 * 24.0;
                assert_eq!(layout(n, w).min_height, expected);
            }
        }
    }

    #[test]
    fn test_empty_layout_has_no_header() {
        let geo = layout(0, 300.0);

        assert_eq!(geo.header_y, None);
        assert!(geo.row_ys.is_empty());
        assert_eq!(geo.add_button_y, 30.0);
        assert_eq!(geo.min_height, 80.0);
        assert_eq!(geo.min_width, 300.0);
    }

    #[test]
    fn test_single_entry_scenario() {
        let geo = layout(1, 300.0);

        assert_eq!(geo.header_y, Some(30.0));
        assert_eq!(geo.row_ys, vec![54.0]);
        assert_eq!(geo.add_button_y, 78.0);
        assert_eq!(geo.min_height, 128.0);
    }

    #[test]
    fn test_rows_are_stacked_by_row_height() {
        let geo = layout(4, 400.0);
        assert_eq!(geo.row_ys, vec![54.0, 78.0, 102.0, 126.0]);
        assert_eq!(geo.add_button_y, 150.0);
    }

    #[test]
    fn test_row_at_uses_half_open_bands() {
        let geo = layout(2, 300.0);

        assert_eq!(geo.row_at(54.0), Some(0));
        assert_eq!(geo.row_at(77.9), Some(0));
        assert_eq!(geo.row_at(78.0), Some(1));
        assert_eq!(geo.row_at(102.0), None);
        assert_eq!(geo.row_at(40.0), None);
    }

    #[test]
    fn test_stepper_zones_are_contiguous() {
        let geo = layout(1, 300.0);
        let y = geo.row_ys[0];

        assert_eq!(geo.reference_zone(y).max.x, geo.decrement_zone(y).min.x);
        assert_eq!(geo.decrement_zone(y).max.x, geo.value_zone(y).min.x);
        assert_eq!(geo.value_zone(y).max.x, geo.increment_zone(y).min.x);
        assert_eq!(geo.increment_zone(y).max.x, 300.0);
        // The stepper block covers the rightmost ~75px of the content.
        assert_eq!(geo.stepper_x(), 223.0);
    }

    #[test]
    fn test_knob_moves_right_when_on() {
        let geo = layout(1, 300.0);
        let off = geo.knob_center(54.0, false);
        let on = geo.knob_center(54.0, true);

        assert!(on.x > off.x);
        assert_eq!(off.y, 66.0);
    }
}
