//! Node size enforcement.
//!
//! The host may request any size; the widget only ever raises it to the
//! layout minimum. Mutations that add or remove rows propose a new height,
//! which is then floored the same way.

use crate::constants::{BASE_HEIGHT, ROW_HEIGHT};
use crate::layout::layout;
use eframe::egui;

/// Clamps a host-requested size up to the minimum for `entry_count`.
pub fn clamp_resize(entry_count: usize, requested: egui::Vec2) -> egui::Vec2 {
    let geo = layout(entry_count, requested.x);
    egui::vec2(
        requested.x.max(geo.min_width),
        requested.y.max(geo.min_height),
    )
}

/// Raises `size` to the minimum for `entry_count`. Returns true if it changed.
pub fn grow_to_min(entry_count: usize, size: &mut egui::Vec2) -> bool {
    let clamped = clamp_resize(entry_count, *size);
    let changed = clamped != *size;
    *size = clamped;
    changed
}

/// Height proposal after one row was appended.
pub fn propose_after_add(entry_count: usize, size: &mut egui::Vec2) {
    size.y += ROW_HEIGHT;
    grow_to_min(entry_count, size);
}

/// Height proposal after one row was removed: one row shorter, never below the base height.
pub fn propose_after_remove(size: &mut egui::Vec2) {
    size.y = (size.y - ROW_HEIGHT).max(BASE_HEIGHT);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resize_never_goes_below_minimum() {
        assert_eq!(clamp_resize(0, egui::vec2(100.0, 10.0)), egui::vec2(300.0, 80.0));
        assert_eq!(clamp_resize(2, egui::vec2(250.0, 100.0)), egui::vec2(300.0, 152.0));
    }

    #[test]
    fn test_resize_keeps_larger_requests() {
        assert_eq!(clamp_resize(2, egui::vec2(640.0, 400.0)), egui::vec2(640.0, 400.0));
    }

    #[test]
    fn test_grow_to_min_reports_change() {
        let mut size = egui::vec2(300.0, 80.0);
        assert!(grow_to_min(1, &mut size));
        assert_eq!(size.y, 128.0);
        assert!(!grow_to_min(1, &mut size));
    }

    #[test]
    fn test_add_from_empty_reaches_minimum() {
        let mut size = egui::vec2(300.0, 80.0);
        propose_after_add(1, &mut size);
        assert_eq!(size.y, 128.0);

        propose_after_add(2, &mut size);
        assert_eq!(size.y, 152.0);
    }

    #[test]
    fn test_remove_proposal_is_floored_at_base() {
        let mut size = egui::vec2(300.0, 176.0);
        propose_after_remove(&mut size);
        assert_eq!(size.y, 152.0);

        let mut small = egui::vec2(300.0, 90.0);
        propose_after_remove(&mut small);
        assert_eq!(small.y, 80.0);
    }
}
