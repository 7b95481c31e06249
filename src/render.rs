//! Rendering of the header, entry rows and add button.
//!
//! Drawing is read-only over the entry list; the only state it touches is the
//! node height, which is grown to the layout minimum after painting.

use crate::constants::{ADD_BUTTON_RADIUS, KNOB_RADIUS, MARGIN, ROW_HEIGHT};
use crate::layout::{layout, Layout};
use crate::surface::Surface;
use crate::types::{Entry, EntryList};
use eframe::egui;

/// Pill fill when on.
pub const TOGGLE_ON: egui::Color32 = egui::Color32::from_rgb(74, 158, 255);
/// Pill fill when off or mixed.
pub const TOGGLE_OFF: egui::Color32 = egui::Color32::from_rgb(68, 68, 68);
const KNOB: egui::Color32 = egui::Color32::WHITE;
const HEADER_TEXT: egui::Color32 = egui::Color32::from_rgb(153, 153, 153);
/// Label colour of an enabled entry.
pub const TEXT_ENABLED: egui::Color32 = egui::Color32::from_rgb(221, 221, 221);
/// Label colour of a disabled entry.
pub const TEXT_DISABLED: egui::Color32 = egui::Color32::from_rgb(119, 119, 119);
const GLYPH: egui::Color32 = egui::Color32::from_rgb(136, 136, 136);
const BUTTON_FILL: egui::Color32 = egui::Color32::from_rgb(58, 58, 58);
const BUTTON_TEXT: egui::Color32 = egui::Color32::from_rgb(187, 187, 187);

/// Header label next to the toggle-all switch.
pub const TOGGLE_ALL_LABEL: &str = "Toggle All";
/// Right-aligned header column label.
pub const VALUE_COLUMN_LABEL: &str = "Strength";
/// Label shown for an entry with no reference.
pub const PLACEHOLDER: &str = "Click to select...";
/// Add button caption.
pub const ADD_LABEL: &str = "+ Add Lora";
const DECREMENT_GLYPH: &str = "◀";
const INCREMENT_GLYPH: &str = "▶";
const ELLIPSIS: &str = "...";

fn header_font() -> egui::FontId {
    egui::FontId::proportional(11.0)
}

fn row_font() -> egui::FontId {
    egui::FontId::proportional(12.0)
}

/// Formats a value the way the stepper shows it.
pub fn format_value(value: f64) -> String {
    format!("{value:.2}")
}

/// Shortens `text` until `measure` fits it into `max_width`, appending an ellipsis.
///
/// Each step drops one more character of the original text. Text of three
/// characters or fewer is returned as is.
pub fn truncate_to_width(text: &str, max_width: f32, measure: impl Fn(&str) -> f32) -> String {
    if measure(text) <= max_width {
        return text.to_string();
    }
    let chars: Vec<char> = text.chars().collect();
    if chars.len() <= ELLIPSIS.len() {
        return text.to_string();
    }
    let mut keep = chars.len() - ELLIPSIS.len();
    loop {
        keep -= 1;
        let candidate: String = chars[..keep].iter().collect::<String>() + ELLIPSIS;
        if keep == 0 || measure(&candidate) <= max_width {
            return candidate;
        }
    }
}

/// Draws the whole widget for `entries` into a node of `size`.
///
/// Afterwards `size.y` is raised to the layout minimum if it was smaller.
pub fn draw(entries: &EntryList, size: &mut egui::Vec2, surface: &mut dyn Surface) {
    let geo = layout(entries.len(), size.x);

    if let Some(header_y) = geo.header_y {
        draw_header(&geo, header_y, entries.all_enabled(), surface);
    }

    for (entry, y) in entries.iter().zip(geo.row_ys.iter()) {
        draw_row(&geo, *y, entry, surface);
    }

    draw_add_button(&geo, surface);

    if size.y < geo.min_height {
        size.y = geo.min_height;
    }
}

fn draw_toggle(geo: &Layout, y: f32, on: bool, surface: &mut dyn Surface) {
    let pill = geo.toggle_pill(y);
    let fill = if on { TOGGLE_ON } else { TOGGLE_OFF };
    surface.fill_rounded_rect(pill, pill.height() / 2.0, fill);
    surface.fill_circle(geo.knob_center(y, on), KNOB_RADIUS, KNOB);
}

fn draw_header(geo: &Layout, y: f32, all_on: bool, surface: &mut dyn Surface) {
    let mid_y = y + ROW_HEIGHT / 2.0;
    draw_toggle(geo, y, all_on, surface);

    let font = header_font();
    surface.text(
        egui::pos2(geo.label_x(), mid_y),
        egui::Align2::LEFT_CENTER,
        TOGGLE_ALL_LABEL,
        &font,
        HEADER_TEXT,
    );
    surface.text(
        egui::pos2(geo.width - MARGIN - 5.0, mid_y),
        egui::Align2::RIGHT_CENTER,
        VALUE_COLUMN_LABEL,
        &font,
        HEADER_TEXT,
    );
}

fn draw_row(geo: &Layout, y: f32, entry: &Entry, surface: &mut dyn Surface) {
    let mid_y = y + ROW_HEIGHT / 2.0;
    draw_toggle(geo, y, entry.enabled, surface);

    let font = row_font();
    let text_color = if entry.enabled {
        TEXT_ENABLED
    } else {
        TEXT_DISABLED
    };
    let label = entry.reference.as_deref().unwrap_or(PLACEHOLDER);
    let label = truncate_to_width(label, geo.label_max_width(), |t| {
        surface.text_width(t, &font)
    });
    surface.text(
        egui::pos2(geo.label_x(), mid_y),
        egui::Align2::LEFT_CENTER,
        &label,
        &font,
        text_color,
    );

    let [dec, value, inc] = geo.stepper_centers(y);
    surface.text(dec, egui::Align2::CENTER_CENTER, DECREMENT_GLYPH, &font, GLYPH);
    surface.text(
        value,
        egui::Align2::CENTER_CENTER,
        &format_value(entry.value),
        &font,
        text_color,
    );
    surface.text(inc, egui::Align2::CENTER_CENTER, INCREMENT_GLYPH, &font, GLYPH);
}

fn draw_add_button(geo: &Layout, surface: &mut dyn Surface) {
    let rect = geo.add_button();
    surface.fill_rounded_rect(rect, ADD_BUTTON_RADIUS, BUTTON_FILL);
    surface.text(
        rect.center(),
        egui::Align2::CENTER_CENTER,
        ADD_LABEL,
        &row_font(),
        BUTTON_TEXT,
    );
}
