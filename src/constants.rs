//! Shared geometry and value constants.
//! Layout, rendering, hit-testing and size enforcement all read from here so
//! that what is drawn and what is clickable cannot drift apart.

// Rows
/// Height of the header row, each entry row and the add button slot.
pub const ROW_HEIGHT: f32 = 24.0;
/// Vertical offset of the first content row, below the host's title bar.
pub const CONTENT_TOP: f32 = 30.0;
/// Minimum node height with no entries.
pub const BASE_HEIGHT: f32 = 80.0;
/// Minimum node width.
pub const MIN_WIDTH: f32 = 300.0;
/// Horizontal padding on both sides of the content.
pub const MARGIN: f32 = 12.0;

// Toggle pill
/// Width of the pill-shaped toggle.
pub const TOGGLE_WIDTH: f32 = 26.0;
/// Height of the pill-shaped toggle.
pub const TOGGLE_HEIGHT: f32 = 14.0;
/// Extra clickable slack to the right of the pill.
pub const TOGGLE_HIT_SLACK: f32 = 4.0;
/// Radius of the knob inside the pill.
pub const KNOB_RADIUS: f32 = 5.0;
/// Distance between the knob edge and the pill edge.
pub const KNOB_INSET: f32 = 3.0;
/// Gap between the toggle and the reference label.
pub const LABEL_GAP: f32 = 8.0;

// Stepper
/// Distance from the right margin to the decrement glyph centre.
pub const STEPPER_OFFSET: f32 = 65.0;
/// Distance kept between the reference zone and the stepper block.
pub const STEPPER_LEAD: f32 = 10.0;
/// Offset of the value text centre from the decrement glyph centre.
pub const STEPPER_VALUE_OFFSET: f32 = 30.0;
/// Offset of the increment glyph centre from the decrement glyph centre.
pub const STEPPER_INCREMENT_OFFSET: f32 = 60.0;
/// Right edge of the decrement zone, relative to the decrement glyph centre.
pub const STEPPER_DECREMENT_END: f32 = 15.0;
/// Right edge of the value zone, relative to the decrement glyph centre.
pub const STEPPER_VALUE_END: f32 = 45.0;
/// Space reserved to the right of the reference label for the stepper.
pub const LABEL_RESERVE: f32 = 85.0;

// Add button
/// Vertical inset of the add button inside its row slot.
pub const ADD_BUTTON_INSET: f32 = 4.0;
/// Corner radius of the add button.
pub const ADD_BUTTON_RADIUS: f32 = 3.0;

// Values
/// Lower bound for entry values.
pub const VALUE_MIN: f64 = -10.0;
/// Upper bound for entry values.
pub const VALUE_MAX: f64 = 10.0;
/// Value given to newly added entries.
pub const VALUE_DEFAULT: f64 = 1.0;
/// Amount added or removed by one stepper click.
pub const VALUE_STEP: f64 = 0.05;
