//! The capability set a host node exposes to embedded behavior.
//!
//! Hosts call into a [`NodeBehavior`] for every lifecycle callback. A custom
//! widget is attached to an existing host behavior with [`Chained`], which
//! forwards each callback to the host behavior first and then to the widget.

use crate::controller::{Dialog, DialogResult};
use crate::hit_test::Zone;
use crate::surface::Surface;
use eframe::egui;
use serde_json::{Map, Value};

/// Result of delivering a pointer-down event to a behavior.
#[derive(Debug, Clone, PartialEq)]
pub enum PointerOutcome {
    /// The event missed; the host should apply its default handling
    Unhandled,
    /// The event was consumed and the node needs a redraw
    Handled {
        /// Auxiliary dialog the host should open, if any
        dialog: Option<Dialog>,
    },
}

impl PointerOutcome {
    /// Returns true if the event was consumed.
    pub fn is_handled(&self) -> bool {
        matches!(self, PointerOutcome::Handled { .. })
    }

    /// Consumed without opening a dialog.
    pub fn handled() -> Self {
        PointerOutcome::Handled { dialog: None }
    }

    /// Consumed, and the host should open `dialog`.
    pub fn with_dialog(dialog: Dialog) -> Self {
        PointerOutcome::Handled {
            dialog: Some(dialog),
        }
    }
}

/// Callbacks a host node forwards to its behavior. Every method defaults to
/// "do nothing", so behaviors only implement what they need.
///
/// Positions are node-local; `size` is the node's current size, which some
/// callbacks may grow.
pub trait NodeBehavior {
    /// Paints the node body.
    fn on_draw(&mut self, _surface: &mut dyn Surface, _size: &mut egui::Vec2) {}

    /// Classifies a point without acting on it.
    fn hit_test(&self, _pos: egui::Pos2, _size: egui::Vec2) -> Option<Zone> {
        None
    }

    /// Handles a primary pointer press.
    fn on_pointer_down(&mut self, _pos: egui::Pos2, _size: &mut egui::Vec2) -> PointerOutcome {
        PointerOutcome::Unhandled
    }

    /// Handles a secondary action (context click) and returns a menu to show.
    fn on_secondary_action(&mut self, _pos: egui::Pos2, _size: egui::Vec2) -> Option<Dialog> {
        None
    }

    /// Applies the outcome of a dialog previously requested by this behavior.
    /// Returns true if the node needs a redraw.
    fn on_dialog_result(&mut self, _result: DialogResult, _size: &mut egui::Vec2) -> bool {
        false
    }

    /// Adjusts a host-requested size and returns the size to apply.
    fn on_resize(&mut self, requested: egui::Vec2) -> egui::Vec2 {
        requested
    }

    /// Writes behavior state into the node's saved object.
    fn on_serialize(&self, _out: &mut Map<String, Value>) {}

    /// Restores behavior state from the node's saved object.
    fn on_configure(&mut self, _data: &Map<String, Value>, _size: &mut egui::Vec2) {}

    /// Adds the behavior's execution inputs.
    fn on_execute(&self, _inputs: &mut Map<String, Value>) {}
}

/// Ordered delegation from a host behavior `B` to a widget `W`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Chained<B, W> {
    /// Pre-existing host behavior, always called first
    pub base: B,
    /// The embedded widget
    pub widget: W,
}

impl<B, W> Chained<B, W> {
    /// Composes `base` with `widget`.
    pub fn new(base: B, widget: W) -> Self {
        Self { base, widget }
    }
}

impl<B: NodeBehavior, W: NodeBehavior> NodeBehavior for Chained<B, W> {
    fn on_draw(&mut self, surface: &mut dyn Surface, size: &mut egui::Vec2) {
        self.base.on_draw(surface, size);
        self.widget.on_draw(surface, size);
    }

    fn hit_test(&self, pos: egui::Pos2, size: egui::Vec2) -> Option<Zone> {
        self.base
            .hit_test(pos, size)
            .or_else(|| self.widget.hit_test(pos, size))
    }

    fn on_pointer_down(&mut self, pos: egui::Pos2, size: &mut egui::Vec2) -> PointerOutcome {
        match self.base.on_pointer_down(pos, size) {
            PointerOutcome::Unhandled => self.widget.on_pointer_down(pos, size),
            handled => handled,
        }
    }

    fn on_secondary_action(&mut self, pos: egui::Pos2, size: egui::Vec2) -> Option<Dialog> {
        match self.base.on_secondary_action(pos, size) {
            Some(dialog) => Some(dialog),
            None => self.widget.on_secondary_action(pos, size),
        }
    }

    fn on_dialog_result(&mut self, result: DialogResult, size: &mut egui::Vec2) -> bool {
        let base_dirty = self.base.on_dialog_result(result.clone(), size);
        let widget_dirty = self.widget.on_dialog_result(result, size);
        base_dirty || widget_dirty
    }

    fn on_resize(&mut self, requested: egui::Vec2) -> egui::Vec2 {
        let size = self.base.on_resize(requested);
        self.widget.on_resize(size)
    }

    fn on_serialize(&self, out: &mut Map<String, Value>) {
        self.base.on_serialize(out);
        self.widget.on_serialize(out);
    }

    fn on_configure(&mut self, data: &Map<String, Value>, size: &mut egui::Vec2) {
        self.base.on_configure(data, size);
        self.widget.on_configure(data, size);
    }

    fn on_execute(&self, inputs: &mut Map<String, Value>) {
        self.base.on_execute(inputs);
        self.widget.on_execute(inputs);
    }
}
