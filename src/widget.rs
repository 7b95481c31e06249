//! The LoRA list widget as a node behavior.

use crate::controller::{Dialog, DialogResult};
use crate::hit_test::{hit_test, Zone};
use crate::node::{NodeBehavior, PointerOutcome};
use crate::surface::Surface;
use crate::types::EntryList;
use crate::{export, persist, render, size};
use eframe::egui;
use serde_json::{Map, Value};

/// A node body made of toggleable LoRA entries with a strength stepper each.
///
/// The widget owns the entry list. Geometry is never stored; every callback
/// recomputes it from the entry count and the size the host passes in.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PowerLoraWidget {
    pub(crate) entries: EntryList,
}

impl PowerLoraWidget {
    /// Creates a widget with no entries.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a widget holding `entries`.
    pub fn with_entries(entries: EntryList) -> Self {
        Self { entries }
    }

    /// The entry list.
    pub fn entries(&self) -> &EntryList {
        &self.entries
    }

    /// Mutable access to the entry list for direct model edits.
    pub fn entries_mut(&mut self) -> &mut EntryList {
        &mut self.entries
    }
}

impl NodeBehavior for PowerLoraWidget {
    fn on_draw(&mut self, surface: &mut dyn Surface, size: &mut egui::Vec2) {
        render::draw(&self.entries, size, surface);
    }

    fn hit_test(&self, pos: egui::Pos2, size: egui::Vec2) -> Option<Zone> {
        hit_test(self.entries.len(), size.x, pos)
    }

    fn on_pointer_down(&mut self, pos: egui::Pos2, size: &mut egui::Vec2) -> PointerOutcome {
        self.pointer_down(pos, size)
    }

    fn on_secondary_action(&mut self, pos: egui::Pos2, size: egui::Vec2) -> Option<Dialog> {
        self.secondary_action(pos, size)
    }

    fn on_dialog_result(&mut self, result: DialogResult, size: &mut egui::Vec2) -> bool {
        self.apply(result, size)
    }

    fn on_resize(&mut self, requested: egui::Vec2) -> egui::Vec2 {
        size::clamp_resize(self.entries.len(), requested)
    }

    fn on_serialize(&self, out: &mut Map<String, Value>) {
        persist::write_entries(&self.entries, out);
    }

    fn on_configure(&mut self, data: &Map<String, Value>, size: &mut egui::Vec2) {
        self.entries = persist::read_entries(data);
        size::grow_to_min(self.entries.len(), size);
    }

    fn on_execute(&self, inputs: &mut Map<String, Value>) {
        export::write_execution_inputs(&self.entries, inputs);
    }
}
