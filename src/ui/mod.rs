//! Desktop host for the Power LoRA node.
//!
//! # Module Organization
//!
//! - `state` - Application state, settings and the node graph
//! - `canvas` - Canvas navigation, node drawing and pointer routing
//! - `dialogs` - Reference selector, value prompt and row menu
//! - `file_ops` - Workflow save/load and snapshot export
//! - `queue` - Submission building

mod canvas;
mod dialogs;
mod file_ops;
mod queue;
mod state;


pub use file_ops::WorkflowError;
pub use state::{BaseNode, Graph, HostApp, HostNode, HostSettings, NodeBody};

use self::state::{PendingFileOperation, PLAIN_NODE_TYPES, SETTINGS_KEY};
use crate::export::NODE_TYPE;
use eframe::egui;

impl eframe::App for HostApp {
    /// Persist settings between restarts.
    fn save(&mut self, storage: &mut dyn eframe::Storage) {
        match serde_json::to_string(&self.settings) {
            Ok(json) => storage.set_string(SETTINGS_KEY, json),
            Err(err) => log::error!("Failed to serialize settings: {err}"),
        }
    }

    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let visuals = if self.settings.dark_mode {
            egui::Visuals::dark()
        } else {
            egui::Visuals::light()
        };
        ctx.set_visuals(visuals);

        self.handle_pending_operations(ctx);
        self.prefetch_catalog(ctx);
        self.poll_catalog();

        egui::TopBottomPanel::top("top_toolbar").show(ctx, |ui| {
            self.draw_toolbar(ui);
        });

        if self.queue.is_some() {
            egui::SidePanel::right("queue_panel")
                .default_width(320.0)
                .show(ctx, |ui| self.draw_queue_panel(ui));
        }

        egui::CentralPanel::default().show(ctx, |ui| {
            self.draw_canvas(ui);
        });

        self.show_dialog(ctx);
    }
}

impl HostApp {
    fn draw_toolbar(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            ui.menu_button("Add node", |ui| {
                if ui.button("Power Lora Loader").clicked() {
                    self.add_node(NODE_TYPE);
                    ui.close();
                }
                for (node_type, title) in PLAIN_NODE_TYPES {
                    if ui.button(*title).clicked() {
                        self.add_node(node_type);
                        ui.close();
                    }
                }
            });
            ui.separator();
            if ui.button("Queue").clicked() {
                self.queue_prompt();
            }
            ui.separator();
            if ui.button("Save").clicked() {
                self.pending_file_operation = Some(PendingFileOperation::Save);
            }
            if ui.button("Load").clicked() {
                self.pending_file_operation = Some(PendingFileOperation::Load);
            }
            if ui.button("Export snapshot").clicked() {
                self.pending_file_operation = Some(PendingFileOperation::ExportSnapshot);
            }
            ui.separator();
            ui.checkbox(&mut self.settings.dark_mode, "Dark mode");
            ui.label("Catalog:");
            ui.add(egui::TextEdit::singleline(&mut self.settings.catalog_url).desired_width(200.0));
            if !self.status.is_empty() {
                ui.separator();
                ui.label(&self.status);
            }
        });
    }

    fn draw_queue_panel(&mut self, ui: &mut egui::Ui) {
        let Some(queue) = &self.queue else {
            return;
        };
        ui.horizontal(|ui| {
            ui.heading("Submission");
            ui.label(format!("{} patched", queue.patched));
        });
        let mut close = false;
        egui::ScrollArea::vertical().show(ui, |ui| {
            ui.label("Payload");
            ui.code(&queue.payload);
            ui.separator();
            ui.label("Resolved stacks");
            ui.code(&queue.resolved);
            close = ui.button("Close").clicked();
        });
        if close {
            self.queue = None;
        }
    }
}
