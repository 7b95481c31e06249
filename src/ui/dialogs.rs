//! Host dialogs opened on behalf of node widgets.

use super::state::{CatalogEvent, CatalogView, HostApp};
use crate::catalog;
use crate::controller::{
    selector_items, Dialog, DialogResult, MenuItem, PROMPT_TITLE, ROW_MENU_TITLE, SELECTOR_TITLE,
};
use eframe::egui;
use uuid::Uuid;

/// Line shown in the selector while the catalog loads.
pub const LOADING_LABEL: &str = "Loading...";

impl HostApp {
    /// Delivers a dialog result to the node that opened the dialog.
    ///
    /// Returns true when the node changed.
    pub fn apply_dialog_result(&mut self, node: Uuid, result: DialogResult) -> bool {
        let Some(target) = self.graph.node_mut(node) else {
            log::debug!("Dropping dialog result for missing node {node}");
            return false;
        };
        target
            .body
            .behavior_mut()
            .on_dialog_result(result, &mut target.size)
    }

    /// Processes finished catalog fetches.
    pub fn poll_catalog(&mut self) {
        while let Ok(event) = self.catalog_receiver.try_recv() {
            match event {
                CatalogEvent::Finished(entries) => {
                    log::debug!("Catalog fetch finished with {} references", entries.len());
                    self.catalog_view = CatalogView::Idle;
                }
            }
        }
    }

    /// Issues the catalog fetch once at startup so the first selector opens populated.
    pub fn prefetch_catalog(&mut self, ctx: &egui::Context) {
        if !self.catalog_prefetched {
            self.catalog_prefetched = true;
            self.request_catalog(ctx);
        }
    }

    /// Starts a catalog fetch unless one is running or the cache is populated.
    fn request_catalog(&mut self, ctx: &egui::Context) {
        if catalog::global().is_populated() || self.catalog_view == CatalogView::Loading {
            return;
        }

        #[cfg(not(target_arch = "wasm32"))]
        {
            let Ok(runtime) = tokio::runtime::Handle::try_current() else {
                log::warn!("No async runtime available; the LoRA catalog stays empty");
                return;
            };
            self.catalog_view = CatalogView::Loading;
            let source = catalog::HttpCatalogSource::new(self.settings.catalog_url.clone());
            let sender = self.catalog_sender.clone();
            let ctx = ctx.clone();
            runtime.spawn(async move {
                let entries = catalog::global().get_or_fetch(&source).await;
                let _ = sender.send(CatalogEvent::Finished(entries));
                ctx.request_repaint();
            });
        }

        #[cfg(target_arch = "wasm32")]
        {
            let _ = ctx;
            log::warn!("Catalog fetching is not available on this target");
        }
    }

    /// Shows the open dialog, if any, and applies what the user picks.
    pub fn show_dialog(&mut self, ctx: &egui::Context) {
        let Some(open) = self.dialog.as_mut() else {
            return;
        };
        let node = open.node;
        let anchor = open.anchor;

        if ctx.input(|i| i.key_pressed(egui::Key::Escape)) {
            self.dialog = None;
            return;
        }

        let mut keep_open = true;
        let result = match open.dialog.clone() {
            Dialog::SelectReference { index } => {
                let first_frame = !open.catalog_requested;
                open.catalog_requested = true;
                if first_frame {
                    self.request_catalog(ctx);
                }
                self.show_selector(ctx, node, index, anchor, &mut keep_open)
            }
            Dialog::EditValue { index, .. } => {
                let input = &mut open.input;
                show_prompt(ctx, index, input, anchor, &mut keep_open)
            }
            Dialog::RowMenu { index, items } => {
                show_row_menu(ctx, index, &items, anchor, &mut keep_open)
            }
        };

        if let Some(result) = result {
            self.dialog = None;
            self.apply_dialog_result(node, result);
        } else if !keep_open {
            self.dialog = None;
        }
    }

    fn show_selector(
        &self,
        ctx: &egui::Context,
        node: Uuid,
        index: usize,
        anchor: egui::Pos2,
        keep_open: &mut bool,
    ) -> Option<DialogResult> {
        let current = self
            .graph
            .node(node)
            .and_then(|n| n.body.entries())
            .and_then(|entries| entries.get(index))
            .and_then(|entry| entry.reference.clone());
        let loading = self.catalog_view == CatalogView::Loading;
        let items = selector_items(&catalog::global().snapshot());

        let mut chosen = None;
        egui::Window::new(SELECTOR_TITLE)
            .id(egui::Id::new("lora_selector"))
            .collapsible(false)
            .resizable(false)
            .default_pos(anchor)
            .open(keep_open)
            .show(ctx, |ui| {
                if loading {
                    ui.horizontal(|ui| {
                        ui.spinner();
                        ui.label(LOADING_LABEL);
                    });
                    return;
                }
                egui::ScrollArea::vertical()
                    .max_height(320.0)
                    .show(ui, |ui| {
                        for item in &items {
                            let selected = item.reference == current;
                            if ui.selectable_label(selected, &item.label).clicked() {
                                chosen = Some(DialogResult::Reference {
                                    index,
                                    reference: item.reference.clone(),
                                });
                            }
                        }
                    });
            });
        chosen
    }
}

fn show_prompt(
    ctx: &egui::Context,
    index: usize,
    input: &mut String,
    anchor: egui::Pos2,
    keep_open: &mut bool,
) -> Option<DialogResult> {
    let mut confirmed = false;
    let mut cancelled = false;
    egui::Window::new(PROMPT_TITLE)
        .id(egui::Id::new("value_prompt"))
        .collapsible(false)
        .resizable(false)
        .default_pos(anchor)
        .open(keep_open)
        .show(ctx, |ui| {
            let edit = ui.text_edit_singleline(input);
            if !edit.has_focus() && !edit.lost_focus() {
                edit.request_focus();
            }
            if edit.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter)) {
                confirmed = true;
            }
            ui.horizontal(|ui| {
                if ui.button("OK").clicked() {
                    confirmed = true;
                }
                if ui.button("Cancel").clicked() {
                    cancelled = true;
                }
            });
        });

    if cancelled {
        *keep_open = false;
        return None;
    }
    confirmed.then(|| DialogResult::Value {
        index,
        input: input.clone(),
    })
}

fn show_row_menu(
    ctx: &egui::Context,
    index: usize,
    items: &[MenuItem],
    anchor: egui::Pos2,
    keep_open: &mut bool,
) -> Option<DialogResult> {
    let mut chosen = None;
    let area = egui::Area::new(egui::Id::new("row_menu"))
        .fixed_pos(anchor)
        .order(egui::Order::Foreground)
        .show(ctx, |ui| {
            egui::Frame::popup(ui.style()).show(ui, |ui| {
                ui.set_min_width(120.0);
                ui.strong(ROW_MENU_TITLE);
                ui.separator();
                for item in items {
                    if ui
                        .add_enabled(!item.disabled, egui::Button::new(&item.label))
                        .clicked()
                    {
                        chosen = Some(DialogResult::Row {
                            index,
                            action: item.action,
                        });
                    }
                }
            });
        });

    if chosen.is_none() && area.response.clicked_elsewhere() {
        *keep_open = false;
    }
    chosen
}
