//! Canvas navigation, node drawing and pointer routing.
//!
//! Pointer presses on a node body are delivered to its behavior in
//! node-local coordinates. Presses the behavior leaves unhandled start a
//! move, as do presses on the title bar.

use super::state::{DragKind, DragState, HostApp, OpenDialog};
use crate::controller::Dialog;
use crate::node::PointerOutcome;
use crate::render::format_value;
use crate::snapshot::SNAPSHOT_BACKGROUND;
use crate::surface::EguiSurface;
use eframe::egui;
use uuid::Uuid;

const TITLE_BACKGROUND: egui::Color32 = egui::Color32::from_rgb(34, 34, 34);
const TITLE_TEXT: egui::Color32 = egui::Color32::from_rgb(200, 200, 200);
const FOCUS_STROKE: egui::Color32 = egui::Color32::from_rgb(74, 158, 255);
const NODE_RADIUS: f32 = 6.0;

impl HostApp {
    /// Converts screen coordinates to world coordinates accounting for zoom and pan.
    pub fn screen_to_world(&self, screen_pos: egui::Pos2) -> egui::Pos2 {
        (screen_pos - self.canvas.offset) / self.canvas.zoom_factor
    }

    /// Converts world coordinates to screen coordinates accounting for zoom and pan.
    pub fn world_to_screen(&self, world_pos: egui::Pos2) -> egui::Pos2 {
        world_pos * self.canvas.zoom_factor + self.canvas.offset
    }

    /// Index of the topmost node whose body or title bar contains `world_pos`.
    pub fn node_at(&self, world_pos: egui::Pos2) -> Option<usize> {
        self.graph.nodes.iter().rposition(|node| {
            node.body_rect().contains(world_pos) || node.title_rect().contains(world_pos)
        })
    }

    fn bring_to_front(&mut self, index: usize) -> usize {
        let node = self.graph.nodes.remove(index);
        self.graph.nodes.push(node);
        self.graph.nodes.len() - 1
    }

    /// Routes a primary press at `screen_pos`. Returns true when it hit a node.
    pub fn press_primary(&mut self, screen_pos: egui::Pos2) -> bool {
        self.dialog = None;
        let world = self.screen_to_world(screen_pos);
        let Some(index) = self.node_at(world) else {
            return false;
        };
        let index = self.bring_to_front(index);
        let node = &mut self.graph.nodes[index];
        let id = node.id;

        if node.title_rect().contains(world) {
            self.start_drag(id, DragKind::Move, world);
            return true;
        }
        if node.resize_rect().contains(world) {
            self.start_drag(id, DragKind::Resize, world);
            return true;
        }

        let local = (world - node.pos).to_pos2();
        let outcome = node.body.behavior_mut().on_pointer_down(local, &mut node.size);
        if node.body.entries().is_some() {
            self.focused = Some(id);
        }
        match outcome {
            PointerOutcome::Handled { dialog } => {
                if let Some(dialog) = dialog {
                    self.open_dialog(id, dialog, screen_pos);
                }
            }
            PointerOutcome::Unhandled => self.start_drag(id, DragKind::Move, world),
        }
        true
    }

    /// Routes a secondary press at `screen_pos`. Returns true when a menu opened.
    pub fn press_secondary(&mut self, screen_pos: egui::Pos2) -> bool {
        self.dialog = None;
        let world = self.screen_to_world(screen_pos);
        let Some(index) = self.node_at(world) else {
            return false;
        };
        let node = &mut self.graph.nodes[index];
        if node.title_rect().contains(world) {
            return false;
        }
        let id = node.id;
        let local = (world - node.pos).to_pos2();
        let menu = node.body.behavior_mut().on_secondary_action(local, node.size);
        match menu {
            Some(dialog) => {
                self.open_dialog(id, dialog, screen_pos);
                true
            }
            None => {
                log::debug!("No context menu at {local:?} on node {id}");
                false
            }
        }
    }

    /// Continues the active drag to `screen_pos`.
    pub fn drag_to(&mut self, screen_pos: egui::Pos2) {
        let world = self.screen_to_world(screen_pos);
        let Some(drag) = self.drag.as_mut() else {
            return;
        };
        let delta = world - drag.last;
        drag.last = world;
        let (id, kind) = (drag.node, drag.kind);

        let Some(node) = self.graph.node_mut(id) else {
            self.drag = None;
            return;
        };
        match kind {
            DragKind::Move => node.pos += delta,
            DragKind::Resize => {
                let requested = world - node.pos;
                node.size = node.body.behavior_mut().on_resize(requested);
            }
        }
    }

    /// Ends the active drag.
    pub fn release(&mut self) {
        self.drag = None;
    }

    fn start_drag(&mut self, node: Uuid, kind: DragKind, world: egui::Pos2) {
        self.drag = Some(DragState {
            node,
            kind,
            last: world,
        });
    }

    /// Shows `dialog` for `node`, anchored at `anchor` on screen.
    pub fn open_dialog(&mut self, node: Uuid, dialog: Dialog, anchor: egui::Pos2) {
        let input = match &dialog {
            Dialog::EditValue { current, .. } => format_value(*current),
            _ => String::new(),
        };
        self.dialog = Some(OpenDialog {
            node,
            dialog,
            anchor,
            input,
            catalog_requested: false,
        });
    }

    /// Draws the canvas and routes pointer input to it.
    pub fn draw_canvas(&mut self, ui: &mut egui::Ui) {
        let (response, painter) =
            ui.allocate_painter(ui.available_size(), egui::Sense::click_and_drag());

        if !self.canvas.initialized {
            self.canvas.offset += response.rect.min.to_vec2();
            self.canvas.initialized = true;
        }

        self.handle_canvas_panning(ui, &response);
        self.handle_canvas_zoom(ui, &response);
        self.route_pointer(ui, &response);
        self.render_nodes(&painter);
    }

    fn route_pointer(&mut self, ui: &egui::Ui, response: &egui::Response) {
        if self.canvas.is_panning {
            return;
        }
        let (pos, primary_pressed, secondary_pressed, primary_down, command) = ui.input(|i| {
            (
                i.pointer.interact_pos(),
                i.pointer.primary_pressed(),
                i.pointer.secondary_pressed(),
                i.pointer.primary_down(),
                i.modifiers.command,
            )
        });
        let Some(pos) = pos else {
            return;
        };

        if primary_pressed && !command && response.contains_pointer() {
            self.press_primary(pos);
        } else if secondary_pressed && response.contains_pointer() {
            self.press_secondary(pos);
        } else if primary_down && self.drag.is_some() {
            self.drag_to(pos);
        } else if !primary_down {
            self.release();
        }
    }

    /// Handles middle-click or Cmd/Ctrl+left-click canvas panning.
    pub fn handle_canvas_panning(&mut self, ui: &egui::Ui, response: &egui::Response) {
        let should_pan = ui.input(|i| {
            i.pointer.middle_down() || (i.pointer.primary_down() && i.modifiers.command)
        });

        if should_pan {
            if let Some(current_pos) = response.interact_pointer_pos() {
                if !self.canvas.is_panning {
                    self.canvas.is_panning = true;
                    self.canvas.last_pan_pos = Some(current_pos);
                } else if let Some(last_pos) = self.canvas.last_pan_pos {
                    self.canvas.offset += current_pos - last_pos;
                    self.canvas.last_pan_pos = Some(current_pos);
                }
            }
        } else {
            self.canvas.is_panning = false;
            self.canvas.last_pan_pos = None;
        }
    }

    /// Zooms around the cursor with the scroll wheel, between 0.25x and 3x.
    pub fn handle_canvas_zoom(&mut self, ui: &egui::Ui, response: &egui::Response) {
        let scroll_delta = ui.input(|i| i.smooth_scroll_delta.y);
        if scroll_delta == 0.0 || !response.contains_pointer() {
            return;
        }
        let Some(mouse_pos) = ui.input(|i| i.pointer.hover_pos()) else {
            return;
        };

        let world_before = self.screen_to_world(mouse_pos);
        let zoom_delta = if scroll_delta > 0.0 { 0.025 } else { -0.025 };
        self.canvas.zoom_factor = (self.canvas.zoom_factor + zoom_delta).clamp(0.25, 3.0);
        // Keep the world point under the cursor fixed.
        let world_after = self.world_to_screen(world_before);
        self.canvas.offset += mouse_pos - world_after;
    }

    fn render_nodes(&mut self, painter: &egui::Painter) {
        let zoom = self.canvas.zoom_factor;
        let offset = self.canvas.offset;
        let to_screen = |p: egui::Pos2| p * zoom + offset;
        let focused = self.focused;

        for node in &mut self.graph.nodes {
            // Reserve the background slot; the body may grow while drawing.
            let background = painter.add(egui::Shape::Noop);
            let origin = to_screen(node.pos);
            {
                let mut surface = EguiSurface::new(painter, origin, zoom);
                node.body.behavior_mut().on_draw(&mut surface, &mut node.size);
            }

            let body = egui::Rect::from_min_max(origin, to_screen(node.body_rect().max));
            let title = egui::Rect::from_min_max(to_screen(node.title_rect().min), body.right_top());
            let frame = body.union(title);
            painter.set(
                background,
                egui::Shape::rect_filled(frame, NODE_RADIUS * zoom, SNAPSHOT_BACKGROUND),
            );

            painter.rect_filled(title, NODE_RADIUS * zoom, TITLE_BACKGROUND);
            painter.text(
                title.left_center() + egui::vec2(8.0 * zoom, 0.0),
                egui::Align2::LEFT_CENTER,
                &node.body.base().title,
                egui::FontId::proportional((13.0 * zoom).clamp(4.0, 48.0)),
                TITLE_TEXT,
            );

            let corner = body.max;
            let grip = super::state::RESIZE_HANDLE * zoom;
            painter.line_segment(
                [corner - egui::vec2(grip, 2.0), corner - egui::vec2(2.0, grip)],
                egui::Stroke::new(1.0, TITLE_TEXT),
            );

            if focused == Some(node.id) {
                painter.rect_stroke(
                    frame,
                    NODE_RADIUS * zoom,
                    egui::Stroke::new(1.5, FOCUS_STROKE),
                    egui::StrokeKind::Outside,
                );
            }
        }
    }
}
