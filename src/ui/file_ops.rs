//! Workflow save/load and snapshot export.
//!
//! Dialogs run on the async runtime; results come back to the app through
//! a channel and are applied on the next frame.

use super::state::{
    FileOperationResult, Graph, HostApp, HostNode, NodeBody, PendingFileOperation,
};
use crate::snapshot::{self, SnapshotError};
use eframe::egui;
use serde_json::{json, Map, Value};
use uuid::Uuid;

/// Workflow format version written to files.
pub const WORKFLOW_VERSION: u64 = 1;

/// Errors raised while reading a workflow file.
#[derive(thiserror::Error, Debug)]
pub enum WorkflowError {
    /// The file is not valid JSON
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    /// The file has no node list
    #[error("workflow has no node list")]
    MissingNodes,
    /// A node has a type the host does not know
    #[error("unknown node type: {0}")]
    UnknownNodeType(String),
}

fn read_pair(value: Option<&Value>) -> Option<egui::Vec2> {
    let pair = value?.as_array()?;
    match pair.as_slice() {
        [x, y] => Some(egui::vec2(x.as_f64()? as f32, y.as_f64()? as f32)),
        _ => None,
    }
}

impl Graph {
    /// Serializes the graph as a workflow document.
    pub fn to_workflow(&self) -> Value {
        let nodes: Vec<Value> = self
            .nodes
            .iter()
            .map(|node| {
                let mut out = Map::new();
                out.insert("id".into(), json!(node.id));
                out.insert("pos".into(), json!([node.pos.x, node.pos.y]));
                out.insert("size".into(), json!([node.size.x, node.size.y]));
                node.body.behavior().on_serialize(&mut out);
                Value::Object(out)
            })
            .collect();
        json!({ "version": WORKFLOW_VERSION, "nodes": nodes })
    }

    /// Rebuilds a graph from a workflow document.
    pub fn from_workflow(json: &str) -> Result<Self, WorkflowError> {
        let doc: Value = serde_json::from_str(json)?;
        let records = doc
            .get("nodes")
            .and_then(Value::as_array)
            .ok_or(WorkflowError::MissingNodes)?;

        let mut graph = Graph::default();
        for record in records {
            let Some(data) = record.as_object() else {
                log::warn!("Skipping workflow node that is not an object");
                continue;
            };
            let node_type = data.get("type").and_then(Value::as_str).unwrap_or_default();
            let body = NodeBody::for_type(node_type)
                .ok_or_else(|| WorkflowError::UnknownNodeType(node_type.to_string()))?;

            let mut node = HostNode::new(egui::Pos2::ZERO, body);
            if let Some(id) = data
                .get("id")
                .and_then(Value::as_str)
                .and_then(|s| Uuid::parse_str(s).ok())
            {
                node.id = id;
            }
            if let Some(pos) = read_pair(data.get("pos")) {
                node.pos = pos.to_pos2();
            }
            if let Some(size) = read_pair(data.get("size")) {
                node.size = size;
            }
            node.body.behavior_mut().on_configure(data, &mut node.size);
            graph.nodes.push(node);
        }
        Ok(graph)
    }
}

fn write_snapshot(
    path: &std::path::Path,
    svg: &str,
    width: u32,
    height: u32,
) -> Result<(), SnapshotError> {
    let is_png = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("png"));
    if is_png {
        #[cfg(not(target_arch = "wasm32"))]
        {
            let bytes = snapshot::render_png(svg, width, height, 2.0)?;
            std::fs::write(path, bytes)?;
            return Ok(());
        }
    }
    std::fs::write(path, svg.as_bytes())?;
    Ok(())
}

impl HostApp {
    /// Serializes the current graph.
    pub fn workflow_json(&self) -> Result<String, WorkflowError> {
        Ok(serde_json::to_string_pretty(&self.graph.to_workflow())?)
    }

    /// Replaces the graph with the workflow in `json`.
    pub fn load_workflow(&mut self, json: &str) -> Result<usize, WorkflowError> {
        let graph = Graph::from_workflow(json)?;
        let count = graph.nodes.len();
        self.graph = graph;
        self.dialog = None;
        self.drag = None;
        self.focused = None;
        self.queue = None;
        Ok(count)
    }

    /// Renders the focused Power LoRA node, or the first one, to SVG.
    pub fn snapshot_svg(&self) -> Option<(String, u32, u32)> {
        let node = self
            .focused
            .and_then(|id| self.graph.node(id))
            .filter(|n| n.body.entries().is_some())
            .or_else(|| self.graph.nodes.iter().find(|n| n.body.entries().is_some()))?;
        let entries = node.body.entries()?;
        Some(snapshot::render_svg(entries, node.size))
    }

    /// Processes completed file operations and starts the pending one.
    pub fn handle_pending_operations(&mut self, ctx: &egui::Context) {
        while let Ok(result) = self.file_receiver.try_recv() {
            match result {
                FileOperationResult::SaveCompleted(path) => {
                    log::info!("Workflow saved to {path}");
                    self.status = format!("Saved {path}");
                    self.settings.last_workflow_path = Some(path);
                }
                FileOperationResult::LoadCompleted(path, content) => {
                    match self.load_workflow(&content) {
                        Ok(count) => {
                            log::info!("Loaded {count} nodes from {path}");
                            self.status = format!("Loaded {path}");
                            self.settings.last_workflow_path = Some(path);
                        }
                        Err(e) => {
                            log::error!("Failed to load workflow {path}: {e}");
                            self.status = format!("Load failed: {e}");
                        }
                    }
                }
                FileOperationResult::ExportCompleted(path) => {
                    log::info!("Snapshot written to {path}");
                    self.status = format!("Exported {path}");
                }
                FileOperationResult::OperationFailed(error) => {
                    log::error!("File operation failed: {error}");
                    self.status = error;
                }
            }
        }

        let Some(operation) = self.pending_file_operation.take() else {
            return;
        };

        #[cfg(not(target_arch = "wasm32"))]
        {
            let Ok(runtime) = tokio::runtime::Handle::try_current() else {
                log::error!("No async runtime available for file dialogs");
                return;
            };
            let sender = self.file_sender.clone();
            let ctx = ctx.clone();

            match operation {
                PendingFileOperation::Save => {
                    let json = match self.workflow_json() {
                        Ok(json) => json,
                        Err(e) => {
                            log::error!("Failed to serialize workflow: {e}");
                            return;
                        }
                    };
                    runtime.spawn(async move {
                        if let Some(handle) = rfd::AsyncFileDialog::new()
                            .add_filter("JSON", &["json"])
                            .set_file_name("workflow.json")
                            .save_file()
                            .await
                        {
                            let path = handle.path();
                            let _ = match std::fs::write(path, json) {
                                Ok(_) => sender
                                    .send(FileOperationResult::SaveCompleted(path.display().to_string())),
                                Err(e) => sender.send(FileOperationResult::OperationFailed(
                                    format!("Failed to save file: {e}"),
                                )),
                            };
                        }
                        ctx.request_repaint();
                    });
                }
                PendingFileOperation::Load => {
                    runtime.spawn(async move {
                        if let Some(handle) = rfd::AsyncFileDialog::new()
                            .add_filter("JSON", &["json"])
                            .pick_file()
                            .await
                        {
                            let path = handle.path();
                            let _ = match std::fs::read_to_string(path) {
                                Ok(json) => sender.send(FileOperationResult::LoadCompleted(
                                    path.display().to_string(),
                                    json,
                                )),
                                Err(e) => sender.send(FileOperationResult::OperationFailed(
                                    format!("Failed to read file: {e}"),
                                )),
                            };
                        }
                        ctx.request_repaint();
                    });
                }
                PendingFileOperation::ExportSnapshot => {
                    let Some((svg, width, height)) = self.snapshot_svg() else {
                        self.status = "No Power LoRA node to export".to_string();
                        return;
                    };
                    runtime.spawn(async move {
                        if let Some(handle) = rfd::AsyncFileDialog::new()
                            .add_filter("SVG", &["svg"])
                            .add_filter("PNG", &["png"])
                            .set_file_name("power_lora.svg")
                            .save_file()
                            .await
                        {
                            let path = handle.path();
                            let _ = match write_snapshot(path, &svg, width, height) {
                                Ok(()) => sender
                                    .send(FileOperationResult::ExportCompleted(path.display().to_string())),
                                Err(e) => sender.send(FileOperationResult::OperationFailed(
                                    format!("Failed to export snapshot: {e}"),
                                )),
                            };
                        }
                        ctx.request_repaint();
                    });
                }
            }
        }

        #[cfg(target_arch = "wasm32")]
        {
            let _ = (ctx, operation);
            log::warn!("File dialogs are not available on this target");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Entry, EntryList};

    #[test]
    fn test_workflow_round_trip_keeps_entries_and_geometry() {
        let mut graph = Graph::demo();
        let lora = graph
            .nodes
            .iter_mut()
            .find(|n| n.body.entries().is_some())
            .unwrap();
        lora.body = NodeBody::power_lora(EntryList::from_entries(vec![
            Entry {
                enabled: false,
                reference: Some("a.safetensors".into()),
                value: 0.5,
            },
            Entry::default(),
        ]));
        lora.size = egui::vec2(340.0, 200.0);
        let id = lora.id;

        let json = serde_json::to_string(&graph.to_workflow()).unwrap();
        let restored = Graph::from_workflow(&json).unwrap();

        assert_eq!(restored.nodes.len(), 3);
        let node = restored.node(id).unwrap();
        assert_eq!(node.size, egui::vec2(340.0, 200.0));
        assert_eq!(node.body, graph.node(id).unwrap().body);
    }

    #[test]
    fn test_configure_grows_undersized_saved_node() {
        let json = r#"{"nodes": [{"type": "PowerLoraLoader", "size": [300, 80],
            "entries": [{"enabled": true, "reference": null, "value": 1.0}]}]}"#;
        let graph = Graph::from_workflow(json).unwrap();

        assert_eq!(graph.nodes[0].size, egui::vec2(300.0, 128.0));
    }

    #[test]
    fn test_legacy_node_loads() {
        let json = r#"{"nodes": [{"type": "PowerLoraLoader", "title": "Old",
            "lorasData": [{"on": false, "lora": "x.safetensors", "strength": 0.8}]}]}"#;
        let graph = Graph::from_workflow(json).unwrap();
        let node = &graph.nodes[0];

        assert_eq!(node.body.base().title, "Old");
        let entries = node.body.entries().unwrap();
        assert_eq!(entries.get(0).unwrap().reference.as_deref(), Some("x.safetensors"));
        assert!(!entries.get(0).unwrap().enabled);
    }

    #[test]
    fn test_workflow_errors() {
        assert!(matches!(Graph::from_workflow("nope"), Err(WorkflowError::Json(_))));
        assert!(matches!(
            Graph::from_workflow(r#"{"version": 1}"#),
            Err(WorkflowError::MissingNodes)
        ));
        assert!(matches!(
            Graph::from_workflow(r#"{"nodes": [{"type": "Mystery"}]}"#),
            Err(WorkflowError::UnknownNodeType(t)) if t == "Mystery"
        ));
    }

    #[test]
    fn test_failed_load_keeps_current_graph() {
        let mut app = HostApp::default();
        let before = app.graph.clone();

        assert!(app.load_workflow("{}").is_err());
        assert_eq!(app.graph, before);
    }

    #[test]
    fn test_snapshot_uses_power_lora_node() {
        let app = HostApp::default();
        let (svg, width, _) = app.snapshot_svg().unwrap();

        assert_eq!(width, 300);
        assert!(svg.contains(crate::render::ADD_LABEL));
    }
}
