//! Application state for the demo host.
//!
//! The host owns a small graph of nodes. Every node body is driven through
//! [`NodeBehavior`]; the Power LoRA node attaches the widget to a plain
//! [`BaseNode`] with [`Chained`].

use crate::controller::Dialog;
use crate::export::{EntrySource, NODE_TYPE};
use crate::node::{Chained, NodeBehavior};
use crate::surface::Surface;
use crate::types::{Entry, EntryList};
use crate::widget::PowerLoraWidget;
use eframe::egui;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::mpsc::{channel, Receiver, Sender};
use uuid::Uuid;

/// Default address of the host serving node metadata.
pub const DEFAULT_CATALOG_URL: &str = "http://127.0.0.1:8188";
/// Environment variable overriding the catalog address.
pub const CATALOG_URL_ENV: &str = "POWER_LORA_CATALOG_URL";
/// Storage key of the persisted settings.
pub const SETTINGS_KEY: &str = "host_settings";

/// Height of the title bar drawn above each node body.
pub const TITLE_HEIGHT: f32 = 24.0;
/// Side of the square resize handle in the bottom-right body corner.
pub const RESIZE_HANDLE: f32 = 10.0;
/// Smallest body a plain node accepts.
pub const BASE_MIN_SIZE: egui::Vec2 = egui::vec2(140.0, 40.0);

/// Plain node types the host knows, with their default titles.
pub const PLAIN_NODE_TYPES: &[(&str, &str)] = &[
    ("WanVideoModelLoader", "WanVideo Model Loader"),
    ("WanVideoSampler", "WanVideo Sampler"),
];
/// Default title of the Power LoRA node.
pub const POWER_LORA_TITLE: &str = "WanVideo Power Lora Loader";

/// User settings persisted between sessions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HostSettings {
    /// Base URL of the host serving `/object_info`
    pub catalog_url: String,
    /// Whether dark mode visuals are enabled
    pub dark_mode: bool,
    /// Last workflow file saved or loaded
    pub last_workflow_path: Option<String>,
}

impl Default for HostSettings {
    fn default() -> Self {
        Self {
            catalog_url: DEFAULT_CATALOG_URL.to_string(),
            dark_mode: true,
            last_workflow_path: None,
        }
        .with_env_overrides()
    }
}

impl HostSettings {
    /// Applies environment overrides on top of stored values.
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Applies overrides read through `lookup`. Blank values are ignored.
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(url) = lookup(CATALOG_URL_ENV) {
            let url = url.trim();
            if !url.is_empty() {
                self.catalog_url = url.to_string();
            }
        }
        self
    }

    /// Restores settings from a JSON string, falling back to defaults.
    pub fn from_storage(json: Option<String>) -> Self {
        match json.map(|s| serde_json::from_str::<HostSettings>(&s)) {
            Some(Ok(settings)) => settings.with_env_overrides(),
            Some(Err(err)) => {
                log::warn!("Ignoring stored settings: {err}");
                Self::default()
            }
            None => Self::default(),
        }
    }
}

/// The behavior every host node starts with: a type tag and a title.
#[derive(Debug, Clone, PartialEq)]
pub struct BaseNode {
    /// Node type, used as `class_type` in submissions
    pub node_type: String,
    /// Displayed title
    pub title: String,
}

impl BaseNode {
    /// Creates a base behavior.
    pub fn new(node_type: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            node_type: node_type.into(),
            title: title.into(),
        }
    }
}

impl Default for BaseNode {
    fn default() -> Self {
        Self::new(NODE_TYPE, POWER_LORA_TITLE)
    }
}

impl NodeBehavior for BaseNode {
    fn on_draw(&mut self, surface: &mut dyn Surface, _size: &mut egui::Vec2) {
        surface.text(
            egui::pos2(8.0, 12.0),
            egui::Align2::LEFT_CENTER,
            &self.node_type,
            &egui::FontId::proportional(10.0),
            egui::Color32::from_gray(110),
        );
    }

    fn on_resize(&mut self, requested: egui::Vec2) -> egui::Vec2 {
        requested.max(BASE_MIN_SIZE)
    }

    fn on_serialize(&self, out: &mut Map<String, Value>) {
        out.insert("type".into(), Value::String(self.node_type.clone()));
        out.insert("title".into(), Value::String(self.title.clone()));
    }

    fn on_configure(&mut self, data: &Map<String, Value>, _size: &mut egui::Vec2) {
        if let Some(title) = data.get("title").and_then(Value::as_str) {
            self.title = title.to_string();
        }
    }
}

/// Behavior of a node body.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeBody {
    /// A node without a custom widget
    Plain(BaseNode),
    /// A node carrying the LoRA list widget
    PowerLora(Chained<BaseNode, PowerLoraWidget>),
}

impl NodeBody {
    /// Creates the body for `node_type`, if the host knows that type.
    pub fn for_type(node_type: &str) -> Option<Self> {
        if node_type == NODE_TYPE {
            return Some(Self::power_lora(EntryList::new()));
        }
        PLAIN_NODE_TYPES
            .iter()
            .find(|(t, _)| *t == node_type)
            .map(|(t, title)| Self::Plain(BaseNode::new(*t, *title)))
    }

    /// Creates a Power LoRA body holding `entries`.
    pub fn power_lora(entries: EntryList) -> Self {
        Self::PowerLora(Chained::new(
            BaseNode::default(),
            PowerLoraWidget::with_entries(entries),
        ))
    }

    /// The base behavior shared by every body.
    pub fn base(&self) -> &BaseNode {
        match self {
            Self::Plain(base) => base,
            Self::PowerLora(chain) => &chain.base,
        }
    }

    /// The entry list, for Power LoRA bodies.
    pub fn entries(&self) -> Option<&EntryList> {
        match self {
            Self::Plain(_) => None,
            Self::PowerLora(chain) => Some(chain.widget.entries()),
        }
    }

    /// The behavior the host drives.
    pub fn behavior(&self) -> &dyn NodeBehavior {
        match self {
            Self::Plain(base) => base,
            Self::PowerLora(chain) => chain,
        }
    }

    /// Mutable access to the behavior the host drives.
    pub fn behavior_mut(&mut self) -> &mut dyn NodeBehavior {
        match self {
            Self::Plain(base) => base,
            Self::PowerLora(chain) => chain,
        }
    }
}

/// A node placed on the canvas.
#[derive(Debug, Clone, PartialEq)]
pub struct HostNode {
    /// Stable identifier, also the node's key in submissions
    pub id: Uuid,
    /// Top-left corner of the body in world space
    pub pos: egui::Pos2,
    /// Body size
    pub size: egui::Vec2,
    /// Behavior driving the body
    pub body: NodeBody,
}

impl HostNode {
    /// Creates a node at `pos`, sized to what its behavior accepts.
    pub fn new(pos: egui::Pos2, body: NodeBody) -> Self {
        let mut node = Self {
            id: Uuid::new_v4(),
            pos,
            size: BASE_MIN_SIZE,
            body,
        };
        node.size = node.body.behavior_mut().on_resize(BASE_MIN_SIZE);
        node
    }

    /// Body rectangle in world space.
    pub fn body_rect(&self) -> egui::Rect {
        egui::Rect::from_min_size(self.pos, self.size)
    }

    /// Title bar rectangle in world space.
    pub fn title_rect(&self) -> egui::Rect {
        egui::Rect::from_min_max(
            self.pos - egui::vec2(0.0, TITLE_HEIGHT),
            egui::pos2(self.pos.x + self.size.x, self.pos.y),
        )
    }

    /// Resize handle rectangle in world space.
    pub fn resize_rect(&self) -> egui::Rect {
        let corner = self.body_rect().max;
        egui::Rect::from_min_max(corner - egui::vec2(RESIZE_HANDLE, RESIZE_HANDLE), corner)
    }
}

/// The nodes on the canvas, in drawing order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Graph {
    /// Nodes; later nodes draw on top
    pub nodes: Vec<HostNode>,
}

impl Graph {
    /// A small pipeline: model loader, Power LoRA node and sampler.
    pub fn demo() -> Self {
        let mut graph = Self::default();
        for (x, node_type) in [
            (40.0, "WanVideoModelLoader"),
            (260.0, NODE_TYPE),
            (640.0, "WanVideoSampler"),
        ] {
            if let Some(body) = NodeBody::for_type(node_type) {
                graph.nodes.push(HostNode::new(egui::pos2(x, 80.0), body));
            }
        }
        graph
    }

    /// Finds a node by id.
    pub fn node(&self, id: Uuid) -> Option<&HostNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// Finds a node by id for mutation.
    pub fn node_mut(&mut self, id: Uuid) -> Option<&mut HostNode> {
        self.nodes.iter_mut().find(|n| n.id == id)
    }
}

impl EntrySource for Graph {
    fn entries_for(&self, node_id: &str) -> Option<Vec<Entry>> {
        let id = Uuid::parse_str(node_id).ok()?;
        self.node(id)?.body.entries().map(EntryList::snapshot)
    }
}

/// What an active pointer drag changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragKind {
    /// Moving the node
    Move,
    /// Resizing the node from its bottom-right corner
    Resize,
}

/// An active pointer drag on a node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragState {
    /// Dragged node
    pub node: Uuid,
    /// What the drag changes
    pub kind: DragKind,
    /// Pointer position at the previous frame, in world space
    pub last: egui::Pos2,
}

/// Canvas navigation state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CanvasState {
    /// Pan offset in screen space
    pub offset: egui::Vec2,
    /// Zoom factor
    pub zoom_factor: f32,
    /// Whether the offset has been aligned with the canvas rectangle
    pub initialized: bool,
    /// Whether the user is panning
    pub is_panning: bool,
    /// Last pointer position while panning
    pub last_pan_pos: Option<egui::Pos2>,
}

impl Default for CanvasState {
    fn default() -> Self {
        Self {
            offset: egui::Vec2::ZERO,
            zoom_factor: 1.0,
            initialized: false,
            is_panning: false,
            last_pan_pos: None,
        }
    }
}

/// A widget dialog the host is showing.
#[derive(Debug, Clone, PartialEq)]
pub struct OpenDialog {
    /// Node that asked for the dialog
    pub node: Uuid,
    /// The dialog
    pub dialog: Dialog,
    /// Screen position the dialog opens at
    pub anchor: egui::Pos2,
    /// Text buffer of the value prompt
    pub input: String,
    /// Whether this opening already asked for the catalog
    pub catalog_requested: bool,
}

/// Loading state of the catalog as seen by the selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CatalogView {
    /// No fetch running
    #[default]
    Idle,
    /// A fetch is running; the selector shows a loading line
    Loading,
}

/// Messages sent from async catalog fetches back to the app.
#[derive(Debug)]
pub enum CatalogEvent {
    /// A fetch finished; the list is empty when it failed
    Finished(Vec<String>),
}

/// Represents a pending workflow file operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PendingFileOperation {
    /// Save to a file chosen with a dialog
    Save,
    /// Load from a file chosen with a dialog
    Load,
    /// Export a snapshot of the last used Power LoRA node
    ExportSnapshot,
}

/// Messages sent from async file operations back to the main app.
#[derive(Debug)]
pub enum FileOperationResult {
    /// Save operation completed successfully with the given path
    SaveCompleted(String),
    /// Load operation completed successfully with path and content
    LoadCompleted(String, String),
    /// Snapshot written to the given path
    ExportCompleted(String),
    /// Operation failed with an error message
    OperationFailed(String),
}

/// State of the last "Queue" press.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueueState {
    /// Pretty-printed submission payload
    pub payload: String,
    /// Pretty-printed resolved LoRA stack per Power LoRA node
    pub resolved: String,
    /// Nodes patched with entry inputs
    pub patched: usize,
}

/// The demo application.
pub struct HostApp {
    /// Persisted user settings
    pub settings: HostSettings,
    /// Nodes on the canvas
    pub graph: Graph,
    /// Canvas navigation
    pub canvas: CanvasState,
    /// Active node drag
    pub drag: Option<DragState>,
    /// Open widget dialog
    pub dialog: Option<OpenDialog>,
    /// Power LoRA node most recently interacted with
    pub focused: Option<Uuid>,
    /// Catalog loading state
    pub catalog_view: CatalogView,
    /// Whether the startup catalog fetch was issued
    pub catalog_prefetched: bool,
    /// Last queued submission
    pub queue: Option<QueueState>,
    /// Status line shown in the toolbar
    pub status: String,
    /// Requested file operation, started on the next frame
    pub pending_file_operation: Option<PendingFileOperation>,
    pub(crate) catalog_sender: Sender<CatalogEvent>,
    pub(crate) catalog_receiver: Receiver<CatalogEvent>,
    pub(crate) file_sender: Sender<FileOperationResult>,
    pub(crate) file_receiver: Receiver<FileOperationResult>,
}

impl Default for HostApp {
    fn default() -> Self {
        Self::with_settings(HostSettings::default())
    }
}

impl HostApp {
    /// Creates the app with the demo graph and the given settings.
    pub fn with_settings(settings: HostSettings) -> Self {
        let (catalog_sender, catalog_receiver) = channel();
        let (file_sender, file_receiver) = channel();
        Self {
            settings,
            graph: Graph::demo(),
            canvas: CanvasState::default(),
            drag: None,
            dialog: None,
            focused: None,
            catalog_view: CatalogView::Idle,
            catalog_prefetched: false,
            queue: None,
            status: String::new(),
            pending_file_operation: None,
            catalog_sender,
            catalog_receiver,
            file_sender,
            file_receiver,
        }
    }

    /// Restores the app from eframe storage.
    pub fn from_storage(storage: Option<&dyn eframe::Storage>) -> Self {
        let json = storage.and_then(|s| s.get_string(SETTINGS_KEY));
        Self::with_settings(HostSettings::from_storage(json))
    }

    /// Adds a node of `node_type` below the existing ones.
    pub fn add_node(&mut self, node_type: &str) -> Option<Uuid> {
        let body = NodeBody::for_type(node_type)?;
        let y = self
            .graph
            .nodes
            .iter()
            .map(|n| n.body_rect().max.y)
            .fold(80.0_f32, f32::max)
            + TITLE_HEIGHT
            + 20.0;
        let node = HostNode::new(egui::pos2(40.0, y), body);
        let id = node.id;
        self.graph.nodes.push(node);
        Some(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_default_and_bad_storage() {
        let settings = HostSettings::from_storage(Some("{not json".into()));
        assert!(settings.dark_mode);
        assert_eq!(settings.last_workflow_path, None);

        let stored = HostSettings::from_storage(Some(r#"{"dark_mode": false}"#.into()));
        assert!(!stored.dark_mode);
        assert!(!stored.catalog_url.is_empty());
    }

    #[test]
    fn test_catalog_url_override_is_trimmed_and_wins_over_storage() {
        let lookup =
            |key: &str| (key == CATALOG_URL_ENV).then(|| " http://127.0.0.1:9 ".to_string());

        let defaults = HostSettings {
            catalog_url: DEFAULT_CATALOG_URL.to_string(),
            dark_mode: true,
            last_workflow_path: None,
        };
        assert_eq!(defaults.with_overrides(lookup).catalog_url, "http://127.0.0.1:9");

        let stored: HostSettings = serde_json::from_str(r#"{"catalog_url": "http://x"}"#).unwrap();
        assert_eq!(stored.with_overrides(lookup).catalog_url, "http://127.0.0.1:9");
    }

    #[test]
    fn test_blank_or_missing_catalog_url_override_is_ignored() {
        let stored: HostSettings = serde_json::from_str(r#"{"catalog_url": "http://x"}"#).unwrap();

        let blank = stored.clone().with_overrides(|_| Some("   ".to_string()));
        assert_eq!(blank.catalog_url, "http://x");
        let missing = stored.with_overrides(|_| None);
        assert_eq!(missing.catalog_url, "http://x");
    }

    #[test]
    fn test_catalog_url_env_var_reaches_stored_settings() {
        let url = "http://127.0.0.1:9";
        std::env::set_var(CATALOG_URL_ENV, format!("  {url}\n"));
        let settings = HostSettings::from_storage(Some(r#"{"catalog_url": "http://x"}"#.into()));
        std::env::remove_var(CATALOG_URL_ENV);

        assert_eq!(settings.catalog_url, url);
    }

    #[test]
    fn test_power_lora_node_starts_at_widget_minimum() {
        let node = HostNode::new(egui::Pos2::ZERO, NodeBody::power_lora(EntryList::new()));
        assert_eq!(node.size, egui::vec2(300.0, 80.0));

        let plain = HostNode::new(egui::Pos2::ZERO, NodeBody::for_type("WanVideoSampler").unwrap());
        assert_eq!(plain.size, BASE_MIN_SIZE);
    }

    #[test]
    fn test_unknown_node_type_has_no_body() {
        assert!(NodeBody::for_type("Nope").is_none());
    }

    #[test]
    fn test_graph_entry_source_only_answers_power_lora_nodes() {
        let graph = Graph::demo();
        let lora = graph
            .nodes
            .iter()
            .find(|n| n.body.entries().is_some())
            .unwrap();
        let plain = graph
            .nodes
            .iter()
            .find(|n| n.body.entries().is_none())
            .unwrap();

        assert_eq!(graph.entries_for(&lora.id.to_string()), Some(vec![]));
        assert_eq!(graph.entries_for(&plain.id.to_string()), None);
        assert_eq!(graph.entries_for("not-a-uuid"), None);
    }

    #[test]
    fn test_base_node_configure_reads_title() {
        let mut base = BaseNode::default();
        let mut data = Map::new();
        data.insert("title".into(), Value::String("Styles".into()));
        base.on_configure(&data, &mut egui::Vec2::ZERO);

        assert_eq!(base.title, "Styles");
    }
}
