//! # Power Lora Loader
//!
//! A row-list widget for a graph-editor node that manages an ordered list of
//! LoRA entries, each with an enable toggle, a selected reference and a
//! strength stepper.
//!
//! ## Features
//! - Single-source layout shared by drawing and hit-testing
//! - Header "Toggle All", per-row toggles, stepper and value prompt
//! - Reference selector fed by the host's node metadata catalog
//! - Per-row context menu (toggle, move up/down, remove)
//! - Save/load with legacy field support, and execution-input export
//! - Backend resolution of exported entries into a LoRA stack
//! - SVG/PNG snapshots of the widget
//!
//! The engine is host-agnostic: hosts drive a [`NodeBehavior`] and render
//! through a [`Surface`]. The bundled desktop host lives in the `ui` module.

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod catalog;
pub mod constants;
pub mod controller;
pub mod export;
pub mod layout;
pub mod node;
pub mod persist;
pub mod render;
pub mod resolve;
pub mod size;
pub mod snapshot;
pub mod surface;
pub mod types;
pub mod widget;

#[cfg(not(target_arch = "wasm32"))]
mod ui;

pub use controller::{Dialog, DialogResult, MenuItem, RowAction, SelectorItem};
pub use hit_test::Zone;
pub use node::{Chained, NodeBehavior, PointerOutcome};
pub use surface::{EguiSurface, Surface};
pub use types::{Entry, EntryList};
pub use widget::PowerLoraWidget;

#[cfg(not(target_arch = "wasm32"))]
pub use ui::{BaseNode, HostApp, HostSettings, WorkflowError};

/// Runs the desktop host.
///
/// Must be called with a tokio runtime entered; catalog fetches and file
/// dialogs are spawned onto it.
///
/// # Example
///
/// ```no_run
/// fn main() -> Result<(), eframe::Error> {
///     let runtime = tokio::runtime::Runtime::new().expect("runtime");
///     let _guard = runtime.enter();
///     power_lora_loader::run_app()
/// }
/// ```
#[cfg(not(target_arch = "wasm32"))]
pub fn run_app() -> Result<(), eframe::Error> {
    let options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default().with_inner_size([1200.0, 760.0]),
        ..Default::default()
    };
    eframe::run_native(
        "Power Lora Loader",
        options,
        Box::new(|cc| Ok(Box::new(HostApp::from_storage(cc.storage)))),
    )
}
