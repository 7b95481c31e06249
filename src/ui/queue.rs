//! "Queue": builds the job submission for the graph.
//!
//! The host serializer only knows the base fields of each node, so the
//! entry inputs are injected afterwards with [`patch_submission`].

use super::state::{Graph, HostApp, QueueState};
use crate::catalog;
use crate::export::{patch_submission, NODE_TYPE};
use crate::resolve::resolve_stack;
use serde_json::{json, Map, Value};

impl Graph {
    /// Builds the submission `output` map without any widget inputs.
    pub fn submission_output(&self) -> Map<String, Value> {
        self.nodes
            .iter()
            .map(|node| {
                let base = node.body.base();
                (
                    node.id.to_string(),
                    json!({ "class_type": base.node_type, "inputs": {} }),
                )
            })
            .collect()
    }
}

impl HostApp {
    /// Builds, patches and records a submission for the current graph.
    pub fn queue_prompt(&mut self) -> &QueueState {
        let mut output = self.graph.submission_output();
        let patched = patch_submission(&mut output, NODE_TYPE, &self.graph);

        let available = catalog::global().snapshot();
        let mut resolved = Map::new();
        for (node_id, node) in &output {
            if node.get("class_type").and_then(Value::as_str) != Some(NODE_TYPE) {
                continue;
            }
            let Some(inputs) = node.get("inputs").and_then(Value::as_object) else {
                continue;
            };
            let stack = resolve_stack(inputs, &available, None, None);
            resolved.insert(node_id.clone(), json!(stack));
        }

        let payload = json!({ "prompt": output });
        log::info!("Queued prompt with {patched} patched node(s)");
        log::debug!("Submission payload: {payload}");

        self.queue.insert(QueueState {
            payload: serde_json::to_string_pretty(&payload).unwrap_or_default(),
            resolved: serde_json::to_string_pretty(&resolved).unwrap_or_default(),
            patched,
        })
    }
}
