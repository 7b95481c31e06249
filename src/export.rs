//! Flattening of the entry list into indexed execution inputs.
//!
//! Two paths produce the same mapping: the node's own execute callback, and
//! a patch applied to outgoing job submissions, since the host's submission
//! serializer does not know about the custom list.

use crate::persist::entry_record;
use crate::types::{Entry, EntryList};
use serde_json::{Map, Value};

/// Node type whose submissions carry entry inputs.
pub const NODE_TYPE: &str = "PowerLoraLoader";

/// Input key for the entry at 0-based `index`: `entry_1`, `entry_2`, ...
pub fn entry_key(index: usize) -> String {
    format!("entry_{}", index + 1)
}

/// Builds the `entry_N -> {enabled, reference, value}` mapping.
pub fn flatten(entries: &[Entry]) -> Map<String, Value> {
    entries
        .iter()
        .enumerate()
        .map(|(i, entry)| (entry_key(i), entry_record(entry)))
        .collect()
}

/// Adds the flattened entries to a node's execution inputs.
pub fn write_execution_inputs(entries: &EntryList, inputs: &mut Map<String, Value>) {
    inputs.extend(flatten(&entries.snapshot()));
}

/// Looks up the current entries of a graph node by its submission id.
pub trait EntrySource {
    /// Returns a snapshot of the entries of node `node_id`, if it has any.
    fn entries_for(&self, node_id: &str) -> Option<Vec<Entry>>;
}

/// Injects entry inputs into every node of type `node_type` in a submission.
///
/// `output` maps node ids to `{class_type, inputs}` objects. Existing
/// `entry_N` keys are overwritten; a missing `inputs` object is created.
/// Returns the number of nodes patched.
pub fn patch_submission(
    output: &mut Map<String, Value>,
    node_type: &str,
    source: &impl EntrySource,
) -> usize {
    let mut patched = 0;
    for (node_id, node) in output.iter_mut() {
        let Some(node) = node.as_object_mut() else {
            continue;
        };
        if node.get("class_type").and_then(Value::as_str) != Some(node_type) {
            continue;
        }
        let Some(entries) = source.entries_for(node_id) else {
            log::warn!("No graph node found for submitted node {node_id}");
            continue;
        };

        let inputs = node
            .entry("inputs")
            .or_insert_with(|| Value::Object(Map::new()));
        if !inputs.is_object() {
            *inputs = Value::Object(Map::new());
        }
        if let Value::Object(inputs) = inputs {
            inputs.extend(flatten(&entries));
        }
        patched += 1;
    }
    patched
}
