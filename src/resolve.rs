//! Backend side of the exported payload: turns `entry_N` inputs into a LoRA
//! stack of resolved files.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::Path;

/// Display name used to tag resolution log lines.
pub const NODE_NAME: &str = "Power Lora Loader";

/// One decoded execution input.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StackInput {
    /// Whether the entry participates
    #[serde(alias = "on")]
    pub enabled: bool,
    /// Selected reference name
    #[serde(alias = "lora")]
    pub reference: Option<String>,
    /// Strength
    #[serde(alias = "strength")]
    pub value: f64,
    /// Load the weights lazily to save memory
    #[serde(default)]
    pub low_mem_load: bool,
    /// Merge the weights into the model
    #[serde(default = "default_merge")]
    pub merge_loras: bool,
}

fn default_merge() -> bool {
    true
}

/// A LoRA ready to be applied by the model loader.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadedLora {
    /// Full path of the weights file
    pub path: String,
    /// Strength rounded to four decimals
    pub strength: f64,
    /// File stem of the weights file
    pub name: String,
    /// Per-block strengths; empty applies to every block
    #[serde(default)]
    pub blocks: Map<String, Value>,
    /// Layer name filter; empty applies to every layer
    #[serde(default)]
    pub layer_filter: String,
    /// Load the weights lazily to save memory
    #[serde(default)]
    pub low_mem_load: bool,
    /// Merge the weights into the model
    #[serde(default = "default_merge")]
    pub merge_loras: bool,
}

/// An enabled entry found in a submitted node, before any filtering.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnabledLora {
    /// Reference as submitted
    pub name: String,
    /// Strength as submitted
    pub strength: f64,
    /// Resolved path of the weights file
    pub path: String,
}

fn input_index(key: &str) -> Option<usize> {
    let key = key.to_ascii_lowercase();
    let digits = key
        .strip_prefix("entry_")
        .or_else(|| key.strip_prefix("lora_"))?;
    digits.parse().ok()
}

/// Decodes `entry_N` and `lora_N` inputs, ordered by `N`.
///
/// Keys are matched case-insensitively. Values that are not entry records
/// are skipped.
pub fn decode_inputs(inputs: &Map<String, Value>) -> Vec<StackInput> {
    let mut decoded: Vec<(usize, StackInput)> = inputs
        .iter()
        .filter_map(|(key, value)| {
            let index = input_index(key)?;
            if !value.is_object() {
                return None;
            }
            match serde_json::from_value::<StackInput>(value.clone()) {
                Ok(input) => Some((index, input)),
                Err(err) => {
                    log::debug!("[{NODE_NAME}] Ignoring input {key}: {err}");
                    None
                }
            }
        })
        .collect();
    decoded.sort_by_key(|(index, _)| *index);
    decoded.into_iter().map(|(_, input)| input).collect()
}

fn basename(path: &str) -> &str {
    path.rsplit(['/', '\\']).next().unwrap_or(path)
}

/// Strips the extension of the last path component, keeping leading dots.
fn without_extension(path: &str) -> &str {
    let base_start = path.len() - basename(path).len();
    let base = &path[base_start..];
    let leading = base.len() - base.trim_start_matches('.').len();
    match base[leading..].rfind('.') {
        Some(dot) => &path[..base_start + leading + dot],
        None => path,
    }
}

fn identity(path: &str) -> &str {
    path
}

fn stem(path: &str) -> &str {
    without_extension(basename(path))
}

/// Finds the available file a reference names, from strictest to loosest.
pub fn find_reference<'a>(query: &str, available: &'a [String]) -> Option<&'a str> {
    let find = |key: &dyn Fn(&str) -> &str, needle: &str| {
        available
            .iter()
            .map(String::as_str)
            .find(|name| key(*name) == needle)
    };

    if let Some(found) = find(&identity, query) {
        return Some(found);
    }
    if let Some(found) = find(&without_extension, query)
        .or_else(|| find(&without_extension, without_extension(query)))
    {
        return Some(found);
    }
    if let Some(found) = find(&basename, query).or_else(|| find(&basename, basename(query))) {
        log::info!("[{NODE_NAME}] Found lora by filename: {found}");
        return Some(found);
    }
    if let Some(found) = find(&stem, query).or_else(|| find(&stem, stem(query))) {
        log::info!("[{NODE_NAME}] Found lora by filename without ext: {found}");
        return Some(found);
    }
    if let Some(found) = available
        .iter()
        .map(String::as_str)
        .find(|name| name.contains(query))
    {
        log::info!("[{NODE_NAME}] Found lora by fuzzy match: {found}");
        return Some(found);
    }
    log::warn!("[{NODE_NAME}] Could not find lora: {query}");
    None
}

fn full_path(base_dir: Option<&Path>, file: &str) -> String {
    match base_dir {
        Some(dir) => dir.join(file).to_string_lossy().into_owned(),
        None => file.to_string(),
    }
}

/// Builds the LoRA stack from a node's execution inputs.
///
/// Starts from `previous` and appends every enabled entry with a reference,
/// a non-zero value and a matching file in `available`. Returns `None` when
/// the stack ends up empty.
pub fn resolve_stack(
    inputs: &Map<String, Value>,
    available: &[String],
    base_dir: Option<&Path>,
    previous: Option<Vec<LoadedLora>>,
) -> Option<Vec<LoadedLora>> {
    let mut stack = previous.unwrap_or_default();

    for input in decode_inputs(inputs) {
        let reference = input.reference.as_deref();
        if !input.enabled {
            log::info!(
                "[{NODE_NAME}] Skipping disabled LoRA: {}",
                reference.unwrap_or("Unknown")
            );
            continue;
        }
        let Some(reference) = reference.filter(|r| !r.is_empty() && *r != "None") else {
            continue;
        };
        if input.value == 0.0 {
            log::info!("[{NODE_NAME}] Skipping LoRA with zero strength: {reference}");
            continue;
        }
        let Some(file) = find_reference(reference, available) else {
            log::warn!("[{NODE_NAME}] Could not find LoRA file: {reference}");
            continue;
        };

        let lora = LoadedLora {
            path: full_path(base_dir, file),
            strength: (input.value * 10_000.0).round() / 10_000.0,
            name: stem(file).to_string(),
            blocks: Map::new(),
            layer_filter: String::new(),
            low_mem_load: input.low_mem_load,
            merge_loras: input.merge_loras,
        };
        log::info!(
            "[{NODE_NAME}] Added LoRA: {} with strength: {}",
            lora.name,
            lora.strength
        );
        stack.push(lora);
    }

    if stack.is_empty() {
        None
    } else {
        Some(stack)
    }
}

/// Lists the enabled entries of a submitted node whose files resolve.
///
/// Unlike [`resolve_stack`] this keeps zero-strength entries; it reports what
/// the node asks for rather than what gets applied.
pub fn enabled_in_submission(
    node: &Value,
    available: &[String],
    base_dir: Option<&Path>,
) -> Vec<EnabledLora> {
    let Some(inputs) = node.get("inputs").and_then(Value::as_object) else {
        return Vec::new();
    };
    decode_inputs(inputs)
        .into_iter()
        .filter(|input| input.enabled)
        .filter_map(|input| {
            let reference = input.reference?;
            let file = find_reference(&reference, available)?;
            Some(EnabledLora {
                path: full_path(base_dir, file),
                name: reference,
                strength: input.value,
            })
        })
        .collect()
}
