//! Save and load of the entry list within the host's node object.

use crate::types::{Entry, EntryList};
use serde_json::{Map, Value};

/// Field holding the entry records in a saved node.
pub const ENTRIES_FIELD: &str = "entries";
/// Field name used by older workflows.
pub const LEGACY_ENTRIES_FIELD: &str = "lorasData";

/// Writes a copy of the entries into `out`.
pub fn write_entries(entries: &EntryList, out: &mut Map<String, Value>) {
    let records = entries.iter().map(entry_record).collect();
    out.insert(ENTRIES_FIELD.to_string(), Value::Array(records));
}

/// Serializes one entry as `{enabled, reference, value}`.
pub fn entry_record(entry: &Entry) -> Value {
    serde_json::json!({
        "enabled": entry.enabled,
        "reference": entry.reference,
        "value": entry.value,
    })
}

/// Reads entries from a saved node.
///
/// A missing field yields an empty list. A malformed field is logged and
/// treated as missing.
pub fn read_entries(data: &Map<String, Value>) -> EntryList {
    let Some(raw) = data
        .get(ENTRIES_FIELD)
        .or_else(|| data.get(LEGACY_ENTRIES_FIELD))
    else {
        return EntryList::new();
    };
    if raw.is_null() {
        return EntryList::new();
    }

    match serde_json::from_value::<Vec<Entry>>(raw.clone()) {
        Ok(entries) => EntryList::from_entries(entries),
        Err(err) => {
            log::warn!("Discarding malformed saved entries: {err}");
            EntryList::new()
        }
    }
}
