//! Core data types for the LoRA list widget.
//!
//! This module defines the [`Entry`] row record and the ordered [`EntryList`]
//! that owns them, together with every mutation the widget performs. Nothing in
//! here knows about geometry, drawing or input.

use crate::constants::{VALUE_DEFAULT, VALUE_MAX, VALUE_MIN};
use serde::{Deserialize, Serialize};

/// One row of the widget.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    /// Whether the entry takes part in execution
    #[serde(alias = "on", default = "default_enabled")]
    pub enabled: bool,
    /// Selected reference (a LoRA file name), `None` while unselected
    #[serde(alias = "lora", default)]
    pub reference: Option<String>,
    /// Strength, kept within `[-10, 10]` at 2-decimal precision
    #[serde(alias = "strength", default = "default_value")]
    pub value: f64,
}

fn default_enabled() -> bool {
    true
}

fn default_value() -> f64 {
    VALUE_DEFAULT
}

impl Default for Entry {
    fn default() -> Self {
        Self {
            enabled: true,
            reference: None,
            value: VALUE_DEFAULT,
        }
    }
}

/// Clamps a value to the allowed range and rounds it to 2 decimals.
///
/// Non-finite values other than the infinities are rejected with `None`;
/// infinities clamp to the nearest bound.
pub fn normalize_value(value: f64) -> Option<f64> {
    if value.is_nan() {
        return None;
    }
    let clamped = value.clamp(VALUE_MIN, VALUE_MAX);
    Some((clamped * 100.0).round() / 100.0)
}

/// The ordered list of entries owned by one node.
///
/// Position is the only identity an entry has: reordering swaps positions and
/// export keys are derived from them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntryList {
    entries: Vec<Entry>,
}

impl EntryList {
    /// Creates an empty list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a list from raw entries, normalizing every value.
    pub fn from_entries(entries: Vec<Entry>) -> Self {
        let entries = entries
            .into_iter()
            .map(|mut entry| {
                entry.value = normalize_value(entry.value).unwrap_or(VALUE_DEFAULT);
                entry
            })
            .collect();
        Self { entries }
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if there are no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the entry at `index`, if any.
    pub fn get(&self, index: usize) -> Option<&Entry> {
        self.entries.get(index)
    }

    /// Iterates entries in display order.
    pub fn iter(&self) -> std::slice::Iter<'_, Entry> {
        self.entries.iter()
    }

    /// Returns an owned copy of the entries for serialization or export.
    pub fn snapshot(&self) -> Vec<Entry> {
        self.entries.clone()
    }

    /// Returns true when every entry is enabled (vacuously true when empty).
    pub fn all_enabled(&self) -> bool {
        self.entries.iter().all(|e| e.enabled)
    }

    /// Appends a default entry and returns its index.
    pub fn add(&mut self) -> usize {
        self.entries.push(Entry::default());
        self.entries.len() - 1
    }

    /// Removes the entry at `index`, shifting later entries down.
    pub fn remove(&mut self, index: usize) -> Option<Entry> {
        if index < self.entries.len() {
            Some(self.entries.remove(index))
        } else {
            None
        }
    }

    /// Swaps `index` with its upper neighbour. Returns false at the top.
    pub fn move_up(&mut self, index: usize) -> bool {
        if index == 0 || index >= self.entries.len() {
            return false;
        }
        self.entries.swap(index - 1, index);
        true
    }

    /// Swaps `index` with its lower neighbour. Returns false at the bottom.
    pub fn move_down(&mut self, index: usize) -> bool {
        if index + 1 >= self.entries.len() {
            return false;
        }
        self.entries.swap(index, index + 1);
        true
    }

    /// Sets the enable flag of one entry.
    pub fn set_enabled(&mut self, index: usize, enabled: bool) -> bool {
        match self.entries.get_mut(index) {
            Some(entry) => {
                entry.enabled = enabled;
                true
            }
            None => false,
        }
    }

    /// Sets or clears the reference of one entry.
    pub fn set_reference(&mut self, index: usize, reference: Option<String>) -> bool {
        match self.entries.get_mut(index) {
            Some(entry) => {
                entry.reference = reference;
                true
            }
            None => false,
        }
    }

    /// Sets the value of one entry after clamping and rounding.
    ///
    /// Returns the stored value, or `None` when the index is out of range or
    /// the value is NaN.
    pub fn set_value(&mut self, index: usize, value: f64) -> Option<f64> {
        let entry = self.entries.get_mut(index)?;
        let value = normalize_value(value)?;
        entry.value = value;
        Some(value)
    }

    /// Adds `delta` to an entry's value through [`EntryList::set_value`].
    pub fn step_value(&mut self, index: usize, delta: f64) -> Option<f64> {
        let current = self.entries.get(index)?.value;
        self.set_value(index, current + delta)
    }

    /// Disables everything when all entries are on, otherwise enables all.
    ///
    /// Mixed and all-off lists both end up fully enabled.
    pub fn toggle_all(&mut self) {
        let target = !self.all_enabled();
        for entry in &mut self.entries {
            entry.enabled = target;
        }
    }
}

impl<'a> IntoIterator for &'a EntryList {
    type Item = &'a Entry;
    type IntoIter = std::slice::Iter<'a, Entry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list_of(n: usize) -> EntryList {
        let mut list = EntryList::new();
        for i in 0..n {
            let idx = list.add();
            list.set_reference(idx, Some(format!("lora_{i}.safetensors")));
        }
        list
    }

    fn references(list: &EntryList) -> Vec<Option<String>> {
        list.iter().map(|e| e.reference.clone()).collect()
    }

    #[test]
    fn test_add_appends_default_entry() {
        let mut list = EntryList::new();
        let idx = list.add();

        assert_eq!(idx, 0);
        assert_eq!(list.len(), 1);
        assert_eq!(
            list.get(0),
            Some(&Entry {
                enabled: true,
                reference: None,
                value: 1.0,
            })
        );
    }

    #[test]
    fn test_remove_shifts_following_entries() {
        let mut list = list_of(3);
        let removed = list.remove(0).unwrap();

        assert_eq!(removed.reference.as_deref(), Some("lora_0.safetensors"));
        assert_eq!(
            references(&list),
            vec![
                Some("lora_1.safetensors".to_string()),
                Some("lora_2.safetensors".to_string())
            ]
        );
        assert!(list.remove(5).is_none());
    }

    #[test]
    fn test_move_up_and_down_are_noops_at_boundaries() {
        let mut list = list_of(3);

        assert!(!list.move_up(0));
        assert!(!list.move_down(2));
        assert!(!list.move_down(7));
        assert_eq!(references(&list)[0].as_deref(), Some("lora_0.safetensors"));

        assert!(list.move_down(0));
        assert_eq!(references(&list)[1].as_deref(), Some("lora_0.safetensors"));
        assert!(list.move_up(1));
        assert_eq!(references(&list)[0].as_deref(), Some("lora_0.safetensors"));
    }

    #[test]
    fn test_set_value_rounds_and_clamps() {
        let mut list = list_of(1);

        assert_eq!(list.set_value(0, 1.004), Some(1.0));
        assert_eq!(list.set_value(0, 10.5), Some(10.0));
        assert_eq!(list.set_value(0, -42.0), Some(-10.0));
        assert_eq!(list.set_value(0, f64::INFINITY), Some(10.0));
        assert_eq!(list.set_value(0, f64::NAN), None);
        assert_eq!(list.get(0).unwrap().value, 10.0);
        assert_eq!(list.set_value(3, 1.0), None);
    }

    #[test]
    fn test_set_value_is_idempotent() {
        let mut list = list_of(1);
        for raw in [-12.345, -3.255, 0.004, 1.015, 7.777, 11.0] {
            let first = list.set_value(0, raw).unwrap();
            let second = list.set_value(0, first).unwrap();
            assert_eq!(first, second);
        }
    }

    #[test]
    fn test_increment_then_decrement_returns_to_start() {
        let mut list = list_of(1);

        assert_eq!(list.step_value(0, 0.05), Some(1.05));
        assert_eq!(list.step_value(0, -0.05), Some(1.0));
    }

    #[test]
    fn test_step_value_saturates_at_bounds() {
        let mut list = list_of(1);
        list.set_value(0, 9.98);

        assert_eq!(list.step_value(0, 0.05), Some(10.0));
        assert_eq!(list.step_value(0, 0.05), Some(10.0));
    }

    #[test]
    fn test_toggle_all_from_all_on_and_all_off_is_an_involution() {
        let mut list = list_of(3);

        list.toggle_all();
        assert!(list.iter().all(|e| !e.enabled));
        list.toggle_all();
        assert!(list.iter().all(|e| e.enabled));
    }

    #[test]
    fn test_toggle_all_from_mixed_always_turns_everything_on() {
        let mut list = list_of(3);
        list.set_enabled(1, false);

        list.toggle_all();
        assert!(list.all_enabled());
        // A second call now turns everything off, so mixed state is not restored.
        list.toggle_all();
        assert!(list.iter().all(|e| !e.enabled));
    }

    #[test]
    fn test_from_entries_normalizes_values() {
        let list = EntryList::from_entries(vec![
            Entry {
                enabled: false,
                reference: None,
                value: 25.0,
            },
            Entry {
                enabled: true,
                reference: Some("a".into()),
                value: f64::NAN,
            },
        ]);

        assert_eq!(list.get(0).unwrap().value, 10.0);
        assert_eq!(list.get(1).unwrap().value, 1.0);
    }

    #[test]
    fn test_entry_accepts_legacy_field_names() {
        let entry: Entry = serde_json::from_value(serde_json::json!({
            "on": false,
            "lora": "b.safetensors",
            "strength": 0.5
        }))
        .unwrap();

        assert!(!entry.enabled);
        assert_eq!(entry.reference.as_deref(), Some("b.safetensors"));
        assert_eq!(entry.value, 0.5);
    }

    #[test]
    fn test_snapshot_is_independent_copy() {
        let mut list = list_of(2);
        let snapshot = list.snapshot();
        list.set_enabled(0, false);

        assert!(snapshot[0].enabled);
        assert!(!list.get(0).unwrap().enabled);
    }
}
