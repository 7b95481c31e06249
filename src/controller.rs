//! Pointer dispatch and auxiliary dialogs.
//!
//! Dialogs are returned to the host as plain data. The host shows them with
//! its own menu and prompt primitives and reports the user's choice back as a
//! [`DialogResult`]; closing a dialog without a choice reports nothing.

use crate::constants::VALUE_STEP;
use crate::hit_test::{hit_test, Zone};
use crate::layout::layout;
use crate::node::PointerOutcome;
use crate::size;
use crate::widget::PowerLoraWidget;
use eframe::egui;

/// Title of the reference selector menu.
pub const SELECTOR_TITLE: &str = "Select LoRA";
/// Title of the value prompt.
pub const PROMPT_TITLE: &str = "Value";
/// Title of the row context menu.
pub const ROW_MENU_TITLE: &str = "LoRA";
/// Selector entry that clears the reference.
pub const NONE_LABEL: &str = "None";

/// A dialog the host should open on behalf of the widget.
#[derive(Debug, Clone, PartialEq)]
pub enum Dialog {
    /// Pick a reference for entry `index` from the catalog
    SelectReference {
        /// Entry being edited
        index: usize,
    },
    /// Prompt for a numeric value, pre-filled with `current`
    EditValue {
        /// Entry being edited
        index: usize,
        /// Current value, used to pre-fill the prompt
        current: f64,
    },
    /// Per-row context menu
    RowMenu {
        /// Entry the menu acts on
        index: usize,
        /// Menu items in display order
        items: Vec<MenuItem>,
    },
}

/// Row context menu action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowAction {
    /// Flip the entry's enable flag
    Toggle,
    /// Swap with the previous entry
    MoveUp,
    /// Swap with the next entry
    MoveDown,
    /// Delete the entry
    Remove,
}

/// One item of a host context menu.
#[derive(Debug, Clone, PartialEq)]
pub struct MenuItem {
    /// Displayed label
    pub label: String,
    /// Shown greyed out and not selectable
    pub disabled: bool,
    /// Action reported when selected
    pub action: RowAction,
}

/// One item of the reference selector.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectorItem {
    /// Displayed label
    pub label: String,
    /// Reference stored when chosen; `None` clears it
    pub reference: Option<String>,
}

/// What the user chose in a dialog.
#[derive(Debug, Clone, PartialEq)]
pub enum DialogResult {
    /// A selector item was chosen
    Reference {
        /// Entry being edited
        index: usize,
        /// New reference, `None` to clear
        reference: Option<String>,
    },
    /// The value prompt was confirmed with raw text
    Value {
        /// Entry being edited
        index: usize,
        /// Text as typed
        input: String,
    },
    /// A row menu item was chosen
    Row {
        /// Entry the menu was opened for
        index: usize,
        /// Chosen action
        action: RowAction,
    },
}

/// Builds selector items: "None" first, then the catalog in order.
pub fn selector_items(catalog: &[String]) -> Vec<SelectorItem> {
    std::iter::once(SelectorItem {
        label: NONE_LABEL.to_string(),
        reference: None,
    })
    .chain(catalog.iter().map(|name| SelectorItem {
        label: name.clone(),
        reference: Some(name.clone()),
    }))
    .collect()
}

/// Parses prompt input. Unparseable text and NaN yield `None`.
pub fn parse_value_input(input: &str) -> Option<f64> {
    input.trim().parse::<f64>().ok().filter(|v| !v.is_nan())
}

impl PowerLoraWidget {
    /// Dispatches a primary press at node-local `pos`.
    ///
    /// Misses are reported as unhandled so the host's default handling runs.
    pub fn pointer_down(&mut self, pos: egui::Pos2, size: &mut egui::Vec2) -> PointerOutcome {
        let Some(zone) = hit_test(self.entries.len(), size.x, pos) else {
            return PointerOutcome::Unhandled;
        };
        log::debug!("pointer down in {zone:?}");

        match zone {
            Zone::HeaderToggle => self.entries.toggle_all(),
            Zone::RowToggle(i) => {
                if let Some(enabled) = self.entries.get(i).map(|e| e.enabled) {
                    self.entries.set_enabled(i, !enabled);
                }
            }
            Zone::RowReference(i) => {
                return PointerOutcome::with_dialog(Dialog::SelectReference { index: i })
            }
            Zone::RowDecrement(i) => {
                self.entries.step_value(i, -VALUE_STEP);
            }
            Zone::RowIncrement(i) => {
                self.entries.step_value(i, VALUE_STEP);
            }
            Zone::RowValue(i) => {
                if let Some(entry) = self.entries.get(i) {
                    return PointerOutcome::with_dialog(Dialog::EditValue {
                        index: i,
                        current: entry.value,
                    });
                }
            }
            Zone::AddButton => {
                let index = self.entries.add();
                size::propose_after_add(self.entries.len(), size);
                return PointerOutcome::with_dialog(Dialog::SelectReference { index });
            }
        }
        PointerOutcome::handled()
    }

    /// Builds the context menu for entry `index`.
    pub fn row_menu(&self, index: usize) -> Option<Dialog> {
        let entry = self.entries.get(index)?;
        let last = self.entries.len() - 1;
        let toggle_label = if entry.enabled {
            "Toggle Off"
        } else {
            "Toggle On"
        };
        let item = |label: &str, disabled: bool, action: RowAction| MenuItem {
            label: label.to_string(),
            disabled,
            action,
        };

        Some(Dialog::RowMenu {
            index,
            items: vec![
                item(toggle_label, false, RowAction::Toggle),
                item("Move Up", index == 0, RowAction::MoveUp),
                item("Move Down", index == last, RowAction::MoveDown),
                item("Remove", false, RowAction::Remove),
            ],
        })
    }

    /// Opens the row menu for the row band under `pos`, if any.
    pub fn secondary_action(&self, pos: egui::Pos2, size: egui::Vec2) -> Option<Dialog> {
        let index = layout(self.entries.len(), size.x).row_at(pos.y)?;
        self.row_menu(index)
    }

    /// Applies a dialog choice. Returns true if anything changed.
    ///
    /// Results for rows that no longer exist are ignored.
    pub fn apply(&mut self, result: DialogResult, size: &mut egui::Vec2) -> bool {
        match result {
            DialogResult::Reference { index, reference } => {
                let applied = self.entries.set_reference(index, reference);
                if !applied {
                    log::debug!("ignoring reference for missing row {index}");
                }
                applied
            }
            DialogResult::Value { index, input } => match parse_value_input(&input) {
                Some(value) => self.entries.set_value(index, value).is_some(),
                None => {
                    log::debug!("ignoring non-numeric value input {input:?}");
                    false
                }
            },
            DialogResult::Row { index, action } => {
                if index >= self.entries.len() {
                    log::debug!("ignoring {action:?} for missing row {index}");
                    return false;
                }
                match action {
                    RowAction::Toggle => {
                        let enabled = self.entries.get(index).is_some_and(|e| e.enabled);
                        self.entries.set_enabled(index, !enabled)
                    }
                    RowAction::MoveUp => self.entries.move_up(index),
                    RowAction::MoveDown => self.entries.move_down(index),
                    RowAction::Remove => {
                        self.entries.remove(index);
                        size::propose_after_remove(size);
                        true
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hit_test::zone_center;
    use crate::types::Entry;

    fn widget_with(values: &[f64]) -> PowerLoraWidget {
        let mut widget = PowerLoraWidget::new();
        for v in values {
            let i = widget.entries.add();
            widget.entries.set_value(i, *v);
        }
        widget
    }

    fn press(widget: &mut PowerLoraWidget, zone: Zone, size: &mut egui::Vec2) -> PointerOutcome {
        let geo = layout(widget.entries.len(), size.x);
        let pos = zone_center(&geo, zone).expect("zone exists");
        widget.pointer_down(pos, size)
    }

    #[test]
    fn test_add_on_empty_list_opens_selector_for_new_row() {
        let mut widget = PowerLoraWidget::new();
        let mut size = egui::vec2(300.0, 80.0);

        let outcome = press(&mut widget, Zone::AddButton, &mut size);

        assert_eq!(outcome, PointerOutcome::with_dialog(Dialog::SelectReference { index: 0 }));
        assert_eq!(widget.entries.len(), 1);
        assert_eq!(widget.entries.get(0), Some(&Entry::default()));
        assert_eq!(size.y, 128.0);
    }

    #[test]
    fn test_miss_is_unhandled() {
        let mut widget = widget_with(&[1.0]);
        let mut size = egui::vec2(300.0, 128.0);

        assert_eq!(
            widget.pointer_down(egui::pos2(150.0, 5.0), &mut size),
            PointerOutcome::Unhandled
        );
    }

    #[test]
    fn test_row_toggle_flips_flag() {
        let mut widget = widget_with(&[1.0, 1.0]);
        let mut size = egui::vec2(300.0, 152.0);

        press(&mut widget, Zone::RowToggle(1), &mut size);
        assert!(!widget.entries.get(1).unwrap().enabled);
        assert!(widget.entries.get(0).unwrap().enabled);
    }

    #[test]
    fn test_header_toggle_turns_off_then_on() {
        let mut widget = widget_with(&[1.0, 1.0]);
        let mut size = egui::vec2(300.0, 152.0);

        press(&mut widget, Zone::HeaderToggle, &mut size);
        assert!(widget.entries.iter().all(|e| !e.enabled));
        press(&mut widget, Zone::HeaderToggle, &mut size);
        assert!(widget.entries.all_enabled());
    }

    #[test]
    fn test_stepper_increments_and_decrements() {
        let mut widget = widget_with(&[1.0]);
        let mut size = egui::vec2(300.0, 128.0);

        assert_eq!(
            press(&mut widget, Zone::RowIncrement(0), &mut size),
            PointerOutcome::handled()
        );
        assert_eq!(widget.entries.get(0).unwrap().value, 1.05);
        press(&mut widget, Zone::RowDecrement(0), &mut size);
        press(&mut widget, Zone::RowDecrement(0), &mut size);
        assert_eq!(widget.entries.get(0).unwrap().value, 0.95);
    }

    #[test]
    fn test_value_zone_opens_prefilled_prompt() {
        let mut widget = widget_with(&[-3.25]);
        let mut size = egui::vec2(300.0, 128.0);

        let outcome = press(&mut widget, Zone::RowValue(0), &mut size);
        assert_eq!(
            outcome,
            PointerOutcome::with_dialog(Dialog::EditValue {
                index: 0,
                current: -3.25
            })
        );
    }

    #[test]
    fn test_reference_zone_opens_selector() {
        let mut widget = widget_with(&[1.0, 1.0]);
        let mut size = egui::vec2(300.0, 152.0);

        assert_eq!(
            press(&mut widget, Zone::RowReference(1), &mut size),
            PointerOutcome::with_dialog(Dialog::SelectReference { index: 1 })
        );
    }

    #[test]
    fn test_value_prompt_results() {
        let mut widget = widget_with(&[1.0]);
        let mut size = egui::vec2(300.0, 128.0);

        let value = |input: &str| DialogResult::Value {
            index: 0,
            input: input.to_string(),
        };
        assert!(!widget.apply(value("abc"), &mut size));
        assert_eq!(widget.entries.get(0).unwrap().value, 1.0);
        assert!(!widget.apply(value("NaN"), &mut size));
        assert!(widget.apply(value(" 2.5 "), &mut size));
        assert_eq!(widget.entries.get(0).unwrap().value, 2.5);
        assert!(widget.apply(value("99"), &mut size));
        assert_eq!(widget.entries.get(0).unwrap().value, 10.0);
        assert!(widget.apply(value("0.123"), &mut size));
        assert_eq!(widget.entries.get(0).unwrap().value, 0.12);
    }

    #[test]
    fn test_selector_none_clears_reference() {
        let mut widget = widget_with(&[1.0]);
        let mut size = egui::vec2(300.0, 128.0);

        widget.apply(
            DialogResult::Reference {
                index: 0,
                reference: Some("a.safetensors".into()),
            },
            &mut size,
        );
        assert_eq!(widget.entries.get(0).unwrap().reference.as_deref(), Some("a.safetensors"));

        let items = selector_items(&["a.safetensors".to_string()]);
        assert_eq!(items[0].label, NONE_LABEL);
        widget.apply(
            DialogResult::Reference {
                index: 0,
                reference: items[0].reference.clone(),
            },
            &mut size,
        );
        assert_eq!(widget.entries.get(0).unwrap().reference, None);
    }

    #[test]
    fn test_selector_items_with_empty_catalog_only_offers_none() {
        let items = selector_items(&[]);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].reference, None);
    }

    #[test]
    fn test_row_menu_disables_moves_at_edges() {
        let widget = widget_with(&[1.0, 2.0, 3.0]);

        let Some(Dialog::RowMenu { items, .. }) = widget.row_menu(0) else {
            panic!("expected row menu");
        };
        assert_eq!(items[0].label, "Toggle Off");
        assert!(items[1].disabled);
        assert!(!items[2].disabled);

        let Some(Dialog::RowMenu { items, .. }) = widget.row_menu(2) else {
            panic!("expected row menu");
        };
        assert!(!items[1].disabled);
        assert!(items[2].disabled);
        assert!(widget.row_menu(3).is_none());
    }

    #[test]
    fn test_secondary_action_uses_row_bands() {
        let widget = widget_with(&[1.0, 2.0]);
        let size = egui::vec2(300.0, 152.0);

        match widget.secondary_action(egui::pos2(150.0, 80.0), size) {
            Some(Dialog::RowMenu { index, .. }) => assert_eq!(index, 1),
            other => panic!("unexpected {other:?}"),
        }
        assert!(widget.secondary_action(egui::pos2(150.0, 40.0), size).is_none());
    }

    #[test]
    fn test_remove_keeps_order_and_proposes_shorter_height() {
        let mut widget = widget_with(&[1.0, 2.0, 3.0]);
        let mut size = egui::vec2(300.0, 176.0);

        assert!(widget.apply(
            DialogResult::Row {
                index: 0,
                action: RowAction::Remove
            },
            &mut size
        ));
        let values: Vec<f64> = widget.entries.iter().map(|e| e.value).collect();
        assert_eq!(values, vec![2.0, 3.0]);
        assert_eq!(size.y, 152.0);
    }

    #[test]
    fn test_row_actions_move_and_toggle() {
        let mut widget = widget_with(&[1.0, 2.0]);
        let mut size = egui::vec2(300.0, 152.0);
        let row = |index, action| DialogResult::Row { index, action };

        widget.apply(row(1, RowAction::MoveUp), &mut size);
        assert_eq!(widget.entries.get(0).unwrap().value, 2.0);
        assert!(!widget.apply(row(1, RowAction::MoveDown), &mut size));
        widget.apply(row(0, RowAction::Toggle), &mut size);
        assert!(!widget.entries.get(0).unwrap().enabled);
    }

    #[test]
    fn test_stale_results_are_ignored() {
        let mut widget = widget_with(&[1.0]);
        let mut size = egui::vec2(300.0, 128.0);

        assert!(!widget.apply(
            DialogResult::Row {
                index: 4,
                action: RowAction::Remove,
            },
            &mut size
        ));
        assert!(!widget.apply(
            DialogResult::Reference {
                index: 2,
                reference: None,
            },
            &mut size
        ));
        assert_eq!(size.y, 128.0);
    }
}
