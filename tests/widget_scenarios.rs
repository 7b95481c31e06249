use eframe::egui;
use power_lora_loader::hit_test::zone_center;
use power_lora_loader::layout::layout;
use power_lora_loader::resolve::resolve_stack;
use power_lora_loader::{
    Chained, Dialog, DialogResult, NodeBehavior, PointerOutcome, PowerLoraWidget, RowAction, Zone,
};
use serde_json::{json, Map, Value};

fn press(
    node: &mut impl NodeBehavior,
    entry_count: usize,
    zone: Zone,
    size: &mut egui::Vec2,
) -> PointerOutcome {
    let pos = zone_center(&layout(entry_count, size.x), zone).expect("zone exists");
    node.on_pointer_down(pos, size)
}

#[test]
fn build_save_reload_and_resolve() {
    let mut widget = PowerLoraWidget::new();
    let mut size = egui::vec2(300.0, 80.0);

    for reference in ["wan/motion.safetensors", "detail.ckpt"] {
        let count = widget.entries().len();
        let outcome = press(&mut widget, count, Zone::AddButton, &mut size);
        let PointerOutcome::Handled {
            dialog: Some(Dialog::SelectReference { index }),
        } = outcome
        else {
            panic!("add should open the selector, got {outcome:?}");
        };
        assert!(widget.on_dialog_result(
            DialogResult::Reference {
                index,
                reference: Some(reference.to_string()),
            },
            &mut size,
        ));
    }
    assert_eq!(widget.entries().len(), 2);
    assert_eq!(size.y, 152.0);

    // Two increments on the first row, then disable the second.
    press(&mut widget, 2, Zone::RowIncrement(0), &mut size);
    press(&mut widget, 2, Zone::RowIncrement(0), &mut size);
    press(&mut widget, 2, Zone::RowToggle(1), &mut size);
    assert_eq!(widget.entries().get(0).unwrap().value, 1.1);
    assert!(!widget.entries().get(1).unwrap().enabled);

    let mut saved = Map::new();
    widget.on_serialize(&mut saved);
    let mut restored = PowerLoraWidget::new();
    let mut restored_size = egui::vec2(300.0, 80.0);
    restored.on_configure(&saved, &mut restored_size);
    assert_eq!(restored, widget);
    assert_eq!(restored_size.y, 152.0);

    let mut inputs = Map::new();
    restored.on_execute(&mut inputs);
    let available = vec![
        "wan/motion.safetensors".to_string(),
        "detail.ckpt".to_string(),
    ];
    let stack = resolve_stack(&inputs, &available, None, None).expect("one enabled entry");

    assert_eq!(stack.len(), 1);
    assert_eq!(stack[0].name, "motion");
    assert_eq!(stack[0].strength, 1.1);
    assert!(stack[0].merge_loras);
}

#[test]
fn header_toggle_and_row_menu_round_trip() {
    let mut widget = PowerLoraWidget::new();
    let mut size = egui::vec2(320.0, 80.0);
    for count in 0..3 {
        press(&mut widget, count, Zone::AddButton, &mut size);
    }

    press(&mut widget, 3, Zone::HeaderToggle, &mut size);
    assert!(widget.entries().iter().all(|e| !e.enabled));
    press(&mut widget, 3, Zone::HeaderToggle, &mut size);
    assert!(widget.entries().iter().all(|e| e.enabled));

    let row_center = zone_center(&layout(3, size.x), Zone::RowReference(2)).unwrap();
    let Some(Dialog::RowMenu { index, items }) = widget.on_secondary_action(row_center, size) else {
        panic!("row menu expected");
    };
    assert_eq!(index, 2);
    let labels: Vec<&str> = items.iter().map(|i| i.label.as_str()).collect();
    assert_eq!(labels, vec!["Toggle Off", "Move Up", "Move Down", "Remove"]);

    widget.on_dialog_result(
        DialogResult::Row {
            index: 2,
            action: RowAction::Remove,
        },
        &mut size,
    );
    assert_eq!(widget.entries().len(), 2);
    assert_eq!(size.y, 152.0);
}

#[test]
fn legacy_workflow_exports_current_keys() {
    let saved = json!({
        "lorasData": [
            {"on": true, "lora": "a.safetensors", "strength": 0.75},
            {"on": false, "lora": "None", "strength": 1.0}
        ]
    });
    let mut widget = PowerLoraWidget::new();
    let mut size = egui::vec2(300.0, 80.0);
    widget.on_configure(saved.as_object().unwrap(), &mut size);

    let mut inputs = Map::new();
    widget.on_execute(&mut inputs);

    assert_eq!(
        Value::Object(inputs),
        json!({
            "entry_1": {"enabled": true, "reference": "a.safetensors", "value": 0.75},
            "entry_2": {"enabled": false, "reference": "None", "value": 1.0}
        })
    );
}

#[derive(Default)]
struct TitleBar {
    pressed: bool,
}

impl NodeBehavior for TitleBar {
    fn on_pointer_down(&mut self, pos: egui::Pos2, _size: &mut egui::Vec2) -> PointerOutcome {
        if pos.y < 20.0 {
            self.pressed = true;
            PointerOutcome::handled()
        } else {
            PointerOutcome::Unhandled
        }
    }
}

#[test]
fn chained_base_sees_events_first() {
    let mut node = Chained::new(TitleBar::default(), PowerLoraWidget::new());
    let mut size = egui::vec2(300.0, 80.0);

    assert!(node.on_pointer_down(egui::pos2(40.0, 5.0), &mut size).is_handled());
    assert!(node.base.pressed);
    assert!(node.widget.entries().is_empty());

    press(&mut node, 0, Zone::AddButton, &mut size);
    assert_eq!(node.widget.entries().len(), 1);
    assert_eq!(node.on_resize(egui::vec2(10.0, 10.0)), egui::vec2(300.0, 128.0));
}
