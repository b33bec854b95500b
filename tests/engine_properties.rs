//! Behavior of the editing engines through the public API.

use fieldbook::model::activity::{ChecklistItem, ChecklistKind, DateBound};
use fieldbook::model::cell::{Cell, CellKind, CellValue, DropdownOption};
use fieldbook::model::doc_tree::DocTree;
use fieldbook::model::table::FinalTotalMode;
use fieldbook::ops::checklist_ops::{ChecklistEdit, EditOutcome, apply_edit, parse_date_input};
use fieldbook::ops::table_ops::{FinalTotal, TableEngine};
use fieldbook::ops::tree_ops::{add_folder, remove_file};
use pretty_assertions::assert_eq;
use serde_json::json;

fn num(v: &str) -> Cell {
    Cell::new(CellKind::Number, v)
}

fn label(v: &str) -> Cell {
    Cell::new(CellKind::Label, v)
}

fn product(v: &str) -> Cell {
    let mut cell = Cell::product();
    cell.value = CellValue::from(v);
    cell
}

fn area_engine(rows: Vec<Vec<Cell>>) -> TableEngine {
    let mut data = vec![vec![label("Length"), label("Width"), label("Area")]];
    data.extend(rows);
    TableEngine::new(data, true, Some(FinalTotalMode::Total))
}

#[test]
fn add_then_remove_row_restores_rows() {
    let mut engine = area_engine(vec![vec![num("2"), num("3"), product("6")]]);
    let before = engine.data();
    let added = engine.add_row().unwrap();
    assert_eq!(engine.rows().len(), 2);
    engine.remove_row(added).unwrap();
    assert_eq!(engine.data(), before);
}

#[test]
fn number_cells_keep_digits_and_first_dot() {
    let mut engine = area_engine(vec![vec![num(""), num("1"), product("")]]);
    engine.update_cell(0, 0, "12a.3.4").unwrap();
    assert_eq!(engine.rows()[0][0].value, CellValue::from("12.34"));
}

#[test]
fn product_cell_follows_every_update() {
    let mut engine = area_engine(vec![vec![num("2"), num("3"), product("")]]);
    engine.update_cell(0, 0, "2").unwrap();
    assert_eq!(engine.rows()[0][2].text(), "6");
    engine.update_cell(0, 1, "3").unwrap();
    assert_eq!(engine.rows()[0][2].text(), "6");
}

#[test]
fn total_sums_computed_cells() {
    let engine = area_engine(vec![
        vec![num("2"), num("3"), product("6")],
        vec![num("2"), num("2"), product("4")],
    ]);
    assert_eq!(engine.final_total(), Some(FinalTotal::Sum(10.0)));
}

#[test]
fn add_folder_to_empty_tree() {
    let tree = DocTree::new();
    let next = add_folder(&tree, &[] as &[&str], "Reports").unwrap();
    assert_eq!(
        serde_json::to_value(&next).unwrap(),
        json!([{ "name": "Reports", "type": "folder", "children": [] }])
    );
    assert!(tree.is_empty());
    assert!(!next.same_snapshot(&tree));
}

#[test]
fn removing_missing_file_keeps_tree() {
    let tree: DocTree = serde_json::from_value(json!([
        {
            "name": "Reports",
            "type": "folder",
            "children": [{ "name": "week1.pdf", "type": "file", "value": "r/week1.pdf" }]
        }
    ]))
    .unwrap();
    let next = remove_file(&tree, &["Reports", "missing.pdf"]);
    assert_eq!(next, tree);
    assert!(next.same_snapshot(&tree));

    // A real removal leaves the input snapshot alone
    let removed = remove_file(&tree, &["Reports", "week1.pdf"]);
    assert_eq!(removed.roots()[0].children().len(), 0);
    assert_eq!(tree.roots()[0].children().len(), 1);
    assert!(!removed.same_snapshot(&tree));
}

#[test]
fn disabled_items_reject_every_edit() {
    let mut items = vec![
        ChecklistItem::new("Shuttering", ChecklistKind::Checkbox, json!(false)),
        ChecklistItem::new("Grade", ChecklistKind::Dropdown, json!("")),
        ChecklistItem::new("Window", ChecklistKind::DateRange, json!({ "from": "", "to": "" })),
        ChecklistItem::new(
            "Bars",
            ChecklistKind::Table,
            json!([[{ "type": "label", "value": "Qty" }], [{ "type": "number", "value": "1" }]]),
        ),
    ];
    items[1].options = vec![DropdownOption::new("M25", "25")];
    for item in &mut items {
        item.disabled = true;
    }

    let date = parse_date_input("2024-03-01").unwrap();
    let edits = [
        ChecklistEdit::Checkbox(true),
        ChecklistEdit::Dropdown(json!("25")),
        ChecklistEdit::DateRange(DateBound::From, Some(date)),
        ChecklistEdit::Table(vec![vec![label("Qty")], vec![num("9")]]),
    ];
    for (item, edit) in items.iter_mut().zip(edits) {
        let before = item.value.clone();
        assert_eq!(apply_edit(item, edit).unwrap(), EditOutcome::Rejected);
        assert_eq!(item.value, before, "{} changed", item.name);
    }
}
