use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use serde_json::{Map, Value};

use crate::model::activity::{Activity, ChecklistItem, ChecklistKind, DateBound, DateRange};
use crate::model::cell::{Cell, CellValue, cell_grid};
use crate::model::table::FinalTotalMode;
use crate::ops::table_ops::TableEngine;

/// Error type for checklist edits
#[derive(Debug, thiserror::Error)]
pub enum ChecklistError {
    #[error("item not found: {0}")]
    ItemNotFound(String),
    #[error("{edit} edit does not apply to {kind} item {name:?}")]
    KindMismatch {
        name: String,
        kind: ChecklistKind,
        edit: ChecklistKind,
    },
    #[error("{value} is not an option of {name:?}")]
    UnknownOption { name: String, value: String },
    #[error("invalid date: {0}")]
    InvalidDate(String),
    #[error("table item {name:?} is malformed: {source}")]
    MalformedTable {
        name: String,
        #[source]
        source: serde_json::Error,
    },
}

/// A value change requested for one checklist item
#[derive(Debug, Clone, PartialEq)]
pub enum ChecklistEdit {
    Checkbox(bool),
    /// An option value. Multi-select items toggle it in their list.
    Dropdown(Value),
    /// `None` is a dismissed picker
    DateRange(DateBound, Option<DateTime<Utc>>),
    Table(Vec<Vec<Cell>>),
    /// Storage path of the uploaded file
    FileUpload(String),
}

impl ChecklistEdit {
    pub fn kind(&self) -> ChecklistKind {
        match self {
            ChecklistEdit::Checkbox(_) => ChecklistKind::Checkbox,
            ChecklistEdit::Dropdown(_) => ChecklistKind::Dropdown,
            ChecklistEdit::DateRange(..) => ChecklistKind::DateRange,
            ChecklistEdit::Table(_) => ChecklistKind::Table,
            ChecklistEdit::FileUpload(_) => ChecklistKind::FileUpload,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditOutcome {
    Applied,
    /// The item is disabled; nothing changed
    Rejected,
    /// The edit carried nothing to apply
    Unchanged,
}

pub fn find_item_mut<'a>(
    activity: &'a mut Activity,
    name: &str,
) -> Result<&'a mut ChecklistItem, ChecklistError> {
    activity
        .item_mut(name)
        .ok_or_else(|| ChecklistError::ItemNotFound(name.to_string()))
}

/// Apply `edit` to `item`.
///
/// Disabled items reject every edit without an error. An edit of the wrong
/// kind for the item is an error.
pub fn apply_edit(
    item: &mut ChecklistItem,
    edit: ChecklistEdit,
) -> Result<EditOutcome, ChecklistError> {
    if edit.kind() != item.kind {
        return Err(ChecklistError::KindMismatch {
            name: item.name.clone(),
            kind: item.kind,
            edit: edit.kind(),
        });
    }
    if item.disabled {
        tracing::debug!(item = %item.name, kind = %item.kind, "edit rejected: item disabled");
        return Ok(EditOutcome::Rejected);
    }

    match edit {
        ChecklistEdit::Checkbox(checked) => {
            item.value = Value::Bool(checked);
        }
        ChecklistEdit::Dropdown(selection) => {
            if !item.options.is_empty() && !has_option(item, &selection) {
                return Err(ChecklistError::UnknownOption {
                    name: item.name.clone(),
                    value: selection.to_string(),
                });
            }
            if item.is_multi {
                toggle_selection(&mut item.value, selection);
            } else {
                item.value = selection;
            }
        }
        ChecklistEdit::DateRange(_, None) => return Ok(EditOutcome::Unchanged),
        ChecklistEdit::DateRange(bound, Some(date)) => {
            let key = match bound {
                DateBound::From => "from",
                DateBound::To => "to",
            };
            if !item.value.is_object() {
                item.value = Value::Object(Map::from_iter([
                    ("from".to_string(), Value::String(String::new())),
                    ("to".to_string(), Value::String(String::new())),
                ]));
            }
            if let Value::Object(range) = &mut item.value {
                range.insert(key.to_string(), Value::String(iso_string(date)));
            }
        }
        ChecklistEdit::Table(rows) => {
            item.value = serde_json::to_value(rows).map_err(|source| {
                ChecklistError::MalformedTable {
                    name: item.name.clone(),
                    source,
                }
            })?;
        }
        ChecklistEdit::FileUpload(path) => {
            item.value = Value::String(path);
        }
    }
    tracing::debug!(item = %item.name, kind = %item.kind, "edit applied");
    Ok(EditOutcome::Applied)
}

fn has_option(item: &ChecklistItem, selection: &Value) -> bool {
    let Ok(wanted) = serde_json::from_value::<CellValue>(selection.clone()) else {
        return false;
    };
    item.options.iter().any(|opt| opt.value == wanted)
}

fn toggle_selection(value: &mut Value, selection: Value) {
    let mut selected: Vec<Value> = match value.take() {
        Value::Array(items) => items,
        Value::Null => Vec::new(),
        Value::String(s) if s.is_empty() => Vec::new(),
        other => vec![other],
    };
    if let Some(pos) = selected.iter().position(|v| *v == selection) {
        selected.remove(pos);
    } else {
        selected.push(selection);
    }
    *value = Value::Array(selected);
}

/// A table engine over a table item's `[headers, ...rows]` value.
/// Write the result back with `ChecklistEdit::Table(engine.data())`.
pub fn table_engine(item: &ChecklistItem) -> Result<TableEngine, ChecklistError> {
    if item.kind != ChecklistKind::Table {
        return Err(ChecklistError::KindMismatch {
            name: item.name.clone(),
            kind: item.kind,
            edit: ChecklistKind::Table,
        });
    }
    let data = cell_grid(item.value.clone()).map_err(|source| ChecklistError::MalformedTable {
        name: item.name.clone(),
        source,
    })?;
    let mode = item.final_total.as_deref().and_then(FinalTotalMode::parse);
    Ok(TableEngine::new(data, item.is_multi, mode))
}

/// Whether a checkbox value counts as checked. Follows the backend's
/// loose truthiness: `""`, `0`, `null` and `false` are unchecked.
pub fn is_checked(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

// ---------------------------------------------------------------------------
// Dates
// ---------------------------------------------------------------------------

/// ISO-8601 with milliseconds in UTC, e.g. `2024-03-01T00:00:00.000Z`
pub fn iso_string(date: DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Parse a user-entered date: `YYYY-MM-DD` (midnight UTC) or RFC 3339.
pub fn parse_date_input(input: &str) -> Result<DateTime<Utc>, ChecklistError> {
    let input = input.trim();
    if let Ok(day) = NaiveDate::parse_from_str(input, "%Y-%m-%d")
        && let Some(midnight) = day.and_hms_opt(0, 0, 0)
    {
        return Ok(midnight.and_utc());
    }
    DateTime::parse_from_rfc3339(input)
        .map(|d| d.with_timezone(&Utc))
        .map_err(|_| ChecklistError::InvalidDate(input.to_string()))
}

/// Short display form of a stored date, `Select` when unset.
pub fn display_date(iso: &str) -> String {
    if iso.is_empty() {
        return "Select".to_string();
    }
    match DateTime::parse_from_rfc3339(iso) {
        Ok(d) => d.with_timezone(&Utc).format("%Y-%m-%d").to_string(),
        Err(_) => iso.to_string(),
    }
}

/// A date-range item's value, tolerating missing or malformed shapes
pub fn date_range(item: &ChecklistItem) -> DateRange {
    serde_json::from_value(item.value.clone()).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::cell::{CellKind, DropdownOption};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn disabled(mut item: ChecklistItem) -> ChecklistItem {
        item.disabled = true;
        item
    }

    fn day(s: &str) -> DateTime<Utc> {
        parse_date_input(s).unwrap()
    }

    #[test]
    fn test_checkbox_edit() {
        let mut item = ChecklistItem::new("Shuttering", ChecklistKind::Checkbox, json!(false));
        assert_eq!(
            apply_edit(&mut item, ChecklistEdit::Checkbox(true)).unwrap(),
            EditOutcome::Applied
        );
        assert_eq!(item.value, json!(true));
    }

    #[test]
    fn test_disabled_items_reject_every_edit() {
        let cases = vec![
            (
                ChecklistItem::new("Check", ChecklistKind::Checkbox, json!(false)),
                ChecklistEdit::Checkbox(true),
            ),
            (
                ChecklistItem::new("Grade", ChecklistKind::Dropdown, json!("M20")),
                ChecklistEdit::Dropdown(json!("M25")),
            ),
            (
                ChecklistItem::new(
                    "Window",
                    ChecklistKind::DateRange,
                    json!({ "from": "", "to": "" }),
                ),
                ChecklistEdit::DateRange(DateBound::From, Some(day("2024-03-01"))),
            ),
            (
                ChecklistItem::new("Bars", ChecklistKind::Table, json!([[{ "value": "Dia" }]])),
                ChecklistEdit::Table(vec![vec![Cell::new(CellKind::Label, "x")]]),
            ),
            (
                ChecklistItem::new("Photo", ChecklistKind::FileUpload, json!("")),
                ChecklistEdit::FileUpload("activities/a.jpg".into()),
            ),
        ];
        for (item, edit) in cases {
            let mut item = disabled(item);
            let before = item.value.clone();
            assert_eq!(apply_edit(&mut item, edit).unwrap(), EditOutcome::Rejected);
            assert_eq!(item.value, before);
        }
    }

    #[test]
    fn test_kind_mismatch_is_an_error() {
        let mut item = ChecklistItem::new("Check", ChecklistKind::Checkbox, json!(false));
        let err = apply_edit(&mut item, ChecklistEdit::FileUpload("x".into())).unwrap_err();
        assert!(matches!(
            err,
            ChecklistError::KindMismatch {
                kind: ChecklistKind::Checkbox,
                edit: ChecklistKind::FileUpload,
                ..
            }
        ));
        assert_eq!(item.value, json!(false));
    }

    #[test]
    fn test_dropdown_single_and_unknown_option() {
        let mut item = ChecklistItem::new("Grade", ChecklistKind::Dropdown, json!("M20"));
        item.options = vec![DropdownOption::new("M20", "M20"), DropdownOption::new("M25", "M25")];
        apply_edit(&mut item, ChecklistEdit::Dropdown(json!("M25"))).unwrap();
        assert_eq!(item.value, json!("M25"));

        let err = apply_edit(&mut item, ChecklistEdit::Dropdown(json!("M99"))).unwrap_err();
        assert!(matches!(err, ChecklistError::UnknownOption { .. }));
        assert_eq!(item.value, json!("M25"));
    }

    #[test]
    fn test_dropdown_multi_toggles() {
        let mut item = ChecklistItem::new("Crew", ChecklistKind::Dropdown, json!(""));
        item.is_multi = true;
        apply_edit(&mut item, ChecklistEdit::Dropdown(json!("mason"))).unwrap();
        apply_edit(&mut item, ChecklistEdit::Dropdown(json!("welder"))).unwrap();
        assert_eq!(item.value, json!(["mason", "welder"]));
        apply_edit(&mut item, ChecklistEdit::Dropdown(json!("mason"))).unwrap();
        assert_eq!(item.value, json!(["welder"]));
    }

    #[test]
    fn test_date_range_sets_one_bound() {
        let mut item = ChecklistItem::new(
            "Window",
            ChecklistKind::DateRange,
            json!({ "from": "", "to": "2024-04-01T00:00:00.000Z", "note": "keep" }),
        );
        apply_edit(
            &mut item,
            ChecklistEdit::DateRange(DateBound::From, Some(day("2024-03-01"))),
        )
        .unwrap();
        assert_eq!(
            item.value,
            json!({ "from": "2024-03-01T00:00:00.000Z", "to": "2024-04-01T00:00:00.000Z", "note": "keep" })
        );
    }

    #[test]
    fn test_date_range_from_null_value() {
        let mut item = ChecklistItem::new("Window", ChecklistKind::DateRange, Value::Null);
        apply_edit(
            &mut item,
            ChecklistEdit::DateRange(DateBound::To, Some(day("2024-03-05T10:30:00Z"))),
        )
        .unwrap();
        assert_eq!(
            date_range(&item),
            DateRange {
                from: String::new(),
                to: "2024-03-05T10:30:00.000Z".into()
            }
        );
    }

    #[test]
    fn test_dismissed_picker_leaves_value() {
        let mut item = ChecklistItem::new(
            "Window",
            ChecklistKind::DateRange,
            json!({ "from": "2024-03-01T00:00:00.000Z", "to": "" }),
        );
        let before = item.value.clone();
        assert_eq!(
            apply_edit(&mut item, ChecklistEdit::DateRange(DateBound::From, None)).unwrap(),
            EditOutcome::Unchanged
        );
        assert_eq!(item.value, before);
    }

    #[test]
    fn test_table_item_round_trip_through_engine() {
        let mut item = ChecklistItem::new(
            "Bars",
            ChecklistKind::Table,
            json!([
                [{ "value": "Dia" }, { "value": "Count" }, { "value": "Total" }],
                [
                    { "type": "number", "value": "" },
                    { "type": "number", "value": "" },
                    { "type": "label", "formula": "*", "value": "" }
                ]
            ]),
        );
        item.is_multi = true;
        item.final_total = Some("total".into());

        let mut engine = table_engine(&item).unwrap();
        engine.update_cell(0, 0, "12").unwrap();
        engine.update_cell(0, 1, "4").unwrap();
        engine.add_row().unwrap();
        apply_edit(&mut item, ChecklistEdit::Table(engine.data())).unwrap();

        assert_eq!(item.value[1][2]["value"], json!("48"));
        assert_eq!(item.value.as_array().unwrap().len(), 3);
        let reloaded = table_engine(&item).unwrap();
        assert_eq!(reloaded.rows().len(), 2);
    }

    #[test]
    fn test_table_engine_requires_table_item() {
        let item = ChecklistItem::new("Check", ChecklistKind::Checkbox, json!(true));
        assert!(matches!(
            table_engine(&item),
            Err(ChecklistError::KindMismatch { .. })
        ));
        let item = ChecklistItem::new("Bars", ChecklistKind::Table, json!("oops"));
        assert!(matches!(
            table_engine(&item),
            Err(ChecklistError::MalformedTable { .. })
        ));
    }

    #[test]
    fn test_is_checked() {
        assert!(is_checked(&json!(true)));
        assert!(is_checked(&json!("yes")));
        assert!(is_checked(&json!(1)));
        assert!(!is_checked(&json!("")));
        assert!(!is_checked(&json!(0)));
        assert!(!is_checked(&Value::Null));
        assert!(!is_checked(&json!(false)));
    }

    #[test]
    fn test_dates() {
        assert_eq!(iso_string(day("2024-03-01")), "2024-03-01T00:00:00.000Z");
        assert_eq!(display_date(""), "Select");
        assert_eq!(display_date("2024-03-01T00:00:00.000Z"), "2024-03-01");
        assert_eq!(display_date("soon"), "soon");
        assert!(matches!(
            parse_date_input("03/01/2024"),
            Err(ChecklistError::InvalidDate(_))
        ));
    }

    #[test]
    fn test_find_item() {
        let mut activity: Activity = serde_json::from_value(json!({
            "name": "Slab",
            "checkLists": [{ "name": "Check", "type": "checkbox", "value": false }]
        }))
        .unwrap();
        assert!(find_item_mut(&mut activity, "Check").is_ok());
        assert!(matches!(
            find_item_mut(&mut activity, "Nope"),
            Err(ChecklistError::ItemNotFound(_))
        ));
    }
}
