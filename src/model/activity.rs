use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::cell::{CellValue, DropdownOption, is_false, nullable_default};
use super::table::TableDoc;

/// Sentinel `measurement` value: measure against the activity's PO table
pub const SAME_AS_PO: &str = "SAME_AS_PO";

/// The editor a checklist item uses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ChecklistKind {
    Checkbox,
    Dropdown,
    Table,
    DateRange,
    FileUpload,
}

impl ChecklistKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ChecklistKind::Checkbox => "checkbox",
            ChecklistKind::Dropdown => "dropdown",
            ChecklistKind::Table => "table",
            ChecklistKind::DateRange => "daterange",
            ChecklistKind::FileUpload => "fileupload",
        }
    }
}

impl fmt::Display for ChecklistKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Checklist kinds are matched case-insensitively (`FileUpload`, `dateRange`).
impl FromStr for ChecklistKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "checkbox" => Ok(ChecklistKind::Checkbox),
            "dropdown" => Ok(ChecklistKind::Dropdown),
            "table" => Ok(ChecklistKind::Table),
            "daterange" => Ok(ChecklistKind::DateRange),
            "fileupload" => Ok(ChecklistKind::FileUpload),
            _ => Err(format!("unknown checklist item type: {}", s)),
        }
    }
}

impl TryFrom<String> for ChecklistKind {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<ChecklistKind> for String {
    fn from(kind: ChecklistKind) -> Self {
        kind.as_str().to_string()
    }
}

/// One field of an activity form
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChecklistItem {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type")]
    pub kind: ChecklistKind,
    /// Shape depends on `kind`: bool, string or list of strings, table rows,
    /// `{from, to}`, storage path.
    #[serde(default)]
    pub value: Value,
    #[serde(default, skip_serializing_if = "is_false")]
    pub disabled: bool,
    #[serde(
        default,
        deserialize_with = "nullable_default",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub options: Vec<DropdownOption>,
    #[serde(rename = "isMulti", default, skip_serializing_if = "is_false")]
    pub is_multi: bool,
    #[serde(rename = "finalTotal", default, skip_serializing_if = "Option::is_none")]
    pub final_total: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ChecklistItem {
    pub fn new(name: impl Into<String>, kind: ChecklistKind, value: Value) -> Self {
        ChecklistItem {
            id: None,
            name: name.into(),
            kind,
            value,
            disabled: false,
            options: Vec::new(),
            is_multi: false,
            final_total: None,
            extra: Map::new(),
        }
    }
}

/// Value of a date-range item. Both ends are ISO-8601 strings, empty when unset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    #[serde(default)]
    pub from: String,
    #[serde(default)]
    pub to: String,
}

/// Which end of a date range an edit targets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateBound {
    From,
    To,
}

/// An activity document as the backend returns it
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Activity {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uuid: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "checkLists", default, deserialize_with = "nullable_default")]
    pub checklists: Vec<ChecklistItem>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub measurement: Option<Value>,
    #[serde(rename = "poValue", default, skip_serializing_if = "Option::is_none")]
    pub po_value: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Activity {
    pub fn item(&self, name: &str) -> Option<&ChecklistItem> {
        self.checklists.iter().find(|it| it.name == name)
    }

    pub fn item_mut(&mut self, name: &str) -> Option<&mut ChecklistItem> {
        self.checklists.iter_mut().find(|it| it.name == name)
    }

    /// The raw measurement JSON. Older documents use the plural key.
    pub fn raw_measurement(&self) -> Option<&Value> {
        self.measurement
            .as_ref()
            .or_else(|| self.extra.get("measurements"))
    }
}

/// A single-value ("LOT") measurement
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LotMeasurement {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "UOM", default, skip_serializing_if = "Option::is_none")]
    pub uom: Option<String>,
    #[serde(default)]
    pub value: CellValue,
    #[serde(default, skip_serializing_if = "is_false")]
    pub disabled: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// An activity's measurement, resolved from its raw JSON
#[derive(Debug, Clone, PartialEq)]
pub enum Measurement {
    Lot(LotMeasurement),
    Table(TableDoc),
    /// The `SAME_AS_PO` sentinel, not yet expanded from the PO value
    SameAsPo,
    /// A shape this crate has no editor for
    Unsupported(Value),
}

impl Measurement {
    pub fn from_value(value: &Value) -> Result<Self, serde_json::Error> {
        if value.as_str() == Some(SAME_AS_PO) {
            return Ok(Measurement::SameAsPo);
        }
        let kind = value.get("type").and_then(Value::as_str).unwrap_or("");
        if kind.eq_ignore_ascii_case("lot") {
            Ok(Measurement::Lot(serde_json::from_value(value.clone())?))
        } else if kind.eq_ignore_ascii_case("table") {
            Ok(Measurement::Table(serde_json::from_value(value.clone())?))
        } else {
            Ok(Measurement::Unsupported(value.clone()))
        }
    }

    pub fn to_value(&self) -> Result<Value, serde_json::Error> {
        match self {
            Measurement::Lot(lot) => serde_json::to_value(lot),
            Measurement::Table(table) => serde_json::to_value(table),
            Measurement::SameAsPo => Ok(Value::String(SAME_AS_PO.to_string())),
            Measurement::Unsupported(v) => Ok(v.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_kind_is_case_insensitive() {
        let item: ChecklistItem =
            serde_json::from_value(json!({ "name": "Photos", "type": "FileUpload" })).unwrap();
        assert_eq!(item.kind, ChecklistKind::FileUpload);
        assert_eq!(serde_json::to_value(&item).unwrap()["type"], json!("fileupload"));
        assert!("dateRange".parse::<ChecklistKind>().is_ok());
        assert!("signature".parse::<ChecklistKind>().is_err());
    }

    #[test]
    fn test_activity_defaults() {
        let activity: Activity =
            serde_json::from_value(json!({ "name": "Footings", "checkLists": null })).unwrap();
        assert!(activity.checklists.is_empty());
        assert!(activity.measurement.is_none());
        assert!(activity.po_value.is_none());
    }

    #[test]
    fn test_item_lookup() {
        let activity: Activity = serde_json::from_value(json!({
            "name": "Footings",
            "checkLists": [
                { "name": "Rebar checked", "type": "checkbox", "value": false },
                { "name": "Photos", "type": "fileUpload", "value": "" }
            ]
        }))
        .unwrap();
        assert!(activity.item("Rebar checked").is_some());
        assert!(activity.item("Missing").is_none());
    }

    #[test]
    fn test_measurement_resolution() {
        assert_eq!(
            Measurement::from_value(&json!("SAME_AS_PO")).unwrap(),
            Measurement::SameAsPo
        );
        let lot = Measurement::from_value(&json!({ "type": "LOT", "UOM": "kg", "value": 12 })).unwrap();
        match lot {
            Measurement::Lot(l) => {
                assert_eq!(l.uom.as_deref(), Some("kg"));
                assert_eq!(l.value.as_number(), Some(12.0));
            }
            other => panic!("expected lot, got {:?}", other),
        }
        let table = Measurement::from_value(&json!({ "type": "Table", "data": [] })).unwrap();
        assert!(matches!(table, Measurement::Table(_)));
        let other = Measurement::from_value(&json!({ "type": "volume" })).unwrap();
        assert!(matches!(other, Measurement::Unsupported(_)));
    }

    #[test]
    fn test_plural_measurement_key() {
        let activity: Activity =
            serde_json::from_value(json!({ "measurements": "SAME_AS_PO" })).unwrap();
        assert!(activity.measurement.is_none());
        assert_eq!(activity.raw_measurement(), Some(&json!("SAME_AS_PO")));
    }
}
