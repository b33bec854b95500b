use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::cell::{Cell, cell_grid};

/// How a table's rows aggregate into the figure shown under it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinalTotalMode {
    /// Sum of every row's computed value
    Total,
    /// Sum of computed values grouped by each row's first cell
    Name,
}

impl FinalTotalMode {
    /// Interpret a document's `finalTotal` string. Unknown modes mean no total.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "total" => Some(FinalTotalMode::Total),
            "name" => Some(FinalTotalMode::Name),
            _ => None,
        }
    }
}

/// A table document: measurement tables, PO tables and bare tables on disk.
///
/// `data[0]` is the header row, `data[1]` the template row. Rows from
/// `data[1]` on are editable; the template doubles as the first of them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableDoc {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "UOM", default, skip_serializing_if = "Option::is_none")]
    pub uom: Option<String>,
    #[serde(rename = "isMulti", default)]
    pub is_multi: bool,
    #[serde(rename = "finalTotal", default, skip_serializing_if = "Option::is_none")]
    pub final_total: Option<String>,
    #[serde(default, deserialize_with = "cell_grid")]
    pub data: Vec<Vec<Cell>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl TableDoc {
    pub fn final_total_mode(&self) -> Option<FinalTotalMode> {
        self.final_total.as_deref().and_then(FinalTotalMode::parse)
    }

    pub fn headers(&self) -> &[Cell] {
        self.data.first().map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn template(&self) -> &[Cell] {
        self.data.get(1).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Editable rows, starting with the template row
    pub fn rows(&self) -> &[Vec<Cell>] {
        self.data.get(1..).unwrap_or(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_unknown_cell_type_names_its_position() {
        let err = serde_json::from_value::<TableDoc>(json!({
            "data": [
                [{ "value": "Length" }, { "value": "Sign" }],
                [{ "type": "number", "value": "2" }, { "type": "signature", "value": "" }]
            ]
        }))
        .unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("data[1][1]"), "{}", msg);
        assert!(msg.contains("signature"), "{}", msg);
    }

    #[test]
    fn test_null_data_is_empty() {
        let doc: TableDoc = serde_json::from_value(json!({ "data": null })).unwrap();
        assert!(doc.data.is_empty());
    }

    #[test]
    fn test_missing_data_is_empty() {
        let doc: TableDoc = serde_json::from_value(json!({ "name": "Slab", "UOM": "m3" })).unwrap();
        assert!(doc.data.is_empty());
        assert!(doc.headers().is_empty());
        assert!(doc.template().is_empty());
        assert!(doc.rows().is_empty());
        assert!(!doc.is_multi);
    }

    #[test]
    fn test_null_data_is_empty_dup() {
        let doc: TableDoc = serde_json::from_value(json!({ "data": null })).unwrap();
        assert!(doc.data.is_empty());
    }

    #[test]
    fn test_final_total_mode() {
        let mut doc = TableDoc::default();
        assert_eq!(doc.final_total_mode(), None);
        doc.final_total = Some("total".into());
        assert_eq!(doc.final_total_mode(), Some(FinalTotalMode::Total));
        doc.final_total = Some("name".into());
        assert_eq!(doc.final_total_mode(), Some(FinalTotalMode::Name));
        doc.final_total = Some("average".into());
        assert_eq!(doc.final_total_mode(), None);
    }

    #[test]
    fn test_type_key_round_trips_through_extra() {
        let raw = json!({
            "type": "table",
            "name": "Excavation",
            "UOM": "m3",
            "isMulti": true,
            "finalTotal": "total",
            "data": [
                [{ "value": "Length" }, { "value": "Qty" }],
                [{ "type": "number", "value": "" }, { "type": "label", "formula": "*", "value": "" }]
            ]
        });
        let doc: TableDoc = serde_json::from_value(raw).unwrap();
        assert_eq!(doc.extra.get("type"), Some(&json!("table")));
        assert_eq!(doc.rows().len(), 1);
        let back = serde_json::to_value(&doc).unwrap();
        assert_eq!(back["type"], json!("table"));
        assert_eq!(back["data"][1][1]["formula"], json!("*"));
    }
}
