use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::util::numeric::parse_finite;

/// Deserialize `null` (or a missing field, with `#[serde(default)]`) as the
/// type's default. The backend sends `null` for empty arrays in places.
pub(crate) fn nullable_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Deserialize a `[headers, ...rows]` grid of cells. A cell that fails to
/// parse is reported with its `data[row][col]` position; `null` reads as an
/// empty grid.
pub(crate) fn cell_grid<'de, D>(deserializer: D) -> Result<Vec<Vec<Cell>>, D::Error>
where
    D: Deserializer<'de>,
{
    let grid: Option<Vec<Vec<Value>>> = Option::deserialize(deserializer)?;
    grid.unwrap_or_default()
        .into_iter()
        .enumerate()
        .map(|(r, row)| {
            row.into_iter()
                .enumerate()
                .map(|(c, raw)| {
                    Cell::deserialize(raw)
                        .map_err(|e| D::Error::custom(format!("data[{}][{}]: {}", r, c, e)))
                })
                .collect::<Result<Vec<_>, _>>()
        })
        .collect()
}

pub(crate) fn is_false(b: &bool) -> bool {
    !*b
}

/// The kind of a table cell, carried in the JSON `type` field.
///
/// Header cells often omit `type`; those read as labels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CellKind {
    #[default]
    Label,
    Text,
    Number,
    Dropdown,
    Image,
}

impl CellKind {
    /// Kinds whose values take part in a row's product formula
    pub fn is_factor(self) -> bool {
        matches!(self, CellKind::Number | CellKind::Dropdown)
    }
}

impl std::fmt::Display for CellKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CellKind::Label => write!(f, "label"),
            CellKind::Text => write!(f, "text"),
            CellKind::Number => write!(f, "number"),
            CellKind::Dropdown => write!(f, "dropdown"),
            CellKind::Image => write!(f, "image"),
        }
    }
}

/// A cell value as the backend sends it: null, a JSON number or a string.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    #[default]
    Null,
    Number(serde_json::Number),
    Text(String),
    /// Anything else (booleans, nested objects) is carried through untouched.
    Other(Value),
}

impl CellValue {
    pub fn empty() -> Self {
        CellValue::Text(String::new())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }

    /// Display text. Null and absent values render as the empty string.
    pub fn as_text(&self) -> String {
        match self {
            CellValue::Null => String::new(),
            CellValue::Number(n) => n.to_string(),
            CellValue::Text(s) => s.clone(),
            CellValue::Other(v) => v.to_string(),
        }
    }

    /// The value as a finite number, if it is one or parses as one.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            CellValue::Number(n) => n.as_f64().filter(|f| f.is_finite()),
            CellValue::Text(s) => parse_finite(s),
            CellValue::Null | CellValue::Other(_) => None,
        }
    }

    /// JS-style truthiness: empty strings, zero and null are false.
    pub fn is_truthy(&self) -> bool {
        match self {
            CellValue::Null => false,
            CellValue::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
            CellValue::Text(s) => !s.is_empty(),
            CellValue::Other(v) => !matches!(v, Value::Bool(false)),
        }
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::Text(s.to_string())
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::Text(s)
    }
}

/// One choice of a dropdown cell or checklist item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DropdownOption {
    #[serde(default)]
    pub label: CellValue,
    #[serde(default)]
    pub value: CellValue,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl DropdownOption {
    pub fn new(label: &str, value: impl Into<CellValue>) -> Self {
        DropdownOption {
            label: CellValue::from(label),
            value: value.into(),
            extra: Map::new(),
        }
    }
}

/// A single table cell.
///
/// The kind is fixed at creation; the value changes through the table
/// engine. Keys this type does not model are kept in `extra` so a document
/// written back replaces the server copy without losing anything.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    #[serde(rename = "type", default)]
    kind: CellKind,
    #[serde(default, skip_serializing_if = "CellValue::is_null")]
    pub value: CellValue,
    #[serde(
        default,
        deserialize_with = "nullable_default",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub options: Vec<DropdownOption>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formula: Option<String>,
    #[serde(rename = "computeType", default, skip_serializing_if = "Option::is_none")]
    pub compute_type: Option<String>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub disabled: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Formula marker for a label cell holding the product of its row
pub const PRODUCT_FORMULA: &str = "*";

impl Cell {
    pub fn new(kind: CellKind, value: impl Into<CellValue>) -> Self {
        Cell {
            kind,
            value: value.into(),
            options: Vec::new(),
            formula: None,
            compute_type: None,
            disabled: false,
            extra: Map::new(),
        }
    }

    /// A label cell computed as the product of its row's numeric cells
    pub fn product() -> Self {
        let mut cell = Cell::new(CellKind::Label, "");
        cell.formula = Some(PRODUCT_FORMULA.to_string());
        cell
    }

    pub fn dropdown(value: impl Into<CellValue>, options: Vec<DropdownOption>) -> Self {
        let mut cell = Cell::new(CellKind::Dropdown, value);
        cell.options = options;
        cell
    }

    pub fn kind(&self) -> CellKind {
        self.kind
    }

    /// Label cells flagged with the product formula
    pub fn is_computed(&self) -> bool {
        self.kind == CellKind::Label && self.formula.as_deref() == Some(PRODUCT_FORMULA)
    }

    pub fn text(&self) -> String {
        self.value.as_text()
    }

    /// The label shown for this cell's value: the matching option's label
    /// for dropdowns, the plain text otherwise.
    pub fn display_text(&self) -> String {
        if self.kind == CellKind::Dropdown
            && let Some(opt) = self.options.iter().find(|o| o.value == self.value)
        {
            return opt.label.as_text();
        }
        self.text()
    }
}
