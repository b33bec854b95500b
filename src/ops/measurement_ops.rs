use serde_json::Value;

use crate::model::activity::{Activity, LotMeasurement, Measurement, SAME_AS_PO};
use crate::model::cell::CellValue;
use crate::ops::checklist_ops::EditOutcome;
use crate::util::numeric::sanitize_number;

#[derive(Debug, thiserror::Error)]
pub enum MeasurementError {
    #[error("activity has no measurement")]
    Missing,
    #[error("measurement is SAME_AS_PO but the activity has no PO value")]
    MissingPo,
    #[error("PO entry {0} out of range")]
    PoOutOfRange(usize),
    #[error("malformed measurement: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// The activity's measurement, ready for editing.
///
/// A `SAME_AS_PO` measurement becomes a blank template of the PO value.
/// When the PO value holds several entries the first one is used.
pub fn resolve_measurement(activity: &Activity) -> Result<Measurement, MeasurementError> {
    let raw = activity.raw_measurement().ok_or(MeasurementError::Missing)?;
    if raw.is_null() {
        return Err(MeasurementError::Missing);
    }
    if raw.as_str() != Some(SAME_AS_PO) {
        return Ok(Measurement::from_value(raw)?);
    }

    let po = activity
        .po_value
        .as_ref()
        .filter(|po| !is_empty_po(po))
        .ok_or(MeasurementError::MissingPo)?;
    let template = template_from_po(po);
    let first = match &template {
        Value::Array(entries) => entries.first().ok_or(MeasurementError::MissingPo)?,
        other => other,
    };
    tracing::debug!("measurement resolved from PO value");
    Ok(Measurement::from_value(first)?)
}

fn is_empty_po(po: &Value) -> bool {
    match po {
        Value::Null => true,
        Value::Array(entries) => entries.is_empty(),
        _ => false,
    }
}

/// Store an edited measurement back on the activity, under whichever key
/// the document used.
pub fn store_measurement(
    activity: &mut Activity,
    measurement: &Measurement,
) -> Result<(), MeasurementError> {
    let value = measurement.to_value()?;
    if activity.measurement.is_none() && activity.extra.contains_key("measurements") {
        activity.extra.insert("measurements".to_string(), value);
    } else {
        activity.measurement = Some(value);
    }
    Ok(())
}

/// A blank copy of a PO value to measure against.
///
/// Every object loses its `value` key, except label cells and disabled
/// objects, which keep theirs as is. A `value` holding an object or an
/// array is blanked recursively instead of dropped. The resulting table
/// (or each entry, for a list of tables) is single-row.
pub fn template_from_po(po: &Value) -> Value {
    let mut template = strip_values(po);
    match &mut template {
        Value::Object(table) => {
            table.insert("isMulti".to_string(), Value::Bool(false));
        }
        Value::Array(entries) => {
            for entry in entries.iter_mut() {
                if let Value::Object(table) = entry {
                    table.insert("isMulti".to_string(), Value::Bool(false));
                }
            }
        }
        _ => {}
    }
    template
}

fn strip_values(value: &Value) -> Value {
    match value {
        Value::Array(items) => Value::Array(items.iter().map(strip_values).collect()),
        Value::Object(obj) => {
            let keeps_value = obj.get("type").and_then(Value::as_str) == Some("label")
                || obj.get("disabled") == Some(&Value::Bool(true));
            let mut out = serde_json::Map::with_capacity(obj.len());
            for (key, v) in obj {
                if key == "value" {
                    if keeps_value {
                        out.insert(key.clone(), v.clone());
                    } else if v.is_object() || v.is_array() {
                        out.insert(key.clone(), strip_values(v));
                    }
                } else {
                    out.insert(key.clone(), strip_values(v));
                }
            }
            Value::Object(out)
        }
        other => other.clone(),
    }
}

/// The PO entry at `index`. A single-object PO value is entry 0.
pub fn po_entry_mut(activity: &mut Activity, index: usize) -> Result<&mut Value, MeasurementError> {
    match activity.po_value.as_mut() {
        Some(Value::Array(entries)) => entries
            .get_mut(index)
            .ok_or(MeasurementError::PoOutOfRange(index)),
        Some(entry) if index == 0 && entry.is_object() => Ok(entry),
        _ => Err(MeasurementError::PoOutOfRange(index)),
    }
}

/// Set a LOT measurement's value from user input, keeping only digits and
/// the first decimal point. Disabled lots reject the edit.
pub fn set_lot_value(lot: &mut LotMeasurement, raw: &str) -> EditOutcome {
    if lot.disabled {
        tracing::debug!(name = ?lot.name, "lot edit rejected: disabled");
        return EditOutcome::Rejected;
    }
    lot.value = CellValue::Text(sanitize_number(raw));
    EditOutcome::Applied
}
