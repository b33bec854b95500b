use serde::Serialize;
use serde_json::Value;

use crate::api::client::{ApiRequest, FormPart};
use crate::api::session::AuthSession;
use crate::model::activity::{ChecklistItem, ChecklistKind, Measurement};
use crate::model::cell::{CellKind, CellValue};
use crate::model::doc_tree::{DocNode, DocTree};
use crate::model::user::User;
use crate::ops::checklist_ops::{date_range, display_date, is_checked};
use crate::ops::table_ops::{FinalTotal, TableEngine};
use crate::ops::validate::FieldError;
use crate::util::unicode::{column_widths, pad_to_width};

// ---------------------------------------------------------------------------
// JSON output structs
// ---------------------------------------------------------------------------

#[derive(Serialize)]
pub struct TableJson {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
    pub is_multi: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub final_total: Option<FinalTotal>,
}

#[derive(Serialize)]
pub struct ItemJson {
    pub name: String,
    pub kind: ChecklistKind,
    pub value: Value,
    pub disabled: bool,
}

#[derive(Serialize)]
pub struct RowJson {
    pub row: usize,
}

#[derive(Serialize)]
pub struct WhoamiJson {
    pub signed_in: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

#[derive(Serialize)]
pub struct FieldErrorsJson<'a> {
    pub valid: bool,
    pub errors: &'a [FieldError],
}

// ---------------------------------------------------------------------------
// Conversions
// ---------------------------------------------------------------------------

fn column_count(engine: &TableEngine) -> usize {
    engine
        .rows()
        .iter()
        .map(Vec::len)
        .chain(std::iter::once(engine.headers().len()))
        .max()
        .unwrap_or(0)
}

pub fn table_to_json(engine: &TableEngine) -> TableJson {
    TableJson {
        headers: (0..column_count(engine))
            .map(|c| engine.column_label(c))
            .collect(),
        rows: engine
            .rows()
            .iter()
            .map(|row| row.iter().map(|c| c.display_text()).collect())
            .collect(),
        is_multi: engine.is_multi(),
        final_total: engine.final_total(),
    }
}

pub fn item_to_json(item: &ChecklistItem) -> ItemJson {
    ItemJson {
        name: item.name.clone(),
        kind: item.kind,
        value: item.value.clone(),
        disabled: item.disabled,
    }
}

pub fn whoami_to_json(session: &AuthSession) -> WhoamiJson {
    WhoamiJson {
        signed_in: session.is_authenticated(),
        name: session.name().map(str::to_string),
        role: session.role().map(|r| r.to_string()),
    }
}

/// A copy of `req` safe to print: the bearer token is masked.
pub fn redact(req: &ApiRequest) -> ApiRequest {
    let mut out = req.clone();
    if out.authorization.is_some() {
        out.authorization = Some("Bearer ***".to_string());
    }
    out
}

// ---------------------------------------------------------------------------
// Text formatting
// ---------------------------------------------------------------------------

fn align(grid: &[Vec<String>]) -> Vec<String> {
    let widths = column_widths(grid);
    grid.iter()
        .map(|row| {
            row.iter()
                .enumerate()
                .map(|(i, cell)| pad_to_width(cell, widths[i]))
                .collect::<Vec<_>>()
                .join("  ")
                .trim_end()
                .to_string()
        })
        .collect()
}

/// Format a table with a 1-based row number column, then its total.
pub fn format_table(engine: &TableEngine) -> Vec<String> {
    let cols = column_count(engine);
    let mut grid = Vec::with_capacity(engine.rows().len() + 1);
    let mut header = vec!["#".to_string()];
    header.extend((0..cols).map(|c| engine.column_label(c)));
    grid.push(header);
    for (i, row) in engine.rows().iter().enumerate() {
        let mut line = vec![(i + 1).to_string()];
        line.extend(row.iter().map(|cell| match cell.kind() {
            CellKind::Image if cell.value.as_text().is_empty() => "-".to_string(),
            _ => cell.display_text(),
        }));
        grid.push(line);
    }

    let mut lines = align(&grid);
    if engine.rows().is_empty() {
        lines.push("(no rows)".to_string());
    }
    if let Some(total) = engine.final_total() {
        lines.push(String::new());
        lines.push(format!("Total: {}", total));
    }
    lines
}

/// Format a document tree, folders first-seen order, two spaces per level.
pub fn format_tree(tree: &DocTree, mark_hidden: bool) -> Vec<String> {
    let mut lines = Vec::new();
    for node in tree.roots() {
        push_node(node, 0, mark_hidden, &mut lines);
    }
    if lines.is_empty() {
        lines.push("(empty)".to_string());
    }
    lines
}

fn push_node(node: &DocNode, depth: usize, mark_hidden: bool, lines: &mut Vec<String>) {
    let indent = "  ".repeat(depth);
    match node {
        DocNode::Folder { name, children } => {
            lines.push(format!("{}{}/", indent, name));
            for child in children.iter() {
                push_node(child, depth + 1, mark_hidden, lines);
            }
        }
        DocNode::File { name, hidden, .. } => {
            let suffix = if *hidden && mark_hidden { " (hidden)" } else { "" };
            lines.push(format!("{}{}{}", indent, name, suffix));
        }
    }
}

fn option_label(item: &ChecklistItem, value: &Value) -> String {
    let wanted: CellValue = serde_json::from_value(value.clone()).unwrap_or_default();
    item.options
        .iter()
        .find(|o| o.value == wanted)
        .map(|o| o.label.as_text())
        .unwrap_or_else(|| wanted.as_text())
}

/// One line per checklist item
pub fn format_item(item: &ChecklistItem) -> String {
    let body = match item.kind {
        ChecklistKind::Checkbox => {
            let mark = if is_checked(&item.value) { "x" } else { " " };
            format!("[{}] {}", mark, item.name)
        }
        ChecklistKind::Dropdown => {
            let shown = match &item.value {
                Value::Array(values) => values
                    .iter()
                    .map(|v| option_label(item, v))
                    .collect::<Vec<_>>()
                    .join(", "),
                Value::Null => String::new(),
                v => option_label(item, v),
            };
            format!("{}: {}", item.name, if shown.is_empty() { "-" } else { shown.as_str() })
        }
        ChecklistKind::DateRange => {
            let range = date_range(item);
            format!(
                "{}: from {} to {}",
                item.name,
                display_date(&range.from),
                display_date(&range.to)
            )
        }
        ChecklistKind::Table => {
            let rows = item
                .value
                .as_array()
                .map(|rows| rows.len().saturating_sub(1))
                .unwrap_or(0);
            format!("{}: table, {} rows", item.name, rows)
        }
        ChecklistKind::FileUpload => match item.value.as_str() {
            Some(path) if !path.is_empty() => format!("{}: {}", item.name, path),
            _ => format!("{}: (no file)", item.name),
        },
    };
    if item.disabled {
        format!("{} (disabled)", body)
    } else {
        body
    }
}

pub fn format_measurement(measurement: &Measurement) -> Vec<String> {
    match measurement {
        Measurement::Lot(lot) => {
            let mut line = format!(
                "{}: {}",
                lot.name.as_deref().unwrap_or("LOT"),
                if lot.value.as_text().is_empty() {
                    "-".to_string()
                } else {
                    lot.value.as_text()
                }
            );
            if let Some(uom) = &lot.uom {
                line.push(' ');
                line.push_str(uom);
            }
            if lot.disabled {
                line.push_str(" (disabled)");
            }
            vec![line]
        }
        Measurement::Table(doc) => {
            let mut lines = Vec::new();
            if let Some(name) = &doc.name {
                let uom = doc.uom.as_deref().map(|u| format!(" ({})", u)).unwrap_or_default();
                lines.push(format!("{}{}", name, uom));
            }
            lines.extend(format_table(&TableEngine::from_doc(doc)));
            lines
        }
        Measurement::SameAsPo => vec!["Same as PO".to_string()],
        Measurement::Unsupported(_) => vec!["Measurement type not supported yet.".to_string()],
    }
}

pub fn format_request(req: &ApiRequest) -> Vec<String> {
    let req = redact(req);
    let mut lines = vec![format!("{} {}", req.method, req.url)];
    if !req.query.is_empty() {
        let query: Vec<String> = req.query.iter().map(|(k, v)| format!("{}={}", k, v)).collect();
        lines.push(format!("query: {}", query.join("&")));
    }
    lines.push(format!("timeout: {}s", req.timeout_secs));
    if let Some(auth) = &req.authorization {
        lines.push(format!("authorization: {}", auth));
    }
    for part in &req.multipart {
        match part {
            FormPart::Text { name, value } => lines.push(format!("form {}: {}", name, value)),
            FormPart::File {
                name,
                path,
                filename,
                mime,
            } => lines.push(format!(
                "form {}: {} ({}) from {}",
                name,
                filename,
                mime,
                path.display()
            )),
        }
    }
    if let Some(body) = &req.body {
        let pretty = serde_json::to_string_pretty(body).unwrap_or_else(|_| body.to_string());
        lines.extend(pretty.lines().map(str::to_string));
    }
    lines
}

pub fn format_field_errors(errors: &[FieldError]) -> Vec<String> {
    errors
        .iter()
        .map(|e| format!("{}: {}", e.field, e.message))
        .collect()
}

/// One aligned line per user: name, phone, role, and an inactive marker.
pub fn format_users(users: &[&User]) -> Vec<String> {
    if users.is_empty() {
        return vec!["No users found".to_string()];
    }
    let grid: Vec<Vec<String>> = users
        .iter()
        .map(|u| {
            vec![
                u.name.clone(),
                u.phone.clone(),
                u.role.to_string(),
                if u.is_active { "" } else { "inactive" }.to_string(),
            ]
        })
        .collect();
    align(&grid)
}
