use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use indexmap::IndexMap;
use serde::Serialize;

use crate::model::cell::{Cell, CellKind, CellValue};
use crate::model::table::{FinalTotalMode, TableDoc};
use crate::util::numeric::{format_number, sanitize_number};

/// Error type for table operations
#[derive(Debug, PartialEq, thiserror::Error)]
pub enum TableError {
    #[error("row {0} out of range")]
    RowOutOfRange(usize),
    #[error("cell ({row}, {col}) out of range")]
    CellOutOfRange { row: usize, col: usize },
    #[error("{value:?} is not an option of cell ({row}, {col})")]
    UnknownOption { row: usize, col: usize, value: String },
    #[error("cell ({row}, {col}) is a {kind} cell, not a file cell")]
    NotAFileCell { row: usize, col: usize, kind: CellKind },
    #[error("upload of {name} failed: {message}")]
    UploadFailed { name: String, message: String },
}

/// The aggregate shown under a table
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FinalTotal {
    Sum(f64),
    /// Sums keyed by each row's first cell, in first-seen order
    ByName(IndexMap<String, f64>),
}

impl fmt::Display for FinalTotal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FinalTotal::Sum(n) => write!(f, "{}", format_number(*n)),
            FinalTotal::ByName(groups) => {
                let parts: Vec<String> = groups
                    .iter()
                    .map(|(k, v)| format!("{}: {}", k, format_number(*v)))
                    .collect();
                write!(f, "{}", parts.join(", "))
            }
        }
    }
}

/// A local file waiting to be uploaded into an image cell
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedFile {
    pub row: usize,
    pub col: usize,
    pub name: String,
    pub local_path: PathBuf,
}

/// In-memory editor for a schema-driven table.
///
/// Holds the header row, the template row and the editable rows (the
/// template is also the first editable row). Every edit leaves the rows
/// ready to be written back wholesale with [`TableEngine::data`].
#[derive(Debug, Clone)]
pub struct TableEngine {
    headers: Vec<Cell>,
    template: Vec<Cell>,
    rows: Vec<Vec<Cell>>,
    is_multi: bool,
    final_total: Option<FinalTotalMode>,
    staged: BTreeMap<(usize, usize), StagedFile>,
}

impl TableEngine {
    /// Build from `[headers, template, ...rows]`.
    pub fn new(data: Vec<Vec<Cell>>, is_multi: bool, final_total: Option<FinalTotalMode>) -> Self {
        let mut iter = data.into_iter();
        let headers = iter.next().unwrap_or_default();
        let rows: Vec<Vec<Cell>> = iter.collect();
        let template = rows.first().cloned().unwrap_or_default();
        TableEngine {
            headers,
            template,
            rows,
            is_multi,
            final_total,
            staged: BTreeMap::new(),
        }
    }

    pub fn from_doc(doc: &TableDoc) -> Self {
        TableEngine::new(doc.data.clone(), doc.is_multi, doc.final_total_mode())
    }

    pub fn headers(&self) -> &[Cell] {
        &self.headers
    }

    pub fn template(&self) -> &[Cell] {
        &self.template
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    pub fn is_multi(&self) -> bool {
        self.is_multi
    }

    /// Header text for a column, or `Col N` when the header row is short
    pub fn column_label(&self, col: usize) -> String {
        match self.headers.get(col).map(Cell::text) {
            Some(text) if !text.is_empty() => text,
            _ => format!("Col {}", col + 1),
        }
    }

    /// Append a fresh copy of the template row.
    ///
    /// Input cells start empty; label cells keep the template's text.
    /// Returns the new row's index, or `None` when the table is not
    /// multi-row or has no template.
    pub fn add_row(&mut self) -> Option<usize> {
        if !self.is_multi || self.template.is_empty() {
            tracing::debug!(is_multi = self.is_multi, "add_row ignored");
            return None;
        }
        let row: Vec<Cell> = self
            .template
            .iter()
            .map(|cell| {
                let mut fresh = cell.clone();
                if cell.kind() != CellKind::Label {
                    fresh.value = CellValue::empty();
                }
                fresh
            })
            .collect();
        self.rows.push(row);
        Some(self.rows.len() - 1)
    }

    /// Delete the row at `row`. Any row may be removed, including the first.
    pub fn remove_row(&mut self, row: usize) -> Result<Vec<Cell>, TableError> {
        if row >= self.rows.len() {
            return Err(TableError::RowOutOfRange(row));
        }
        let removed = self.rows.remove(row);

        // Staged files follow their rows
        let staged = std::mem::take(&mut self.staged);
        self.staged = staged
            .into_values()
            .filter(|f| f.row != row)
            .map(|mut f| {
                if f.row > row {
                    f.row -= 1;
                }
                ((f.row, f.col), f)
            })
            .collect();

        tracing::debug!(row, remaining = self.rows.len(), "row removed");
        Ok(removed)
    }

    /// Set a cell's value and recompute the row's formula cells.
    ///
    /// Number cells keep only digits and the first decimal point. Dropdown
    /// cells with options take the matching option's value, so a typed `5`
    /// stores the number 5; an empty value clears the pick. Other kinds
    /// store the value as given.
    pub fn update_cell(
        &mut self,
        row: usize,
        col: usize,
        raw: impl Into<CellValue>,
    ) -> Result<(), TableError> {
        let cells = self
            .rows
            .get_mut(row)
            .ok_or(TableError::CellOutOfRange { row, col })?;
        let cell = cells
            .get_mut(col)
            .ok_or(TableError::CellOutOfRange { row, col })?;
        let raw = raw.into();
        cell.value = match cell.kind() {
            CellKind::Number => CellValue::Text(sanitize_number(&raw.as_text())),
            CellKind::Dropdown if !cell.options.is_empty() && !raw.as_text().is_empty() => {
                let text = raw.as_text();
                cell.options
                    .iter()
                    .find(|o| o.value == raw || o.value.as_text() == text)
                    .map(|o| o.value.clone())
                    .ok_or(TableError::UnknownOption {
                        row,
                        col,
                        value: text,
                    })?
            }
            CellKind::Label | CellKind::Text | CellKind::Dropdown | CellKind::Image => raw,
        };
        recompute_row(cells);
        Ok(())
    }

    /// The full `[headers, ...rows]` shape for write-back
    pub fn data(&self) -> Vec<Vec<Cell>> {
        let mut out = Vec::with_capacity(self.rows.len() + 1);
        out.push(self.headers.clone());
        out.extend(self.rows.iter().cloned());
        out
    }

    /// Replace a document's rows with the engine's
    pub fn write_into(&self, doc: &mut TableDoc) {
        doc.data = self.data();
    }

    /// The table's aggregate, if it declares one.
    pub fn final_total(&self) -> Option<FinalTotal> {
        match self.final_total? {
            FinalTotalMode::Total => Some(FinalTotal::Sum(
                self.rows.iter().map(|row| row_total(row)).sum(),
            )),
            FinalTotalMode::Name => {
                let mut groups: IndexMap<String, f64> = IndexMap::new();
                for row in &self.rows {
                    // Rows without a computed cell have nothing to group
                    let Some(computed) = row.iter().find(|c| c.is_computed()) else {
                        continue;
                    };
                    let key = row.first().map(Cell::text).unwrap_or_default();
                    let value = computed.value.as_number().unwrap_or(0.0);
                    *groups.entry(key).or_insert(0.0) += value;
                }
                Some(FinalTotal::ByName(groups))
            }
        }
    }

    // -----------------------------------------------------------------------
    // Staged files for image cells
    // -----------------------------------------------------------------------

    /// Record a local file to upload into an image cell on commit.
    /// Staging the same cell twice keeps the latest file.
    pub fn stage_file(
        &mut self,
        row: usize,
        col: usize,
        local_path: impl Into<PathBuf>,
    ) -> Result<(), TableError> {
        let cell = self
            .rows
            .get(row)
            .and_then(|r| r.get(col))
            .ok_or(TableError::CellOutOfRange { row, col })?;
        if cell.kind() != CellKind::Image {
            return Err(TableError::NotAFileCell {
                row,
                col,
                kind: cell.kind(),
            });
        }
        let local_path = local_path.into();
        let name = local_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.staged.insert(
            (row, col),
            StagedFile {
                row,
                col,
                name,
                local_path,
            },
        );
        Ok(())
    }

    pub fn staged(&self) -> impl Iterator<Item = &StagedFile> {
        self.staged.values()
    }

    /// Upload every staged file and store the returned storage paths in
    /// their cells. The first failure aborts the commit and leaves the
    /// engine exactly as it was. Returns the number of cells updated.
    pub fn commit_staged<F, E>(&mut self, mut upload: F) -> Result<usize, TableError>
    where
        F: FnMut(&StagedFile) -> Result<String, E>,
        E: fmt::Display,
    {
        let mut rows = self.rows.clone();
        for file in self.staged.values() {
            let stored = upload(file).map_err(|e| TableError::UploadFailed {
                name: file.name.clone(),
                message: e.to_string(),
            })?;
            if let Some(cell) = rows.get_mut(file.row).and_then(|r| r.get_mut(file.col)) {
                cell.value = CellValue::Text(stored);
            }
        }
        let count = self.staged.len();
        self.rows = rows;
        self.staged.clear();
        Ok(count)
    }
}

/// Recompute every product-formula cell in `row`.
///
/// The product covers number and dropdown cells whose value is a finite
/// number; with no such cells it is 1. A non-finite product renders empty.
pub fn recompute_row(row: &mut [Cell]) {
    let product: f64 = row
        .iter()
        .filter(|c| c.kind().is_factor())
        .filter_map(|c| c.value.as_number())
        .product();
    let rendered = if product.is_finite() {
        format_number(product)
    } else {
        String::new()
    };
    for cell in row.iter_mut().filter(|c| c.is_computed()) {
        cell.value = CellValue::Text(rendered.clone());
    }
}

/// A row's contribution to a `total` aggregate: its computed value when
/// set, otherwise the product of its number cells (empty counts as 0).
fn row_total(row: &[Cell]) -> f64 {
    if let Some(computed) = row.iter().find(|c| c.is_computed())
        && computed.value.is_truthy()
    {
        return computed.value.as_number().unwrap_or(0.0);
    }
    let factors: Vec<f64> = row
        .iter()
        .filter(|c| c.kind() == CellKind::Number)
        .map(|c| c.value.as_number().unwrap_or(0.0))
        .collect();
    if factors.is_empty() {
        0.0
    } else {
        factors.iter().product()
    }
}
