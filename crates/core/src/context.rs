// Bounded, read-only snapshot of the current selection.
//
// Matrices are capped to a fixed extent to keep assist payloads small;
// the true selection dimensions are always reported uncapped.

use serde::{Deserialize, Serialize};

/// Maximum rows carried in the capped matrices.
pub const MAX_CONTEXT_ROWS: usize = 10;

/// Maximum columns carried in the capped matrices.
pub const MAX_CONTEXT_COLS: usize = 10;

/// One cell value as captured from the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellScalar {
    Number(f64),
    Bool(bool),
    Text(String),
    Empty,
}

impl CellScalar {
    pub fn is_empty(&self) -> bool {
        match self {
            CellScalar::Empty => true,
            CellScalar::Text(s) => s.is_empty(),
            _ => false,
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, CellScalar::Number(_))
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            CellScalar::Number(n) => Some(*n),
            _ => None,
        }
    }
}

impl Default for CellScalar {
    fn default() -> Self {
        CellScalar::Empty
    }
}

/// Snapshot of spreadsheet state at utterance submission time.
///
/// Created fresh per utterance, never mutated after creation, never
/// written back to the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpreadsheetContext {
    /// Active worksheet name (empty when degraded).
    pub worksheet: String,
    /// Selection address in A1 notation, uncapped (empty when degraded).
    pub address: String,
    /// True selection row count, uncapped.
    pub row_count: usize,
    /// True selection column count, uncapped.
    pub column_count: usize,
    /// Typed values, capped to MAX_CONTEXT_ROWS x MAX_CONTEXT_COLS.
    pub values: Vec<Vec<CellScalar>>,
    /// Display text, same capped extent as `values`.
    pub display: Vec<Vec<String>>,
    /// True when the capped matrices cover less than the true selection.
    pub truncated: bool,
}

impl SpreadsheetContext {
    /// Fully degraded context: empty name, zero dimensions, empty matrices.
    /// Used when the host read fails, so downstream tiers stay callable.
    pub fn empty() -> Self {
        Self {
            worksheet: String::new(),
            address: String::new(),
            row_count: 0,
            column_count: 0,
            values: Vec::new(),
            display: Vec::new(),
            truncated: false,
        }
    }

    pub fn capped_rows(&self) -> usize {
        self.values.len()
    }

    pub fn capped_cols(&self) -> usize {
        self.values.first().map(Vec::len).unwrap_or(0)
    }

    /// True if any captured cell holds a non-empty value.
    pub fn has_data(&self) -> bool {
        self.values.iter().flatten().any(|c| !c.is_empty())
    }

    /// Fraction of non-empty captured cells that are numeric.
    pub fn numeric_ratio(&self) -> f64 {
        let mut non_empty = 0usize;
        let mut numeric = 0usize;
        for cell in self.values.iter().flatten() {
            if !cell.is_empty() {
                non_empty += 1;
                if cell.is_numeric() {
                    numeric += 1;
                }
            }
        }
        if non_empty == 0 {
            0.0
        } else {
            numeric as f64 / non_empty as f64
        }
    }

    /// True when the captured data is predominantly numeric.
    pub fn looks_numeric(&self) -> bool {
        self.numeric_ratio() > 0.5
    }

    /// Heuristic: first row is text while the second row carries numbers.
    pub fn has_header_row(&self) -> bool {
        if self.values.len() < 2 {
            return false;
        }
        let first_text = self.values[0]
            .iter()
            .any(|c| matches!(c, CellScalar::Text(s) if !s.trim().is_empty()));
        let second_numeric = self.values[1].iter().any(CellScalar::is_numeric);
        first_text && second_numeric
    }

    /// Format the snapshot as structured text for an assist prompt.
    pub fn to_prompt_text(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!("Sheet: {}\n", self.worksheet));
        out.push_str(&format!("Range: {}\n", self.address));
        out.push_str(&format!(
            "Size: {} rows x {} columns\n",
            self.row_count, self.column_count
        ));
        if self.truncated {
            out.push_str(&format!(
                "(data below truncated to {}x{})\n",
                self.capped_rows(),
                self.capped_cols()
            ));
        }
        out.push_str("Data:\n");
        for row in &self.display {
            out.push_str(&row.join("\t"));
            out.push('\n');
        }
        out
    }
}
