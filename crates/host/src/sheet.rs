// In-memory grid host.
//
// Holds cells sparsely, tracks selection, tables, charts and frozen panes.
// This is the live host for the CLI and the test double for the engine.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use gridmind_core::{CellRef, CellScalar, ChartKind, RangeRef};

use crate::cell::{Cell, CellContent, CellStyle};
use crate::{HostError, SpreadsheetHost};

/// A chart anchored to the sheet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartInfo {
    pub kind: ChartKind,
    pub range: RangeRef,
    pub title: String,
}

/// Sparse in-memory worksheet.
#[derive(Debug, Clone)]
pub struct GridSheet {
    pub name: String,
    cells: HashMap<(usize, usize), Cell>,
    selection: Option<RangeRef>,
    tables: Vec<RangeRef>,
    charts: Vec<ChartInfo>,
    frozen: Option<CellRef>,
    revision: u64,
}

impl GridSheet {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            cells: HashMap::new(),
            selection: None,
            tables: Vec::new(),
            charts: Vec::new(),
            frozen: None,
            revision: 0,
        }
    }

    /// Build a sheet from raw row data starting at A1, selecting the
    /// populated extent.
    pub fn from_rows(name: impl Into<String>, rows: &[Vec<String>]) -> Self {
        let mut sheet = Self::new(name);
        for (r, row) in rows.iter().enumerate() {
            for (c, input) in row.iter().enumerate() {
                sheet.set_input(r, c, input);
            }
        }
        sheet.selection = sheet.used_range();
        sheet
    }

    /// Set one cell from raw input text (numbers, text, '=' formulas).
    pub fn set_input(&mut self, row: usize, col: usize, input: &str) {
        let content = CellContent::from_input(input);
        if content.is_empty() {
            if let Some(cell) = self.cells.get_mut(&(row, col)) {
                cell.content = CellContent::Empty;
            }
        } else {
            self.cells.entry((row, col)).or_default().content = content;
        }
        self.revision += 1;
    }

    pub fn set_selection(&mut self, range: RangeRef) {
        self.selection = Some(range);
    }

    /// Drop the selection entirely, as when the user clicks away.
    pub fn clear_selection(&mut self) {
        self.selection = None;
    }

    /// Bounding box of all non-empty cells, if any.
    pub fn used_range(&self) -> Option<RangeRef> {
        let mut bounds: Option<(usize, usize, usize, usize)> = None;
        for (&(r, c), cell) in &self.cells {
            if cell.content.is_empty() && cell.style.is_default() {
                continue;
            }
            bounds = Some(match bounds {
                None => (r, c, r, c),
                Some((r0, c0, r1, c1)) => (r0.min(r), c0.min(c), r1.max(r), c1.max(c)),
            });
        }
        bounds.map(|(r0, c0, r1, c1)| {
            RangeRef::new(CellRef::new(r0, c0), CellRef::new(r1, c1))
        })
    }

    pub fn cell(&self, row: usize, col: usize) -> Option<&Cell> {
        self.cells.get(&(row, col))
    }

    pub fn display_at(&self, row: usize, col: usize) -> String {
        self.cells
            .get(&(row, col))
            .map(Cell::display)
            .unwrap_or_default()
    }

    pub fn tables(&self) -> &[RangeRef] {
        &self.tables
    }

    pub fn charts(&self) -> &[ChartInfo] {
        &self.charts
    }

    pub fn frozen(&self) -> Option<CellRef> {
        self.frozen
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    fn style_range<F>(&mut self, range: &RangeRef, mut apply: F)
    where
        F: FnMut(&mut CellStyle),
    {
        for cell_ref in range.cells() {
            let cell = self.cells.entry((cell_ref.row, cell_ref.col)).or_default();
            apply(&mut cell.style);
        }
        self.revision += 1;
    }
}

/// Sort rank: numbers, then text, then bools; empty cells always last
/// regardless of direction.
fn sort_rank(content: &CellContent) -> u8 {
    match content {
        CellContent::Number(_) => 0,
        CellContent::Text(_) => 1,
        CellContent::Bool(_) => 2,
        CellContent::Empty | CellContent::Formula { .. } => 3,
    }
}

fn compare_cells(a: &CellContent, b: &CellContent, ascending: bool) -> std::cmp::Ordering {
    use std::cmp::Ordering;

    let (ra, rb) = (sort_rank(a), sort_rank(b));
    // Empty cells sink to the bottom in both directions.
    if ra == 3 || rb == 3 {
        return ra.cmp(&rb);
    }

    let ord = match ra.cmp(&rb) {
        Ordering::Equal => match (a, b) {
            (CellContent::Number(x), CellContent::Number(y)) => {
                x.partial_cmp(y).unwrap_or(Ordering::Equal)
            }
            (CellContent::Text(x), CellContent::Text(y)) => {
                x.to_lowercase().cmp(&y.to_lowercase())
            }
            (CellContent::Bool(x), CellContent::Bool(y)) => x.cmp(y),
            _ => Ordering::Equal,
        },
        other => other,
    };

    if ascending {
        ord
    } else {
        ord.reverse()
    }
}

impl SpreadsheetHost for GridSheet {
    fn worksheet_name(&self) -> Result<String, HostError> {
        Ok(self.name.clone())
    }

    fn selection(&self) -> Result<Option<RangeRef>, HostError> {
        Ok(self.selection)
    }

    fn read_values(&self, range: &RangeRef) -> Result<Vec<Vec<CellScalar>>, HostError> {
        let mut out = Vec::with_capacity(range.rows());
        for row in range.start.row..=range.end.row {
            let mut cols = Vec::with_capacity(range.cols());
            for col in range.start.col..=range.end.col {
                cols.push(
                    self.cells
                        .get(&(row, col))
                        .map(|c| c.content.to_scalar())
                        .unwrap_or(CellScalar::Empty),
                );
            }
            out.push(cols);
        }
        Ok(out)
    }

    fn read_displays(&self, range: &RangeRef) -> Result<Vec<Vec<String>>, HostError> {
        let mut out = Vec::with_capacity(range.rows());
        for row in range.start.row..=range.end.row {
            let mut cols = Vec::with_capacity(range.cols());
            for col in range.start.col..=range.end.col {
                cols.push(self.display_at(row, col));
            }
            out.push(cols);
        }
        Ok(out)
    }

    fn read_formula(&self, cell: &CellRef) -> Result<Option<String>, HostError> {
        Ok(match self.cells.get(&(cell.row, cell.col)) {
            Some(Cell { content: CellContent::Formula { source }, .. }) => Some(source.clone()),
            _ => None,
        })
    }

    fn write_values(
        &mut self,
        range: &RangeRef,
        values: &[Vec<CellScalar>],
    ) -> Result<(), HostError> {
        if values.len() != range.rows() || values.iter().any(|r| r.len() != range.cols()) {
            return Err(HostError::Apply(format!(
                "Value matrix does not match range {}",
                range
            )));
        }
        for (r, row) in values.iter().enumerate() {
            for (c, value) in row.iter().enumerate() {
                let content = match value {
                    CellScalar::Empty => CellContent::Empty,
                    CellScalar::Number(n) => CellContent::Number(*n),
                    CellScalar::Bool(b) => CellContent::Bool(*b),
                    CellScalar::Text(s) => CellContent::Text(s.clone()),
                };
                let key = (range.start.row + r, range.start.col + c);
                if content.is_empty() {
                    if let Some(cell) = self.cells.get_mut(&key) {
                        cell.content = CellContent::Empty;
                    }
                } else {
                    self.cells.entry(key).or_default().content = content;
                }
            }
        }
        self.revision += 1;
        Ok(())
    }

    fn write_formula(&mut self, cell: &CellRef, formula: &str) -> Result<(), HostError> {
        if !formula.starts_with('=') {
            return Err(HostError::Apply(format!(
                "Not a formula: {}",
                formula
            )));
        }
        self.cells.entry((cell.row, cell.col)).or_default().content =
            CellContent::Formula { source: formula.to_string() };
        self.revision += 1;
        Ok(())
    }

    fn set_number_format(&mut self, range: &RangeRef, pattern: &str) -> Result<(), HostError> {
        let pattern = pattern.to_string();
        self.style_range(range, |style| style.number_format = Some(pattern.clone()));
        Ok(())
    }

    fn set_bold(&mut self, range: &RangeRef, on: bool) -> Result<(), HostError> {
        self.style_range(range, |style| style.bold = on);
        Ok(())
    }

    fn set_italic(&mut self, range: &RangeRef, on: bool) -> Result<(), HostError> {
        self.style_range(range, |style| style.italic = on);
        Ok(())
    }

    fn set_fill_color(&mut self, range: &RangeRef, color: &str) -> Result<(), HostError> {
        let color = color.to_string();
        self.style_range(range, |style| style.fill_color = Some(color.clone()));
        Ok(())
    }

    fn clear(&mut self, range: &RangeRef) -> Result<(), HostError> {
        for cell_ref in range.cells() {
            self.cells.remove(&(cell_ref.row, cell_ref.col));
        }
        self.revision += 1;
        Ok(())
    }

    fn add_chart(
        &mut self,
        kind: ChartKind,
        range: &RangeRef,
        title: &str,
    ) -> Result<(), HostError> {
        self.charts.push(ChartInfo { kind, range: *range, title: title.to_string() });
        self.revision += 1;
        Ok(())
    }

    fn add_table(&mut self, range: &RangeRef) -> Result<(), HostError> {
        if let Some(existing) = self.tables.iter().find(|t| t.overlaps(range)) {
            return Err(HostError::TableOverlap { existing: existing.to_a1() });
        }
        self.tables.push(*range);
        // Header styling on the table's first row.
        let header = RangeRef::new(range.start, CellRef::new(range.start.row, range.end.col));
        self.style_range(&header, |style| style.bold = true);
        Ok(())
    }

    fn sort(&mut self, range: &RangeRef, key: usize, ascending: bool) -> Result<(), HostError> {
        if key >= range.cols() {
            return Err(HostError::Apply(format!(
                "Sort key column {} outside range {}",
                key, range
            )));
        }

        let mut rows: Vec<Vec<Option<Cell>>> = Vec::with_capacity(range.rows());
        for row in range.start.row..=range.end.row {
            let mut cells = Vec::with_capacity(range.cols());
            for col in range.start.col..=range.end.col {
                cells.push(self.cells.get(&(row, col)).cloned());
            }
            rows.push(cells);
        }

        // Stable sort, so equal keys keep their original order.
        let empty = CellContent::Empty;
        rows.sort_by(|a, b| {
            let ca = a[key].as_ref().map(|c| &c.content).unwrap_or(&empty);
            let cb = b[key].as_ref().map(|c| &c.content).unwrap_or(&empty);
            compare_cells(ca, cb, ascending)
        });

        for (offset, row) in rows.into_iter().enumerate() {
            for (c, cell) in row.into_iter().enumerate() {
                let pos = (range.start.row + offset, range.start.col + c);
                match cell {
                    Some(cell) => {
                        self.cells.insert(pos, cell);
                    }
                    None => {
                        self.cells.remove(&pos);
                    }
                }
            }
        }
        self.revision += 1;
        Ok(())
    }

    fn freeze_panes(&mut self, anchor: &CellRef) -> Result<(), HostError> {
        self.frozen = Some(*anchor);
        self.revision += 1;
        Ok(())
    }

    fn sync(&mut self) -> Result<(), HostError> {
        // In-memory writes are durable as soon as they land.
        Ok(())
    }
}
