//! Spreadsheet host boundary.
//!
//! The engine never owns spreadsheet state: every read is a fresh probe
//! and every write goes through [`SpreadsheetHost`]. `GridSheet` is the
//! in-memory implementation used by the CLI and by engine tests.

pub mod cell;
pub mod sheet;

pub use cell::{Cell, CellContent, CellStyle};
pub use sheet::{ChartInfo, GridSheet};

use gridmind_core::{CellRef, CellScalar, ChartKind, RangeRef};

/// Error from a host primitive.
#[derive(Debug, Clone)]
pub enum HostError {
    /// Reading selection or cell state failed.
    Read(String),
    /// A write primitive was rejected.
    Apply(String),
    /// `add_table` target overlaps an existing table.
    TableOverlap { existing: String },
}

impl std::fmt::Display for HostError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HostError::Read(msg) => write!(f, "Host read failed: {}", msg),
            HostError::Apply(msg) => write!(f, "{}", msg),
            HostError::TableOverlap { existing } => {
                write!(f, "Range overlaps existing table {}", existing)
            }
        }
    }
}

impl std::error::Error for HostError {}

/// The primitives a spreadsheet host must expose.
///
/// Writes must be durable once the call returns; `sync` is the explicit
/// commit barrier for hosts that buffer.
pub trait SpreadsheetHost {
    fn worksheet_name(&self) -> Result<String, HostError>;

    /// The active selection, or `None` when nothing is selected.
    fn selection(&self) -> Result<Option<RangeRef>, HostError>;

    fn read_values(&self, range: &RangeRef) -> Result<Vec<Vec<CellScalar>>, HostError>;
    fn read_displays(&self, range: &RangeRef) -> Result<Vec<Vec<String>>, HostError>;
    fn read_formula(&self, cell: &CellRef) -> Result<Option<String>, HostError>;

    fn write_values(&mut self, range: &RangeRef, values: &[Vec<CellScalar>]) -> Result<(), HostError>;
    fn write_formula(&mut self, cell: &CellRef, formula: &str) -> Result<(), HostError>;
    fn set_number_format(&mut self, range: &RangeRef, pattern: &str) -> Result<(), HostError>;
    fn set_bold(&mut self, range: &RangeRef, on: bool) -> Result<(), HostError>;
    fn set_italic(&mut self, range: &RangeRef, on: bool) -> Result<(), HostError>;
    fn set_fill_color(&mut self, range: &RangeRef, color: &str) -> Result<(), HostError>;
    fn clear(&mut self, range: &RangeRef) -> Result<(), HostError>;
    fn add_chart(&mut self, kind: ChartKind, range: &RangeRef, title: &str) -> Result<(), HostError>;
    fn add_table(&mut self, range: &RangeRef) -> Result<(), HostError>;
    fn sort(&mut self, range: &RangeRef, key: usize, ascending: bool) -> Result<(), HostError>;
    fn freeze_panes(&mut self, anchor: &CellRef) -> Result<(), HostError>;

    /// Commit barrier: returns once prior writes are durable.
    fn sync(&mut self) -> Result<(), HostError>;
}
