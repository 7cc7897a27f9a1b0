// The closed operation catalog.
//
// Operations are produced by interpretation (either tier) and consumed
// exactly once by the executor. The tagged enum is the allow-list for
// anything arriving from the assist service: unknown kinds simply fail to
// decode and are dropped by `decode_lenient`.

use serde::{Deserialize, Serialize};

use crate::refs::RangeRef;

/// Aggregate function written by `aggregate-insert`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AggregateFn {
    #[default]
    Sum,
    #[serde(alias = "avg", alias = "mean")]
    Average,
    Count,
    #[serde(alias = "maximum")]
    Max,
    #[serde(alias = "minimum")]
    Min,
}

impl AggregateFn {
    /// Spreadsheet function name as it appears in a formula.
    pub fn formula_name(&self) -> &'static str {
        match self {
            AggregateFn::Sum => "SUM",
            AggregateFn::Average => "AVERAGE",
            AggregateFn::Count => "COUNT",
            AggregateFn::Max => "MAX",
            AggregateFn::Min => "MIN",
        }
    }
}

/// Chart kind for `chart-create`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    /// Clustered column chart (the default when unspecified).
    #[default]
    #[serde(alias = "bar", alias = "column", alias = "ColumnClustered")]
    ColumnClustered,
    #[serde(alias = "Line")]
    Line,
    #[serde(alias = "Pie")]
    Pie,
}

impl ChartKind {
    pub fn display_name(&self) -> &'static str {
        match self {
            ChartKind::ColumnClustered => "column",
            ChartKind::Line => "line",
            ChartKind::Pie => "pie",
        }
    }
}

/// Font attribute for `style-toggle`. Applying one sets it to a fixed "on"
/// state; this is not a true toggle of prior state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StyleAttr {
    #[default]
    Bold,
    Italic,
}

impl StyleAttr {
    pub fn display_name(&self) -> &'static str {
        match self {
            StyleAttr::Bold => "bold",
            StyleAttr::Italic => "italic",
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_highlight_color() -> String {
    "yellow".to_string()
}

/// One atomic spreadsheet mutation/query request.
///
/// `range` is optional everywhere: `None` means "the live selection at
/// execution time", which is what both tiers produce unless the utterance
/// (or the assist service) named an explicit range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Operation {
    /// Write an aggregate formula over the target into the first empty
    /// cell adjacent to it.
    AggregateInsert {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        range: Option<RangeRef>,
        #[serde(default)]
        function: AggregateFn,
    },
    /// Apply a number display pattern to every cell of the target.
    NumericFormat {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        range: Option<RangeRef>,
        pattern: String,
    },
    /// Remove values and formatting. Irreversible, no confirmation.
    Clear {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        range: Option<RangeRef>,
    },
    /// Set a font attribute to its "on" state.
    StyleToggle {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        range: Option<RangeRef>,
        #[serde(default)]
        attribute: StyleAttr,
    },
    /// Insert a chart anchored near the target.
    ChartCreate {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        range: Option<RangeRef>,
        #[serde(default)]
        chart_type: ChartKind,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        title: Option<String>,
    },
    /// Convert the target to a structured table with header styling.
    TableCreate {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        range: Option<RangeRef>,
    },
    /// Reorder rows by a key column (offset within the target).
    Sort {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        range: Option<RangeRef>,
        #[serde(default)]
        key: usize,
        #[serde(default = "default_true")]
        ascending: bool,
    },
    /// Set fill color.
    Highlight {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        range: Option<RangeRef>,
        #[serde(default = "default_highlight_color")]
        color: String,
    },
    /// Freeze rows/columns at the target's top-left anchor.
    FreezePanes {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        range: Option<RangeRef>,
    },
    /// Compute non-empty/numeric counts and ratio as read-only text.
    AnalyzeSummary {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        range: Option<RangeRef>,
    },
}

impl Operation {
    /// Catalog kind tag, matching the wire form.
    pub fn kind(&self) -> &'static str {
        match self {
            Operation::AggregateInsert { .. } => "aggregate-insert",
            Operation::NumericFormat { .. } => "numeric-format",
            Operation::Clear { .. } => "clear",
            Operation::StyleToggle { .. } => "style-toggle",
            Operation::ChartCreate { .. } => "chart-create",
            Operation::TableCreate { .. } => "table-create",
            Operation::Sort { .. } => "sort",
            Operation::Highlight { .. } => "highlight",
            Operation::FreezePanes { .. } => "freeze-panes",
            Operation::AnalyzeSummary { .. } => "analyze-summary",
        }
    }

    /// Explicit target range, if the operation carries one.
    pub fn target(&self) -> Option<RangeRef> {
        match self {
            Operation::AggregateInsert { range, .. }
            | Operation::NumericFormat { range, .. }
            | Operation::Clear { range }
            | Operation::StyleToggle { range, .. }
            | Operation::ChartCreate { range, .. }
            | Operation::TableCreate { range }
            | Operation::Sort { range, .. }
            | Operation::Highlight { range, .. }
            | Operation::FreezePanes { range }
            | Operation::AnalyzeSummary { range } => *range,
        }
    }

    /// True if the operation never mutates the host.
    pub fn is_read_only(&self) -> bool {
        matches!(self, Operation::AnalyzeSummary { .. })
    }

    /// Decode a list of raw operation values, silently dropping any element
    /// that is not a recognized catalog entry. Returns the decoded
    /// operations and the number dropped.
    pub fn decode_lenient(raw: &[serde_json::Value]) -> (Vec<Operation>, usize) {
        let mut ops = Vec::with_capacity(raw.len());
        let mut dropped = 0;
        for value in raw {
            match serde_json::from_value::<Operation>(value.clone()) {
                Ok(op) => ops.push(op),
                Err(_) => dropped += 1,
            }
        }
        (ops, dropped)
    }
}
