// Rule-based interpretation tier.
//
// Deterministic, case-insensitive, catalog-ordered substring matching over
// fixed trigger phrases. The first catalog entry whose trigger appears in
// the utterance wins; catalog order, not utterance order, breaks ties.
// This tier has no external dependency and never reports unavailability.

use gridmind_core::{
    AggregateFn, ChartKind, InterpretationResult, Operation, StyleAttr,
};

use crate::dispatch::{Interpreter, TierUnavailable};

type BuildFn = fn(&str) -> InterpretationResult;

struct CatalogEntry {
    /// Substrings that select this entry (any match counts).
    triggers: &'static [&'static str],
    /// One-line usage shown in the help text.
    usage: &'static str,
    build: BuildFn,
}

/// Catalog order decides ties: "sum and highlight" always resolves to the
/// aggregate entry.
static CATALOG: &[CatalogEntry] = &[
    CatalogEntry {
        triggers: &["sum", "total", "average", "avg", "mean", "count", "maximum", "minimum", "highest", "lowest"],
        usage: "sum / average / count - write an aggregate formula next to the selection",
        build: build_aggregate,
    },
    CatalogEntry {
        triggers: &["currency", "dollar", "percent"],
        usage: "currency / percent - apply a number format to the selection",
        build: build_numeric_format,
    },
    CatalogEntry {
        triggers: &["clear", "erase"],
        usage: "clear - remove values and formatting from the selection",
        build: build_clear,
    },
    CatalogEntry {
        triggers: &["bold", "italic"],
        usage: "bold / italic - style the selection",
        build: build_style,
    },
    CatalogEntry {
        triggers: &["chart", "graph", "plot"],
        usage: "chart - insert a chart from the selection",
        build: build_chart,
    },
    CatalogEntry {
        triggers: &["table"],
        usage: "table - convert the selection to a formatted table",
        build: build_table,
    },
    CatalogEntry {
        triggers: &["analyze", "analyse", "analysis", "summar", "statistic", "stats"],
        usage: "analyze - summarize the selected data",
        build: build_analyze,
    },
    CatalogEntry {
        triggers: &["sort", "arrange", "order by"],
        usage: "sort - reorder rows by the first column",
        build: build_sort,
    },
    CatalogEntry {
        triggers: &["highlight", "color", "colour", "fill"],
        usage: "highlight - set the selection's fill color",
        build: build_highlight,
    },
    CatalogEntry {
        triggers: &["freeze"],
        usage: "freeze - freeze panes at the selection",
        build: build_freeze,
    },
];

/// Resolve an utterance against the catalog. Total: unmatched utterances
/// get the help message with zero operations.
pub fn match_utterance(utterance: &str) -> InterpretationResult {
    let lowered = utterance.to_lowercase();
    for entry in CATALOG {
        if entry.triggers.iter().any(|t| lowered.contains(t)) {
            return (entry.build)(&lowered);
        }
    }
    InterpretationResult::answer(help_text())
}

/// Fixed help message enumerating supported commands.
pub fn help_text() -> String {
    let mut out = String::from("I didn't recognize that command. I can do the following:\n");
    for entry in CATALOG {
        out.push_str("  ");
        out.push_str(entry.usage);
        out.push('\n');
    }
    out.push_str("For anything richer, configure the assist service.");
    out
}

/// Example utterances, filtered by a partial query. With no query the
/// first five are returned.
pub fn suggestions(partial: &str) -> Vec<&'static str> {
    const EXAMPLES: &[&str] = &[
        "Sum the selected column",
        "Calculate the average of the selection",
        "Format selected cells as currency",
        "Make the selection bold",
        "Create a bar chart from this data",
        "Convert the selection to a table",
        "Analyze the selected data",
        "Sort rows by the first column descending",
        "Highlight the selection in yellow",
        "Freeze panes here",
    ];

    if partial.trim().is_empty() {
        return EXAMPLES[..5].to_vec();
    }
    let lowered = partial.to_lowercase();
    EXAMPLES
        .iter()
        .copied()
        .filter(|e| e.to_lowercase().contains(&lowered))
        .collect()
}

// ── Entry builders ──────────────────────────────────────────────────

fn build_aggregate(lowered: &str) -> InterpretationResult {
    let function = if lowered.contains("average") || lowered.contains("mean") || lowered.contains("avg") {
        AggregateFn::Average
    } else if lowered.contains("count") {
        AggregateFn::Count
    } else if lowered.contains("maximum") || lowered.contains("highest") {
        AggregateFn::Max
    } else if lowered.contains("minimum") || lowered.contains("lowest") {
        AggregateFn::Min
    } else {
        AggregateFn::Sum
    };

    InterpretationResult::new(
        format!("Writing a {} formula next to the selection.", function.formula_name()),
        vec![Operation::AggregateInsert { range: None, function }],
    )
}

fn build_numeric_format(lowered: &str) -> InterpretationResult {
    let (pattern, label) = if lowered.contains("percent") {
        ("0.00%", "percent")
    } else {
        ("$#,##0.00", "currency")
    };

    InterpretationResult::new(
        format!("Formatting the selection as {}.", label),
        vec![Operation::NumericFormat { range: None, pattern: pattern.to_string() }],
    )
}

fn build_clear(_lowered: &str) -> InterpretationResult {
    InterpretationResult::new(
        "Clearing values and formatting from the selection.",
        vec![Operation::Clear { range: None }],
    )
}

fn build_style(lowered: &str) -> InterpretationResult {
    let attribute = if lowered.contains("italic") {
        StyleAttr::Italic
    } else {
        StyleAttr::Bold
    };
    InterpretationResult::new(
        format!("Applying {} to the selection.", attribute.display_name()),
        vec![Operation::StyleToggle { range: None, attribute }],
    )
}

fn build_chart(lowered: &str) -> InterpretationResult {
    let chart_type = if lowered.contains("line") {
        ChartKind::Line
    } else if lowered.contains("pie") {
        ChartKind::Pie
    } else {
        ChartKind::ColumnClustered
    };

    InterpretationResult::new(
        format!("Creating a {} chart from the selection.", chart_type.display_name()),
        vec![Operation::ChartCreate {
            range: None,
            chart_type,
            title: extract_quoted_title(lowered),
        }],
    )
}

fn build_table(_lowered: &str) -> InterpretationResult {
    InterpretationResult::new(
        "Converting the selection to a formatted table.",
        vec![Operation::TableCreate { range: None }],
    )
}

fn build_analyze(_lowered: &str) -> InterpretationResult {
    InterpretationResult::new(
        "Analyzing the selected data.",
        vec![Operation::AnalyzeSummary { range: None }],
    )
}

fn build_sort(lowered: &str) -> InterpretationResult {
    let descending = ["descending", "desc", "high to low", "largest first", "z to a"]
        .iter()
        .any(|phrase| lowered.contains(phrase));

    InterpretationResult::new(
        format!(
            "Sorting the selection by its first column, {}.",
            if descending { "descending" } else { "ascending" }
        ),
        vec![Operation::Sort { range: None, key: 0, ascending: !descending }],
    )
}

fn build_highlight(lowered: &str) -> InterpretationResult {
    const COLORS: &[&str] = &[
        "yellow", "red", "green", "blue", "orange", "pink", "purple", "gray", "grey", "cyan",
    ];
    let color = COLORS
        .iter()
        .find(|c| lowered.contains(*c))
        .copied()
        .unwrap_or("yellow");

    InterpretationResult::new(
        format!("Highlighting the selection in {}.", color),
        vec![Operation::Highlight { range: None, color: color.to_string() }],
    )
}

fn build_freeze(_lowered: &str) -> InterpretationResult {
    InterpretationResult::new(
        "Freezing panes at the selection.",
        vec![Operation::FreezePanes { range: None }],
    )
}

/// Pull a quoted chart title out of the utterance, e.g.
/// `chart titled "Q3 Sales"`. Returns None when no quoted run follows a
/// title keyword.
fn extract_quoted_title(lowered: &str) -> Option<String> {
    let keyword_at = ["titled", "title", "called", "named", "call it"]
        .iter()
        .filter_map(|k| lowered.find(k).map(|at| at + k.len()))
        .min()?;
    let rest = &lowered[keyword_at..];
    for quote in ['"', '\''] {
        if let Some(open) = rest.find(quote) {
            if let Some(close) = rest[open + 1..].find(quote) {
                let title = &rest[open + 1..open + 1 + close];
                if !title.is_empty() {
                    return Some(title.to_string());
                }
            }
        }
    }
    None
}

/// The rule tier as an interpreter: total, always succeeds.
pub struct RuleInterpreter;

impl Interpreter for RuleInterpreter {
    fn name(&self) -> &'static str {
        "rules"
    }

    fn try_interpret(
        &self,
        utterance: &str,
        _context: &gridmind_core::SpreadsheetContext,
    ) -> Result<InterpretationResult, TierUnavailable> {
        Ok(match_utterance(utterance))
    }
}
