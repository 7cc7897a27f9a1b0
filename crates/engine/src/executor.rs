// Operation executor.
//
// Applies a batch one operation at a time, sequentially, with a commit
// barrier after each. A failing operation is reported inline and the
// remaining operations still run (best-effort, non-transactional): a
// partially failed batch leaves whatever prefix succeeded.

use gridmind_core::{refs, CellRef, CellScalar, Operation, RangeRef};
use gridmind_host::{HostError, SpreadsheetHost};

/// Result of applying one operation.
#[derive(Debug, Clone)]
pub struct OpReport {
    /// Position within the batch, 0-indexed.
    pub index: usize,
    /// Catalog kind tag.
    pub kind: &'static str,
    /// Confirmation text on success, failure description otherwise.
    pub outcome: Result<String, String>,
}

impl OpReport {
    pub fn succeeded(&self) -> bool {
        self.outcome.is_ok()
    }
}

/// Apply a batch in order. `fallback_target` is the live selection used by
/// operations that carry no explicit range.
pub fn apply_batch(
    host: &mut dyn SpreadsheetHost,
    ops: &[Operation],
    fallback_target: Option<RangeRef>,
) -> Vec<OpReport> {
    ops.iter()
        .enumerate()
        .map(|(index, op)| OpReport {
            index,
            kind: op.kind(),
            outcome: apply_one(host, op, fallback_target).map_err(|e| e.to_string()),
        })
        .collect()
}

fn apply_one(
    host: &mut dyn SpreadsheetHost,
    op: &Operation,
    fallback_target: Option<RangeRef>,
) -> Result<String, HostError> {
    let target = op
        .target()
        .or(fallback_target)
        .ok_or_else(|| HostError::Apply("No target range available".into()))?;

    let detail = match op {
        Operation::AggregateInsert { function, .. } => {
            let cell = adjacent_empty_cell(host, &target)?;
            let formula = format!("={}({})", function.formula_name(), target.to_a1());
            host.write_formula(&cell, &formula)?;
            format!("Added {} formula in {}", function.formula_name(), cell.to_a1())
        }
        Operation::NumericFormat { pattern, .. } => {
            host.set_number_format(&target, pattern)?;
            format!("Formatted {} as {}", target, pattern)
        }
        Operation::Clear { .. } => {
            host.clear(&target)?;
            format!("Cleared {}", target)
        }
        Operation::StyleToggle { attribute, .. } => {
            match attribute {
                gridmind_core::StyleAttr::Bold => host.set_bold(&target, true)?,
                gridmind_core::StyleAttr::Italic => host.set_italic(&target, true)?,
            }
            format!("Applied {} to {}", attribute.display_name(), target)
        }
        Operation::ChartCreate { chart_type, title, .. } => {
            let title = title
                .clone()
                .unwrap_or_else(|| default_chart_title(chart_type.display_name()));
            host.add_chart(*chart_type, &target, &title)?;
            format!(
                "Created a {} chart \"{}\" from {}",
                chart_type.display_name(),
                title,
                target
            )
        }
        Operation::TableCreate { .. } => {
            host.add_table(&target)?;
            format!("Converted {} to a table", target)
        }
        Operation::Sort { key, ascending, .. } => {
            host.sort(&target, *key, *ascending)?;
            format!(
                "Sorted {} by column {} ({})",
                target,
                refs::col_to_letter(target.start.col + key),
                if *ascending { "ascending" } else { "descending" }
            )
        }
        Operation::Highlight { color, .. } => {
            host.set_fill_color(&target, color)?;
            format!("Highlighted {} in {}", target, color)
        }
        Operation::FreezePanes { .. } => {
            host.freeze_panes(&target.start)?;
            format!("Froze panes at {}", target.start.to_a1())
        }
        Operation::AnalyzeSummary { .. } => analyze(host, &target)?,
    };

    // Commit barrier: this operation is durable before the next begins.
    host.sync()?;
    Ok(detail)
}

/// First empty cell adjacent to the target: below the first column for
/// single cells and column-shaped selections, to the right of the first
/// row for row-shaped ones. Falls back to the preferred side when both
/// candidates are occupied.
fn adjacent_empty_cell(
    host: &dyn SpreadsheetHost,
    target: &RangeRef,
) -> Result<CellRef, HostError> {
    let below = CellRef::new(target.end.row + 1, target.start.col);
    let right = CellRef::new(target.start.row, target.end.col + 1);
    let candidates = if target.rows() == 1 && target.cols() > 1 {
        [right, below]
    } else {
        [below, right]
    };

    for candidate in candidates {
        if cell_is_empty(host, &candidate)? {
            return Ok(candidate);
        }
    }
    Ok(candidates[0])
}

fn cell_is_empty(host: &dyn SpreadsheetHost, cell: &CellRef) -> Result<bool, HostError> {
    if host.read_formula(cell)?.is_some() {
        return Ok(false);
    }
    let values = host.read_values(&RangeRef::single(*cell))?;
    Ok(values
        .first()
        .and_then(|row| row.first())
        .map(CellScalar::is_empty)
        .unwrap_or(true))
}

fn default_chart_title(kind_name: &str) -> String {
    let mut chars = kind_name.chars();
    let capitalized: String = match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    };
    format!("{} Chart", capitalized)
}

/// Read-only analysis of the target: non-empty and numeric counts, their
/// ratio, and whether the first row looks like headers.
fn analyze(host: &dyn SpreadsheetHost, target: &RangeRef) -> Result<String, HostError> {
    let values = host.read_values(target)?;

    let mut non_empty = 0usize;
    let mut numeric = 0usize;
    for cell in values.iter().flatten() {
        if !cell.is_empty() {
            non_empty += 1;
            if cell.is_numeric() {
                numeric += 1;
            }
        }
    }

    let mut out = format!(
        "Analyzed {}: {} rows x {} columns, {} non-empty cells, {} numeric",
        target,
        target.rows(),
        target.cols(),
        non_empty,
        numeric
    );
    if non_empty > 0 {
        out.push_str(&format!(
            " ({:.0}%)",
            numeric as f64 / non_empty as f64 * 100.0
        ));
    }

    let first_row_text = values
        .first()
        .map(|row| {
            row.iter()
                .any(|c| matches!(c, CellScalar::Text(s) if !s.trim().is_empty()))
        })
        .unwrap_or(false);
    let second_row_numeric = values
        .get(1)
        .map(|row| row.iter().any(CellScalar::is_numeric))
        .unwrap_or(false);
    if first_row_text && second_row_numeric {
        out.push_str(". First row looks like headers");
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use gridmind_core::{AggregateFn, ChartKind, StyleAttr};
    use gridmind_host::GridSheet;

    fn column_sheet() -> GridSheet {
        GridSheet::from_rows(
            "Sheet1",
            &[
                vec!["1".into()],
                vec!["2".into()],
                vec!["3".into()],
                vec!["4".into()],
                vec!["5".into()],
            ],
        )
    }

    #[test]
    fn test_sum_over_column_lands_below() {
        let mut sheet = column_sheet();
        let ops = vec![Operation::AggregateInsert { range: None, function: AggregateFn::Sum }];
        let target = RangeRef::parse("A1:A5").unwrap();
        let reports = apply_batch(&mut sheet, &ops, Some(target));

        assert!(reports[0].succeeded());
        assert_eq!(
            sheet
                .read_formula(&CellRef::parse("A6").unwrap())
                .unwrap()
                .as_deref(),
            Some("=SUM(A1:A5)")
        );
    }

    #[test]
    fn test_single_cell_targets_next_row_same_column() {
        let mut sheet = GridSheet::from_rows("S", &[vec!["7".into()]]);
        let target = RangeRef::parse("A1").unwrap();
        let ops = vec![Operation::AggregateInsert { range: None, function: AggregateFn::Sum }];
        apply_batch(&mut sheet, &ops, Some(target));
        assert_eq!(
            sheet
                .read_formula(&CellRef::parse("A2").unwrap())
                .unwrap()
                .as_deref(),
            Some("=SUM(A1)")
        );
    }

    #[test]
    fn test_row_selection_targets_cell_to_the_right() {
        let mut sheet = GridSheet::from_rows("S", &[vec!["1".into(), "2".into(), "3".into()]]);
        let target = RangeRef::parse("A1:C1").unwrap();
        let ops = vec![Operation::AggregateInsert { range: None, function: AggregateFn::Average }];
        apply_batch(&mut sheet, &ops, Some(target));
        assert_eq!(
            sheet
                .read_formula(&CellRef::parse("D1").unwrap())
                .unwrap()
                .as_deref(),
            Some("=AVERAGE(A1:C1)")
        );
    }

    #[test]
    fn test_occupied_below_probes_to_the_right() {
        let mut sheet = column_sheet();
        sheet.set_input(5, 0, "occupied"); // A6
        let target = RangeRef::parse("A1:A5").unwrap();
        let ops = vec![Operation::AggregateInsert { range: None, function: AggregateFn::Sum }];
        apply_batch(&mut sheet, &ops, Some(target));
        assert_eq!(
            sheet
                .read_formula(&CellRef::parse("B1").unwrap())
                .unwrap()
                .as_deref(),
            Some("=SUM(A1:A5)")
        );
    }

    #[test]
    fn test_numeric_format_is_idempotent() {
        let mut sheet = column_sheet();
        let target = RangeRef::parse("A1:A5").unwrap();
        let op = Operation::NumericFormat { range: None, pattern: "$#,##0.00".into() };

        apply_batch(&mut sheet, std::slice::from_ref(&op), Some(target));
        let once = sheet.display_at(0, 0);
        apply_batch(&mut sheet, std::slice::from_ref(&op), Some(target));
        let twice = sheet.display_at(0, 0);

        assert_eq!(once, "$1.00");
        assert_eq!(once, twice);
    }

    #[test]
    fn test_partial_failure_keeps_prefix_and_continues() {
        let mut sheet = column_sheet();
        let target = RangeRef::parse("A1:A5").unwrap();
        // Occupy the target with a table so the second op fails.
        sheet.add_table(&target).unwrap();

        let ops = vec![
            Operation::NumericFormat { range: None, pattern: "$#,##0.00".into() },
            Operation::TableCreate { range: None },
            Operation::Highlight { range: None, color: "yellow".into() },
        ];
        let reports = apply_batch(&mut sheet, &ops, Some(target));

        assert!(reports[0].succeeded());
        assert!(!reports[1].succeeded());
        assert!(reports[2].succeeded());
        // Prefix stays applied.
        assert_eq!(sheet.display_at(0, 0), "$1.00");
        assert_eq!(
            sheet.cell(0, 0).unwrap().style.fill_color.as_deref(),
            Some("yellow")
        );
        let err = reports[1].outcome.as_ref().unwrap_err();
        assert!(err.contains("overlaps"), "error: {}", err);
    }

    #[test]
    fn test_explicit_range_overrides_fallback() {
        let mut sheet = column_sheet();
        let explicit = RangeRef::parse("A1:A2").unwrap();
        let ops = vec![Operation::Clear { range: Some(explicit) }];
        apply_batch(&mut sheet, &ops, Some(RangeRef::parse("A1:A5").unwrap()));
        assert_eq!(sheet.display_at(0, 0), "");
        assert_eq!(sheet.display_at(2, 0), "3");
    }

    #[test]
    fn test_chart_and_freeze_and_style() {
        let mut sheet = column_sheet();
        let target = RangeRef::parse("A1:A5").unwrap();
        let ops = vec![
            Operation::ChartCreate { range: None, chart_type: ChartKind::Pie, title: None },
            Operation::StyleToggle { range: None, attribute: StyleAttr::Bold },
            Operation::FreezePanes { range: None },
        ];
        let reports = apply_batch(&mut sheet, &ops, Some(target));
        assert!(reports.iter().all(OpReport::succeeded));

        assert_eq!(sheet.charts().len(), 1);
        assert_eq!(sheet.charts()[0].title, "Pie Chart");
        assert!(sheet.cell(0, 0).unwrap().style.bold);
        assert_eq!(sheet.frozen().unwrap().to_a1(), "A1");
    }

    #[test]
    fn test_analyze_is_read_only_and_reports_counts() {
        let mut sheet = GridSheet::from_rows(
            "S",
            &[
                vec!["Name".into(), "Amount".into()],
                vec!["a".into(), "1".into()],
                vec!["b".into(), "2".into()],
            ],
        );
        let before = sheet.revision();
        let target = RangeRef::parse("A1:B3").unwrap();
        let ops = vec![Operation::AnalyzeSummary { range: None }];
        let reports = apply_batch(&mut sheet, &ops, Some(target));

        let text = reports[0].outcome.as_ref().unwrap();
        assert!(text.contains("6 non-empty cells"), "text: {}", text);
        assert!(text.contains("2 numeric"), "text: {}", text);
        assert!(text.contains("headers"), "text: {}", text);
        assert_eq!(sheet.revision(), before);
    }

    #[test]
    fn test_missing_target_fails_inline() {
        let mut sheet = column_sheet();
        let ops = vec![Operation::Clear { range: None }];
        let reports = apply_batch(&mut sheet, &ops, None);
        assert!(!reports[0].succeeded());
    }
}
