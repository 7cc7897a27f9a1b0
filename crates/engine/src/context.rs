// Context snapshot capture.
//
// Reads the live selection and produces a bounded, read-only context.
// This is a pure probe: it must stay callable (and non-fatal) whatever
// state the host is in, because both tiers run against its output.

use gridmind_core::{CellRef, RangeRef, SpreadsheetContext, MAX_CONTEXT_COLS, MAX_CONTEXT_ROWS};
use gridmind_host::{HostError, SpreadsheetHost};

/// Capture the current selection as a bounded snapshot.
///
/// Never fails: an absent selection yields a zero-dimension context, and a
/// host read error yields a fully degraded one (empty name, zero
/// dimensions, empty matrices).
pub fn build_context(host: &dyn SpreadsheetHost) -> SpreadsheetContext {
    match try_build(host) {
        Ok(ctx) => ctx,
        Err(err) => {
            log::warn!("Context capture failed, degrading to empty: {}", err);
            SpreadsheetContext::empty()
        }
    }
}

fn try_build(host: &dyn SpreadsheetHost) -> Result<SpreadsheetContext, HostError> {
    let worksheet = host.worksheet_name()?;

    let selection = match host.selection()? {
        Some(range) => range,
        None => {
            // No selection: report the worksheet but zero dimensions.
            let mut ctx = SpreadsheetContext::empty();
            ctx.worksheet = worksheet;
            return Ok(ctx);
        }
    };

    let row_count = selection.rows();
    let column_count = selection.cols();

    let capped_rows = row_count.min(MAX_CONTEXT_ROWS);
    let capped_cols = column_count.min(MAX_CONTEXT_COLS);
    let capped = RangeRef::new(
        selection.start,
        CellRef::new(
            selection.start.row + capped_rows - 1,
            selection.start.col + capped_cols - 1,
        ),
    );

    let values = host.read_values(&capped)?;
    let display = host.read_displays(&capped)?;

    Ok(SpreadsheetContext {
        worksheet,
        address: selection.to_a1(),
        row_count,
        column_count,
        values,
        display,
        truncated: row_count > MAX_CONTEXT_ROWS || column_count > MAX_CONTEXT_COLS,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use gridmind_core::CellScalar;
    use gridmind_host::GridSheet;

    #[test]
    fn test_capture_small_selection() {
        let mut sheet = GridSheet::from_rows(
            "Budget",
            &[vec!["10".into(), "x".into()], vec!["20".into(), "y".into()]],
        );
        sheet.set_selection(RangeRef::parse("A1:B2").unwrap());

        let ctx = build_context(&sheet);
        assert_eq!(ctx.worksheet, "Budget");
        assert_eq!(ctx.address, "A1:B2");
        assert_eq!(ctx.row_count, 2);
        assert_eq!(ctx.column_count, 2);
        assert!(!ctx.truncated);
        assert_eq!(ctx.values[0][0], CellScalar::Number(10.0));
        assert_eq!(ctx.display[1][1], "y");
    }

    #[test]
    fn test_capture_caps_matrices_but_not_counts() {
        let rows: Vec<Vec<String>> = (0..50)
            .map(|r| (0..50).map(|c| format!("{}", r * 50 + c)).collect())
            .collect();
        let mut sheet = GridSheet::from_rows("Big", &rows);
        sheet.set_selection(RangeRef::parse("A1:AX50").unwrap());

        let ctx = build_context(&sheet);
        assert_eq!(ctx.row_count, 50);
        assert_eq!(ctx.column_count, 50);
        assert_eq!(ctx.capped_rows(), MAX_CONTEXT_ROWS);
        assert_eq!(ctx.capped_cols(), MAX_CONTEXT_COLS);
        assert!(ctx.truncated);
    }

    #[test]
    fn test_capture_survives_failing_host() {
        struct BrokenHost;
        impl SpreadsheetHost for BrokenHost {
            fn worksheet_name(&self) -> Result<String, HostError> {
                Err(HostError::Read("connection lost".into()))
            }
            fn selection(&self) -> Result<Option<RangeRef>, HostError> {
                Err(HostError::Read("connection lost".into()))
            }
            fn read_values(
                &self,
                _: &RangeRef,
            ) -> Result<Vec<Vec<CellScalar>>, HostError> {
                Err(HostError::Read("connection lost".into()))
            }
            fn read_displays(&self, _: &RangeRef) -> Result<Vec<Vec<String>>, HostError> {
                Err(HostError::Read("connection lost".into()))
            }
            fn read_formula(&self, _: &CellRef) -> Result<Option<String>, HostError> {
                Err(HostError::Read("connection lost".into()))
            }
            fn write_values(
                &mut self,
                _: &RangeRef,
                _: &[Vec<CellScalar>],
            ) -> Result<(), HostError> {
                unreachable!()
            }
            fn write_formula(&mut self, _: &CellRef, _: &str) -> Result<(), HostError> {
                unreachable!()
            }
            fn set_number_format(&mut self, _: &RangeRef, _: &str) -> Result<(), HostError> {
                unreachable!()
            }
            fn set_bold(&mut self, _: &RangeRef, _: bool) -> Result<(), HostError> {
                unreachable!()
            }
            fn set_italic(&mut self, _: &RangeRef, _: bool) -> Result<(), HostError> {
                unreachable!()
            }
            fn set_fill_color(&mut self, _: &RangeRef, _: &str) -> Result<(), HostError> {
                unreachable!()
            }
            fn clear(&mut self, _: &RangeRef) -> Result<(), HostError> {
                unreachable!()
            }
            fn add_chart(
                &mut self,
                _: gridmind_core::ChartKind,
                _: &RangeRef,
                _: &str,
            ) -> Result<(), HostError> {
                unreachable!()
            }
            fn add_table(&mut self, _: &RangeRef) -> Result<(), HostError> {
                unreachable!()
            }
            fn sort(&mut self, _: &RangeRef, _: usize, _: bool) -> Result<(), HostError> {
                unreachable!()
            }
            fn freeze_panes(&mut self, _: &CellRef) -> Result<(), HostError> {
                unreachable!()
            }
            fn sync(&mut self) -> Result<(), HostError> {
                unreachable!()
            }
        }

        let ctx = build_context(&BrokenHost);
        assert_eq!(ctx, SpreadsheetContext::empty());
        assert_eq!(ctx.row_count, 0);
    }
}
