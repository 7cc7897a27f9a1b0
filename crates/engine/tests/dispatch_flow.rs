//! End-to-end dispatch flows over an in-memory host, with the assist
//! service mocked (or pointed at a closed port to force fallback).

use std::time::Duration;

use httpmock::prelude::*;

use gridmind_config::{AssistStatus, KeySource, ResolvedAssistConfig};
use gridmind_core::{CellRef, RangeRef};
use gridmind_engine::Dispatcher;
use gridmind_host::{GridSheet, SpreadsheetHost};

fn assist_config(endpoint: String) -> ResolvedAssistConfig {
    ResolvedAssistConfig {
        status: AssistStatus::Ready,
        endpoint,
        model: "test-model".into(),
        timeout: Duration::from_secs(5),
        privacy_mode: false,
        api_key: None,
        key_source: KeySource::None,
    }
}

/// Assist tier pointing at a port nothing listens on: every attempt is a
/// network failure, so the rule tier handles everything.
fn unavailable_dispatcher() -> Dispatcher {
    Dispatcher::from_config(&assist_config("http://127.0.0.1:1/assist".into()))
}

#[test]
fn currency_format_end_to_end_with_fallback() {
    let mut sheet = GridSheet::from_rows(
        "Sheet1",
        &[vec!["10.5".into()], vec!["20".into()], vec!["30.25".into()]],
    );
    let selection = RangeRef::parse("A1:A3").unwrap();
    sheet.set_selection(selection);

    let mut dispatcher = unavailable_dispatcher();
    let outcome = dispatcher.dispatch(&mut sheet, "format selected cells as currency");

    assert_eq!(outcome.tier, Some("rules"));
    assert!(outcome.response.to_lowercase().contains("currency"));
    // Formatting applied, values in place, no formula written anywhere.
    assert_eq!(sheet.display_at(0, 0), "$10.50");
    assert_eq!(sheet.display_at(1, 0), "$20.00");
    assert_eq!(sheet.selection().unwrap().unwrap(), selection);
    for row in 0..5 {
        for col in 0..3 {
            assert!(sheet
                .read_formula(&CellRef::new(row, col))
                .unwrap()
                .is_none());
        }
    }
}

#[test]
fn sum_selected_column_writes_formula_below() {
    let mut sheet = GridSheet::from_rows(
        "Sheet1",
        &[
            vec!["1".into()],
            vec!["2".into()],
            vec!["3".into()],
            vec!["4".into()],
            vec!["5".into()],
        ],
    );
    sheet.set_selection(RangeRef::parse("A1:A5").unwrap());

    let mut dispatcher = unavailable_dispatcher();
    let outcome = dispatcher.dispatch(&mut sheet, "sum the selected column");

    assert_eq!(outcome.tier, Some("rules"));
    assert_eq!(
        sheet
            .read_formula(&CellRef::parse("A6").unwrap())
            .unwrap()
            .as_deref(),
        Some("=SUM(A1:A5)")
    );
}

#[test]
fn catalog_order_decides_with_assist_down() {
    let mut sheet = GridSheet::from_rows("S", &[vec!["1".into()], vec!["2".into()]]);
    sheet.set_selection(RangeRef::parse("A1:A2").unwrap());

    let mut dispatcher = unavailable_dispatcher();
    let outcome = dispatcher.dispatch(&mut sheet, "sum and then highlight");

    assert_eq!(outcome.reports.len(), 1);
    assert_eq!(outcome.reports[0].kind, "aggregate-insert");
}

#[test]
fn assist_preempts_rule_tier_when_available() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/assist");
        then.status(200).json_body(serde_json::json!({
            "explanation": "Highlighting instead.",
            "operations": [{"kind": "highlight", "color": "red"}]
        }));
    });

    let mut sheet = GridSheet::from_rows("S", &[vec!["1".into()]]);
    sheet.set_selection(RangeRef::parse("A1").unwrap());

    let mut dispatcher = Dispatcher::from_config(&assist_config(server.url("/assist")));
    // The utterance says "sum", but the assist tier's answer wins outright.
    let outcome = dispatcher.dispatch(&mut sheet, "sum this");

    assert_eq!(outcome.tier, Some("assist"));
    assert_eq!(outcome.reports.len(), 1);
    assert_eq!(outcome.reports[0].kind, "highlight");
    assert_eq!(
        sheet.cell(0, 0).unwrap().style.fill_color.as_deref(),
        Some("red")
    );
}

#[test]
fn assist_batch_partial_failure_reports_inline_and_keeps_prefix() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/assist");
        then.status(200).json_body(serde_json::json!({
            "explanation": "Formatting then converting to a table.",
            "operations": [
                {"kind": "numeric-format", "pattern": "$#,##0.00"},
                {"kind": "table-create"}
            ]
        }));
    });

    let mut sheet = GridSheet::from_rows("S", &[vec!["5".into()], vec!["6".into()]]);
    let selection = RangeRef::parse("A1:A2").unwrap();
    sheet.set_selection(selection);
    // An existing table makes the second operation fail.
    sheet.add_table(&RangeRef::parse("A2:B4").unwrap()).unwrap();

    let mut dispatcher = Dispatcher::from_config(&assist_config(server.url("/assist")));
    let outcome = dispatcher.dispatch(&mut sheet, "format these as currency in a table");

    assert_eq!(outcome.reports.len(), 2);
    assert!(outcome.reports[0].succeeded());
    assert!(!outcome.reports[1].succeeded());
    // The response surfaces both the success and the inline failure.
    assert!(outcome.response.contains("Formatted A1:A2"));
    assert!(outcome.response.contains("failed"));
    // Operation 1's effect stays applied.
    assert_eq!(sheet.display_at(0, 0), "$5.00");
    // No second table appeared.
    assert_eq!(sheet.tables().len(), 1);
}

#[test]
fn assist_empty_answer_is_authoritative_no_fallback() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST).path("/assist");
        then.status(200).json_body(serde_json::json!({
            "explanation": "",
            "operations": []
        }));
    });

    let mut sheet = GridSheet::from_rows("S", &[vec!["1".into()]]);
    sheet.set_selection(RangeRef::parse("A1").unwrap());

    let mut dispatcher = Dispatcher::from_config(&assist_config(server.url("/assist")));
    let outcome = dispatcher.dispatch(&mut sheet, "sum this");

    mock.assert();
    // A well-formed zero-operation answer is adopted as-is, even when the
    // explanation is empty; the rule tier is never consulted.
    assert_eq!(outcome.tier, Some("assist"));
    assert!(outcome.reports.is_empty());
    assert!(sheet
        .read_formula(&CellRef::parse("A2").unwrap())
        .unwrap()
        .is_none());
}

#[test]
fn assist_timeout_falls_back_to_rules() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/assist");
        then.status(200)
            .delay(Duration::from_secs(8))
            .json_body(serde_json::json!({"explanation": "too late"}));
    });

    let mut config = assist_config(server.url("/assist"));
    config.timeout = Duration::from_secs(5);

    let mut sheet = GridSheet::from_rows("S", &[vec!["1".into()], vec!["2".into()]]);
    sheet.set_selection(RangeRef::parse("A1:A2").unwrap());

    let mut dispatcher = Dispatcher::from_config(&config);
    let outcome = dispatcher.dispatch(&mut sheet, "sum the selection");

    assert_eq!(outcome.tier, Some("rules"));
    assert_eq!(
        sheet
            .read_formula(&CellRef::parse("A3").unwrap())
            .unwrap()
            .as_deref(),
        Some("=SUM(A1:A2)")
    );
}

#[test]
fn unrecognized_utterance_yields_help_and_no_mutation() {
    let mut sheet = GridSheet::from_rows("S", &[vec!["1".into()]]);
    sheet.set_selection(RangeRef::parse("A1").unwrap());
    let before = sheet.revision();

    let mut dispatcher = unavailable_dispatcher();
    let outcome = dispatcher.dispatch(&mut sheet, "write me a poem");

    assert!(outcome.reports.is_empty());
    assert!(outcome.response.contains("didn't recognize"));
    assert_eq!(sheet.revision(), before);
}
