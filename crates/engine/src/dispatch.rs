// Command dispatcher.
//
// Orchestrates tier selection, the empty-selection guard, execution
// ordering, and the session log. Interpretation strategies are an ordered
// list of interpreters tried until one succeeds; the rule tier is total,
// so the loop always resolves.

use gridmind_core::{InterpretationResult, SessionLog, SpreadsheetContext};
use gridmind_host::SpreadsheetHost;

use crate::context::build_context;
use crate::executor::{apply_batch, OpReport};
use crate::metrics::{self, MetricEvent};
use crate::session::Session;

/// Prompt returned when the context has no rows; neither tier is invoked.
pub const SELECT_DATA_PROMPT: &str =
    "Select some data first, then tell me what to do with it.";

/// Prompt returned when a command is submitted while one is in flight.
pub const BUSY_PROMPT: &str =
    "Still working on the previous command - try again in a moment.";

/// One interpretation strategy. Tiers are tried in order; a tier that
/// cannot answer right now reports `TierUnavailable` and the next tier
/// runs. The user never sees the intermediate failure.
pub trait Interpreter {
    fn name(&self) -> &'static str;

    fn try_interpret(
        &self,
        utterance: &str,
        context: &SpreadsheetContext,
    ) -> Result<InterpretationResult, TierUnavailable>;
}

/// A tier declining to interpret (network failure, non-success status,
/// malformed body, timeout, or the tier being disabled).
#[derive(Debug, Clone)]
pub struct TierUnavailable {
    /// Stable category for diagnostics counters.
    pub category: &'static str,
    pub detail: String,
}

impl TierUnavailable {
    pub fn new(category: &'static str, detail: impl Into<String>) -> Self {
        Self { category, detail: detail.into() }
    }
}

impl std::fmt::Display for TierUnavailable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "tier unavailable ({}): {}", self.category, self.detail)
    }
}

impl std::error::Error for TierUnavailable {}

/// What one dispatched utterance produced.
#[derive(Debug)]
pub struct DispatchOutcome {
    /// Response text for the user (explanation plus per-operation lines).
    pub response: String,
    /// Name of the tier that interpreted, None if no tier was invoked.
    pub tier: Option<&'static str>,
    /// Per-operation reports, in execution order.
    pub reports: Vec<OpReport>,
}

/// The engine's entry point for one session.
pub struct Dispatcher {
    tiers: Vec<Box<dyn Interpreter>>,
    session: Session,
    log: SessionLog,
}

impl Dispatcher {
    /// Build from an explicit tier list, first tier tried first.
    pub fn new(tiers: Vec<Box<dyn Interpreter>>) -> Self {
        Self { tiers, session: Session::new(), log: SessionLog::new() }
    }

    /// Standard tier stack: assist service first, rules as the total
    /// fallback.
    pub fn from_config(config: &gridmind_config::ResolvedAssistConfig) -> Self {
        Self::new(vec![
            Box::new(crate::assist::AssistInterpreter::from_config(config)),
            Box::new(crate::rules::RuleInterpreter),
        ])
    }

    /// Resolve an utterance without executing anything. Returns the result
    /// and the name of the tier that produced it.
    pub fn interpret(
        &self,
        utterance: &str,
        context: &SpreadsheetContext,
    ) -> (InterpretationResult, &'static str) {
        for tier in &self.tiers {
            match tier.try_interpret(utterance, context) {
                Ok(result) => return (result, tier.name()),
                Err(unavailable) => {
                    // Silent fallback: recorded for diagnostics only.
                    log::warn!(
                        "{} tier unavailable ({}): {}",
                        tier.name(),
                        unavailable.category,
                        unavailable.detail
                    );
                    metrics::record(MetricEvent::TierUnavailable {
                        category: unavailable.category,
                    });
                }
            }
        }
        // Unreachable with the rule tier installed, but stay total.
        (InterpretationResult::answer(crate::rules::help_text()), "rules")
    }

    /// Process one utterance end to end: capture context, resolve, execute
    /// the batch, log the exchange, return the response.
    pub fn dispatch(
        &mut self,
        host: &mut dyn SpreadsheetHost,
        utterance: &str,
    ) -> DispatchOutcome {
        if self.session.submit().is_err() {
            return DispatchOutcome {
                response: BUSY_PROMPT.to_string(),
                tier: None,
                reports: Vec::new(),
            };
        }
        let outcome = self.run(host, utterance);
        self.session.complete();
        outcome
    }

    fn run(&mut self, host: &mut dyn SpreadsheetHost, utterance: &str) -> DispatchOutcome {
        let context = build_context(host);

        if context.row_count == 0 {
            metrics::record(MetricEvent::NoSelection);
            self.log.append(utterance, SELECT_DATA_PROMPT);
            return DispatchOutcome {
                response: SELECT_DATA_PROMPT.to_string(),
                tier: None,
                reports: Vec::new(),
            };
        }

        let (result, tier) = self.interpret(utterance, &context);
        metrics::record(if tier == "assist" {
            MetricEvent::AssistResolved
        } else {
            MetricEvent::RulesResolved
        });

        // Operations execute before the response text is surfaced, in
        // list order, each committed before the next.
        let fallback_target = host.selection().ok().flatten();
        let reports = apply_batch(host, &result.operations, fallback_target);

        let response = render_response(&result, &reports);
        self.log.append(utterance, summarize(&response));

        DispatchOutcome { response, tier: Some(tier), reports }
    }

    /// The session's exchange transcript (most recent entries).
    pub fn transcript(&self) -> &SessionLog {
        &self.log
    }
}

fn render_response(result: &InterpretationResult, reports: &[OpReport]) -> String {
    let mut response = result.explanation.clone();
    for report in reports {
        response.push('\n');
        match &report.outcome {
            Ok(detail) => response.push_str(detail),
            Err(err) => {
                response.push_str(&format!("Operation {} ({}) failed: {}", report.index + 1, report.kind, err));
            }
        }
    }
    response
}

/// First line, bounded, for the session log.
fn summarize(response: &str) -> String {
    let first = response.lines().next().unwrap_or("");
    if first.len() > 120 {
        let cut = first
            .char_indices()
            .take_while(|(i, _)| *i < 117)
            .last()
            .map(|(i, c)| i + c.len_utf8())
            .unwrap_or(0);
        format!("{}...", &first[..cut])
    } else {
        first.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gridmind_host::GridSheet;

    /// Interpreter double that always declines.
    struct DownTier;
    impl Interpreter for DownTier {
        fn name(&self) -> &'static str {
            "assist"
        }
        fn try_interpret(
            &self,
            _: &str,
            _: &SpreadsheetContext,
        ) -> Result<InterpretationResult, TierUnavailable> {
            Err(TierUnavailable::new("network", "connection refused"))
        }
    }

    /// Interpreter double that panics if invoked.
    struct MustNotRun;
    impl Interpreter for MustNotRun {
        fn name(&self) -> &'static str {
            "assist"
        }
        fn try_interpret(
            &self,
            _: &str,
            _: &SpreadsheetContext,
        ) -> Result<InterpretationResult, TierUnavailable> {
            panic!("tier must not be invoked");
        }
    }

    fn rule_only_dispatcher() -> Dispatcher {
        Dispatcher::new(vec![Box::new(DownTier), Box::new(crate::rules::RuleInterpreter)])
    }

    #[test]
    fn test_empty_selection_short_circuits_both_tiers() {
        let mut dispatcher = Dispatcher::new(vec![
            Box::new(MustNotRun),
            Box::new(crate::rules::RuleInterpreter),
        ]);
        let mut sheet = GridSheet::from_rows("S", &[vec!["1".into()]]);
        sheet.clear_selection();

        let outcome = dispatcher.dispatch(&mut sheet, "sum everything");
        assert_eq!(outcome.response, SELECT_DATA_PROMPT);
        assert!(outcome.tier.is_none());
        assert!(outcome.reports.is_empty());
    }

    #[test]
    fn test_fallback_is_silent_and_resolves_via_rules() {
        let mut dispatcher = rule_only_dispatcher();
        let mut sheet = GridSheet::from_rows(
            "Sheet1",
            &[vec!["1".into()], vec!["2".into()], vec!["3".into()]],
        );
        let outcome = dispatcher.dispatch(&mut sheet, "sum the selected column");
        assert_eq!(outcome.tier, Some("rules"));
        // No mention of the failed assist attempt anywhere in the response.
        assert!(!outcome.response.to_lowercase().contains("network"));
        assert!(!outcome.response.to_lowercase().contains("unavailable"));
        assert!(outcome.response.contains("SUM"));
    }

    #[test]
    fn test_transcript_records_exchanges_in_order() {
        let mut dispatcher = rule_only_dispatcher();
        let mut sheet = GridSheet::from_rows("S", &[vec!["1".into(), "2".into()]]);
        dispatcher.dispatch(&mut sheet, "make it bold");
        dispatcher.dispatch(&mut sheet, "highlight it");
        let entries = dispatcher.transcript().entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].utterance, "make it bold");
        assert_eq!(entries[1].utterance, "highlight it");
        assert_eq!(entries[0].index, 0);
    }

    #[test]
    fn test_summarize_bounds_length() {
        let long = "x".repeat(500);
        let s = summarize(&long);
        assert!(s.len() <= 121);
        assert!(s.ends_with("..."));
        assert_eq!(summarize("short\nmore"), "short");
    }
}
