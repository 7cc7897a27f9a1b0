//! Local assist usage metrics.
//!
//! Tracks how utterances resolve, stored in
//! `~/.config/gridmind/assist_metrics.json`. No network, no telemetry
//! service. Tier fallbacks are recorded here and nowhere else: the user
//! only ever sees the final response.
//!
//! Writes are debounced: updates accumulate in memory and flush to disk
//! at most every 5 seconds, or when `flush` is called on process exit.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Instant;

/// Debounce interval: don't write more often than this.
const FLUSH_INTERVAL_SECS: u64 = 5;

struct MetricsState {
    data: AssistMetrics,
    dirty: bool,
    last_write: Instant,
}

static METRICS: Mutex<Option<MetricsState>> = Mutex::new(None);

/// Local usage counters.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AssistMetrics {
    /// Utterances resolved by the assist tier
    #[serde(default)]
    pub assist_resolved: u64,
    /// Utterances resolved by the rule tier
    #[serde(default)]
    pub rules_resolved: u64,
    /// Utterances rejected by the empty-selection guard
    #[serde(default)]
    pub no_selection: u64,
    /// Tier-unavailable counts by category (network, timeout, status,
    /// malformed, disabled)
    #[serde(default, skip_serializing_if = "std::collections::HashMap::is_empty")]
    pub unavailable: std::collections::HashMap<String, u64>,
}

/// Returns the metrics file path for display or opening.
pub fn metrics_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("gridmind")
        .join("assist_metrics.json")
}

fn load() -> AssistMetrics {
    let path = metrics_path();
    if let Ok(data) = std::fs::read_to_string(&path) {
        serde_json::from_str(&data).unwrap_or_default()
    } else {
        AssistMetrics::default()
    }
}

fn write_to_disk(metrics: &AssistMetrics) {
    let path = metrics_path();
    if let Some(parent) = path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }
    if let Ok(json) = serde_json::to_string_pretty(metrics) {
        let _ = std::fs::write(&path, json);
    }
}

fn with_state<F>(f: F)
where
    F: FnOnce(&mut MetricsState),
{
    let mut guard = METRICS.lock().unwrap_or_else(|e| e.into_inner());
    let state = guard.get_or_insert_with(|| MetricsState {
        data: load(),
        dirty: false,
        last_write: Instant::now(),
    });
    f(state);

    // Debounced flush: write only if dirty AND enough time has passed
    if state.dirty && state.last_write.elapsed().as_secs() >= FLUSH_INTERVAL_SECS {
        write_to_disk(&state.data);
        state.dirty = false;
        state.last_write = Instant::now();
    }
}

/// Record a metric event. Accumulates in memory, flushes on a 5s debounce.
pub fn record(event: MetricEvent) {
    with_state(|state| {
        match event {
            MetricEvent::AssistResolved => {
                state.data.assist_resolved += 1;
            }
            MetricEvent::RulesResolved => {
                state.data.rules_resolved += 1;
            }
            MetricEvent::NoSelection => {
                state.data.no_selection += 1;
            }
            MetricEvent::TierUnavailable { category } => {
                *state.data.unavailable.entry(category.to_string()).or_insert(0) += 1;
            }
        }
        state.dirty = true;
    });
}

/// Flush any pending metrics to disk. Call on process exit.
pub fn flush() {
    let mut guard = METRICS.lock().unwrap_or_else(|e| e.into_inner());
    if let Some(state) = guard.as_mut() {
        if state.dirty {
            write_to_disk(&state.data);
            state.dirty = false;
            state.last_write = Instant::now();
        }
    }
}

/// Metric event types.
pub enum MetricEvent {
    AssistResolved,
    RulesResolved,
    NoSelection,
    TierUnavailable { category: &'static str },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_serde_roundtrip() {
        let mut metrics = AssistMetrics::default();
        metrics.assist_resolved = 3;
        metrics.unavailable.insert("timeout".into(), 2);

        let json = serde_json::to_string(&metrics).unwrap();
        let back: AssistMetrics = serde_json::from_str(&json).unwrap();
        assert_eq!(back.assist_resolved, 3);
        assert_eq!(back.unavailable.get("timeout"), Some(&2));
    }

    #[test]
    fn test_empty_unavailable_map_is_omitted() {
        let json = serde_json::to_string(&AssistMetrics::default()).unwrap();
        assert!(!json.contains("unavailable"));
    }
}
