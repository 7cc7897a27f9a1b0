//! Configuration for GridMind.
//!
//! Settings live in `~/.config/gridmind/settings.json`. API keys are never
//! stored there: they come from the system keychain or the environment.

pub mod assist;
pub mod settings;

pub use assist::{AssistDiagnostics, AssistStatus, KeyLookup, KeySource, ResolvedAssistConfig};
pub use settings::{AssistSettings, Settings};
