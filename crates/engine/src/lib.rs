//! Command interpretation and execution engine.
//!
//! The flow for one utterance: capture a bounded context snapshot, resolve
//! the utterance through an ordered list of interpretation tiers (assist
//! service first, deterministic rules as the total fallback), then apply
//! the resulting operation batch to the live host one operation at a time.
//!
//! Nothing here is fatal to a session: host read errors degrade the
//! context, assist failures fall back silently, and a failing operation is
//! reported inline while the rest of its batch continues.

pub mod assist;
pub mod context;
pub mod dispatch;
pub mod executor;
pub mod feed;
pub mod metrics;
pub mod rules;
pub mod session;

pub use assist::{AssistClient, AssistInterpreter};
pub use context::build_context;
pub use dispatch::{DispatchOutcome, Dispatcher, Interpreter, TierUnavailable};
pub use executor::{apply_batch, OpReport};
pub use feed::{spawn_refresh, ContextFeed, RefreshHandle};
pub use rules::RuleInterpreter;
pub use session::{Session, SessionState, SubmitError};
