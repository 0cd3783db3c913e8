//! exw-ledger
//!
//! Violation ledger + warning escalation.
//!
//! Invariants:
//! - The ledger is the only writer of [`ViolationCounters`]; counters never decrease
//! - Each upstream event (by `seq`) is counted exactly once; re-deliveries are no-ops
//! - Every warning goes through one choke point into [`EscalationState::raise_warning`]
//! - Budget exhaustion fires the terminate effect exactly once
//!
//! Pure deterministic logic. No IO, no wall-clock.

mod engine;
mod escalation;
mod types;

pub use engine::{record_event, record_typing};
pub use escalation::{
    EscalationAction, EscalationDecision, EscalationState, WarningBudget, WarningRecord,
};
pub use types::*;

/// Session-relative `mm:ss` rendering used in warning messages.
pub fn fmt_clock(ts_ms: u64) -> String {
    let secs = ts_ms / 1_000;
    format!("{:02}:{:02}", secs / 60, secs % 60)
}
