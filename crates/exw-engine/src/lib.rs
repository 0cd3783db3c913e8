//! exw-engine
//!
//! One explicit engine object per exam attempt.
//!
//! Flow per delivery:
//! raw signal -> normalizer -> ledger (+ typing estimator for key intervals)
//! -> escalation -> (terminate) -> session machine
//!
//! Rules:
//! - Only InProgress accepts events; anything else is discarded (info log)
//! - Terminate fires once and moves the session to Verification
//! - The report is built once, at Completed, and never changes afterwards
//! - Presentation reads `snapshot()`; it never mutates the engine
//!
//! No IO and no wall-clock: every timestamp is caller-supplied, so replaying
//! the same inputs yields the same report.

mod config;
mod engine;
mod log;
mod types;

pub use config::EngineConfig;
pub use engine::MonitorEngine;
pub use log::SessionLog;
pub use types::{Applied, DiscardReason, IngestOutcome, MonitorSnapshot};
