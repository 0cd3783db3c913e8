//! exw-typing
//!
//! Typing rhythm baseline + anomaly / burst detection.
//!
//! Rules:
//! - Baseline is computed once, from the first `baseline_samples` valid
//!   intervals (mean + population std-dev), and is never recomputed
//! - After that, an interval is anomalous only if it deviates by more than
//!   `sigma_multiplier` std-devs AND is shorter than `anomaly_ceiling_ms`
//! - Anomalies feed an accumulator with hysteresis; bursts feed a decaying run
//! - Negative or non-finite intervals are dropped without touching state
//!
//! Deterministic, pure logic. No IO, no time.

mod engine;
mod types;

pub use engine::observe_interval;
pub use types::*;
