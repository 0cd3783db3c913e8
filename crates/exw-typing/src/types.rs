use serde::{Deserialize, Serialize};

/// Thresholds for baseline, anomaly and burst detection.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TypingConfig {
    /// Valid intervals needed before the baseline is fixed.
    pub baseline_samples: u64,

    /// Deviation threshold expressed in baseline std-devs (three-sigma rule).
    pub sigma_multiplier: f64,

    /// Only intervals strictly below this count as anomalous, however far
    /// they deviate.
    pub anomaly_ceiling_ms: f64,

    /// Added to the accumulator per anomalous interval.
    pub anomaly_increment: f64,

    /// Accumulator must exceed this to emit one `Anomaly` signal (then resets).
    pub anomaly_emit_threshold: f64,

    /// Intervals strictly below this grow the burst run; others decay it by 1.
    pub burst_threshold_ms: f64,

    /// Burst run length that emits one `Burst` signal (then resets).
    pub burst_run_length: u32,
}

impl TypingConfig {
    pub fn defaults() -> Self {
        Self {
            baseline_samples: 20,
            sigma_multiplier: 3.0,
            anomaly_ceiling_ms: 30.0,
            anomaly_increment: 0.5,
            anomaly_emit_threshold: 5.0,
            burst_threshold_ms: 50.0,
            burst_run_length: 10,
        }
    }
}

/// Fixed statistical reference for one session.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TypingBaseline {
    /// Valid intervals observed (keeps counting after establishment).
    pub sample_count: u64,
    pub mean_ms: f64,
    pub std_dev_ms: f64,
    /// Flips to true exactly once; mean/std-dev are frozen from then on.
    pub established: bool,
    pub anomaly_accumulator: f64,
}

/// Estimator state (owned by the engine, mutated only by [`crate::observe_interval`]).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TypingState {
    pub baseline: TypingBaseline,
    /// Current burst run (decays by 1 on each non-burst interval, floored at 0).
    pub burst_run: u32,
    /// Samples collected until the baseline is fixed; emptied afterwards.
    pub(crate) pending: Vec<f64>,
}

impl TypingState {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Upstream signal for the violation ledger.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TypingSignal {
    /// Accumulated anomalous intervals crossed the emit threshold.
    Anomaly {
        interval_ms: f64,
        mean_ms: f64,
        threshold_ms: f64,
    },
    /// A run of fast intervals reached the burst run length.
    Burst { run_length: u32 },
}

/// Per-interval verdict.
#[derive(Clone, Debug, PartialEq)]
pub struct IntervalDecision {
    pub reason: IntervalReason,
    /// True when this interval fixed the baseline.
    pub established_now: bool,
    /// True when this interval matched the anomaly rule.
    pub anomalous: bool,
    pub signals: Vec<TypingSignal>,
}

impl IntervalDecision {
    pub(crate) fn dropped(reason: IntervalReason) -> Self {
        Self {
            reason,
            established_now: false,
            anomalous: false,
            signals: Vec::new(),
        }
    }

    pub fn is_accepted(&self) -> bool {
        self.reason == IntervalReason::Accepted
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IntervalReason {
    Accepted,
    /// NaN or infinite.
    Malformed,
    /// Clock went backwards.
    Negative,
}
