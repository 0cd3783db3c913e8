use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::escalation::EscalationDecision;

/// Ledger policy thresholds.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerConfig {
    /// Blur-to-focus gaps at or below this are OS focus flicker, not losses.
    pub focus_flicker_ms: u64,

    /// Paste count at which pastes start raising warnings (each paste from here on).
    pub paste_warning_threshold: u32,
}

impl LedgerConfig {
    pub fn defaults() -> Self {
        Self {
            focus_flicker_ms: 500,
            paste_warning_threshold: 2,
        }
    }
}

/// Per-category violation counters. Monotonically non-decreasing.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViolationCounters {
    pub tab_switches: u32,
    pub focus_losses: u32,
    pub paste_events: u32,
    pub gaze_away_count: u32,
    pub typing_burst_count: u32,
    pub anomaly_warnings: u32,
    pub total_warnings: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CounterKind {
    TabSwitch,
    FocusLoss,
    Paste,
    GazeAway,
    TypingBurst,
    TypingAnomaly,
}

/// Ledger state. Counters are readable by anyone, writable only by this crate.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LedgerState {
    pub(crate) counters: ViolationCounters,
    /// Every event `seq` already recorded.
    pub(crate) seen: BTreeSet<u64>,
    /// Hide timestamp awaiting its matching TabVisible.
    pub(crate) pending_hide_ts: Option<u64>,
    /// Blur timestamp awaiting its matching WindowFocus.
    pub(crate) pending_blur_ts: Option<u64>,
}

impl LedgerState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn counters(&self) -> ViolationCounters {
        self.counters
    }

    pub fn has_recorded(&self, seq: u64) -> bool {
        self.seen.contains(&seq)
    }

    /// True while the tab is hidden with no TabVisible seen yet.
    pub fn tab_hidden_since(&self) -> Option<u64> {
        self.pending_hide_ts
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Disposition {
    Recorded,
    /// Event `seq` already recorded; nothing changed.
    Duplicate,
}

/// A warning that went through the escalation policy.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RaisedWarning {
    pub title: String,
    pub message: String,
    pub decision: EscalationDecision,
}

/// What one `record_*` call did.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecordOutcome {
    pub disposition: Disposition,
    pub counted: Option<CounterKind>,
    /// Human-readable line for the session log (no warning implied).
    pub note: Option<String>,
    pub warning: Option<RaisedWarning>,
}

impl RecordOutcome {
    pub(crate) fn recorded() -> Self {
        Self {
            disposition: Disposition::Recorded,
            counted: None,
            note: None,
            warning: None,
        }
    }

    pub(crate) fn duplicate() -> Self {
        Self {
            disposition: Disposition::Duplicate,
            ..Self::recorded()
        }
    }

    pub fn requires_termination(&self) -> bool {
        self.warning
            .as_ref()
            .map(|w| w.decision.requires_termination())
            .unwrap_or(false)
    }
}
