use exw_ledger::{ViolationCounters, WarningBudget, WarningRecord};
use exw_schemas::LogEntry;
use exw_session::{SessionState, TransitionError};
use exw_signals::SuppressReason;
use exw_typing::{IntervalReason, TypingBaseline};
use serde::{Deserialize, Serialize};

/// Result of delivering one raw signal or event.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum IngestOutcome {
    Accepted {
        /// Arrival `seq` assigned by the normalizer.
        seq: u64,
        /// Warnings raised while handling this event (typing signals included).
        warnings_raised: u32,
        /// True when this event fired the terminate effect.
        terminated: bool,
    },
    Discarded {
        reason: DiscardReason,
    },
}

impl IngestOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, IngestOutcome::Accepted { .. })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DiscardReason {
    /// Session not InProgress.
    NotInProgress(SessionState),
    /// Normalizer produced no event.
    Suppressed(SuppressReason),
    /// Canonical event `seq` already delivered.
    Duplicate,
    /// Keystroke interval rejected by the estimator.
    BadInterval(IntervalReason),
}

impl std::fmt::Display for DiscardReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DiscardReason::NotInProgress(s) => write!(f, "session {}", s.as_str()),
            DiscardReason::Suppressed(r) => write!(f, "suppressed: {:?}", r),
            DiscardReason::Duplicate => write!(f, "duplicate seq"),
            DiscardReason::BadInterval(r) => write!(f, "bad interval: {:?}", r),
        }
    }
}

/// Result of [`crate::MonitorEngine::apply`] for one scripted input.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Applied {
    Ingested(IngestOutcome),
    Transitioned(SessionState),
    Refused(TransitionError),
}

/// Read-only view for presentation layers. Cheap to build; owns its data.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MonitorSnapshot {
    pub state: SessionState,
    /// `SETUP`, `IN_PROGRESS`, ..., `TERMINATED`.
    pub state_label: String,
    pub counters: ViolationCounters,
    pub budget: WarningBudget,
    pub baseline: TypingBaseline,
    pub burst_run: u32,
    pub events_recorded: u64,
    /// Most recent first.
    pub recent_warnings: Vec<WarningRecord>,
    /// Most recent first.
    pub recent_log: Vec<LogEntry>,
    pub report_ready: bool,
}
