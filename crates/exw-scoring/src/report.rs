use exw_ledger::{ViolationCounters, WarningRecord};
use exw_schemas::{Identity, LogEntry, VerificationOutcome};
use exw_session::EndCause;
use serde::{Deserialize, Serialize};

use crate::{score, ScoringConfig, Verdict};

/// Final session artifact. Built once; the engine only hands out `&IntegrityReport`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntegrityReport {
    pub score: u32,
    pub verdict: Verdict,
    pub total_violations: u32,
    pub was_terminated: bool,
    pub end_cause: Option<EndCause>,
    pub identity: Option<Identity>,
    pub counters: ViolationCounters,
    /// Most recent first, capped at the display limit.
    pub warnings: Vec<WarningRecord>,
    /// Warnings raised over the whole session (uncapped).
    pub warnings_raised: u32,
    /// Full session log in arrival order.
    pub log: Vec<LogEntry>,
    /// Oral verification record (not scored).
    pub verification: VerificationOutcome,
    pub started_at_ms: Option<u64>,
    pub ended_at_ms: Option<u64>,
    pub completed_at_ms: u64,
}

/// Everything the scorer reads at the Completed transition.
pub struct ReportInputs<'a> {
    pub counters: ViolationCounters,
    pub warning_log: &'a [WarningRecord],
    pub log: &'a [LogEntry],
    pub was_terminated: bool,
    pub end_cause: Option<EndCause>,
    pub identity: Option<&'a Identity>,
    pub verification: &'a VerificationOutcome,
    pub started_at_ms: Option<u64>,
    pub ended_at_ms: Option<u64>,
    pub completed_at_ms: u64,
}

pub fn build_report(cfg: &ScoringConfig, inp: ReportInputs<'_>) -> IntegrityReport {
    let s = score(cfg, &inp.counters);
    let warnings = inp
        .warning_log
        .iter()
        .rev()
        .take(cfg.warning_display_limit)
        .cloned()
        .collect();

    IntegrityReport {
        score: s.score,
        verdict: s.verdict,
        total_violations: s.total_violations,
        was_terminated: inp.was_terminated,
        end_cause: inp.end_cause,
        identity: inp.identity.cloned(),
        counters: inp.counters,
        warnings,
        warnings_raised: inp.warning_log.len() as u32,
        log: inp.log.to_vec(),
        verification: inp.verification.clone(),
        started_at_ms: inp.started_at_ms,
        ended_at_ms: inp.ended_at_ms,
        completed_at_ms: inp.completed_at_ms,
    }
}
