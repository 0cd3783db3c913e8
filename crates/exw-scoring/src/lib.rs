//! exw-scoring
//!
//! Final integrity score + verdict, computed once at session completion.
//!
//! ```text
//! total_violations = total_warnings + tab_switches + paste_events
//!                  + floor(gaze_away_count / gaze_divisor)
//! score            = max(0, 100 - total_violations * violation_weight)
//! ```
//!
//! Focus losses, bursts and anomalies contribute only through the warnings
//! they raised.

mod report;

pub use report::{build_report, IntegrityReport, ReportInputs};

use exw_ledger::ViolationCounters;
use serde::{Deserialize, Serialize};

pub const MAX_SCORE: u32 = 100;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoringConfig {
    /// Points deducted per weighted violation.
    pub violation_weight: u32,
    /// Gaze-away events per weighted violation.
    pub gaze_divisor: u32,
    /// Scores at or above this are `High`.
    pub high_threshold: u32,
    /// Scores at or above this (and below `high_threshold`) are `Medium`.
    pub medium_threshold: u32,
    /// Warning log entries kept in the report (most recent first).
    pub warning_display_limit: usize,
}

impl ScoringConfig {
    pub fn defaults() -> Self {
        Self {
            violation_weight: 15,
            gaze_divisor: 2,
            high_threshold: 80,
            medium_threshold: 50,
            warning_display_limit: 10,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Verdict {
    High,
    Medium,
    Low,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub total_violations: u32,
    pub score: u32,
    pub verdict: Verdict,
}

pub fn total_violations(cfg: &ScoringConfig, c: &ViolationCounters) -> u32 {
    let gaze = c.gaze_away_count / cfg.gaze_divisor.max(1);
    c.total_warnings
        .saturating_add(c.tab_switches)
        .saturating_add(c.paste_events)
        .saturating_add(gaze)
}

pub fn verdict_for(cfg: &ScoringConfig, score: u32) -> Verdict {
    if score >= cfg.high_threshold {
        Verdict::High
    } else if score >= cfg.medium_threshold {
        Verdict::Medium
    } else {
        Verdict::Low
    }
}

pub fn score(cfg: &ScoringConfig, c: &ViolationCounters) -> ScoreBreakdown {
    let total = total_violations(cfg, c);
    let penalty = total.saturating_mul(cfg.violation_weight);
    let score = MAX_SCORE.saturating_sub(penalty);
    ScoreBreakdown {
        total_violations: total,
        score,
        verdict: verdict_for(cfg, score),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verdict_boundaries() {
        let cfg = ScoringConfig::defaults();
        assert_eq!(verdict_for(&cfg, 100), Verdict::High);
        assert_eq!(verdict_for(&cfg, 80), Verdict::High);
        assert_eq!(verdict_for(&cfg, 79), Verdict::Medium);
        assert_eq!(verdict_for(&cfg, 50), Verdict::Medium);
        assert_eq!(verdict_for(&cfg, 49), Verdict::Low);
        assert_eq!(verdict_for(&cfg, 0), Verdict::Low);
    }

    #[test]
    fn huge_counters_saturate_to_zero() {
        let c = ViolationCounters {
            total_warnings: u32::MAX,
            tab_switches: u32::MAX,
            ..Default::default()
        };
        let s = score(&ScoringConfig::defaults(), &c);
        assert_eq!(s.score, 0);
        assert_eq!(s.total_violations, u32::MAX);
    }
}
