//! Warning escalation policy.
//!
//! Check-and-increment happens inside one `&mut self` call, so two warnings
//! can never both observe "count == max - 1". Callers that share an engine
//! across tasks must still serialize access to it (the daemon holds it behind
//! a mutex).

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WarningBudget {
    /// Warnings raised so far. Keeps growing after exhaustion.
    pub count: u32,
    pub max: u32,
}

impl WarningBudget {
    pub fn remaining(&self) -> u32 {
        self.max.saturating_sub(self.count)
    }

    pub fn is_exhausted(&self) -> bool {
        self.count >= self.max
    }
}

/// One entry of the warning log.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WarningRecord {
    /// 1-based position in the log.
    pub number: u32,
    pub ts_ms: u64,
    pub title: String,
    pub message: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EscalationAction {
    /// Budget not yet exhausted.
    Continue,
    /// This warning exhausted the budget; caller must end the session.
    Terminate,
    /// Budget was already exhausted earlier; logged only.
    AlreadyTerminated,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EscalationDecision {
    pub action: EscalationAction,
    pub count: u32,
    pub remaining: u32,
}

impl EscalationDecision {
    pub fn requires_termination(&self) -> bool {
        self.action == EscalationAction::Terminate
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EscalationState {
    budget: WarningBudget,
    log: Vec<WarningRecord>,
    terminate_fired: bool,
}

impl EscalationState {
    pub fn new(max_warnings: u32) -> Self {
        Self {
            budget: WarningBudget {
                count: 0,
                max: max_warnings,
            },
            log: Vec::new(),
            terminate_fired: false,
        }
    }

    pub fn budget(&self) -> WarningBudget {
        self.budget
    }

    pub fn terminate_fired(&self) -> bool {
        self.terminate_fired
    }

    /// Full warning log in raise order.
    pub fn log(&self) -> &[WarningRecord] {
        &self.log
    }

    /// Most-recent-first view capped at `limit`.
    pub fn recent(&self, limit: usize) -> Vec<WarningRecord> {
        self.log.iter().rev().take(limit).cloned().collect()
    }

    /// Increment, log, and decide. Terminate is returned at most once per session.
    pub fn raise_warning(
        &mut self,
        ts_ms: u64,
        title: impl Into<String>,
        message: impl Into<String>,
    ) -> EscalationDecision {
        self.budget.count = self.budget.count.saturating_add(1);
        self.log.push(WarningRecord {
            number: self.budget.count,
            ts_ms,
            title: title.into(),
            message: message.into(),
        });

        let action = if self.terminate_fired {
            EscalationAction::AlreadyTerminated
        } else if self.budget.is_exhausted() {
            self.terminate_fired = true;
            EscalationAction::Terminate
        } else {
            EscalationAction::Continue
        };

        EscalationDecision {
            action,
            count: self.budget.count,
            remaining: self.budget.remaining(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminate_fires_once_at_max() {
        let mut esc = EscalationState::new(5);
        let actions: Vec<_> = (0..8)
            .map(|i| esc.raise_warning(i * 1_000, "W", "m").action)
            .collect();
        assert_eq!(
            actions,
            vec![
                EscalationAction::Continue,
                EscalationAction::Continue,
                EscalationAction::Continue,
                EscalationAction::Continue,
                EscalationAction::Terminate,
                EscalationAction::AlreadyTerminated,
                EscalationAction::AlreadyTerminated,
                EscalationAction::AlreadyTerminated,
            ]
        );
        assert_eq!(esc.budget().count, 8);
        assert_eq!(esc.log().len(), 8);
    }

    #[test]
    fn recent_is_most_recent_first_and_capped() {
        let mut esc = EscalationState::new(5);
        for i in 0..4 {
            esc.raise_warning(i, format!("W{i}"), "m");
        }
        let recent = esc.recent(2);
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].title, "W3");
        assert_eq!(recent[1].title, "W2");
    }
}
