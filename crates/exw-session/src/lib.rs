//! Exam session state machine.
//!
//! # Invariants
//!
//! - **One direction only**: Setup -> InProgress -> Verification -> Completed.
//!   No state is revisited; there is no reset.
//!
//! - **Gate on entry**: InProgress is reachable only when every required
//!   capability check passed and both identity fields are non-empty.
//!
//! - **Termination is not a separate state**: a forced end travels the same
//!   path as a normal submission and is distinguished by `was_terminated`
//!   on `Completed`.
//!
//! - **Only InProgress accepts proctoring events.**
//!
//! Illegal transitions return [`TransitionError`] and leave state untouched.
//! All logic is pure and deterministic: no IO, no clock and no randomness.

use exw_schemas::{Capabilities, Identity};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

/// Which capability checks gate Setup -> InProgress.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    pub require_camera: bool,
    pub require_microphone: bool,
    pub require_face: bool,
    pub require_fullscreen: bool,
}

impl SessionConfig {
    pub fn defaults() -> Self {
        Self {
            require_camera: true,
            require_microphone: true,
            require_face: true,
            require_fullscreen: true,
        }
    }
}

// ---------------------------------------------------------------------------
// States
// ---------------------------------------------------------------------------

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SessionState {
    Setup,
    InProgress,
    Verification,
    Completed { was_terminated: bool },
}

impl SessionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionState::Setup => "SETUP",
            SessionState::InProgress => "IN_PROGRESS",
            SessionState::Verification => "VERIFICATION",
            SessionState::Completed {
                was_terminated: false,
            } => "COMPLETED",
            SessionState::Completed {
                was_terminated: true,
            } => "TERMINATED",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionState::Completed { .. })
    }
}

/// Why the exam stopped accepting events.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EndCause {
    TimeExpired,
    Submitted,
    /// Warning budget exhausted.
    Terminated,
}

/// A failed Setup -> InProgress gate item.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Precondition {
    Camera,
    Microphone,
    Face,
    Fullscreen,
    StudentName,
    StudentId,
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TransitionError {
    /// The requested transition is not legal from the current state.
    IllegalTransition {
        from: SessionState,
        action: &'static str,
    },
    /// Setup gate refused: these checks failed.
    PreconditionsFailed { missing: Vec<Precondition> },
}

impl std::fmt::Display for TransitionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransitionError::IllegalTransition { from, action } => {
                write!(f, "illegal session transition: {} + {}", from.as_str(), action)
            }
            TransitionError::PreconditionsFailed { missing } => {
                write!(f, "session preconditions failed: {:?}", missing)
            }
        }
    }
}

impl std::error::Error for TransitionError {}

// ---------------------------------------------------------------------------
// Gate
// ---------------------------------------------------------------------------

/// Every failed gate item, in a stable order. Empty means the gate passes.
pub fn check_preconditions(
    cfg: &SessionConfig,
    identity: &Identity,
    caps: &Capabilities,
) -> Vec<Precondition> {
    let mut missing = Vec::new();
    if cfg.require_camera && !caps.camera {
        missing.push(Precondition::Camera);
    }
    if cfg.require_microphone && !caps.microphone {
        missing.push(Precondition::Microphone);
    }
    if cfg.require_face && !caps.face {
        missing.push(Precondition::Face);
    }
    if cfg.require_fullscreen && !caps.fullscreen {
        missing.push(Precondition::Fullscreen);
    }
    if identity.student_name.trim().is_empty() {
        missing.push(Precondition::StudentName);
    }
    if identity.student_id.trim().is_empty() {
        missing.push(Precondition::StudentId);
    }
    missing
}

// ---------------------------------------------------------------------------
// Machine
// ---------------------------------------------------------------------------

/// One live instance per exam attempt.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionMachine {
    cfg: SessionConfig,
    state: SessionState,
    identity: Option<Identity>,
    end_cause: Option<EndCause>,
    started_at_ms: Option<u64>,
    ended_at_ms: Option<u64>,
    completed_at_ms: Option<u64>,
}

impl SessionMachine {
    pub fn new(cfg: SessionConfig) -> Self {
        Self {
            cfg,
            state: SessionState::Setup,
            identity: None,
            end_cause: None,
            started_at_ms: None,
            ended_at_ms: None,
            completed_at_ms: None,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    pub fn end_cause(&self) -> Option<EndCause> {
        self.end_cause
    }

    pub fn started_at_ms(&self) -> Option<u64> {
        self.started_at_ms
    }

    pub fn ended_at_ms(&self) -> Option<u64> {
        self.ended_at_ms
    }

    pub fn completed_at_ms(&self) -> Option<u64> {
        self.completed_at_ms
    }

    /// Only InProgress accepts proctoring events.
    pub fn accepts_events(&self) -> bool {
        self.state == SessionState::InProgress
    }

    /// Setup -> InProgress.
    pub fn begin(
        &mut self,
        identity: Identity,
        caps: &Capabilities,
        ts_ms: u64,
    ) -> Result<(), TransitionError> {
        self.expect(SessionState::Setup, "begin")?;

        let missing = check_preconditions(&self.cfg, &identity, caps);
        if !missing.is_empty() {
            return Err(TransitionError::PreconditionsFailed { missing });
        }

        self.identity = Some(identity);
        self.started_at_ms = Some(ts_ms);
        self.state = SessionState::InProgress;
        Ok(())
    }

    /// InProgress -> Verification (timer, submission, or forced termination).
    pub fn end_exam(&mut self, cause: EndCause, ts_ms: u64) -> Result<(), TransitionError> {
        let action = match cause {
            EndCause::TimeExpired => "time_expired",
            EndCause::Submitted => "submit",
            EndCause::Terminated => "terminate",
        };
        self.expect(SessionState::InProgress, action)?;

        self.end_cause = Some(cause);
        self.ended_at_ms = Some(ts_ms);
        self.state = SessionState::Verification;
        Ok(())
    }

    /// Verification -> Completed. Returns the `was_terminated` flag.
    pub fn complete_verification(&mut self, ts_ms: u64) -> Result<bool, TransitionError> {
        self.expect(SessionState::Verification, "complete_verification")?;

        let was_terminated = self.end_cause == Some(EndCause::Terminated);
        self.completed_at_ms = Some(ts_ms);
        self.state = SessionState::Completed { was_terminated };
        Ok(was_terminated)
    }

    fn expect(&self, expected: SessionState, action: &'static str) -> Result<(), TransitionError> {
        if self.state != expected {
            return Err(TransitionError::IllegalTransition {
                from: self.state,
                action,
            });
        }
        Ok(())
    }
}
