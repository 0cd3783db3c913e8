//! exw-schemas
//!
//! Wire vocabulary shared by the normalizer, the engine, the CLI and the
//! daemon. No behavior lives here; every type is plain serde data.
//!
//! Timestamps are monotonic session milliseconds supplied by the caller
//! (`ts_ms`). Nothing in this workspace reads a wall clock to build them.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Raw platform signals
// ---------------------------------------------------------------------------

/// Input context used when a keydown does not name one.
pub const DEFAULT_INPUT_CONTEXT: &str = "answer";

fn default_input_context() -> String {
    DEFAULT_INPUT_CONTEXT.to_string()
}

fn default_face_present() -> bool {
    true
}

/// A signal exactly as the browser / capture collaborators deliver it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RawSignal {
    /// `visibilitychange`; `hidden == true` means the exam tab left view.
    VisibilityChange { ts_ms: u64, hidden: bool },
    WindowBlur { ts_ms: u64 },
    WindowFocus { ts_ms: u64 },
    /// Clipboard paste with its full text payload. Only length + a bounded
    /// preview survive normalization.
    Paste { ts_ms: u64, text: String },
    /// A keydown inside an answer field identified by `context`.
    KeyDown {
        ts_ms: u64,
        #[serde(default = "default_input_context")]
        context: String,
    },
    /// Pre-debounced gaze-away from the face-tracking collaborator.
    GazeAway { ts_ms: u64 },
    /// Pre-debounced gaze-back from the face-tracking collaborator.
    GazeBack { ts_ms: u64 },
    /// Raw normalized gaze position (0..1 on both axes). Only consumed when
    /// the engine runs its own gaze debouncer.
    GazeSample {
        ts_ms: u64,
        x: f64,
        y: f64,
        #[serde(default = "default_face_present")]
        face_present: bool,
    },
}

impl RawSignal {
    pub fn ts_ms(&self) -> u64 {
        match self {
            RawSignal::VisibilityChange { ts_ms, .. }
            | RawSignal::WindowBlur { ts_ms }
            | RawSignal::WindowFocus { ts_ms }
            | RawSignal::Paste { ts_ms, .. }
            | RawSignal::KeyDown { ts_ms, .. }
            | RawSignal::GazeAway { ts_ms }
            | RawSignal::GazeBack { ts_ms }
            | RawSignal::GazeSample { ts_ms, .. } => *ts_ms,
        }
    }
}

// ---------------------------------------------------------------------------
// Canonical events
// ---------------------------------------------------------------------------

/// Canonical, immutable proctoring event.
///
/// `seq` is assigned by the normalizer in arrival order and is the identity
/// the ledger uses to count each upstream event exactly once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub seq: u64,
    pub ts_ms: u64,
    pub kind: EventKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EventKind {
    TabHidden,
    TabVisible,
    WindowBlur,
    WindowFocus,
    Paste { text_len: usize, preview: String },
    /// Milliseconds since the previous keydown in the same input context.
    /// Signed so that clock anomalies reach the estimator (which drops them).
    KeyInterval { ms: f64 },
    GazeAway,
    GazeBack,
}

impl EventKind {
    /// Stable name used in logs and audit records.
    pub fn name(&self) -> &'static str {
        match self {
            EventKind::TabHidden => "TAB_HIDDEN",
            EventKind::TabVisible => "TAB_VISIBLE",
            EventKind::WindowBlur => "WINDOW_BLUR",
            EventKind::WindowFocus => "WINDOW_FOCUS",
            EventKind::Paste { .. } => "PASTE",
            EventKind::KeyInterval { .. } => "KEY_INTERVAL",
            EventKind::GazeAway => "GAZE_AWAY",
            EventKind::GazeBack => "GAZE_BACK",
        }
    }
}

// ---------------------------------------------------------------------------
// Session setup / verification payloads
// ---------------------------------------------------------------------------

/// Identity fields the student confirms during setup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub student_name: String,
    pub student_id: String,
}

impl Identity {
    pub fn new(student_name: impl Into<String>, student_id: impl Into<String>) -> Self {
        Self {
            student_name: student_name.into(),
            student_id: student_id.into(),
        }
    }
}

/// Device capability check results reported by the capture collaborators.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capabilities {
    #[serde(default)]
    pub camera: bool,
    #[serde(default)]
    pub microphone: bool,
    #[serde(default)]
    pub face: bool,
    #[serde(default)]
    pub fullscreen: bool,
}

impl Capabilities {
    pub fn all_ready() -> Self {
        Self {
            camera: true,
            microphone: true,
            face: true,
            fullscreen: true,
        }
    }
}

/// One oral follow-up answer. The transcript is opaque to the core.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationResponse {
    pub question: String,
    pub transcript: String,
}

/// Completion report from the oral-verification collaborator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationOutcome {
    #[serde(default)]
    pub responses: Vec<VerificationResponse>,
    /// True when speech capture was unsupported or the step was skipped.
    #[serde(default)]
    pub skipped: bool,
}

impl VerificationOutcome {
    pub fn skipped() -> Self {
        Self {
            responses: Vec::new(),
            skipped: true,
        }
    }
}

// ---------------------------------------------------------------------------
// Session input script
// ---------------------------------------------------------------------------

/// Everything that can be delivered to an engine, in one replayable stream.
///
/// One JSON object per line in `exw replay` scripts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum SessionInput {
    Start {
        ts_ms: u64,
        identity: Identity,
        capabilities: Capabilities,
    },
    Signal {
        signal: RawSignal,
    },
    /// An already-normalized event (replay of a recorded canonical stream).
    Event {
        event: Event,
    },
    Submit {
        ts_ms: u64,
    },
    TimeExpired {
        ts_ms: u64,
    },
    VerificationComplete {
        ts_ms: u64,
        outcome: VerificationOutcome,
    },
}

// ---------------------------------------------------------------------------
// Session log
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Warning,
    Violation,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "INFO",
            Severity::Warning => "WARNING",
            Severity::Violation => "VIOLATION",
            Severity::Critical => "CRITICAL",
        }
    }
}

/// Human-readable audit line surfaced to the operator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub ts_ms: u64,
    pub severity: Severity,
    pub message: String,
}

impl LogEntry {
    pub fn new(ts_ms: u64, severity: Severity, message: impl Into<String>) -> Self {
        Self {
            ts_ms,
            severity,
            message: message.into(),
        }
    }
}
