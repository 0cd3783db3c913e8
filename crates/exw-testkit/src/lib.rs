//! exw-testkit
//!
//! Scripted exam sessions for scenario tests and replay fixtures.
//!
//! Timestamps are explicit everywhere so a script reads like a timeline.

use anyhow::{Context, Result};
use exw_engine::{Applied, EngineConfig, MonitorEngine};
use exw_schemas::{
    Capabilities, Identity, RawSignal, SessionInput, VerificationOutcome, VerificationResponse,
    DEFAULT_INPUT_CONTEXT,
};

/// Builds a `Vec<SessionInput>` in delivery order.
#[derive(Debug, Clone, Default)]
pub struct ScriptBuilder {
    inputs: Vec<SessionInput>,
}

impl ScriptBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with a fixed test identity and every capability ready.
    pub fn start(self, ts_ms: u64) -> Self {
        self.start_with(ts_ms, Identity::new("Test Student", "T-0001"), Capabilities::all_ready())
    }

    pub fn start_with(mut self, ts_ms: u64, identity: Identity, capabilities: Capabilities) -> Self {
        self.inputs.push(SessionInput::Start {
            ts_ms,
            identity,
            capabilities,
        });
        self
    }

    pub fn signal(mut self, signal: RawSignal) -> Self {
        self.inputs.push(SessionInput::Signal { signal });
        self
    }

    /// `count` keydowns in the answer field, `interval_ms` apart, first at `start_ms`.
    /// Yields `count - 1` intervals.
    pub fn keystrokes(self, start_ms: u64, interval_ms: u64, count: usize) -> Self {
        self.keystrokes_in(DEFAULT_INPUT_CONTEXT, start_ms, &vec![interval_ms; count.saturating_sub(1)])
    }

    /// One keydown at `start_ms`, then one after each gap.
    pub fn keystrokes_in(mut self, context: &str, start_ms: u64, gaps_ms: &[u64]) -> Self {
        let mut ts = start_ms;
        self.inputs.push(keydown(context, ts));
        for gap in gaps_ms {
            ts += gap;
            self.inputs.push(keydown(context, ts));
        }
        self
    }

    pub fn tab_away(self, hidden_ms: u64, visible_ms: u64) -> Self {
        self.signal(RawSignal::VisibilityChange {
            ts_ms: hidden_ms,
            hidden: true,
        })
        .signal(RawSignal::VisibilityChange {
            ts_ms: visible_ms,
            hidden: false,
        })
    }

    pub fn blur(self, blur_ms: u64, focus_ms: u64) -> Self {
        self.signal(RawSignal::WindowBlur { ts_ms: blur_ms })
            .signal(RawSignal::WindowFocus { ts_ms: focus_ms })
    }

    pub fn paste(self, ts_ms: u64, text: &str) -> Self {
        self.signal(RawSignal::Paste {
            ts_ms,
            text: text.to_string(),
        })
    }

    /// Pre-debounced gaze away/back pair.
    pub fn gaze_away(self, away_ms: u64, back_ms: u64) -> Self {
        self.signal(RawSignal::GazeAway { ts_ms: away_ms })
            .signal(RawSignal::GazeBack { ts_ms: back_ms })
    }

    pub fn submit(mut self, ts_ms: u64) -> Self {
        self.inputs.push(SessionInput::Submit { ts_ms });
        self
    }

    pub fn time_expired(mut self, ts_ms: u64) -> Self {
        self.inputs.push(SessionInput::TimeExpired { ts_ms });
        self
    }

    pub fn verify(mut self, ts_ms: u64, answers: &[(&str, &str)]) -> Self {
        let outcome = VerificationOutcome {
            responses: answers
                .iter()
                .map(|(q, t)| VerificationResponse {
                    question: q.to_string(),
                    transcript: t.to_string(),
                })
                .collect(),
            skipped: false,
        };
        self.inputs
            .push(SessionInput::VerificationComplete { ts_ms, outcome });
        self
    }

    pub fn skip_verification(mut self, ts_ms: u64) -> Self {
        self.inputs.push(SessionInput::VerificationComplete {
            ts_ms,
            outcome: VerificationOutcome::skipped(),
        });
        self
    }

    pub fn build(self) -> Vec<SessionInput> {
        self.inputs
    }
}

fn keydown(context: &str, ts_ms: u64) -> SessionInput {
    SessionInput::Signal {
        signal: RawSignal::KeyDown {
            ts_ms,
            context: context.to_string(),
        },
    }
}

/// Engine after a replay plus the per-input results.
pub struct ScriptRun {
    pub engine: MonitorEngine,
    pub applied: Vec<Applied>,
}

impl ScriptRun {
    pub fn refused(&self) -> usize {
        self.applied
            .iter()
            .filter(|a| matches!(a, Applied::Refused(_)))
            .count()
    }
}

/// Replay `inputs` through a fresh engine.
pub fn run_script(cfg: EngineConfig, inputs: &[SessionInput]) -> ScriptRun {
    let mut engine = MonitorEngine::new(cfg);
    let applied = inputs.iter().map(|i| engine.apply(i)).collect();
    ScriptRun { engine, applied }
}

/// One JSON object per line, the `exw replay` script format.
pub fn to_jsonl(inputs: &[SessionInput]) -> Result<String> {
    let mut out = String::new();
    for (i, input) in inputs.iter().enumerate() {
        let line = serde_json::to_string(input).with_context(|| format!("serialize input {i}"))?;
        out.push_str(&line);
        out.push('\n');
    }
    Ok(out)
}
