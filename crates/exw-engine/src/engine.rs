use std::collections::BTreeSet;

use exw_ledger::{
    record_event, record_typing, Disposition, EscalationState, LedgerState, RecordOutcome,
    ViolationCounters, WarningRecord,
};
use exw_schemas::{
    Capabilities, Event, EventKind, Identity, LogEntry, RawSignal, SessionInput, Severity,
    VerificationOutcome,
};
use exw_scoring::{build_report, IntegrityReport, ReportInputs};
use exw_session::{EndCause, SessionMachine, SessionState, TransitionError};
use exw_signals::{EventNormalizer, Normalized};
use exw_typing::{observe_interval, TypingState};
use tracing::{error, info, warn};

use crate::{Applied, DiscardReason, EngineConfig, IngestOutcome, MonitorSnapshot, SessionLog};

/// One exam attempt: normalizer, estimator, ledger, escalation and session
/// machine behind a single `&mut self` surface. Every call runs to completion.
#[derive(Clone, Debug)]
pub struct MonitorEngine {
    cfg: EngineConfig,
    normalizer: EventNormalizer,
    typing: TypingState,
    ledger: LedgerState,
    escalation: EscalationState,
    session: SessionMachine,
    log: SessionLog,
    verification: Option<VerificationOutcome>,
    report: Option<IntegrityReport>,
    events_recorded: u64,
    /// Caller-supplied `seq` of every canonical event delivered so far.
    external_seen: BTreeSet<u64>,
}

impl MonitorEngine {
    pub fn new(cfg: EngineConfig) -> Self {
        Self {
            normalizer: EventNormalizer::new(cfg.signals.clone()),
            typing: TypingState::new(),
            ledger: LedgerState::new(),
            escalation: EscalationState::new(cfg.max_warnings),
            session: SessionMachine::new(cfg.session.clone()),
            log: SessionLog::new(),
            verification: None,
            report: None,
            events_recorded: 0,
            external_seen: BTreeSet::new(),
            cfg,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.cfg
    }

    pub fn state(&self) -> SessionState {
        self.session.state()
    }

    pub fn session(&self) -> &SessionMachine {
        &self.session
    }

    pub fn current_warning_count(&self) -> u32 {
        self.escalation.budget().count
    }

    pub fn current_counters(&self) -> ViolationCounters {
        self.ledger.counters()
    }

    /// Full session log, arrival order.
    pub fn log(&self) -> &[LogEntry] {
        self.log.entries()
    }

    /// Full warning log, raise order.
    pub fn warnings(&self) -> &[WarningRecord] {
        self.escalation.log()
    }

    /// Available once the session is Completed.
    pub fn report(&self) -> Option<&IntegrityReport> {
        self.report.as_ref()
    }

    // ---------------------------------------------------------------------
    // Lifecycle
    // ---------------------------------------------------------------------

    /// Setup -> InProgress once every required gate passes.
    pub fn begin(
        &mut self,
        identity: Identity,
        caps: &Capabilities,
        ts_ms: u64,
    ) -> Result<(), TransitionError> {
        let line = format!(
            "Exam started for {} ({})",
            identity.student_name.trim(),
            identity.student_id.trim()
        );
        if let Err(e) = self.session.begin(identity, caps, ts_ms) {
            warn!(error = %e, "session start refused");
            return Err(e);
        }
        info!(ts_ms, "session started");
        self.log.push(ts_ms, Severity::Info, line);
        Ok(())
    }

    pub fn submit(&mut self, ts_ms: u64) -> Result<(), TransitionError> {
        self.end_exam(EndCause::Submitted, ts_ms)
    }

    pub fn time_expired(&mut self, ts_ms: u64) -> Result<(), TransitionError> {
        self.end_exam(EndCause::TimeExpired, ts_ms)
    }

    /// Verification -> Completed; builds the report exactly once.
    pub fn complete_verification(
        &mut self,
        outcome: VerificationOutcome,
        ts_ms: u64,
    ) -> Result<&IntegrityReport, TransitionError> {
        let was_terminated = self.session.complete_verification(ts_ms)?;

        let line = if outcome.skipped {
            "Oral verification skipped".to_string()
        } else {
            format!(
                "Oral verification complete ({} responses)",
                outcome.responses.len()
            )
        };
        self.log.push(ts_ms, Severity::Info, line);
        self.verification = Some(outcome);

        let report = self.build_report(was_terminated, ts_ms);
        info!(
            score = report.score,
            verdict = ?report.verdict,
            was_terminated,
            "session completed"
        );
        Ok(self.report.insert(report))
    }

    fn end_exam(&mut self, cause: EndCause, ts_ms: u64) -> Result<(), TransitionError> {
        self.session.end_exam(cause, ts_ms)?;
        self.normalizer.close();

        let line = match cause {
            EndCause::Submitted => "Exam submitted",
            EndCause::TimeExpired => "Time expired: exam ended",
            EndCause::Terminated => "Exam terminated: warning limit reached",
        };
        let severity = if cause == EndCause::Terminated {
            Severity::Critical
        } else {
            Severity::Info
        };
        self.log.push(ts_ms, severity, line);
        Ok(())
    }

    fn build_report(&self, was_terminated: bool, completed_at_ms: u64) -> IntegrityReport {
        let skipped = VerificationOutcome::skipped();
        build_report(
            &self.cfg.scoring,
            ReportInputs {
                counters: self.ledger.counters(),
                warning_log: self.escalation.log(),
                log: self.log.entries(),
                was_terminated,
                end_cause: self.session.end_cause(),
                identity: self.session.identity(),
                verification: self.verification.as_ref().unwrap_or(&skipped),
                started_at_ms: self.session.started_at_ms(),
                ended_at_ms: self.session.ended_at_ms(),
                completed_at_ms,
            },
        )
    }

    // ---------------------------------------------------------------------
    // Signals
    // ---------------------------------------------------------------------

    /// Normalize a raw platform signal and ingest the resulting event.
    pub fn ingest_raw(&mut self, raw: &RawSignal) -> IngestOutcome {
        if !self.session.accepts_events() {
            return self.discard_out_of_state(raw.ts_ms());
        }
        let normalized = self.normalizer.normalize(raw);
        self.record(normalized)
    }

    /// Ingest one canonical event.
    ///
    /// The caller's `seq` identifies redeliveries; a `seq` seen before is a
    /// duplicate whatever order it arrives in. Accepted events join the same
    /// arrival sequence as raw signals, so the two can be mixed freely.
    pub fn ingest(&mut self, ev: &Event) -> IngestOutcome {
        if !self.session.accepts_events() {
            return self.discard_out_of_state(ev.ts_ms);
        }
        if !self.external_seen.insert(ev.seq) {
            return IngestOutcome::Discarded {
                reason: DiscardReason::Duplicate,
            };
        }
        let normalized = self.normalizer.admit(ev);
        self.record(normalized)
    }

    /// Ledger, then estimator for key intervals. Only events that survive
    /// both count towards `events_recorded`.
    fn record(&mut self, normalized: Normalized) -> IngestOutcome {
        let ev = match normalized {
            Normalized::Emitted(ev) => ev,
            Normalized::Suppressed(reason) => {
                return IngestOutcome::Discarded {
                    reason: DiscardReason::Suppressed(reason),
                }
            }
        };

        let outcome = record_event(&self.cfg.ledger, &mut self.ledger, &mut self.escalation, &ev);
        if outcome.disposition == Disposition::Duplicate {
            return IngestOutcome::Discarded {
                reason: DiscardReason::Duplicate,
            };
        }

        let decision = match ev.kind {
            EventKind::KeyInterval { ms } => {
                let decision = observe_interval(&self.cfg.typing, &mut self.typing, ms);
                if !decision.is_accepted() {
                    return IngestOutcome::Discarded {
                        reason: DiscardReason::BadInterval(decision.reason),
                    };
                }
                Some(decision)
            }
            _ => None,
        };
        self.events_recorded += 1;

        let mut warnings_raised = 0;
        let mut terminated = false;
        self.absorb(ev.ts_ms, outcome, &mut warnings_raised, &mut terminated);

        if let Some(decision) = decision {
            if decision.established_now {
                let b = &self.typing.baseline;
                self.log.push(
                    ev.ts_ms,
                    Severity::Info,
                    format!(
                        "Typing baseline established (mean {:.1} ms, std dev {:.1} ms)",
                        b.mean_ms, b.std_dev_ms
                    ),
                );
            }
            for signal in &decision.signals {
                let out = record_typing(&mut self.ledger, &mut self.escalation, signal, ev.ts_ms);
                self.absorb(ev.ts_ms, out, &mut warnings_raised, &mut terminated);
            }
        }

        IngestOutcome::Accepted {
            seq: ev.seq,
            warnings_raised,
            terminated,
        }
    }

    /// Route one scripted input. Refused transitions are reported, not raised.
    pub fn apply(&mut self, input: &SessionInput) -> Applied {
        let transition = match input {
            SessionInput::Signal { signal } => return Applied::Ingested(self.ingest_raw(signal)),
            SessionInput::Event { event } => return Applied::Ingested(self.ingest(event)),
            SessionInput::Start {
                ts_ms,
                identity,
                capabilities,
            } => self.begin(identity.clone(), capabilities, *ts_ms),
            SessionInput::Submit { ts_ms } => self.submit(*ts_ms),
            SessionInput::TimeExpired { ts_ms } => self.time_expired(*ts_ms),
            SessionInput::VerificationComplete { ts_ms, outcome } => self
                .complete_verification(outcome.clone(), *ts_ms)
                .map(|_| ()),
        };
        match transition {
            Ok(()) => Applied::Transitioned(self.session.state()),
            Err(e) => Applied::Refused(e),
        }
    }

    pub fn snapshot(&self) -> MonitorSnapshot {
        let state = self.session.state();
        MonitorSnapshot {
            state,
            state_label: state.as_str().to_string(),
            counters: self.ledger.counters(),
            budget: self.escalation.budget(),
            baseline: self.typing.baseline.clone(),
            burst_run: self.typing.burst_run,
            events_recorded: self.events_recorded,
            recent_warnings: self.escalation.recent(self.cfg.scoring.warning_display_limit),
            recent_log: self.log.recent(self.cfg.live_log_limit),
            report_ready: self.report.is_some(),
        }
    }

    // ---------------------------------------------------------------------
    // Internals
    // ---------------------------------------------------------------------

    fn discard_out_of_state(&self, ts_ms: u64) -> IngestOutcome {
        let state = self.session.state();
        info!(ts_ms, state = state.as_str(), "event discarded outside exam");
        IngestOutcome::Discarded {
            reason: DiscardReason::NotInProgress(state),
        }
    }

    /// Fold one ledger outcome into the session log, firing termination if required.
    fn absorb(
        &mut self,
        ts_ms: u64,
        out: RecordOutcome,
        warnings_raised: &mut u32,
        terminated: &mut bool,
    ) {
        let fire = out.requires_termination();

        if let Some(note) = out.note {
            let severity = if out.counted.is_some() {
                Severity::Warning
            } else {
                Severity::Info
            };
            self.log.push(ts_ms, severity, note);
        }

        if let Some(w) = out.warning {
            *warnings_raised += 1;
            warn!(
                ts_ms,
                title = %w.title,
                count = w.decision.count,
                remaining = w.decision.remaining,
                "warning raised"
            );
            self.log.push(
                ts_ms,
                Severity::Violation,
                format!(
                    "Warning {}/{}: {}: {}",
                    w.decision.count, self.cfg.max_warnings, w.title, w.message
                ),
            );
        }

        if fire {
            *terminated = true;
            error!(
                ts_ms,
                warnings = self.escalation.budget().count,
                "warning budget exhausted; terminating exam"
            );
            if let Err(e) = self.end_exam(EndCause::Terminated, ts_ms) {
                // Terminate fires once and only from InProgress; keep going regardless.
                error!(error = %e, "terminate transition refused");
            }
        }
    }
}
