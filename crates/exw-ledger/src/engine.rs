use exw_schemas::{Event, EventKind};
use exw_typing::TypingSignal;

use crate::{
    fmt_clock, CounterKind, EscalationState, LedgerConfig, LedgerState, RaisedWarning,
    RecordOutcome,
};

/// The single choke point every warning passes through.
fn raise(
    st: &mut LedgerState,
    esc: &mut EscalationState,
    ts_ms: u64,
    title: &str,
    message: String,
) -> RaisedWarning {
    st.counters.total_warnings = st.counters.total_warnings.saturating_add(1);
    let decision = esc.raise_warning(ts_ms, title, message.clone());
    RaisedWarning {
        title: title.to_string(),
        message,
        decision,
    }
}

fn bump(counter: &mut u32) -> u32 {
    *counter = counter.saturating_add(1);
    *counter
}

/// Record one canonical event.
///
/// An event whose `seq` was recorded before is a duplicate and changes
/// nothing; distinct `seq`s count in any arrival order. `KeyInterval` events are marked seen but counted by the
/// typing estimator, not here.
pub fn record_event(
    cfg: &LedgerConfig,
    st: &mut LedgerState,
    esc: &mut EscalationState,
    ev: &Event,
) -> RecordOutcome {
    if !st.seen.insert(ev.seq) {
        return RecordOutcome::duplicate();
    }

    let mut out = RecordOutcome::recorded();
    let ts = ev.ts_ms;

    match &ev.kind {
        EventKind::TabHidden => {
            // Counted on hide; the warning waits for the student to come back.
            bump(&mut st.counters.tab_switches);
            st.pending_hide_ts = Some(ts);
            out.counted = Some(CounterKind::TabSwitch);
            out.note = Some(format!("Exam tab hidden at {}", fmt_clock(ts)));
        }
        EventKind::TabVisible => match st.pending_hide_ts.take() {
            Some(hidden_at) => {
                let away_ms = ts.saturating_sub(hidden_at);
                out.warning = Some(raise(
                    st,
                    esc,
                    ts,
                    "Tab Switch Detected",
                    format!(
                        "You left the exam tab at {} for {} ms",
                        fmt_clock(hidden_at),
                        away_ms
                    ),
                ));
            }
            None => {
                out.note = Some("Exam tab visible".to_string());
            }
        },
        EventKind::WindowBlur => {
            st.pending_blur_ts = Some(ts);
        }
        EventKind::WindowFocus => {
            if let Some(blur_at) = st.pending_blur_ts.take() {
                let gap_ms = ts.saturating_sub(blur_at);
                if gap_ms > cfg.focus_flicker_ms {
                    bump(&mut st.counters.focus_losses);
                    out.counted = Some(CounterKind::FocusLoss);
                    out.note = Some(format!(
                        "Exam window lost focus at {} for {} ms",
                        fmt_clock(blur_at),
                        gap_ms
                    ));
                }
            }
        }
        EventKind::Paste { text_len, preview } => {
            let n = bump(&mut st.counters.paste_events);
            out.counted = Some(CounterKind::Paste);
            out.note = Some(format!(
                "Paste detected ({} chars): \"{}\"",
                text_len, preview
            ));
            if n >= cfg.paste_warning_threshold {
                out.warning = Some(raise(
                    st,
                    esc,
                    ts,
                    "Paste Detected",
                    format!("Pasting content is not allowed ({} pastes so far)", n),
                ));
            }
        }
        EventKind::KeyInterval { .. } => {}
        EventKind::GazeAway => {
            bump(&mut st.counters.gaze_away_count);
            out.counted = Some(CounterKind::GazeAway);
            out.warning = Some(raise(
                st,
                esc,
                ts,
                "Looking Away",
                "Please keep your eyes on the screen".to_string(),
            ));
        }
        EventKind::GazeBack => {
            out.note = Some("Gaze returned to screen".to_string());
        }
    }

    out
}

/// Record a signal derived by the typing estimator.
pub fn record_typing(
    st: &mut LedgerState,
    esc: &mut EscalationState,
    signal: &TypingSignal,
    ts_ms: u64,
) -> RecordOutcome {
    let mut out = RecordOutcome::recorded();

    match signal {
        TypingSignal::Anomaly {
            interval_ms,
            mean_ms,
            ..
        } => {
            bump(&mut st.counters.anomaly_warnings);
            out.counted = Some(CounterKind::TypingAnomaly);
            out.warning = Some(raise(
                st,
                esc,
                ts_ms,
                "Unusual Typing Pattern",
                format!(
                    "Keystroke timing deviates from your baseline ({:.0} ms vs {:.0} ms)",
                    interval_ms, mean_ms
                ),
            ));
        }
        TypingSignal::Burst { run_length } => {
            bump(&mut st.counters.typing_burst_count);
            out.counted = Some(CounterKind::TypingBurst);
            out.warning = Some(raise(
                st,
                esc,
                ts_ms,
                "Burst Typing Detected",
                format!("{} unusually fast keystrokes in a row", run_length),
            ));
        }
    }

    out
}
