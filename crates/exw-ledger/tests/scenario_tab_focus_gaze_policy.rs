use exw_ledger::*;
use exw_schemas::{Event, EventKind};
use exw_typing::TypingSignal;

struct Feed {
    cfg: LedgerConfig,
    st: LedgerState,
    esc: EscalationState,
    seq: u64,
}

impl Feed {
    fn new() -> Self {
        Self {
            cfg: LedgerConfig::defaults(),
            st: LedgerState::new(),
            esc: EscalationState::new(5),
            seq: 0,
        }
    }

    fn push(&mut self, ts_ms: u64, kind: EventKind) -> RecordOutcome {
        let ev = Event {
            seq: self.seq,
            ts_ms,
            kind,
        };
        self.seq += 1;
        record_event(&self.cfg, &mut self.st, &mut self.esc, &ev)
    }
}

#[test]
fn tab_switch_counted_on_hide_warned_on_return() {
    let mut f = Feed::new();

    let hide = f.push(65_000, EventKind::TabHidden);
    assert_eq!(hide.counted, Some(CounterKind::TabSwitch));
    assert!(hide.warning.is_none());
    assert_eq!(f.st.counters().tab_switches, 1);
    assert_eq!(f.st.tab_hidden_since(), Some(65_000));

    let back = f.push(72_500, EventKind::TabVisible);
    let w = back.warning.expect("return must warn");
    assert_eq!(w.title, "Tab Switch Detected");
    assert!(w.message.contains("01:05"), "hide timestamp attached: {}", w.message);
    assert!(w.message.contains("7500 ms"));
    assert_eq!(f.st.counters().tab_switches, 1);
    assert_eq!(f.st.counters().total_warnings, 1);
    assert_eq!(f.st.tab_hidden_since(), None);
}

#[test]
fn hidden_tab_without_return_counts_but_never_warns() {
    let mut f = Feed::new();
    f.push(1_000, EventKind::TabHidden);
    assert_eq!(f.st.counters().tab_switches, 1);
    assert_eq!(f.st.counters().total_warnings, 0);
    assert_eq!(f.esc.budget().count, 0);
}

#[test]
fn focus_flicker_is_filtered() {
    let mut f = Feed::new();

    f.push(1_000, EventKind::WindowBlur);
    let out = f.push(1_500, EventKind::WindowFocus);
    assert_eq!(out.counted, None, "exactly 500ms is flicker");
    assert_eq!(f.st.counters().focus_losses, 0);

    f.push(2_000, EventKind::WindowBlur);
    let out = f.push(2_501, EventKind::WindowFocus);
    assert_eq!(out.counted, Some(CounterKind::FocusLoss));
    assert!(out.warning.is_none());
    assert_eq!(f.st.counters().focus_losses, 1);
    assert_eq!(f.st.counters().total_warnings, 0);
}

#[test]
fn every_gaze_away_warns_gaze_back_does_not() {
    let mut f = Feed::new();
    for i in 0..3 {
        let away = f.push(i * 10_000, EventKind::GazeAway);
        assert_eq!(away.warning.unwrap().title, "Looking Away");
        let back = f.push(i * 10_000 + 4_000, EventKind::GazeBack);
        assert!(back.warning.is_none());
    }
    assert_eq!(f.st.counters().gaze_away_count, 3);
    assert_eq!(f.st.counters().total_warnings, 3);
}

#[test]
fn typing_signals_count_and_warn() {
    let mut f = Feed::new();
    let out = record_typing(
        &mut f.st,
        &mut f.esc,
        &TypingSignal::Burst { run_length: 10 },
        5_000,
    );
    assert_eq!(out.counted, Some(CounterKind::TypingBurst));
    assert!(out.warning.is_some());

    let out = record_typing(
        &mut f.st,
        &mut f.esc,
        &TypingSignal::Anomaly {
            interval_ms: 8.0,
            mean_ms: 140.0,
            threshold_ms: 45.0,
        },
        6_000,
    );
    assert_eq!(out.counted, Some(CounterKind::TypingAnomaly));

    let c = f.st.counters();
    assert_eq!(c.typing_burst_count, 1);
    assert_eq!(c.anomaly_warnings, 1);
    assert_eq!(c.total_warnings, 2);
}

#[test]
fn fifth_warning_terminates_once() {
    let mut f = Feed::new();
    let mut terminations = 0;
    for i in 0..7 {
        let out = f.push(i * 5_000, EventKind::GazeAway);
        if out.requires_termination() {
            terminations += 1;
            assert_eq!(f.st.counters().total_warnings, 5);
        }
        f.push(i * 5_000 + 4_000, EventKind::GazeBack);
    }
    assert_eq!(terminations, 1);
    assert!(f.esc.terminate_fired());
    assert_eq!(f.esc.budget().count, 7);
    assert_eq!(f.st.counters().total_warnings, 7);
}
