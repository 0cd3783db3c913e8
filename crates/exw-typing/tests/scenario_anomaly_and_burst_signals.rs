use exw_typing::*;

/// Baseline alternating 100/120ms => mean 110, std-dev 10, threshold 30.
fn established_state(cfg: &TypingConfig) -> TypingState {
    let mut st = TypingState::new();
    for i in 0..20 {
        let v = if i % 2 == 0 { 100.0 } else { 120.0 };
        observe_interval(cfg, &mut st, v);
    }
    assert!(st.baseline.established);
    assert_eq!(st.baseline.mean_ms, 110.0);
    assert_eq!(st.baseline.std_dev_ms, 10.0);
    st
}

fn anomalies(signals: &[TypingSignal]) -> usize {
    signals
        .iter()
        .filter(|s| matches!(s, TypingSignal::Anomaly { .. }))
        .count()
}

fn bursts(signals: &[TypingSignal]) -> usize {
    signals
        .iter()
        .filter(|s| matches!(s, TypingSignal::Burst { .. }))
        .count()
}

#[test]
fn anomaly_signal_needs_accumulator_above_five() {
    let cfg = TypingConfig::defaults();
    let mut st = established_state(&cfg);

    let mut emitted = 0;
    for n in 1..=11 {
        // Slow keystroke in between keeps the burst run from building.
        let d = observe_interval(&cfg, &mut st, 10.0);
        assert!(d.anomalous);
        emitted += anomalies(&d.signals);
        observe_interval(&cfg, &mut st, 110.0);

        if n == 10 {
            assert_eq!(emitted, 0, "accumulator at exactly 5.0 must not emit");
            assert_eq!(st.baseline.anomaly_accumulator, 5.0);
        }
    }
    assert_eq!(emitted, 1);
    assert_eq!(st.baseline.anomaly_accumulator, 0.0, "hysteresis reset");
}

#[test]
fn fast_but_plausible_interval_is_not_anomalous() {
    let cfg = TypingConfig::defaults();
    let mut st = established_state(&cfg);

    // 40ms deviates by 70 (> 30) but is not below the 30ms ceiling.
    let d = observe_interval(&cfg, &mut st, 40.0);
    assert!(!d.anomalous);
    assert_eq!(st.baseline.anomaly_accumulator, 0.0);
}

#[test]
fn ten_fast_intervals_emit_exactly_one_burst() {
    let cfg = TypingConfig::defaults();
    let mut st = TypingState::new();

    let mut total = 0;
    for i in 1..=10 {
        let d = observe_interval(&cfg, &mut st, 20.0);
        total += bursts(&d.signals);
        if i < 10 {
            assert_eq!(st.burst_run, i);
        }
    }
    assert_eq!(total, 1);
    assert_eq!(st.burst_run, 0);

    // 11th fast interval starts a fresh count.
    let d = observe_interval(&cfg, &mut st, 20.0);
    assert_eq!(bursts(&d.signals), 0);
    assert_eq!(st.burst_run, 1);
}

#[test]
fn burst_run_decays_and_floors_at_zero() {
    let cfg = TypingConfig::defaults();
    let mut st = TypingState::new();

    for _ in 0..5 {
        observe_interval(&cfg, &mut st, 30.0);
    }
    observe_interval(&cfg, &mut st, 200.0);
    observe_interval(&cfg, &mut st, 200.0);
    assert_eq!(st.burst_run, 3);

    for _ in 0..10 {
        observe_interval(&cfg, &mut st, 200.0);
    }
    assert_eq!(st.burst_run, 0);

    let mut total = 0;
    for _ in 0..10 {
        total += bursts(&observe_interval(&cfg, &mut st, 49.0).signals);
    }
    assert_eq!(total, 1);
}
