use exw_typing::*;

/// Baseline flips to established exactly once, on the 20th valid interval,
/// and mean/std-dev never move afterwards.
#[test]
fn baseline_established_exactly_once_and_frozen() {
    let cfg = TypingConfig::defaults();
    let mut st = TypingState::new();

    let mut established_at = Vec::new();
    for i in 0..19u64 {
        // Invalid samples in between must not count toward the 20.
        observe_interval(&cfg, &mut st, -5.0);
        let d = observe_interval(&cfg, &mut st, 100.0 + (i % 5) as f64 * 10.0);
        assert!(d.is_accepted());
        if d.established_now {
            established_at.push(i);
        }
    }
    assert!(!st.baseline.established);
    assert_eq!(st.baseline.sample_count, 19);

    let d = observe_interval(&cfg, &mut st, 140.0);
    assert!(d.established_now);
    assert!(st.baseline.established);
    assert!(established_at.is_empty());

    let frozen = (st.baseline.mean_ms, st.baseline.std_dev_ms);
    assert!((frozen.0 - 120.0).abs() < 1e-9, "mean was {}", frozen.0);

    // Sustained very different input does not move the reference.
    for _ in 0..200 {
        let d = observe_interval(&cfg, &mut st, 400.0);
        assert!(!d.established_now);
    }
    assert_eq!((st.baseline.mean_ms, st.baseline.std_dev_ms), frozen);
    assert_eq!(st.baseline.sample_count, 220);
}

#[test]
fn baseline_interval_itself_is_not_checked_for_anomaly() {
    let cfg = TypingConfig::defaults();
    let mut st = TypingState::new();
    for _ in 0..19 {
        observe_interval(&cfg, &mut st, 150.0);
    }
    let d = observe_interval(&cfg, &mut st, 5.0);
    assert!(d.established_now);
    assert!(!d.anomalous);
    assert_eq!(st.baseline.anomaly_accumulator, 0.0);
}
