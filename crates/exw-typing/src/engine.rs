use crate::{IntervalDecision, IntervalReason, TypingConfig, TypingSignal, TypingState};

/// Mean and population standard deviation. Caller guarantees `xs` is non-empty.
fn mean_and_std_dev(xs: &[f64]) -> (f64, f64) {
    let n = xs.len() as f64;
    let mean = xs.iter().sum::<f64>() / n;
    let var = xs.iter().map(|x| (x - mean) * (x - mean)).sum::<f64>() / n;
    (mean, var.sqrt())
}

/// Feed one keystroke interval (milliseconds) into the estimator.
pub fn observe_interval(cfg: &TypingConfig, st: &mut TypingState, interval_ms: f64) -> IntervalDecision {
    // Clock anomalies must not reach the baseline.
    if !interval_ms.is_finite() {
        return IntervalDecision::dropped(IntervalReason::Malformed);
    }
    if interval_ms < 0.0 {
        return IntervalDecision::dropped(IntervalReason::Negative);
    }

    let mut decision = IntervalDecision {
        reason: IntervalReason::Accepted,
        established_now: false,
        anomalous: false,
        signals: Vec::new(),
    };

    let bl = &mut st.baseline;
    bl.sample_count = bl.sample_count.saturating_add(1);

    if !bl.established {
        st.pending.push(interval_ms);
        if bl.sample_count >= cfg.baseline_samples.max(1) {
            let (mean, std_dev) = mean_and_std_dev(&st.pending);
            bl.mean_ms = mean;
            bl.std_dev_ms = std_dev;
            bl.established = true;
            st.pending = Vec::new();
            decision.established_now = true;
        }
    } else {
        // Deviation AND absolute ceiling; neither alone is enough.
        let threshold = cfg.sigma_multiplier * bl.std_dev_ms;
        let deviation = (interval_ms - bl.mean_ms).abs();
        if deviation > threshold && interval_ms < cfg.anomaly_ceiling_ms {
            decision.anomalous = true;
            bl.anomaly_accumulator += cfg.anomaly_increment;
            if bl.anomaly_accumulator > cfg.anomaly_emit_threshold {
                bl.anomaly_accumulator = 0.0;
                decision.signals.push(TypingSignal::Anomaly {
                    interval_ms,
                    mean_ms: bl.mean_ms,
                    threshold_ms: threshold,
                });
            }
        }
    }

    // Burst run is independent of the baseline.
    if interval_ms < cfg.burst_threshold_ms {
        st.burst_run = st.burst_run.saturating_add(1);
    } else {
        st.burst_run = st.burst_run.saturating_sub(1);
    }
    if st.burst_run >= cfg.burst_run_length.max(1) {
        decision.signals.push(TypingSignal::Burst {
            run_length: st.burst_run,
        });
        st.burst_run = 0;
    }

    decision
}
