use exw_engine::{DiscardReason, EngineConfig, IngestOutcome, MonitorEngine};
use exw_schemas::{Capabilities, Event, EventKind, Identity, RawSignal};
use exw_signals::SuppressReason;

fn started() -> MonitorEngine {
    let mut e = MonitorEngine::new(EngineConfig::defaults());
    e.begin(Identity::new("Grace", "S-7"), &Capabilities::all_ready(), 0)
        .unwrap();
    e
}

fn event(seq: u64, ts_ms: u64, kind: EventKind) -> Event {
    Event { seq, ts_ms, kind }
}

fn paste(ts_ms: u64) -> RawSignal {
    RawSignal::Paste {
        ts_ms,
        text: "copied".into(),
    }
}

#[test]
fn raw_signals_after_a_high_canonical_seq_still_count() {
    let mut e = started();

    let blur = e.ingest(&event(3, 100, EventKind::WindowBlur));
    assert_eq!(
        blur,
        IngestOutcome::Accepted {
            seq: 0,
            warnings_raised: 0,
            terminated: false
        }
    );

    assert!(e.ingest_raw(&paste(200)).is_accepted());
    match e.ingest_raw(&paste(300)) {
        IngestOutcome::Accepted {
            seq,
            warnings_raised,
            ..
        } => {
            assert_eq!(seq, 2);
            assert_eq!(warnings_raised, 1);
        }
        other => panic!("second paste lost: {other:?}"),
    }

    assert!(e.ingest(&event(1, 400, EventKind::TabHidden)).is_accepted());
    assert!(e
        .ingest_raw(&RawSignal::VisibilityChange {
            ts_ms: 900,
            hidden: false
        })
        .is_accepted());
    assert!(e.ingest_raw(&RawSignal::WindowFocus { ts_ms: 1_500 }).is_accepted());

    let c = e.current_counters();
    assert_eq!(c.paste_events, 2);
    assert_eq!(c.tab_switches, 1);
    assert_eq!(c.focus_losses, 1);
    assert_eq!(c.total_warnings, 2);
    assert_eq!(e.current_warning_count(), 2);
    assert_eq!(e.snapshot().events_recorded, 6);
}

#[test]
fn canonical_seqs_dedupe_in_any_order() {
    let mut e = started();
    let paste_kind = || EventKind::Paste {
        text_len: 4,
        preview: "abcd".into(),
    };

    assert!(e.ingest(&event(9, 100, paste_kind())).is_accepted());
    assert!(e.ingest(&event(4, 200, paste_kind())).is_accepted());
    assert_eq!(
        e.ingest(&event(9, 300, paste_kind())),
        IngestOutcome::Discarded {
            reason: DiscardReason::Duplicate
        }
    );
    assert_eq!(e.current_counters().paste_events, 2);
    assert_eq!(e.current_warning_count(), 1);
}

#[test]
fn canonical_edges_share_duplicate_edge_tracking() {
    let mut e = started();
    assert!(e.ingest(&event(0, 100, EventKind::TabHidden)).is_accepted());
    assert_eq!(
        e.ingest_raw(&RawSignal::VisibilityChange {
            ts_ms: 150,
            hidden: true
        }),
        IngestOutcome::Discarded {
            reason: DiscardReason::Suppressed(SuppressReason::DuplicateEdge)
        }
    );
    assert_eq!(e.current_counters().tab_switches, 1);
}

#[test]
fn rejected_interval_is_not_counted_as_recorded() {
    let mut e = started();
    let out = e.ingest(&event(0, 100, EventKind::KeyInterval { ms: -5.0 }));
    assert!(matches!(
        out,
        IngestOutcome::Discarded {
            reason: DiscardReason::BadInterval(_)
        }
    ));
    assert_eq!(e.snapshot().events_recorded, 0);

    assert!(e.ingest_raw(&paste(200)).is_accepted());
    assert_eq!(e.snapshot().events_recorded, 1);
}
