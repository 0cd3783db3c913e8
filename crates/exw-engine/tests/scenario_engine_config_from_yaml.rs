use exw_config::load_layered_yaml_from_strings;
use exw_engine::{EngineConfig, IngestOutcome, MonitorEngine};
use exw_schemas::{Capabilities, Identity, RawSignal};
use exw_session::SessionState;

const BASE: &str = r#"
escalation:
  max_warnings: 5
ledger:
  paste_warning_threshold: 2
"#;

const STRICT: &str = r#"
escalation:
  max_warnings: 2
ledger:
  paste_warning_threshold: 1
session:
  require_microphone: false
"#;

#[test]
fn overlay_tightens_policy() {
    let loaded = load_layered_yaml_from_strings(&[BASE, STRICT]).unwrap();
    let cfg = EngineConfig::from_config_json(&loaded.config_json).unwrap();
    assert_eq!(cfg.max_warnings, 2);
    assert_eq!(cfg.ledger.paste_warning_threshold, 1);
    assert!(!cfg.session.require_microphone);
    assert_eq!(cfg.typing.baseline_samples, 20);

    let mut e = MonitorEngine::new(cfg);
    let caps = Capabilities {
        microphone: false,
        ..Capabilities::all_ready()
    };
    e.begin(Identity::new("Radia", "S-5"), &caps, 0).unwrap();

    let first = e.ingest_raw(&RawSignal::Paste {
        ts_ms: 1_000,
        text: "a".into(),
    });
    assert!(matches!(
        first,
        IngestOutcome::Accepted {
            warnings_raised: 1,
            terminated: false,
            ..
        }
    ));
    let second = e.ingest_raw(&RawSignal::Paste {
        ts_ms: 2_000,
        text: "b".into(),
    });
    assert!(matches!(
        second,
        IngestOutcome::Accepted {
            terminated: true,
            ..
        }
    ));
    assert_eq!(e.state(), SessionState::Verification);
}

#[test]
fn zero_gaze_divisor_is_rejected() {
    let loaded = load_layered_yaml_from_strings(&["scoring:\n  gaze_divisor: 0\n"]).unwrap();
    let err = EngineConfig::from_config_json(&loaded.config_json)
        .unwrap_err()
        .to_string();
    assert!(err.contains("/scoring/gaze_divisor"), "{err}");
}
