use exw_config::load_layered_yaml_from_strings;

const BASE_YAML: &str = r#"
typing:
  baseline_samples: 20
  burst_threshold_ms: 50
escalation:
  max_warnings: 5
scoring:
  violation_weight: 15
  gaze_divisor: 2
"#;

const BASE_YAML_REORDERED: &str = r#"
scoring:
  gaze_divisor: 2
  violation_weight: 15
escalation:
  max_warnings: 5
typing:
  burst_threshold_ms: 50
  baseline_samples: 20
"#;

const OVERLAY_YAML: &str = r#"
escalation:
  max_warnings: 3
"#;

#[test]
fn same_input_produces_identical_hash() {
    let a = load_layered_yaml_from_strings(&[BASE_YAML]).unwrap();
    let b = load_layered_yaml_from_strings(&[BASE_YAML]).unwrap();
    assert_eq!(a.config_hash, b.config_hash);
    assert_eq!(a.canonical_json, b.canonical_json);
    assert_eq!(a.config_hash.len(), 64);
}

#[test]
fn reordered_keys_produce_same_hash() {
    let original = load_layered_yaml_from_strings(&[BASE_YAML]).unwrap();
    let reordered = load_layered_yaml_from_strings(&[BASE_YAML_REORDERED]).unwrap();
    assert_eq!(original.config_hash, reordered.config_hash);
    assert_eq!(original.canonical_json, reordered.canonical_json);
}

#[test]
fn overlay_changes_value_and_hash() {
    let base = load_layered_yaml_from_strings(&[BASE_YAML]).unwrap();
    let merged = load_layered_yaml_from_strings(&[BASE_YAML, OVERLAY_YAML]).unwrap();

    assert_ne!(base.config_hash, merged.config_hash);
    assert_eq!(
        merged
            .config_json
            .pointer("/escalation/max_warnings")
            .and_then(|v| v.as_u64()),
        Some(3)
    );
    assert_eq!(
        merged
            .config_json
            .pointer("/typing/baseline_samples")
            .and_then(|v| v.as_u64()),
        Some(20)
    );
}

#[test]
fn invalid_yaml_is_an_error() {
    assert!(load_layered_yaml_from_strings(&["typing: [unclosed"]).is_err());
}
