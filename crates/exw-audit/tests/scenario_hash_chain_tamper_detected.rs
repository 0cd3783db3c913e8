use exw_audit::{verify_hash_chain, verify_hash_chain_str, AuditWriter, VerifyResult, TOPIC_LOG};
use exw_schemas::{LogEntry, Severity};
use serde_json::json;
use uuid::Uuid;

fn write_five(path: &std::path::Path) {
    let mut w = AuditWriter::new(path, Uuid::new_v4(), true).unwrap();
    for i in 0..5 {
        w.append("SESSION", &format!("STEP_{i}"), json!({"index": i}))
            .unwrap();
    }
    assert_eq!(w.seq(), 5);
}

#[test]
fn untampered_chain_verifies_valid() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("audit.jsonl");
    write_five(&path);

    assert_eq!(
        verify_hash_chain(&path).unwrap(),
        VerifyResult::Valid { lines: 5 }
    );
}

#[test]
fn tampered_payload_detected_at_its_line() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("audit.jsonl");
    write_five(&path);

    let content = std::fs::read_to_string(&path).unwrap();
    let tampered: Vec<String> = content
        .lines()
        .enumerate()
        .map(|(i, l)| {
            if i == 2 {
                l.replace("\"index\":2", "\"index\":7")
            } else {
                l.to_string()
            }
        })
        .collect();
    assert_ne!(tampered.join("\n"), content.trim_end());

    match verify_hash_chain_str(&tampered.join("\n")).unwrap() {
        VerifyResult::Broken { line, reason } => {
            assert_eq!(line, 3);
            assert!(reason.contains("hash_self"), "{reason}");
        }
        other => panic!("expected broken chain, got {other:?}"),
    }
}

#[test]
fn deleted_line_breaks_chain() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("audit.jsonl");
    write_five(&path);

    let content = std::fs::read_to_string(&path).unwrap();
    let kept: Vec<&str> = content
        .lines()
        .enumerate()
        .filter(|(i, _)| *i != 1)
        .map(|(_, l)| l)
        .collect();

    let result = verify_hash_chain_str(&kept.join("\n")).unwrap();
    assert!(!result.is_valid());
}

#[test]
fn log_entries_are_written_one_per_line() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("audit.jsonl");
    let mut w = AuditWriter::new(&path, Uuid::new_v4(), true).unwrap();

    let entries = vec![
        LogEntry::new(0, Severity::Info, "Exam started"),
        LogEntry::new(5_000, Severity::Violation, "Warning 1/5: Looking Away"),
    ];
    assert_eq!(w.append_log_entries(&entries).unwrap(), 2);

    let content = std::fs::read_to_string(&path).unwrap();
    let first: serde_json::Value = serde_json::from_str(content.lines().next().unwrap()).unwrap();
    assert_eq!(first["topic"], TOPIC_LOG);
    assert_eq!(first["kind"], "INFO");
    assert_eq!(first["payload"]["message"], "Exam started");
    assert!(first["hash_prev"].is_null());
    assert!(verify_hash_chain(&path).unwrap().is_valid());
}
