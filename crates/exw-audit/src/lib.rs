//! exw-audit
//!
//! Append-only JSONL audit trail for exam sessions. One record per line,
//! keys sorted, optional SHA-256 hash chain (`hash_prev` -> `hash_self`).

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use exw_schemas::LogEntry;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use uuid::Uuid;

pub const TOPIC_SESSION: &str = "SESSION";
pub const TOPIC_LOG: &str = "LOG";
pub const TOPIC_REPORT: &str = "REPORT";

pub struct AuditWriter {
    path: PathBuf,
    session_id: Uuid,
    hash_chain: bool,
    last_hash: Option<String>,
    /// Records appended so far (the next record's `seq`).
    seq: u64,
}

impl AuditWriter {
    /// Creates the writer and its parent dirs. The file itself is created on first append.
    pub fn new(path: impl AsRef<Path>, session_id: Uuid, hash_chain: bool) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("create_dir_all {:?}", parent))?;
            }
        }

        Ok(Self {
            path,
            session_id,
            hash_chain,
            last_hash: None,
            seq: 0,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn seq(&self) -> u64 {
        self.seq
    }

    pub fn last_hash(&self) -> Option<&str> {
        self.last_hash.as_deref()
    }

    /// Resume an existing log: next `seq` and the chain tip.
    pub fn resume(&mut self, seq: u64, last_hash: Option<String>) {
        self.seq = seq;
        self.last_hash = last_hash;
    }

    pub fn append(&mut self, topic: &str, kind: &str, payload: Value) -> Result<AuditRecord> {
        let record_id = derive_record_id(self.session_id, self.last_hash.as_deref(), &payload, self.seq)?;

        let mut rec = AuditRecord {
            record_id,
            session_id: self.session_id,
            seq: self.seq,
            ts_utc: Utc::now(),
            topic: topic.to_string(),
            kind: kind.to_string(),
            payload,
            hash_prev: None,
            hash_self: None,
        };

        if self.hash_chain {
            rec.hash_prev = self.last_hash.clone();
            let h = compute_record_hash(&rec)?;
            rec.hash_self = Some(h.clone());
            self.last_hash = Some(h);
        }

        let line = canonical_json_line(&rec)?;
        append_line(&self.path, &line)?;
        self.seq += 1;

        Ok(rec)
    }

    /// Serialize any value as the payload.
    pub fn append_value<T: Serialize>(&mut self, topic: &str, kind: &str, value: &T) -> Result<AuditRecord> {
        let payload = serde_json::to_value(value)
            .with_context(|| format!("serialize audit payload {topic}/{kind}"))?;
        self.append(topic, kind, payload)
    }

    /// One `LOG` record per entry, kind = severity label.
    pub fn append_log_entries(&mut self, entries: &[LogEntry]) -> Result<usize> {
        for e in entries {
            self.append_value(TOPIC_LOG, e.severity.as_str(), e)?;
        }
        Ok(entries.len())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditRecord {
    pub record_id: Uuid,
    pub session_id: Uuid,
    pub seq: u64,
    pub ts_utc: DateTime<Utc>,
    pub topic: String,
    pub kind: String,
    pub payload: Value,
    pub hash_prev: Option<String>,
    pub hash_self: Option<String>,
}

/// UUIDv5 over (session, chain tip, seq, canonical payload). No RNG.
fn derive_record_id(session_id: Uuid, last_hash: Option<&str>, payload: &Value, seq: u64) -> Result<Uuid> {
    let payload = serde_json::to_string(&sort_keys(payload)).context("serialize payload for record_id")?;
    let name = format!("{}|{}|{}|{}", session_id, last_hash.unwrap_or("-"), seq, payload);
    Ok(Uuid::new_v5(&Uuid::NAMESPACE_OID, name.as_bytes()))
}

fn append_line(path: &Path, line: &str) -> Result<()> {
    let mut f = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("open audit log {:?}", path))?;
    f.write_all(line.as_bytes()).context("write audit line failed")?;
    f.write_all(b"\n").context("write newline failed")?;
    Ok(())
}

fn canonical_json_line<T: Serialize>(v: &T) -> Result<String> {
    let raw = serde_json::to_value(v).context("serialize audit record failed")?;
    serde_json::to_string(&sort_keys(&raw)).context("json stringify failed")
}

fn sort_keys(v: &Value) -> Value {
    match v {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            let mut out = serde_json::Map::new();
            for k in keys {
                out.insert(k.clone(), sort_keys(&map[k]));
            }
            Value::Object(out)
        }
        Value::Array(arr) => Value::Array(arr.iter().map(sort_keys).collect()),
        _ => v.clone(),
    }
}

/// Hash of the canonical record with `hash_self` cleared.
pub fn compute_record_hash(rec: &AuditRecord) -> Result<String> {
    let mut clone = rec.clone();
    clone.hash_self = None;

    let canonical = canonical_json_line(&clone)?;
    let mut hasher = Sha256::new();
    hasher.update(canonical.as_bytes());
    Ok(hex::encode(hasher.finalize()))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerifyResult {
    Valid { lines: usize },
    Broken { line: usize, reason: String },
}

impl VerifyResult {
    pub fn is_valid(&self) -> bool {
        matches!(self, VerifyResult::Valid { .. })
    }
}

pub fn verify_hash_chain(path: impl AsRef<Path>) -> Result<VerifyResult> {
    let content = fs::read_to_string(path.as_ref())
        .with_context(|| format!("read audit log {:?}", path.as_ref()))?;
    verify_hash_chain_str(&content)
}

/// Checks `hash_prev` linkage, `hash_self` integrity and contiguous `seq`.
pub fn verify_hash_chain_str(content: &str) -> Result<VerifyResult> {
    let mut prev_hash: Option<String> = None;
    let mut expected_seq: Option<u64> = None;
    let mut lines = 0usize;

    for (i, line) in content.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let rec: AuditRecord = serde_json::from_str(trimmed)
            .with_context(|| format!("parse audit record at line {}", i + 1))?;
        lines += 1;

        if let Some(want) = expected_seq {
            if rec.seq != want {
                return Ok(VerifyResult::Broken {
                    line: i + 1,
                    reason: format!("seq gap: expected {}, got {}", want, rec.seq),
                });
            }
        }
        expected_seq = Some(rec.seq + 1);

        if rec.hash_prev != prev_hash {
            return Ok(VerifyResult::Broken {
                line: i + 1,
                reason: format!(
                    "hash_prev mismatch: expected {:?}, got {:?}",
                    prev_hash, rec.hash_prev
                ),
            });
        }

        if let Some(ref claimed) = rec.hash_self {
            let recomputed = compute_record_hash(&rec)?;
            if *claimed != recomputed {
                return Ok(VerifyResult::Broken {
                    line: i + 1,
                    reason: format!("hash_self mismatch: claimed {}, recomputed {}", claimed, recomputed),
                });
            }
        }

        prev_hash = rec.hash_self.clone();
    }

    Ok(VerifyResult::Valid { lines })
}
