//! Shared runtime state for exw-daemon.
//!
//! One live exam session at a time, held behind a single async mutex so every
//! delivery (and the escalation check inside it) runs to completion before
//! the next one starts.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use exw_audit::{AuditWriter, TOPIC_REPORT, TOPIC_SESSION};
use exw_engine::{EngineConfig, MonitorEngine, MonitorSnapshot};
use exw_schemas::Severity;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::sync::{broadcast, Mutex};
use tracing::warn;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// BusMsg: SSE event bus payload
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BusMsg {
    Heartbeat {
        ts_millis: i64,
    },
    Snapshot {
        session_id: Uuid,
        snapshot: MonitorSnapshot,
    },
    LogLine {
        session_id: Uuid,
        ts_ms: u64,
        severity: Severity,
        message: String,
    },
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BuildInfo {
    pub service: &'static str,
    pub version: &'static str,
}

// ---------------------------------------------------------------------------
// LiveSession
// ---------------------------------------------------------------------------

pub struct LiveSession {
    pub session_id: Uuid,
    pub engine: MonitorEngine,
    audit: Option<AuditWriter>,
    /// Log entries already pushed to the bus / audit file.
    published: usize,
    report_audited: bool,
}

impl LiveSession {
    pub fn new(session_id: Uuid, engine: MonitorEngine, audit: Option<AuditWriter>) -> Self {
        Self {
            session_id,
            engine,
            audit,
            published: 0,
            report_audited: false,
        }
    }

    /// Push new log lines, then a snapshot. Audit failures are logged; the
    /// session keeps running.
    pub fn publish(&mut self, bus: &broadcast::Sender<BusMsg>) {
        let log = self.engine.log();
        let fresh = &log[self.published.min(log.len())..];

        for entry in fresh {
            let _ = bus.send(BusMsg::LogLine {
                session_id: self.session_id,
                ts_ms: entry.ts_ms,
                severity: entry.severity,
                message: entry.message.clone(),
            });
        }
        if let Some(w) = self.audit.as_mut() {
            if let Err(e) = w.append_log_entries(fresh) {
                warn!(session_id = %self.session_id, error = %e, "audit append failed");
            }
        }
        self.published = log.len();

        if !self.report_audited {
            if let (Some(report), Some(w)) = (self.engine.report(), self.audit.as_mut()) {
                match w.append_value(TOPIC_REPORT, "INTEGRITY_REPORT", report) {
                    Ok(_) => self.report_audited = true,
                    Err(e) => {
                        warn!(session_id = %self.session_id, error = %e, "audit report failed")
                    }
                }
            }
        }

        let _ = bus.send(BusMsg::Snapshot {
            session_id: self.session_id,
            snapshot: self.engine.snapshot(),
        });
    }
}

// ---------------------------------------------------------------------------
// AppState
// ---------------------------------------------------------------------------

/// Cloneable (Arc) handle shared across all Axum handlers.
#[derive(Clone)]
pub struct AppState {
    pub bus: broadcast::Sender<BusMsg>,
    pub build: BuildInfo,
    pub engine_cfg: EngineConfig,
    pub config_hash: Option<String>,
    /// Directory for per-session audit files (`<session_id>.jsonl`); None disables auditing.
    pub audit_dir: Option<PathBuf>,
    pub session: Arc<Mutex<Option<LiveSession>>>,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(EngineConfig::defaults())
    }
}

impl AppState {
    pub fn new(engine_cfg: EngineConfig) -> Self {
        let (bus, _rx) = broadcast::channel::<BusMsg>(1024);
        Self {
            bus,
            build: BuildInfo {
                service: "exw-daemon",
                version: env!("CARGO_PKG_VERSION"),
            },
            engine_cfg,
            config_hash: None,
            audit_dir: None,
            session: Arc::new(Mutex::new(None)),
        }
    }

    pub fn with_config_hash(mut self, hash: impl Into<String>) -> Self {
        self.config_hash = Some(hash.into());
        self
    }

    pub fn with_audit_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.audit_dir = Some(dir.into());
        self
    }

    /// Audit writer for a new session, with its opening record written.
    pub fn open_audit(&self, session_id: Uuid) -> anyhow::Result<Option<AuditWriter>> {
        let Some(dir) = &self.audit_dir else {
            return Ok(None);
        };
        let mut w = AuditWriter::new(dir.join(format!("{session_id}.jsonl")), session_id, true)?;
        w.append(
            TOPIC_SESSION,
            "OPEN",
            json!({
                "service": self.build.service,
                "version": self.build.version,
                "config_hash": self.config_hash,
            }),
        )?;
        Ok(Some(w))
    }
}

/// Spawn a background task that emits a heartbeat SSE every `interval`.
pub fn spawn_heartbeat(bus: broadcast::Sender<BusMsg>, interval: Duration) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;
            let ts = chrono::Utc::now().timestamp_millis();
            let _ = bus.send(BusMsg::Heartbeat { ts_millis: ts });
        }
    });
}
