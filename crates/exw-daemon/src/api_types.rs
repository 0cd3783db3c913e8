//! Request and response bodies for the exw-daemon HTTP endpoints.
//!
//! No business logic lives here.

use exw_engine::MonitorSnapshot;
use exw_schemas::{Capabilities, Identity, LogEntry, RawSignal, VerificationOutcome};
use exw_session::Precondition;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub ok: bool,
    pub service: String,
    pub version: String,
    pub config_hash: Option<String>,
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StartRequest {
    pub ts_ms: u64,
    pub identity: Identity,
    #[serde(default)]
    pub capabilities: Capabilities,
}

/// Body for submit / time-expired.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimestampRequest {
    pub ts_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignalsRequest {
    pub signals: Vec<RawSignal>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationRequest {
    pub ts_ms: u64,
    #[serde(default)]
    pub outcome: VerificationOutcome,
}

// ---------------------------------------------------------------------------
// Responses
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionResponse {
    pub session_id: Uuid,
    pub snapshot: MonitorSnapshot,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignalsResponse {
    pub session_id: Uuid,
    pub accepted: u32,
    pub discarded: u32,
    pub warnings_raised: u32,
    pub terminated: bool,
    pub snapshot: MonitorSnapshot,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogResponse {
    pub session_id: Uuid,
    pub entries: Vec<LogEntry>,
}

/// 403 when the session start gate fails.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GateRefusedResponse {
    pub error: String,
    pub gate: String,
    pub missing: Vec<Precondition>,
}

/// 404 / 409 bodies.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}
