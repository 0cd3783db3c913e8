//! Axum router and all HTTP handlers for exw-daemon.
//!
//! `build_router` is the single entry point; `main.rs` calls it and attaches
//! middleware layers so tests can drive the bare router.

use std::{convert::Infallible, sync::Arc};

use axum::{
    extract::State,
    http::{HeaderMap, HeaderValue, StatusCode},
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Response,
    },
    routing::{get, post},
    Json, Router,
};
use exw_engine::{IngestOutcome, MonitorEngine};
use exw_session::TransitionError;
use futures_util::{Stream, StreamExt};
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    api_types::{
        ErrorResponse, GateRefusedResponse, HealthResponse, LogResponse, SessionResponse,
        SignalsRequest, SignalsResponse, StartRequest, TimestampRequest, VerificationRequest,
    },
    state::{AppState, BusMsg, LiveSession},
};

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/v1/health", get(health))
        .route("/v1/stream", get(stream))
        .route("/v1/session/start", post(session_start))
        .route("/v1/session/signals", post(session_signals))
        .route("/v1/session/submit", post(session_submit))
        .route("/v1/session/time-expired", post(session_time_expired))
        .route("/v1/session/verification", post(session_verification))
        .route("/v1/session/snapshot", get(session_snapshot))
        .route("/v1/session/report", get(session_report))
        .route("/v1/session/log", get(session_log))
        .with_state(state)
}

fn no_session() -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse::new("NO_SESSION: start a session first")),
    )
        .into_response()
}

fn transition_refused(e: &TransitionError) -> Response {
    match e {
        TransitionError::PreconditionsFailed { missing } => (
            StatusCode::FORBIDDEN,
            Json(GateRefusedResponse {
                error: format!("GATE_REFUSED: {}", e),
                gate: "session_preconditions".to_string(),
                missing: missing.clone(),
            }),
        )
            .into_response(),
        TransitionError::IllegalTransition { .. } => (
            StatusCode::CONFLICT,
            Json(ErrorResponse::new(e.to_string())),
        )
            .into_response(),
    }
}

fn session_response(live: &LiveSession) -> Response {
    (
        StatusCode::OK,
        Json(SessionResponse {
            session_id: live.session_id,
            snapshot: live.engine.snapshot(),
        }),
    )
        .into_response()
}

// ---------------------------------------------------------------------------
// GET /v1/health
// ---------------------------------------------------------------------------

pub(crate) async fn health(State(st): State<Arc<AppState>>) -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(HealthResponse {
            ok: true,
            service: st.build.service.to_string(),
            version: st.build.version.to_string(),
            config_hash: st.config_hash.clone(),
        }),
    )
}

// ---------------------------------------------------------------------------
// POST /v1/session/start
// ---------------------------------------------------------------------------

/// 409 while a session is live (not Completed); 403 when the gate fails.
/// A Completed session is replaced by the new one.
pub(crate) async fn session_start(
    State(st): State<Arc<AppState>>,
    Json(req): Json<StartRequest>,
) -> Response {
    let mut slot = st.session.lock().await;

    if let Some(live) = slot.as_ref() {
        if !live.engine.state().is_terminal() {
            return (
                StatusCode::CONFLICT,
                Json(ErrorResponse::new(format!(
                    "SESSION_ACTIVE: session {} is {}",
                    live.session_id,
                    live.engine.state().as_str()
                ))),
            )
                .into_response();
        }
    }

    let mut engine = MonitorEngine::new(st.engine_cfg.clone());
    if let Err(e) = engine.begin(req.identity, &req.capabilities, req.ts_ms) {
        return transition_refused(&e);
    }

    let session_id = Uuid::new_v4();
    let audit = match st.open_audit(session_id) {
        Ok(w) => w,
        Err(e) => {
            warn!(%session_id, error = %e, "audit disabled for session");
            None
        }
    };

    let mut live = LiveSession::new(session_id, engine, audit);
    live.publish(&st.bus);
    info!(%session_id, "session/start");

    let resp = session_response(&live);
    *slot = Some(live);
    resp
}

// ---------------------------------------------------------------------------
// POST /v1/session/signals
// ---------------------------------------------------------------------------

/// Batch delivery, applied in order. Discards are counted, never errors.
pub(crate) async fn session_signals(
    State(st): State<Arc<AppState>>,
    Json(req): Json<SignalsRequest>,
) -> Response {
    let mut slot = st.session.lock().await;
    let Some(live) = slot.as_mut() else {
        return no_session();
    };

    let mut accepted = 0;
    let mut discarded = 0;
    let mut warnings = 0;
    let mut terminated = false;
    for signal in &req.signals {
        match live.engine.ingest_raw(signal) {
            IngestOutcome::Accepted {
                warnings_raised,
                terminated: t,
                ..
            } => {
                accepted += 1;
                warnings += warnings_raised;
                terminated |= t;
            }
            IngestOutcome::Discarded { .. } => discarded += 1,
        }
    }
    live.publish(&st.bus);

    (
        StatusCode::OK,
        Json(SignalsResponse {
            session_id: live.session_id,
            accepted,
            discarded,
            warnings_raised: warnings,
            terminated,
            snapshot: live.engine.snapshot(),
        }),
    )
        .into_response()
}

// ---------------------------------------------------------------------------
// POST /v1/session/submit, /v1/session/time-expired
// ---------------------------------------------------------------------------

pub(crate) async fn session_submit(
    State(st): State<Arc<AppState>>,
    Json(req): Json<TimestampRequest>,
) -> Response {
    end_exam(&st, req.ts_ms, MonitorEngine::submit, "session/submit").await
}

pub(crate) async fn session_time_expired(
    State(st): State<Arc<AppState>>,
    Json(req): Json<TimestampRequest>,
) -> Response {
    end_exam(&st, req.ts_ms, MonitorEngine::time_expired, "session/time-expired").await
}

async fn end_exam(
    st: &AppState,
    ts_ms: u64,
    op: fn(&mut MonitorEngine, u64) -> Result<(), TransitionError>,
    route: &'static str,
) -> Response {
    let mut slot = st.session.lock().await;
    let Some(live) = slot.as_mut() else {
        return no_session();
    };

    if let Err(e) = op(&mut live.engine, ts_ms) {
        return transition_refused(&e);
    }
    live.publish(&st.bus);
    info!(session_id = %live.session_id, route, "session ended");
    session_response(live)
}

// ---------------------------------------------------------------------------
// POST /v1/session/verification
// ---------------------------------------------------------------------------

pub(crate) async fn session_verification(
    State(st): State<Arc<AppState>>,
    Json(req): Json<VerificationRequest>,
) -> Response {
    let mut slot = st.session.lock().await;
    let Some(live) = slot.as_mut() else {
        return no_session();
    };

    let report = match live.engine.complete_verification(req.outcome, req.ts_ms) {
        Ok(r) => r.clone(),
        Err(e) => return transition_refused(&e),
    };
    live.publish(&st.bus);
    info!(
        session_id = %live.session_id,
        score = report.score,
        "session/verification"
    );

    (StatusCode::OK, Json(report)).into_response()
}

// ---------------------------------------------------------------------------
// GET /v1/session/{snapshot,report,log}
// ---------------------------------------------------------------------------

pub(crate) async fn session_snapshot(State(st): State<Arc<AppState>>) -> Response {
    let slot = st.session.lock().await;
    match slot.as_ref() {
        Some(live) => session_response(live),
        None => no_session(),
    }
}

pub(crate) async fn session_report(State(st): State<Arc<AppState>>) -> Response {
    let slot = st.session.lock().await;
    let Some(live) = slot.as_ref() else {
        return no_session();
    };
    match live.engine.report() {
        Some(r) => (StatusCode::OK, Json(r.clone())).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse::new(format!(
                "REPORT_NOT_READY: session is {}",
                live.engine.state().as_str()
            ))),
        )
            .into_response(),
    }
}

pub(crate) async fn session_log(State(st): State<Arc<AppState>>) -> Response {
    let slot = st.session.lock().await;
    let Some(live) = slot.as_ref() else {
        return no_session();
    };
    (
        StatusCode::OK,
        Json(LogResponse {
            session_id: live.session_id,
            entries: live.engine.log().to_vec(),
        }),
    )
        .into_response()
}

// ---------------------------------------------------------------------------
// GET /v1/stream  (SSE)
// ---------------------------------------------------------------------------

pub(crate) async fn stream(State(st): State<Arc<AppState>>) -> Response {
    let mut headers = HeaderMap::new();
    headers.insert("Cache-Control", HeaderValue::from_static("no-cache"));
    headers.insert("Connection", HeaderValue::from_static("keep-alive"));

    let rx = st.bus.subscribe();
    let events = broadcast_to_sse(rx);

    (headers, Sse::new(events).keep_alive(KeepAlive::new())).into_response()
}

fn broadcast_to_sse(
    rx: broadcast::Receiver<BusMsg>,
) -> impl Stream<Item = Result<Event, Infallible>> {
    BroadcastStream::new(rx).filter_map(|msg| async move {
        match msg {
            Ok(m) => {
                let event_name = match &m {
                    BusMsg::Heartbeat { .. } => "heartbeat",
                    BusMsg::Snapshot { .. } => "snapshot",
                    BusMsg::LogLine { .. } => "log",
                };
                let data = serde_json::to_string(&m).ok()?;
                Some(Ok(Event::default().event(event_name).data(data)))
            }
            Err(_) => None, // lagged / closed
        }
    })
}
