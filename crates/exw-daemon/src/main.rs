//! exw-daemon entry point.
//!
//! Thin: tracing, config, shared state, middleware, HTTP server. Handlers
//! live in `routes.rs`; shared state types live in `state.rs`.

use std::{net::SocketAddr, sync::Arc, time::Duration};

use anyhow::Context;
use axum::http::{HeaderValue, Method};
use exw_config::{load_layered_yaml, report_unused_keys, UnusedKeyPolicy};
use exw_daemon::{routes, state};
use exw_engine::EngineConfig;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::{info, warn, Level};

/// Comma-separated YAML layers in merge order.
const ENV_CONFIG: &str = "EXW_CONFIG";
const ENV_AUDIT_DIR: &str = "EXW_AUDIT_DIR";
const ENV_ADDR: &str = "EXW_DAEMON_ADDR";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Silent if the file does not exist; production injects env vars directly.
    let _ = dotenvy::from_filename(".env.local");

    init_tracing();

    let mut app_state = match config_paths_from_env() {
        Some(paths) => {
            let loaded = load_layered_yaml(&paths)?;
            let unused = report_unused_keys(&loaded.config_json, UnusedKeyPolicy::Warn)?;
            for leaf in &unused.unused_leaf_pointers {
                warn!(pointer = %leaf, "config key is not read by the engine");
            }
            let cfg = EngineConfig::from_config_json(&loaded.config_json)
                .context("invalid engine config")?;
            info!(config_hash = %loaded.config_hash, "config loaded");
            state::AppState::new(cfg).with_config_hash(loaded.config_hash)
        }
        None => state::AppState::new(EngineConfig::defaults()),
    };
    if let Ok(dir) = std::env::var(ENV_AUDIT_DIR) {
        info!(dir = %dir, "session audit enabled");
        app_state = app_state.with_audit_dir(dir);
    }
    let shared = Arc::new(app_state);

    state::spawn_heartbeat(shared.bus.clone(), Duration::from_secs(1));

    let app = routes::build_router(Arc::clone(&shared))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors_localhost_only());

    let addr = bind_addr_from_env().unwrap_or_else(|| SocketAddr::from(([127, 0, 0, 1], 8787)));
    info!("exw-daemon listening on http://{}", addr);

    axum::serve(tokio::net::TcpListener::bind(addr).await?, app)
        .await
        .context("server crashed")?;

    Ok(())
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .init();
}

fn config_paths_from_env() -> Option<Vec<String>> {
    let raw = std::env::var(ENV_CONFIG).ok()?;
    let paths: Vec<String> = raw
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();
    (!paths.is_empty()).then_some(paths)
}

fn bind_addr_from_env() -> Option<SocketAddr> {
    std::env::var(ENV_ADDR).ok()?.parse().ok()
}

/// CORS: allow only localhost origins.
fn cors_localhost_only() -> CorsLayer {
    let allowed_origins = [
        "http://localhost",
        "http://127.0.0.1",
        "http://localhost:3000",
        "http://127.0.0.1:3000",
        "http://localhost:5173",
        "http://127.0.0.1:5173",
    ];

    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|o| HeaderValue::from_str(o).ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(tower_http::cors::Any)
}
