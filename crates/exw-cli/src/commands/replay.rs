//! `exw replay`: recorded `SessionInput` script -> fresh engine -> report JSON.

use anyhow::{bail, Context, Result};
use exw_audit::{AuditWriter, TOPIC_REPORT, TOPIC_SESSION};
use exw_engine::{Applied, MonitorEngine};
use exw_schemas::SessionInput;
use serde_json::json;
use std::fs;
use tracing::{info, warn};
use uuid::Uuid;

use super::load_engine_config;

/// Blank lines and `#` comments are skipped; any other bad line fails the whole script.
pub fn parse_script(text: &str) -> Result<Vec<SessionInput>> {
    let mut out = Vec::new();
    for (i, line) in text.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let input: SessionInput = serde_json::from_str(trimmed)
            .with_context(|| format!("malformed script line {}", i + 1))?;
        out.push(input);
    }
    Ok(out)
}

pub fn run(
    script_path: &str,
    config_paths: &[String],
    strict_config: bool,
    audit_path: Option<&str>,
) -> Result<()> {
    let (cfg, loaded) = load_engine_config(config_paths, strict_config)?;

    let text = fs::read_to_string(script_path)
        .with_context(|| format!("read script failed: {}", script_path))?;
    let inputs = parse_script(&text)?;
    info!(inputs = inputs.len(), script = script_path, "replaying session script");

    let mut engine = MonitorEngine::new(cfg);
    for (i, input) in inputs.iter().enumerate() {
        if let Applied::Refused(e) = engine.apply(input) {
            warn!(line = i + 1, error = %e, "transition refused");
        }
    }

    let Some(report) = engine.report() else {
        bail!(
            "script ended in state {} without completing verification; no report",
            engine.state().as_str()
        );
    };

    if let Some(path) = audit_path {
        let mut w = AuditWriter::new(path, Uuid::new_v4(), true)?;
        w.append(
            TOPIC_SESSION,
            "REPLAY",
            json!({
                "script": script_path,
                "inputs": inputs.len(),
                "config_hash": loaded.as_ref().map(|l| l.config_hash.clone()),
            }),
        )?;
        w.append_log_entries(engine.log())?;
        w.append_value(TOPIC_REPORT, "INTEGRITY_REPORT", report)?;
        info!(path, records = w.seq(), "audit written");
    }

    let out = serde_json::to_string_pretty(report).context("serialize report json failed")?;
    println!("{}", out);
    Ok(())
}
