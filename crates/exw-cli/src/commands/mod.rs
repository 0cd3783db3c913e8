//! Command handlers for `exw`.
//!
//! Shared config loading lives here; command-specific logic lives in the submodules.

pub mod audit;
pub mod replay;

use anyhow::{Context, Result};
use exw_config::{load_layered_yaml, report_unused_keys, LoadedConfig, UnusedKeyPolicy};
use exw_engine::EngineConfig;
use tracing::warn;

/// `exw config-hash`: hash + canonical JSON of the merged layers.
pub fn config_hash(paths: &[String]) -> Result<()> {
    let loaded = load_layered_yaml(paths)?;
    let unused = report_unused_keys(&loaded.config_json, UnusedKeyPolicy::Warn)?;
    println!("config_hash={}", loaded.config_hash);
    println!("unused_keys={}", unused.unused_leaf_pointers.len());
    println!("{}", loaded.canonical_json);
    Ok(())
}

/// Layers -> validated engine config. No layers means defaults.
pub fn load_engine_config(
    paths: &[String],
    strict: bool,
) -> Result<(EngineConfig, Option<LoadedConfig>)> {
    if paths.is_empty() {
        return Ok((EngineConfig::defaults(), None));
    }

    let loaded = load_layered_yaml(paths)?;
    let policy = if strict {
        UnusedKeyPolicy::Fail
    } else {
        UnusedKeyPolicy::Warn
    };
    let unused = report_unused_keys(&loaded.config_json, policy)?;
    for leaf in &unused.unused_leaf_pointers {
        warn!(pointer = %leaf, "config key is not read by the engine");
    }

    let cfg = EngineConfig::from_config_json(&loaded.config_json)
        .with_context(|| format!("invalid engine config (hash {})", loaded.config_hash))?;
    Ok((cfg, Some(loaded)))
}
