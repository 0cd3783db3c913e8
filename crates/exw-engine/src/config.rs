//! Engine configuration, read from canonical config JSON (produced by exw-config).
//!
//! Every threshold has a default; a key that is present must have the right
//! type and a sane value, otherwise loading fails naming the pointer.

use anyhow::{bail, Result};
use exw_ledger::LedgerConfig;
use exw_scoring::ScoringConfig;
use exw_session::SessionConfig;
use exw_signals::{GazeConfig, NormalizerConfig};
use exw_typing::TypingConfig;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    pub signals: NormalizerConfig,
    pub typing: TypingConfig,
    pub ledger: LedgerConfig,
    /// Warning budget; the warning that reaches it terminates the exam.
    pub max_warnings: u32,
    pub session: SessionConfig,
    pub scoring: ScoringConfig,
    /// Entries returned by `snapshot()` for live display (full log kept regardless).
    pub live_log_limit: usize,
}

impl EngineConfig {
    pub fn defaults() -> Self {
        Self {
            signals: NormalizerConfig::defaults(),
            typing: TypingConfig::defaults(),
            ledger: LedgerConfig::defaults(),
            max_warnings: 5,
            session: SessionConfig::defaults(),
            scoring: ScoringConfig::defaults(),
            live_log_limit: 50,
        }
    }

    /// Build from canonical config JSON. Missing keys take defaults.
    ///
    /// Read pointers (keep in sync with `exw_config::CONSUMED_POINTERS`):
    /// - /typing/{baseline_samples, sigma_multiplier, anomaly_ceiling_ms,
    ///   anomaly_increment, anomaly_emit_threshold, burst_threshold_ms, burst_run_length}
    /// - /ledger/{focus_flicker_ms, paste_warning_threshold}
    /// - /escalation/max_warnings
    /// - /signals/paste_preview_chars, /signals/gaze/{center_min, center_max, sustain_ms}
    /// - /session/require_{camera, microphone, face, fullscreen}
    /// - /scoring/{violation_weight, gaze_divisor, high_threshold, medium_threshold}
    /// - /display/{live_log_limit, warning_log_limit}
    pub fn from_config_json(cfg: &Value) -> Result<Self> {
        let d = Self::defaults();

        let typing = TypingConfig {
            baseline_samples: read_u64(cfg, "/typing/baseline_samples", d.typing.baseline_samples)?,
            sigma_multiplier: read_f64(cfg, "/typing/sigma_multiplier", d.typing.sigma_multiplier)?,
            anomaly_ceiling_ms: read_f64(
                cfg,
                "/typing/anomaly_ceiling_ms",
                d.typing.anomaly_ceiling_ms,
            )?,
            anomaly_increment: read_f64(cfg, "/typing/anomaly_increment", d.typing.anomaly_increment)?,
            anomaly_emit_threshold: read_f64(
                cfg,
                "/typing/anomaly_emit_threshold",
                d.typing.anomaly_emit_threshold,
            )?,
            burst_threshold_ms: read_f64(
                cfg,
                "/typing/burst_threshold_ms",
                d.typing.burst_threshold_ms,
            )?,
            burst_run_length: read_u32(cfg, "/typing/burst_run_length", d.typing.burst_run_length)?,
        };

        let ledger = LedgerConfig {
            focus_flicker_ms: read_u64(cfg, "/ledger/focus_flicker_ms", d.ledger.focus_flicker_ms)?,
            paste_warning_threshold: read_u32(
                cfg,
                "/ledger/paste_warning_threshold",
                d.ledger.paste_warning_threshold,
            )?,
        };

        let signals = NormalizerConfig {
            paste_preview_chars: read_usize(
                cfg,
                "/signals/paste_preview_chars",
                d.signals.paste_preview_chars,
            )?,
            gaze: GazeConfig {
                center_min: read_f64(cfg, "/signals/gaze/center_min", d.signals.gaze.center_min)?,
                center_max: read_f64(cfg, "/signals/gaze/center_max", d.signals.gaze.center_max)?,
                sustain_ms: read_u64(cfg, "/signals/gaze/sustain_ms", d.signals.gaze.sustain_ms)?,
            },
        };

        let session = SessionConfig {
            require_camera: read_bool(cfg, "/session/require_camera", d.session.require_camera)?,
            require_microphone: read_bool(
                cfg,
                "/session/require_microphone",
                d.session.require_microphone,
            )?,
            require_face: read_bool(cfg, "/session/require_face", d.session.require_face)?,
            require_fullscreen: read_bool(
                cfg,
                "/session/require_fullscreen",
                d.session.require_fullscreen,
            )?,
        };

        let scoring = ScoringConfig {
            violation_weight: read_u32(cfg, "/scoring/violation_weight", d.scoring.violation_weight)?,
            gaze_divisor: read_u32(cfg, "/scoring/gaze_divisor", d.scoring.gaze_divisor)?,
            high_threshold: read_u32(cfg, "/scoring/high_threshold", d.scoring.high_threshold)?,
            medium_threshold: read_u32(cfg, "/scoring/medium_threshold", d.scoring.medium_threshold)?,
            warning_display_limit: read_usize(
                cfg,
                "/display/warning_log_limit",
                d.scoring.warning_display_limit,
            )?,
        };

        let out = Self {
            signals,
            typing,
            ledger,
            max_warnings: read_u32(cfg, "/escalation/max_warnings", d.max_warnings)?,
            session,
            scoring,
            live_log_limit: read_usize(cfg, "/display/live_log_limit", d.live_log_limit)?,
        };
        out.validate()?;
        Ok(out)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_warnings == 0 {
            bail!("CONFIG_INVALID /escalation/max_warnings must be > 0");
        }
        if self.typing.baseline_samples == 0 {
            bail!("CONFIG_INVALID /typing/baseline_samples must be > 0");
        }
        if self.typing.burst_run_length == 0 {
            bail!("CONFIG_INVALID /typing/burst_run_length must be > 0");
        }
        for (ptr, v) in [
            ("/typing/sigma_multiplier", self.typing.sigma_multiplier),
            ("/typing/anomaly_ceiling_ms", self.typing.anomaly_ceiling_ms),
            ("/typing/anomaly_increment", self.typing.anomaly_increment),
            ("/typing/anomaly_emit_threshold", self.typing.anomaly_emit_threshold),
            ("/typing/burst_threshold_ms", self.typing.burst_threshold_ms),
        ] {
            if !v.is_finite() || v < 0.0 {
                bail!("CONFIG_INVALID {} must be a finite number >= 0, got {}", ptr, v);
            }
        }
        let gaze = &self.signals.gaze;
        if !(0.0..=1.0).contains(&gaze.center_min)
            || !(0.0..=1.0).contains(&gaze.center_max)
            || gaze.center_min >= gaze.center_max
        {
            bail!(
                "CONFIG_INVALID /signals/gaze: need 0 <= center_min < center_max <= 1, got {}..{}",
                gaze.center_min,
                gaze.center_max
            );
        }
        if self.scoring.gaze_divisor == 0 {
            bail!("CONFIG_INVALID /scoring/gaze_divisor must be > 0");
        }
        if self.scoring.high_threshold > exw_scoring::MAX_SCORE
            || self.scoring.medium_threshold > self.scoring.high_threshold
        {
            bail!(
                "CONFIG_INVALID /scoring: need medium_threshold <= high_threshold <= {}, got {} / {}",
                exw_scoring::MAX_SCORE,
                self.scoring.medium_threshold,
                self.scoring.high_threshold
            );
        }
        Ok(())
    }
}

fn read_u64(cfg: &Value, ptr: &str, default: u64) -> Result<u64> {
    match cfg.pointer(ptr) {
        None | Some(Value::Null) => Ok(default),
        Some(v) => match v.as_u64() {
            Some(n) => Ok(n),
            None => bail!("CONFIG_INVALID {} must be a non-negative integer, got {}", ptr, v),
        },
    }
}

fn read_u32(cfg: &Value, ptr: &str, default: u32) -> Result<u32> {
    let n = read_u64(cfg, ptr, u64::from(default))?;
    match u32::try_from(n) {
        Ok(n) => Ok(n),
        Err(_) => bail!("CONFIG_INVALID {} out of range: {}", ptr, n),
    }
}

fn read_usize(cfg: &Value, ptr: &str, default: usize) -> Result<usize> {
    let n = read_u64(cfg, ptr, default as u64)?;
    match usize::try_from(n) {
        Ok(n) => Ok(n),
        Err(_) => bail!("CONFIG_INVALID {} out of range: {}", ptr, n),
    }
}

fn read_f64(cfg: &Value, ptr: &str, default: f64) -> Result<f64> {
    match cfg.pointer(ptr) {
        None | Some(Value::Null) => Ok(default),
        Some(v) => match v.as_f64() {
            Some(n) => Ok(n),
            None => bail!("CONFIG_INVALID {} must be a number, got {}", ptr, v),
        },
    }
}

fn read_bool(cfg: &Value, ptr: &str, default: bool) -> Result<bool> {
    match cfg.pointer(ptr) {
        None | Some(Value::Null) => Ok(default),
        Some(v) => match v.as_bool() {
            Some(b) => Ok(b),
            None => bail!("CONFIG_INVALID {} must be true/false, got {}", ptr, v),
        },
    }
}
