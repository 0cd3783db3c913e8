//! Gaze debouncer.
//!
//! The face-tracking collaborator normally delivers GazeAway/GazeBack
//! already debounced. When it only delivers raw normalized positions this
//! adapter applies the same rule: a sample is "away" when no face is present
//! or either axis leaves the centered band, and GazeAway fires only after the
//! away condition has been sustained for `sustain_ms`.

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GazeConfig {
    /// Lower edge of the centered band on both axes (normalized 0..1).
    pub center_min: f64,
    /// Upper edge of the centered band on both axes (normalized 0..1).
    pub center_max: f64,
    /// Away condition must hold this long before GazeAway is emitted.
    pub sustain_ms: u64,
}

impl GazeConfig {
    pub fn defaults() -> Self {
        Self {
            center_min: 0.35,
            center_max: 0.65,
            sustain_ms: 3_000,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GazeTransition {
    Away,
    Back,
}

#[derive(Clone, Debug)]
pub struct GazeDebouncer {
    cfg: GazeConfig,
    away_since: Option<u64>,
    reported_away: bool,
}

impl GazeDebouncer {
    pub fn new(cfg: GazeConfig) -> Self {
        Self {
            cfg,
            away_since: None,
            reported_away: false,
        }
    }

    pub fn is_reported_away(&self) -> bool {
        self.reported_away
    }

    /// Align with an externally reported edge. Clearing "away" restarts the
    /// sustain clock.
    pub fn sync_reported(&mut self, away: bool) {
        self.reported_away = away;
        if !away {
            self.away_since = None;
        }
    }

    /// Feed one sample. Non-finite coordinates are ignored without touching state.
    pub fn observe(&mut self, ts_ms: u64, x: f64, y: f64, face_present: bool) -> Option<GazeTransition> {
        if face_present && !(x.is_finite() && y.is_finite()) {
            return None;
        }

        if self.is_away(x, y, face_present) {
            let since = *self.away_since.get_or_insert(ts_ms);
            if !self.reported_away && ts_ms.saturating_sub(since) >= self.cfg.sustain_ms {
                self.reported_away = true;
                return Some(GazeTransition::Away);
            }
            return None;
        }

        self.away_since = None;
        if self.reported_away {
            self.reported_away = false;
            return Some(GazeTransition::Back);
        }
        None
    }

    fn is_away(&self, x: f64, y: f64, face_present: bool) -> bool {
        if !face_present {
            return true;
        }
        let band = self.cfg.center_min..=self.cfg.center_max;
        !band.contains(&x) || !band.contains(&y)
    }
}
