use std::collections::BTreeMap;

use exw_schemas::{Event, EventKind, RawSignal};
use serde::{Deserialize, Serialize};

use crate::gaze::{GazeConfig, GazeDebouncer, GazeTransition};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NormalizerConfig {
    /// Paste previews keep at most this many characters.
    pub paste_preview_chars: usize,
    pub gaze: GazeConfig,
}

impl NormalizerConfig {
    pub fn defaults() -> Self {
        Self {
            paste_preview_chars: 50,
            gaze: GazeConfig::defaults(),
        }
    }
}

/// Result of normalizing one raw signal.
#[derive(Clone, Debug, PartialEq)]
pub enum Normalized {
    Emitted(Event),
    Suppressed(SuppressReason),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SuppressReason {
    /// Normalizer closed at session end.
    Closed,
    /// First keydown in its input context has no predecessor.
    FirstKeystroke,
    /// Edge signal repeating the current state (hide while hidden, ...).
    DuplicateEdge,
    /// Gaze sample that did not change the debounced state.
    NoGazeTransition,
}

/// Converts raw signals into the canonical event stream.
///
/// Tracks just enough edge state to drop duplicate deliveries; every emitted
/// event gets the next arrival `seq`.
#[derive(Clone, Debug)]
pub struct EventNormalizer {
    cfg: NormalizerConfig,
    next_seq: u64,
    tab_hidden: bool,
    window_blurred: bool,
    gaze_away: bool,
    last_keydown: BTreeMap<String, u64>,
    gaze: GazeDebouncer,
    closed: bool,
}

impl EventNormalizer {
    pub fn new(cfg: NormalizerConfig) -> Self {
        let gaze = GazeDebouncer::new(cfg.gaze.clone());
        Self {
            cfg,
            next_seq: 0,
            tab_hidden: false,
            window_blurred: false,
            gaze_away: false,
            last_keydown: BTreeMap::new(),
            gaze,
            closed: false,
        }
    }

    /// Stop forwarding. Every later signal is suppressed.
    pub fn close(&mut self) {
        self.closed = true;
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Number of events emitted so far (also the next `seq`).
    pub fn emitted(&self) -> u64 {
        self.next_seq
    }

    pub fn normalize(&mut self, raw: &RawSignal) -> Normalized {
        if self.closed {
            return Normalized::Suppressed(SuppressReason::Closed);
        }

        let ts_ms = raw.ts_ms();
        let kind = match raw {
            RawSignal::VisibilityChange { hidden, .. } => {
                if *hidden {
                    EventKind::TabHidden
                } else {
                    EventKind::TabVisible
                }
            }
            RawSignal::WindowBlur { .. } => EventKind::WindowBlur,
            RawSignal::WindowFocus { .. } => EventKind::WindowFocus,
            RawSignal::Paste { text, .. } => EventKind::Paste {
                text_len: text.chars().count(),
                preview: text.chars().take(self.cfg.paste_preview_chars).collect(),
            },
            RawSignal::KeyDown { context, .. } => {
                match self.last_keydown.insert(context.clone(), ts_ms) {
                    None => return Normalized::Suppressed(SuppressReason::FirstKeystroke),
                    Some(prev) => EventKind::KeyInterval {
                        ms: ts_ms as f64 - prev as f64,
                    },
                }
            }
            RawSignal::GazeAway { .. } => EventKind::GazeAway,
            RawSignal::GazeBack { .. } => EventKind::GazeBack,
            RawSignal::GazeSample {
                x, y, face_present, ..
            } => match self.gaze.observe(ts_ms, *x, *y, *face_present) {
                Some(GazeTransition::Away) => EventKind::GazeAway,
                Some(GazeTransition::Back) => EventKind::GazeBack,
                None => return Normalized::Suppressed(SuppressReason::NoGazeTransition),
            },
        };

        self.emit(ts_ms, kind)
    }

    /// Admit an already-canonical event into the stream.
    ///
    /// The caller's `seq` is not kept: the event is re-sequenced in arrival
    /// order and goes through the same edge tracking as raw signals, so both
    /// input styles can be mixed within one session.
    pub fn admit(&mut self, ev: &Event) -> Normalized {
        if self.closed {
            return Normalized::Suppressed(SuppressReason::Closed);
        }
        self.emit(ev.ts_ms, ev.kind.clone())
    }

    fn emit(&mut self, ts_ms: u64, kind: EventKind) -> Normalized {
        if !self.track_edge(&kind) {
            return Normalized::Suppressed(SuppressReason::DuplicateEdge);
        }
        let seq = self.next_seq;
        self.next_seq += 1;
        Normalized::Emitted(Event { seq, ts_ms, kind })
    }

    /// False when `kind` repeats the current edge state.
    fn track_edge(&mut self, kind: &EventKind) -> bool {
        let (slot, value) = match kind {
            EventKind::TabHidden => (&mut self.tab_hidden, true),
            EventKind::TabVisible => (&mut self.tab_hidden, false),
            EventKind::WindowBlur => (&mut self.window_blurred, true),
            EventKind::WindowFocus => (&mut self.window_blurred, false),
            EventKind::GazeAway => (&mut self.gaze_away, true),
            EventKind::GazeBack => (&mut self.gaze_away, false),
            EventKind::Paste { .. } | EventKind::KeyInterval { .. } => return true,
        };
        if *slot == value {
            return false;
        }
        *slot = value;
        if matches!(kind, EventKind::GazeAway | EventKind::GazeBack) {
            // Pre-debounced gaze edges move the debouncer too.
            self.gaze.sync_reported(value);
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn emitted(n: Normalized) -> Event {
        match n {
            Normalized::Emitted(ev) => ev,
            Normalized::Suppressed(r) => panic!("expected event, got {r:?}"),
        }
    }

    fn key(ts_ms: u64, context: &str) -> RawSignal {
        RawSignal::KeyDown {
            ts_ms,
            context: context.to_string(),
        }
    }

    #[test]
    fn first_keystroke_yields_no_interval() {
        let mut n = EventNormalizer::new(NormalizerConfig::defaults());
        assert_eq!(
            n.normalize(&key(100, "q1")),
            Normalized::Suppressed(SuppressReason::FirstKeystroke)
        );
        let ev = emitted(n.normalize(&key(180, "q1")));
        assert_eq!(ev.kind, EventKind::KeyInterval { ms: 80.0 });
        assert_eq!(ev.seq, 0);
    }

    #[test]
    fn intervals_are_tracked_per_context() {
        let mut n = EventNormalizer::new(NormalizerConfig::defaults());
        n.normalize(&key(100, "q1"));
        assert_eq!(
            n.normalize(&key(150, "q2")),
            Normalized::Suppressed(SuppressReason::FirstKeystroke)
        );
        let ev = emitted(n.normalize(&key(400, "q1")));
        assert_eq!(ev.kind, EventKind::KeyInterval { ms: 300.0 });
    }

    #[test]
    fn backwards_clock_produces_negative_interval() {
        let mut n = EventNormalizer::new(NormalizerConfig::defaults());
        n.normalize(&key(500, "q1"));
        let ev = emitted(n.normalize(&key(450, "q1")));
        assert_eq!(ev.kind, EventKind::KeyInterval { ms: -50.0 });
    }

    #[test]
    fn paste_preview_is_bounded_by_chars() {
        let mut n = EventNormalizer::new(NormalizerConfig::defaults());
        let text = "é".repeat(80);
        let ev = emitted(n.normalize(&RawSignal::Paste { ts_ms: 5, text }));
        match ev.kind {
            EventKind::Paste { text_len, preview } => {
                assert_eq!(text_len, 80);
                assert_eq!(preview.chars().count(), 50);
            }
            other => panic!("unexpected kind {other:?}"),
        }
    }

    #[test]
    fn duplicate_edges_are_suppressed() {
        let mut n = EventNormalizer::new(NormalizerConfig::defaults());
        let hide = RawSignal::VisibilityChange {
            ts_ms: 1,
            hidden: true,
        };
        emitted(n.normalize(&hide));
        assert_eq!(
            n.normalize(&hide),
            Normalized::Suppressed(SuppressReason::DuplicateEdge)
        );
        assert_eq!(
            n.normalize(&RawSignal::WindowFocus { ts_ms: 2 }),
            Normalized::Suppressed(SuppressReason::DuplicateEdge)
        );
        assert_eq!(
            n.normalize(&RawSignal::GazeBack { ts_ms: 3 }),
            Normalized::Suppressed(SuppressReason::DuplicateEdge)
        );
    }

    #[test]
    fn closed_normalizer_forwards_nothing() {
        let mut n = EventNormalizer::new(NormalizerConfig::defaults());
        n.close();
        assert_eq!(
            n.normalize(&RawSignal::WindowBlur { ts_ms: 1 }),
            Normalized::Suppressed(SuppressReason::Closed)
        );
        assert_eq!(n.emitted(), 0);
    }

    #[test]
    fn admitted_events_are_resequenced_and_edge_checked() {
        let mut n = EventNormalizer::new(NormalizerConfig::defaults());
        emitted(n.normalize(&RawSignal::Paste {
            ts_ms: 1,
            text: "a".into(),
        }));

        let hide = Event {
            seq: 40,
            ts_ms: 2,
            kind: EventKind::TabHidden,
        };
        assert_eq!(emitted(n.admit(&hide)).seq, 1);
        assert_eq!(
            n.normalize(&RawSignal::VisibilityChange {
                ts_ms: 3,
                hidden: true
            }),
            Normalized::Suppressed(SuppressReason::DuplicateEdge)
        );
        let back = emitted(n.normalize(&RawSignal::VisibilityChange {
            ts_ms: 4,
            hidden: false,
        }));
        assert_eq!((back.seq, back.kind), (2, EventKind::TabVisible));
    }

    #[test]
    fn gaze_samples_go_through_debouncer() {
        let mut n = EventNormalizer::new(NormalizerConfig::defaults());
        let sample = |ts_ms, x| RawSignal::GazeSample {
            ts_ms,
            x,
            y: 0.5,
            face_present: true,
        };
        assert_eq!(
            n.normalize(&sample(0, 0.95)),
            Normalized::Suppressed(SuppressReason::NoGazeTransition)
        );
        assert_eq!(emitted(n.normalize(&sample(3_000, 0.95))).kind, EventKind::GazeAway);
        assert_eq!(emitted(n.normalize(&sample(3_200, 0.5))).kind, EventKind::GazeBack);
    }
}
