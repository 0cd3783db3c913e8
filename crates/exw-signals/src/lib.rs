//! exw-signals
//!
//! Event normalization for the proctoring core.
//!
//! Responsibilities:
//! - Raw platform signals -> canonical [`Event`] stream with arrival `seq`
//! - Keystroke intervals per input context (first keydown yields nothing)
//! - Bounded paste previews (full clipboard text never leaves this crate)
//! - Duplicate edge suppression (hide while hidden, blur while blurred, ...)
//! - Optional gaze debouncing of raw position samples
//!
//! No scoring lives here. Pure deterministic logic: no IO, no wall-clock.

mod gaze;
mod normalizer;

pub use exw_schemas::{Event, EventKind, RawSignal};
pub use gaze::{GazeConfig, GazeDebouncer, GazeTransition};
pub use normalizer::{EventNormalizer, Normalized, NormalizerConfig, SuppressReason};
