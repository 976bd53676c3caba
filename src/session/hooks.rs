//! Observer hooks for UI and audio feedback.
//!
//! The controller drives a physical-feeling sequence (curtain, flash,
//! shutter click) but owns none of the hardware that expresses it.
//! Implementors of [`BoothHooks`] get told when to act; every method
//! has a no-op default so callers implement only what they present.

use super::BoothState;

/// Audio cue points in the session sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioCue {
    /// Curtain sweep at session entry.
    CurtainOpen,
    /// Shutter click at each capture.
    Shutter,
    /// Print whirr when the strips are delivered.
    Print,
}

/// Callbacks fired as a session advances.
///
/// Called inline from the session task; implementations should hand
/// off expensive work rather than block the sequence.
pub trait BoothHooks: Send {
    /// The session moved to `state`; `pose_index` is the pose being
    /// worked on (0 outside the capture phase).
    fn state_changed(&mut self, state: BoothState, pose_index: usize) {
        let _ = (state, pose_index);
    }

    /// One whole second of countdown elapsed; `remaining` seconds left.
    fn countdown_tick(&mut self, remaining: u32) {
        let _ = remaining;
    }

    /// Flash overlay on (`true`) or off (`false`).
    fn flash(&mut self, on: bool) {
        let _ = on;
    }

    /// An audio cue point was reached.
    fn cue(&mut self, cue: AudioCue) {
        let _ = cue;
    }
}

/// Hook implementation that ignores everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoHooks;

impl BoothHooks for NoHooks {}
