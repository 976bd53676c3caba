//! Pause and cancel flags, and the waits that honor them.
//!
//! All timed phases of a session go through the wait primitives here
//! instead of a bare sleep. Waits advance in short ticks so a flag flip
//! is observed within one tick, and paused time is never counted
//! toward the waited duration.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Returned by a wait that was interrupted by cancellation.
#[derive(Debug, Error)]
#[error("session cancelled")]
pub struct Cancelled;

/// Shared pause/cancel switches for one session run.
///
/// Cheap to clone; all clones observe the same flags. A controller and
/// any number of external handles (UI, signal handler) can hold one.
#[derive(Debug, Clone, Default)]
pub struct ControlFlags {
    paused: Arc<AtomicBool>,
    cancelled: Arc<AtomicBool>,
}

impl ControlFlags {
    /// Creates a fresh pair of cleared flags.
    pub fn new() -> Self {
        Self::default()
    }

    /// Freezes timed progress. No-op outside a timed phase.
    pub fn pause(&self) {
        self.paused.store(true, Ordering::SeqCst);
    }

    /// Resumes timed progress from where it froze.
    pub fn resume(&self) {
        self.paused.store(false, Ordering::SeqCst);
    }

    /// Requests cancellation. Observed at the next tick boundary.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// True while paused.
    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::SeqCst)
    }

    /// True once cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Clears both flags for a new run.
    pub(crate) fn reset(&self) {
        self.paused.store(false, Ordering::SeqCst);
        self.cancelled.store(false, Ordering::SeqCst);
    }
}

/// Waits for `duration` of unpaused time, checking flags every `tick`.
///
/// Paused ticks pass wall-clock time but do not count toward
/// `duration`. Returns `Err(Cancelled)` as soon as cancellation is
/// observed, paused or not.
pub(crate) async fn controlled_wait(
    duration: Duration,
    flags: &ControlFlags,
    tick: Duration,
) -> Result<(), Cancelled> {
    wait_impl(duration, flags, tick, true, |_| {}).await
}

/// Like [`controlled_wait`] but ignores the pause flag.
///
/// Used by phases where pausing is not meaningful (curtain entry,
/// developing) and only cancellation can interrupt.
pub(crate) async fn cancellable_wait(
    duration: Duration,
    flags: &ControlFlags,
    tick: Duration,
) -> Result<(), Cancelled> {
    wait_impl(duration, flags, tick, false, |_| {}).await
}

/// [`controlled_wait`] with a callback invoked once per counted tick.
///
/// The callback receives the number of ticks counted so far, starting
/// at 1. Drives per-tick work such as feeding recorder frames and
/// whole-second countdown notifications.
pub(crate) async fn controlled_wait_with(
    duration: Duration,
    flags: &ControlFlags,
    tick: Duration,
    on_tick: impl FnMut(u32),
) -> Result<(), Cancelled> {
    wait_impl(duration, flags, tick, true, on_tick).await
}

async fn wait_impl(
    duration: Duration,
    flags: &ControlFlags,
    tick: Duration,
    honor_pause: bool,
    mut on_tick: impl FnMut(u32),
) -> Result<(), Cancelled> {
    let tick = tick.max(Duration::from_millis(1));
    let mut counted = Duration::ZERO;
    let mut ticks: u32 = 0;

    while counted < duration {
        if flags.is_cancelled() {
            return Err(Cancelled);
        }
        if honor_pause && flags.is_paused() {
            // Wall time passes, counted time does not.
            tokio::time::sleep(tick).await;
            continue;
        }
        let step = tick.min(duration - counted);
        tokio::time::sleep(step).await;
        counted += step;
        ticks += 1;
        on_tick(ticks);
    }

    if flags.is_cancelled() {
        return Err(Cancelled);
    }
    Ok(())
}
