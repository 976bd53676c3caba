//! Session orchestration.
//!
//! One controller drives the whole booth sequence: curtain entry,
//! four countdown-capture-settle rounds, developing, and composite
//! delivery. Every timed phase goes through the controlled waits in
//! [`flags`], so pause freezes capture-phase progress and cancel
//! unwinds within one tick from any phase.

mod flags;
mod hooks;
mod pose;

pub use flags::{Cancelled, ControlFlags};
pub use hooks::{AudioCue, BoothHooks, NoHooks};
pub use pose::{Pose, SessionOutput};

use crate::capture::{capture_still, CaptureError, LiveSource, SourceError};
use crate::compose::{compose_animated, compose_strip, AnimatedSettings, ComposeError};
use crate::config::BoothConfig;
use crate::filter::FilterSpec;
use crate::record::{negotiate, RecordError, SegmentRecorder, VideoSegment};
use crate::POSE_COUNT;
use flags::{cancellable_wait, controlled_wait, controlled_wait_with};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::watch;

/// Phases of a booth session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoothState {
    /// No session running.
    Idle,
    /// Curtain sweep at session entry.
    Entering,
    /// Selection locked, about to start the first countdown.
    Ready,
    /// Counting down to a capture; the pose segment is recording.
    Countdown,
    /// The capture instant: flash, still, segment close.
    Shutter,
    /// All poses captured; compositing and simulated development.
    Developing,
    /// Strips delivered.
    Result,
}

/// Errors that end a session.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The live source could not be opened. The session never started
    /// and no state changed.
    #[error("capture device unavailable: {0}")]
    DeviceUnavailable(#[source] SourceError),
    /// The session was cancelled mid-sequence.
    #[error("session cancelled")]
    Cancelled,
    #[error(transparent)]
    Source(#[from] SourceError),
    #[error(transparent)]
    Capture(#[from] CaptureError),
    #[error(transparent)]
    Record(#[from] RecordError),
    #[error(transparent)]
    Compose(#[from] ComposeError),
}

impl From<Cancelled> for SessionError {
    fn from(_: Cancelled) -> Self {
        SessionError::Cancelled
    }
}

/// How a session run ended.
#[derive(Debug)]
pub enum SessionOutcome {
    /// All four poses captured and composited.
    Completed(SessionOutput),
    /// Cancelled mid-sequence; the controller unwound to idle.
    Cancelled,
    /// A session was already running or its result not yet collected.
    NotStarted,
}

/// Snapshot of session progress, published through a watch channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionProgress {
    /// Current phase.
    pub state: BoothState,
    /// Pose being worked on (0 outside the capture phase).
    pub pose_index: usize,
}

/// External pause/resume/cancel handle for a running session.
///
/// Cheap to clone and safe to use from any task or thread.
#[derive(Debug, Clone)]
pub struct SessionControls {
    flags: ControlFlags,
}

impl SessionControls {
    /// Freezes countdown progress. Effective only during the timed
    /// capture phase; other phases ignore it.
    pub fn pause(&self) {
        self.flags.pause();
    }

    /// Resumes a paused countdown from where it froze.
    pub fn resume(&self) {
        self.flags.resume();
    }

    /// Aborts the session; observed within one wait tick.
    pub fn cancel(&self) {
        self.flags.cancel();
    }

    /// True while paused.
    pub fn is_paused(&self) -> bool {
        self.flags.is_paused()
    }

    /// True once cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.flags.is_cancelled()
    }
}

/// Drives the booth sequence over a live source.
pub struct SessionController<S: LiveSource> {
    source: S,
    config: BoothConfig,
    flags: ControlFlags,
    state: BoothState,
    pose_index: usize,
    poses: Vec<Pose>,
    output: Option<SessionOutput>,
    progress: watch::Sender<SessionProgress>,
}

impl<S: LiveSource> SessionController<S> {
    /// Creates an idle controller over `source`.
    pub fn new(source: S, config: BoothConfig) -> Self {
        let (progress, _) = watch::channel(SessionProgress {
            state: BoothState::Idle,
            pose_index: 0,
        });
        Self {
            source,
            config,
            flags: ControlFlags::new(),
            state: BoothState::Idle,
            pose_index: 0,
            poses: Vec::new(),
            output: None,
            progress,
        }
    }

    /// Returns a pause/cancel handle valid for the next run.
    pub fn controls(&self) -> SessionControls {
        SessionControls {
            flags: self.flags.clone(),
        }
    }

    /// Subscribes to state transitions.
    pub fn watch_progress(&self) -> watch::Receiver<SessionProgress> {
        self.progress.subscribe()
    }

    /// Current phase.
    pub fn state(&self) -> BoothState {
        self.state
    }

    /// Pose currently being worked on (0 outside the capture phase).
    pub fn pose_index(&self) -> usize {
        self.pose_index
    }

    /// Poses captured so far in sequence order.
    pub fn poses(&self) -> &[Pose] {
        &self.poses
    }

    /// The delivered output of the last completed run.
    pub fn output(&self) -> Option<&SessionOutput> {
        self.output.as_ref()
    }

    /// Mutable access to the live source between runs.
    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }

    /// Clears the result of a delivered session, returning to idle.
    pub fn reset(&mut self) {
        self.poses.clear();
        self.output = None;
        self.flags.reset();
        self.set_state(BoothState::Idle, 0, &mut NoHooks);
    }

    /// Runs one full session with the given filter selection.
    ///
    /// The selection is fixed for the whole run. Returns
    /// [`SessionOutcome::NotStarted`] without touching anything when
    /// the controller is not idle; a failed device open likewise
    /// leaves all state unchanged.
    pub async fn run(
        &mut self,
        filter: FilterSpec,
        mirrored: bool,
        hooks: &mut impl BoothHooks,
    ) -> Result<SessionOutcome, SessionError> {
        if self.state != BoothState::Idle {
            tracing::warn!(state = ?self.state, "Session start refused, controller not idle");
            return Ok(SessionOutcome::NotStarted);
        }

        self.flags.reset();
        self.poses.clear();
        self.output = None;

        if let Err(e) = self.source.open() {
            tracing::error!(error = %e, "Live source unavailable");
            return Err(SessionError::DeviceUnavailable(e));
        }

        match self.run_sequence(filter, mirrored, hooks).await {
            Ok(output) => {
                self.output = Some(output.clone());
                Ok(SessionOutcome::Completed(output))
            }
            Err(SessionError::Cancelled) => {
                tracing::info!("Session cancelled");
                self.teardown(hooks);
                Ok(SessionOutcome::Cancelled)
            }
            Err(e) => {
                tracing::error!(error = %e, "Session failed");
                self.teardown(hooks);
                Err(e)
            }
        }
    }

    async fn run_sequence(
        &mut self,
        filter: FilterSpec,
        mirrored: bool,
        hooks: &mut impl BoothHooks,
    ) -> Result<SessionOutput, SessionError> {
        let timing = self.config.timing.clone();
        let tick = Duration::from_millis(timing.tick_ms);
        let flags = self.flags.clone();

        self.set_state(BoothState::Entering, 0, hooks);
        hooks.cue(AudioCue::CurtainOpen);
        cancellable_wait(Duration::from_millis(timing.entering_ms), &flags, tick).await?;

        self.set_state(BoothState::Ready, 0, hooks);
        let format = negotiate(&self.config.recording.format_preferences);

        for pose_index in 0..POSE_COUNT {
            self.set_state(BoothState::Countdown, pose_index, hooks);

            // Probe frame sizes the recorder and seeds its first frame.
            let mut recorder = SegmentRecorder::new(format, self.config.recording.fps);
            if format.is_some() {
                let probe = self.source.frame()?;
                recorder.begin(probe.width(), probe.height())?;
                recorder.push(&probe);
            }

            let countdown = Duration::from_secs(timing.countdown_secs as u64);
            let ticks_per_second = (1000 / timing.tick_ms.max(1)).max(1) as u32;
            let countdown_secs = timing.countdown_secs;
            let source = &mut self.source;
            controlled_wait_with(countdown, &flags, tick, |n| {
                match source.frame() {
                    Ok(frame) => recorder.push(&frame),
                    Err(e) => tracing::warn!(error = %e, "Frame read failed during countdown"),
                }
                if n % ticks_per_second == 0 {
                    hooks.countdown_tick(countdown_secs.saturating_sub(n / ticks_per_second));
                }
            })
            .await?;

            self.set_state(BoothState::Shutter, pose_index, hooks);
            hooks.flash(true);
            hooks.cue(AudioCue::Shutter);

            let segment: Option<VideoSegment> = recorder.finish()?;

            // The flash moment is the last interruption point before the
            // still is committed.
            if flags.is_cancelled() {
                return Err(SessionError::Cancelled);
            }
            let frame = self.source.frame()?;
            let still = capture_still(&frame, filter, mirrored, &self.config.still)?;
            self.poses.push(Pose::new(pose_index, still, segment));
            tracing::info!(pose = pose_index + 1, total = POSE_COUNT, "Pose captured");

            controlled_wait(Duration::from_millis(timing.flash_ms), &flags, tick).await?;
            hooks.flash(false);

            controlled_wait(Duration::from_millis(timing.settle_ms), &flags, tick).await?;
        }

        self.set_state(BoothState::Developing, 0, hooks);
        self.source.close();

        let stills: Vec<_> = self
            .poses
            .iter()
            .filter_map(|p| p.still().cloned())
            .collect();
        let caption = format!("PHOTOAUTOMAT // {}", chrono::Local::now().format("%m/%d/%Y"));
        let static_strip = compose_strip(&stills, &self.config.layout, &caption).await?;

        let segments: Vec<VideoSegment> = self
            .poses
            .iter()
            .filter_map(|p| p.segment().cloned())
            .collect();
        let animated_strip = match (format, segments.len()) {
            (Some(format), n) if n == POSE_COUNT => {
                let settings = AnimatedSettings {
                    fps: self.config.recording.animated_fps,
                    duration_ms: self.config.recording.animated_duration_ms,
                    format,
                };
                match compose_animated(
                    &segments,
                    filter,
                    mirrored,
                    &self.config.layout,
                    &settings,
                    &flags,
                )
                .await
                {
                    Ok(artifact) => Some(artifact),
                    Err(ComposeError::Cancelled) => return Err(SessionError::Cancelled),
                    Err(e) => {
                        // The static strip alone is still a delivery.
                        tracing::warn!(error = %e, "Animated strip unavailable");
                        None
                    }
                }
            }
            _ => {
                tracing::info!("No segments recorded, delivering static strip only");
                None
            }
        };

        cancellable_wait(Duration::from_millis(timing.develop_ms), &flags, tick).await?;
        hooks.cue(AudioCue::Print);
        self.set_state(BoothState::Result, 0, hooks);

        Ok(SessionOutput {
            static_strip,
            animated_strip,
        })
    }

    /// Unwinds a cancelled or failed session: device released, partial
    /// captures discarded, state back to idle.
    fn teardown(&mut self, hooks: &mut impl BoothHooks) {
        if self.source.is_open() {
            self.source.close();
        }
        // The unwind can land inside a flash window; make sure the
        // overlay is not left on.
        hooks.flash(false);
        self.poses.clear();
        self.output = None;
        self.set_state(BoothState::Idle, 0, hooks);
    }

    fn set_state(&mut self, state: BoothState, pose_index: usize, hooks: &mut impl BoothHooks) {
        self.state = state;
        self.pose_index = pose_index;
        let _ = self.progress.send(SessionProgress { state, pose_index });
        tracing::debug!(?state, pose_index, "Session state");
        hooks.state_changed(state, pose_index);
    }
}
