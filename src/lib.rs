//! Photoautomat Session Library
//!
//! An analog-style photo booth core: a timed four-pose capture
//! session over a live video source, per-pose filtered stills and
//! short video segments, and two composite deliverables (a static
//! photo strip and an animated strip).
//!
//! # Architecture
//!
//! The system follows an explicit data flow:
//!
//! ```text
//! capture ──→ filter ──→ session ──→ compose
//!    ↓                      ↓            ↓
//! record ───────────────── poses ──→ artifacts
//! ```
//!
//! # Design Principles
//!
//! - **Filters are baked**: still pixels carry the selected filter
//!   permanently; previews use the same math minus the grain pass
//! - **Waits are interruptible**: every timed phase polls pause and
//!   cancel flags at tick granularity, and paused time is never counted
//! - **Degrade, don't fail**: a missing segment encoder costs the
//!   animated strip, never the session
//!
//! # Example
//!
//! ```no_run
//! use photoautomat::{
//!     capture::TestPatternSource,
//!     config::BoothConfig,
//!     filter::FilterSpec,
//!     session::{NoHooks, SessionController, SessionOutcome},
//! };
//!
//! # async fn demo() -> Result<(), photoautomat::session::SessionError> {
//! let source = TestPatternSource::new(640, 480);
//! let mut controller = SessionController::new(source, BoothConfig::default());
//!
//! let controls = controller.controls();
//! // controls.pause() / controls.resume() / controls.cancel() from anywhere
//!
//! let outcome = controller
//!     .run(FilterSpec::BerlinBw, true, &mut NoHooks)
//!     .await?;
//!
//! if let SessionOutcome::Completed(output) = outcome {
//!     std::fs::write(output.static_strip.suggested_filename("photoautomat-strip"),
//!         output.static_strip.bytes()).ok();
//! }
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]
#![deny(unsafe_code)]

pub mod artifact;
pub mod capture;
pub mod compose;
pub mod config;
pub mod filter;
pub mod record;
pub mod session;

// Re-export commonly used types at crate root
pub use artifact::Artifact;
pub use capture::{Frame, LiveSource, TestPatternSource};
pub use config::BoothConfig;
pub use filter::FilterSpec;
pub use record::{SegmentFormat, VideoSegment};
pub use session::{BoothState, SessionController, SessionOutcome, SessionOutput};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Number of poses in one session and frames in one strip.
pub const POSE_COUNT: usize = 4;
