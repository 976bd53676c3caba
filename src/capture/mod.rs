//! Live frame acquisition and still capture.
//!
//! The camera device itself is owned by a collaborator; this module
//! defines the narrow seam it plugs into ([`LiveSource`]), the frame
//! type that crosses it, and the still-capture pipeline that turns one
//! live frame into a filtered, encoded photograph.

mod frame;
mod source;
mod still;

pub use frame::Frame;
pub use source::{LiveSource, SourceError, TestPatternSource};
pub use still::{capture_still, CaptureError, StillGeometry};

pub(crate) use still::cover_fit;
