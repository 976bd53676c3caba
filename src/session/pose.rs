//! Per-pose capture products and the session's final output.

use crate::artifact::Artifact;
use crate::record::VideoSegment;

/// One pose's captured products.
///
/// The still is always produced for a completed pose; the segment is
/// absent when no recording format could be negotiated.
#[derive(Debug, Clone)]
pub struct Pose {
    index: usize,
    still: Option<Artifact>,
    segment: Option<VideoSegment>,
}

impl Pose {
    pub(crate) fn new(index: usize, still: Artifact, segment: Option<VideoSegment>) -> Self {
        Self {
            index,
            still: Some(still),
            segment,
        }
    }

    /// Zero-based position in the strip, top to bottom.
    pub fn index(&self) -> usize {
        self.index
    }

    /// The baked, encoded still.
    pub fn still(&self) -> Option<&Artifact> {
        self.still.as_ref()
    }

    /// The recorded segment, if recording was available.
    pub fn segment(&self) -> Option<&VideoSegment> {
        self.segment.as_ref()
    }

    /// True once the still exists.
    pub fn is_complete(&self) -> bool {
        self.still.is_some()
    }
}

/// The artifacts a completed session delivers.
#[derive(Debug, Clone)]
pub struct SessionOutput {
    /// The static four-frame strip.
    pub static_strip: Artifact,
    /// The animated strip, absent when segment recording or animated
    /// encoding was unavailable.
    pub animated_strip: Option<Artifact>,
}
