//! Bounded segment recording.
//!
//! One [`SegmentRecorder`] covers exactly one pose's countdown window
//! (or the animated compositor's render window). Frames are pushed at
//! controlled-wait tick boundaries, so paused wall-clock time never
//! lands inside a segment. The container format is negotiated from a
//! preference list against what this build can actually encode,
//! mirroring how a runtime would walk its supported codec list.

use crate::artifact::Artifact;
use crate::capture::Frame;
use image::codecs::gif::{GifDecoder, GifEncoder, Repeat};
use image::{imageops, AnimationDecoder, Delay, DynamicImage, RgbImage};
use serde::{Deserialize, Serialize};
use std::io::Cursor;
use thiserror::Error;

/// Errors that can occur during segment recording.
#[derive(Debug, Error)]
pub enum RecordError {
    #[error("no supported segment format in this build")]
    Unsupported,
    #[error("recording already in progress")]
    AlreadyRecording,
    #[error("failed to encode segment: {0}")]
    EncodeFailed(String),
    #[error("failed to decode segment: {0}")]
    DecodeFailed(String),
}

/// Candidate container formats for video segments.
///
/// The set is closed and every encoder/decoder site matches
/// exhaustively. `Webm` and `Mp4` are negotiation candidates with no
/// in-tree encoder; negotiation skips them, and a preference list
/// containing only them exercises the image-only degradation path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SegmentFormat {
    /// Animated GIF, encoded and decoded in-process.
    Gif,
    /// VP8/VP9 in WebM; requires an external encoder not present here.
    Webm,
    /// H.264 in MP4; requires an external encoder not present here.
    Mp4,
}

impl SegmentFormat {
    /// Whether this build carries an encoder for the format.
    pub fn is_supported(self) -> bool {
        matches!(self, SegmentFormat::Gif)
    }

    /// MIME type tag for the container.
    pub fn mime(self) -> &'static str {
        match self {
            SegmentFormat::Gif => "image/gif",
            SegmentFormat::Webm => "video/webm",
            SegmentFormat::Mp4 => "video/mp4",
        }
    }

    /// File extension matching the MIME type.
    pub fn extension(self) -> &'static str {
        match self {
            SegmentFormat::Gif => "gif",
            SegmentFormat::Webm => "webm",
            SegmentFormat::Mp4 => "mp4",
        }
    }
}

/// Default preference order: the externally encoded containers first,
/// then the in-process fallback.
pub const DEFAULT_FORMAT_PREFERENCES: [SegmentFormat; 3] = [
    SegmentFormat::Webm,
    SegmentFormat::Mp4,
    SegmentFormat::Gif,
];

/// Picks the first supported format from a preference list.
///
/// Returns `None` when nothing in the list can be encoded; the session
/// then degrades to stills-only.
pub fn negotiate(preferences: &[SegmentFormat]) -> Option<SegmentFormat> {
    let chosen = preferences.iter().copied().find(|f| f.is_supported());
    match chosen {
        Some(format) => tracing::debug!(?format, "Negotiated segment format"),
        None => tracing::warn!(?preferences, "No supported segment format"),
    }
    chosen
}

/// One self-contained, independently decodable recording.
#[derive(Clone)]
pub struct VideoSegment {
    bytes: Vec<u8>,
    format: SegmentFormat,
    frame_count: usize,
    fps: u32,
}

impl VideoSegment {
    /// Returns the encoded container bytes.
    #[inline]
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Returns the container format.
    #[inline]
    pub fn format(&self) -> SegmentFormat {
        self.format
    }

    /// Returns the number of recorded frames.
    #[inline]
    pub fn frame_count(&self) -> usize {
        self.frame_count
    }

    /// Returns the nominal frame rate.
    #[inline]
    pub fn fps(&self) -> u32 {
        self.fps
    }

    /// Decodes the segment back into RGB frames.
    pub fn decode_frames(&self) -> Result<Vec<RgbImage>, RecordError> {
        match self.format {
            SegmentFormat::Gif => {
                let decoder = GifDecoder::new(Cursor::new(&self.bytes))
                    .map_err(|e| RecordError::DecodeFailed(e.to_string()))?;
                let frames = decoder
                    .into_frames()
                    .collect_frames()
                    .map_err(|e| RecordError::DecodeFailed(e.to_string()))?;
                Ok(frames
                    .into_iter()
                    .map(|f| DynamicImage::ImageRgba8(f.into_buffer()).into_rgb8())
                    .collect())
            }
            SegmentFormat::Webm | SegmentFormat::Mp4 => Err(RecordError::Unsupported),
        }
    }

    /// Wraps the segment bytes as a deliverable artifact.
    pub fn into_artifact(self) -> Artifact {
        Artifact::new(self.bytes, self.format.mime(), self.format.extension())
    }
}

impl std::fmt::Debug for VideoSegment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VideoSegment")
            .field("format", &self.format)
            .field("frames", &self.frame_count)
            .field("bytes", &self.bytes.len())
            .finish()
    }
}

/// Records a bounded window of live frames into one segment.
pub struct SegmentRecorder {
    format: Option<SegmentFormat>,
    fps: u32,
    active: Option<Recording>,
}

struct Recording {
    width: u32,
    height: u32,
    frames: Vec<RgbImage>,
    budget: Option<usize>,
}

impl SegmentRecorder {
    /// Creates a recorder for the negotiated format.
    ///
    /// `format` is `None` when negotiation failed; `begin` then reports
    /// `Unsupported` and the caller degrades to stills-only.
    pub fn new(format: Option<SegmentFormat>, fps: u32) -> Self {
        Self {
            format,
            fps,
            active: None,
        }
    }

    /// Starts an unbounded recording; the session stops it at shutter.
    pub fn begin(&mut self, width: u32, height: u32) -> Result<(), RecordError> {
        self.begin_inner(width, height, None)
    }

    /// Starts a recording that deactivates after `max_frames` pushes.
    ///
    /// The animated render loop keys its termination off this budget so
    /// recorded duration and rendered content cannot drift.
    pub fn begin_bounded(
        &mut self,
        width: u32,
        height: u32,
        max_frames: usize,
    ) -> Result<(), RecordError> {
        self.begin_inner(width, height, Some(max_frames))
    }

    fn begin_inner(
        &mut self,
        width: u32,
        height: u32,
        budget: Option<usize>,
    ) -> Result<(), RecordError> {
        if self.format.is_none() {
            return Err(RecordError::Unsupported);
        }
        if self.active.is_some() {
            return Err(RecordError::AlreadyRecording);
        }
        self.active = Some(Recording {
            width,
            height,
            frames: Vec::new(),
            budget,
        });
        tracing::debug!(width, height, ?budget, "Segment recording started");
        Ok(())
    }

    /// True while a recording is open and under budget.
    pub fn is_active(&self) -> bool {
        match &self.active {
            Some(rec) => rec.budget.map_or(true, |b| rec.frames.len() < b),
            None => false,
        }
    }

    /// Appends one frame; silently dropped when the recorder is
    /// inactive or over budget (the wait loop does not special-case
    /// recording boundaries).
    pub fn push(&mut self, frame: &Frame) {
        let Some(rec) = self.active.as_mut() else {
            return;
        };
        if rec.budget.is_some_and(|b| rec.frames.len() >= b) {
            return;
        }

        let Some(image) = frame.to_rgb_image() else {
            tracing::warn!(sequence = frame.sequence(), "Dropping invalid frame");
            return;
        };
        let image = if image.width() == rec.width && image.height() == rec.height {
            image
        } else {
            imageops::resize(&image, rec.width, rec.height, imageops::FilterType::Triangle)
        };
        rec.frames.push(image);
    }

    /// Stops the recording and encodes the segment.
    ///
    /// A no-op returning `Ok(None)` when no recording is active, and
    /// also when the window closed before any frame arrived.
    pub fn finish(&mut self) -> Result<Option<VideoSegment>, RecordError> {
        let Some(rec) = self.active.take() else {
            return Ok(None);
        };
        if rec.frames.is_empty() {
            tracing::warn!("Recording window closed with no frames");
            return Ok(None);
        }
        let format = self.format.ok_or(RecordError::Unsupported)?;

        let frame_count = rec.frames.len();
        let bytes = match format {
            SegmentFormat::Gif => encode_gif(rec.frames, self.fps)?,
            SegmentFormat::Webm | SegmentFormat::Mp4 => return Err(RecordError::Unsupported),
        };

        tracing::debug!(?format, frame_count, bytes = bytes.len(), "Segment encoded");
        Ok(Some(VideoSegment {
            bytes,
            format,
            frame_count,
            fps: self.fps,
        }))
    }
}

fn encode_gif(frames: Vec<RgbImage>, fps: u32) -> Result<Vec<u8>, RecordError> {
    let mut bytes = Vec::new();
    {
        let mut encoder = GifEncoder::new_with_speed(&mut bytes, 10);
        encoder
            .set_repeat(Repeat::Infinite)
            .map_err(|e| RecordError::EncodeFailed(e.to_string()))?;
        let delay = Delay::from_numer_denom_ms(1000, fps.max(1));
        for rgb in frames {
            let rgba = DynamicImage::ImageRgb8(rgb).into_rgba8();
            encoder
                .encode_frame(image::Frame::from_parts(rgba, 0, 0, delay))
                .map_err(|e| RecordError::EncodeFailed(e.to_string()))?;
        }
    }
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::{LiveSource, TestPatternSource};

    fn frames(source: &mut TestPatternSource, n: usize) -> Vec<Frame> {
        (0..n).map(|_| source.frame().unwrap()).collect()
    }

    #[test]
    fn test_negotiate_skips_unencodable_formats() {
        assert_eq!(
            negotiate(&DEFAULT_FORMAT_PREFERENCES),
            Some(SegmentFormat::Gif)
        );
        assert_eq!(negotiate(&[SegmentFormat::Webm, SegmentFormat::Mp4]), None);
        assert_eq!(negotiate(&[]), None);
    }

    #[test]
    fn test_record_round_trip() {
        let mut source = TestPatternSource::new(64, 48);
        source.open().unwrap();

        let mut recorder = SegmentRecorder::new(Some(SegmentFormat::Gif), 10);
        recorder.begin(64, 48).unwrap();
        for frame in frames(&mut source, 5) {
            recorder.push(&frame);
        }
        let segment = recorder.finish().unwrap().unwrap();

        assert_eq!(segment.frame_count(), 5);
        assert_eq!(segment.format(), SegmentFormat::Gif);

        let decoded = segment.decode_frames().unwrap();
        assert_eq!(decoded.len(), 5);
        assert_eq!(decoded[0].width(), 64);
        assert_eq!(decoded[0].height(), 48);
    }

    #[test]
    fn test_finish_without_begin_is_noop() {
        let mut recorder = SegmentRecorder::new(Some(SegmentFormat::Gif), 10);
        assert!(recorder.finish().unwrap().is_none());
    }

    #[test]
    fn test_unsupported_format_refuses_begin() {
        let mut recorder = SegmentRecorder::new(None, 10);
        assert!(matches!(
            recorder.begin(64, 48),
            Err(RecordError::Unsupported)
        ));
    }

    #[test]
    fn test_bounded_recording_deactivates_at_budget() {
        let mut source = TestPatternSource::new(32, 24);
        source.open().unwrap();

        let mut recorder = SegmentRecorder::new(Some(SegmentFormat::Gif), 10);
        recorder.begin_bounded(32, 24, 3).unwrap();

        for frame in frames(&mut source, 5) {
            recorder.push(&frame);
        }
        assert!(!recorder.is_active());

        let segment = recorder.finish().unwrap().unwrap();
        assert_eq!(segment.frame_count(), 3);
    }

    #[test]
    fn test_double_begin_rejected() {
        let mut recorder = SegmentRecorder::new(Some(SegmentFormat::Gif), 10);
        recorder.begin(32, 24).unwrap();
        assert!(matches!(
            recorder.begin(32, 24),
            Err(RecordError::AlreadyRecording)
        ));
    }
}
