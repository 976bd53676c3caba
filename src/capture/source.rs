//! Live source abstraction.
//!
//! The session core never acquires the camera device itself; a
//! collaborator owns the device lifecycle and exposes frames through
//! this trait. A deterministic test-pattern implementation backs the
//! test suite.

use super::Frame;
use thiserror::Error;

/// Errors that can occur at the live-source seam.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("live source device not found: {0}")]
    DeviceNotFound(String),
    #[error("failed to open live source: {0}")]
    OpenFailed(String),
    #[error("failed to read frame: {0}")]
    FrameFailed(String),
    #[error("live source not open")]
    NotOpen,
}

/// Trait for live video sources.
///
/// Implementations own the real device; the session controller only
/// reads frames on demand and closes the source when a session ends or
/// unwinds.
pub trait LiveSource {
    /// Opens the source and starts frame delivery.
    fn open(&mut self) -> Result<(), SourceError>;

    /// Reads the most recent frame.
    fn frame(&mut self) -> Result<Frame, SourceError>;

    /// Checks whether the source is currently delivering frames.
    fn is_open(&self) -> bool;

    /// Stops frame delivery and releases the device.
    fn close(&mut self);
}

/// Deterministic synthetic source for tests and demos.
///
/// Generates a horizontally asymmetric pattern (a bright vertical bar
/// in the left third over a diagonal gradient) that drifts with the
/// sequence number, so mirroring and motion are both observable.
#[derive(Debug)]
pub struct TestPatternSource {
    width: u32,
    height: u32,
    open: bool,
    sequence: u64,
}

impl TestPatternSource {
    /// Creates a source producing frames of the given size.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            open: false,
            sequence: 0,
        }
    }
}

impl LiveSource for TestPatternSource {
    fn open(&mut self) -> Result<(), SourceError> {
        if self.width == 0 || self.height == 0 {
            return Err(SourceError::OpenFailed("zero-sized pattern".into()));
        }
        self.open = true;
        self.sequence = 0;
        tracing::info!(width = self.width, height = self.height, "TestPatternSource opened");
        Ok(())
    }

    fn frame(&mut self) -> Result<Frame, SourceError> {
        if !self.open {
            return Err(SourceError::NotOpen);
        }

        let (w, h) = (self.width as usize, self.height as usize);
        let drift = (self.sequence * 3 % 256) as u8;
        let bar_start = w / 6;
        let bar_end = w / 3;

        let mut pixels = Vec::with_capacity(w * h * 3);
        for y in 0..h {
            for x in 0..w {
                let gradient = (((x + y) * 255) / (w + h)) as u8;
                let in_bar = x >= bar_start && x < bar_end;
                let base = if in_bar { 230 } else { gradient };
                pixels.push(base.wrapping_add(drift));
                pixels.push(base / 2);
                pixels.push(255 - base);
            }
        }

        self.sequence += 1;
        Ok(Frame::new(pixels, self.width, self.height, self.sequence))
    }

    fn is_open(&self) -> bool {
        self.open
    }

    fn close(&mut self) {
        self.open = false;
        tracing::info!("TestPatternSource closed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_lifecycle() {
        let mut source = TestPatternSource::new(32, 24);
        assert!(!source.is_open());

        source.open().unwrap();
        assert!(source.is_open());

        let frame = source.frame().unwrap();
        assert!(frame.is_valid());
        assert_eq!(frame.sequence(), 1);

        let frame2 = source.frame().unwrap();
        assert_eq!(frame2.sequence(), 2);

        source.close();
        assert!(!source.is_open());
    }

    #[test]
    fn test_frame_without_open() {
        let mut source = TestPatternSource::new(32, 24);
        assert!(matches!(source.frame(), Err(SourceError::NotOpen)));
    }

    #[test]
    fn test_pattern_is_asymmetric() {
        let mut source = TestPatternSource::new(60, 20);
        source.open().unwrap();
        let frame = source.frame().unwrap();
        let image = frame.to_rgb_image().unwrap();

        // The bright bar lives in the left third only.
        let left = image.get_pixel(15, 10)[0];
        let right = image.get_pixel(45, 10)[0];
        assert_ne!(left, right);
    }
}
