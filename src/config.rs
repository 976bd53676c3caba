//! Booth configuration.
//!
//! Every timing, geometry, and recording knob in one serializable
//! tree. Defaults reproduce the reference booth; a TOML file can
//! override any section.

use crate::capture::StillGeometry;
use crate::compose::StripLayout;
use crate::record::{SegmentFormat, DEFAULT_FORMAT_PREFERENCES};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Phase timings for the session sequence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimingConfig {
    /// Curtain-open entry phase, milliseconds.
    pub entering_ms: u64,
    /// Countdown length before each capture, whole seconds.
    pub countdown_secs: u32,
    /// Flag-polling tick for all controlled waits, milliseconds.
    pub tick_ms: u64,
    /// Flash overlay duration at capture, milliseconds.
    pub flash_ms: u64,
    /// Settle gap between a capture and the next countdown, milliseconds.
    pub settle_ms: u64,
    /// Developing phase before results are delivered, milliseconds.
    pub develop_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            entering_ms: 1500,
            countdown_secs: 3,
            tick_ms: 50,
            flash_ms: 200,
            settle_ms: 1200,
            develop_ms: 3000,
        }
    }
}

/// Segment recording and animated-strip encoding settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordingConfig {
    /// Frames per second fed to the per-pose recorder. One frame is
    /// captured per wait tick, so this must equal `1000 / tick_ms` or
    /// the encoded segment's nominal frame delay would not match the
    /// actual capture rate.
    pub fps: u32,
    /// Render tick rate of the animated strip.
    pub animated_fps: u32,
    /// Fixed length of the animated strip, milliseconds.
    pub animated_duration_ms: u64,
    /// Container formats in preference order; the first supported one
    /// wins, and an empty or all-unsupported list disables recording.
    pub format_preferences: Vec<SegmentFormat>,
}

impl Default for RecordingConfig {
    fn default() -> Self {
        Self {
            fps: 20,
            animated_fps: 12,
            animated_duration_ms: 4000,
            format_preferences: DEFAULT_FORMAT_PREFERENCES.to_vec(),
        }
    }
}

/// Full booth configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct BoothConfig {
    /// Still output geometry.
    #[serde(default)]
    pub still: StillGeometry,
    /// Strip card layout.
    #[serde(default)]
    pub layout: StripLayout,
    /// Phase timings.
    #[serde(default)]
    pub timing: TimingConfig,
    /// Recording settings.
    #[serde(default)]
    pub recording: RecordingConfig,
}

impl BoothConfig {
    /// Loads and validates configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::FileReadError(e.to_string()))?;
        let config: BoothConfig =
            toml::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.still.width == 0
            || self.still.height == 0
            || self.layout.frame_width == 0
            || self.layout.frame_height == 0
        {
            return Err(ConfigError::InvalidDimensions);
        }
        if self.timing.countdown_secs == 0 {
            return Err(ConfigError::InvalidCountdown);
        }
        if self.timing.tick_ms == 0 {
            return Err(ConfigError::InvalidTick);
        }
        if self.recording.fps == 0
            || self.recording.fps > 120
            || self.recording.animated_fps == 0
            || self.recording.animated_fps > 120
        {
            return Err(ConfigError::InvalidFrameRate);
        }
        if self.recording.fps as u64 * self.timing.tick_ms != 1000 {
            return Err(ConfigError::MismatchedCaptureRate);
        }
        Ok(())
    }
}

/// Configuration validation errors.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid frame dimensions")]
    InvalidDimensions,
    #[error("countdown must be at least one second")]
    InvalidCountdown,
    #[error("wait tick must be nonzero")]
    InvalidTick,
    #[error("invalid frame rate (must be 1-120 fps)")]
    InvalidFrameRate,
    #[error("recording fps must equal 1000 / tick_ms (one frame per wait tick)")]
    MismatchedCaptureRate,
    #[error("failed to read config file: {0}")]
    FileReadError(String),
    #[error("failed to parse config file: {0}")]
    ParseError(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_valid() {
        let config = BoothConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.still.width, 480);
        assert_eq!(config.timing.countdown_secs, 3);
        assert_eq!(config.recording.animated_duration_ms, 4000);
    }

    #[test]
    fn test_fps_must_be_reciprocal_of_tick() {
        let mut config = BoothConfig::default();
        config.recording.fps = 30;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::MismatchedCaptureRate)
        ));

        // 25ms ticks pair with 40fps.
        config.timing.tick_ms = 25;
        config.recording.fps = 40;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_countdown_invalid() {
        let mut config = BoothConfig::default();
        config.timing.countdown_secs = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidCountdown)
        ));
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: BoothConfig = toml::from_str(
            r#"
            [timing]
            entering_ms = 500
            countdown_secs = 2
            tick_ms = 25
            flash_ms = 100
            settle_ms = 300
            develop_ms = 800
            "#,
        )
        .unwrap();
        assert_eq!(config.timing.countdown_secs, 2);
        assert_eq!(config.layout.frame_width, 480);
        assert_eq!(
            config.recording.format_preferences,
            DEFAULT_FORMAT_PREFERENCES.to_vec()
        );
    }
}
