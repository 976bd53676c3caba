//! Composite rendering: the static strip and the animated strip.
//!
//! Both compositors follow a join-then-render pattern: every input is
//! fully decoded before the single render pass (or the first render
//! tick) starts. Neither mutates session state; they take inputs and
//! return encoded artifacts.

mod animated;
mod caption;
mod strip;

pub use animated::{compose_animated, AnimatedSettings};
pub use strip::{compose_strip, StripLayout};

use image::{Rgb, RgbImage};
use thiserror::Error;

/// Errors that can occur while compositing.
#[derive(Debug, Error)]
pub enum ComposeError {
    #[error("compositing needs {need} inputs, got {have}")]
    Incomplete { have: usize, need: usize },
    #[error("failed to decode compositor input: {0}")]
    Decode(String),
    #[error("failed to encode composite: {0}")]
    Encode(String),
    #[error("compositing cancelled")]
    Cancelled,
    #[error(transparent)]
    Record(#[from] crate::record::RecordError),
}

/// Strokes a 1px rectangle outline.
pub(crate) fn stroke_rect(
    image: &mut RgbImage,
    x: u32,
    y: u32,
    width: u32,
    height: u32,
    color: Rgb<u8>,
) {
    if width == 0 || height == 0 {
        return;
    }
    for dx in 0..width {
        put_clipped(image, x + dx, y, color);
        put_clipped(image, x + dx, y + height - 1, color);
    }
    for dy in 0..height {
        put_clipped(image, x, y + dy, color);
        put_clipped(image, x + width - 1, y + dy, color);
    }
}

fn put_clipped(image: &mut RgbImage, x: u32, y: u32, color: Rgb<u8>) {
    if x < image.width() && y < image.height() {
        image.put_pixel(x, y, color);
    }
}
