//! Exact per-pixel color transforms.
//!
//! These are the baked transforms that end up in exported rasters, so
//! the constants here are load-bearing: they define what a downloaded
//! still looks like regardless of how the live preview approximated it.
//!
//! Luma uses the BT.709 weights (0.2126 R, 0.7152 G, 0.0722 B).

use super::FilterSpec;
use image::RgbImage;
use rand::Rng;

/// Uniform grain amplitude in 8-bit channel units (±).
pub const GRAIN_AMPLITUDE: f32 = 12.0;

#[inline]
fn luma(r: f32, g: f32, b: f32) -> f32 {
    0.2126 * r + 0.7152 * g + 0.0722 * b
}

#[inline]
fn contrast(value: f32, scale: f32) -> f32 {
    (value - 128.0) * scale + 128.0
}

/// The color transform for one pixel, before grain and clamping.
///
/// Channel values are in 8-bit range but unclamped; the caller clamps
/// once after grain so intermediate overshoot survives into the grain
/// stage exactly like the documented formulas.
pub(super) fn transform(filter: FilterSpec, r: f32, g: f32, b: f32) -> (f32, f32, f32) {
    match filter {
        FilterSpec::Natural => (
            contrast(r, 1.05),
            contrast(g, 1.05),
            contrast(b, 1.05),
        ),

        FilterSpec::FujiStyle => {
            let lum = luma(r, g, b);
            let (mut r, g, b) = if lum < 100.0 {
                // Cooler shadows
                (r * 0.92, g * 1.02, b * 1.08)
            } else if lum > 160.0 {
                // Warmer highlights
                (r * 1.10, g * 1.02, b * 0.90)
            } else {
                (r, g, b)
            };
            r = contrast(r, 1.1);
            (r, g, b)
        }

        FilterSpec::BerlinBw => {
            let gray = contrast(luma(r, g, b), 1.8) + 20.0;
            (gray, gray, gray)
        }

        FilterSpec::Sepia => (
            (r * 0.393 + g * 0.769 + b * 0.189).min(255.0),
            (r * 0.349 + g * 0.686 + b * 0.168).min(255.0),
            (r * 0.272 + g * 0.534 + b * 0.131).min(255.0),
        ),

        FilterSpec::Cyanotype => {
            let gray = luma(r, g, b);
            (
                contrast(gray * 0.2, 1.4),
                contrast(gray * 0.5, 1.4),
                contrast(gray * 0.9, 1.4),
            )
        }

        FilterSpec::AnalogColor => {
            let gray = luma(r, g, b);
            (
                r * 0.6 + gray * 0.4 + 10.0,
                g * 0.6 + gray * 0.4,
                b * 0.5 + gray * 0.5 - 10.0,
            )
        }
    }
}

/// Applies the transform to every pixel, adding per-channel grain when
/// an rng is supplied, and clamps to [0, 255].
pub(super) fn apply<R: Rng>(image: &mut RgbImage, filter: FilterSpec, mut rng: Option<&mut R>) {
    for pixel in image.pixels_mut() {
        let (r, g, b) = transform(
            filter,
            pixel[0] as f32,
            pixel[1] as f32,
            pixel[2] as f32,
        );

        let (r, g, b) = match rng.as_deref_mut() {
            Some(rng) => (
                r + rng.random_range(-GRAIN_AMPLITUDE..=GRAIN_AMPLITUDE),
                g + rng.random_range(-GRAIN_AMPLITUDE..=GRAIN_AMPLITUDE),
                b + rng.random_range(-GRAIN_AMPLITUDE..=GRAIN_AMPLITUDE),
            ),
            None => (r, g, b),
        };

        pixel[0] = r.clamp(0.0, 255.0) as u8;
        pixel[1] = g.clamp(0.0, 255.0) as u8;
        pixel[2] = b.clamp(0.0, 255.0) as u8;
    }
}
