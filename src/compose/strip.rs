//! Static strip composition.
//!
//! Four stills stacked vertically on a paper-white card with a caption
//! band at the bottom, finished with a faint stochastic paper grain.

use super::{caption, stroke_rect, ComposeError};
use crate::artifact::Artifact;
use crate::POSE_COUNT;
use image::{imageops, ImageFormat, Rgb, RgbImage};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::io::Cursor;

/// Paper background.
const BACKGROUND: Rgb<u8> = Rgb([253, 253, 253]);
/// Frame outline.
const OUTLINE: Rgb<u8> = Rgb([34, 34, 34]);
/// Caption ink.
const CAPTION_INK: Rgb<u8> = Rgb([136, 136, 136]);
/// Paper grain blend opacity.
const GRAIN_OPACITY: f32 = 0.03;
/// Paper grain dot count.
const GRAIN_DOTS: u32 = 15_000;
/// Caption baseline offset from the bottom edge.
const CAPTION_RISE: u32 = 40;
/// Caption glyph scale (5x7 cells at 2x approximate a 16px line).
const CAPTION_SCALE: u32 = 2;

/// Layout constants for the strip card.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct StripLayout {
    /// Width of one photo slot.
    pub frame_width: u32,
    /// Height of one photo slot.
    pub frame_height: u32,
    /// Outer margin on the top and sides.
    pub margin: u32,
    /// Vertical spacing between slots.
    pub spacing: u32,
    /// Caption band height below the last slot.
    pub caption_band: u32,
}

impl Default for StripLayout {
    fn default() -> Self {
        Self {
            frame_width: 480,
            frame_height: 360,
            margin: 30,
            spacing: 15,
            caption_band: 120,
        }
    }
}

impl StripLayout {
    /// Canvas width: one slot plus side margins.
    pub fn canvas_width(&self) -> u32 {
        self.frame_width + 2 * self.margin
    }

    /// Canvas height: four slots, three gaps, top margin, caption band.
    pub fn canvas_height(&self) -> u32 {
        self.frame_height * POSE_COUNT as u32
            + self.spacing * (POSE_COUNT as u32 - 1)
            + self.margin
            + self.caption_band
    }

    /// Top-left corner of slot `index`.
    pub fn slot_origin(&self, index: usize) -> (u32, u32) {
        (
            self.margin,
            self.margin + index as u32 * (self.frame_height + self.spacing),
        )
    }
}

/// Composes the four stills into one static strip.
///
/// Decodes all inputs in parallel and joins before the single draw
/// pass. Returns a PNG artifact.
pub async fn compose_strip(
    stills: &[Artifact],
    layout: &StripLayout,
    caption_text: &str,
) -> Result<Artifact, ComposeError> {
    if stills.len() != POSE_COUNT {
        return Err(ComposeError::Incomplete {
            have: stills.len(),
            need: POSE_COUNT,
        });
    }

    // Parallel decode, join, then one draw pass.
    let tasks = stills.iter().map(|still| {
        let bytes = still.bytes().to_vec();
        tokio::task::spawn_blocking(move || {
            image::load_from_memory(&bytes)
                .map(|decoded| decoded.into_rgb8())
                .map_err(|e| ComposeError::Decode(e.to_string()))
        })
    });
    let joined = futures::future::try_join_all(tasks)
        .await
        .map_err(|e| ComposeError::Decode(e.to_string()))?;
    let decoded: Vec<RgbImage> = joined.into_iter().collect::<Result<_, _>>()?;

    let mut canvas = RgbImage::from_pixel(layout.canvas_width(), layout.canvas_height(), BACKGROUND);

    for (index, still) in decoded.iter().enumerate() {
        let (x, y) = layout.slot_origin(index);
        let fitted = if still.width() == layout.frame_width && still.height() == layout.frame_height
        {
            still.clone()
        } else {
            imageops::resize(
                still,
                layout.frame_width,
                layout.frame_height,
                imageops::FilterType::Triangle,
            )
        };
        imageops::replace(&mut canvas, &fitted, x as i64, y as i64);
        stroke_rect(
            &mut canvas,
            x,
            y,
            layout.frame_width,
            layout.frame_height,
            OUTLINE,
        );
    }

    apply_paper_grain(&mut canvas);

    let caption_y = layout
        .canvas_height()
        .saturating_sub(CAPTION_RISE + caption::GLYPH_HEIGHT * CAPTION_SCALE);
    let caption_x = layout
        .canvas_width()
        .saturating_sub(caption::text_width(caption_text, CAPTION_SCALE))
        / 2;
    caption::stamp(
        &mut canvas,
        caption_text,
        caption_x,
        caption_y,
        CAPTION_SCALE,
        CAPTION_INK,
    );

    let mut bytes = Vec::new();
    canvas
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .map_err(|e| ComposeError::Encode(e.to_string()))?;

    tracing::debug!(
        width = layout.canvas_width(),
        height = layout.canvas_height(),
        bytes = bytes.len(),
        "Static strip composed"
    );

    Ok(Artifact::new(bytes, "image/png", "png"))
}

/// Scatters tiny light/dark dots across the canvas at low opacity.
fn apply_paper_grain(canvas: &mut RgbImage) {
    let mut rng = rand::rng();
    let (w, h) = (canvas.width(), canvas.height());
    for _ in 0..GRAIN_DOTS {
        let x = rng.random_range(0..w);
        let y = rng.random_range(0..h);
        let dot: f32 = if rng.random_bool(0.5) { 0.0 } else { 255.0 };
        let pixel = canvas.get_pixel_mut(x, y);
        for channel in pixel.0.iter_mut() {
            let blended = *channel as f32 * (1.0 - GRAIN_OPACITY) + dot * GRAIN_OPACITY;
            *channel = blended.round() as u8;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::{capture_still, LiveSource, StillGeometry, TestPatternSource};
    use crate::filter::FilterSpec;

    fn small_layout() -> StripLayout {
        StripLayout {
            frame_width: 64,
            frame_height: 48,
            margin: 8,
            spacing: 4,
            caption_band: 60,
        }
    }

    fn four_stills(width: u32, height: u32) -> Vec<Artifact> {
        let mut source = TestPatternSource::new(width * 2, height * 2);
        source.open().unwrap();
        let geometry = StillGeometry { width, height };
        (0..POSE_COUNT)
            .map(|_| {
                let frame = source.frame().unwrap();
                capture_still(&frame, FilterSpec::Natural, false, &geometry).unwrap()
            })
            .collect()
    }

    #[tokio::test]
    async fn test_strip_dimension_formula() {
        let layout = small_layout();
        let stills = four_stills(layout.frame_width, layout.frame_height);

        let strip = compose_strip(&stills, &layout, "PHOTOAUTOMAT // 01/01/2026")
            .await
            .unwrap();
        assert_eq!(strip.mime(), "image/png");

        let decoded = image::load_from_memory(strip.bytes()).unwrap();
        assert_eq!(decoded.width(), layout.frame_width + 2 * layout.margin);
        assert_eq!(
            decoded.height(),
            4 * layout.frame_height + 3 * layout.spacing + layout.margin + layout.caption_band
        );
    }

    #[tokio::test]
    async fn test_identical_stills_identical_layout() {
        // Four copies of the same still: layout is purely positional, so
        // output dimensions must match the formula regardless of content.
        let layout = small_layout();
        let stills = four_stills(layout.frame_width, layout.frame_height);
        let same: Vec<Artifact> = vec![stills[0].clone(); POSE_COUNT];

        let strip = compose_strip(&same, &layout, "PHOTOAUTOMAT // TEST")
            .await
            .unwrap();
        let decoded = image::load_from_memory(strip.bytes()).unwrap();
        assert_eq!(decoded.width(), layout.canvas_width());
        assert_eq!(decoded.height(), layout.canvas_height());
    }

    #[tokio::test]
    async fn test_fewer_than_four_rejected() {
        let layout = small_layout();
        let stills = four_stills(layout.frame_width, layout.frame_height);

        let result = compose_strip(&stills[..3], &layout, "X").await;
        assert!(matches!(
            result,
            Err(ComposeError::Incomplete { have: 3, need: 4 })
        ));
    }

    #[tokio::test]
    async fn test_undecodable_still_rejected() {
        let layout = small_layout();
        let junk = vec![Artifact::new(vec![0u8; 16], "image/jpeg", "jpg"); POSE_COUNT];

        let result = compose_strip(&junk, &layout, "X").await;
        assert!(matches!(result, Err(ComposeError::Decode(_))));
    }
}
