//! Filter palette and pixel transforms.
//!
//! Each filter has two faces: a preview declaration for live display
//! (a compositing-engine filter string, best-effort) and an exact
//! per-pixel transform that gets baked into exported rasters. Only the
//! baked transform is a compatibility contract; the preview merely has
//! to look similar.

mod pixel;

pub use pixel::GRAIN_AMPLITUDE;

use image::RgbImage;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// The fixed filter palette.
///
/// The set is closed: every consumer matches exhaustively, so adding a
/// filter means adding one variant plus its two transforms here and
/// nothing else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterSpec {
    /// Near-identity with a mild contrast boost.
    Natural,
    /// Tri-tonal split: cool shadows, warm highlights.
    FujiStyle,
    /// High-contrast grayscale with a slight brightness lift.
    BerlinBw,
    /// Classic fixed-matrix sepia.
    Sepia,
    /// Desaturated blue-dominant remap.
    Cyanotype,
    /// Partial desaturation with a warm bias.
    AnalogColor,
}

impl FilterSpec {
    /// All filters in display order.
    pub fn all() -> [FilterSpec; 6] {
        [
            FilterSpec::Natural,
            FilterSpec::FujiStyle,
            FilterSpec::BerlinBw,
            FilterSpec::Sepia,
            FilterSpec::Cyanotype,
            FilterSpec::AnalogColor,
        ]
    }

    /// Human-readable label for selection UIs.
    pub fn label(self) -> &'static str {
        match self {
            FilterSpec::Natural => "Natural",
            FilterSpec::FujiStyle => "Fuji Style",
            FilterSpec::BerlinBw => "Berlin B&W",
            FilterSpec::Sepia => "Sepia",
            FilterSpec::Cyanotype => "Cyanotype",
            FilterSpec::AnalogColor => "Analog",
        }
    }

    /// Compositing-engine filter declaration for the live preview.
    ///
    /// This is handed to the display collaborator verbatim; it does not
    /// bit-match the baked transform and is not required to.
    pub fn preview_declaration(self) -> &'static str {
        match self {
            FilterSpec::Natural => "contrast(1.05) brightness(1.02) saturate(1.1)",
            FilterSpec::FujiStyle => "brightness(1.05) contrast(1.1) saturate(0.85) sepia(0.05)",
            FilterSpec::BerlinBw => "grayscale(1) contrast(1.8) brightness(1.1)",
            FilterSpec::Sepia => "sepia(1) contrast(1.2) brightness(0.95)",
            FilterSpec::Cyanotype => {
                "grayscale(1) sepia(0.5) hue-rotate(180deg) brightness(1.1) contrast(1.4)"
            }
            FilterSpec::AnalogColor => {
                "saturate(0.6) sepia(0.2) hue-rotate(-10deg) contrast(1.1) brightness(1.1)"
            }
        }
    }

    /// Applies the exact pixel transform plus film grain in place.
    ///
    /// This is what exported stills carry; it must stay stable across
    /// releases so downloaded images match documented behavior.
    pub fn apply_baked(self, image: &mut RgbImage, rng: &mut impl Rng) {
        pixel::apply(image, self, Some(rng));
    }

    /// Applies the color transform without grain.
    ///
    /// Used by the animated compositor, where the audience-facing
    /// artifact is re-encoded and an approximation of the live preview
    /// is acceptable.
    pub fn apply_preview(self, image: &mut RgbImage) {
        pixel::apply::<rand::rngs::ThreadRng>(image, self, None);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_palette_is_six_filters() {
        assert_eq!(FilterSpec::all().len(), 6);
    }

    #[test]
    fn test_labels_are_unique() {
        let labels: std::collections::HashSet<_> =
            FilterSpec::all().iter().map(|f| f.label()).collect();
        assert_eq!(labels.len(), 6);
    }

    #[test]
    fn test_serde_round_trip() {
        // Bare enums are not TOML documents; wrap in a table.
        for filter in FilterSpec::all() {
            let table = std::collections::BTreeMap::from([("filter", filter)]);
            let text = toml::to_string(&table).unwrap();
            let back: std::collections::BTreeMap<String, FilterSpec> =
                toml::from_str(&text).unwrap();
            assert_eq!(back["filter"], filter);
        }
    }
}
