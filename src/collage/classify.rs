//! Image classification.
//!
//! Each image falls into exactly one [`Bucket`]. The rule table below is
//! evaluated top to bottom and the first matching predicate wins, so the
//! table order is the tie-break priority.

use serde::Serialize;

use super::ImageRef;
use crate::config::Thresholds;

/// Layout bucket of an image within its section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Bucket {
    VerticalDji,
    FullWidth,
    LandscapeDji,
    Panoramic,
    Other,
}

impl Bucket {
    pub const COUNT: usize = 5;

    /// The order in which buckets are laid out on the page.
    pub const EMIT_ORDER: [Bucket; Bucket::COUNT] = [
        Bucket::VerticalDji,
        Bucket::FullWidth,
        Bucket::Panoramic,
        Bucket::LandscapeDji,
        Bucket::Other,
    ];

    pub(crate) fn index(self) -> usize {
        match self {
            Bucket::VerticalDji => 0,
            Bucket::FullWidth => 1,
            Bucket::LandscapeDji => 2,
            Bucket::Panoramic => 3,
            Bucket::Other => 4,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Bucket::VerticalDji => "vertical DJI",
            Bucket::FullWidth => "full-width",
            Bucket::LandscapeDji => "landscape DJI",
            Bucket::Panoramic => "panoramic",
            Bucket::Other => "other",
        }
    }
}

type Rule = (Bucket, fn(&ImageRef, &Thresholds) -> bool);

/// Classification rules in priority order. `Other` is the fallthrough.
const RULES: [Rule; 4] = [
    (Bucket::VerticalDji, is_vertical_dji),
    (Bucket::FullWidth, is_flagged_full_width),
    (Bucket::LandscapeDji, is_landscape_dji),
    (Bucket::Panoramic, is_panoramic),
];

fn is_vertical_dji(img: &ImageRef, t: &Thresholds) -> bool {
    img.is_dji && img.aspect_ratio < t.vertical
}

fn is_flagged_full_width(img: &ImageRef, _: &Thresholds) -> bool {
    img.is_full_width
}

fn is_landscape_dji(img: &ImageRef, t: &Thresholds) -> bool {
    img.is_dji && img.aspect_ratio >= t.landscape
}

fn is_panoramic(img: &ImageRef, t: &Thresholds) -> bool {
    img.aspect_ratio >= t.panoramic
}

/// Assign an image to its bucket.
pub fn classify(image: &ImageRef, thresholds: &Thresholds) -> Bucket {
    RULES
        .iter()
        .find(|(_, matches)| matches(image, thresholds))
        .map(|(bucket, _)| *bucket)
        .unwrap_or(Bucket::Other)
}
