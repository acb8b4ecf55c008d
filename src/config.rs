//! # Configuration
//!
//! Every knob of a portfolio run: collage layout policy, page setup, image
//! optimisation, font candidates and page decorations. All fields default to
//! the values the portfolio has always been produced with, so an empty JSON
//! object (or no config file at all) is a valid configuration.
//!
//! ```json
//! {
//!   "layout": { "seed": 1756844636, "rowWeights": { "1": 0.18, "2": 0.6, "3": 0.22 } },
//!   "page": { "size": "A4", "landscape": false },
//!   "decor": { "date": "February 2025", "footerUrl": "https://example.com/" }
//! }
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::PortfolioError;
use crate::model::PageSetup;

/// Seed used when the configuration does not say otherwise. Pinning a seed
/// reproduces a previously generated layout exactly.
pub const DEFAULT_LAYOUT_SEED: u64 = 1756844636;

/// Top-level configuration for one run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Config {
    pub layout: LayoutPolicy,
    pub page: PageSetup,
    pub optimize: OptimizeSettings,
    pub fonts: FontConfig,
    pub decor: Decorations,
    /// Volume name substituted for a missing `/Volumes/<name>/` mount when
    /// resolving image paths (e.g. `"RYAN"`).
    pub fallback_volume: Option<String>,
}

impl Config {
    /// Load and validate a JSON configuration file.
    pub fn load(path: &Path) -> Result<Self, PortfolioError> {
        let text = std::fs::read_to_string(path).map_err(|e| PortfolioError::io(path, e))?;
        Self::from_json(&text)
    }

    /// Parse and validate a JSON configuration string.
    pub fn from_json(json: &str) -> Result<Self, PortfolioError> {
        let config: Config = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the layout engine cannot work with.
    pub fn validate(&self) -> Result<(), PortfolioError> {
        self.layout.validate()?;

        if self.page.content_width() <= 0.0 || self.page.content_height() <= 0.0 {
            return Err(PortfolioError::ConfigInvalid(
                "page margins leave no room for content".to_string(),
            ));
        }
        if self.optimize.max_width_px == 0 {
            return Err(PortfolioError::ConfigInvalid(
                "optimize.maxWidthPx must be positive".to_string(),
            ));
        }
        if !(1..=100).contains(&self.optimize.jpeg_quality) {
            return Err(PortfolioError::ConfigInvalid(
                "optimize.jpegQuality must be between 1 and 100".to_string(),
            ));
        }
        Ok(())
    }
}

/// Policy constants for the collage layout engine.
///
/// These encode layout taste rather than anything derived, so they are all
/// overridable from the configuration file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LayoutPolicy {
    /// Seed for the weighted row-size draws. `null` picks a time-based seed
    /// at the start of the run.
    pub seed: Option<u64>,
    pub max_images_per_row: usize,
    /// Width/height at or above which an image is panoramic.
    pub panoramic_aspect_ratio: f64,
    /// Width/height below which an image counts as vertical.
    pub vertical_aspect_ratio_threshold: f64,
    /// Width/height at or above which an image counts as landscape.
    pub landscape_aspect_ratio_threshold: f64,
    /// Gap between images in the same row.
    pub horizontal_margin: f64,
    /// Gap between the two rows of a vertical DJI grid.
    pub vertical_margin: f64,
    /// Gap used for DJI diptychs and grids.
    pub dji_diptych_margin: f64,
    /// Vertical space emitted after every collage unit.
    pub unit_spacing: f64,
    /// Relative weight of each row size for the weighted packer.
    pub row_weights: BTreeMap<usize, f64>,
}

impl Default for LayoutPolicy {
    fn default() -> Self {
        Self {
            seed: Some(DEFAULT_LAYOUT_SEED),
            max_images_per_row: 3,
            panoramic_aspect_ratio: 2.0,
            vertical_aspect_ratio_threshold: 0.9,
            landscape_aspect_ratio_threshold: 1.1,
            horizontal_margin: 4.0,
            vertical_margin: 4.0,
            dji_diptych_margin: 6.0,
            unit_spacing: 10.0,
            row_weights: BTreeMap::from([(1, 0.18), (2, 0.60), (3, 0.22)]),
        }
    }
}

impl LayoutPolicy {
    pub fn thresholds(&self) -> Thresholds {
        Thresholds {
            vertical: self.vertical_aspect_ratio_threshold,
            landscape: self.landscape_aspect_ratio_threshold,
            panoramic: self.panoramic_aspect_ratio,
        }
    }

    fn validate(&self) -> Result<(), PortfolioError> {
        let invalid = |msg: &str| Err(PortfolioError::ConfigInvalid(msg.to_string()));

        let t = self.thresholds();
        if !(t.vertical > 0.0 && t.landscape > 0.0 && t.panoramic > 0.0) {
            return invalid("aspect ratio thresholds must be positive");
        }
        if self.horizontal_margin < 0.0
            || self.vertical_margin < 0.0
            || self.dji_diptych_margin < 0.0
            || self.unit_spacing < 0.0
        {
            return invalid("margins and spacing must not be negative");
        }
        if self.max_images_per_row == 0 {
            return invalid("layout.maxImagesPerRow must be at least 1");
        }
        if self.row_weights.is_empty() {
            return invalid("layout.rowWeights must name at least one row size");
        }
        if self.row_weights.keys().any(|&size| size == 0) {
            return invalid("layout.rowWeights cannot contain a row size of 0");
        }
        if self
            .row_weights
            .values()
            .any(|w| !w.is_finite() || *w < 0.0)
        {
            return invalid("layout.rowWeights must be finite and non-negative");
        }
        if self.row_weights.values().sum::<f64>() <= 0.0 {
            return invalid("layout.rowWeights must not all be zero");
        }
        Ok(())
    }
}

/// Aspect-ratio thresholds used by the image classifier.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thresholds {
    pub vertical: f64,
    pub landscape: f64,
    pub panoramic: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        LayoutPolicy::default().thresholds()
    }
}

/// How source images are shrunk before embedding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct OptimizeSettings {
    pub enabled: bool,
    /// Images wider than this are resized (about 250 DPI across A4).
    pub max_width_px: u32,
    pub jpeg_quality: u8,
    /// Minimum fractional size reduction for a re-compressed JPEG to be kept.
    pub min_savings: f64,
}

impl Default for OptimizeSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            max_width_px: 2000,
            jpeg_quality: 92,
            min_savings: 0.05,
        }
    }
}

/// Candidate font files, tried in order. The first TrueType file that exists
/// and parses wins; otherwise the standard PDF fonts are used.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FontConfig {
    pub heading: Vec<PathBuf>,
    pub body: Vec<PathBuf>,
    pub header: Vec<PathBuf>,
    pub cjk: Vec<PathBuf>,
}

impl Default for FontConfig {
    fn default() -> Self {
        fn paths(list: &[&str]) -> Vec<PathBuf> {
            list.iter().map(PathBuf::from).collect()
        }
        Self {
            heading: paths(&["/Library/Fonts/BebasKai.ttf"]),
            body: paths(&["/Library/Fonts/FuturaCyrillicBook.ttf"]),
            header: paths(&[
                "/Library/Fonts/Arial.ttf",
                "/System/Library/Fonts/Arial.ttf",
                r"C:\Windows\Fonts\arial.ttf",
                "/usr/share/fonts/truetype/msttcorefonts/Arial.ttf",
                "/usr/share/fonts/truetype/msttcorefonts/arial.ttf",
            ]),
            cjk: paths(&[
                "/Library/Fonts/Arial Unicode MS.ttf",
                "/System/Library/Fonts/STSong.ttf",
                r"C:\Windows\Fonts\simhei.ttf",
                r"C:\Windows\Fonts\simkai.ttf",
                "/usr/share/fonts/truetype/droid/DroidSansFallbackFull.ttf",
            ]),
        }
    }
}

/// Page decorations and document-level text.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Decorations {
    /// Text printed at the top-left of every page. Defaults to the current
    /// month and year.
    pub date: Option<String>,
    /// URL printed at the bottom-left of every page.
    pub footer_url: Option<String>,
    /// Name placed as the first heading of the document when it does not
    /// already start with it.
    pub author: Option<String>,
}
