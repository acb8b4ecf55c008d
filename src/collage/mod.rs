//! # Collage Layout Engine
//!
//! Decides how a run of consecutive images is grouped on the page.
//!
//! ```text
//! Section (Vec<ImageRef>)
//!       ↓
//!   [classify]   — bucket per image: vertical DJI, full width, landscape DJI,
//!                  panoramic, other
//!       ↓
//!   [partition]  — bucket-specific handlers in emission order
//!       ↓            ├─ vertical DJI → diptych rows / 2×2 grids   [builder]
//!       ↓            ├─ full width, panoramic, landscape DJI → single rows
//!       ↓            └─ other → weighted random row sizes          [packer]
//!   Vec<LayoutUnit>
//! ```
//!
//! Units carry geometry relative to their own top-left corner. The page flow
//! engine positions them and draws the pixels.

pub mod builder;
pub mod classify;
pub mod packer;
pub mod partition;

use std::path::{Path, PathBuf};

use serde::Serialize;

pub use builder::{build_row, build_vertical_dji_grid};
pub use classify::{classify, Bucket};
pub use packer::{PackedRows, RowPacker};
pub use partition::{CollageEngine, SectionLayout};

/// An image resolved from a document reference, with the metadata the
/// layout engine needs.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageRef {
    pub source_path: PathBuf,
    pub pixel_width: u32,
    pub pixel_height: u32,
    /// width / height; 0.0 for an image with no height.
    pub aspect_ratio: f64,
    /// Flagged `{layout=full}` in the document.
    pub is_full_width: bool,
    /// File name contains "dji" (any case).
    pub is_dji: bool,
    /// Position of the image within its section.
    pub slot: usize,
}

impl ImageRef {
    pub fn new(
        source_path: impl Into<PathBuf>,
        pixel_width: u32,
        pixel_height: u32,
        is_full_width: bool,
        slot: usize,
    ) -> Self {
        let source_path = source_path.into();
        let aspect_ratio = if pixel_height == 0 {
            0.0
        } else {
            pixel_width as f64 / pixel_height as f64
        };
        let is_dji = is_dji_file(&source_path);
        Self {
            source_path,
            pixel_width,
            pixel_height,
            aspect_ratio,
            is_full_width,
            is_dji,
            slot,
        }
    }

    /// The file name for log lines.
    pub fn file_name(&self) -> String {
        self.source_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.source_path.display().to_string())
    }
}

fn is_dji_file(path: &Path) -> bool {
    path.file_name()
        .map(|n| n.to_string_lossy().to_lowercase().contains("dji"))
        .unwrap_or(false)
}

/// One image inside a row. `x` is measured from the row's left edge.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RowCell {
    pub image: ImageRef,
    pub x: f64,
    pub width: f64,
}

/// Images scaled to a shared height, left to right with a fixed gap.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayoutRow {
    pub cells: Vec<RowCell>,
    pub height: f64,
    pub width: f64,
    pub margin: f64,
}

/// One image inside a grid, positioned from the grid's top-left corner.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GridCell {
    pub image: ImageRef,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// A two-row block of three or four vertical images.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutGrid {
    pub cells: Vec<GridCell>,
    pub width: f64,
    pub height: f64,
    pub column_width: f64,
    pub row_heights: [f64; 2],
    pub vertical_margin: f64,
    /// Factor applied to fit `max_height` (1.0 when no scaling was needed).
    pub scale: f64,
}

/// A renderable unit produced for a section.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum LayoutUnit {
    Row(LayoutRow),
    Grid(LayoutGrid),
}

/// Where one image of a unit lands, relative to the unit's top-left corner.
#[derive(Debug, Clone, Copy)]
pub struct Placement<'a> {
    pub image: &'a ImageRef,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl LayoutUnit {
    pub fn width(&self) -> f64 {
        match self {
            LayoutUnit::Row(row) => row.width,
            LayoutUnit::Grid(grid) => grid.width,
        }
    }

    pub fn height(&self) -> f64 {
        match self {
            LayoutUnit::Row(row) => row.height,
            LayoutUnit::Grid(grid) => grid.height,
        }
    }

    pub fn image_count(&self) -> usize {
        match self {
            LayoutUnit::Row(row) => row.cells.len(),
            LayoutUnit::Grid(grid) => grid.cells.len(),
        }
    }

    /// Flatten the unit into per-image rectangles.
    pub fn placements(&self) -> Vec<Placement<'_>> {
        match self {
            LayoutUnit::Row(row) => row
                .cells
                .iter()
                .map(|cell| Placement {
                    image: &cell.image,
                    x: cell.x,
                    y: 0.0,
                    width: cell.width,
                    height: row.height,
                })
                .collect(),
            LayoutUnit::Grid(grid) => grid
                .cells
                .iter()
                .map(|cell| Placement {
                    image: &cell.image,
                    x: cell.x,
                    y: cell.y,
                    width: cell.width,
                    height: cell.height,
                })
                .collect(),
        }
    }
}
