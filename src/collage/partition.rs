//! Section partitioning.
//!
//! A section is split into buckets, then each bucket is laid out by its own
//! handler in [`Bucket::EMIT_ORDER`]. Vertical DJI leftovers that cannot form
//! a pair or grid are folded into the "other" bucket, which is why that
//! bucket is always handled last.

use tracing::{debug, warn};

use super::{
    build_row, build_vertical_dji_grid, classify, Bucket, ImageRef, LayoutUnit, RowPacker,
};
use crate::config::LayoutPolicy;

/// Vertical DJI images are grouped in chunks of at most this many.
const DJI_CHUNK: usize = 4;

/// The layout units of one section, in emission order.
#[derive(Debug, Clone, Default)]
pub struct SectionLayout {
    pub units: Vec<LayoutUnit>,
    pub collages_created: usize,
    pub skipped_groups: usize,
}

impl SectionLayout {
    pub fn image_count(&self) -> usize {
        self.units.iter().map(LayoutUnit::image_count).sum()
    }

    fn push_row_unit(&mut self, unit: Option<LayoutUnit>, names: &[String], collage: bool) {
        match unit {
            Some(unit) => {
                if collage {
                    self.collages_created += 1;
                }
                self.units.push(unit);
            }
            None => {
                warn!(images = ?names, "skipping group with degenerate image dimensions");
                self.skipped_groups += 1;
            }
        }
    }
}

/// Lays out sections for one document pass.
///
/// The engine owns the row packer and with it the random generator, so
/// sections laid out in the same order with the same seed always produce
/// the same units.
pub struct CollageEngine {
    policy: LayoutPolicy,
    packer: RowPacker,
}

impl CollageEngine {
    pub fn new(policy: LayoutPolicy, seed: u64) -> Self {
        let packer = RowPacker::new(seed, &policy);
        Self { policy, packer }
    }

    pub fn policy(&self) -> &LayoutPolicy {
        &self.policy
    }

    /// Classify a section and lay it out unit by unit.
    pub fn partition_and_layout(
        &mut self,
        section: Vec<ImageRef>,
        max_width: f64,
        max_height: f64,
    ) -> SectionLayout {
        let thresholds = self.policy.thresholds();
        let mut buckets: [Vec<ImageRef>; Bucket::COUNT] = Default::default();
        for image in section {
            let bucket = classify(&image, &thresholds);
            debug!(
                image = %image.file_name(),
                aspect_ratio = image.aspect_ratio,
                bucket = bucket.label(),
                "classified"
            );
            buckets[bucket.index()].push(image);
        }

        let mut layout = SectionLayout::default();
        for bucket in Bucket::EMIT_ORDER {
            let images = std::mem::take(&mut buckets[bucket.index()]);
            if images.is_empty() {
                continue;
            }
            match bucket {
                Bucket::VerticalDji => {
                    let leftover = self.layout_vertical_dji(images, max_width, max_height, &mut layout);
                    buckets[Bucket::Other.index()].extend(leftover);
                }
                Bucket::FullWidth | Bucket::Panoramic | Bucket::LandscapeDji => {
                    self.layout_singles(images, max_width, max_height, &mut layout)
                }
                Bucket::Other => {
                    let packed = self.packer.pack(images, max_width, max_height);
                    layout.collages_created += packed.collages;
                    layout.skipped_groups += packed.skipped;
                    layout.units.extend(packed.rows.into_iter().map(LayoutUnit::Row));
                }
            }
        }

        debug!(
            units = layout.units.len(),
            collages = layout.collages_created,
            skipped = layout.skipped_groups,
            "section laid out"
        );
        layout
    }

    /// Pairs become diptych rows, triples and quads become grids. A lone
    /// trailing image is handed back for the "other" bucket.
    fn layout_vertical_dji(
        &self,
        images: Vec<ImageRef>,
        max_width: f64,
        max_height: f64,
        layout: &mut SectionLayout,
    ) -> Option<ImageRef> {
        let margin = self.policy.dji_diptych_margin;
        let mut images = images.into_iter().peekable();
        let mut leftover = None;

        while images.peek().is_some() {
            let chunk: Vec<ImageRef> = images.by_ref().take(DJI_CHUNK).collect();
            let names: Vec<String> = chunk.iter().map(ImageRef::file_name).collect();
            match chunk.len() {
                1 => leftover = chunk.into_iter().next(),
                2 => {
                    let unit = build_row(chunk, max_width, max_height, margin).map(LayoutUnit::Row);
                    layout.push_row_unit(unit, &names, true);
                }
                _ => {
                    let unit = build_vertical_dji_grid(
                        chunk,
                        max_width,
                        max_height,
                        margin,
                        self.policy.vertical_margin,
                    )
                    .map(LayoutUnit::Grid);
                    layout.push_row_unit(unit, &names, true);
                }
            }
        }

        if let Some(image) = &leftover {
            debug!(image = %image.file_name(), "single vertical DJI image joins the other bucket");
        }
        leftover
    }

    fn layout_singles(
        &self,
        images: Vec<ImageRef>,
        max_width: f64,
        max_height: f64,
        layout: &mut SectionLayout,
    ) {
        for image in images {
            let names = [image.file_name()];
            let unit = build_row(
                vec![image],
                max_width,
                max_height,
                self.policy.horizontal_margin,
            )
            .map(LayoutUnit::Row);
            layout.push_row_unit(unit, &names, false);
        }
    }
}
