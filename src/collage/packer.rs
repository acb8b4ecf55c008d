//! Weighted random row packing for "other" images.
//!
//! Row sizes are drawn from a weight table, restricted to sizes that still
//! fit the remaining image count. The generator is an explicit [`StdRng`]
//! owned by the packer, so a fixed seed reproduces a layout exactly.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, warn};

use super::{build_row, ImageRef, LayoutRow};
use crate::config::LayoutPolicy;

/// Rows produced from one run of "other" images.
#[derive(Debug, Clone, Default)]
pub struct PackedRows {
    pub rows: Vec<LayoutRow>,
    /// Rows holding more than one image.
    pub collages: usize,
    /// Groups for which no row could be built.
    pub skipped: usize,
}

pub struct RowPacker {
    rng: StdRng,
    weights: Vec<(usize, f64)>,
    max_per_row: usize,
    margin: f64,
}

impl RowPacker {
    pub fn new(seed: u64, policy: &LayoutPolicy) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            weights: policy
                .row_weights
                .iter()
                .map(|(&size, &weight)| (size, weight))
                .collect(),
            max_per_row: policy.max_images_per_row,
            margin: policy.horizontal_margin,
        }
    }

    /// Draw the size of the next row given how many images are left.
    pub fn next_row_size(&mut self, remaining: usize) -> usize {
        if remaining <= 1 {
            return 1;
        }

        let candidates: Vec<(usize, f64)> = self
            .weights
            .iter()
            .copied()
            .filter(|&(size, weight)| {
                size >= 1 && size <= remaining && size <= self.max_per_row && weight > 0.0
            })
            .collect();

        let total: f64 = candidates.iter().map(|(_, w)| w).sum();
        if candidates.is_empty() || !(total > 0.0) {
            warn!(
                remaining,
                "no weighted row size fits the remaining images; placing one image per row"
            );
            return 1;
        }

        let mut target = self.rng.random::<f64>() * total;
        for &(size, weight) in &candidates {
            if target < weight {
                return size;
            }
            target -= weight;
        }
        // Rounding can leave target a hair above the last weight.
        candidates.last().map(|&(size, _)| size).unwrap_or(1)
    }

    /// Pack images into rows, left to right, preserving order.
    pub fn pack(&mut self, images: Vec<ImageRef>, max_width: f64, max_height: f64) -> PackedRows {
        let mut packed = PackedRows::default();
        let mut pending = images.into_iter().peekable();
        let mut remaining = pending.len();

        while pending.peek().is_some() {
            let size = self.next_row_size(remaining).min(remaining);
            let group: Vec<ImageRef> = pending.by_ref().take(size).collect();
            remaining -= group.len();

            let names: Vec<String> = group.iter().map(ImageRef::file_name).collect();
            match build_row(group, max_width, max_height, self.margin) {
                Some(row) => {
                    debug!(size, images = ?names, height = row.height, "packed row");
                    if row.cells.len() > 1 {
                        packed.collages += 1;
                    }
                    packed.rows.push(row);
                }
                None => {
                    warn!(images = ?names, "skipping row with degenerate image dimensions");
                    packed.skipped += 1;
                }
            }
        }

        packed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collage::test_support::image;
    use crate::config::DEFAULT_LAYOUT_SEED;
    use std::collections::BTreeMap;

    fn others(ratios: &[f64]) -> Vec<ImageRef> {
        ratios
            .iter()
            .enumerate()
            .map(|(i, &ar)| image(&format!("IMG_{}.jpg", i), ar, i))
            .collect()
    }

    fn row_sizes(packed: &PackedRows) -> Vec<usize> {
        packed.rows.iter().map(|r| r.cells.len()).collect()
    }

    #[test]
    fn same_seed_same_groupings() {
        let policy = LayoutPolicy::default();
        let input = others(&[1.5, 0.7, 1.0, 1.33, 0.8]);

        let first = RowPacker::new(DEFAULT_LAYOUT_SEED, &policy).pack(input.clone(), 495.28, 701.89);
        for _ in 0..5 {
            let again = RowPacker::new(DEFAULT_LAYOUT_SEED, &policy).pack(input.clone(), 495.28, 701.89);
            assert_eq!(row_sizes(&again), row_sizes(&first));
            assert_eq!(again.rows, first.rows);
        }
    }

    #[test]
    fn every_image_is_placed_once_in_order() {
        let policy = LayoutPolicy::default();
        let input = others(&[1.5, 0.7, 1.0, 1.33, 0.8]);
        let packed = RowPacker::new(42, &policy).pack(input, 495.28, 701.89);

        let slots: Vec<usize> = packed
            .rows
            .iter()
            .flat_map(|r| r.cells.iter().map(|c| c.image.slot))
            .collect();
        assert_eq!(slots, vec![0, 1, 2, 3, 4]);
        assert!(row_sizes(&packed).iter().all(|&n| (1..=3).contains(&n)));
        assert_eq!(
            packed.collages,
            row_sizes(&packed).iter().filter(|&&n| n > 1).count()
        );
    }

    #[test]
    fn single_remaining_image_gets_its_own_row() {
        let mut packer = RowPacker::new(7, &LayoutPolicy::default());
        assert_eq!(packer.next_row_size(1), 1);
        assert_eq!(packer.next_row_size(0), 1);
    }

    #[test]
    fn sizes_never_exceed_remaining() {
        let mut packer = RowPacker::new(99, &LayoutPolicy::default());
        for _ in 0..200 {
            assert!(packer.next_row_size(2) <= 2);
        }
    }

    #[test]
    fn only_weighted_sizes_are_drawn() {
        let policy = LayoutPolicy {
            row_weights: BTreeMap::from([(1, 0.0), (2, 1.0), (3, 0.0)]),
            ..LayoutPolicy::default()
        };
        let mut packer = RowPacker::new(1, &policy);
        for _ in 0..50 {
            assert_eq!(packer.next_row_size(5), 2);
        }
    }

    #[test]
    fn falls_back_to_single_rows_instead_of_dropping_images() {
        // Only size 3 carries weight, so two remaining images have no candidate.
        let policy = LayoutPolicy {
            row_weights: BTreeMap::from([(1, 0.0), (3, 1.0)]),
            ..LayoutPolicy::default()
        };
        let packed = RowPacker::new(5, &policy).pack(others(&[1.0, 1.0]), 495.28, 701.89);
        assert_eq!(row_sizes(&packed), vec![1, 1]);
        assert_eq!(packed.collages, 0);
    }

    #[test]
    fn max_images_per_row_caps_draws() {
        let policy = LayoutPolicy {
            max_images_per_row: 2,
            ..LayoutPolicy::default()
        };
        let mut packer = RowPacker::new(3, &policy);
        for _ in 0..100 {
            assert!(packer.next_row_size(10) <= 2);
        }
    }

    #[test]
    fn degenerate_groups_are_counted_as_skipped() {
        let mut input = others(&[1.0]);
        input.push(ImageRef::new("flat.jpg", 0, 10, false, 1));
        // Force rows of one so the degenerate image lands alone.
        let policy = LayoutPolicy {
            row_weights: BTreeMap::from([(1, 1.0)]),
            ..LayoutPolicy::default()
        };
        let packed = RowPacker::new(0, &policy).pack(input, 495.28, 701.89);
        assert_eq!(packed.rows.len(), 1);
        assert_eq!(packed.skipped, 1);
    }
}
