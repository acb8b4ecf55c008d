//! Row and grid geometry.
//!
//! Both builders preserve every image's aspect ratio exactly and never
//! produce a unit taller than `max_height`.

use super::{GridCell, ImageRef, LayoutGrid, LayoutRow, RowCell};

/// Lay out images left to right at a common height.
///
/// The height is whatever makes the row span `max_width` (minus the gaps),
/// capped at `max_height`. Returns `None` for an empty group or when the
/// ratios sum to zero.
pub fn build_row(
    images: Vec<ImageRef>,
    max_width: f64,
    max_height: f64,
    margin: f64,
) -> Option<LayoutRow> {
    if images.is_empty() {
        return None;
    }

    let total_aspect: f64 = images.iter().map(|img| img.aspect_ratio).sum();
    if !(total_aspect > 0.0) || !total_aspect.is_finite() {
        return None;
    }

    let gaps = margin * (images.len() - 1) as f64;
    let available_width = max_width - gaps;
    let height = (available_width / total_aspect).min(max_height);
    if height <= 0.0 {
        return None;
    }

    let mut cells = Vec::with_capacity(images.len());
    let mut x = 0.0;
    for (i, image) in images.into_iter().enumerate() {
        if i > 0 {
            x += margin;
        }
        let width = height * image.aspect_ratio;
        cells.push(RowCell { image, x, width });
        x += width;
    }

    Some(LayoutRow {
        cells,
        height,
        width: x,
        margin,
    })
}

/// Lay out three or four vertical images as two rows of two columns.
///
/// The first two images form the top row; the rest form the bottom row (a
/// lone third image is centred). Each row is as tall as its tallest image at
/// column width. If the whole block would exceed `max_height`, the column
/// width, both row heights and the vertical gap shrink by the same factor;
/// the horizontal gap stays fixed.
pub fn build_vertical_dji_grid(
    images: Vec<ImageRef>,
    max_width: f64,
    max_height: f64,
    margin: f64,
    vertical_margin: f64,
) -> Option<LayoutGrid> {
    if !(3..=4).contains(&images.len()) {
        return None;
    }
    if images
        .iter()
        .any(|img| !(img.aspect_ratio > 0.0) || !img.aspect_ratio.is_finite())
    {
        return None;
    }

    let column_width = (max_width - margin) / 2.0;
    if column_width <= 0.0 {
        return None;
    }

    let natural_height = |row: &[ImageRef]| {
        row.iter()
            .map(|img| column_width / img.aspect_ratio)
            .fold(0.0_f64, f64::max)
    };
    let top_height = natural_height(&images[..2]);
    let bottom_height = natural_height(&images[2..]);
    let total_height = top_height + bottom_height + vertical_margin;

    let scale = if total_height > max_height {
        max_height / total_height
    } else {
        1.0
    };

    let column_width = column_width * scale;
    let row_heights = [top_height * scale, bottom_height * scale];
    let vertical_margin = vertical_margin * scale;
    let width = column_width * 2.0 + margin;
    let bottom_y = row_heights[0] + vertical_margin;
    let bottom_count = images.len() - 2;

    let mut cells = Vec::with_capacity(images.len());
    for (i, image) in images.into_iter().enumerate() {
        let (column_x, row_y, row_height) = if i < 2 {
            (i as f64 * (column_width + margin), 0.0, row_heights[0])
        } else if bottom_count == 1 {
            ((width - column_width) / 2.0, bottom_y, row_heights[1])
        } else {
            (
                (i - 2) as f64 * (column_width + margin),
                bottom_y,
                row_heights[1],
            )
        };
        cells.push(fit_in_cell(image, column_x, row_y, column_width, row_height));
    }

    Some(LayoutGrid {
        cells,
        width,
        height: row_heights[0] + vertical_margin + row_heights[1],
        column_width,
        row_heights,
        vertical_margin,
        scale,
    })
}

/// Largest aspect-preserving rectangle inside the cell, centred.
fn fit_in_cell(image: ImageRef, x: f64, y: f64, cell_width: f64, cell_height: f64) -> GridCell {
    let width = cell_width.min(cell_height * image.aspect_ratio);
    let height = width / image.aspect_ratio;
    GridCell {
        x: x + (cell_width - width) / 2.0,
        y: y + (cell_height - height) / 2.0,
        width,
        height,
        image,
    }
}
