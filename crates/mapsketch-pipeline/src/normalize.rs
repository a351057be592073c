//! Shape normalization: crop a traced grid to its ink and rotate it into
//! the canonical orientation the matcher scores against.
//!
//! ```text
//! traced grid ──autocrop──▶ bounding-box sub-grid ──flip──▶ canonical shape
//!      │
//!      └──find_offset──▶ crop offset (kept for remapping results)
//! ```
//!
//! `flip` is a full 180° rotation: row order is reversed *and* each row
//! is reversed. The crop offset is always taken from the original,
//! uncropped grid.

use image::imageops;
use serde::{Deserialize, Serialize};

use crate::grid::TracedGrid;
use crate::types::{Dimensions, PipelineError};

/// Top-left corner of the traced bounding box in original grid space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CropOffset {
    /// Row of the topmost traced cell.
    pub row: u32,
    /// Column of the leftmost traced cell.
    pub col: u32,
}

/// Inclusive bounding box of all traced cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundingBox {
    /// Topmost traced row.
    pub top: u32,
    /// Leftmost traced column.
    pub left: u32,
    /// Bottommost traced row.
    pub bottom: u32,
    /// Rightmost traced column.
    pub right: u32,
}

impl BoundingBox {
    /// Number of rows spanned.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.bottom - self.top + 1
    }

    /// Number of columns spanned.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.right - self.left + 1
    }

    /// Top-left corner as a crop offset.
    #[must_use]
    pub const fn offset(&self) -> CropOffset {
        CropOffset {
            row: self.top,
            col: self.left,
        }
    }

    /// Size of the box.
    #[must_use]
    pub const fn dimensions(&self) -> Dimensions {
        Dimensions::new(self.width(), self.height())
    }
}

/// Find the minimal box containing every traced cell.
///
/// # Errors
///
/// Returns [`PipelineError::EmptyShape`] if no cell is traced.
pub fn bounding_box(grid: &TracedGrid) -> Result<BoundingBox, PipelineError> {
    grid.traced_cells()
        .fold(None, |acc: Option<BoundingBox>, (row, col)| {
            Some(acc.map_or(
                BoundingBox {
                    top: row,
                    left: col,
                    bottom: row,
                    right: col,
                },
                |b| BoundingBox {
                    top: b.top.min(row),
                    left: b.left.min(col),
                    bottom: b.bottom.max(row),
                    right: b.right.max(col),
                },
            ))
        })
        .ok_or(PipelineError::EmptyShape)
}

/// Minimum traced row and minimum traced column, taken independently.
///
/// Call this on the original grid, not on an already-cropped one.
///
/// # Errors
///
/// Returns [`PipelineError::EmptyShape`] if no cell is traced.
pub fn find_offset(grid: &TracedGrid) -> Result<CropOffset, PipelineError> {
    bounding_box(grid).map(|b| b.offset())
}

/// Restrict `grid` to the bounding box of its traced cells, preserving
/// row and column order.
///
/// # Errors
///
/// Returns [`PipelineError::EmptyShape`] if no cell is traced.
pub fn autocrop(grid: &TracedGrid) -> Result<TracedGrid, PipelineError> {
    let b = bounding_box(grid)?;
    let cropped = imageops::crop_imm(grid.as_image(), b.left, b.top, b.width(), b.height());
    Ok(TracedGrid::from_binary_image(cropped.to_image()))
}

/// Rotate `grid` by 180°: the last row becomes the first and every row
/// is reversed.
#[must_use]
pub fn flip(grid: &TracedGrid) -> TracedGrid {
    TracedGrid::from_binary_image(imageops::rotate180(grid.as_image()))
}

/// Cropped and flipped grid, the form submitted to the matcher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CanonicalShape(TracedGrid);

impl CanonicalShape {
    /// Canonicalize a traced grid: `flip(autocrop(grid))`.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::EmptyShape`] if no cell is traced.
    pub fn from_traced(grid: &TracedGrid) -> Result<Self, PipelineError> {
        autocrop(grid).map(|cropped| Self(flip(&cropped)))
    }

    /// Number of rows.
    #[must_use]
    pub fn rows(&self) -> u32 {
        self.0.height()
    }

    /// Number of columns.
    #[must_use]
    pub fn cols(&self) -> u32 {
        self.0.width()
    }

    /// The canonical grid.
    #[must_use]
    pub const fn grid(&self) -> &TracedGrid {
        &self.0
    }

    /// Consume the shape and return its grid.
    #[must_use]
    pub fn into_grid(self) -> TracedGrid {
        self.0
    }
}

/// A canonical shape together with the crop offset of the grid it was
/// derived from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedShape {
    /// The canonical (cropped, flipped) shape.
    pub shape: CanonicalShape,
    /// Crop offset measured on the original grid.
    pub offset: CropOffset,
}

/// Crop and flip `grid`, remembering where the crop started.
///
/// # Errors
///
/// Returns [`PipelineError::EmptyShape`] if no cell is traced.
pub fn normalize(grid: &TracedGrid) -> Result<NormalizedShape, PipelineError> {
    let offset = find_offset(grid)?;
    let shape = CanonicalShape::from_traced(grid)?;
    log::debug!(
        "normalized {} grid to {}x{} shape at offset ({}, {})",
        grid.dimensions(),
        shape.cols(),
        shape.rows(),
        offset.row,
        offset.col,
    );
    Ok(NormalizedShape { shape, offset })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn grid_with(dims: (u32, u32), traced: &[(u32, u32)]) -> TracedGrid {
        TracedGrid::from_fn(Dimensions::new(dims.1, dims.0), |r, c| {
            traced.contains(&(r, c))
        })
    }

    /// A few fixed grids with asymmetric ink placement.
    fn fixtures() -> Vec<TracedGrid> {
        vec![
            grid_with((5, 5), &[(1, 1), (3, 3)]),
            grid_with((4, 7), &[(0, 6), (2, 1), (3, 2)]),
            grid_with((6, 3), &[(5, 0)]),
            grid_with((3, 3), &[(0, 0), (0, 1), (0, 2), (1, 0), (2, 2)]),
            grid_with((1, 1), &[(0, 0)]),
        ]
    }

    #[test]
    fn offset_of_two_point_grid() {
        let g = grid_with((5, 5), &[(1, 1), (3, 3)]);
        assert_eq!(find_offset(&g).unwrap(), CropOffset { row: 1, col: 1 });
    }

    #[test]
    fn offset_takes_row_and_column_minimum_independently() {
        // Topmost cell is at column 4, leftmost cell is at row 3.
        let g = grid_with((5, 6), &[(1, 4), (3, 2)]);
        assert_eq!(find_offset(&g).unwrap(), CropOffset { row: 1, col: 2 });
    }

    #[test]
    fn autocrop_two_point_grid() {
        let g = grid_with((5, 5), &[(1, 1), (3, 3)]);
        let cropped = autocrop(&g).unwrap();
        assert_eq!(
            cropped.to_rows(),
            vec![
                vec![true, false, false],
                vec![false, false, false],
                vec![false, false, true],
            ]
        );
    }

    #[test]
    fn flip_moves_top_left_to_bottom_right() {
        let g = grid_with((3, 3), &[(0, 0)]);
        let flipped = flip(&g);
        assert!(flipped.is_traced(2, 2));
        assert_eq!(flipped.traced_count(), 1);
    }

    #[test]
    fn flip_is_rotation_not_mirror() {
        // A row-only mirror would send (0, 0) to (1, 0).
        let g = grid_with((2, 3), &[(0, 0)]);
        let flipped = flip(&g);
        assert!(flipped.is_traced(1, 2));
        assert!(!flipped.is_traced(1, 0));
        assert_eq!(flipped.dimensions(), g.dimensions());
    }

    #[test]
    fn flip_is_an_involution() {
        for g in fixtures() {
            assert_eq!(flip(&flip(&g)), g);
        }
    }

    #[test]
    fn autocrop_is_idempotent() {
        for g in fixtures() {
            let once = autocrop(&g).unwrap();
            assert_eq!(autocrop(&once).unwrap(), once);
        }
    }

    #[test]
    fn offset_matches_autocrop_top_left() {
        for g in fixtures() {
            let offset = find_offset(&g).unwrap();
            let cropped = autocrop(&g).unwrap();
            // Every cropped cell maps back onto the original at the offset.
            for (r, c) in cropped.traced_cells() {
                assert!(g.is_traced(r + offset.row, c + offset.col));
            }
            assert_eq!(cropped.traced_count(), g.traced_count());
            // The cropped grid touches its own top and left edges.
            assert_eq!(find_offset(&cropped).unwrap(), CropOffset { row: 0, col: 0 });
        }
    }

    #[test]
    fn autocrop_dimensions_equal_bounding_box() {
        let g = grid_with((8, 9), &[(2, 7), (5, 3), (6, 4)]);
        let b = bounding_box(&g).unwrap();
        assert_eq!(
            b,
            BoundingBox {
                top: 2,
                left: 3,
                bottom: 6,
                right: 7
            }
        );
        let cropped = autocrop(&g).unwrap();
        assert_eq!(cropped.height(), 6 - 2 + 1);
        assert_eq!(cropped.width(), 7 - 3 + 1);
        assert_eq!(cropped.dimensions(), b.dimensions());
    }

    #[test]
    fn empty_grid_fails_explicitly() {
        let g = grid_with((4, 4), &[]);
        assert_eq!(find_offset(&g), Err(PipelineError::EmptyShape));
        assert_eq!(autocrop(&g), Err(PipelineError::EmptyShape));
        assert_eq!(normalize(&g), Err(PipelineError::EmptyShape));
    }

    #[test]
    fn canonical_shape_is_flipped_crop() {
        let g = grid_with((5, 5), &[(1, 1), (1, 2), (3, 3)]);
        let shape = CanonicalShape::from_traced(&g).unwrap();
        assert_eq!((shape.rows(), shape.cols()), (3, 3));
        assert_eq!(
            shape.grid().to_rows(),
            vec![
                vec![true, false, false],
                vec![false, false, false],
                vec![false, true, true],
            ]
        );
    }

    #[test]
    fn normalize_keeps_original_offset() {
        let g = grid_with((10, 10), &[(4, 6), (7, 8)]);
        let n = normalize(&g).unwrap();
        assert_eq!(n.offset, CropOffset { row: 4, col: 6 });
        assert_eq!((n.shape.rows(), n.shape.cols()), (4, 3));
    }

    #[test]
    fn canonical_shape_serializes_as_grid() {
        let g = grid_with((2, 2), &[(0, 0)]);
        let shape = CanonicalShape::from_traced(&g).unwrap();
        assert_eq!(serde_json::to_string(&shape).unwrap(), "[[true]]");
    }
}
