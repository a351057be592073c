//! Boolean traced grid backed by a binary `GrayImage`.
//!
//! Traced cells are stored as luma 255 and empty cells as 0, the same
//! binary convention the edge maps of an image pipeline use, so the
//! `image::imageops` crop and rotate helpers apply directly.
//!
//! On the wire a grid is a row-major `boolean[][]`.

use image::{GrayImage, Luma};
use serde::{Deserialize, Serialize};

use crate::types::{Dimensions, PipelineError};

const TRACED: Luma<u8> = Luma([255]);
const EMPTY: Luma<u8> = Luma([0]);

/// Row-major boolean matrix of which surface pixels were inked.
///
/// Immutable once created: the normalizer returns new grids rather
/// than editing one in place.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "Vec<Vec<bool>>", into = "Vec<Vec<bool>>")]
pub struct TracedGrid(GrayImage);

impl TracedGrid {
    /// Build a grid by evaluating `traced(row, col)` for every cell.
    #[must_use]
    pub fn from_fn(dimensions: Dimensions, mut traced: impl FnMut(u32, u32) -> bool) -> Self {
        Self(GrayImage::from_fn(
            dimensions.width,
            dimensions.height,
            |col, row| {
                if traced(row, col) { TRACED } else { EMPTY }
            },
        ))
    }

    /// Build a grid from row-major rows.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::RaggedGrid`] if any row's length differs
    /// from the first row's.
    pub fn from_rows<R: AsRef<[bool]>>(rows: &[R]) -> Result<Self, PipelineError> {
        let expected = rows.first().map_or(0, |r| r.as_ref().len());
        for (row, cells) in rows.iter().enumerate() {
            let found = cells.as_ref().len();
            if found != expected {
                return Err(PipelineError::RaggedGrid {
                    row,
                    expected,
                    found,
                });
            }
        }
        let dimensions = Dimensions::new(dim_u32(expected)?, dim_u32(rows.len())?);
        Ok(Self::from_fn(dimensions, |row, col| {
            rows[row as usize].as_ref()[col as usize]
        }))
    }

    /// Build a grid from RGBA pixel bytes read back from a rendered
    /// surface.
    ///
    /// A pixel counts as traced unless all four channels are zero. The
    /// byte order within a pixel does not matter, and premultiplied
    /// data gives the same answer as straight alpha.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidConfig`] if `rgba` does not hold
    /// exactly `width * height * 4` bytes.
    pub fn from_rgba_bytes(dimensions: Dimensions, rgba: &[u8]) -> Result<Self, PipelineError> {
        let expected = dimensions.width as usize * dimensions.height as usize * 4;
        if rgba.len() != expected {
            return Err(PipelineError::InvalidConfig(format!(
                "expected {expected} RGBA bytes for a {dimensions} surface, got {}",
                rgba.len()
            )));
        }
        let luma = rgba
            .chunks_exact(4)
            .map(|px| if px.iter().any(|&c| c > 0) { 255 } else { 0 })
            .collect();
        GrayImage::from_raw(dimensions.width, dimensions.height, luma)
            .map(Self)
            .ok_or(PipelineError::InvalidSurface(dimensions))
    }

    /// Grid width (columns).
    #[must_use]
    pub fn width(&self) -> u32 {
        self.0.width()
    }

    /// Grid height (rows).
    #[must_use]
    pub fn height(&self) -> u32 {
        self.0.height()
    }

    /// Grid dimensions.
    #[must_use]
    pub fn dimensions(&self) -> Dimensions {
        Dimensions::new(self.0.width(), self.0.height())
    }

    /// Whether the cell at (`row`, `col`) is traced. Out-of-range cells
    /// are reported as empty.
    #[must_use]
    pub fn is_traced(&self, row: u32, col: u32) -> bool {
        self.0
            .get_pixel_checked(col, row)
            .is_some_and(|p| p.0[0] > 0)
    }

    /// Iterate `(row, col)` of every traced cell in row-major order.
    pub fn traced_cells(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        self.0
            .enumerate_pixels()
            .filter(|(_, _, p)| p.0[0] > 0)
            .map(|(col, row, _)| (row, col))
    }

    /// Number of traced cells.
    #[must_use]
    pub fn traced_count(&self) -> usize {
        self.0.pixels().filter(|p| p.0[0] > 0).count()
    }

    /// Returns `true` if no cell is traced.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.0.pixels().all(|p| p.0[0] == 0)
    }

    /// Row-major boolean rows, the wire representation.
    #[must_use]
    pub fn to_rows(&self) -> Vec<Vec<bool>> {
        self.0
            .rows()
            .map(|row| row.map(|p| p.0[0] > 0).collect())
            .collect()
    }

    /// The underlying binary image (255 = traced).
    #[must_use]
    pub const fn as_image(&self) -> &GrayImage {
        &self.0
    }

    pub(crate) const fn from_binary_image(image: GrayImage) -> Self {
        Self(image)
    }
}

impl PartialEq for TracedGrid {
    fn eq(&self, other: &Self) -> bool {
        self.0.dimensions() == other.0.dimensions() && self.0.as_raw() == other.0.as_raw()
    }
}

impl Eq for TracedGrid {}

impl TryFrom<Vec<Vec<bool>>> for TracedGrid {
    type Error = PipelineError;

    fn try_from(rows: Vec<Vec<bool>>) -> Result<Self, Self::Error> {
        Self::from_rows(&rows)
    }
}

impl From<TracedGrid> for Vec<Vec<bool>> {
    fn from(grid: TracedGrid) -> Self {
        grid.to_rows()
    }
}

fn dim_u32(n: usize) -> Result<u32, PipelineError> {
    u32::try_from(n).map_err(|_| PipelineError::InvalidConfig(format!("grid side {n} too large")))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn from_rows_preserves_layout() {
        let grid = TracedGrid::from_rows(&[
            vec![true, false, false],
            vec![false, false, true],
        ])
        .unwrap();
        assert_eq!(grid.dimensions(), Dimensions::new(3, 2));
        assert!(grid.is_traced(0, 0));
        assert!(grid.is_traced(1, 2));
        assert!(!grid.is_traced(1, 0));
        assert!(!grid.is_traced(5, 5));
        assert_eq!(grid.traced_count(), 2);
    }

    #[test]
    fn from_rows_rejects_ragged_input() {
        let result = TracedGrid::from_rows(&[vec![true, false], vec![true]]);
        assert_eq!(
            result,
            Err(PipelineError::RaggedGrid {
                row: 1,
                expected: 2,
                found: 1
            })
        );
    }

    #[test]
    fn empty_rows_give_zero_sized_grid() {
        let rows: Vec<Vec<bool>> = Vec::new();
        let grid = TracedGrid::from_rows(&rows).unwrap();
        assert_eq!(grid.dimensions(), Dimensions::new(0, 0));
        assert!(grid.is_blank());
    }

    #[test]
    fn traced_cells_are_row_major() {
        let grid = TracedGrid::from_rows(&[
            vec![false, true],
            vec![true, true],
        ])
        .unwrap();
        let cells: Vec<_> = grid.traced_cells().collect();
        assert_eq!(cells, vec![(0, 1), (1, 0), (1, 1)]);
    }

    #[test]
    fn rgba_pixel_with_any_nonzero_channel_is_traced() {
        // Four pixels: transparent black, alpha only, red only, opaque.
        let bytes = [
            0, 0, 0, 0, //
            0, 0, 0, 1, //
            7, 0, 0, 0, //
            223, 75, 38, 255,
        ];
        let grid = TracedGrid::from_rgba_bytes(Dimensions::new(2, 2), &bytes).unwrap();
        assert_eq!(grid.to_rows(), vec![vec![false, true], vec![true, true]]);
    }

    #[test]
    fn rgba_length_mismatch_is_rejected() {
        let result = TracedGrid::from_rgba_bytes(Dimensions::new(2, 2), &[0; 12]);
        assert!(matches!(result, Err(PipelineError::InvalidConfig(_))));
    }

    #[test]
    fn serializes_as_nested_bool_rows() {
        let grid = TracedGrid::from_rows(&[vec![true, false], vec![false, true]]).unwrap();
        let json = serde_json::to_string(&grid).unwrap();
        assert_eq!(json, "[[true,false],[false,true]]");
        let back: TracedGrid = serde_json::from_str(&json).unwrap();
        assert_eq!(back, grid);
    }

    #[test]
    fn deserializing_ragged_rows_fails() {
        let result: Result<TracedGrid, _> = serde_json::from_str("[[true],[true,false]]");
        assert!(result.is_err());
    }
}
