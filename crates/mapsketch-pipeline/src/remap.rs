//! Map stroke coordinates back onto the map for a matched anchor.
//!
//! The matcher scores the canonical shape, so a result is drawn by
//! re-applying the same crop offset and flip to the original stroke
//! points:
//!
//! ```text
//! x   = cX - offset.col
//! y   = extent - (cY - offset.row)
//! lat = anchor.lat + y * scale.lat_per_row
//! lon = anchor.lon + x * scale.lon_per_col
//! ```
//!
//! `extent` is the canonical shape's column count.

use geo::{Coord, LineString};

use crate::grid::TracedGrid;
use crate::normalize::{CropOffset, normalize};
use crate::types::{GeoPoint, PipelineError, Scale, StrokePoint};

/// Converts surface coordinates into geographic coordinates for one
/// matched anchor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Remapper {
    anchor: GeoPoint,
    scale: Scale,
    offset: CropOffset,
    extent: u32,
}

impl Remapper {
    /// Create a remapper from explicit parts.
    #[must_use]
    pub const fn new(anchor: GeoPoint, scale: Scale, offset: CropOffset, extent: u32) -> Self {
        Self {
            anchor,
            scale,
            offset,
            extent,
        }
    }

    /// Create a remapper for the grid that was submitted to the matcher.
    ///
    /// `original` must be the uncropped grid rasterized at submission
    /// time; the offset and extent are derived from it the same way the
    /// submitted shape was.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::EmptyShape`] if `original` has no traced
    /// cells.
    pub fn for_grid(
        anchor: GeoPoint,
        scale: Scale,
        original: &TracedGrid,
    ) -> Result<Self, PipelineError> {
        let normalized = normalize(original)?;
        Ok(Self::new(
            anchor,
            scale,
            normalized.offset,
            normalized.shape.cols(),
        ))
    }

    /// The anchor this remapper places the shape at.
    #[must_use]
    pub const fn anchor(&self) -> GeoPoint {
        self.anchor
    }

    /// Crop offset applied to surface coordinates.
    #[must_use]
    pub const fn offset(&self) -> CropOffset {
        self.offset
    }

    /// Extent the flip subtracts from (the canonical shape's column
    /// count).
    #[must_use]
    pub const fn extent(&self) -> u32 {
        self.extent
    }

    /// Map one surface coordinate.
    #[must_use]
    pub fn map_point(&self, cx: f64, cy: f64) -> GeoPoint {
        let x = cx - f64::from(self.offset.col);
        let y = f64::from(self.extent) - (cy - f64::from(self.offset.row));
        GeoPoint::new(
            y.mul_add(self.scale.lat_per_row, self.anchor.lat),
            x.mul_add(self.scale.lon_per_col, self.anchor.lon),
        )
    }

    /// Map every stroke point, in order, into a path (`x` = lon,
    /// `y` = lat).
    ///
    /// Gesture breaks are not preserved; the path joins all gestures.
    #[must_use]
    pub fn remap(&self, points: &[StrokePoint]) -> LineString<f64> {
        points
            .iter()
            .map(|p| Coord::from(self.map_point(p.x, p.y)))
            .collect()
    }
}
