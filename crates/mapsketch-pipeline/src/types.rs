//! Shared types for the mapsketch normalization pipeline.

use serde::{Deserialize, Serialize};

use crate::raster::RasterizerKind;

/// One recorded pointer sample on the drawing surface.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StrokePoint {
    /// Horizontal position (pixels from left edge).
    pub x: f64,
    /// Vertical position (pixels from top edge).
    pub y: f64,
    /// `true` when this point continues the previous point's gesture.
    pub is_continuation: bool,
}

impl StrokePoint {
    /// Create a new stroke point.
    #[must_use]
    pub const fn new(x: f64, y: f64, is_continuation: bool) -> Self {
        Self {
            x,
            y,
            is_continuation,
        }
    }
}

/// Drawing surface dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Dimensions {
    /// Create new dimensions.
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Returns `true` if either side is zero.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }
}

impl std::fmt::Display for Dimensions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// A latitude/longitude pair.
///
/// Serialized as a `[lat, lon]` array, the form the matcher uses for
/// its ranked anchors.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "(f64, f64)", into = "(f64, f64)")]
pub struct GeoPoint {
    /// Latitude in degrees.
    pub lat: f64,
    /// Longitude in degrees.
    pub lon: f64,
}

impl GeoPoint {
    /// Create a new geographic point.
    #[must_use]
    pub const fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

impl From<(f64, f64)> for GeoPoint {
    fn from((lat, lon): (f64, f64)) -> Self {
        Self { lat, lon }
    }
}

impl From<GeoPoint> for (f64, f64) {
    fn from(p: GeoPoint) -> Self {
        (p.lat, p.lon)
    }
}

impl From<GeoPoint> for geo::Coord<f64> {
    fn from(p: GeoPoint) -> Self {
        Self { x: p.lon, y: p.lat }
    }
}

impl From<geo::Coord<f64>> for GeoPoint {
    fn from(c: geo::Coord<f64>) -> Self {
        Self { lat: c.y, lon: c.x }
    }
}

/// A geographic search rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoBounds {
    /// Northern edge latitude.
    pub north: f64,
    /// Southern edge latitude.
    pub south: f64,
    /// Eastern edge longitude.
    pub east: f64,
    /// Western edge longitude.
    pub west: f64,
}

impl From<GeoBounds> for geo::Rect<f64> {
    fn from(b: GeoBounds) -> Self {
        Self::new(
            geo::coord! { x: b.west, y: b.south },
            geo::coord! { x: b.east, y: b.north },
        )
    }
}

/// Geographic displacement per grid cell.
///
/// Serialized as `[lat_per_row, lon_per_col]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "(f64, f64)", into = "(f64, f64)")]
pub struct Scale {
    /// Degrees of latitude per grid row.
    pub lat_per_row: f64,
    /// Degrees of longitude per grid column.
    pub lon_per_col: f64,
}

impl Scale {
    /// Create a new scale.
    #[must_use]
    pub const fn new(lat_per_row: f64, lon_per_col: f64) -> Self {
        Self {
            lat_per_row,
            lon_per_col,
        }
    }
}

impl From<(f64, f64)> for Scale {
    fn from((lat_per_row, lon_per_col): (f64, f64)) -> Self {
        Self {
            lat_per_row,
            lon_per_col,
        }
    }
}

impl From<Scale> for (f64, f64) {
    fn from(s: Scale) -> Self {
        (s.lat_per_row, s.lon_per_col)
    }
}

/// Configuration for the sketch pipeline.
///
/// Fields are public with no construction-time validation;
/// [`SketchConfig::validate`] reports the invariants the pipeline
/// relies on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SketchConfig {
    /// Drawing surface size. Every traced grid has these dimensions.
    pub surface: Dimensions,

    /// Stroke width in surface pixels used when rasterizing.
    pub line_width: f32,

    /// Which rasterization strategy to use.
    pub rasterizer: RasterizerKind,

    /// Maximum number of points sent to the road snapper per call.
    pub snap_point_limit: usize,
}

impl SketchConfig {
    /// Default drawing surface width in pixels.
    pub const DEFAULT_SURFACE_WIDTH: u32 = 400;

    /// Default drawing surface height in pixels.
    pub const DEFAULT_SURFACE_HEIGHT: u32 = 400;

    /// Default stroke width in pixels.
    pub const DEFAULT_LINE_WIDTH: f32 = 1.0;

    /// Default cap on points per road-snap call.
    pub const DEFAULT_SNAP_POINT_LIMIT: usize = 100;

    /// Check the invariants the pipeline relies on.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidSurface`] for a zero-sized surface
    /// and [`PipelineError::InvalidConfig`] for a non-positive line width
    /// or a zero snap limit.
    pub fn validate(&self) -> Result<(), PipelineError> {
        if self.surface.is_empty() {
            return Err(PipelineError::InvalidSurface(self.surface));
        }
        if !(self.line_width.is_finite() && self.line_width > 0.0) {
            return Err(PipelineError::InvalidConfig(format!(
                "line_width must be positive, got {}",
                self.line_width
            )));
        }
        if self.snap_point_limit == 0 {
            return Err(PipelineError::InvalidConfig(
                "snap_point_limit must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for SketchConfig {
    fn default() -> Self {
        Self {
            surface: Dimensions::new(Self::DEFAULT_SURFACE_WIDTH, Self::DEFAULT_SURFACE_HEIGHT),
            line_width: Self::DEFAULT_LINE_WIDTH,
            rasterizer: RasterizerKind::default(),
            snap_point_limit: Self::DEFAULT_SNAP_POINT_LIMIT,
        }
    }
}

/// Errors that can occur in the sketch pipeline.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PipelineError {
    /// The grid has no traced cells, so it has no bounding box.
    #[error("shape has no traced pixels")]
    EmptyShape,

    /// The drawing surface has a zero-length side.
    #[error("invalid drawing surface {0}")]
    InvalidSurface(Dimensions),

    /// Pipeline configuration is invalid.
    #[error("invalid sketch configuration: {0}")]
    InvalidConfig(String),

    /// A row-major grid had rows of differing lengths.
    #[error("grid row {row} has {found} cells, expected {expected}")]
    RaggedGrid {
        /// Index of the offending row.
        row: usize,
        /// Length of the first row.
        expected: usize,
        /// Length of the offending row.
        found: usize,
    },
}
