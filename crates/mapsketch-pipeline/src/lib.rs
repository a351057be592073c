//! mapsketch-pipeline: Pure sketch normalization pipeline (sans-IO).
//!
//! Turns freehand strokes into the canonical shape submitted to the
//! matcher, and turns matched anchors back into map paths:
//!
//! stroke recording -> rasterization -> autocrop -> flip -> (matcher)
//! -> coordinate remap.
//!
//! This crate has **no I/O dependencies** -- it operates on in-memory
//! point sequences and grids. The session state and the service
//! contract live in `mapsketch-client`.

pub mod grid;
pub mod normalize;
pub mod raster;
pub mod remap;
pub mod snap;
pub mod stroke;
pub mod types;

pub use grid::TracedGrid;
pub use normalize::{CanonicalShape, CropOffset, NormalizedShape};
pub use raster::{Rasterizer, RasterizerKind};
pub use remap::Remapper;
pub use stroke::{StrokeRecorder, SurfaceRect};
pub use types::{
    Dimensions, GeoBounds, GeoPoint, PipelineError, Scale, SketchConfig, StrokePoint,
};

/// Output of [`prepare`]: the full traced grid plus its normalized form.
///
/// The traced grid is kept because remapping results needs the
/// uncropped grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedShape {
    /// Full-surface traced grid.
    pub traced: TracedGrid,
    /// Canonical shape and crop offset.
    pub normalized: NormalizedShape,
}

/// Rasterize and normalize a stroke sequence.
///
/// # Pipeline steps
///
/// 1. Validate the configuration
/// 2. Rasterize (pluggable strategy) onto a `surface`-sized grid
/// 3. Autocrop to the traced bounding box and flip 180°
///
/// # Errors
///
/// Returns [`PipelineError::InvalidSurface`] or
/// [`PipelineError::InvalidConfig`] for a bad configuration and
/// [`PipelineError::EmptyShape`] if the strokes trace no pixel.
pub fn prepare(
    points: &[StrokePoint],
    config: &SketchConfig,
) -> Result<PreparedShape, PipelineError> {
    config.validate()?;

    let traced = config
        .rasterizer
        .rasterize(points, config.surface, config.line_width)?;

    let normalized = normalize::normalize(&traced)?;

    Ok(PreparedShape { traced, normalized })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn square() -> Vec<StrokePoint> {
        vec![
            StrokePoint::new(10.0, 10.0, false),
            StrokePoint::new(30.0, 10.0, true),
            StrokePoint::new(30.0, 20.0, true),
            StrokePoint::new(10.0, 20.0, true),
            StrokePoint::new(10.0, 10.0, true),
        ]
    }

    #[test]
    fn prepare_empty_sketch_is_an_error() {
        let result = prepare(&[], &SketchConfig::default());
        assert_eq!(result, Err(PipelineError::EmptyShape));
    }

    #[test]
    fn prepare_rejects_invalid_config() {
        let config = SketchConfig {
            surface: Dimensions::new(10, 0),
            ..SketchConfig::default()
        };
        assert!(matches!(
            prepare(&square(), &config),
            Err(PipelineError::InvalidSurface(_))
        ));
    }

    #[test]
    fn prepare_bresenham_rectangle() {
        let config = SketchConfig {
            surface: Dimensions::new(40, 40),
            rasterizer: RasterizerKind::Bresenham,
            ..SketchConfig::default()
        };
        let prepared = prepare(&square(), &config).unwrap();
        assert_eq!(prepared.traced.dimensions(), Dimensions::new(40, 40));
        assert_eq!(prepared.normalized.offset, CropOffset { row: 10, col: 10 });
        let shape = &prepared.normalized.shape;
        assert_eq!((shape.rows(), shape.cols()), (11, 21));
        // A closed outline is symmetric under rotation.
        assert!(shape.grid().is_traced(0, 0));
        assert!(shape.grid().is_traced(10, 20));
        assert!(!shape.grid().is_traced(5, 10));
    }

    #[test]
    fn prepare_stroked_rectangle_contains_outline() {
        let config = SketchConfig {
            surface: Dimensions::new(40, 40),
            ..SketchConfig::default()
        };
        let prepared = prepare(&square(), &config).unwrap();
        let shape = &prepared.normalized.shape;
        // Anti-aliased fringe widens the box by at most a couple of pixels.
        assert!((21..=24).contains(&shape.cols()), "cols = {}", shape.cols());
        assert!((11..=14).contains(&shape.rows()), "rows = {}", shape.rows());
        assert!(!shape.grid().is_traced(shape.rows() / 2, shape.cols() / 2));
    }
}
