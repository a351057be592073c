//! Rasterization: turn recorded stroke points into a [`TracedGrid`].
//!
//! This module defines the [`Rasterizer`] trait for pluggable
//! rasterization strategies and the [`RasterizerKind`] enum for
//! selecting one at runtime.
//!
//! # Strategies
//!
//! - [`Stroked`](RasterizerKind::Stroked) paints every gesture onto an
//!   RGBA pixmap with an opaque anti-aliased pen and reads the pixels
//!   back. A pixel is traced unless all four channels are zero, so the
//!   pen colour must never be fully transparent.
//! - [`Bresenham`](RasterizerKind::Bresenham) walks integer line cells
//!   straight into the grid. It does not depend on any rendering style.

use serde::{Deserialize, Serialize};
use tiny_skia::{LineCap, LineJoin, Paint, PathBuilder, Pixmap, Stroke, Transform};

use crate::grid::TracedGrid;
use crate::stroke::gestures;
use crate::types::{Dimensions, PipelineError, StrokePoint};

/// Pen colour used by the stroked rasterizer (`#df4b26`, fully opaque).
pub const PEN_RGBA: [u8; 4] = [0xdf, 0x4b, 0x26, 0xff];

/// Selects which rasterization strategy to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RasterizerKind {
    /// Render with `tiny-skia` and read pixels back.
    ///
    /// Matches what a browser canvas produces for the same strokes,
    /// including anti-aliased fringe pixels.
    #[default]
    Stroked,

    /// Integer Bresenham lines written directly into the grid.
    Bresenham,
}

/// Trait for rasterization strategies.
///
/// Input: the full ordered stroke sequence and the surface size.
/// Output: a `surface.height × surface.width` traced grid.
pub trait Rasterizer {
    /// Rasterize `points` onto a surface of the given size.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidSurface`] for a zero-sized surface.
    fn rasterize(
        &self,
        points: &[StrokePoint],
        surface: Dimensions,
        line_width: f32,
    ) -> Result<TracedGrid, PipelineError>;
}

impl Rasterizer for RasterizerKind {
    fn rasterize(
        &self,
        points: &[StrokePoint],
        surface: Dimensions,
        line_width: f32,
    ) -> Result<TracedGrid, PipelineError> {
        if surface.is_empty() {
            return Err(PipelineError::InvalidSurface(surface));
        }
        let grid = match *self {
            Self::Stroked => rasterize_stroked(points, surface, line_width)?,
            Self::Bresenham => rasterize_bresenham(points, surface, line_width),
        };
        log::debug!(
            "{self:?} rasterized {} points onto {surface}: {} cells traced",
            points.len(),
            grid.traced_count(),
        );
        Ok(grid)
    }
}

/// Paint each gesture as one stroked path, then read the pixmap back.
///
/// A single-point gesture is drawn as a one-pixel dash ending at the
/// point, which is how the drawing surface shows a click.
#[allow(clippy::cast_possible_truncation)]
fn rasterize_stroked(
    points: &[StrokePoint],
    surface: Dimensions,
    line_width: f32,
) -> Result<TracedGrid, PipelineError> {
    let mut pixmap =
        Pixmap::new(surface.width, surface.height).ok_or(PipelineError::InvalidSurface(surface))?;

    let stroke = Stroke {
        width: line_width,
        line_cap: LineCap::Round,
        line_join: LineJoin::Round,
        ..Stroke::default()
    };

    let mut paint = Paint::default();
    let [r, g, b, a] = PEN_RGBA;
    paint.set_color_rgba8(r, g, b, a);
    paint.anti_alias = true;

    for gesture in gestures(points) {
        let mut pb = PathBuilder::new();
        match gesture {
            [] => continue,
            [only] => {
                pb.move_to((only.x - 1.0) as f32, only.y as f32);
                pb.line_to(only.x as f32, only.y as f32);
            }
            [first, rest @ ..] => {
                pb.move_to(first.x as f32, first.y as f32);
                for p in rest {
                    pb.line_to(p.x as f32, p.y as f32);
                }
            }
        }
        // Degenerate paths (e.g. non-finite coordinates) draw nothing.
        let Some(path) = pb.finish() else {
            continue;
        };
        pixmap.stroke_path(&path, &paint, &stroke, Transform::identity(), None);
    }

    TracedGrid::from_rgba_bytes(surface, pixmap.data())
}

/// Write gesture segments into the grid with integer line stepping.
///
/// Segment endpoints are inclusive. Lines wider than one pixel stamp a
/// square brush centred on every stepped cell. Segments are clipped to
/// the band of cells whose brush can reach the surface before they are
/// walked, so far off-surface points cost no more than on-surface ones.
/// A brush wider than the surface is treated as surface-sized.
/// Segments with non-finite coordinates draw nothing.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
fn rasterize_bresenham(points: &[StrokePoint], surface: Dimensions, line_width: f32) -> TracedGrid {
    let width = surface.width as usize;
    let height = surface.height as usize;
    let mut cells = vec![false; width * height];

    let reach = i64::from(surface.width.max(surface.height));
    let half = (((line_width - 1.0) / 2.0).ceil().max(0.0) as i64).min(reach);
    let band = Band {
        min: -(half + 1) as f64,
        max_x: (i64::from(surface.width) + half) as f64,
        max_y: (i64::from(surface.height) + half) as f64,
    };

    let mut stamp = |cell: Cell| {
        let rows = (cell.row - half).max(0)..=(cell.row + half).min(height as i64 - 1);
        for row in rows {
            let cols = (cell.col - half).max(0)..=(cell.col + half).min(width as i64 - 1);
            for col in cols {
                cells[row as usize * width + col as usize] = true;
            }
        }
    };

    let mut walk = |from: (f64, f64), to: (f64, f64)| {
        if let Some((start, end)) = band.clip(from, to) {
            BresenhamLine::new(Cell::containing(start), Cell::containing(end)).for_each(&mut stamp);
        }
    };

    for gesture in gestures(points) {
        match gesture {
            [] => {}
            [only] => {
                let x = only.x.floor();
                walk((x - 1.0, only.y), (x, only.y));
            }
            _ => {
                for pair in gesture.windows(2) {
                    walk((pair[0].x, pair[0].y), (pair[1].x, pair[1].y));
                }
            }
        }
    }

    TracedGrid::from_fn(surface, |row, col| {
        cells[row as usize * width + col as usize]
    })
}

/// Square region `[min, max_x] × [min, max_y]` in surface coordinates.
#[derive(Debug, Clone, Copy)]
struct Band {
    min: f64,
    max_x: f64,
    max_y: f64,
}

/// A band edge a segment crosses: a vertical line at `x` or a
/// horizontal line at `y`.
#[derive(Debug, Clone, Copy)]
enum Edge {
    X(f64),
    Y(f64),
}

impl Band {
    /// Clip the segment `from → to` (as `(x, y)`) to the band with
    /// Liang-Barsky, or `None` if no part of it lies inside.
    ///
    /// Endpoints already inside are returned unchanged. Crossing points
    /// are solved from the crossed edge, not from the segment parameter.
    fn clip(self, from: (f64, f64), to: (f64, f64)) -> Option<((f64, f64), (f64, f64))> {
        let dx = to.0 - from.0;
        let dy = to.1 - from.1;
        if !(from.0.is_finite() && from.1.is_finite() && dx.is_finite() && dy.is_finite()) {
            return None;
        }

        let mut t0 = 0.0_f64;
        let mut t1 = 1.0_f64;
        let mut enter = None;
        let mut exit = None;
        for (p, q, edge) in [
            (-dx, from.0 - self.min, Edge::X(self.min)),
            (dx, self.max_x - from.0, Edge::X(self.max_x)),
            (-dy, from.1 - self.min, Edge::Y(self.min)),
            (dy, self.max_y - from.1, Edge::Y(self.max_y)),
        ] {
            if p.abs() <= f64::EPSILON {
                // Parallel to this edge.
                if q < 0.0 {
                    return None;
                }
                continue;
            }
            let r = q / p;
            if p < 0.0 {
                if r > t0 {
                    t0 = r;
                    enter = Some(edge);
                }
            } else if r < t1 {
                t1 = r;
                exit = Some(edge);
            }
        }
        if t0 > t1 {
            return None;
        }

        let crossing = |edge: Edge| match edge {
            Edge::X(x) => (x, (x - from.0).mul_add(dy / dx, from.1)),
            Edge::Y(y) => ((y - from.1).mul_add(dx / dy, from.0), y),
        };
        let start = enter.map_or(from, crossing);
        let end = exit.map_or(to, crossing);
        Some((self.clamp(start), self.clamp(end)))
    }

    fn clamp(self, (x, y): (f64, f64)) -> (f64, f64) {
        (x.clamp(self.min, self.max_x), y.clamp(self.min, self.max_y))
    }
}

/// Integer grid cell, allowed to lie off the surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Cell {
    row: i64,
    col: i64,
}

impl Cell {
    /// The pixel whose unit square contains the `(x, y)` point.
    #[allow(clippy::cast_possible_truncation)]
    fn containing((x, y): (f64, f64)) -> Self {
        Self {
            row: y.floor() as i64,
            col: x.floor() as i64,
        }
    }
}

/// Bresenham's line algorithm as an iterator over cells from `start` to
/// `end`, both included.
struct BresenhamLine {
    x: i64,
    y: i64,
    dx: i64,
    dy: i64,
    x_inc: i64,
    y_inc: i64,
    error: i64,
    steep: bool,
    end_x: i64,
    end_y: i64,
    done: bool,
}

impl BresenhamLine {
    fn new(start: Cell, end: Cell) -> Self {
        let dx = (end.col - start.col).abs();
        let dy = (end.row - start.row).abs();
        let steep = dy > dx;

        let (x, y, end_x, end_y, dx, dy) = if steep {
            (start.row, start.col, end.row, end.col, dy, dx)
        } else {
            (start.col, start.row, end.col, end.row, dx, dy)
        };

        Self {
            x,
            y,
            dx,
            dy,
            x_inc: if end_x > x { 1 } else { -1 },
            y_inc: if end_y > y { 1 } else { -1 },
            error: dx / 2,
            steep,
            end_x,
            end_y,
            done: false,
        }
    }
}

impl Iterator for BresenhamLine {
    type Item = Cell;

    fn next(&mut self) -> Option<Cell> {
        if self.done {
            return None;
        }

        let cell = if self.steep {
            Cell {
                row: self.x,
                col: self.y,
            }
        } else {
            Cell {
                row: self.y,
                col: self.x,
            }
        };

        if self.x == self.end_x && self.y == self.end_y {
            self.done = true;
            return Some(cell);
        }

        self.error -= self.dy;
        if self.error < 0 {
            self.y += self.y_inc;
            self.error += self.dx;
        }
        self.x += self.x_inc;

        Some(cell)
    }
}
