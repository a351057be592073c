//! Stroke recording: accumulate pointer input into an ordered point
//! sequence split into pen-down gestures.

use serde::{Deserialize, Serialize};

use crate::types::{Dimensions, StrokePoint};

/// Records pointer samples from the drawing surface.
///
/// Coordinates are stored as given; clamping to the surface is the
/// caller's responsibility.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StrokeRecorder {
    points: Vec<StrokePoint>,
    #[serde(skip)]
    painting: bool,
}

impl StrokeRecorder {
    /// Create an empty recorder.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            points: Vec::new(),
            painting: false,
        }
    }

    /// Create a recorder holding previously recorded points.
    #[must_use]
    pub const fn from_points(points: Vec<StrokePoint>) -> Self {
        Self {
            points,
            painting: false,
        }
    }

    /// Append one point. `is_drag` marks it as continuing the previous
    /// point's gesture.
    pub fn record_point(&mut self, x: f64, y: f64, is_drag: bool) {
        self.points.push(StrokePoint::new(x, y, is_drag));
    }

    /// Pen pressed: start a new gesture at (`x`, `y`).
    pub fn pen_down(&mut self, x: f64, y: f64) {
        self.painting = true;
        self.record_point(x, y, false);
    }

    /// Pen moved. Records a continuation point only while the pen is
    /// down and returns whether it did.
    pub fn pen_move(&mut self, x: f64, y: f64) -> bool {
        if self.painting {
            self.record_point(x, y, true);
        }
        self.painting
    }

    /// Pen released or left the surface.
    pub const fn pen_up(&mut self) {
        self.painting = false;
    }

    /// Whether the pen is currently down.
    #[must_use]
    pub const fn is_painting(&self) -> bool {
        self.painting
    }

    /// Discard every point and lift the pen.
    pub fn clear(&mut self) {
        self.points.clear();
        self.painting = false;
    }

    /// All recorded points in order.
    #[must_use]
    pub fn points(&self) -> &[StrokePoint] {
        &self.points
    }

    /// Copy of the recorded points, detached from further input.
    #[must_use]
    pub fn snapshot(&self) -> Vec<StrokePoint> {
        self.points.clone()
    }

    /// Number of recorded points.
    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Returns `true` if nothing has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Iterate the recorded gestures.
    pub fn gestures(&self) -> impl Iterator<Item = &[StrokePoint]> {
        gestures(&self.points)
    }
}

/// Split a point sequence into gestures.
///
/// A new gesture starts at every point whose `is_continuation` flag is
/// false. The first point always starts a gesture.
pub fn gestures(points: &[StrokePoint]) -> impl Iterator<Item = &[StrokePoint]> {
    let mut rest = points;
    std::iter::from_fn(move || {
        if rest.is_empty() {
            return None;
        }
        let len = rest[1..]
            .iter()
            .position(|p| !p.is_continuation)
            .map_or(rest.len(), |i| i + 1);
        let (gesture, tail) = rest.split_at(len);
        rest = tail;
        Some(gesture)
    })
}

/// On-screen rectangle of the drawing surface in client coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SurfaceRect {
    /// Left edge.
    pub left: f64,
    /// Top edge.
    pub top: f64,
    /// Right edge.
    pub right: f64,
    /// Bottom edge.
    pub bottom: f64,
}

impl SurfaceRect {
    /// Map a client-space pointer position onto surface pixels.
    ///
    /// The surface may be displayed at a different size than its pixel
    /// resolution, so each axis is scaled independently. A zero-width or
    /// zero-height rectangle yields `None`.
    #[must_use]
    pub fn to_surface(&self, client_x: f64, client_y: f64, surface: Dimensions) -> Option<(f64, f64)> {
        let w = self.right - self.left;
        let h = self.bottom - self.top;
        if w.abs() < f64::EPSILON || h.abs() < f64::EPSILON {
            return None;
        }
        Some((
            (client_x - self.left) / w * f64::from(surface.width),
            (client_y - self.top) / h * f64::from(surface.height),
        ))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn record_and_clear() {
        let mut r = StrokeRecorder::new();
        r.record_point(1.0, 2.0, false);
        r.record_point(3.0, 4.0, true);
        assert_eq!(r.len(), 2);
        assert_eq!(r.points()[1], StrokePoint::new(3.0, 4.0, true));
        r.clear();
        assert!(r.is_empty());
    }

    #[test]
    fn pen_move_without_pen_down_is_ignored() {
        let mut r = StrokeRecorder::new();
        assert!(!r.pen_move(1.0, 1.0));
        assert!(r.is_empty());
    }

    #[test]
    fn pen_lifecycle_segments_gestures() {
        let mut r = StrokeRecorder::new();
        r.pen_down(0.0, 0.0);
        assert!(r.pen_move(1.0, 0.0));
        assert!(r.pen_move(2.0, 0.0));
        r.pen_up();
        assert!(!r.pen_move(9.0, 9.0));
        r.pen_down(5.0, 5.0);
        r.pen_up();

        let gestures: Vec<_> = r.gestures().map(<[StrokePoint]>::len).collect();
        assert_eq!(gestures, vec![3, 1]);
        assert!(!r.points()[0].is_continuation);
        assert!(r.points()[1].is_continuation);
        assert!(!r.points()[3].is_continuation);
    }

    #[test]
    fn clear_lifts_the_pen() {
        let mut r = StrokeRecorder::new();
        r.pen_down(0.0, 0.0);
        r.clear();
        assert!(!r.is_painting());
        assert!(!r.pen_move(1.0, 1.0));
    }

    #[test]
    fn snapshot_is_detached() {
        let mut r = StrokeRecorder::new();
        r.record_point(1.0, 1.0, false);
        let snap = r.snapshot();
        r.record_point(2.0, 2.0, true);
        assert_eq!(snap.len(), 1);
        assert_eq!(r.len(), 2);
    }

    #[test]
    fn leading_continuation_starts_a_gesture() {
        let points = vec![
            StrokePoint::new(0.0, 0.0, true),
            StrokePoint::new(1.0, 0.0, true),
            StrokePoint::new(4.0, 4.0, false),
        ];
        let split: Vec<_> = gestures(&points).map(<[StrokePoint]>::len).collect();
        assert_eq!(split, vec![2, 1]);
    }

    #[test]
    fn no_points_no_gestures() {
        assert_eq!(gestures(&[]).count(), 0);
    }

    #[test]
    fn surface_rect_scales_each_axis() {
        let rect = SurfaceRect {
            left: 100.0,
            top: 50.0,
            right: 300.0,
            bottom: 150.0,
        };
        let (x, y) = rect
            .to_surface(200.0, 75.0, Dimensions::new(400, 400))
            .unwrap();
        assert!((x - 200.0).abs() < 1e-10);
        assert!((y - 100.0).abs() < 1e-10);
    }

    #[test]
    fn degenerate_surface_rect() {
        let rect = SurfaceRect {
            left: 10.0,
            top: 10.0,
            right: 10.0,
            bottom: 20.0,
        };
        assert!(rect.to_surface(10.0, 15.0, Dimensions::new(4, 4)).is_none());
    }
}
