//! Road-snap sampling: thin a drawn path down to the number of points a
//! snapping service accepts per call.
//!
//! Points are taken at a fractional stride of `max(1, n / limit)` and
//! the result is truncated to `limit`, since flooring the fractional
//! index can yield one extra sample.

use geo::LineString;

use crate::types::GeoPoint;

/// Sample at most `limit` points from `path`, evenly spread and in order.
///
/// A path with `limit` or fewer points is returned whole. A `limit` of
/// zero yields no points.
#[must_use]
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
pub fn snap_sample(path: &LineString<f64>, limit: usize) -> Vec<GeoPoint> {
    let coords = &path.0;
    let n = coords.len();
    if limit == 0 || n == 0 {
        return Vec::new();
    }

    let stride = (n as f64 / limit as f64).max(1.0);
    let mut sampled = Vec::with_capacity(limit.min(n));
    let mut i = 0.0_f64;
    while i < n as f64 && sampled.len() < limit {
        sampled.push(GeoPoint::from(coords[i.floor() as usize]));
        i += stride;
    }
    sampled
}

/// Format points as a snapping-service path parameter:
/// `lat,lon|lat,lon|...` with six decimals.
#[must_use]
pub fn path_param(points: &[GeoPoint]) -> String {
    points
        .iter()
        .map(|p| format!("{:.6},{:.6}", p.lat, p.lon))
        .collect::<Vec<_>>()
        .join("|")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use geo::Coord;

    #[allow(clippy::cast_precision_loss)]
    fn line(n: usize) -> LineString<f64> {
        (0..n)
            .map(|i| Coord {
                x: i as f64,
                y: 0.0,
            })
            .collect()
    }

    #[test]
    fn short_path_is_kept_whole() {
        let sampled = snap_sample(&line(40), 100);
        assert_eq!(sampled.len(), 40);
        assert!((sampled[39].lon - 39.0).abs() < f64::EPSILON);
    }

    #[test]
    fn exact_limit_is_kept_whole() {
        assert_eq!(snap_sample(&line(100), 100).len(), 100);
    }

    #[test]
    fn long_path_is_capped_and_starts_at_first_point() {
        let sampled = snap_sample(&line(250), 100);
        assert_eq!(sampled.len(), 100);
        assert!((sampled[0].lon - 0.0).abs() < f64::EPSILON);
        // Stride 2.5: indices 0, 2, 5, 7, 10, ...
        let lons: Vec<f64> = sampled.iter().take(5).map(|p| p.lon).collect();
        assert_eq!(lons, vec![0.0, 2.0, 5.0, 7.0, 10.0]);
    }

    #[test]
    fn samples_are_in_path_order() {
        let sampled = snap_sample(&line(1234), 100);
        assert!(sampled.len() <= 100);
        for w in sampled.windows(2) {
            assert!(w[0].lon < w[1].lon);
        }
    }

    #[test]
    fn empty_inputs() {
        assert!(snap_sample(&line(0), 100).is_empty());
        assert!(snap_sample(&line(10), 0).is_empty());
    }

    #[test]
    fn path_param_format() {
        let param = path_param(&[GeoPoint::new(29.76, -95.3698), GeoPoint::new(1.0, 2.0)]);
        assert_eq!(param, "29.760000,-95.369800|1.000000,2.000000");
    }
}
