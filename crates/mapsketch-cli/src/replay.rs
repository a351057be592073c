//! Offline [`MatchService`] that answers from a recorded response.

use std::cell::Cell;

use async_trait::async_trait;
use log::debug;
use mapsketch_client::{ClientError, LocationKey, MatchRequest, MatchResponse, MatchService};
use mapsketch_pipeline::GeoBounds;

/// Serves one fixed bounds box and one recorded matcher response for
/// every location.
pub struct ReplayService {
    bounds: GeoBounds,
    response: MatchResponse,
    calls: Cell<usize>,
}

impl ReplayService {
    pub const fn new(bounds: GeoBounds, response: MatchResponse) -> Self {
        Self {
            bounds,
            response,
            calls: Cell::new(0),
        }
    }

    /// Number of match requests served.
    pub fn calls(&self) -> usize {
        self.calls.get()
    }
}

#[async_trait(?Send)]
impl MatchService for ReplayService {
    async fn bounds(&self, location: &LocationKey) -> Result<GeoBounds, ClientError> {
        debug!("replaying GET {}", location.bounds_path());
        Ok(self.bounds)
    }

    async fn find_match(
        &self,
        location: &LocationKey,
        request: &MatchRequest,
    ) -> Result<MatchResponse, ClientError> {
        self.calls.set(self.calls.get() + 1);
        debug!(
            "replaying POST {}: {} candidates for {}x{} shape",
            location.find_match_path(),
            self.response.best.len(),
            request.shape.cols(),
            request.shape.rows()
        );
        Ok(self.response.clone())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use mapsketch_pipeline::{CanonicalShape, Dimensions, GeoPoint, Scale, TracedGrid};

    const BOUNDS: GeoBounds = GeoBounds {
        north: 1.0,
        south: 0.0,
        east: 1.0,
        west: 0.0,
    };

    #[tokio::test]
    async fn serves_recorded_response_for_any_location() {
        let response = MatchResponse {
            best: vec![GeoPoint::new(0.5, 0.5)],
            scale: Scale::new(0.01, 0.01),
        };
        let service = ReplayService::new(BOUNDS, response.clone());
        let key = LocationKey::new("anywhere");
        assert_eq!(service.bounds(&key).await.unwrap(), BOUNDS);

        let grid = TracedGrid::from_fn(Dimensions::new(2, 2), |r, c| r == c);
        let request = MatchRequest {
            shape: CanonicalShape::from_traced(&grid).unwrap(),
            bounds: BOUNDS,
        };
        assert_eq!(service.find_match(&key, &request).await.unwrap(), response);
        assert_eq!(service.calls(), 1);
    }
}
