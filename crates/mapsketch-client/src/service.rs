//! Async seams to the external collaborators: the matcher service and a
//! road snapper.
//!
//! Implementations own transport. They report failures as
//! [`ClientError`] values and never retry; the session only needs a
//! result or a terminal error.

use async_trait::async_trait;
use mapsketch_pipeline::{GeoBounds, GeoPoint};

use crate::error::ClientError;
use crate::wire::{LocationKey, MatchRequest, MatchResponse};

/// The shape matcher and its location registry.
#[async_trait(?Send)]
pub trait MatchService {
    /// Resolve the bounding box of a location.
    ///
    /// # Errors
    ///
    /// [`ClientError::LocationNotFound`] for an unknown key,
    /// [`ClientError::Network`] for transport failures.
    async fn bounds(&self, location: &LocationKey) -> Result<GeoBounds, ClientError>;

    /// Submit a canonical shape for matching.
    ///
    /// # Errors
    ///
    /// [`ClientError::Network`] for transport failures,
    /// [`ClientError::InvalidResponse`] for an undecodable body.
    async fn find_match(
        &self,
        location: &LocationKey,
        request: &MatchRequest,
    ) -> Result<MatchResponse, ClientError>;
}

/// A third-party service that snaps a path onto roads.
#[async_trait(?Send)]
pub trait RoadSnapper {
    /// Snap `path` (already thinned to the service's point limit).
    ///
    /// An empty result means nothing could be snapped.
    ///
    /// # Errors
    ///
    /// [`ClientError::Network`] for transport failures.
    async fn snap(&self, path: &[GeoPoint]) -> Result<Vec<GeoPoint>, ClientError>;
}
