//! Request and response bodies exchanged with the matcher.
//!
//! - `POST /find_match/{location}`: [`MatchRequest`] -> [`MatchResponse`]
//! - `GET /bounds/{location}`: -> [`GeoBounds`]

use std::fmt;

use mapsketch_pipeline::{CanonicalShape, GeoBounds, GeoPoint, Scale};
use serde::{Deserialize, Serialize};

/// Key naming a location the matcher has road data for.
///
/// Surrounding whitespace is trimmed; the key is otherwise passed
/// through as typed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LocationKey(String);

impl LocationKey {
    /// Create a key from user input.
    #[must_use]
    pub fn new(key: &str) -> Self {
        Self(key.trim().to_string())
    }

    /// The key as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Path of the bounds lookup for this location.
    #[must_use]
    pub fn bounds_path(&self) -> String {
        format!("/bounds/{}", self.0)
    }

    /// Path of the match submission for this location.
    #[must_use]
    pub fn find_match_path(&self) -> String {
        format!("/find_match/{}", self.0)
    }
}

impl fmt::Display for LocationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Body of a match submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchRequest {
    /// Canonical (cropped, flipped) shape.
    pub shape: CanonicalShape,
    /// Area to search.
    pub bounds: GeoBounds,
}

/// Matcher answer: ranked anchors and the grid scale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResponse {
    /// Candidate anchors, best first.
    pub best: Vec<GeoPoint>,
    /// Geographic size of one grid cell.
    pub scale: Scale,
}
