//! Client error taxonomy.

use mapsketch_pipeline::PipelineError;

/// Errors surfaced by session operations and service calls.
///
/// A request rejected because another of its kind is still in flight is
/// not an error: those calls return `Ok(None)`.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The bounds lookup did not recognise the location key.
    #[error("location not found: {0}")]
    LocationNotFound(String),

    /// A submission or snap call failed in transport.
    #[error("network error: {0}")]
    Network(String),

    /// The service answered with a body that could not be decoded.
    #[error("invalid response: {0}")]
    InvalidResponse(#[from] serde_json::Error),

    /// No location has been resolved yet, so there is nothing to search.
    #[error("no location selected")]
    NoLocation,

    /// The matcher returned an empty candidate list.
    #[error("matcher returned no candidates")]
    NoResults,

    /// The sketch could not be normalized (e.g. nothing was drawn).
    #[error(transparent)]
    Pipeline(#[from] PipelineError),
}

impl ClientError {
    /// Whether this failure should block the user with an alert rather
    /// than only being logged.
    #[must_use]
    pub const fn is_user_facing(&self) -> bool {
        matches!(
            self,
            Self::LocationNotFound(_) | Self::NoLocation | Self::Pipeline(PipelineError::EmptyShape)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display() {
        assert_eq!(
            ClientError::LocationNotFound("atlantis".to_string()).to_string(),
            "location not found: atlantis"
        );
        assert_eq!(
            ClientError::Pipeline(PipelineError::EmptyShape).to_string(),
            "shape has no traced pixels"
        );
    }

    #[test]
    fn user_facing_split() {
        assert!(ClientError::LocationNotFound("x".to_string()).is_user_facing());
        assert!(ClientError::Pipeline(PipelineError::EmptyShape).is_user_facing());
        assert!(!ClientError::Network("timeout".to_string()).is_user_facing());
        assert!(!ClientError::NoResults.is_user_facing());
    }
}
