//! mapsketch-client: Session state and the matcher boundary.
//!
//! Wraps the pure pipeline in `mapsketch-pipeline` with the state of a
//! drawing session (strokes, location, results, drawn paths) and the
//! async contracts of the services it talks to. Transport is left to
//! implementations of [`MatchService`] and [`RoadSnapper`].

pub mod error;
pub mod guard;
pub mod service;
pub mod session;
pub mod wire;

pub use error::ClientError;
pub use service::{MatchService, RoadSnapper};
pub use session::{
    CompletedSnap, CompletedSubmission, MatchResults, PendingSnap, PendingSubmission, Session,
};
pub use wire::{LocationKey, MatchRequest, MatchResponse};
