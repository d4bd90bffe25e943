//! Error types for the rating service
//!
//! Domain failures are modelled with `RatingError` and carried through the
//! crate as `anyhow::Error`, so callers can downcast when they need to react
//! to a specific case (for example falling back to the Overall surface).

use crate::types::{PlayerId, Surface};

/// Result type alias for convenience
pub type Result<T> = anyhow::Result<T>;

/// Custom error types for rating, prediction and head-to-head lookups
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RatingError {
    #[error("Unknown player: {player_id}")]
    UnknownPlayer { player_id: PlayerId },

    #[error("Player {player_id} has no rating on surface {surface}")]
    MissingSurfaceRating { player_id: PlayerId, surface: Surface },

    #[error("Invalid match: {reason}")]
    InvalidMatch { reason: String },

    #[error("Unknown surface: {label:?}")]
    UnknownSurface { label: String },

    #[error("Invalid date: {value:?}")]
    InvalidDate { value: String },

    #[error("Match feed is not in chronological order at position {index}")]
    UnsortedFeed { index: usize },

    #[error("Configuration error: {message}")]
    ConfigurationError { message: String },

    #[error("Malformed artifact: {message}")]
    MalformedArtifact { message: String },

    #[error("Internal service error: {message}")]
    InternalError { message: String },
}

/// Extract the `RatingError` behind an `anyhow::Error`, if there is one
pub fn rating_error(error: &anyhow::Error) -> Option<&RatingError> {
    error.downcast_ref::<RatingError>()
}
