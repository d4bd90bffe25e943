//! Court Ratings - surface-aware Elo ratings for head-to-head sports
//!
//! This crate replays historical match records into per-player, per-surface
//! Elo ratings (plus an aggregate Overall track), counts head-to-head wins
//! between every pair of players, and derives player profiles and career
//! statistics from the same feed.

pub mod config;
pub mod error;
pub mod feed;
pub mod head_to_head;
pub mod metrics;
pub mod profile;
pub mod rating;
pub mod service;
pub mod types;
pub mod utils;

// Re-export commonly used types and traits
pub use error::{RatingError, Result};
pub use types::*;

// Re-export key components
pub use feed::{ChronologicalMatches, CsvMatchFeed, MatchFeed, StaticMatchFeed};
pub use head_to_head::HeadToHeadMatrix;
pub use rating::{RatingEngine, RatingTable};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
