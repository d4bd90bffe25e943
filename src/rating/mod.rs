//! Rating system built on the Elo implementation of the skillratings crate
//!
//! This module provides the pairwise calculator, storage interfaces, the
//! replaying engine and the read-only table used for predictions.

pub mod calculator;
pub mod elo;
pub mod engine;
pub mod storage;
pub mod table;

// Re-export commonly used types
pub use calculator::{PairwiseUpdate, RatingCalculator};
pub use elo::{win_probability, EloRatingCalculator};
pub use engine::{MatchUpdate, RatingChange, RatingEngine, ReplaySummary, TrackUpdate};
pub use storage::{InMemoryRatingStorage, RatingEntry, RatingStorage};
pub use table::RatingTable;
