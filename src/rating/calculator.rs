//! Rating calculator trait
//!
//! This module defines the interface for the pairwise update applied after
//! every match, independent of where the ratings are stored.

use serde::{Deserialize, Serialize};

/// Outcome of one pairwise update
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PairwiseUpdate {
    /// Probability the winner was expected to win before the match
    pub winner_expected: f64,
    /// Probability the loser was expected to win before the match
    pub loser_expected: f64,
    /// Winner's rating after the match
    pub winner_rating: f64,
    /// Loser's rating after the match
    pub loser_rating: f64,
}

/// Trait for calculating rating changes after a decided match
pub trait RatingCalculator: Send + Sync {
    /// Probability that a player rated `rating` beats one rated `opponent_rating`
    fn expected_score(&self, rating: f64, opponent_rating: f64) -> f64;

    /// New ratings after the player rated `winner_rating` beat the one rated
    /// `loser_rating`
    fn rate_win(&self, winner_rating: f64, loser_rating: f64) -> PairwiseUpdate;

    /// Baseline rating for entries that have not played yet
    fn initial_rating(&self) -> f64;

    /// Get current configuration as JSON
    fn config(&self) -> serde_json::Value;
}
