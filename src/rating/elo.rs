//! Elo rating system implementation
//!
//! This module provides the concrete rating calculator, using the Elo
//! implementation from the skillratings crate: expectation
//! `1 / (1 + 10^((opponent - rating) / 400))` and a fixed K-factor step.

use crate::config::RatingConfig;
use crate::rating::calculator::{PairwiseUpdate, RatingCalculator};
use skillratings::elo::{elo, expected_score, EloConfig, EloRating};
use skillratings::Outcomes;

/// Probability that a player rated `rating` beats one rated `opponent_rating`
pub fn win_probability(rating: f64, opponent_rating: f64) -> f64 {
    let (expected, _) = expected_score(
        &EloRating { rating },
        &EloRating {
            rating: opponent_rating,
        },
    );
    expected
}

/// Elo rating calculator with a fixed K-factor
#[derive(Debug, Clone)]
pub struct EloRatingCalculator {
    config: RatingConfig,
    elo_config: EloConfig,
}

impl EloRatingCalculator {
    /// Create a new Elo rating calculator
    pub fn new(config: RatingConfig) -> crate::error::Result<Self> {
        config.validate()?;

        let elo_config = EloConfig { k: config.k_factor };
        Ok(Self { config, elo_config })
    }

    pub fn rating_config(&self) -> &RatingConfig {
        &self.config
    }

    pub fn k_factor(&self) -> f64 {
        self.elo_config.k
    }
}

impl Default for EloRatingCalculator {
    fn default() -> Self {
        let config = RatingConfig::default();
        let elo_config = EloConfig { k: config.k_factor };
        Self { config, elo_config }
    }
}

impl RatingCalculator for EloRatingCalculator {
    fn expected_score(&self, rating: f64, opponent_rating: f64) -> f64 {
        win_probability(rating, opponent_rating)
    }

    fn rate_win(&self, winner_rating: f64, loser_rating: f64) -> PairwiseUpdate {
        let winner = EloRating {
            rating: winner_rating,
        };
        let loser = EloRating {
            rating: loser_rating,
        };

        let (winner_expected, loser_expected) = expected_score(&winner, &loser);
        let (new_winner, new_loser) = elo(&winner, &loser, &Outcomes::WIN, &self.elo_config);

        PairwiseUpdate {
            winner_expected,
            loser_expected,
            winner_rating: new_winner.rating,
            loser_rating: new_loser.rating,
        }
    }

    fn initial_rating(&self) -> f64 {
        self.config.initial_rating
    }

    fn config(&self) -> serde_json::Value {
        serde_json::to_value(&self.config).unwrap_or(serde_json::Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f64 = 1e-9;

    #[test]
    fn test_calculator_creation() {
        let calculator = EloRatingCalculator::new(RatingConfig::default()).unwrap();
        assert_eq!(calculator.initial_rating(), 1500.0);
        assert_eq!(calculator.k_factor(), 32.0);

        let invalid = RatingConfig {
            k_factor: 0.0,
            ..RatingConfig::default()
        };
        assert!(EloRatingCalculator::new(invalid).is_err());
    }

    #[test]
    fn test_equal_ratings_split_half_of_k() {
        let calculator = EloRatingCalculator::default();
        let update = calculator.rate_win(1500.0, 1500.0);

        assert!((update.winner_expected - 0.5).abs() < EPSILON);
        assert!((update.winner_rating - 1516.0).abs() < EPSILON);
        assert!((update.loser_rating - 1484.0).abs() < EPSILON);
    }

    #[test]
    fn test_expectation_curve() {
        // A 400 point gap means 10:1 odds
        assert!((win_probability(1900.0, 1500.0) - 10.0 / 11.0).abs() < EPSILON);
        assert!((win_probability(1500.0, 1900.0) - 1.0 / 11.0).abs() < EPSILON);
        assert!((win_probability(1623.4, 1623.4) - 0.5).abs() < EPSILON);
    }

    #[test]
    fn test_upset_moves_ratings_further() {
        let calculator = EloRatingCalculator::default();
        let favourite_wins = calculator.rate_win(1700.0, 1500.0);
        let upset = calculator.rate_win(1500.0, 1700.0);

        let favourite_gain = favourite_wins.winner_rating - 1700.0;
        let underdog_gain = upset.winner_rating - 1500.0;
        assert!(underdog_gain > favourite_gain);
        assert!((favourite_gain + underdog_gain - 32.0).abs() < EPSILON);
    }

    #[test]
    fn test_update_is_zero_sum() {
        let calculator = EloRatingCalculator::default();
        let update = calculator.rate_win(1432.5, 1611.0);

        let winner_delta = update.winner_rating - 1432.5;
        let loser_delta = update.loser_rating - 1611.0;
        assert!((winner_delta - 32.0 * update.loser_expected).abs() < EPSILON);
        assert!((winner_delta + loser_delta).abs() < EPSILON);
        assert!((update.winner_expected + update.loser_expected - 1.0).abs() < EPSILON);
    }

    #[test]
    fn test_config_as_json() {
        let calculator = EloRatingCalculator::default();
        let config = calculator.config();
        assert_eq!(config["k_factor"], 32.0);
        assert_eq!(config["initial_rating"], 1500.0);
    }
}
