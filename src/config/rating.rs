//! Rating system configuration

use crate::error::{RatingError, Result};
use serde::{Deserialize, Serialize};

/// Baseline rating for every (player, surface) entry
pub const DEFAULT_INITIAL_RATING: f64 = 1500.0;

/// Step size applied to every match
pub const DEFAULT_K_FACTOR: f64 = 32.0;

/// Elo parameters, fixed for the lifetime of a replay
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RatingConfig {
    pub initial_rating: f64,
    pub k_factor: f64,
}

impl Default for RatingConfig {
    fn default() -> Self {
        Self {
            initial_rating: DEFAULT_INITIAL_RATING,
            k_factor: DEFAULT_K_FACTOR,
        }
    }
}

impl RatingConfig {
    /// Validate configuration parameters
    pub fn validate(&self) -> Result<()> {
        if !self.initial_rating.is_finite() {
            return Err(RatingError::ConfigurationError {
                message: "Initial rating must be a finite number".to_string(),
            }
            .into());
        }

        if !self.k_factor.is_finite() || self.k_factor <= 0.0 {
            return Err(RatingError::ConfigurationError {
                message: "K-factor must be positive".to_string(),
            }
            .into());
        }

        Ok(())
    }
}
