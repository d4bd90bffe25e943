//! Configuration management for the rating service
//!
//! This module handles configuration loading from TOML files and environment
//! variables, validation, and default values.

pub mod app;
pub mod rating;

// Re-export commonly used types
pub use app::{
    validate_config, AppConfig, DataSettings, OutputSettings, ServiceSettings, StatsSettings,
};
pub use rating::RatingConfig;
