//! Main application configuration
//!
//! This module defines the primary configuration structures for the
//! court-ratings service, including TOML and environment variable loading
//! and validation.

use super::rating::RatingConfig;
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

/// Main application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub service: ServiceSettings,
    pub rating: RatingConfig,
    pub data: DataSettings,
    pub stats: StatsSettings,
    pub output: OutputSettings,
}

/// Service-level settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceSettings {
    /// Service name for logging
    pub name: String,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
}

/// Input and output locations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataSettings {
    /// Match feed in the ATP `matches.csv` layout
    pub matches_path: PathBuf,
    /// Directory receiving the derived tables
    pub output_dir: PathBuf,
}

/// Player statistics settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatsSettings {
    /// Number of most recent matches used for recent form
    pub recent_form_window: usize,
}

/// Artifact output settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputSettings {
    /// Write the run's Prometheus metrics next to the tables
    pub write_metrics: bool,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            name: "court-ratings".to_string(),
            log_level: "info".to_string(),
        }
    }
}

impl Default for DataSettings {
    fn default() -> Self {
        Self {
            matches_path: PathBuf::from("matches.csv"),
            output_dir: PathBuf::from("output"),
        }
    }
}

impl Default for StatsSettings {
    fn default() -> Self {
        Self {
            recent_form_window: 10,
        }
    }
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            write_metrics: true,
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file. Missing keys fall back to defaults.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read configuration file {}", path.display()))?;
        Self::from_toml_str(&text)
            .with_context(|| format!("Invalid configuration file {}", path.display()))
    }

    /// Parse and validate configuration from TOML text
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text)?;
        validate_config(&config)?;
        Ok(config)
    }

    /// Load configuration from environment variables with fallback to defaults
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        // Service settings
        if let Ok(name) = env::var("SERVICE_NAME") {
            config.service.name = name;
        }
        if let Ok(log_level) = env::var("LOG_LEVEL") {
            config.service.log_level = log_level;
        }

        // Rating settings
        if let Ok(initial) = env::var("INITIAL_RATING") {
            config.rating.initial_rating = initial
                .parse()
                .map_err(|_| anyhow!("Invalid INITIAL_RATING value: {}", initial))?;
        }
        if let Ok(k_factor) = env::var("K_FACTOR") {
            config.rating.k_factor = k_factor
                .parse()
                .map_err(|_| anyhow!("Invalid K_FACTOR value: {}", k_factor))?;
        }

        // Data settings
        if let Ok(path) = env::var("MATCHES_PATH") {
            config.data.matches_path = PathBuf::from(path);
        }
        if let Ok(dir) = env::var("OUTPUT_DIR") {
            config.data.output_dir = PathBuf::from(dir);
        }

        // Stats and output settings
        if let Ok(window) = env::var("RECENT_FORM_WINDOW") {
            config.stats.recent_form_window = window
                .parse()
                .map_err(|_| anyhow!("Invalid RECENT_FORM_WINDOW value: {}", window))?;
        }
        if let Ok(write_metrics) = env::var("WRITE_METRICS") {
            config.output.write_metrics = write_metrics
                .parse()
                .map_err(|_| anyhow!("Invalid WRITE_METRICS value: {}", write_metrics))?;
        }

        validate_config(&config)?;
        Ok(config)
    }

    /// Path of the exported rating table
    pub fn ratings_path(&self) -> PathBuf {
        self.data.output_dir.join("player_ratings.csv")
    }

    /// Path of the exported head-to-head matrix
    pub fn head_to_head_path(&self) -> PathBuf {
        self.data.output_dir.join("head_to_head.csv")
    }

    /// Path of the unified per-player match history
    pub fn player_matches_path(&self) -> PathBuf {
        self.data.output_dir.join("player_matches.csv")
    }

    /// Path of the latest player profiles
    pub fn player_profiles_path(&self) -> PathBuf {
        self.data.output_dir.join("player_profiles.csv")
    }

    /// Path of the Prometheus metrics dump
    pub fn metrics_path(&self) -> PathBuf {
        self.data.output_dir.join("metrics.prom")
    }
}

/// Validate configuration values
pub fn validate_config(config: &AppConfig) -> Result<()> {
    // Validate log level
    match config.service.log_level.to_lowercase().as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => {}
        _ => return Err(anyhow!("Invalid log level: {}", config.service.log_level)),
    }

    config.rating.validate()?;

    // Validate paths
    if config.data.matches_path.as_os_str().is_empty() {
        return Err(anyhow!("Matches path cannot be empty"));
    }
    if config.data.output_dir.as_os_str().is_empty() {
        return Err(anyhow!("Output directory cannot be empty"));
    }

    if config.stats.recent_form_window == 0 {
        return Err(anyhow!("Recent form window must be greater than 0"));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = AppConfig::default();
        assert!(validate_config(&config).is_ok());
        assert_eq!(config.service.name, "court-ratings");
        assert_eq!(config.rating.k_factor, 32.0);
        assert_eq!(config.stats.recent_form_window, 10);
        assert_eq!(
            config.ratings_path(),
            PathBuf::from("output").join("player_ratings.csv")
        );
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config = AppConfig::from_toml_str(
            r#"
            [rating]
            k_factor = 24.0

            [data]
            output_dir = "/tmp/ratings"
            "#,
        )
        .unwrap();

        assert_eq!(config.rating.k_factor, 24.0);
        assert_eq!(config.rating.initial_rating, 1500.0);
        assert_eq!(config.data.output_dir, PathBuf::from("/tmp/ratings"));
        assert_eq!(config.data.matches_path, PathBuf::from("matches.csv"));
        assert_eq!(config.service.log_level, "info");
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(AppConfig::from_toml_str("[service]\nlog_level = \"loud\"").is_err());
        assert!(AppConfig::from_toml_str("[rating]\nk_factor = -1.0").is_err());
        assert!(AppConfig::from_toml_str("[stats]\nrecent_form_window = 0").is_err());
        assert!(AppConfig::from_toml_str("[data]\nmatches_path = \"\"").is_err());
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("court-ratings.toml");
        std::fs::write(&path, "[service]\nlog_level = \"debug\"\n").unwrap();

        let config = AppConfig::from_file(&path).unwrap();
        assert_eq!(config.service.log_level, "debug");

        assert!(AppConfig::from_file(dir.path().join("missing.toml")).is_err());
    }
}
