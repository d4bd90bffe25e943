//! Main application state and the build pipeline
//!
//! `AppState` ties configuration, the match feed, the rating engine, the
//! head-to-head build and the profile tables together. The rating replay and
//! the head-to-head build share nothing and run on separate blocking tasks.

use crate::config::AppConfig;
use crate::error::{rating_error, RatingError, Result};
use crate::feed::{ChronologicalMatches, CsvMatchFeed, FeedSummary, MatchFeed};
use crate::head_to_head::HeadToHeadMatrix;
use crate::metrics::MetricsCollector;
use crate::profile::{
    build_player_matches, latest_profiles, load_player_matches, player_stats,
    save_player_matches, save_profiles, PlayerMatch, PlayerProfile, PlayerStats,
};
use crate::rating::{RatingEngine, RatingTable, ReplaySummary};
use crate::types::{PlayerId, Surface};
use chrono::NaiveDate;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Service-level errors
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Match feed error: {message}")]
    Feed { message: String },

    #[error("Artifact error: {message}")]
    Artifact { message: String },

    #[error("Background task error: {message}")]
    BackgroundTask { message: String },
}

/// Summary of one build run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BuildReport {
    pub feed: FeedSummary,
    pub matches: usize,
    pub players: usize,
    pub replay: ReplaySummary,
    pub rating_rows: usize,
    pub profiles: usize,
}

/// Everything one build run derived from the feed
#[derive(Debug, Clone)]
pub struct BuildOutput {
    pub ratings: RatingTable,
    pub head_to_head: HeadToHeadMatrix,
    pub player_matches: Vec<PlayerMatch>,
    pub profiles: Vec<PlayerProfile>,
    pub report: BuildReport,
}

/// Win probability answered from the rating table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prediction {
    pub player_a: PlayerId,
    pub player_b: PlayerId,
    pub requested_surface: Surface,
    /// Surface the ratings were read from; differs from the requested one
    /// only after an explicit Overall fallback
    pub surface: Surface,
    pub probability: f64,
}

/// Wins in both directions between two players
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HeadToHeadRecord {
    pub player_a: PlayerId,
    pub player_b: PlayerId,
    pub a_wins: i64,
    pub b_wins: i64,
}

/// How the build puts feed matches in date order
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FeedOrder {
    /// Stable sort by date; equal dates keep feed order
    #[default]
    Sort,
    /// Reject a feed that is not already in date order
    Strict,
}

struct RatingOutcome {
    table: RatingTable,
    summary: ReplaySummary,
    players: usize,
}

/// Main application state containing all service components
pub struct AppState {
    /// Application configuration
    config: AppConfig,

    /// Metrics for this run
    metrics: Arc<MetricsCollector>,
}

impl AppState {
    /// Initialize the application
    pub fn new(config: AppConfig) -> std::result::Result<Self, ServiceError> {
        info!("Initializing {} rating service", config.service.name);
        info!(
            "Configuration: matches={}, output_dir={}, k_factor={}",
            config.data.matches_path.display(),
            config.data.output_dir.display(),
            config.rating.k_factor
        );

        crate::config::validate_config(&config).map_err(|e| ServiceError::Configuration {
            message: format!("{:#}", e),
        })?;

        let metrics = Arc::new(MetricsCollector::new().map_err(|e| {
            ServiceError::Configuration {
                message: format!("Failed to create metrics collector: {}", e),
            }
        })?);

        Ok(Self { config, metrics })
    }

    /// Get service configuration
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Get the metrics collector
    pub fn metrics(&self) -> Arc<MetricsCollector> {
        self.metrics.clone()
    }

    /// Build from the configured CSV feed and write every artifact
    pub async fn run_build(
        &self,
        order: FeedOrder,
    ) -> std::result::Result<BuildOutput, ServiceError> {
        let feed = CsvMatchFeed::new(self.config.data.matches_path.clone());
        let output = self.build(feed, order).await?;
        self.write_artifacts(&output)?;
        Ok(output)
    }

    /// Derive ratings, head-to-head counts and profiles from a feed
    pub async fn build<F>(
        &self,
        feed: F,
        order: FeedOrder,
    ) -> std::result::Result<BuildOutput, ServiceError>
    where
        F: MatchFeed + 'static,
    {
        info!("Starting build");

        let batch = tokio::task::spawn_blocking(move || feed.load())
            .await
            .map_err(|e| ServiceError::BackgroundTask {
                message: format!("Feed task failed: {}", e),
            })?
            .map_err(|e| ServiceError::Feed {
                message: format!("{:#}", e),
            })?;
        self.metrics.record_feed(&batch.summary, batch.matches.len());

        let matches = match order {
            FeedOrder::Sort => batch.chronological(),
            FeedOrder::Strict => ChronologicalMatches::try_from_sorted(
                batch
                    .matches
                    .iter()
                    .map(|feed_match| feed_match.record.clone())
                    .collect(),
            )
            .map_err(|e| ServiceError::Feed {
                message: format!("{:#}", e),
            })?,
        };
        let matches = Arc::new(matches);
        info!(
            "Feed holds {} matches between {} players ({:?} to {:?})",
            matches.len(),
            matches.players().len(),
            matches.first_date(),
            matches.last_date()
        );

        let ratings_task = {
            let matches = matches.clone();
            let metrics = self.metrics.clone();
            let rating_config = self.config.rating.clone();
            tokio::task::spawn_blocking(move || -> Result<RatingOutcome> {
                let timer = metrics.start_timer();
                let engine = RatingEngine::for_matches(&rating_config, &matches)?;
                let summary = engine.replay(&matches)?;
                let table = engine.export_table()?;
                let players = engine.player_count()?;

                metrics.record_replay(&matches, &summary, timer.stop());
                metrics.update_rating_table(players, table.len());
                Ok(RatingOutcome {
                    table,
                    summary,
                    players,
                })
            })
        };

        let head_to_head_task = {
            let matches = matches.clone();
            let metrics = self.metrics.clone();
            tokio::task::spawn_blocking(move || -> Result<HeadToHeadMatrix> {
                let timer = metrics.start_timer();
                let matrix = HeadToHeadMatrix::build(matches.players(), &*matches)?;
                metrics.record_head_to_head(&matrix, timer.stop());
                Ok(matrix)
            })
        };

        let (ratings, head_to_head) = tokio::try_join!(ratings_task, head_to_head_task)
            .map_err(|e| ServiceError::BackgroundTask {
                message: format!("Build task failed: {}", e),
            })?;
        let ratings = ratings.map_err(|e| ServiceError::BackgroundTask {
            message: format!("Rating replay failed: {:#}", e),
        })?;
        let head_to_head = head_to_head.map_err(|e| ServiceError::BackgroundTask {
            message: format!("Head-to-head build failed: {:#}", e),
        })?;

        let player_matches = build_player_matches(&batch.matches);
        let profiles = latest_profiles(&player_matches);
        debug!(
            "Built {} player match rows and {} profiles",
            player_matches.len(),
            profiles.len()
        );

        let report = BuildReport {
            feed: batch.summary,
            matches: matches.len(),
            players: ratings.players,
            replay: ratings.summary,
            rating_rows: ratings.table.len(),
            profiles: profiles.len(),
        };

        info!(
            "Build finished: {} matches, {} players, {} rating rows",
            report.matches, report.players, report.rating_rows
        );

        Ok(BuildOutput {
            ratings: ratings.table,
            head_to_head,
            player_matches,
            profiles,
            report,
        })
    }

    /// Write the derived tables (and metrics, if enabled) to the output directory
    pub fn write_artifacts(
        &self,
        output: &BuildOutput,
    ) -> std::result::Result<Vec<PathBuf>, ServiceError> {
        let artifact_error = |e: anyhow::Error| ServiceError::Artifact {
            message: format!("{:#}", e),
        };

        let output_dir = &self.config.data.output_dir;
        std::fs::create_dir_all(output_dir).map_err(|e| ServiceError::Artifact {
            message: format!(
                "Failed to create output directory {}: {}",
                output_dir.display(),
                e
            ),
        })?;

        let mut written = Vec::new();

        let path = self.config.ratings_path();
        output.ratings.to_csv(&path).map_err(artifact_error)?;
        written.push(path);

        let path = self.config.head_to_head_path();
        output.head_to_head.to_csv(&path).map_err(artifact_error)?;
        written.push(path);

        let path = self.config.player_matches_path();
        save_player_matches(&path, &output.player_matches).map_err(artifact_error)?;
        written.push(path);

        let path = self.config.player_profiles_path();
        save_profiles(&path, &output.profiles).map_err(artifact_error)?;
        written.push(path);

        if self.config.output.write_metrics {
            let path = self.config.metrics_path();
            let text = self.metrics.render().map_err(artifact_error)?;
            std::fs::write(&path, text).map_err(|e| ServiceError::Artifact {
                message: format!("Failed to write metrics {}: {}", path.display(), e),
            })?;
            written.push(path);
        }

        info!(
            "Wrote {} artifacts to {}",
            written.len(),
            output_dir.display()
        );
        Ok(written)
    }

    /// Load the exported rating table
    pub fn load_ratings(&self) -> Result<RatingTable> {
        RatingTable::from_csv(&self.config.ratings_path())
    }

    /// Load the exported head-to-head matrix
    pub fn load_head_to_head(&self) -> Result<HeadToHeadMatrix> {
        HeadToHeadMatrix::from_csv(&self.config.head_to_head_path())
    }

    /// Load the exported per-player match history
    pub fn load_player_matches(&self) -> Result<Vec<PlayerMatch>> {
        load_player_matches(&self.config.player_matches_path())
    }

    /// Probability that `player_a` beats `player_b` on `surface`
    ///
    /// With `fallback_overall`, a missing surface rating is retried on the
    /// Overall track. Any other failure is returned unchanged.
    pub fn predict(
        ratings: &RatingTable,
        player_a: PlayerId,
        player_b: PlayerId,
        surface: Surface,
        fallback_overall: bool,
    ) -> Result<Prediction> {
        let (used, probability) = match ratings.predict(player_a, player_b, surface) {
            Ok(probability) => (surface, probability),
            Err(e) if fallback_overall && !surface.is_overall() && is_missing_surface(&e) => {
                warn!("{}; falling back to {}", e, Surface::Overall);
                (
                    Surface::Overall,
                    ratings.predict(player_a, player_b, Surface::Overall)?,
                )
            }
            Err(e) => return Err(e),
        };

        Ok(Prediction {
            player_a,
            player_b,
            requested_surface: surface,
            surface: used,
            probability,
        })
    }

    /// Wins of each player over the other
    pub fn head_to_head(
        matrix: &HeadToHeadMatrix,
        player_a: PlayerId,
        player_b: PlayerId,
    ) -> Result<HeadToHeadRecord> {
        Ok(HeadToHeadRecord {
            player_a,
            player_b,
            a_wins: matrix.lookup(player_a, player_b)?,
            b_wins: matrix.lookup(player_b, player_a)?,
        })
    }

    /// Career statistics of one player from the exported history
    pub fn player_stats(
        &self,
        player_id: PlayerId,
        recent_window: Option<usize>,
    ) -> Result<PlayerStats> {
        let window = recent_window.unwrap_or(self.config.stats.recent_form_window);
        if window == 0 {
            return Err(RatingError::ConfigurationError {
                message: "Recent form window must be at least 1".to_string(),
            }
            .into());
        }
        let history = self.load_player_matches()?;
        player_stats(player_id, &history, window)
            .ok_or_else(|| RatingError::UnknownPlayer { player_id }.into())
    }

    /// Last date covered by the exported rating table
    pub fn ratings_as_of(ratings: &RatingTable) -> Option<NaiveDate> {
        ratings.rows().iter().map(|row| row.last_updated).max()
    }
}

fn is_missing_surface(error: &anyhow::Error) -> bool {
    matches!(
        rating_error(error),
        Some(RatingError::MissingSurfaceRating { .. })
    )
}
