//! Metrics collection using Prometheus
//!
//! This module provides metrics for one build run of the rating service:
//! feed ingestion, rating replay and the head-to-head build.

use crate::feed::{ChronologicalMatches, FeedSummary};
use crate::head_to_head::HeadToHeadMatrix;
use crate::rating::ReplaySummary;
use anyhow::Result;
use prometheus::{
    Encoder, Histogram, HistogramOpts, IntCounter, IntCounterVec, IntGauge, Opts, Registry,
    TextEncoder,
};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Main metrics collector for the rating service
#[derive(Clone)]
pub struct MetricsCollector {
    /// Prometheus registry
    registry: Arc<Registry>,

    /// Feed ingestion metrics
    feed_metrics: FeedMetrics,

    /// Rating replay metrics
    replay_metrics: ReplayMetrics,

    /// Head-to-head metrics
    head_to_head_metrics: HeadToHeadMetrics,
}

/// Feed ingestion metrics
#[derive(Clone)]
pub struct FeedMetrics {
    /// Feed rows read, valid or not
    pub rows_read_total: IntCounter,

    /// Feed rows skipped, by reason
    pub rows_skipped_total: IntCounterVec,

    /// Feed rows accepted as matches
    pub matches_accepted_total: IntCounter,
}

/// Rating replay metrics
#[derive(Clone)]
pub struct ReplayMetrics {
    /// Matches replayed, by surface
    pub matches_replayed_total: IntCounterVec,

    /// Rating entries moved by replay
    pub rating_updates_total: IntCounter,

    /// Wall time of a full replay
    pub replay_duration: Histogram,

    /// Players with at least one rating entry
    pub rated_players: IntGauge,

    /// Rows in the exported rating table
    pub exported_rows: IntGauge,
}

/// Head-to-head metrics
#[derive(Clone)]
pub struct HeadToHeadMetrics {
    /// Wall time of a matrix build
    pub build_duration: Histogram,

    /// Players covered by the matrix
    pub matrix_players: IntGauge,

    /// Wins counted into the matrix
    pub wins_counted: IntGauge,
}

impl MetricsCollector {
    /// Create a new metrics collector with default registry
    pub fn new() -> Result<Self> {
        let registry = Arc::new(Registry::new());
        Self::with_registry(registry)
    }

    /// Create a new metrics collector with custom registry
    pub fn with_registry(registry: Arc<Registry>) -> Result<Self> {
        let feed_metrics = FeedMetrics::new(&registry)?;
        let replay_metrics = ReplayMetrics::new(&registry)?;
        let head_to_head_metrics = HeadToHeadMetrics::new(&registry)?;

        Ok(Self {
            registry,
            feed_metrics,
            replay_metrics,
            head_to_head_metrics,
        })
    }

    /// Get the Prometheus registry
    pub fn registry(&self) -> Arc<Registry> {
        self.registry.clone()
    }

    pub fn feed(&self) -> &FeedMetrics {
        &self.feed_metrics
    }

    pub fn replay(&self) -> &ReplayMetrics {
        &self.replay_metrics
    }

    pub fn head_to_head(&self) -> &HeadToHeadMetrics {
        &self.head_to_head_metrics
    }

    /// Record the row accounting of one feed load
    pub fn record_feed(&self, summary: &FeedSummary, accepted: usize) {
        self.feed_metrics
            .rows_read_total
            .inc_by(summary.rows_read as u64);
        self.feed_metrics
            .matches_accepted_total
            .inc_by(accepted as u64);

        for (reason, count) in &summary.skipped {
            self.feed_metrics
                .rows_skipped_total
                .with_label_values(&[reason.as_str()])
                .inc_by(*count as u64);
        }
    }

    /// Record a completed replay
    pub fn record_replay(
        &self,
        matches: &ChronologicalMatches,
        summary: &ReplaySummary,
        duration: Duration,
    ) {
        for record in matches.iter().take(summary.matches_replayed) {
            self.replay_metrics
                .matches_replayed_total
                .with_label_values(&[record.surface().as_str()])
                .inc();
        }

        self.replay_metrics
            .rating_updates_total
            .inc_by(summary.entries_updated as u64);

        self.replay_metrics
            .replay_duration
            .observe(duration.as_secs_f64());
    }

    /// Update the rating table size gauges
    pub fn update_rating_table(&self, rated_players: usize, exported_rows: usize) {
        self.replay_metrics.rated_players.set(rated_players as i64);
        self.replay_metrics.exported_rows.set(exported_rows as i64);
    }

    /// Record a completed head-to-head build
    pub fn record_head_to_head(&self, matrix: &HeadToHeadMatrix, duration: Duration) {
        self.head_to_head_metrics
            .build_duration
            .observe(duration.as_secs_f64());
        self.head_to_head_metrics
            .matrix_players
            .set(matrix.player_count() as i64);
        self.head_to_head_metrics
            .wins_counted
            .set(matrix.total_wins());
    }

    /// Render every registered metric in the Prometheus text format
    pub fn render(&self) -> Result<String> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }

    /// Create a timer for measuring operation duration
    pub fn start_timer(&self) -> MetricsTimer {
        MetricsTimer::new()
    }
}

/// Timer for measuring operation durations
pub struct MetricsTimer {
    start: Instant,
}

impl MetricsTimer {
    fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    /// Get the elapsed duration
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Stop the timer and return the duration
    pub fn stop(self) -> Duration {
        self.elapsed()
    }
}

impl FeedMetrics {
    fn new(registry: &Registry) -> Result<Self> {
        let rows_read_total =
            IntCounter::new("court_ratings_feed_rows_read_total", "Feed rows read")?;
        registry.register(Box::new(rows_read_total.clone()))?;

        let rows_skipped_total = IntCounterVec::new(
            Opts::new(
                "court_ratings_feed_rows_skipped_total",
                "Feed rows skipped by reason",
            ),
            &["reason"],
        )?;
        registry.register(Box::new(rows_skipped_total.clone()))?;

        let matches_accepted_total = IntCounter::new(
            "court_ratings_feed_matches_accepted_total",
            "Feed rows accepted as matches",
        )?;
        registry.register(Box::new(matches_accepted_total.clone()))?;

        Ok(Self {
            rows_read_total,
            rows_skipped_total,
            matches_accepted_total,
        })
    }
}

impl ReplayMetrics {
    fn new(registry: &Registry) -> Result<Self> {
        let matches_replayed_total = IntCounterVec::new(
            Opts::new(
                "court_ratings_matches_replayed_total",
                "Matches replayed by surface",
            ),
            &["surface"],
        )?;
        registry.register(Box::new(matches_replayed_total.clone()))?;

        let rating_updates_total = IntCounter::new(
            "court_ratings_rating_updates_total",
            "Rating entries moved by replay",
        )?;
        registry.register(Box::new(rating_updates_total.clone()))?;

        let replay_duration = Histogram::with_opts(
            HistogramOpts::new(
                "court_ratings_replay_duration_seconds",
                "Full replay time",
            )
            .buckets(vec![0.01, 0.05, 0.1, 0.5, 1.0, 5.0, 10.0, 30.0]),
        )?;
        registry.register(Box::new(replay_duration.clone()))?;

        let rated_players = IntGauge::new(
            "court_ratings_rated_players",
            "Players with rating entries",
        )?;
        registry.register(Box::new(rated_players.clone()))?;

        let exported_rows = IntGauge::new(
            "court_ratings_exported_rating_rows",
            "Rows in the exported rating table",
        )?;
        registry.register(Box::new(exported_rows.clone()))?;

        Ok(Self {
            matches_replayed_total,
            rating_updates_total,
            replay_duration,
            rated_players,
            exported_rows,
        })
    }
}

impl HeadToHeadMetrics {
    fn new(registry: &Registry) -> Result<Self> {
        let build_duration = Histogram::with_opts(
            HistogramOpts::new(
                "court_ratings_head_to_head_build_duration_seconds",
                "Head-to-head matrix build time",
            )
            .buckets(vec![0.01, 0.05, 0.1, 0.5, 1.0, 5.0, 10.0]),
        )?;
        registry.register(Box::new(build_duration.clone()))?;

        let matrix_players = IntGauge::new(
            "court_ratings_head_to_head_players",
            "Players covered by the head-to-head matrix",
        )?;
        registry.register(Box::new(matrix_players.clone()))?;

        let wins_counted = IntGauge::new(
            "court_ratings_head_to_head_wins",
            "Wins counted into the head-to-head matrix",
        )?;
        registry.register(Box::new(wins_counted.clone()))?;

        Ok(Self {
            build_duration,
            matrix_players,
            wins_counted,
        })
    }
}
