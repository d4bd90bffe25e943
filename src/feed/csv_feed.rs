//! CSV match feed in the ATP `matches.csv` column layout

use super::{FeedBatch, FeedMatch, FeedSummary, MatchFeed, PlayerSide, SkipReason};
use crate::error::{RatingError, Result};
use crate::types::{MatchRecord, PlayerId, Surface};
use crate::utils::parse_feed_date;
use anyhow::Context;
use serde::Deserialize;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Raw feed row. Columns not listed here are ignored.
///
/// Only the four match columns can reject a row. Unparseable profile numbers
/// read as missing.
#[derive(Debug, Clone, Deserialize)]
struct FeedRow {
    winner_id: PlayerId,
    loser_id: PlayerId,
    surface: Option<String>,
    tourney_date: String,
    winner_name: Option<String>,
    winner_hand: Option<String>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    winner_ht: Option<f64>,
    winner_ioc: Option<String>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    winner_age: Option<f64>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    winner_rank: Option<u32>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    winner_rank_points: Option<u32>,
    loser_name: Option<String>,
    loser_hand: Option<String>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    loser_ht: Option<f64>,
    loser_ioc: Option<String>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    loser_age: Option<f64>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    loser_rank: Option<u32>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    loser_rank_points: Option<u32>,
}

impl FeedRow {
    fn into_feed_match(self) -> std::result::Result<FeedMatch, SkipReason> {
        let label = self
            .surface
            .as_deref()
            .map(str::trim)
            .filter(|label| !label.is_empty())
            .ok_or(SkipReason::MissingSurface)?;
        let surface: Surface = label.parse().map_err(|_| SkipReason::UnknownSurface)?;
        if surface.is_overall() {
            return Err(SkipReason::UnknownSurface);
        }
        let date = parse_feed_date(&self.tourney_date).map_err(|_| SkipReason::InvalidDate)?;
        let record = MatchRecord::new(self.winner_id, self.loser_id, surface, date)
            .map_err(|_| SkipReason::SelfMatch)?;

        Ok(FeedMatch {
            record,
            winner: PlayerSide {
                name: non_empty(self.winner_name),
                hand: non_empty(self.winner_hand),
                height: self.winner_ht,
                country: non_empty(self.winner_ioc),
                age: self.winner_age,
                rank: self.winner_rank,
                rank_points: self.winner_rank_points,
            },
            loser: PlayerSide {
                name: non_empty(self.loser_name),
                hand: non_empty(self.loser_hand),
                height: self.loser_ht,
                country: non_empty(self.loser_ioc),
                age: self.loser_age,
                rank: self.loser_rank,
                rank_points: self.loser_rank_points,
            },
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Match feed backed by a CSV file on disk
#[derive(Debug, Clone)]
pub struct CsvMatchFeed {
    path: PathBuf,
}

impl CsvMatchFeed {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Parse a feed from any reader
    ///
    /// Rows that cannot become a valid match are skipped and counted in the
    /// returned summary. A missing required column fails the whole read.
    pub fn read_from<R: Read>(reader: R) -> Result<FeedBatch> {
        let mut reader = csv::Reader::from_reader(reader);
        let headers = reader.headers().context("Failed to read feed header")?.clone();
        for required in ["winner_id", "loser_id", "surface", "tourney_date"] {
            if !headers.iter().any(|header| header == required) {
                return Err(RatingError::MalformedArtifact {
                    message: format!("match feed is missing the {} column", required),
                }
                .into());
            }
        }

        let mut matches = Vec::new();
        let mut summary = FeedSummary::default();

        for (line, row) in reader.deserialize::<FeedRow>().enumerate() {
            summary.rows_read += 1;
            let outcome = match row {
                Ok(row) => row.into_feed_match(),
                Err(e) => {
                    debug!("Unreadable feed row {}: {}", line + 1, e);
                    Err(SkipReason::Malformed)
                }
            };

            match outcome {
                Ok(feed_match) => matches.push(feed_match),
                Err(reason) => {
                    warn!("Skipping feed row {}: {}", line + 1, reason);
                    summary.record_skip(reason);
                }
            }
        }

        info!(
            "Read {} feed rows, accepted {}, skipped {}",
            summary.rows_read,
            matches.len(),
            summary.rows_skipped()
        );

        Ok(FeedBatch { matches, summary })
    }
}

impl MatchFeed for CsvMatchFeed {
    fn load(&self) -> Result<FeedBatch> {
        info!("Loading match feed from: {}", self.path.display());
        let file = std::fs::File::open(&self.path)
            .with_context(|| format!("Failed to open match feed {}", self.path.display()))?;
        Self::read_from(file)
    }
}
