//! Rating engine: replays match history into per-surface Elo tracks
//!
//! Every match moves two independent tracks: the surface it was played on and
//! the synthetic Overall track. The engine owns its storage and is built
//! already initialized, so there is no window in which an update can run
//! against a half-populated table.

use crate::config::RatingConfig;
use crate::error::{RatingError, Result};
use crate::feed::ChronologicalMatches;
use crate::rating::calculator::RatingCalculator;
use crate::rating::elo::EloRatingCalculator;
use crate::rating::storage::{InMemoryRatingStorage, RatingEntry, RatingStorage};
use crate::rating::table::RatingTable;
use crate::types::{MatchRecord, PlayerId, RatingRow, Surface};
use anyhow::Context;
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeSet;
use tracing::{debug, info};

/// How often replay progress is logged
const PROGRESS_INTERVAL: usize = 1000;

/// Rating movement of one (player, surface) entry
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RatingChange {
    pub player_id: PlayerId,
    pub surface: Surface,
    pub old_rating: f64,
    pub new_rating: f64,
}

impl RatingChange {
    pub fn delta(&self) -> f64 {
        self.new_rating - self.old_rating
    }
}

/// Update applied to one rating track by one match
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrackUpdate {
    pub surface: Surface,
    /// Pre-match probability that the winner would win on this track
    pub winner_expected: f64,
    pub winner: RatingChange,
    pub loser: RatingChange,
}

/// Everything one replayed match changed
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchUpdate {
    pub date: NaiveDate,
    pub surface_track: TrackUpdate,
    pub overall_track: TrackUpdate,
}

impl MatchUpdate {
    /// The four entries this match moved
    pub fn changes(&self) -> [&RatingChange; 4] {
        [
            &self.surface_track.winner,
            &self.surface_track.loser,
            &self.overall_track.winner,
            &self.overall_track.loser,
        ]
    }
}

/// Summary of a full replay
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ReplaySummary {
    pub matches_replayed: usize,
    pub entries_updated: usize,
    pub first_date: Option<NaiveDate>,
    pub last_date: Option<NaiveDate>,
}

/// Stateful replay of match history into rating entries
#[derive(Debug)]
pub struct RatingEngine<S = InMemoryRatingStorage, C = EloRatingCalculator> {
    storage: S,
    calculator: C,
    surfaces: BTreeSet<Surface>,
}

impl RatingEngine<InMemoryRatingStorage, EloRatingCalculator> {
    /// Build an in-memory Elo engine for the given players and surfaces
    pub fn with_config(
        config: &RatingConfig,
        players: impl IntoIterator<Item = PlayerId>,
        surfaces: impl IntoIterator<Item = Surface>,
    ) -> Result<Self> {
        let calculator = EloRatingCalculator::new(config.clone())?;
        Self::initialize(InMemoryRatingStorage::new(), calculator, players, surfaces)
    }

    /// Build an in-memory Elo engine covering every player and surface of
    /// `matches`
    pub fn for_matches(config: &RatingConfig, matches: &ChronologicalMatches) -> Result<Self> {
        Self::with_config(config, matches.players(), matches.surfaces())
    }
}

impl<S: RatingStorage, C: RatingCalculator> RatingEngine<S, C> {
    /// Create one baseline entry per (player, surface), Overall included
    ///
    /// The storage must be empty: an engine is initialized exactly once.
    pub fn initialize(
        storage: S,
        calculator: C,
        players: impl IntoIterator<Item = PlayerId>,
        surfaces: impl IntoIterator<Item = Surface>,
    ) -> Result<Self> {
        if storage.get_entry_count()? > 0 {
            return Err(RatingError::ConfigurationError {
                message: "Rating storage must be empty before initialization".to_string(),
            }
            .into());
        }

        let mut surfaces: BTreeSet<Surface> = surfaces.into_iter().collect();
        surfaces.insert(Surface::Overall);
        let players: BTreeSet<PlayerId> = players.into_iter().collect();

        let initial_rating = calculator.initial_rating();
        let entries: Vec<RatingEntry> = players
            .iter()
            .flat_map(|player_id| {
                surfaces
                    .iter()
                    .map(move |surface| RatingEntry::new(*player_id, *surface, initial_rating))
            })
            .collect();

        info!(
            "Initializing {} rating entries for {} players on {} surfaces at {}",
            entries.len(),
            players.len(),
            surfaces.len(),
            initial_rating
        );
        storage.store_entries(entries)?;

        Ok(Self {
            storage,
            calculator,
            surfaces,
        })
    }

    /// Surfaces with a rating track, Overall included
    pub fn surfaces(&self) -> &BTreeSet<Surface> {
        &self.surfaces
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn calculator(&self) -> &C {
        &self.calculator
    }

    pub fn player_count(&self) -> Result<usize> {
        self.storage.get_player_count()
    }

    /// Apply one match to its surface track and to the Overall track
    ///
    /// Matches must arrive in non-decreasing date order; this is not checked
    /// here. If any of the four entries is missing nothing is written.
    pub fn replay_match(&self, record: &MatchRecord) -> Result<MatchUpdate> {
        let winner_surface = self.entry(record.winner_id(), record.surface())?;
        let loser_surface = self.entry(record.loser_id(), record.surface())?;
        let winner_overall = self.entry(record.winner_id(), Surface::Overall)?;
        let loser_overall = self.entry(record.loser_id(), Surface::Overall)?;

        let date = record.date();
        let (surface_track, surface_entries) =
            self.update_track(winner_surface, loser_surface, date);
        let (overall_track, overall_entries) =
            self.update_track(winner_overall, loser_overall, date);

        let [a, b] = surface_entries;
        let [c, d] = overall_entries;
        self.storage.store_entries(vec![a, b, c, d])?;

        Ok(MatchUpdate {
            date,
            surface_track,
            overall_track,
        })
    }

    /// Replay a whole date-ordered match history
    ///
    /// Stops at the first match that cannot be applied; every match before it
    /// stays applied.
    pub fn replay(&self, matches: &ChronologicalMatches) -> Result<ReplaySummary> {
        let mut summary = ReplaySummary {
            first_date: matches.first_date(),
            last_date: matches.last_date(),
            ..ReplaySummary::default()
        };

        for (index, record) in matches.iter().enumerate() {
            self.replay_match(record).with_context(|| {
                format!(
                    "Failed to replay match #{} ({} beat {} on {} at {})",
                    index,
                    record.winner_id(),
                    record.loser_id(),
                    record.surface(),
                    record.date()
                )
            })?;
            summary.matches_replayed += 1;
            summary.entries_updated += 4;

            if summary.matches_replayed % PROGRESS_INTERVAL == 0 {
                debug!(
                    "Replayed {}/{} matches (at {})",
                    summary.matches_replayed,
                    matches.len(),
                    record.date()
                );
            }
        }

        info!(
            "Replayed {} matches from {:?} to {:?}",
            summary.matches_replayed, summary.first_date, summary.last_date
        );
        Ok(summary)
    }

    /// Current rating of a player on a surface
    pub fn current_rating(&self, player_id: PlayerId, surface: Surface) -> Result<f64> {
        Ok(self.entry(player_id, surface)?.rating)
    }

    /// Full rating entry of a player on a surface
    pub fn entry(&self, player_id: PlayerId, surface: Surface) -> Result<RatingEntry> {
        if let Some(entry) = self.storage.get_entry(player_id, surface)? {
            return Ok(entry);
        }
        if self.storage.contains_player(player_id)? {
            Err(RatingError::MissingSurfaceRating { player_id, surface }.into())
        } else {
            Err(RatingError::UnknownPlayer { player_id }.into())
        }
    }

    /// Rows for every entry a match has touched, ordered by player then surface
    pub fn export(&self) -> Result<Vec<RatingRow>> {
        let mut rows: Vec<RatingRow> = self
            .storage
            .get_all_entries()?
            .iter()
            .filter_map(RatingEntry::to_row)
            .collect();
        rows.sort_by_key(|row| (row.player_id, row.surface));
        Ok(rows)
    }

    /// Snapshot of the exported rows, ready for predictions
    pub fn export_table(&self) -> Result<RatingTable> {
        Ok(RatingTable::from_rows(self.export()?))
    }

    fn update_track(
        &self,
        mut winner: RatingEntry,
        mut loser: RatingEntry,
        date: NaiveDate,
    ) -> (TrackUpdate, [RatingEntry; 2]) {
        let update = self.calculator.rate_win(winner.rating, loser.rating);

        let track = TrackUpdate {
            surface: winner.surface,
            winner_expected: update.winner_expected,
            winner: RatingChange {
                player_id: winner.player_id,
                surface: winner.surface,
                old_rating: winner.rating,
                new_rating: update.winner_rating,
            },
            loser: RatingChange {
                player_id: loser.player_id,
                surface: loser.surface,
                old_rating: loser.rating,
                new_rating: update.loser_rating,
            },
        };

        winner.update_rating(update.winner_rating, date);
        loser.update_rating(update.loser_rating, date);
        (track, [winner, loser])
    }
}
