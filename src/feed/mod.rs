//! Match feed: the source of played matches
//!
//! A feed produces match records plus the per-side profile details that came
//! with them. The core rating and head-to-head code only ever sees
//! `MatchRecord`s in a `ChronologicalMatches`.

pub mod csv_feed;
pub mod sorted;

pub use csv_feed::CsvMatchFeed;
pub use sorted::ChronologicalMatches;

use crate::error::Result;
use crate::types::MatchRecord;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// Profile details of one side of a match, as recorded at that match
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PlayerSide {
    pub name: Option<String>,
    pub hand: Option<String>,
    pub height: Option<f64>,
    pub country: Option<String>,
    pub age: Option<f64>,
    pub rank: Option<u32>,
    pub rank_points: Option<u32>,
}

/// A validated match together with both players' profile details
#[derive(Debug, Clone, PartialEq)]
pub struct FeedMatch {
    pub record: MatchRecord,
    pub winner: PlayerSide,
    pub loser: PlayerSide,
}

impl From<MatchRecord> for FeedMatch {
    fn from(record: MatchRecord) -> Self {
        Self {
            record,
            winner: PlayerSide::default(),
            loser: PlayerSide::default(),
        }
    }
}

/// Why a feed row was not turned into a match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum SkipReason {
    MissingSurface,
    UnknownSurface,
    InvalidDate,
    SelfMatch,
    Malformed,
}

impl SkipReason {
    pub fn as_str(self) -> &'static str {
        match self {
            SkipReason::MissingSurface => "missing_surface",
            SkipReason::UnknownSurface => "unknown_surface",
            SkipReason::InvalidDate => "invalid_date",
            SkipReason::SelfMatch => "self_match",
            SkipReason::Malformed => "malformed",
        }
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Row accounting for one feed load
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FeedSummary {
    pub rows_read: usize,
    pub skipped: BTreeMap<SkipReason, usize>,
}

impl FeedSummary {
    pub fn record_skip(&mut self, reason: SkipReason) {
        *self.skipped.entry(reason).or_insert(0) += 1;
    }

    pub fn rows_skipped(&self) -> usize {
        self.skipped.values().sum()
    }

    pub fn skipped_for(&self, reason: SkipReason) -> usize {
        self.skipped.get(&reason).copied().unwrap_or(0)
    }
}

/// Everything a feed produced in one load, in feed order
#[derive(Debug, Clone, Default)]
pub struct FeedBatch {
    pub matches: Vec<FeedMatch>,
    pub summary: FeedSummary,
}

impl FeedBatch {
    /// Date-ordered match records, ready for replay
    pub fn chronological(&self) -> ChronologicalMatches {
        ChronologicalMatches::from_unsorted(
            self.matches
                .iter()
                .map(|feed_match| feed_match.record.clone())
                .collect(),
        )
    }
}

/// Trait for sources of played matches
pub trait MatchFeed: Send + Sync {
    /// Load every match the feed currently holds
    fn load(&self) -> Result<FeedBatch>;
}

/// Feed over a fixed list of records, for tests and programmatic callers
#[derive(Debug, Clone, Default)]
pub struct StaticMatchFeed {
    matches: Vec<FeedMatch>,
}

impl StaticMatchFeed {
    pub fn new(records: Vec<MatchRecord>) -> Self {
        Self {
            matches: records.into_iter().map(FeedMatch::from).collect(),
        }
    }

    pub fn with_profiles(matches: Vec<FeedMatch>) -> Self {
        Self { matches }
    }
}

impl MatchFeed for StaticMatchFeed {
    fn load(&self) -> Result<FeedBatch> {
        Ok(FeedBatch {
            matches: self.matches.clone(),
            summary: FeedSummary {
                rows_read: self.matches.len(),
                skipped: BTreeMap::new(),
            },
        })
    }
}
