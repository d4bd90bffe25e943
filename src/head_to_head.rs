//! Head-to-head win counts between every ordered pair of players
//!
//! Cell (a, b) holds how many times `a` beat `b`. The diagonal carries the
//! `SELF_PAIR` marker. The matrix is rebuilt from scratch on every refresh and
//! never reads rating state.

use crate::error::{RatingError, Result};
use crate::types::{MatchRecord, PlayerId};
use anyhow::Context;
use std::collections::{BTreeSet, HashMap};
use std::io::{Read, Write};
use std::path::Path;
use tracing::info;

/// Diagonal marker: a player never plays themselves
pub const SELF_PAIR: i64 = -1;

/// Dense square count matrix over a fixed player set
#[derive(Debug, Clone, PartialEq)]
pub struct HeadToHeadMatrix {
    players: Vec<PlayerId>,
    index: HashMap<PlayerId, usize>,
    cells: Vec<i64>,
}

impl HeadToHeadMatrix {
    /// Empty matrix over `players`: diagonal marked, everything else zero
    pub fn new(players: impl IntoIterator<Item = PlayerId>) -> Self {
        let players: Vec<PlayerId> = players
            .into_iter()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let index = players
            .iter()
            .enumerate()
            .map(|(position, player_id)| (*player_id, position))
            .collect();

        let size = players.len();
        let mut cells = vec![0; size * size];
        for position in 0..size {
            cells[position * size + position] = SELF_PAIR;
        }

        Self {
            players,
            index,
            cells,
        }
    }

    /// Count every match into a fresh matrix over `players`
    ///
    /// Fails without returning a partial matrix if a match names a player
    /// outside the set. The result does not depend on match order.
    pub fn build<'a>(
        players: impl IntoIterator<Item = PlayerId>,
        matches: impl IntoIterator<Item = &'a MatchRecord>,
    ) -> Result<Self> {
        let mut matrix = Self::new(players);
        let mut counted = 0usize;
        for record in matches {
            matrix.record_win(record)?;
            counted += 1;
        }
        info!(
            "Built head-to-head matrix over {} players from {} matches",
            matrix.player_count(),
            counted
        );
        Ok(matrix)
    }

    fn record_win(&mut self, record: &MatchRecord) -> Result<()> {
        let winner = self.position(record.winner_id())?;
        let loser = self.position(record.loser_id())?;
        // MatchRecord guarantees winner != loser, so the diagonal is never hit
        self.cells[winner * self.players.len() + loser] += 1;
        Ok(())
    }

    fn position(&self, player_id: PlayerId) -> Result<usize> {
        self.index
            .get(&player_id)
            .copied()
            .ok_or_else(|| RatingError::UnknownPlayer { player_id }.into())
    }

    /// Wins of `row` over `column`, or `SELF_PAIR` when they are the same player
    pub fn lookup(&self, row: PlayerId, column: PlayerId) -> Result<i64> {
        let row_position = self.position(row)?;
        let column_position = self.position(column)?;
        Ok(self.cells[row_position * self.players.len() + column_position])
    }

    /// Players covered by the matrix, ascending
    pub fn players(&self) -> &[PlayerId] {
        &self.players
    }

    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    pub fn contains_player(&self, player_id: PlayerId) -> bool {
        self.index.contains_key(&player_id)
    }

    /// Total wins over every pair
    ///
    /// Diagonal cells hold `SELF_PAIR` and are not counted.
    pub fn total_wins(&self) -> i64 {
        self.cells.iter().filter(|count| **count > 0).sum()
    }

    /// Write the dense matrix: empty corner cell, player ids across the top,
    /// one row per player starting with its id
    pub fn write_to<W: Write>(&self, writer: W) -> Result<()> {
        let mut writer = csv::Writer::from_writer(writer);

        let mut header = Vec::with_capacity(self.players.len() + 1);
        header.push(String::new());
        header.extend(self.players.iter().map(|player_id| player_id.to_string()));
        writer
            .write_record(&header)
            .context("Failed to write head-to-head header")?;

        let size = self.players.len();
        for (position, player_id) in self.players.iter().enumerate() {
            let mut record = Vec::with_capacity(size + 1);
            record.push(player_id.to_string());
            record.extend(
                self.cells[position * size..(position + 1) * size]
                    .iter()
                    .map(|count| count.to_string()),
            );
            writer
                .write_record(&record)
                .context("Failed to write head-to-head row")?;
        }
        writer.flush().context("Failed to flush head-to-head matrix")?;
        Ok(())
    }

    /// Parse a dense matrix written by `write_to`
    pub fn read_from<R: Read>(reader: R) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new().has_headers(false).from_reader(reader);
        let mut records = reader.records();

        let header = records
            .next()
            .ok_or_else(|| malformed("head-to-head matrix is empty".to_string()))?
            .map_err(|e| malformed(format!("head-to-head header: {}", e)))?;
        let players = header
            .iter()
            .skip(1)
            .map(parse_id)
            .collect::<Result<Vec<PlayerId>>>()?;

        let mut matrix = Self::new(players.iter().copied());
        if matrix.players != players {
            return Err(malformed(
                "head-to-head header must list unique ids in ascending order".to_string(),
            ));
        }

        let size = players.len();
        let mut rows_read = 0usize;
        for (position, record) in records.enumerate() {
            let record = record.map_err(|e| malformed(format!("head-to-head row: {}", e)))?;
            if position >= size || record.len() != size + 1 {
                return Err(malformed(format!(
                    "head-to-head row {} does not fit a {}x{} matrix",
                    position + 1,
                    size,
                    size
                )));
            }
            if parse_id(&record[0])? != players[position] {
                return Err(malformed(format!(
                    "head-to-head row {} is labelled {}, expected {}",
                    position + 1,
                    &record[0],
                    players[position]
                )));
            }
            for (column, cell) in record.iter().skip(1).enumerate() {
                let count: i64 = cell
                    .trim()
                    .parse()
                    .map_err(|_| malformed(format!("head-to-head count {:?}", cell)))?;
                let valid = if column == position {
                    count == SELF_PAIR
                } else {
                    count >= 0
                };
                if !valid {
                    return Err(malformed(format!(
                        "head-to-head cell ({}, {}) holds {}",
                        players[position], players[column], count
                    )));
                }
                matrix.cells[position * size + column] = count;
            }
            rows_read += 1;
        }

        if rows_read != size {
            return Err(malformed(format!(
                "head-to-head matrix has {} rows for {} players",
                rows_read, size
            )));
        }
        Ok(matrix)
    }

    pub fn from_csv(path: &Path) -> Result<Self> {
        info!("Loading head-to-head matrix from: {}", path.display());
        let file = std::fs::File::open(path)
            .with_context(|| format!("Failed to open head-to-head matrix {}", path.display()))?;
        Self::read_from(file)
    }

    pub fn to_csv(&self, path: &Path) -> Result<()> {
        let file = std::fs::File::create(path)
            .with_context(|| format!("Failed to create head-to-head matrix {}", path.display()))?;
        self.write_to(file)?;
        info!(
            "Wrote {}x{} head-to-head matrix to {}",
            self.player_count(),
            self.player_count(),
            path.display()
        );
        Ok(())
    }
}

fn parse_id(value: &str) -> Result<PlayerId> {
    value
        .trim()
        .parse()
        .map_err(|_| malformed(format!("head-to-head player id {:?}", value)))
}

fn malformed(message: String) -> anyhow::Error {
    RatingError::MalformedArtifact { message }.into()
}
