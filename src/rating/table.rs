//! Read-only rating table built from exported rows
//!
//! Predictions read from a snapshot of the export, never from a live engine.
//! The table is also the in-memory form of `player_ratings.csv`.

use crate::error::{RatingError, Result};
use crate::rating::elo::win_probability;
use crate::types::{PlayerId, RatingRow, Surface};
use anyhow::Context;
use std::collections::{HashMap, HashSet};
use std::io::{Read, Write};
use std::path::Path;
use tracing::{debug, info};

/// Snapshot of exported ratings keyed by (player, surface)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RatingTable {
    rows: HashMap<(PlayerId, Surface), RatingRow>,
    players: HashSet<PlayerId>,
}

impl RatingTable {
    /// Build a table from export rows; a later row for the same pair wins
    pub fn from_rows(rows: impl IntoIterator<Item = RatingRow>) -> Self {
        let mut table = Self::default();
        for row in rows {
            table.players.insert(row.player_id);
            table.rows.insert((row.player_id, row.surface), row);
        }
        table
    }

    /// All rows, ordered by player then surface
    pub fn rows(&self) -> Vec<&RatingRow> {
        let mut rows: Vec<&RatingRow> = self.rows.values().collect();
        rows.sort_by_key(|row| (row.player_id, row.surface));
        rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    pub fn contains_player(&self, player_id: PlayerId) -> bool {
        self.players.contains(&player_id)
    }

    /// Full row for a player on a surface
    pub fn row(&self, player_id: PlayerId, surface: Surface) -> Result<&RatingRow> {
        if let Some(row) = self.rows.get(&(player_id, surface)) {
            return Ok(row);
        }
        if self.players.contains(&player_id) {
            Err(RatingError::MissingSurfaceRating { player_id, surface }.into())
        } else {
            Err(RatingError::UnknownPlayer { player_id }.into())
        }
    }

    /// Rating of a player on a surface
    pub fn rating(&self, player_id: PlayerId, surface: Surface) -> Result<f64> {
        Ok(self.row(player_id, surface)?.rating)
    }

    /// Probability that `player_a` beats `player_b` on `surface`
    ///
    /// There is no implicit fallback: a player without a row on `surface`
    /// fails with `MissingSurfaceRating`.
    pub fn predict(&self, player_a: PlayerId, player_b: PlayerId, surface: Surface) -> Result<f64> {
        let rating_a = self.rating(player_a, surface)?;
        let rating_b = self.rating(player_b, surface)?;
        Ok(win_probability(rating_a, rating_b))
    }

    /// Parse a `player_ratings.csv` table from any reader
    pub fn read_from<R: Read>(reader: R) -> Result<Self> {
        let mut reader = csv::Reader::from_reader(reader);
        let mut rows = Vec::new();
        for (line, row) in reader.deserialize::<RatingRow>().enumerate() {
            let row = row.map_err(|e| RatingError::MalformedArtifact {
                message: format!("rating table row {}: {}", line + 1, e),
            })?;
            rows.push(row);
        }
        debug!("Read {} rating rows", rows.len());
        Ok(Self::from_rows(rows))
    }

    /// Write the table as CSV, ordered by player then surface
    pub fn write_to<W: Write>(&self, writer: W) -> Result<()> {
        let mut writer = csv::Writer::from_writer(writer);
        for row in self.rows() {
            writer
                .serialize(row)
                .context("Failed to serialize rating row")?;
        }
        writer.flush().context("Failed to flush rating table")?;
        Ok(())
    }

    pub fn from_csv(path: &Path) -> Result<Self> {
        info!("Loading rating table from: {}", path.display());
        let file = std::fs::File::open(path)
            .with_context(|| format!("Failed to open rating table {}", path.display()))?;
        Self::read_from(file)
    }

    pub fn to_csv(&self, path: &Path) -> Result<()> {
        let file = std::fs::File::create(path)
            .with_context(|| format!("Failed to create rating table {}", path.display()))?;
        self.write_to(file)?;
        info!("Wrote {} rating rows to {}", self.len(), path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::rating_error;
    use chrono::NaiveDate;

    const EPSILON: f64 = 1e-9;

    fn row(player_id: PlayerId, surface: Surface, rating: f64) -> RatingRow {
        RatingRow {
            player_id,
            surface,
            rating,
            last_updated: NaiveDate::from_ymd_opt(2021, 6, 14).unwrap(),
        }
    }

    fn table() -> RatingTable {
        RatingTable::from_rows(vec![
            row(1, Surface::Clay, 1516.0),
            row(1, Surface::Overall, 1516.0),
            row(2, Surface::Clay, 1484.0),
            row(2, Surface::Overall, 1484.0),
        ])
    }

    #[test]
    fn test_lookup() {
        let table = table();
        assert_eq!(table.len(), 4);
        assert_eq!(table.player_count(), 2);
        assert!(table.contains_player(2));
        assert!(!table.contains_player(3));
        assert_eq!(table.rating(2, Surface::Clay).unwrap(), 1484.0);
    }

    #[test]
    fn test_predict_is_complementary() {
        let table = table();
        let p = table.predict(1, 2, Surface::Clay).unwrap();
        let q = table.predict(2, 1, Surface::Clay).unwrap();
        assert!(p > 0.5);
        assert!((p + q - 1.0).abs() < EPSILON);
    }

    #[test]
    fn test_predict_equal_ratings() {
        let table = RatingTable::from_rows(vec![
            row(5, Surface::Grass, 1612.0),
            row(6, Surface::Grass, 1612.0),
        ]);
        assert!((table.predict(5, 6, Surface::Grass).unwrap() - 0.5).abs() < EPSILON);
    }

    #[test]
    fn test_predict_missing_surface() {
        let table = table();
        let error = table.predict(1, 2, Surface::Grass).unwrap_err();
        assert_eq!(
            rating_error(&error),
            Some(&RatingError::MissingSurfaceRating {
                player_id: 1,
                surface: Surface::Grass
            })
        );
        assert!(table.predict(1, 2, Surface::Overall).is_ok());
    }

    #[test]
    fn test_predict_unknown_player() {
        let error = table().predict(1, 99, Surface::Clay).unwrap_err();
        assert_eq!(
            rating_error(&error),
            Some(&RatingError::UnknownPlayer { player_id: 99 })
        );
    }

    #[test]
    fn test_csv_layout() {
        let mut buffer = Vec::new();
        table().write_to(&mut buffer).unwrap();
        let text = String::from_utf8(buffer).unwrap();

        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("id,surface,rating,last_updated"));
        assert_eq!(lines.next(), Some("1,Clay,1516.0,2021-06-14"));
        assert_eq!(text.lines().count(), 5);

        let restored = RatingTable::read_from(text.as_bytes()).unwrap();
        assert_eq!(restored, table());
    }

    #[test]
    fn test_malformed_table() {
        let text = "id,surface,rating,last_updated\n1,Sand,1500.0,2021-06-14\n";
        let error = RatingTable::read_from(text.as_bytes()).unwrap_err();
        assert!(matches!(
            rating_error(&error),
            Some(RatingError::MalformedArtifact { .. })
        ));
    }
}
