//! Per-player match history and latest profile snapshots

use crate::error::{RatingError, Result};
use crate::feed::{FeedMatch, PlayerSide};
use crate::types::{PlayerId, Surface};
use anyhow::Context;
use chrono::NaiveDate;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::{Read, Write};
use std::path::Path;
use tracing::info;

/// One match seen from one player's side
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerMatch {
    pub id: PlayerId,
    pub name: Option<String>,
    pub hand: Option<String>,
    pub height: Option<f64>,
    pub country: Option<String>,
    pub age: Option<f64>,
    pub date: NaiveDate,
    pub surface: Surface,
    pub rank: Option<u32>,
    pub points: Option<u32>,
    pub opponent_id: PlayerId,
    pub opponent_hand: Option<String>,
    pub won: bool,
}

impl PlayerMatch {
    fn from_side(
        player_id: PlayerId,
        side: &PlayerSide,
        opponent_id: PlayerId,
        opponent: &PlayerSide,
        feed_match: &FeedMatch,
        won: bool,
    ) -> Self {
        Self {
            id: player_id,
            name: side.name.clone(),
            hand: side.hand.clone(),
            height: side.height,
            country: side.country.clone(),
            age: side.age,
            date: feed_match.record.date(),
            surface: feed_match.record.surface(),
            rank: side.rank,
            points: side.rank_points,
            opponent_id,
            opponent_hand: opponent.hand.clone(),
            won,
        }
    }
}

/// Latest known display fields of a player
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlayerProfile {
    pub id: PlayerId,
    pub name: Option<String>,
    pub hand: Option<String>,
    pub height: Option<f64>,
    pub country: Option<String>,
    pub age: Option<f64>,
    pub rank: Option<u32>,
    pub points: Option<u32>,
}

impl PlayerProfile {
    fn new(id: PlayerId) -> Self {
        Self {
            id,
            ..Self::default()
        }
    }

    /// Overwrite every field the match carries a value for
    fn absorb(&mut self, record: &PlayerMatch) {
        if record.name.is_some() {
            self.name = record.name.clone();
        }
        if record.hand.is_some() {
            self.hand = record.hand.clone();
        }
        if record.country.is_some() {
            self.country = record.country.clone();
        }
        self.height = record.height.or(self.height);
        self.age = record.age.or(self.age);
        self.rank = record.rank.or(self.rank);
        self.points = record.points.or(self.points);
    }
}

/// Split every match into a winner record and a loser record, ordered by date
///
/// Records sharing a date keep feed order, winner side before loser side.
pub fn build_player_matches(matches: &[FeedMatch]) -> Vec<PlayerMatch> {
    let mut history: Vec<PlayerMatch> = matches
        .iter()
        .flat_map(|feed_match| {
            let winner_id = feed_match.record.winner_id();
            let loser_id = feed_match.record.loser_id();
            [
                PlayerMatch::from_side(
                    winner_id,
                    &feed_match.winner,
                    loser_id,
                    &feed_match.loser,
                    feed_match,
                    true,
                ),
                PlayerMatch::from_side(
                    loser_id,
                    &feed_match.loser,
                    winner_id,
                    &feed_match.winner,
                    feed_match,
                    false,
                ),
            ]
        })
        .collect();
    history.sort_by_key(|record| record.date);
    history
}

/// Most recent non-empty value of each display field, per player, by id
///
/// `history` is expected in date order, as `build_player_matches` returns it.
pub fn latest_profiles(history: &[PlayerMatch]) -> Vec<PlayerProfile> {
    let mut profiles: BTreeMap<PlayerId, PlayerProfile> = BTreeMap::new();
    for record in history {
        profiles
            .entry(record.id)
            .or_insert_with(|| PlayerProfile::new(record.id))
            .absorb(record);
    }
    profiles.into_values().collect()
}

/// Latest profile of one player, if they appear in `history`
///
/// Records are taken in date order whatever the order of `history`.
pub fn latest_profile(player_id: PlayerId, history: &[PlayerMatch]) -> Option<PlayerProfile> {
    let mut played: Vec<&PlayerMatch> = history
        .iter()
        .filter(|record| record.id == player_id)
        .collect();
    played.sort_by_key(|record| record.date);
    profile_from_sorted(player_id, &played)
}

/// Fold one player's date-ordered records into a profile
pub(super) fn profile_from_sorted(
    player_id: PlayerId,
    played: &[&PlayerMatch],
) -> Option<PlayerProfile> {
    let mut profile: Option<PlayerProfile> = None;
    for record in played {
        profile
            .get_or_insert_with(|| PlayerProfile::new(player_id))
            .absorb(record);
    }
    profile
}

fn write_rows<W: Write, T: Serialize>(writer: W, rows: &[T], what: &str) -> Result<()> {
    let mut writer = csv::Writer::from_writer(writer);
    for row in rows {
        writer
            .serialize(row)
            .with_context(|| format!("Failed to serialize {} row", what))?;
    }
    writer
        .flush()
        .with_context(|| format!("Failed to flush {}", what))?;
    Ok(())
}

fn read_rows<R: Read, T: DeserializeOwned>(reader: R, what: &str) -> Result<Vec<T>> {
    let mut reader = csv::Reader::from_reader(reader);
    let mut rows = Vec::new();
    for (line, row) in reader.deserialize::<T>().enumerate() {
        let row = row.map_err(|e| RatingError::MalformedArtifact {
            message: format!("{} row {}: {}", what, line + 1, e),
        })?;
        rows.push(row);
    }
    Ok(rows)
}

pub fn write_player_matches<W: Write>(writer: W, history: &[PlayerMatch]) -> Result<()> {
    write_rows(writer, history, "player match")
}

pub fn read_player_matches<R: Read>(reader: R) -> Result<Vec<PlayerMatch>> {
    read_rows(reader, "player match")
}

pub fn write_profiles<W: Write>(writer: W, profiles: &[PlayerProfile]) -> Result<()> {
    write_rows(writer, profiles, "player profile")
}

pub fn read_profiles<R: Read>(reader: R) -> Result<Vec<PlayerProfile>> {
    read_rows(reader, "player profile")
}

pub fn save_player_matches(path: &Path, history: &[PlayerMatch]) -> Result<()> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("Failed to create player matches {}", path.display()))?;
    write_player_matches(file, history)?;
    info!("Wrote {} player match rows to {}", history.len(), path.display());
    Ok(())
}

pub fn load_player_matches(path: &Path) -> Result<Vec<PlayerMatch>> {
    info!("Loading player matches from: {}", path.display());
    let file = std::fs::File::open(path)
        .with_context(|| format!("Failed to open player matches {}", path.display()))?;
    read_player_matches(file)
}

pub fn save_profiles(path: &Path, profiles: &[PlayerProfile]) -> Result<()> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("Failed to create player profiles {}", path.display()))?;
    write_profiles(file, profiles)?;
    info!("Wrote {} player profiles to {}", profiles.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::MatchRecord;

    fn side(name: &str, hand: &str, rank: Option<u32>) -> PlayerSide {
        PlayerSide {
            name: Some(name.to_string()),
            hand: Some(hand.to_string()),
            rank,
            ..PlayerSide::default()
        }
    }

    fn feed_match(winner: PlayerSide, loser: PlayerSide, ids: (PlayerId, PlayerId), day: u32) -> FeedMatch {
        FeedMatch {
            record: MatchRecord::new(
                ids.0,
                ids.1,
                Surface::Clay,
                NaiveDate::from_ymd_opt(2020, 9, day).unwrap(),
            )
            .unwrap(),
            winner,
            loser,
        }
    }

    #[test]
    fn test_each_match_yields_two_records() {
        let matches = vec![feed_match(side("Nadal", "L", Some(2)), side("Thiem", "R", Some(3)), (1, 2), 5)];
        let history = build_player_matches(&matches);

        assert_eq!(history.len(), 2);
        let winner = &history[0];
        assert_eq!((winner.id, winner.opponent_id, winner.won), (1, 2, true));
        assert_eq!(winner.opponent_hand.as_deref(), Some("R"));
        assert_eq!(winner.rank, Some(2));

        let loser = &history[1];
        assert_eq!((loser.id, loser.opponent_id, loser.won), (2, 1, false));
        assert_eq!(loser.opponent_hand.as_deref(), Some("L"));
        assert_eq!(loser.surface, Surface::Clay);
    }

    #[test]
    fn test_history_is_date_ordered() {
        let matches = vec![
            feed_match(side("A", "R", None), side("B", "R", None), (1, 2), 20),
            feed_match(side("B", "R", None), side("C", "L", None), (2, 3), 3),
        ];
        let history = build_player_matches(&matches);
        let order: Vec<(PlayerId, u32)> = history
            .iter()
            .map(|record| (record.id, chrono::Datelike::day(&record.date)))
            .collect();
        assert_eq!(order, vec![(2, 3), (3, 3), (1, 20), (2, 20)]);
    }

    #[test]
    fn test_latest_profiles_keep_last_known_values() {
        let mut older = side("Rafa", "L", Some(1));
        older.country = Some("ESP".to_string());
        let mut newer = side("Rafael Nadal", "L", None);
        newer.age = Some(34.3);

        let matches = vec![
            feed_match(older, side("X", "R", Some(40)), (1, 9), 1),
            feed_match(newer, side("X", "R", Some(38)), (1, 9), 8),
        ];
        let profiles = latest_profiles(&build_player_matches(&matches));

        assert_eq!(profiles.iter().map(|p| p.id).collect::<Vec<_>>(), vec![1, 9]);
        let nadal = &profiles[0];
        assert_eq!(nadal.name.as_deref(), Some("Rafael Nadal"));
        assert_eq!(nadal.country.as_deref(), Some("ESP"));
        assert_eq!(nadal.rank, Some(1));
        assert_eq!(nadal.age, Some(34.3));
        assert_eq!(profiles[1].rank, Some(38));
    }

    #[test]
    fn test_latest_profile_of_absent_player() {
        let matches = vec![feed_match(side("A", "R", None), side("B", "R", None), (1, 2), 1)];
        let history = build_player_matches(&matches);
        assert!(latest_profile(3, &history).is_none());
        assert_eq!(latest_profile(2, &history).unwrap().name.as_deref(), Some("B"));
    }

    #[test]
    fn test_latest_profile_ignores_input_order() {
        let matches = vec![
            feed_match(side("Newest", "R", Some(4)), side("B", "R", None), (1, 2), 21),
            feed_match(side("Oldest", "R", Some(90)), side("B", "R", None), (1, 2), 1),
        ];
        let mut history = build_player_matches(&matches);
        history.reverse();

        let profile = latest_profile(1, &history).unwrap();
        assert_eq!(profile.name.as_deref(), Some("Newest"));
        assert_eq!(profile.rank, Some(4));
    }

    #[test]
    fn test_player_matches_csv() {
        let matches = vec![feed_match(side("A", "R", Some(5)), PlayerSide::default(), (1, 2), 1)];
        let history = build_player_matches(&matches);

        let mut buffer = Vec::new();
        write_player_matches(&mut buffer, &history).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        assert!(text.starts_with(
            "id,name,hand,height,country,age,date,surface,rank,points,opponent_id,opponent_hand,won\n"
        ));
        assert!(text.contains("1,A,R,,,,2020-09-01,Clay,5,,2,,true"));

        assert_eq!(read_player_matches(text.as_bytes()).unwrap(), history);
    }

    #[test]
    fn test_profiles_csv() {
        let matches = vec![feed_match(side("A", "R", Some(5)), side("B", "L", None), (4, 2), 1)];
        let profiles = latest_profiles(&build_player_matches(&matches));

        let mut buffer = Vec::new();
        write_profiles(&mut buffer, &profiles).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        assert!(text.starts_with("id,name,hand,height,country,age,rank,points\n2,B,L,"));

        assert_eq!(read_profiles(text.as_bytes()).unwrap(), profiles);
        assert!(read_profiles("id,name\nx,A\n".as_bytes()).is_err());
    }
}
