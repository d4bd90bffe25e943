//! Common types used throughout the rating service

use crate::error::{RatingError, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Opaque numeric identifier for players
pub type PlayerId = u64;

/// Playing surface of a match
///
/// `Overall` is a synthetic track updated on every match. It is never the
/// surface a match was actually played on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Surface {
    Hard,
    Clay,
    Grass,
    Carpet,
    Overall,
}

impl Surface {
    /// Surfaces a match can be played on
    pub const PLAYABLE: [Surface; 4] = [Surface::Hard, Surface::Clay, Surface::Grass, Surface::Carpet];

    /// Every rating track, including Overall
    pub const ALL: [Surface; 5] = [
        Surface::Hard,
        Surface::Clay,
        Surface::Grass,
        Surface::Carpet,
        Surface::Overall,
    ];

    pub fn is_overall(self) -> bool {
        self == Surface::Overall
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Surface::Hard => "Hard",
            Surface::Clay => "Clay",
            Surface::Grass => "Grass",
            Surface::Carpet => "Carpet",
            Surface::Overall => "Overall",
        }
    }
}

impl fmt::Display for Surface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Surface {
    type Err = RatingError;

    fn from_str(label: &str) -> std::result::Result<Self, Self::Err> {
        let trimmed = label.trim();
        Surface::ALL
            .into_iter()
            .find(|surface| surface.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| RatingError::UnknownSurface {
                label: label.to_string(),
            })
    }
}

/// A single played match as delivered by the match feed
///
/// Construction guarantees two distinct players and a playable surface.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchRecord {
    winner_id: PlayerId,
    loser_id: PlayerId,
    surface: Surface,
    date: NaiveDate,
}

impl MatchRecord {
    pub fn new(
        winner_id: PlayerId,
        loser_id: PlayerId,
        surface: Surface,
        date: NaiveDate,
    ) -> Result<Self> {
        validate_pairing(winner_id, loser_id, surface)?;
        Ok(Self {
            winner_id,
            loser_id,
            surface,
            date,
        })
    }

    pub fn winner_id(&self) -> PlayerId {
        self.winner_id
    }

    pub fn loser_id(&self) -> PlayerId {
        self.loser_id
    }

    pub fn surface(&self) -> Surface {
        self.surface
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }
}

fn validate_pairing(winner_id: PlayerId, loser_id: PlayerId, surface: Surface) -> Result<()> {
    if winner_id == loser_id {
        return Err(RatingError::InvalidMatch {
            reason: format!("player {} cannot play against themselves", winner_id),
        }
        .into());
    }
    if surface.is_overall() {
        return Err(RatingError::InvalidMatch {
            reason: "matches cannot be played on the Overall surface".to_string(),
        }
        .into());
    }
    Ok(())
}

/// One exported row of the rating table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatingRow {
    #[serde(rename = "id")]
    pub player_id: PlayerId,
    pub surface: Surface,
    pub rating: f64,
    pub last_updated: NaiveDate,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::rating_error;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_surface_parsing() {
        assert_eq!("Clay".parse::<Surface>().unwrap(), Surface::Clay);
        assert_eq!(" hard ".parse::<Surface>().unwrap(), Surface::Hard);
        assert_eq!("OVERALL".parse::<Surface>().unwrap(), Surface::Overall);
        assert_eq!(
            "Sand".parse::<Surface>(),
            Err(RatingError::UnknownSurface {
                label: "Sand".to_string()
            })
        );
        assert!("".parse::<Surface>().is_err());
    }

    #[test]
    fn test_surface_display_round_trips() {
        for surface in Surface::ALL {
            assert_eq!(surface.to_string().parse::<Surface>().unwrap(), surface);
        }
        assert!(!Surface::PLAYABLE.contains(&Surface::Overall));
    }

    #[test]
    fn test_match_record_creation() {
        let record = MatchRecord::new(1, 2, Surface::Clay, date(2020, 6, 1)).unwrap();
        assert_eq!(record.winner_id(), 1);
        assert_eq!(record.loser_id(), 2);
        assert_eq!(record.surface(), Surface::Clay);
        assert_eq!(record.date(), date(2020, 6, 1));
    }

    #[test]
    fn test_match_record_rejects_self_match() {
        let error = MatchRecord::new(3, 3, Surface::Hard, date(2020, 1, 1)).unwrap_err();
        assert!(matches!(
            rating_error(&error),
            Some(RatingError::InvalidMatch { .. })
        ));
    }

    #[test]
    fn test_match_record_rejects_overall_surface() {
        let error = MatchRecord::new(1, 2, Surface::Overall, date(2020, 1, 1)).unwrap_err();
        assert!(matches!(
            rating_error(&error),
            Some(RatingError::InvalidMatch { .. })
        ));
    }
}
