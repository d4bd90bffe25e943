//! Career statistics derived from a player's match history

use super::history::{profile_from_sorted, PlayerMatch, PlayerProfile};
use crate::types::{PlayerId, Surface};
use crate::utils::win_percentage;
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;

/// Default number of most recent matches counted as recent form
pub const DEFAULT_RECENT_FORM_WINDOW: usize = 10;

/// Results on one surface
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SurfaceStats {
    pub matches: usize,
    pub win_percentage: f64,
}

/// Career summary of one player
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerStats {
    #[serde(flatten)]
    pub profile: PlayerProfile,
    pub overall_win_percentage: f64,
    /// Win percentage over the most recent `recent_window` matches
    pub recent_form: f64,
    pub recent_window: usize,
    pub surface_stats: BTreeMap<Surface, SurfaceStats>,
    pub matches_played: usize,
    pub last_match_date: NaiveDate,
}

/// Statistics for `player_id`, or `None` if they never played
pub fn player_stats(
    player_id: PlayerId,
    history: &[PlayerMatch],
    recent_window: usize,
) -> Option<PlayerStats> {
    let mut played: Vec<&PlayerMatch> = history
        .iter()
        .filter(|record| record.id == player_id)
        .collect();
    played.sort_by_key(|record| record.date);

    let last_match_date = played.last()?.date;
    let profile = profile_from_sorted(player_id, &played)?;

    let wins = played.iter().filter(|record| record.won).count();

    let recent = &played[played.len().saturating_sub(recent_window)..];
    let recent_wins = recent.iter().filter(|record| record.won).count();

    let mut per_surface: BTreeMap<Surface, (usize, usize)> = BTreeMap::new();
    for record in &played {
        let (matches, wins) = per_surface.entry(record.surface).or_insert((0, 0));
        *matches += 1;
        if record.won {
            *wins += 1;
        }
    }
    let surface_stats = per_surface
        .into_iter()
        .map(|(surface, (matches, wins))| {
            (
                surface,
                SurfaceStats {
                    matches,
                    win_percentage: win_percentage(wins, matches),
                },
            )
        })
        .collect();

    Some(PlayerStats {
        profile,
        overall_win_percentage: win_percentage(wins, played.len()),
        recent_form: win_percentage(recent_wins, recent.len()),
        recent_window,
        surface_stats,
        matches_played: played.len(),
        last_match_date,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f64 = 1e-9;

    fn played(day: u32, surface: Surface, won: bool) -> PlayerMatch {
        PlayerMatch {
            id: 1,
            name: Some("Casper Ruud".to_string()),
            hand: Some("R".to_string()),
            height: Some(183.0),
            country: Some("NOR".to_string()),
            age: Some(23.0),
            date: NaiveDate::from_ymd_opt(2022, 1, day).unwrap(),
            surface,
            rank: Some(8),
            points: Some(3000),
            opponent_id: 2,
            opponent_hand: Some("R".to_string()),
            won,
        }
    }

    #[test]
    fn test_no_matches_gives_none() {
        let history = vec![played(1, Surface::Hard, true)];
        assert!(player_stats(42, &history, 10).is_none());
        assert!(player_stats(1, &[], 10).is_none());
    }

    #[test]
    fn test_career_and_surface_breakdown() {
        let history = vec![
            played(1, Surface::Clay, true),
            played(2, Surface::Clay, true),
            played(3, Surface::Clay, false),
            played(4, Surface::Hard, false),
        ];
        let stats = player_stats(1, &history, DEFAULT_RECENT_FORM_WINDOW).unwrap();

        assert_eq!(stats.matches_played, 4);
        assert!((stats.overall_win_percentage - 50.0).abs() < EPSILON);
        assert!((stats.recent_form - 50.0).abs() < EPSILON);
        assert_eq!(stats.last_match_date, NaiveDate::from_ymd_opt(2022, 1, 4).unwrap());
        assert_eq!(stats.profile.name.as_deref(), Some("Casper Ruud"));

        let clay = stats.surface_stats[&Surface::Clay];
        assert_eq!(clay.matches, 3);
        assert!((clay.win_percentage - 200.0 / 3.0).abs() < EPSILON);
        assert_eq!(stats.surface_stats[&Surface::Hard].win_percentage, 0.0);
        assert!(!stats.surface_stats.contains_key(&Surface::Grass));
    }

    #[test]
    fn test_recent_form_uses_latest_matches() {
        // Unordered input: three early losses, two late wins
        let history = vec![
            played(20, Surface::Hard, true),
            played(1, Surface::Hard, false),
            played(2, Surface::Hard, false),
            played(21, Surface::Hard, true),
            played(3, Surface::Hard, false),
        ];
        let stats = player_stats(1, &history, 2).unwrap();
        assert_eq!(stats.recent_form, 100.0);
        assert!((stats.overall_win_percentage - 40.0).abs() < EPSILON);

        let wide = player_stats(1, &history, 50).unwrap();
        assert!((wide.recent_form - 40.0).abs() < EPSILON);
    }

    #[test]
    fn test_profile_comes_from_the_latest_match() {
        let mut newest = played(21, Surface::Clay, true);
        newest.name = Some("Newest".to_string());
        newest.rank = Some(2);
        let mut oldest = played(1, Surface::Clay, false);
        oldest.name = Some("Oldest".to_string());
        oldest.rank = Some(40);

        let stats = player_stats(1, &[newest, oldest], 10).unwrap();
        assert_eq!(stats.last_match_date, NaiveDate::from_ymd_opt(2022, 1, 21).unwrap());
        assert_eq!(stats.profile.name.as_deref(), Some("Newest"));
        assert_eq!(stats.profile.rank, Some(2));
    }

    #[test]
    fn test_stats_as_json() {
        let stats = player_stats(1, &[played(1, Surface::Grass, true)], 10).unwrap();
        let json = serde_json::to_value(&stats).unwrap();
        assert_eq!(json["id"], 1);
        assert_eq!(json["country"], "NOR");
        assert_eq!(json["surface_stats"]["Grass"]["matches"], 1);
        assert_eq!(json["last_match_date"], "2022-01-01");
    }
}
