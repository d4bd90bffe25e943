//! Chronologically ordered match sequences
//!
//! The rating engine only replays a `ChronologicalMatches`, so a feed that
//! has not been put in date order cannot reach it by accident.

use crate::error::{RatingError, Result};
use crate::types::{MatchRecord, PlayerId, Surface};
use chrono::NaiveDate;
use std::collections::BTreeSet;

/// Match records in non-decreasing date order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChronologicalMatches {
    matches: Vec<MatchRecord>,
}

impl ChronologicalMatches {
    /// Sort records by date. Records sharing a date keep their feed order.
    pub fn from_unsorted(mut matches: Vec<MatchRecord>) -> Self {
        matches.sort_by_key(MatchRecord::date);
        Self { matches }
    }

    /// Accept records that are already in date order, rejecting the first
    /// record that goes back in time
    pub fn try_from_sorted(matches: Vec<MatchRecord>) -> Result<Self> {
        if let Some(position) = matches
            .windows(2)
            .position(|pair| pair[1].date() < pair[0].date())
        {
            return Err(RatingError::UnsortedFeed {
                index: position + 1,
            }
            .into());
        }
        Ok(Self { matches })
    }

    pub fn len(&self) -> usize {
        self.matches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, MatchRecord> {
        self.matches.iter()
    }

    pub fn as_slice(&self) -> &[MatchRecord] {
        &self.matches
    }

    pub fn into_inner(self) -> Vec<MatchRecord> {
        self.matches
    }

    /// Every player named as winner or loser
    pub fn players(&self) -> BTreeSet<PlayerId> {
        self.matches
            .iter()
            .flat_map(|record| [record.winner_id(), record.loser_id()])
            .collect()
    }

    /// Every surface a match was played on
    pub fn surfaces(&self) -> BTreeSet<Surface> {
        self.matches.iter().map(MatchRecord::surface).collect()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.matches.first().map(MatchRecord::date)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.matches.last().map(MatchRecord::date)
    }
}

impl<'a> IntoIterator for &'a ChronologicalMatches {
    type Item = &'a MatchRecord;
    type IntoIter = std::slice::Iter<'a, MatchRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.matches.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::rating_error;

    fn record(winner: PlayerId, loser: PlayerId, day: u32) -> MatchRecord {
        MatchRecord::new(
            winner,
            loser,
            Surface::Hard,
            NaiveDate::from_ymd_opt(2021, 3, day).unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn test_sort_is_stable_for_equal_dates() {
        let matches = ChronologicalMatches::from_unsorted(vec![
            record(1, 2, 5),
            record(3, 4, 1),
            record(5, 6, 5),
            record(7, 8, 1),
        ]);

        let winners: Vec<PlayerId> = matches.iter().map(MatchRecord::winner_id).collect();
        assert_eq!(winners, vec![3, 7, 1, 5]);
        assert_eq!(matches.first_date(), NaiveDate::from_ymd_opt(2021, 3, 1));
        assert_eq!(matches.last_date(), NaiveDate::from_ymd_opt(2021, 3, 5));
    }

    #[test]
    fn test_try_from_sorted_accepts_ordered_feed() {
        let matches =
            ChronologicalMatches::try_from_sorted(vec![record(1, 2, 1), record(2, 1, 1), record(1, 3, 2)])
                .unwrap();
        assert_eq!(matches.len(), 3);
    }

    #[test]
    fn test_try_from_sorted_rejects_out_of_order_feed() {
        let error =
            ChronologicalMatches::try_from_sorted(vec![record(1, 2, 3), record(1, 3, 4), record(2, 3, 2)])
                .unwrap_err();
        assert_eq!(
            rating_error(&error),
            Some(&RatingError::UnsortedFeed { index: 2 })
        );
    }

    #[test]
    fn test_players_and_surfaces() {
        let mut clay = record(9, 4, 2);
        clay = MatchRecord::new(clay.winner_id(), clay.loser_id(), Surface::Clay, clay.date()).unwrap();
        let matches = ChronologicalMatches::from_unsorted(vec![record(1, 2, 1), clay]);

        assert_eq!(
            matches.players().into_iter().collect::<Vec<_>>(),
            vec![1, 2, 4, 9]
        );
        assert_eq!(
            matches.surfaces().into_iter().collect::<Vec<_>>(),
            vec![Surface::Hard, Surface::Clay]
        );
    }

    #[test]
    fn test_empty_sequence() {
        let matches = ChronologicalMatches::default();
        assert!(matches.is_empty());
        assert_eq!(matches.first_date(), None);
        assert!(matches.players().is_empty());
    }
}
