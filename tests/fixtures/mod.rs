//! Test fixtures shared by the integration tests

#![allow(dead_code)]

use chrono::NaiveDate;
use court_ratings::feed::{FeedMatch, PlayerSide};
use court_ratings::types::{MatchRecord, PlayerId, Surface};

pub const NADAL: PlayerId = 104745;
pub const DJOKOVIC: PlayerId = 104925;
pub const FEDERER: PlayerId = 103819;

/// Header of the ATP-style feed, including columns the crate ignores
pub const FEED_HEADER: &str = "tourney_id,tourney_name,surface,tourney_date,winner_id,winner_name,winner_hand,winner_ht,winner_ioc,winner_age,winner_rank,winner_rank_points,loser_id,loser_name,loser_hand,loser_ht,loser_ioc,loser_age,loser_rank,loser_rank_points,score";

pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

pub fn record(winner: PlayerId, loser: PlayerId, surface: Surface, on: NaiveDate) -> MatchRecord {
    MatchRecord::new(winner, loser, surface, on).unwrap()
}

pub fn side(name: &str, hand: &str, country: &str, rank: u32) -> PlayerSide {
    PlayerSide {
        name: Some(name.to_string()),
        hand: Some(hand.to_string()),
        country: Some(country.to_string()),
        rank: Some(rank),
        ..PlayerSide::default()
    }
}

/// Small feed over three players, deliberately out of date order
pub fn big_three_matches() -> Vec<FeedMatch> {
    let nadal = || side("Rafael Nadal", "L", "ESP", 2);
    let djokovic = || side("Novak Djokovic", "R", "SRB", 1);
    let federer = || side("Roger Federer", "R", "SUI", 3);

    vec![
        FeedMatch {
            record: record(DJOKOVIC, FEDERER, Surface::Grass, date(2019, 7, 1)),
            winner: djokovic(),
            loser: federer(),
        },
        FeedMatch {
            record: record(NADAL, DJOKOVIC, Surface::Clay, date(2019, 5, 27)),
            winner: nadal(),
            loser: djokovic(),
        },
        FeedMatch {
            record: record(NADAL, FEDERER, Surface::Clay, date(2019, 5, 27)),
            winner: nadal(),
            loser: federer(),
        },
        FeedMatch {
            record: record(DJOKOVIC, NADAL, Surface::Hard, date(2019, 1, 14)),
            winner: djokovic(),
            loser: nadal(),
        },
    ]
}

/// The same matches as `big_three_matches` rendered as feed CSV, plus a row
/// with a blank surface
pub fn big_three_csv() -> String {
    let rows = [
        "2019-540,Wimbledon,Grass,20190701,104925,Novak Djokovic,R,188,SRB,32.1,1,12415,103819,Roger Federer,R,185,SUI,37.9,3,6620,7-6 1-6 7-6",
        "2019-520,Roland Garros,Clay,20190527,104745,Rafael Nadal,L,185,ESP,32.9,2,7945,104925,Novak Djokovic,R,188,SRB,32.0,1,12115,6-4 6-4",
        "2019-520,Roland Garros,Clay,20190527,104745,Rafael Nadal,L,185,ESP,32.9,2,7945,103819,Roger Federer,R,185,SUI,37.8,3,6590,6-3 6-4",
        "2019-580,Australian Open,Hard,20190114,104925,Novak Djokovic,R,188,SRB,31.7,1,9135,104745,Rafael Nadal,L,185,ESP,32.6,2,7480,6-3 6-2",
        "2019-999,Exhibition,,20191201,104745,Rafael Nadal,L,185,ESP,33.5,1,9585,103819,Roger Federer,R,185,SUI,38.3,3,5690,6-4",
    ];
    let mut text = String::from(FEED_HEADER);
    for row in rows {
        text.push('\n');
        text.push_str(row);
    }
    text.push('\n');
    text
}
