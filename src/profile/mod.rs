//! Player profiles and career statistics
//!
//! Reshapes the match feed into one record per player per match, and derives
//! profile snapshots and win statistics from that history. Nothing here feeds
//! back into ratings or head-to-head counts.

pub mod history;
pub mod stats;

pub use history::{
    build_player_matches, latest_profile, latest_profiles, load_player_matches,
    read_player_matches, read_profiles, save_player_matches, save_profiles,
    write_player_matches, write_profiles, PlayerMatch, PlayerProfile,
};
pub use stats::{player_stats, PlayerStats, SurfaceStats, DEFAULT_RECENT_FORM_WINDOW};
