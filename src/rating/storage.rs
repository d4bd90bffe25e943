//! Rating storage interface and implementations
//!
//! This module defines the interface for persisting and retrieving
//! (player, surface) rating entries, with an in-memory implementation and a
//! recording mock for tests.

use crate::error::{RatingError, Result};
use crate::types::{PlayerId, RatingRow, Surface};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::RwLock;

/// Storage entry for one player's rating on one surface
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatingEntry {
    pub player_id: PlayerId,
    pub surface: Surface,
    pub rating: f64,
    /// Date of the last match that moved this entry, unset until the first one
    pub last_updated: Option<NaiveDate>,
}

impl RatingEntry {
    /// Create an untouched entry at the baseline rating
    pub fn new(player_id: PlayerId, surface: Surface, initial_rating: f64) -> Self {
        Self {
            player_id,
            surface,
            rating: initial_rating,
            last_updated: None,
        }
    }

    /// Apply a rating change observed at `date`
    pub fn update_rating(&mut self, new_rating: f64, date: NaiveDate) {
        self.rating = new_rating;
        self.last_updated = Some(date);
    }

    /// Whether any match has moved this entry
    pub fn is_touched(&self) -> bool {
        self.last_updated.is_some()
    }

    /// Export row for touched entries
    pub fn to_row(&self) -> Option<RatingRow> {
        self.last_updated.map(|last_updated| RatingRow {
            player_id: self.player_id,
            surface: self.surface,
            rating: self.rating,
            last_updated,
        })
    }
}

/// Trait for rating storage operations
pub trait RatingStorage: Send + Sync {
    /// Get the entry for one (player, surface) pair
    fn get_entry(&self, player_id: PlayerId, surface: Surface) -> Result<Option<RatingEntry>>;

    /// Store or replace a single entry
    fn store_entry(&self, entry: RatingEntry) -> Result<()>;

    /// Store multiple entries atomically: either the whole batch is written
    /// or the call fails and nothing changes
    fn store_entries(&self, entries: Vec<RatingEntry>) -> Result<()>;

    /// Get every entry held for a player
    fn get_player_entries(&self, player_id: PlayerId) -> Result<Vec<RatingEntry>>;

    /// Get all entries (for export)
    fn get_all_entries(&self) -> Result<Vec<RatingEntry>>;

    /// Whether the player has at least one entry
    fn contains_player(&self, player_id: PlayerId) -> Result<bool>;

    /// Get total number of players with entries
    fn get_player_count(&self) -> Result<usize>;

    /// Get total number of (player, surface) entries
    fn get_entry_count(&self) -> Result<usize>;
}

type EntryMap = HashMap<(PlayerId, Surface), RatingEntry>;

fn read_lock_error() -> anyhow::Error {
    RatingError::InternalError {
        message: "Failed to acquire ratings read lock".to_string(),
    }
    .into()
}

fn write_lock_error() -> anyhow::Error {
    RatingError::InternalError {
        message: "Failed to acquire ratings write lock".to_string(),
    }
    .into()
}

fn player_entries(entries: &EntryMap, player_id: PlayerId) -> Vec<RatingEntry> {
    Surface::ALL
        .iter()
        .filter_map(|surface| entries.get(&(player_id, *surface)).cloned())
        .collect()
}

fn player_count(entries: &EntryMap) -> usize {
    entries
        .keys()
        .map(|(player_id, _)| *player_id)
        .collect::<HashSet<_>>()
        .len()
}

/// In-memory rating storage implementation
#[derive(Debug, Default)]
pub struct InMemoryRatingStorage {
    entries: RwLock<EntryMap>,
}

impl InMemoryRatingStorage {
    /// Create a new, empty in-memory rating storage
    pub fn new() -> Self {
        Self::default()
    }
}

impl RatingStorage for InMemoryRatingStorage {
    fn get_entry(&self, player_id: PlayerId, surface: Surface) -> Result<Option<RatingEntry>> {
        let entries = self.entries.read().map_err(|_| read_lock_error())?;
        Ok(entries.get(&(player_id, surface)).cloned())
    }

    fn store_entry(&self, entry: RatingEntry) -> Result<()> {
        let mut entries = self.entries.write().map_err(|_| write_lock_error())?;
        entries.insert((entry.player_id, entry.surface), entry);
        Ok(())
    }

    fn store_entries(&self, batch: Vec<RatingEntry>) -> Result<()> {
        let mut entries = self.entries.write().map_err(|_| write_lock_error())?;
        for entry in batch {
            entries.insert((entry.player_id, entry.surface), entry);
        }
        Ok(())
    }

    fn get_player_entries(&self, player_id: PlayerId) -> Result<Vec<RatingEntry>> {
        let entries = self.entries.read().map_err(|_| read_lock_error())?;
        Ok(player_entries(&entries, player_id))
    }

    fn get_all_entries(&self) -> Result<Vec<RatingEntry>> {
        let entries = self.entries.read().map_err(|_| read_lock_error())?;
        Ok(entries.values().cloned().collect())
    }

    fn contains_player(&self, player_id: PlayerId) -> Result<bool> {
        let entries = self.entries.read().map_err(|_| read_lock_error())?;
        Ok(Surface::ALL
            .iter()
            .any(|surface| entries.contains_key(&(player_id, *surface))))
    }

    fn get_player_count(&self) -> Result<usize> {
        let entries = self.entries.read().map_err(|_| read_lock_error())?;
        Ok(player_count(&entries))
    }

    fn get_entry_count(&self) -> Result<usize> {
        let entries = self.entries.read().map_err(|_| read_lock_error())?;
        Ok(entries.len())
    }
}

/// Mock rating storage for testing
///
/// Behaves like the in-memory storage and additionally records every entry
/// passed to a store call.
#[derive(Debug, Default)]
pub struct MockRatingStorage {
    inner: InMemoryRatingStorage,
    store_calls: RwLock<Vec<RatingEntry>>,
}

impl MockRatingStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get all stored entries in call order (for testing)
    pub fn get_store_calls(&self) -> Vec<RatingEntry> {
        self.store_calls
            .read()
            .map(|calls| calls.clone())
            .unwrap_or_default()
    }

    /// Clear store calls (for testing)
    pub fn clear_store_calls(&self) {
        if let Ok(mut calls) = self.store_calls.write() {
            calls.clear();
        }
    }
}

impl RatingStorage for MockRatingStorage {
    fn get_entry(&self, player_id: PlayerId, surface: Surface) -> Result<Option<RatingEntry>> {
        self.inner.get_entry(player_id, surface)
    }

    fn store_entry(&self, entry: RatingEntry) -> Result<()> {
        self.inner.store_entry(entry.clone())?;
        // Record the call for testing
        if let Ok(mut calls) = self.store_calls.write() {
            calls.push(entry);
        }
        Ok(())
    }

    fn store_entries(&self, entries: Vec<RatingEntry>) -> Result<()> {
        self.inner.store_entries(entries.clone())?;
        // Only successful writes are recorded
        if let Ok(mut calls) = self.store_calls.write() {
            calls.extend(entries);
        }
        Ok(())
    }

    fn get_player_entries(&self, player_id: PlayerId) -> Result<Vec<RatingEntry>> {
        self.inner.get_player_entries(player_id)
    }

    fn get_all_entries(&self) -> Result<Vec<RatingEntry>> {
        self.inner.get_all_entries()
    }

    fn contains_player(&self, player_id: PlayerId) -> Result<bool> {
        self.inner.contains_player(player_id)
    }

    fn get_player_count(&self) -> Result<usize> {
        self.inner.get_player_count()
    }

    fn get_entry_count(&self) -> Result<usize> {
        self.inner.get_entry_count()
    }
}
