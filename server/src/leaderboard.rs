//! Ranked list of winning games.
//!
//! Views take the read side of an `RwLock`, so any number of them overlap;
//! an insertion takes the write side and is never observed half done.

use crate::credentials::Credential;
use log::info;
use shared::{encode_field, LeaderboardRow};
use std::cmp::Ordering;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// One won game. Immutable once inserted.
#[derive(Debug, Clone)]
pub struct ScoreEntry {
    pub credential: Arc<Credential>,
    /// Whole seconds from the first board to the winning flag.
    pub duration: i64,
    /// Player's win count when this entry was created. Ranking uses this
    /// rather than the live counter, so later wins never reorder the list.
    pub games_won: i32,
}

impl ScoreEntry {
    /// Call after the win has been recorded on `credential`.
    pub fn new(credential: Arc<Credential>, duration: i64) -> Self {
        let games_won = credential.stats().games_won;
        Self {
            credential,
            duration,
            games_won,
        }
    }

    fn to_row(&self) -> LeaderboardRow {
        let stats = self.credential.stats();
        LeaderboardRow {
            username: encode_field(self.credential.username()),
            duration: self.duration,
            games_won: stats.games_won,
            games_played: stats.games_played,
        }
    }
}

/// Display order: longer durations first, then fewer games won, then
/// username ascending. `Less` means `a` is listed above `b`.
pub fn rank(a: &ScoreEntry, b: &ScoreEntry) -> Ordering {
    b.duration
        .cmp(&a.duration)
        .then_with(|| a.games_won.cmp(&b.games_won))
        .then_with(|| a.credential.username().cmp(b.credential.username()))
}

#[derive(Debug, Default)]
pub struct Leaderboard {
    entries: RwLock<Vec<ScoreEntry>>,
}

impl Leaderboard {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, Vec<ScoreEntry>> {
        self.entries.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Vec<ScoreEntry>> {
        self.entries.write().unwrap_or_else(|e| e.into_inner())
    }

    /// Inserts ahead of the first entry the new one ranks above, so ties
    /// keep arrival order. Returns the position taken.
    pub fn insert(&self, entry: ScoreEntry) -> usize {
        let mut entries = self.write();
        let position = entries
            .iter()
            .position(|existing| rank(&entry, existing) == Ordering::Less)
            .unwrap_or(entries.len());
        info!(
            "Leaderboard: {} won in {}s, placed {} of {}",
            entry.credential.username(),
            entry.duration,
            position + 1,
            entries.len() + 1
        );
        entries.insert(position, entry);
        position
    }

    /// Wire rows head to tail, taken under one read lock.
    pub fn rows(&self) -> Vec<LeaderboardRow> {
        self.read().iter().map(ScoreEntry::to_row).collect()
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }
}
