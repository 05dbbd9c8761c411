//! Registered accounts and their play statistics.
//!
//! Accounts are loaded once at startup from a whitespace-separated text file
//! whose first line is a header. The list never changes afterwards; only the
//! per-account counters do, each behind its own lock so two sessions for the
//! same user cannot lose an update.

use crate::error::CredentialError;
use log::{info, warn};
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlayStats {
    pub games_played: i32,
    pub games_won: i32,
}

#[derive(Debug)]
pub struct Credential {
    username: String,
    password: String,
    stats: Mutex<PlayStats>,
}

impl Credential {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            stats: Mutex::new(PlayStats::default()),
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    fn matches(&self, username: &str, password: &str) -> bool {
        self.username == username && self.password == password
    }

    fn lock_stats(&self) -> MutexGuard<'_, PlayStats> {
        self.stats.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn stats(&self) -> PlayStats {
        *self.lock_stats()
    }

    /// Counts a finished, lost game.
    pub fn record_loss(&self) -> PlayStats {
        let mut stats = self.lock_stats();
        stats.games_played += 1;
        *stats
    }

    /// Counts a finished, won game.
    pub fn record_win(&self) -> PlayStats {
        let mut stats = self.lock_stats();
        stats.games_won += 1;
        stats.games_played += 1;
        *stats
    }
}

#[derive(Debug, Default)]
pub struct CredentialStore {
    accounts: Vec<Arc<Credential>>,
}

impl CredentialStore {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, CredentialError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| CredentialError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let Some((_header, body)) = contents.split_once('\n') else {
            return Err(CredentialError::MissingHeader(path.to_path_buf()));
        };

        let store = Self::parse(body)?;
        if store.is_empty() {
            return Err(CredentialError::NoAccounts(path.to_path_buf()));
        }

        info!("Loaded {} accounts from {}", store.len(), path.display());
        Ok(store)
    }

    /// Parses `username password` pairs. Tokens may be split over any
    /// whitespace; a later duplicate of an existing username is skipped.
    pub fn parse(body: &str) -> Result<Self, CredentialError> {
        let mut tokens = body.split_whitespace();
        let mut seen = HashSet::new();
        let mut accounts = Vec::new();

        while let Some(username) = tokens.next() {
            let Some(password) = tokens.next() else {
                return Err(CredentialError::MissingPassword(username.to_string()));
            };
            if !seen.insert(username) {
                warn!("Ignoring duplicate account {}", username);
                continue;
            }
            accounts.push(Arc::new(Credential::new(username, password)));
        }

        Ok(Self { accounts })
    }

    pub fn from_accounts<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let body: Vec<String> = pairs
            .into_iter()
            .map(|(user, pass)| format!("{} {}", user, pass))
            .collect();
        // Pairs built in code are always complete.
        Self::parse(&body.join("\n")).unwrap_or_default()
    }

    /// Exact comparison on both fields.
    pub fn authenticate(&self, username: &str, password: &str) -> Option<Arc<Credential>> {
        self.accounts
            .iter()
            .find(|c| c.matches(username, password))
            .cloned()
    }

    pub fn find(&self, username: &str) -> Option<Arc<Credential>> {
        self.accounts.iter().find(|c| c.username == username).cloned()
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }
}
