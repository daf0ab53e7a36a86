//! Durable user id → game identity mapping.
//!
//! The registry keeps the working copy in memory and flushes the whole map to
//! its `RegistryStore` after every mutation, while still holding the write
//! lock. A flush failure rolls the in-memory change back so memory and disk
//! never disagree about what was committed.

pub mod json_file;
pub mod memory;

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use idlewatch_common::models::{RegistrySnapshot, UserEntry, UserId};
use idlewatch_common::traits::RegistryStore;

use crate::Error;

pub use json_file::JsonFileStore;
pub use memory::MemoryStore;

pub struct UserRegistry {
    store: Arc<dyn RegistryStore>,
    entries: Mutex<BTreeMap<UserId, UserEntry>>,
}

impl UserRegistry {
    /// Loads the persisted registry. A missing store yields an empty registry;
    /// a corrupt one is logged and also yields an empty registry.
    pub fn load(store: Arc<dyn RegistryStore>) -> Self {
        let entries = match store.load() {
            Ok(snapshot) => {
                info!("Loaded {} registered user(s)", snapshot.len());
                snapshot.entries
            }
            Err(e) => {
                warn!("Could not load user registry, starting empty: {}", e);
                BTreeMap::new()
            }
        };
        Self {
            store,
            entries: Mutex::new(entries),
        }
    }

    /// Inserts or overwrites the identity for `user_id` and persists it.
    pub async fn register(&self, user_id: UserId, game_identity: &str) -> Result<UserEntry, Error> {
        let game_identity = game_identity.trim();
        if game_identity.is_empty() {
            return Err(Error::Parse("game identity must not be empty".into()));
        }

        let entry = UserEntry {
            user_id: user_id.clone(),
            game_identity: game_identity.to_string(),
            registered_at: Utc::now(),
        };

        let mut guard = self.entries.lock().await;
        let previous = guard.insert(user_id.clone(), entry.clone());
        if let Err(e) = self.flush(&guard) {
            match previous {
                Some(prev) => guard.insert(user_id, prev),
                None => guard.remove(&user_id),
            };
            return Err(e);
        }

        debug!("Registered {} => {}", entry.user_id, entry.game_identity);
        Ok(entry)
    }

    pub async fn get(&self, user_id: &UserId) -> Option<UserEntry> {
        self.entries.lock().await.get(user_id).cloned()
    }

    /// Removes the entry and persists the removal. Absent users are not an
    /// error; `Ok(None)` is returned and nothing is written.
    pub async fn remove(&self, user_id: &UserId) -> Result<Option<UserEntry>, Error> {
        let mut guard = self.entries.lock().await;
        let Some(removed) = guard.remove(user_id) else {
            return Ok(None);
        };
        if let Err(e) = self.flush(&guard) {
            guard.insert(user_id.clone(), removed);
            return Err(e);
        }
        debug!("Removed {} from registry", user_id);
        Ok(Some(removed))
    }

    /// Removes `expected.user_id` only while the stored entry still equals
    /// `expected`. A re-registration or removal since `expected` was read
    /// yields `Ok(None)` and leaves the registry untouched.
    pub async fn remove_if_unchanged(&self, expected: &UserEntry) -> Result<Option<UserEntry>, Error> {
        let mut guard = self.entries.lock().await;
        if guard.get(&expected.user_id) != Some(expected) {
            return Ok(None);
        }
        let Some(removed) = guard.remove(&expected.user_id) else {
            return Ok(None);
        };
        if let Err(e) = self.flush(&guard) {
            guard.insert(expected.user_id.clone(), removed);
            return Err(e);
        }
        debug!("Removed {} from registry", expected.user_id);
        Ok(Some(removed))
    }

    /// Point-in-time copy of all entries. Later mutations do not affect it.
    pub async fn list(&self) -> Vec<UserEntry> {
        self.entries.lock().await.values().cloned().collect()
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }

    fn flush(&self, entries: &BTreeMap<UserId, UserEntry>) -> Result<(), Error> {
        let snapshot = RegistrySnapshot {
            entries: entries.clone(),
        };
        self.store.save(&snapshot).map_err(|e| {
            error!("Failed to persist user registry: {}", e);
            match e {
                Error::Persistence(_) => e,
                other => Error::Persistence(other.to_string()),
            }
        })
    }
}
