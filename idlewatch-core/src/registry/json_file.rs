// File: idlewatch-core/src/registry/json_file.rs

use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::{debug, warn};

use idlewatch_common::models::{RegistrySnapshot, UserEntry, UserId};
use idlewatch_common::traits::RegistryStore;

use crate::Error;

/// On-disk shape of one user. Older files stored only the identity string.
#[derive(Debug, Serialize, Deserialize)]
#[serde(untagged)]
enum StoredUser {
    Record {
        game_identity: String,
        #[serde(default)]
        registered_at: Option<DateTime<Utc>>,
    },
    Legacy(String),
}

/// Registry persisted as a pretty-printed JSON object keyed by user id.
///
/// Saves go to a temp file in the same directory which is then renamed over
/// the target, so a crash mid-write leaves the previous file intact.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn dir(&self) -> PathBuf {
        match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        }
    }

    /// Keeps a copy of an unreadable file so the next save does not destroy it.
    fn back_up_corrupt_file(&self) {
        let mut backup = self.path.clone().into_os_string();
        backup.push(".corrupt");
        match fs::copy(&self.path, &backup) {
            Ok(_) => warn!("Copied unreadable registry file to {:?}", backup),
            Err(e) => warn!("Could not back up unreadable registry file: {}", e),
        }
    }
}

impl RegistryStore for JsonFileStore {
    fn load(&self) -> Result<RegistrySnapshot, Error> {
        if !self.path.exists() {
            debug!("Registry file {:?} does not exist yet", self.path);
            return Ok(RegistrySnapshot::default());
        }

        // Any failure past this point leaves a backup, since the caller falls
        // back to an empty registry and the next save replaces the file.
        let raw = match fs::read(&self.path) {
            Ok(raw) => raw,
            Err(e) => {
                self.back_up_corrupt_file();
                return Err(Error::Io(e));
            }
        };
        if raw.iter().all(u8::is_ascii_whitespace) {
            return Ok(RegistrySnapshot::default());
        }

        let parsed: BTreeMap<String, StoredUser> = match serde_json::from_slice(&raw) {
            Ok(p) => p,
            Err(e) => {
                self.back_up_corrupt_file();
                return Err(Error::Json(e));
            }
        };

        let loaded_at = Utc::now();
        Ok(parsed
            .into_iter()
            .map(|(id, stored)| {
                let (game_identity, registered_at) = match stored {
                    StoredUser::Record { game_identity, registered_at } => {
                        (game_identity, registered_at.unwrap_or(loaded_at))
                    }
                    StoredUser::Legacy(game_identity) => (game_identity, loaded_at),
                };
                UserEntry {
                    user_id: UserId(id),
                    game_identity,
                    registered_at,
                }
            })
            .collect())
    }

    fn save(&self, snapshot: &RegistrySnapshot) -> Result<(), Error> {
        let on_disk: BTreeMap<&str, StoredUser> = snapshot
            .entries
            .values()
            .map(|e| {
                (
                    e.user_id.as_str(),
                    StoredUser::Record {
                        game_identity: e.game_identity.clone(),
                        registered_at: Some(e.registered_at),
                    },
                )
            })
            .collect();
        let json = serde_json::to_string_pretty(&on_disk)?;

        let dir = self.dir();
        fs::create_dir_all(&dir)?;
        let mut tmp = NamedTempFile::new_in(&dir)?;
        tmp.write_all(json.as_bytes())?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path)
            .map_err(|e| Error::Persistence(format!("rename to {:?} failed: {}", self.path, e.error)))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("users.json"));
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn reads_legacy_string_entries() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("users.json");
        fs::write(&path, r#"{ "111": "Nanashi#1234", "222": { "game_identity": "Foo#JP1" } }"#).unwrap();

        let snapshot = JsonFileStore::new(&path).load().unwrap();
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot.entries[&UserId::from("111")].game_identity, "Nanashi#1234");
        assert_eq!(snapshot.entries[&UserId::from("222")].game_identity, "Foo#JP1");
    }

    #[test]
    fn corrupt_file_errors_and_is_backed_up() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("users.json");
        fs::write(&path, "{ not json").unwrap();

        assert!(JsonFileStore::new(&path).load().is_err());
        assert!(dir.path().join("users.json.corrupt").exists());
    }

    #[test]
    fn non_utf8_file_is_backed_up() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("users.json");
        let raw = b"{\"111\":\"Nanashi#1234\",\"222\":\"Caf\xE9#JP1\"}".to_vec();
        fs::write(&path, &raw).unwrap();

        assert!(JsonFileStore::new(&path).load().is_err());
        assert_eq!(fs::read(dir.path().join("users.json.corrupt")).unwrap(), raw);
    }

    #[test]
    fn save_then_load_preserves_registration_time() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("nested").join("users.json"));
        let entry = UserEntry::new(UserId::from("42"), "Someone#EUW");
        let snapshot: RegistrySnapshot = std::iter::once(entry.clone()).collect();

        store.save(&snapshot).unwrap();
        let loaded = store.load().unwrap();
        assert_eq!(loaded.entries[&UserId::from("42")], entry);
    }
}
