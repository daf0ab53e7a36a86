use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Chat-platform user id. For Discord this is the snowflake rendered as a string.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Discord mention markup for this user.
    pub fn mention(&self) -> String {
        format!("<@{}>", self.0)
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UserId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<u64> for UserId {
    fn from(id: u64) -> Self {
        Self(id.to_string())
    }
}

/// One armed user: present in the registry, eligible for inactivity scans.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserEntry {
    pub user_id: UserId,
    /// Opaque to the monitor; typically a Riot ID like `Name#Tag`.
    pub game_identity: String,
    pub registered_at: DateTime<Utc>,
}

impl UserEntry {
    pub fn new(user_id: UserId, game_identity: impl Into<String>) -> Self {
        Self {
            user_id,
            game_identity: game_identity.into(),
            registered_at: Utc::now(),
        }
    }
}

/// Full contents of the registry as handed to and from a `RegistryStore`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistrySnapshot {
    pub entries: BTreeMap<UserId, UserEntry>,
}

impl RegistrySnapshot {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<UserEntry> for RegistrySnapshot {
    fn from_iter<I: IntoIterator<Item = UserEntry>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|e| (e.user_id.clone(), e))
                .collect(),
        }
    }
}
