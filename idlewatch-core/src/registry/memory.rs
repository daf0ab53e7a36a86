use std::sync::Mutex;

use idlewatch_common::models::RegistrySnapshot;
use idlewatch_common::traits::RegistryStore;

use crate::Error;

/// Volatile store. Useful for tests and for running without a writable disk.
#[derive(Debug, Default)]
pub struct MemoryStore {
    snapshot: Mutex<RegistrySnapshot>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_snapshot(snapshot: RegistrySnapshot) -> Self {
        Self {
            snapshot: Mutex::new(snapshot),
        }
    }

    /// What was last saved.
    pub fn snapshot(&self) -> RegistrySnapshot {
        self.snapshot
            .lock()
            .map(|s| s.clone())
            .unwrap_or_default()
    }
}

impl RegistryStore for MemoryStore {
    fn load(&self) -> Result<RegistrySnapshot, Error> {
        self.snapshot
            .lock()
            .map(|s| s.clone())
            .map_err(|e| Error::Persistence(format!("memory store poisoned: {e}")))
    }

    fn save(&self, snapshot: &RegistrySnapshot) -> Result<(), Error> {
        let mut guard = self
            .snapshot
            .lock()
            .map_err(|e| Error::Persistence(format!("memory store poisoned: {e}")))?;
        *guard = snapshot.clone();
        Ok(())
    }
}
