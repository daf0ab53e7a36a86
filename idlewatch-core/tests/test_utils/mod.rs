// File: idlewatch-core/tests/test_utils/mod.rs
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use mockall::mock;

use idlewatch_common::models::{RegistrySnapshot, UserId};
use idlewatch_common::traits::{ActivitySource, NotificationSink, RegistryStore};
use idlewatch_core::config::MonitorConfig;
use idlewatch_core::registry::MemoryStore;
use idlewatch_core::{Error, HttpClient, HttpResponse, InactivityMonitor, UserRegistry};

mock! {
    pub Sink {}
    #[async_trait]
    impl NotificationSink for Sink {
        async fn notify(&self, user_id: &UserId, destination: &str, message: &str) -> Result<(), Error>;
    }
}

mock! {
    pub Http {}
    #[async_trait]
    impl HttpClient for Http {
        async fn get(&self, url: String, headers: HashMap<String, String>) -> Result<HttpResponse, Error>;
    }
}

/// What the scripted source answers for one identity.
#[derive(Debug, Clone, Copy)]
pub enum Activity {
    /// Last played this long before the reference time.
    Ago(Duration),
    NoHistory,
    Unreachable,
}

/// ActivitySource with per-identity scripted answers, counting every lookup.
pub struct ScriptedSource {
    reference: Option<DateTime<Utc>>,
    answers: Mutex<HashMap<String, Activity>>,
    calls: AtomicUsize,
}

impl ScriptedSource {
    /// Offsets are taken from `reference`.
    pub fn at(reference: DateTime<Utc>) -> Self {
        Self {
            reference: Some(reference),
            answers: Mutex::new(HashMap::new()),
            calls: AtomicUsize::new(0),
        }
    }

    /// Offsets are taken from the wall clock at lookup time.
    pub fn live() -> Self {
        Self {
            reference: None,
            answers: Mutex::new(HashMap::new()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn set(&self, identity: &str, activity: Activity) {
        self.answers.lock().unwrap().insert(identity.to_string(), activity);
    }

    pub fn with(self, identity: &str, activity: Activity) -> Self {
        self.set(identity, activity);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ActivitySource for ScriptedSource {
    async fn last_activity_of(&self, game_identity: &str) -> Result<Option<DateTime<Utc>>, Error> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let answer = self
            .answers
            .lock()
            .unwrap()
            .get(game_identity)
            .copied()
            .unwrap_or(Activity::NoHistory);
        let reference = self.reference.unwrap_or_else(Utc::now);
        match answer {
            Activity::Ago(d) => Ok(Some(reference - d)),
            Activity::NoHistory => Ok(None),
            Activity::Unreachable => Err(Error::ActivitySource("connection refused".into())),
        }
    }
}

/// Sink that records deliveries; shareable with spawned tasks.
#[derive(Default)]
pub struct RecordingSink {
    pub delivered: Mutex<Vec<(UserId, String, String)>>,
}

impl RecordingSink {
    pub fn count(&self) -> usize {
        self.delivered.lock().unwrap().len()
    }
}

#[async_trait]
impl NotificationSink for RecordingSink {
    async fn notify(&self, user_id: &UserId, destination: &str, message: &str) -> Result<(), Error> {
        self.delivered
            .lock()
            .unwrap()
            .push((user_id.clone(), destination.to_string(), message.to_string()));
        Ok(())
    }
}

/// In-memory store whose saves can be switched to fail.
#[derive(Default)]
pub struct FlakyStore {
    inner: MemoryStore,
    pub failing: AtomicBool,
}

impl FlakyStore {
    pub fn fail_saves(&self, fail: bool) {
        self.failing.store(fail, Ordering::SeqCst);
    }

    pub fn snapshot(&self) -> RegistrySnapshot {
        self.inner.snapshot()
    }
}

impl RegistryStore for FlakyStore {
    fn load(&self) -> Result<RegistrySnapshot, Error> {
        self.inner.load()
    }

    fn save(&self, snapshot: &RegistrySnapshot) -> Result<(), Error> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(Error::Io(std::io::Error::other("disk full")));
        }
        self.inner.save(snapshot)
    }
}

pub fn monitor_config(threshold: Duration) -> MonitorConfig {
    MonitorConfig {
        poll_interval: std::time::Duration::from_secs(60 * 60),
        inactivity_threshold: threshold.to_std().unwrap(),
        notification_destination: Some("1234567890".to_string()),
        enabled_at_startup: true,
        notify_attempts: 1,
        notify_retry_backoff: std::time::Duration::from_millis(1),
    }
}

pub fn memory_registry() -> Arc<UserRegistry> {
    Arc::new(UserRegistry::load(Arc::new(MemoryStore::new())))
}

pub fn build_monitor(
    registry: Arc<UserRegistry>,
    source: Arc<dyn ActivitySource>,
    sink: Arc<dyn NotificationSink>,
    config: MonitorConfig,
) -> Arc<InactivityMonitor> {
    InactivityMonitor::new(registry, source, sink, config)
}
