//! The inactivity monitor.
//!
//! A registry entry is *armed* while present. Each scan cycle looks up every
//! armed user's last activity, and when it is older than the threshold the
//! entry is disarmed (removed and persisted) and a single notification is
//! attempted. Removing before notifying means a crash between the two steps
//! can lose a notification but can never send it twice.

pub mod policy;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{debug, error, info, warn};

use idlewatch_common::models::{ActivitySample, UserEntry, UserId};
use idlewatch_common::traits::{ActivitySource, NotificationSink};

use crate::config::MonitorConfig;
use crate::registry::UserRegistry;
use crate::tasks::inactivity_scan::{spawn_inactivity_scan_task, ScanTimer};
use crate::Error;

pub use policy::{InactivityPolicy, Verdict};

/// Public view of the monitor's state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitorState {
    pub enabled: bool,
    pub poll_interval: Duration,
    pub inactivity_threshold: Duration,
    pub timer_active: bool,
}

/// Counters for one scan cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanReport {
    pub checked: usize,
    pub unknown: usize,
    pub lookup_failed: usize,
    pub still_active: usize,
    pub notified: usize,
    pub notify_failed: usize,
    /// Due users whose disarm could not be persisted; they were not notified.
    pub persist_failed: usize,
}

/// Answer to a `check` command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckOutcome {
    NotRegistered,
    NoHistory { game_identity: String },
    Elapsed { game_identity: String, elapsed: chrono::Duration },
}

pub struct InactivityMonitor {
    registry: Arc<UserRegistry>,
    source: Arc<dyn ActivitySource>,
    sink: Arc<dyn NotificationSink>,
    config: MonitorConfig,
    policy: InactivityPolicy,

    enabled: AtomicBool,
    /// Guards the enable/disable transition together with the timer handle.
    timer: Mutex<Option<ScanTimer>>,
    /// Serializes scans so a late cycle never overlaps a new one.
    scan_lock: tokio::sync::Mutex<()>,
}

impl InactivityMonitor {
    /// Creates a disabled monitor. Call `start()` to apply the startup setting.
    pub fn new(
        registry: Arc<UserRegistry>,
        source: Arc<dyn ActivitySource>,
        sink: Arc<dyn NotificationSink>,
        config: MonitorConfig,
    ) -> Arc<Self> {
        let policy = InactivityPolicy::new(config.threshold_chrono());
        Arc::new(Self {
            registry,
            source,
            sink,
            config,
            policy,
            enabled: AtomicBool::new(false),
            timer: Mutex::new(None),
            scan_lock: tokio::sync::Mutex::new(()),
        })
    }

    /// Enables monitoring when `enabled_at_startup` is set.
    pub fn start(self: &Arc<Self>) {
        if self.config.enabled_at_startup {
            self.enable();
        } else {
            info!("Monitoring disabled at startup");
        }
    }

    /// Starts the recurring scan. Returns `false` (and does nothing) when
    /// monitoring is already on.
    pub fn enable(self: &Arc<Self>) -> bool {
        let mut timer = self.timer.lock().unwrap_or_else(|p| p.into_inner());
        if self.enabled.load(Ordering::SeqCst) {
            debug!("enable() ignored; monitoring already on");
            return false;
        }

        *timer = Some(spawn_inactivity_scan_task(
            Arc::downgrade(self),
            self.config.poll_interval,
        ));
        self.enabled.store(true, Ordering::SeqCst);
        info!(
            "Monitoring enabled (poll every {:?}, threshold {:?})",
            self.config.poll_interval, self.config.inactivity_threshold
        );
        true
    }

    /// Stops the recurring scan. Returns `false` when monitoring was already
    /// off. A scan in progress is left to finish.
    pub fn disable(&self) -> bool {
        let mut timer = self.timer.lock().unwrap_or_else(|p| p.into_inner());
        if !self.enabled.load(Ordering::SeqCst) {
            debug!("disable() ignored; monitoring already off");
            return false;
        }

        if let Some(t) = timer.take() {
            t.cancel();
        }
        self.enabled.store(false, Ordering::SeqCst);
        info!("Monitoring disabled");
        true
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    pub fn state(&self) -> MonitorState {
        let timer = self.timer.lock().unwrap_or_else(|p| p.into_inner());
        MonitorState {
            enabled: self.is_enabled(),
            poll_interval: self.config.poll_interval,
            inactivity_threshold: self.config.inactivity_threshold,
            timer_active: timer.as_ref().is_some_and(|t| t.is_running()),
        }
    }

    pub fn registry(&self) -> &Arc<UserRegistry> {
        &self.registry
    }

    pub fn policy(&self) -> &InactivityPolicy {
        &self.policy
    }

    /// Runs one scan cycle against the current time.
    pub async fn scan(&self) -> ScanReport {
        self.scan_at(Utc::now()).await
    }

    /// Runs one scan cycle as if the current time were `now`. Never fails;
    /// every per-user problem is logged and counted in the report.
    pub async fn scan_at(&self, now: DateTime<Utc>) -> ScanReport {
        let _guard = self.scan_lock.lock().await;
        let snapshot = self.registry.list().await;
        let mut report = ScanReport::default();

        debug!("Scanning {} registered user(s)", snapshot.len());

        for entry in snapshot {
            report.checked += 1;

            let last_active_at = match self.source.last_activity_of(&entry.game_identity).await {
                Ok(t) => t,
                Err(e) => {
                    warn!(
                        "Activity lookup via {} failed for {} ({}): {}",
                        self.source.name(), entry.user_id, entry.game_identity, e
                    );
                    report.lookup_failed += 1;
                    continue;
                }
            };
            let sample = ActivitySample {
                user_id: entry.user_id.clone(),
                last_active_at,
            };

            match self.policy.evaluate(&sample, now) {
                Verdict::Unknown => {
                    info!("{} ({}) has no play history yet", entry.user_id, entry.game_identity);
                    report.unknown += 1;
                }
                Verdict::Active { elapsed } => {
                    debug!("{} last played {}h ago", entry.user_id, elapsed.num_hours());
                    report.still_active += 1;
                }
                Verdict::Due { elapsed } => {
                    info!(
                        "{} ({}) inactive for {}h; notifying",
                        entry.user_id, entry.game_identity, elapsed.num_hours()
                    );
                    self.fire(&entry, &mut report).await;
                }
            }
        }

        if report.notified + report.notify_failed + report.persist_failed > 0 {
            info!("Scan cycle complete: {:?}", report);
        }
        report
    }

    /// Disarms `entry`, then attempts delivery.
    async fn fire(&self, entry: &UserEntry, report: &mut ScanReport) {
        match self.registry.remove_if_unchanged(entry).await {
            Ok(Some(_)) => {}
            Ok(None) => {
                debug!(
                    "{} was unregistered or re-registered during the scan; skipping",
                    entry.user_id
                );
                return;
            }
            Err(e) => {
                error!(
                    "Could not persist disarm of {}; not notifying to avoid a duplicate: {}",
                    entry.user_id, e
                );
                report.persist_failed += 1;
                return;
            }
        }

        let message = self.policy.render_message(entry);
        match self.deliver(&entry.user_id, &message).await {
            Ok(()) => report.notified += 1,
            Err(e) => {
                warn!("Notification for {} failed; entry stays consumed: {}", entry.user_id, e);
                report.notify_failed += 1;
            }
        }
    }

    async fn deliver(&self, user_id: &UserId, message: &str) -> Result<(), Error> {
        let Some(destination) = self.config.notification_destination.as_deref() else {
            info!("(log-only) no notification destination configured; {}: {}", user_id, message);
            return Ok(());
        };
        let attempts = self.config.notify_attempts.max(1);

        let mut last_err = None;
        for attempt in 1..=attempts {
            match self.sink.notify(user_id, destination, message).await {
                Ok(()) => return Ok(()),
                Err(e) => {
                    debug!("Notify attempt {}/{} for {} failed: {}", attempt, attempts, user_id, e);
                    last_err = Some(e);
                    if attempt < attempts {
                        tokio::time::sleep(self.config.notify_retry_backoff * attempt).await;
                    }
                }
            }
        }
        Err(last_err.unwrap_or_else(|| Error::Notification("no delivery attempt made".into())))
    }

    /// Looks up how long ago `user_id` last played.
    pub async fn check(&self, user_id: &UserId) -> Result<CheckOutcome, Error> {
        let Some(entry) = self.registry.get(user_id).await else {
            return Ok(CheckOutcome::NotRegistered);
        };
        let last = self.source.last_activity_of(&entry.game_identity).await?;
        let sample = ActivitySample {
            user_id: entry.user_id.clone(),
            last_active_at: last,
        };
        Ok(match sample.elapsed_at(Utc::now()) {
            None => CheckOutcome::NoHistory {
                game_identity: entry.game_identity,
            },
            Some(elapsed) => CheckOutcome::Elapsed {
                game_identity: entry.game_identity,
                elapsed,
            },
        })
    }
}

impl Drop for InactivityMonitor {
    fn drop(&mut self) {
        if let Some(t) = self.timer.get_mut().ok().and_then(|t| t.take()) {
            t.cancel();
        }
    }
}
