// File: idlewatch-core/tests/monitor_tests.rs

mod test_utils;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};

use idlewatch_common::models::UserId;
use idlewatch_common::traits::ActivitySource;
use idlewatch_core::monitor::ScanReport;
use idlewatch_core::{Error, UserRegistry};

use test_utils::{
    build_monitor, memory_registry, monitor_config, Activity, FlakyStore, MockSink, RecordingSink,
    ScriptedSource,
};

const RIOT_ID: &str = "Nanashi#JP1";

#[tokio::test]
async fn long_inactive_user_is_notified_once_and_disarmed() {
    let now = Utc::now();
    let registry = memory_registry();
    registry.register(UserId::from("100"), RIOT_ID).await.unwrap();

    let source = Arc::new(ScriptedSource::at(now).with(RIOT_ID, Activity::Ago(Duration::hours(25))));
    let mut sink = MockSink::new();
    sink.expect_notify()
        .withf(|user_id, destination, message| {
            user_id.as_str() == "100" && destination == "1234567890" && message.contains("<@100>")
        })
        .times(1)
        .returning(|_, _, _| Ok(()));

    let monitor = build_monitor(registry.clone(), source, Arc::new(sink), monitor_config(Duration::hours(24)));

    let report = monitor.scan_at(now).await;
    assert_eq!(report.checked, 1);
    assert_eq!(report.notified, 1);
    assert!(registry.get(&UserId::from("100")).await.is_none());

    // Disarmed: later cycles have nothing to look at.
    let report = monitor.scan_at(now + Duration::hours(1)).await;
    assert_eq!(report, ScanReport::default());
}

#[tokio::test]
async fn recently_active_user_is_left_alone() {
    let now = Utc::now();
    let registry = memory_registry();
    registry.register(UserId::from("100"), RIOT_ID).await.unwrap();

    let source = Arc::new(ScriptedSource::at(now).with(RIOT_ID, Activity::Ago(Duration::hours(4))));
    let mut sink = MockSink::new();
    sink.expect_notify().times(0);

    let monitor = build_monitor(registry.clone(), source, Arc::new(sink), monitor_config(Duration::hours(24)));

    let report = monitor.scan_at(now).await;
    assert_eq!(report.still_active, 1);
    let entry = registry.get(&UserId::from("100")).await.unwrap();
    assert_eq!(entry.game_identity, RIOT_ID);
}

#[tokio::test]
async fn user_without_history_stays_armed() {
    let now = Utc::now();
    let registry = memory_registry();
    registry.register(UserId::from("100"), RIOT_ID).await.unwrap();

    let source = Arc::new(ScriptedSource::at(now).with(RIOT_ID, Activity::NoHistory));
    let mut sink = MockSink::new();
    sink.expect_notify().times(0);

    let monitor = build_monitor(registry.clone(), source, Arc::new(sink), monitor_config(Duration::hours(24)));

    for hour in 0..3 {
        let report = monitor.scan_at(now + Duration::hours(hour)).await;
        assert_eq!(report.unknown, 1);
    }
    assert!(registry.get(&UserId::from("100")).await.is_some());
}

#[tokio::test]
async fn failed_delivery_still_consumes_the_entry() {
    let now = Utc::now();
    let registry = memory_registry();
    registry.register(UserId::from("100"), RIOT_ID).await.unwrap();

    let source = Arc::new(ScriptedSource::at(now).with(RIOT_ID, Activity::Ago(Duration::hours(30))));
    let mut sink = MockSink::new();
    sink.expect_notify()
        .times(1)
        .returning(|_, _, _| Err(Error::Notification("channel unreachable".into())));

    let monitor = build_monitor(registry.clone(), source, Arc::new(sink), monitor_config(Duration::hours(24)));

    let report = monitor.scan_at(now).await;
    assert_eq!(report.notify_failed, 1);
    assert_eq!(report.notified, 0);
    assert!(registry.get(&UserId::from("100")).await.is_none());

    let report = monitor.scan_at(now + Duration::hours(1)).await;
    assert_eq!(report.checked, 0);
}

#[tokio::test]
async fn exactly_threshold_counts_as_due() {
    let now = Utc::now();
    let registry = memory_registry();
    registry.register(UserId::from("100"), RIOT_ID).await.unwrap();

    let source = Arc::new(ScriptedSource::at(now).with(RIOT_ID, Activity::Ago(Duration::hours(24))));
    let sink = Arc::new(RecordingSink::default());
    let monitor = build_monitor(registry.clone(), source, sink.clone(), monitor_config(Duration::hours(24)));

    assert_eq!(monitor.scan_at(now).await.notified, 1);
    assert_eq!(sink.count(), 1);
}

#[tokio::test]
async fn only_registered_users_are_notified() {
    let now = Utc::now();
    let registry = memory_registry();
    registry.register(UserId::from("100"), "Active#JP1").await.unwrap();
    registry.register(UserId::from("200"), "Idle#JP1").await.unwrap();

    let source = Arc::new(
        ScriptedSource::at(now)
            .with("Active#JP1", Activity::Ago(Duration::hours(1)))
            .with("Idle#JP1", Activity::Ago(Duration::days(3))),
    );
    let sink = Arc::new(RecordingSink::default());
    let monitor = build_monitor(registry.clone(), source, sink.clone(), monitor_config(Duration::hours(24)));

    // Unregistered before the scan: never looked at.
    registry.remove(&UserId::from("200")).await.unwrap();
    let report = monitor.scan_at(now).await;

    assert_eq!(report.checked, 1);
    assert_eq!(report.notified, 0);
    assert_eq!(sink.count(), 0);
}

#[tokio::test]
async fn one_failing_lookup_does_not_block_the_others() {
    let now = Utc::now();
    let registry = memory_registry();
    registry.register(UserId::from("100"), "Broken#JP1").await.unwrap();
    registry.register(UserId::from("200"), "Idle#JP1").await.unwrap();
    registry.register(UserId::from("300"), "Fresh#JP1").await.unwrap();

    let source = Arc::new(
        ScriptedSource::at(now)
            .with("Broken#JP1", Activity::Unreachable)
            .with("Idle#JP1", Activity::Ago(Duration::days(2)))
            .with("Fresh#JP1", Activity::Ago(Duration::minutes(5))),
    );
    let sink = Arc::new(RecordingSink::default());
    let monitor = build_monitor(registry.clone(), source, sink.clone(), monitor_config(Duration::hours(24)));

    let report = monitor.scan_at(now).await;
    assert_eq!(report.checked, 3);
    assert_eq!(report.lookup_failed, 1);
    assert_eq!(report.still_active, 1);
    assert_eq!(report.notified, 1);

    let delivered = sink.delivered.lock().unwrap();
    assert_eq!(delivered[0].0, UserId::from("200"));
    drop(delivered);

    // The failed lookup is retried next cycle, the others are untouched.
    assert!(registry.get(&UserId::from("100")).await.is_some());
    assert!(registry.get(&UserId::from("300")).await.is_some());
}

#[tokio::test]
async fn unpersisted_disarm_skips_the_notification() {
    let now = Utc::now();
    let store = Arc::new(FlakyStore::default());
    let registry = Arc::new(UserRegistry::load(store.clone()));
    registry.register(UserId::from("100"), RIOT_ID).await.unwrap();

    let source = Arc::new(ScriptedSource::at(now).with(RIOT_ID, Activity::Ago(Duration::days(2))));
    let sink = Arc::new(RecordingSink::default());
    let monitor = build_monitor(registry.clone(), source, sink.clone(), monitor_config(Duration::hours(24)));

    store.fail_saves(true);
    let report = monitor.scan_at(now).await;
    assert_eq!(report.persist_failed, 1);
    assert_eq!(sink.count(), 0);
    assert!(registry.get(&UserId::from("100")).await.is_some());

    // Once the store recovers the user is notified on the next cycle.
    store.fail_saves(false);
    let report = monitor.scan_at(now + Duration::hours(1)).await;
    assert_eq!(report.notified, 1);
    assert_eq!(sink.count(), 1);
    assert!(store.snapshot().is_empty());
}

#[tokio::test]
async fn delivery_is_retried_within_the_cycle() {
    let now = Utc::now();
    let registry = memory_registry();
    registry.register(UserId::from("100"), RIOT_ID).await.unwrap();

    let source = Arc::new(ScriptedSource::at(now).with(RIOT_ID, Activity::Ago(Duration::days(2))));
    let attempts = Arc::new(AtomicUsize::new(0));
    let seen = attempts.clone();
    let mut sink = MockSink::new();
    sink.expect_notify().times(3).returning(move |_, _, _| {
        if seen.fetch_add(1, Ordering::SeqCst) < 2 {
            Err(Error::Notification("503".into()))
        } else {
            Ok(())
        }
    });

    let mut config = monitor_config(Duration::hours(24));
    config.notify_attempts = 3;
    let monitor = build_monitor(registry, source, Arc::new(sink), config);

    let report = monitor.scan_at(now).await;
    assert_eq!(report.notified, 1);
    assert_eq!(attempts.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn check_reports_elapsed_time() {
    let registry = memory_registry();
    registry.register(UserId::from("100"), RIOT_ID).await.unwrap();
    registry.register(UserId::from("200"), "New#JP1").await.unwrap();

    let source = Arc::new(ScriptedSource::live().with(RIOT_ID, Activity::Ago(Duration::hours(5))));
    let monitor = build_monitor(
        registry,
        source,
        Arc::new(RecordingSink::default()),
        monitor_config(Duration::hours(24)),
    );

    match monitor.check(&UserId::from("100")).await.unwrap() {
        idlewatch_core::monitor::CheckOutcome::Elapsed { game_identity, elapsed } => {
            assert_eq!(game_identity, RIOT_ID);
            assert_eq!(elapsed.num_hours(), 5);
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
    assert_eq!(
        monitor.check(&UserId::from("200")).await.unwrap(),
        idlewatch_core::monitor::CheckOutcome::NoHistory {
            game_identity: "New#JP1".into()
        }
    );
    assert_eq!(
        monitor.check(&UserId::from("300")).await.unwrap(),
        idlewatch_core::monitor::CheckOutcome::NotRegistered
    );
}

/// Re-registers the member with a new Riot ID while their old one is being
/// looked up, and reports the old one as long inactive.
struct ReRegisteringSource {
    registry: Arc<UserRegistry>,
}

#[async_trait]
impl ActivitySource for ReRegisteringSource {
    async fn last_activity_of(&self, game_identity: &str) -> Result<Option<DateTime<Utc>>, Error> {
        if game_identity == "Old#JP1" {
            self.registry.register(UserId::from("100"), "Fresh#JP1").await?;
        }
        Ok(Some(Utc::now() - Duration::days(3)))
    }
}

#[tokio::test]
async fn reregistration_during_lookup_keeps_the_new_entry() {
    let registry = memory_registry();
    registry.register(UserId::from("100"), "Old#JP1").await.unwrap();

    let source = Arc::new(ReRegisteringSource { registry: registry.clone() });
    let mut sink = MockSink::new();
    sink.expect_notify().times(0);

    let monitor = build_monitor(registry.clone(), source, Arc::new(sink), monitor_config(Duration::hours(24)));

    let report = monitor.scan_at(Utc::now()).await;
    assert_eq!(report.checked, 1);
    assert_eq!(report.notified, 0);

    let entry = registry.get(&UserId::from("100")).await.unwrap();
    assert_eq!(entry.game_identity, "Fresh#JP1");
}

#[tokio::test]
async fn missing_destination_logs_instead_of_calling_the_sink() {
    let now = Utc::now();
    let registry = memory_registry();
    registry.register(UserId::from("100"), RIOT_ID).await.unwrap();

    let source = Arc::new(ScriptedSource::at(now).with(RIOT_ID, Activity::Ago(Duration::days(2))));
    let mut sink = MockSink::new();
    sink.expect_notify().times(0);

    let mut config = monitor_config(Duration::hours(24));
    config.notification_destination = None;
    let monitor = build_monitor(registry.clone(), source, Arc::new(sink), config);

    let report = monitor.scan_at(now).await;
    assert_eq!(report.notified, 1);
    assert!(registry.get(&UserId::from("100")).await.is_none());
}
