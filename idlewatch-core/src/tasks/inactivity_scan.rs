// idlewatch-core/src/tasks/inactivity_scan.rs

use std::sync::Weak;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::monitor::InactivityMonitor;

/// Handle to the running scan loop. Cancelling stops the loop between scans;
/// a scan that has already started runs to completion.
pub struct ScanTimer {
    token: CancellationToken,
    handle: JoinHandle<()>,
}

impl ScanTimer {
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_running(&self) -> bool {
        !self.token.is_cancelled() && !self.handle.is_finished()
    }
}

/// Spawns the recurring scan. The first scan happens one `period` after
/// spawning, then every `period`. The task holds only a weak reference so a
/// dropped monitor also ends the loop.
pub fn spawn_inactivity_scan_task(monitor: Weak<InactivityMonitor>, period: Duration) -> ScanTimer {
    let token = CancellationToken::new();
    let task_token = token.clone();

    let handle = tokio::spawn(async move {
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = task_token.cancelled() => break,
                _ = ticker.tick() => {}
            }

            let Some(monitor) = monitor.upgrade() else {
                debug!("Inactivity monitor dropped; stopping scan loop");
                break;
            };
            let report = monitor.scan().await;
            debug!("Scan cycle finished: {:?}", report);
        }

        info!("Inactivity scan loop stopped");
    });

    ScanTimer { token, handle }
}
