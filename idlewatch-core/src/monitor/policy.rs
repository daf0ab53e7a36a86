use chrono::{DateTime, Duration, Utc};

use idlewatch_common::models::{ActivitySample, UserEntry};

/// Outcome of applying the threshold to one activity sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// No activity history; the user stays armed.
    Unknown,
    /// Played recently enough.
    Active { elapsed: Duration },
    /// Inactive for at least the threshold.
    Due { elapsed: Duration },
}

#[derive(Debug, Clone, Copy)]
pub struct InactivityPolicy {
    threshold: Duration,
}

impl InactivityPolicy {
    pub fn new(threshold: Duration) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> Duration {
        self.threshold
    }

    /// Due exactly when `now - last_active_at >= threshold`.
    pub fn evaluate(&self, sample: &ActivitySample, now: DateTime<Utc>) -> Verdict {
        match sample.elapsed_at(now) {
            None => Verdict::Unknown,
            Some(elapsed) if elapsed >= self.threshold => Verdict::Due { elapsed },
            Some(elapsed) => Verdict::Active { elapsed },
        }
    }

    pub fn render_message(&self, entry: &UserEntry) -> String {
        format!(
            "{}, you haven't played League of Legends for {} hours! (Riot ID: {})",
            entry.user_id.mention(),
            self.threshold.num_hours(),
            entry.game_identity
        )
    }
}
