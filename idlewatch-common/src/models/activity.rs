use chrono::{DateTime, Duration, Utc};

use crate::models::user::UserId;

/// Result of one activity lookup. Produced per poll, never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivitySample {
    pub user_id: UserId,
    pub last_active_at: Option<DateTime<Utc>>,
}

impl ActivitySample {
    /// Time since the last known activity, or `None` when there is no history.
    /// Timestamps in the future count as zero elapsed.
    pub fn elapsed_at(&self, now: DateTime<Utc>) -> Option<Duration> {
        self.last_active_at
            .map(|t| now.signed_duration_since(t).max(Duration::zero()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn elapsed_is_clamped_for_future_timestamps() {
        let now = Utc::now();
        let sample = ActivitySample {
            user_id: UserId::from("1"),
            last_active_at: Some(now + Duration::hours(2)),
        };
        assert_eq!(sample.elapsed_at(now), Some(Duration::zero()));
    }

    #[test]
    fn unknown_history_has_no_elapsed() {
        let sample = ActivitySample {
            user_id: UserId::from("1"),
            last_active_at: None,
        };
        assert_eq!(sample.elapsed_at(Utc::now()), None);
    }
}
