use chrono::{DateTime, Duration, TimeZone, Utc};

/// Convert epoch milliseconds (as returned by the Riot match API) to a UTC timestamp.
pub fn from_epoch_millis(millis: i64) -> Option<DateTime<Utc>> {
    Utc.timestamp_millis_opt(millis).single()
}

/// Human-readable elapsed time, floored to whole hours: `"2d 5h"`, or `"5h"`
/// when less than a day has passed.
pub fn format_elapsed(elapsed: Duration) -> String {
    let total_hours = elapsed.num_hours().max(0);
    let days = total_hours / 24;
    let hours = total_hours % 24;
    if days > 0 {
        format!("{days}d {hours}h")
    } else {
        format!("{hours}h")
    }
}
