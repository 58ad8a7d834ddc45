pub mod config;
pub mod schedule;
pub mod watch;

use chrono::{TimeZone, Utc};

/// Render an epoch-millisecond fire time for humans.
pub(crate) fn format_fire_time(ms: i64) -> String {
    match Utc.timestamp_millis_opt(ms).single() {
        Some(t) => t.to_rfc3339(),
        None => format!("{ms} ms"),
    }
}
