use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Every scheduler transition produces an Event.
/// The CLI prints them; the system timer emits `ProbeDue` when it fires.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    /// A recurring schedule was armed with a fresh or stored fire time.
    ScheduleArmed {
        fire_at_ms: i64,
        period_ms: i64,
        at: DateTime<Utc>,
    },
    /// A persisted schedule was re-armed after a restart.
    ScheduleRestored {
        fire_at_ms: i64,
        period_ms: i64,
        at: DateTime<Utc>,
    },
    /// The recurring schedule was cancelled.
    ScheduleDisarmed { at: DateTime<Utc> },
    /// The platform timer fired: an update probe is due now.
    ProbeDue { at: DateTime<Utc> },
}
