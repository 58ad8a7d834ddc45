//! Platform timer abstraction.
//!
//! The scheduler drives the platform's repeating-timer facility through
//! [`TimerPort`]; the persisted configuration, not the timer table, is the
//! authoritative record of what is scheduled.

mod system;

pub use system::SystemTimer;

use crate::error::TimerError;

/// Opaque identifier for an armed timer.
pub type TimerHandle = u64;

/// Contract the core requires from the platform timer facility.
pub trait TimerPort: Send + Sync {
    /// Schedule a repeating callback. A `fire_at_ms` in the past fires
    /// immediately, then every `period_ms` thereafter.
    fn arm(&self, fire_at_ms: i64, period_ms: i64) -> Result<TimerHandle, TimerError>;

    /// Cancel an armed timer. Idempotent: cancelling an already-cancelled
    /// or unknown handle is a no-op, not an error.
    fn cancel(&self, handle: TimerHandle);

    /// Best-effort liveness query for diagnostics only.
    fn is_armed(&self, handle: TimerHandle) -> bool;
}
