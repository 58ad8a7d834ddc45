//! Derived schedule state.
//!
//! [`ScheduleState`] is a pure projection of the persisted configuration:
//! the `monthly` field is the single source of truth for the next fire
//! time, and this module never performs I/O.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::storage::OtaConfig;

/// Fixed interval between recurring probe firings: 30 days.
pub const PERIOD_MS: i64 = 30 * 24 * 60 * 60 * 1000;

/// Whether a timer is armed, and for when.
///
/// `next_fire_ms` is meaningful only while `armed` is true. A fire time of
/// exactly 0 means "unset", distinct from any real epoch time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleState {
    pub armed: bool,
    pub next_fire_ms: i64,
}

impl ScheduleState {
    /// Derive the state from a configuration record.
    pub fn from_config(config: &OtaConfig) -> Self {
        let stored = config.monthly.unwrap_or(0);
        Self {
            armed: stored > 0,
            next_fire_ms: stored.max(0),
        }
    }

    pub fn disarmed() -> Self {
        Self {
            armed: false,
            next_fire_ms: 0,
        }
    }

    pub fn armed_at(fire_at_ms: i64) -> Self {
        Self {
            armed: true,
            next_fire_ms: fire_at_ms,
        }
    }
}

/// Current wall-clock time in epoch milliseconds.
pub fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_monthly_is_disarmed() {
        let config = OtaConfig::default();
        assert_eq!(ScheduleState::from_config(&config), ScheduleState::disarmed());
    }

    #[test]
    fn zero_monthly_means_unset() {
        let mut config = OtaConfig::default();
        config.monthly = Some(0);
        let state = ScheduleState::from_config(&config);
        assert!(!state.armed);
        assert_eq!(state.next_fire_ms, 0);
    }

    #[test]
    fn positive_monthly_is_armed() {
        let mut config = OtaConfig::default();
        config.monthly = Some(1_700_000_000_000);
        let state = ScheduleState::from_config(&config);
        assert!(state.armed);
        assert_eq!(state.next_fire_ms, 1_700_000_000_000);
    }

    #[test]
    fn negative_monthly_is_disarmed() {
        let mut config = OtaConfig::default();
        config.monthly = Some(-5);
        let state = ScheduleState::from_config(&config);
        assert!(!state.armed);
        assert_eq!(state.next_fire_ms, 0);
    }

    #[test]
    fn period_is_thirty_days() {
        assert_eq!(PERIOD_MS, 2_592_000_000);
    }
}
