//! # otasched Core Library
//!
//! Core logic for the recurring OTA update-probe scheduler. The probe must
//! fire on a fixed 30-day period, survive process restarts and device
//! reboots, and persist its configuration and next-fire time to durable
//! storage in a crash-safe way. The CLI binary is a thin layer over this
//! library.
//!
//! ## Key components
//!
//! - [`ConfigStore`]: durable `key=value` persistence with tolerant
//!   parsing and atomic whole-file rewrite
//! - [`ScheduleState`]: pure derivation of "armed, and for when" from the
//!   persisted record
//! - [`TimerPort`]: abstraction over the platform's repeating-timer
//!   facility, with a tokio-backed [`SystemTimer`]
//! - [`Scheduler`]: the state machine reacting to lifecycle events
//!   (enable, disable, boot-recovery, field edit)

pub mod error;
pub mod events;
pub mod schedule;
pub mod scheduler;
pub mod storage;
pub mod timer;

pub use error::{ConfigError, CoreError, Result, TimerError};
pub use events::Event;
pub use schedule::{now_ms, ScheduleState, PERIOD_MS};
pub use scheduler::Scheduler;
pub use storage::{data_dir, ConfigStore, OtaConfig};
pub use timer::{SystemTimer, TimerHandle, TimerPort};
