//! The scheduling state machine.
//!
//! One [`Scheduler`] instance owns the config store and the timer port;
//! there is no ambient or static scheduler state. Every lifecycle event
//! (enable, disable, boot-recovery, field edit) is one synchronous
//! operation that recomputes from persisted state, drives the timer, and
//! writes the outcome back.
//!
//! ## Invariants
//!
//! - At most one live platform timer: arming always cancels first, even
//!   when internal bookkeeping says nothing is armed.
//! - The persisted `monthly` field is the single source of truth for the
//!   next fire time; in-memory state is always recomputed from it, never
//!   assumed across restarts.
//! - A stored fire time wins over `now + period` on enable, so toggling
//!   off and on never pushes the schedule forward.

use chrono::Utc;
use tracing::{debug, error, info};

use crate::error::{CoreError, Result};
use crate::events::Event;
use crate::schedule::{now_ms, ScheduleState, PERIOD_MS};
use crate::storage::{ConfigStore, OtaConfig};
use crate::timer::{TimerHandle, TimerPort};

pub struct Scheduler {
    store: ConfigStore,
    timer: Box<dyn TimerPort>,
    state: ScheduleState,
    handle: Option<TimerHandle>,
}

impl Scheduler {
    /// Starts `Disarmed`; call [`recover`](Self::recover) once at startup
    /// to rebuild state from the persisted configuration.
    pub fn new(store: ConfigStore, timer: Box<dyn TimerPort>) -> Self {
        Self {
            store,
            timer,
            state: ScheduleState::disarmed(),
            handle: None,
        }
    }

    // ── Lifecycle events ─────────────────────────────────────────────

    /// User turned the recurring check on.
    ///
    /// Reuses a previously persisted fire time when one exists, otherwise
    /// schedules `now + period`. A persistence failure is logged and not
    /// escalated: the in-session timer still runs, only restart survival
    /// is lost.
    ///
    /// # Errors
    /// [`CoreError::Timer`] when the platform timer is unavailable; state
    /// stays `Disarmed`.
    pub fn enable(&mut self) -> Result<Event> {
        let mut config = self.store.load_or_bootstrap();
        let stored = config.monthly.unwrap_or(0);
        let fire_at_ms = if stored > 0 {
            debug!("reusing stored fire time {stored}");
            stored
        } else {
            let fresh = now_ms() + PERIOD_MS;
            debug!("no stored fire time, scheduling {fresh}");
            fresh
        };

        self.arm(fire_at_ms)?;

        config.monthly = Some(fire_at_ms);
        if let Err(e) = self.store.save(&config) {
            error!("schedule armed but not persisted, a restart will lose it: {e}");
        }
        info!("recurring check armed for {fire_at_ms}");
        Ok(Event::ScheduleArmed {
            fire_at_ms,
            period_ms: PERIOD_MS,
            at: Utc::now(),
        })
    }

    /// User turned the recurring check off. Always succeeds: cancellation
    /// is idempotent and a second disable is a silent no-op.
    pub fn disable(&mut self) -> Event {
        self.cancel_current();
        let mut config = self.store.load_or_bootstrap();
        if config.monthly.take().is_some() {
            if let Err(e) = self.store.save(&config) {
                error!("failed to clear persisted fire time: {e}");
            }
        }
        info!("recurring check disarmed");
        Event::ScheduleDisarmed { at: Utc::now() }
    }

    /// Boot-recovery: rebuild scheduler state purely from the persisted
    /// file. Call exactly once at process start.
    ///
    /// Returns `None` when nothing was persisted (silent no-op). A stored
    /// fire time is re-armed verbatim; a past time makes the platform
    /// timer fire immediately, the intended catch-up behavior.
    ///
    /// # Errors
    /// [`CoreError::Timer`] when the platform timer is unavailable; state
    /// stays `Disarmed`.
    pub fn recover(&mut self) -> Result<Option<Event>> {
        let config = self.store.load_or_bootstrap();
        let stored = config.monthly.unwrap_or(0);
        if stored <= 0 {
            debug!("no schedule to restore");
            return Ok(None);
        }

        info!("restoring schedule for {stored} after restart");
        self.arm(stored)?;
        Ok(Some(Event::ScheduleRestored {
            fire_at_ms: stored,
            period_ms: PERIOD_MS,
            at: Utc::now(),
        }))
    }

    /// Persist an edited configuration field without touching the timer.
    /// The stored fire time is preserved untouched.
    ///
    /// # Errors
    /// Invalid field values and write failures are returned to the caller;
    /// the schedule itself is unaffected either way.
    pub fn update_field(&mut self, key: &str, value: &str) -> Result<()> {
        let mut config = self.store.load_or_bootstrap();
        config.set_field(key, value)?;
        self.store.save(&config)?;
        Ok(())
    }

    /// String boundary for the UI toggle: the `monthly` key takes a
    /// two-state value, anything else is rejected before any transition
    /// is attempted.
    ///
    /// # Errors
    /// [`CoreError::InvalidToggle`] for a non-boolean toggle value, plus
    /// whatever the underlying transition returns.
    pub fn handle_preference(&mut self, key: &str, value: &str) -> Result<Option<Event>> {
        if key == "monthly" {
            return match value {
                "true" => self.enable().map(Some),
                "false" => Ok(Some(self.disable())),
                other => Err(CoreError::InvalidToggle(other.to_string())),
            };
        }
        self.update_field(key, value)?;
        Ok(None)
    }

    // ── Queries ──────────────────────────────────────────────────────

    /// Armed/disarmed status and next fire time, recomputed from the
    /// persisted record (the store is authoritative, not the timer table).
    pub fn status(&self) -> ScheduleState {
        ScheduleState::from_config(&self.store.load_or_bootstrap())
    }

    /// In-memory machine state for this process lifetime. Diverges from
    /// [`status`](Self::status) only after a failed persist.
    pub fn state(&self) -> ScheduleState {
        self.state
    }

    /// Liveness of the in-session timer handle, diagnostics only.
    pub fn timer_live(&self) -> bool {
        self.handle.map(|h| self.timer.is_armed(h)).unwrap_or(false)
    }

    pub fn config(&self) -> OtaConfig {
        self.store.load_or_bootstrap()
    }

    pub fn store(&self) -> &ConfigStore {
        &self.store
    }

    // ── Internal ─────────────────────────────────────────────────────

    /// Cancel-then-arm. Cancelling unconditionally protects against drift
    /// between persisted state and the platform's live timer table.
    fn arm(&mut self, fire_at_ms: i64) -> Result<()> {
        self.cancel_current();
        match self.timer.arm(fire_at_ms, PERIOD_MS) {
            Ok(handle) => {
                self.handle = Some(handle);
                self.state = ScheduleState::armed_at(fire_at_ms);
                Ok(())
            }
            Err(e) => {
                error!("could not arm platform timer: {e}");
                self.state = ScheduleState::disarmed();
                Err(e.into())
            }
        }
    }

    fn cancel_current(&mut self) {
        if let Some(handle) = self.handle.take() {
            self.timer.cancel(handle);
        }
        self.state = ScheduleState::disarmed();
    }
}
