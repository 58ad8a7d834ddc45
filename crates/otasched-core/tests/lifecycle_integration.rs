//! Integration tests for the full scheduling lifecycle.
//!
//! These tests run the real scheduler against a real backing file across
//! simulated process restarts: every "reboot" builds a fresh Scheduler
//! (and a fresh timer table -- in-process timers die with the process)
//! over the same file, with no in-memory state carried over.

use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use otasched_core::storage::CONFIG_FILE_NAME;
use otasched_core::{
    ConfigStore, Event, ScheduleState, Scheduler, TimerError, TimerHandle, TimerPort, PERIOD_MS,
};

/// Fake timer table recording the last requested fire time.
#[derive(Default)]
struct FakeTimerTable {
    next_id: AtomicU64,
    live: Mutex<HashSet<TimerHandle>>,
    last_fire_at: AtomicU64,
}

impl FakeTimerTable {
    fn live_count(&self) -> usize {
        self.live.lock().unwrap().len()
    }
}

/// Local newtype so we can implement the foreign `TimerPort` trait for a
/// shared `Arc` handle (the orphan rule forbids `impl TimerPort for Arc<_>`
/// outside the defining crate).
struct SharedTimer(Arc<FakeTimerTable>);

impl TimerPort for SharedTimer {
    fn arm(&self, fire_at_ms: i64, _period_ms: i64) -> Result<TimerHandle, TimerError> {
        let handle = self.0.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        self.0.live.lock().unwrap().insert(handle);
        self.0.last_fire_at.store(fire_at_ms as u64, Ordering::SeqCst);
        Ok(handle)
    }

    fn cancel(&self, handle: TimerHandle) {
        self.0.live.lock().unwrap().remove(&handle);
    }

    fn is_armed(&self, handle: TimerHandle) -> bool {
        self.0.live.lock().unwrap().contains(&handle)
    }
}

/// One process lifetime: fresh scheduler, fresh timer table, shared file.
fn boot(dir: &std::path::Path) -> (Arc<FakeTimerTable>, Scheduler) {
    let table = Arc::new(FakeTimerTable::default());
    let store = ConfigStore::new(dir.join(CONFIG_FILE_NAME));
    let mut sched = Scheduler::new(store, Box::new(SharedTimer(Arc::clone(&table))));
    sched.recover().expect("recovery must not fail");
    (table, sched)
}

#[test]
fn schedule_survives_reboot() {
    let dir = tempfile::tempdir().unwrap();

    // First boot: nothing persisted, user enables.
    let (table, mut sched) = boot(dir.path());
    assert!(!sched.status().armed);
    let event = sched.enable().unwrap();
    let fire_at = match event {
        Event::ScheduleArmed { fire_at_ms, period_ms, .. } => {
            assert_eq!(period_ms, PERIOD_MS);
            fire_at_ms
        }
        other => panic!("expected ScheduleArmed, got {other:?}"),
    };
    assert_eq!(table.live_count(), 1);

    // Reboot: stored fire time re-armed verbatim (it is in the future
    // here, but recovery passes past times through unchanged as well).
    let (table, rebooted) = boot(dir.path());
    assert_eq!(
        rebooted.status(),
        ScheduleState { armed: true, next_fire_ms: fire_at }
    );
    assert_eq!(table.last_fire_at.load(Ordering::SeqCst), fire_at as u64);
    assert_eq!(table.live_count(), 1);
}

#[test]
fn disabled_schedule_stays_disabled_across_reboot() {
    let dir = tempfile::tempdir().unwrap();

    let (table, mut sched) = boot(dir.path());
    sched.enable().unwrap();
    sched.disable();
    assert_eq!(table.live_count(), 0);

    let (table, rebooted) = boot(dir.path());
    assert!(!rebooted.status().armed);
    // Nothing persisted, so recovery never touched the timer table.
    assert_eq!(table.next_id.load(Ordering::SeqCst), 0);
}

#[test]
fn toggle_cycles_never_push_the_schedule_forward() {
    let dir = tempfile::tempdir().unwrap();

    let (_table, mut sched) = boot(dir.path());
    sched.enable().unwrap();
    let first = sched.status().next_fire_ms;

    // Repeated enables (no disable in between) across reboots keep the
    // original fire time and a single live timer per process.
    for _ in 0..3 {
        let (table, mut sched) = boot(dir.path());
        sched.enable().unwrap();
        assert_eq!(sched.status().next_fire_ms, first);
        assert_eq!(table.live_count(), 1);
    }
}

#[test]
fn field_edits_across_reboots_leave_schedule_untouched() {
    let dir = tempfile::tempdir().unwrap();

    let (_table, mut sched) = boot(dir.path());
    sched.enable().unwrap();
    let fire_at = sched.status().next_fire_ms;
    sched.update_field("server", "staging.example.com").unwrap();

    let (_table, mut rebooted) = boot(dir.path());
    rebooted.update_field("protocol", "https").unwrap();
    let config = rebooted.config();
    assert_eq!(config.server, "staging.example.com");
    assert_eq!(config.protocol, "https");
    assert_eq!(config.monthly, Some(fire_at));
    assert_eq!(rebooted.status().next_fire_ms, fire_at);
}

#[test]
fn recovery_tolerates_a_corrupted_line_in_the_backing_file() {
    let dir = tempfile::tempdir().unwrap();

    let (_table, mut sched) = boot(dir.path());
    sched.enable().unwrap();
    let fire_at = sched.status().next_fire_ms;

    // Simulate a stray garbage line, e.g. from manual editing.
    let path = dir.path().join(CONFIG_FILE_NAME);
    let mut content = std::fs::read_to_string(&path).unwrap();
    content.insert_str(0, "not_a_valid_line\n");
    std::fs::write(&path, content).unwrap();

    let (table, rebooted) = boot(dir.path());
    assert_eq!(rebooted.status().next_fire_ms, fire_at);
    assert_eq!(table.live_count(), 1);
}
