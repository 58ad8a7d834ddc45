//! Tokio-backed [`TimerPort`] implementation.
//!
//! Each armed handle owns one spawned task that sleeps until the fire
//! time (no sleep at all when the fire time is already past, the catch-up
//! case), then invokes the probe callback on every period tick.
//! Cancellation removes the handle from the live set; the task checks the
//! set before every firing and exits once its handle is gone.

use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use chrono::Utc;
use tracing::debug;

use super::{TimerHandle, TimerPort};
use crate::error::TimerError;
use crate::events::Event;
use crate::schedule::now_ms;

type ProbeCallback = Arc<dyn Fn(Event) + Send + Sync>;

pub struct SystemTimer {
    next_id: AtomicU64,
    live: Arc<Mutex<HashSet<TimerHandle>>>,
    on_fire: ProbeCallback,
}

impl SystemTimer {
    /// The callback receives [`Event::ProbeDue`] on every firing.
    pub fn new(on_fire: impl Fn(Event) + Send + Sync + 'static) -> Self {
        Self {
            next_id: AtomicU64::new(1),
            live: Arc::new(Mutex::new(HashSet::new())),
            on_fire: Arc::new(on_fire),
        }
    }

    fn live_set(set: &Mutex<HashSet<TimerHandle>>) -> MutexGuard<'_, HashSet<TimerHandle>> {
        match set.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl TimerPort for SystemTimer {
    fn arm(&self, fire_at_ms: i64, period_ms: i64) -> Result<TimerHandle, TimerError> {
        // No runtime means no timer facility; the transition is aborted,
        // not retried.
        let runtime = tokio::runtime::Handle::try_current().map_err(|_| TimerError::Unavailable)?;

        let handle = self.next_id.fetch_add(1, Ordering::Relaxed);
        Self::live_set(&self.live).insert(handle);

        let live = Arc::clone(&self.live);
        let on_fire = Arc::clone(&self.on_fire);
        runtime.spawn(async move {
            let delay = (fire_at_ms - now_ms()).max(0) as u64;
            tokio::time::sleep(Duration::from_millis(delay)).await;
            loop {
                if !Self::live_set(&live).contains(&handle) {
                    debug!("timer {handle} cancelled, task exiting");
                    return;
                }
                on_fire(Event::ProbeDue { at: Utc::now() });
                tokio::time::sleep(Duration::from_millis(period_ms.max(1) as u64)).await;
            }
        });
        Ok(handle)
    }

    fn cancel(&self, handle: TimerHandle) {
        Self::live_set(&self.live).remove(&handle);
    }

    fn is_armed(&self, handle: TimerHandle) -> bool {
        Self::live_set(&self.live).contains(&handle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn arm_outside_runtime_is_unavailable() {
        let timer = SystemTimer::new(|_| {});
        assert!(matches!(timer.arm(0, 1000), Err(TimerError::Unavailable)));
    }

    #[tokio::test]
    async fn past_fire_time_fires_immediately() {
        let fired = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&fired);
        let timer = SystemTimer::new(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        let handle = timer.arm(now_ms() - 10_000, 60_000).unwrap();
        assert!(timer.is_armed(handle));
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(fired.load(Ordering::SeqCst) >= 1);
        timer.cancel(handle);
        assert!(!timer.is_armed(handle));
    }

    #[tokio::test]
    async fn cancel_is_idempotent() {
        let timer = SystemTimer::new(|_| {});
        let handle = timer.arm(now_ms() + 60_000, 60_000).unwrap();
        timer.cancel(handle);
        timer.cancel(handle);
        // Unknown handle is a no-op too.
        timer.cancel(9999);
        assert!(!timer.is_armed(handle));
    }

    #[tokio::test]
    async fn cancelled_timer_does_not_fire() {
        let fired = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&fired);
        let timer = SystemTimer::new(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        let handle = timer.arm(now_ms() + 20, 60_000).unwrap();
        timer.cancel(handle);
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }
}
