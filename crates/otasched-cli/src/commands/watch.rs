use otasched_core::{ConfigStore, Event, Scheduler, SystemTimer};

use super::format_fire_time;

/// Recover the persisted schedule, then stay alive printing probe events
/// as JSON lines until the process is killed. This is the long-running
/// host for the in-process timer; one-shot commands only mutate the
/// persisted state.
pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    let rt = tokio::runtime::Runtime::new()?;
    let _guard = rt.enter();

    let (tx, rx) = std::sync::mpsc::channel();
    let timer = SystemTimer::new(move |event| {
        let _ = tx.send(event);
    });
    let mut sched = Scheduler::new(ConfigStore::open_default()?, Box::new(timer));

    match sched.recover()? {
        Some(Event::ScheduleRestored { fire_at_ms, .. }) => {
            eprintln!("schedule restored: next probe at {}", format_fire_time(fire_at_ms));
        }
        _ => {
            eprintln!("no schedule persisted; run 'otasched enable' first");
            return Ok(());
        }
    }

    // Blocks between firings; ends only if every sender is gone, which
    // cannot happen while the scheduler holds the timer.
    for event in rx {
        println!("{}", serde_json::to_string(&event)?);
    }
    Ok(())
}
