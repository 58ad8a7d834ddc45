use otasched_core::{ConfigStore, Event, ScheduleState, Scheduler, SystemTimer};

use super::format_fire_time;

/// Timer tasks only live for this CLI invocation; the persisted fire time
/// is what outlives the process. Enable/recover still need a runtime so
/// the arm call has a timer facility to talk to.
fn scheduler() -> Result<Scheduler, Box<dyn std::error::Error>> {
    let store = ConfigStore::open_default()?;
    Ok(Scheduler::new(store, Box::new(SystemTimer::new(|_| {}))))
}

pub fn enable() -> Result<(), Box<dyn std::error::Error>> {
    let rt = tokio::runtime::Runtime::new()?;
    let _guard = rt.enter();
    let mut sched = scheduler()?;
    if let Event::ScheduleArmed { fire_at_ms, .. } = sched.enable()? {
        println!("recurring check armed: next probe at {}", format_fire_time(fire_at_ms));
    }
    Ok(())
}

pub fn disable() -> Result<(), Box<dyn std::error::Error>> {
    let mut sched = scheduler()?;
    sched.disable();
    println!("recurring check disarmed");
    Ok(())
}

pub fn recover() -> Result<(), Box<dyn std::error::Error>> {
    let rt = tokio::runtime::Runtime::new()?;
    let _guard = rt.enter();
    let mut sched = scheduler()?;
    match sched.recover()? {
        Some(Event::ScheduleRestored { fire_at_ms, .. }) => {
            println!("schedule restored: next probe at {}", format_fire_time(fire_at_ms));
        }
        _ => println!("no schedule to restore"),
    }
    Ok(())
}

pub fn status(json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let store = ConfigStore::open_default()?;
    let state = ScheduleState::from_config(&store.load_or_bootstrap());
    if json {
        println!("{}", serde_json::to_string_pretty(&state)?);
    } else if state.armed {
        println!("armed: next probe at {}", format_fire_time(state.next_fire_ms));
    } else {
        println!("disarmed");
    }
    Ok(())
}
