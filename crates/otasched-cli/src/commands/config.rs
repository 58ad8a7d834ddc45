use clap::Subcommand;
use otasched_core::{ConfigStore, Event, OtaConfig, Scheduler, SystemTimer};

use super::format_fire_time;

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Get a config value
    Get {
        /// Config key (e.g. "server", "port", "protocol")
        key: String,
    },
    /// Set a config value; "monthly" takes true/false and drives the schedule
    Set {
        /// Config key
        key: String,
        /// New value
        value: String,
    },
    /// List all config values as JSON
    List,
    /// Print the backing file path
    Path,
    /// Reset config to defaults (disarms any schedule)
    Reset,
}

pub fn run(action: ConfigAction) -> Result<(), Box<dyn std::error::Error>> {
    let store = ConfigStore::open_default()?;
    match action {
        ConfigAction::Get { key } => {
            let config = store.load_or_bootstrap();
            match config.get(&key) {
                Some(value) => println!("{value}"),
                None => {
                    eprintln!("unknown key: {key}");
                    std::process::exit(1);
                }
            }
        }
        ConfigAction::Set { key, value } => {
            // The toggle path may arm a timer, so give it a runtime.
            let rt = tokio::runtime::Runtime::new()?;
            let _guard = rt.enter();
            let mut sched = Scheduler::new(store, Box::new(SystemTimer::new(|_| {})));
            match sched.handle_preference(&key, &value)? {
                Some(Event::ScheduleArmed { fire_at_ms, .. }) => {
                    println!("recurring check armed: next probe at {}", format_fire_time(fire_at_ms));
                }
                Some(Event::ScheduleDisarmed { .. }) => println!("recurring check disarmed"),
                _ => println!("ok"),
            }
        }
        ConfigAction::List => {
            let config = store.load_or_bootstrap();
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
        ConfigAction::Path => {
            println!("{}", store.path().display());
        }
        ConfigAction::Reset => {
            store.save(&OtaConfig::default())?;
            println!("config reset to defaults");
        }
    }
    Ok(())
}
