use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "otasched", version, about = "OTA update-probe scheduler")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Turn the recurring update check on
    Enable,
    /// Turn the recurring update check off
    Disable,
    /// Print the current schedule status
    Status {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Re-arm a persisted schedule after a restart
    Recover,
    /// Recover, then keep running and print probe events as they fire
    Watch,
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Enable => commands::schedule::enable(),
        Commands::Disable => commands::schedule::disable(),
        Commands::Status { json } => commands::schedule::status(json),
        Commands::Recover => commands::schedule::recover(),
        Commands::Watch => commands::watch::run(),
        Commands::Config { action } => commands::config::run(action),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
