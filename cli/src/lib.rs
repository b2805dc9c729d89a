//! Bazaar CLI
//!
//! Drives the client session against the durable store, one command per run.
//! Every run opens a fresh view, so the output always reflects what is stored.

pub mod commands;
pub mod state;

use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;

use bazaar_core::Config;
use commands::{history, sessions, CommandResult};
use state::AppState;

#[derive(Parser)]
#[command(name = "bazaar")]
#[command(about = "Inspect and drive the marketplace client session")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path (JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory holding the session database
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the current session
    Status,
    /// Sign in
    Login,
    /// Sign out and abandon any registration
    Logout,
    /// Browse as a guest
    Guest,
    /// Start registration
    Register {
        /// Where to go once registration completes
        #[arg(long)]
        then: Option<String>,
    },
    /// Set the registration step (basic, contact, verification, complete)
    Step { step: String },
    /// Move registration to its next step
    Advance,
    /// Finish registration and go to the pending target
    Complete,
    /// Show recent navigations
    History {
        #[arg(short, long, default_value = "10")]
        limit: usize,
    },
    /// Clear the stored session
    Reset,
}

impl Cli {
    fn load_config(&self) -> anyhow::Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::load(path)?,
            None => Config::default(),
        };

        if let Some(data_dir) = &self.data_dir {
            config.database_path = Config::new(data_dir.clone()).database_path;
        }

        Ok(config)
    }
}

fn print<T: Serialize>(result: CommandResult<T>) -> anyhow::Result<bool> {
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(result.success)
}

/// Run one command. Returns whether it succeeded.
pub fn run(cli: Cli) -> anyhow::Result<bool> {
    bazaar_core::init_logging_with(if cli.verbose { "debug" } else { "warn" });

    let config = cli.load_config()?;
    let state = AppState::new(config)?;

    tracing::debug!(path = %state.app().config().database_path.display(), "Running command");

    match cli.command {
        Commands::Status => print(sessions::get_status(&state)),
        Commands::Login => print(sessions::login(&state)),
        Commands::Logout => print(sessions::logout(&state)),
        Commands::Guest => print(sessions::continue_as_guest(&state)),
        Commands::Register { then } => print(sessions::start_registration(&state, then)),
        Commands::Step { step } => print(sessions::set_registration_step(&state, step)),
        Commands::Advance => print(sessions::advance_registration(&state)),
        Commands::Complete => print(sessions::complete_registration(&state)),
        Commands::History { limit } => print(history::get_history(&state, limit)),
        Commands::Reset => print(sessions::reset(&state)),
    }
}
