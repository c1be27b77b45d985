//! keepvault CLI
//!
//! Command-line interface for syncing a markdown vault with a note store.

mod cli;
mod commands;
mod context;
mod error;
mod interactive;
mod logging;

use clap::Parser;
use colored::Colorize;

use cli::{Cli, Commands};
use error::Result;

fn main() {
    if let Err(e) = run() {
        eprintln!("{}: {}", "error".red().bold(), e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose, cli.log_file.as_deref())?;

    match cli.command {
        Some(cmd) => execute_command(cmd),
        None => {
            println!("{} markdown vault sync", "keepvault".green().bold());
            println!();
            println!("Run {} for available commands.", "keepvault --help".cyan());
            Ok(())
        }
    }
}

fn execute_command(cmd: Commands) -> Result<()> {
    match cmd {
        Commands::Sync { target, flags } => commands::run_sync(&target, &flags),
        Commands::Status { target, json } => commands::run_status(&target, json),
    }
}
