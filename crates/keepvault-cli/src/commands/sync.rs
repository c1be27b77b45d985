//! Sync command implementation

use colored::Colorize;

use crate::cli::{SyncFlags, VaultArgs};
use crate::commands::report::print_report;
use crate::context::VaultContext;
use crate::error::{CliError, Result};
use crate::interactive::TerminalDecisionProvider;

/// Run the sync command
///
/// Runs one full cycle against the JSON remote store. Returns an error when
/// the run aborts or finishes with per-note failures.
pub fn run_sync(target: &VaultArgs, flags: &SyncFlags) -> Result<()> {
    let context = VaultContext::resolve(target)?;
    let options = flags.options();

    if !flags.json {
        let mode = if options.dry_run { " (dry run)" } else { "" };
        println!(
            "{} Synchronizing {}{}...",
            "=>".blue().bold(),
            context.root.display(),
            mode
        );
    }

    let engine = context.engine()?;
    let mut store = context.open_store()?;
    let mut provider = TerminalDecisionProvider;
    let report = engine.run(&mut store, &mut provider, &options)?;

    if flags.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
        println!();
        if report.success {
            println!("{} Synchronization complete.", "OK".green().bold());
        } else {
            println!("{} Synchronization finished with errors.", "ERROR".red().bold());
        }
    }

    if !report.success {
        return Err(CliError::user(format!(
            "{} error(s) during sync",
            report.errors.len()
        )));
    }
    Ok(())
}
