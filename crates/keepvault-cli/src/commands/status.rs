//! Status command implementation

use colored::Colorize;
use keepvault_core::{RemoteStore, ScriptedProvider, SyncOptions};

use crate::cli::VaultArgs;
use crate::commands::report::print_report;
use crate::context::VaultContext;
use crate::error::Result;

/// Run the status command
///
/// A dry-run cycle: reports what a sync would do without prompting or
/// writing anything.
pub fn run_status(target: &VaultArgs, json: bool) -> Result<()> {
    let context = VaultContext::resolve(target)?;
    let engine = context.engine()?;
    let mut store = context.open_store()?;

    let options = SyncOptions {
        dry_run: true,
        write_sync_log: false,
        ..SyncOptions::default()
    };
    // Dry runs never prompt, so the scripted answers are never consulted.
    let mut provider = ScriptedProvider::declining();
    let report = engine.run(&mut store, &mut provider, &options)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("{}", "Vault Status".bold());
    println!();
    println!("{}:   {}", "Vault".dimmed(), context.root.display());
    println!("{}:  {}", "Remote".dimmed(), context.remote_path.display());
    println!("{}:   {}", "Notes".dimmed(), store.all_notes()?.len());
    println!();
    print_report(&report);

    if report.actions.is_empty() {
        println!();
        println!("{} Vault and remote are in sync.", "OK".green().bold());
    }
    Ok(())
}
