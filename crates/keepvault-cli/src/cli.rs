//! CLI argument parsing using clap derive

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use keepvault_core::SyncOptions;

/// keepvault - Keep a markdown vault and a note store in sync
#[derive(Parser, Debug)]
#[command(name = "keepvault")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Also write log events to this file
    #[arg(long, global = true, value_name = "FILE")]
    pub log_file: Option<PathBuf>,

    /// The command to run
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available commands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Pull remote notes into the vault, then push local edits
    ///
    /// Examples:
    ///   keepvault sync                     # Interactive sync of the current vault
    ///   keepvault sync --dry-run           # Show what would change
    ///   keepvault sync --automatic         # Fail instead of prompting on conflicts
    ///   keepvault sync --cherry-pick       # Choose a side for every differing note
    Sync {
        #[command(flatten)]
        target: VaultArgs,

        #[command(flatten)]
        flags: SyncFlags,
    },

    /// Show what a sync would do without changing anything
    Status {
        #[command(flatten)]
        target: VaultArgs,

        /// Output as JSON for scripting
        #[arg(long)]
        json: bool,
    },
}

/// Which vault and remote store to work on.
#[derive(Args, Debug, Clone, Default, PartialEq, Eq)]
pub struct VaultArgs {
    /// Vault directory (default: the enclosing vault of the current directory)
    #[arg(long, value_name = "DIR")]
    pub vault: Option<PathBuf>,

    /// JSON file holding the remote store (default: <vault>/.keepvault/remote.json)
    #[arg(long, value_name = "FILE")]
    pub remote: Option<PathBuf>,
}

/// Run flags of the sync command.
#[derive(Args, Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncFlags {
    /// Preview changes without applying them
    #[arg(long)]
    pub dry_run: bool,

    /// Overwrite local files from the remote on any difference
    #[arg(long)]
    pub force_pull: bool,

    /// Push local changes even when the remote is newer, without confirmation
    #[arg(long)]
    pub force_push: bool,

    /// Pick local or remote for each differing note
    #[arg(long)]
    pub cherry_pick: bool,

    /// Never prompt; unresolved conflicts abort the run
    #[arg(long)]
    pub automatic: bool,

    /// Skip the pull phase
    #[arg(long)]
    pub skip_pull: bool,

    /// Skip the push phase
    #[arg(long)]
    pub skip_push: bool,

    /// Do not update the sync log note
    #[arg(long)]
    pub no_sync_log: bool,

    /// Output the report as JSON
    #[arg(long)]
    pub json: bool,
}

impl SyncFlags {
    pub fn options(&self) -> SyncOptions {
        SyncOptions {
            skip_pull: self.skip_pull,
            skip_push: self.skip_push,
            dry_run: self.dry_run,
            force_pull: self.force_pull,
            force_push: self.force_push,
            cherry_pick: self.cherry_pick,
            automatic: self.automatic,
            write_sync_log: !self.no_sync_log,
        }
    }
}
