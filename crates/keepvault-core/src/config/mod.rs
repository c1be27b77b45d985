//! Configuration for a vault sync
//!
//! Configuration is loaded and merged from these sources (later sources
//! override earlier):
//!
//! 1. **Built-in defaults** - [`SyncConfig::default`]
//! 2. **Global config** - `<config_dir>/keepvault/config.toml`
//! 3. **Vault config** - `<vault>/.keepvault/config.toml`
//! 4. **Local overrides** - `<vault>/.keepvault/config.local.toml`
//!
//! Command-line flags are applied on top by the CLI.
//!
//! # Example
//!
//! ```toml
//! [vault]
//! archived_dir = "Archive"
//!
//! [placement]
//! max_filename_length = 60
//!
//! [sync_log]
//! enabled = false
//! ```

mod resolver;
mod settings;

pub use resolver::ConfigResolver;
pub use settings::{PlacementConfig, RemoteConfig, SyncConfig, SyncLogConfig, VaultConfig};
