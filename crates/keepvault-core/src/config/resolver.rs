//! Configuration resolution with hierarchical merge
//!
//! Each present layer is parsed as a TOML table and deep-merged over the
//! previous result, so a layer only needs the keys it changes.

use std::fs;
use std::path::{Path, PathBuf};

use keepvault_fs::{NormalizedPath, VaultDir};
use toml::Value;

use super::settings::SyncConfig;
use crate::{Error, Result};

const CONFIG_FILE: &str = "config.toml";
const LOCAL_CONFIG_FILE: &str = "config.local.toml";

/// Resolves a [`SyncConfig`] for one vault.
///
/// Configuration is loaded from a hierarchy of sources:
/// 1. Built-in defaults
/// 2. Global config (`<config_dir>/keepvault/config.toml`)
/// 3. Vault config (`<vault>/.keepvault/config.toml`)
/// 4. Local overrides (`<vault>/.keepvault/config.local.toml`)
pub struct ConfigResolver {
    /// Vault root directory
    root: NormalizedPath,

    /// Override for the global config directory (used for testing).
    /// When `None`, the platform-appropriate directory is used via `dirs::config_dir()`.
    global_config_dir_override: Option<PathBuf>,
}

impl ConfigResolver {
    /// Create a resolver for the vault at `root`.
    ///
    /// Uses the platform-appropriate global config directory:
    /// - Linux: `~/.config/keepvault/`
    /// - macOS: `~/Library/Application Support/keepvault/`
    /// - Windows: `%APPDATA%\keepvault\`
    pub fn new(root: NormalizedPath) -> Self {
        Self {
            root,
            global_config_dir_override: None,
        }
    }

    /// Create a resolver with a custom global config directory.
    ///
    /// This is primarily useful for testing, where the real user config must
    /// not leak into results.
    pub fn with_global_config_dir(root: NormalizedPath, global_config_dir: PathBuf) -> Self {
        Self {
            root,
            global_config_dir_override: Some(global_config_dir),
        }
    }

    fn global_config_dir(&self) -> Option<PathBuf> {
        if let Some(ref override_dir) = self.global_config_dir_override {
            return Some(override_dir.clone());
        }
        dirs::config_dir().map(|d| d.join("keepvault"))
    }

    /// Path of the vault-level config file.
    pub fn vault_config_path(&self) -> NormalizedPath {
        self.root.join(VaultDir::Config.as_str()).join(CONFIG_FILE)
    }

    /// Path of the git-ignored local overrides file.
    pub fn local_config_path(&self) -> NormalizedPath {
        self.root.join(VaultDir::Config.as_str()).join(LOCAL_CONFIG_FILE)
    }

    /// Merge all layers into the effective configuration.
    ///
    /// Missing layers are skipped. Invalid TOML or a value of the wrong type
    /// in any present layer is an [`Error::Config`].
    pub fn resolve(&self) -> Result<SyncConfig> {
        let mut merged = Value::try_from(SyncConfig::default()).map_err(|e| Error::Config {
            path: "<defaults>".to_string(),
            message: e.to_string(),
        })?;

        if let Some(global_dir) = self.global_config_dir() {
            let global_config_path = global_dir.join(CONFIG_FILE);
            if global_config_path.is_file() {
                tracing::debug!(?global_config_path, "Loading global config (layer 2)");
                merge(&mut merged, load_layer(&global_config_path)?);
            } else {
                tracing::debug!(?global_config_path, "No global config found (layer 2), skipping");
            }
        }

        let vault_config_path = self.vault_config_path();
        if vault_config_path.is_file() {
            tracing::debug!(path = %vault_config_path, "Loading vault config (layer 3)");
            merge(&mut merged, load_layer(&vault_config_path.to_native())?);
        }

        let local_config_path = self.local_config_path();
        if local_config_path.is_file() {
            tracing::debug!(path = %local_config_path, "Loading local config (layer 4)");
            merge(&mut merged, load_layer(&local_config_path.to_native())?);
        }

        merged.try_into().map_err(|e: toml::de::Error| Error::Config {
            path: self.root.to_string(),
            message: e.to_string(),
        })
    }

    pub fn root(&self) -> &NormalizedPath {
        &self.root
    }

    /// Check if a vault configuration exists
    pub fn has_config(&self) -> bool {
        self.vault_config_path().is_file()
    }
}

fn load_layer(path: &Path) -> Result<Value> {
    let content = fs::read_to_string(path).map_err(|e| keepvault_fs::Error::io(path, e))?;
    content.parse::<toml::Table>().map(Value::Table).map_err(|e| Error::Config {
        path: path.display().to_string(),
        message: e.to_string(),
    })
}

/// Deep-merge `overlay` into `base`. Tables merge key by key; any other value
/// replaces what was there.
fn merge(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Table(base), Value::Table(overlay)) => {
            for (key, value) in overlay {
                match base.get_mut(&key) {
                    Some(existing) => merge(existing, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (base, overlay) => *base = overlay,
    }
}
