//! Vault context detection
//!
//! Finds the vault a command works on, resolves its configuration, and opens
//! the remote store. Like git, commands work from any directory inside a
//! vault that carries a `.keepvault/` directory.

use std::path::{Path, PathBuf};

use keepvault_core::{ConfigResolver, JsonFileStore, SyncConfig, SyncEngine};
use keepvault_fs::{NormalizedPath, VaultDir};

use crate::cli::VaultArgs;
use crate::error::{CliError, Result};

/// File name of the default JSON remote store inside `.keepvault/`.
pub const REMOTE_FILE: &str = "remote.json";

/// Walk up from `start` to the first directory containing `.keepvault/`.
pub fn find_vault_root(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|dir| dir.join(VaultDir::Config.as_str()).is_dir())
        .map(Path::to_path_buf)
}

/// A vault with its effective configuration.
#[derive(Debug, Clone)]
pub struct VaultContext {
    pub root: PathBuf,
    pub config: SyncConfig,
    pub remote_path: PathBuf,
}

impl VaultContext {
    /// Resolve the vault from CLI arguments and the current directory.
    pub fn resolve(args: &VaultArgs) -> Result<Self> {
        let cwd = std::env::current_dir()?;
        let root = match &args.vault {
            Some(dir) => absolute(&cwd, dir),
            None => find_vault_root(&cwd).unwrap_or_else(|| cwd.clone()),
        };
        if !root.is_dir() {
            return Err(CliError::user(format!(
                "Vault directory not found: {}",
                root.display()
            )));
        }

        let mut config = ConfigResolver::new(NormalizedPath::new(&root)).resolve()?;
        // The flag is relative to where the user typed it, config values to the vault.
        if let Some(remote) = &args.remote {
            config.remote.path = Some(absolute(&cwd, remote));
        }
        let remote_path = match &config.remote.path {
            Some(path) => absolute(&root, path),
            None => root.join(VaultDir::Config.as_str()).join(REMOTE_FILE),
        };
        tracing::debug!(vault = %root.display(), remote = %remote_path.display(), "resolved vault context");

        Ok(Self {
            root,
            config,
            remote_path,
        })
    }

    pub fn engine(&self) -> Result<SyncEngine> {
        let layout = self.config.open_layout(&self.root)?;
        Ok(SyncEngine::new(layout, self.config.clone()))
    }

    pub fn open_store(&self) -> Result<JsonFileStore> {
        Ok(JsonFileStore::open(self.remote_path.as_path())?)
    }
}

fn absolute(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn finds_enclosing_vault() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("Projects").join("deep");
        fs::create_dir_all(&nested).unwrap();
        fs::create_dir_all(dir.path().join(".keepvault")).unwrap();

        assert_eq!(find_vault_root(&nested), Some(dir.path().to_path_buf()));
    }

    #[test]
    fn plain_directory_is_not_a_vault() {
        let dir = TempDir::new().unwrap();
        let found = find_vault_root(dir.path());
        assert!(found.is_none_or(|root| root != dir.path()));
    }

    #[test]
    fn remote_defaults_into_config_dir() {
        let dir = TempDir::new().unwrap();
        let args = VaultArgs {
            vault: Some(dir.path().to_path_buf()),
            remote: None,
        };

        let context = VaultContext::resolve(&args).unwrap();
        assert_eq!(
            context.remote_path,
            dir.path().join(".keepvault").join("remote.json")
        );
    }

    #[test]
    fn configured_remote_is_relative_to_vault() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join(".keepvault")).unwrap();
        fs::write(
            dir.path().join(".keepvault").join("config.toml"),
            "[remote]\npath = \"store/notes.json\"\n",
        )
        .unwrap();
        let args = VaultArgs {
            vault: Some(dir.path().to_path_buf()),
            remote: None,
        };

        let context = VaultContext::resolve(&args).unwrap();
        assert_eq!(context.remote_path, dir.path().join("store/notes.json"));
    }

    #[test]
    fn missing_vault_is_a_user_error() {
        let dir = TempDir::new().unwrap();
        let args = VaultArgs {
            vault: Some(dir.path().join("nope")),
            remote: None,
        };
        assert!(matches!(
            VaultContext::resolve(&args).unwrap_err(),
            CliError::User { .. }
        ));
    }
}
