//! Typed configuration values

use std::path::PathBuf;

use keepvault_fs::{Result as FsResult, VaultDir, VaultLayout};
use serde::{Deserialize, Serialize};

/// The effective configuration for one vault.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    pub vault: VaultConfig,
    pub placement: PlacementConfig,
    pub sync_log: SyncLogConfig,
    pub remote: RemoteConfig,
}

impl SyncConfig {
    /// Open the vault at `root` with the configured directory names.
    pub fn open_layout(&self, root: impl AsRef<std::path::Path>) -> FsResult<VaultLayout> {
        Ok(VaultLayout::open(root)?
            .with_dirs(
                &self.vault.archived_dir,
                &self.vault.trashed_dir,
                &self.vault.attachments_dir,
            )
            .with_ignored(self.vault.ignore_dirs.iter().cloned()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VaultConfig {
    pub archived_dir: String,
    pub trashed_dir: String,
    pub attachments_dir: String,
    /// Directory names never scanned for notes.
    pub ignore_dirs: Vec<String>,
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            archived_dir: VaultDir::Archived.as_str().to_string(),
            trashed_dir: VaultDir::Trashed.as_str().to_string(),
            attachments_dir: VaultDir::Attachments.as_str().to_string(),
            ignore_dirs: vec![
                VaultDir::Obsidian.as_str().to_string(),
                VaultDir::Config.as_str().to_string(),
            ],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlacementConfig {
    /// Maximum file stem length in characters.
    pub max_filename_length: usize,
    /// Highest numeric suffix tried on a name collision.
    pub max_collision_suffix: u32,
}

impl Default for PlacementConfig {
    fn default() -> Self {
        Self {
            max_filename_length: 90,
            max_collision_suffix: 20,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncLogConfig {
    pub enabled: bool,
    /// Remote title of the log note.
    pub title: String,
    /// File name of the local mirror at the vault root.
    pub file_name: String,
}

impl Default for SyncLogConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            title: "Sync Log".to_string(),
            file_name: "_Sync_Log.md".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    /// JSON store file. Relative paths resolve against the vault root.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}
