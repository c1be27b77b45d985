//! Well-known directory names inside a vault.

use std::path::Path;

/// Extension of every note file.
pub const NOTE_EXTENSION: &str = "md";

/// Standard vault directories.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VaultDir {
    /// Notes archived on the remote
    Archived,
    /// Notes trashed on the remote
    Trashed,
    /// Downloaded attachment blobs
    Attachments,
    /// The `.obsidian` editor settings directory
    Obsidian,
    /// The `.keepvault` configuration directory
    Config,
}

impl VaultDir {
    /// Get the default on-disk name of the directory.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Archived => "Archived",
            Self::Trashed => "Trashed",
            Self::Attachments => "Attachments",
            Self::Obsidian => ".obsidian",
            Self::Config => ".keepvault",
        }
    }
}

impl AsRef<Path> for VaultDir {
    fn as_ref(&self) -> &Path {
        Path::new(self.as_str())
    }
}

impl AsRef<str> for VaultDir {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl std::fmt::Display for VaultDir {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
