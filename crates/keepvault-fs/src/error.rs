//! Error types for keepvault-fs

use std::path::PathBuf;

/// Result type for keepvault-fs operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in keepvault-fs operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Lock acquisition failed for {path}")]
    LockFailed { path: PathBuf },

    #[error("Vault root does not exist: {path}")]
    VaultNotFound { path: PathBuf },

    #[error("Path escapes the vault root: {path}")]
    OutsideVault { path: PathBuf },
}

impl Error {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// True when the underlying cause is a missing file.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Io { source, .. } if source.kind() == std::io::ErrorKind::NotFound)
    }
}
