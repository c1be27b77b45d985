//! Error types for keepvault-core

use chrono::{DateTime, Utc};
use keepvault_fs::NormalizedPath;

use crate::detect::ChangeSet;

/// Result type for keepvault-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in keepvault-core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Remote store call or commit failed
    #[error("Remote store error: {message}")]
    Remote { message: String },

    /// Frontmatter of a note file could not be parsed
    #[error("Malformed note file {path}: {message}")]
    Parse { path: NormalizedPath, message: String },

    /// No free file name was found within the collision suffix bound
    #[error("No free file name for {path} after {attempts} attempts")]
    PlacementCollisionExhausted { path: NormalizedPath, attempts: u32 },

    /// Material differences that automatic mode cannot settle
    #[error(
        "Unresolved conflict for note '{title}' ({note_id}) at {path}: {reasons} differ \
         (local updated {}, remote updated {}); run interactively or with --cherry-pick",
        display_ts(.local_updated),
        display_ts(.remote_updated)
    )]
    UnresolvedConflict {
        note_id: String,
        title: String,
        path: NormalizedPath,
        reasons: ChangeSet,
        local_updated: Option<DateTime<Utc>>,
        remote_updated: Option<DateTime<Utc>>,
    },

    /// Invalid configuration layer
    #[error("Invalid configuration at {path}: {message}")]
    Config { path: String, message: String },

    /// Interactive decision provider failed
    #[error("Prompt failed: {message}")]
    Prompt { message: String },

    // Transparent wrappers for underlying crate errors
    /// Filesystem error from keepvault-fs
    #[error(transparent)]
    Fs(#[from] keepvault_fs::Error),

    /// Standard I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// YAML serialization/deserialization error
    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    /// TOML deserialization error
    #[error(transparent)]
    TomlDe(#[from] toml::de::Error),
}

impl Error {
    /// Shorthand for a remote store failure.
    pub fn remote(message: impl Into<String>) -> Self {
        Self::Remote {
            message: message.into(),
        }
    }

    /// True for errors that must stop the whole run rather than a single note.
    pub fn is_run_fatal(&self) -> bool {
        matches!(self, Self::UnresolvedConflict { .. })
    }
}

fn display_ts(ts: &Option<DateTime<Utc>>) -> String {
    ts.map(|t| t.to_rfc3339())
        .unwrap_or_else(|| "unknown".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::Reason;

    #[test]
    fn unresolved_conflict_names_note_and_fields() {
        let mut reasons = ChangeSet::default();
        reasons.insert(Reason::Content);
        reasons.insert(Reason::Title);

        let error = Error::UnresolvedConflict {
            note_id: "abc123".to_string(),
            title: "Groceries".to_string(),
            path: NormalizedPath::new("/vault/Groceries.md"),
            reasons,
            local_updated: None,
            remote_updated: None,
        };

        let display = error.to_string();
        assert!(display.contains("abc123"), "got: {display}");
        assert!(display.contains("Groceries"), "got: {display}");
        assert!(display.contains("content, title"), "got: {display}");
        assert!(error.is_run_fatal());
    }

    #[test]
    fn io_errors_are_not_run_fatal() {
        let error = Error::Io(std::io::Error::other("disk"));
        assert!(!error.is_run_fatal());
    }
}
