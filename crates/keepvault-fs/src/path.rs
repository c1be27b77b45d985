//! Normalized path handling for cross-platform vault paths

use std::path::{Path, PathBuf};

/// A path normalized to use forward slashes internally.
///
/// Vault paths are compared, logged and printed in this form; they are
/// converted to platform-native paths only at I/O boundaries.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NormalizedPath {
    /// Internal representation always uses forward slashes
    inner: String,
}

impl NormalizedPath {
    /// Create a new NormalizedPath from any path-like input.
    ///
    /// Backslashes become forward slashes, empty and `.` segments are
    /// dropped, and a trailing slash is removed.
    pub fn new(path: impl AsRef<Path>) -> Self {
        let raw = path.as_ref().to_string_lossy().replace('\\', "/");
        let absolute = raw.starts_with('/');

        let segments: Vec<&str> = raw
            .split('/')
            .filter(|s| !s.is_empty() && *s != ".")
            .collect();

        let mut inner = segments.join("/");
        if absolute {
            inner.insert(0, '/');
        }
        if inner.is_empty() {
            inner.push('.');
        }
        Self { inner }
    }

    /// Get the internal normalized string representation.
    pub fn as_str(&self) -> &str {
        &self.inner
    }

    /// Convert to a platform-native PathBuf for I/O operations.
    pub fn to_native(&self) -> PathBuf {
        PathBuf::from(&self.inner)
    }

    /// Join this path with a segment.
    pub fn join(&self, segment: &str) -> Self {
        if self.inner == "." {
            return Self::new(segment);
        }
        Self::new(format!("{}/{}", self.inner, segment))
    }

    /// Get the parent directory.
    pub fn parent(&self) -> Option<Self> {
        match self.inner.rfind('/') {
            Some(0) if self.inner.len() > 1 => Some(Self {
                inner: "/".to_string(),
            }),
            Some(idx) if idx > 0 => Some(Self {
                inner: self.inner[..idx].to_string(),
            }),
            _ => None,
        }
    }

    /// Get the file name component.
    pub fn file_name(&self) -> Option<&str> {
        self.inner.rsplit('/').next().filter(|n| !n.is_empty() && *n != ".")
    }

    /// File name without its final extension.
    pub fn file_stem(&self) -> Option<&str> {
        let name = self.file_name()?;
        match name.rfind('.') {
            Some(idx) if idx > 0 => Some(&name[..idx]),
            _ => Some(name),
        }
    }

    /// Express this path relative to `base`, if it lies underneath it.
    pub fn relative_to(&self, base: &NormalizedPath) -> Option<&str> {
        let prefix = base.as_str();
        let rest = self.inner.strip_prefix(prefix)?;
        match rest.strip_prefix('/') {
            Some(rel) => Some(rel),
            None if rest.is_empty() => Some(""),
            None => None,
        }
    }

    /// True if `self` is `base` or lies underneath it.
    pub fn starts_with(&self, base: &NormalizedPath) -> bool {
        self.relative_to(base).is_some()
    }

    /// Check if this path exists on the filesystem.
    pub fn exists(&self) -> bool {
        self.to_native().exists()
    }

    /// Check if this is a directory.
    pub fn is_dir(&self) -> bool {
        self.to_native().is_dir()
    }

    /// Check if this is a file.
    pub fn is_file(&self) -> bool {
        self.to_native().is_file()
    }
}

impl AsRef<Path> for NormalizedPath {
    fn as_ref(&self) -> &Path {
        Path::new(&self.inner)
    }
}

impl std::fmt::Display for NormalizedPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.inner)
    }
}

impl From<&str> for NormalizedPath {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for NormalizedPath {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<PathBuf> for NormalizedPath {
    fn from(p: PathBuf) -> Self {
        Self::new(p)
    }
}

impl From<&Path> for NormalizedPath {
    fn from(p: &Path) -> Self {
        Self::new(p)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collapses_separators() {
        let path = NormalizedPath::new("vault//Archived/./note.md");
        assert_eq!(path.as_str(), "vault/Archived/note.md");
    }

    #[test]
    fn backslashes_become_forward_slashes() {
        let path = NormalizedPath::new("vault\\Trashed\\a.md");
        assert_eq!(path.as_str(), "vault/Trashed/a.md");
    }

    #[test]
    fn file_name_and_stem() {
        let path = NormalizedPath::new("/v/My Note.v2.md");
        assert_eq!(path.file_name(), Some("My Note.v2.md"));
        assert_eq!(path.file_stem(), Some("My Note.v2"));
    }

    #[test]
    fn relative_to_requires_segment_boundary() {
        let base = NormalizedPath::new("/vault");
        assert_eq!(
            NormalizedPath::new("/vault/Archived/a.md").relative_to(&base),
            Some("Archived/a.md")
        );
        assert_eq!(NormalizedPath::new("/vault2/a.md").relative_to(&base), None);
    }
}
