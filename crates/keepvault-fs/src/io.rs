//! Atomic I/O operations with file locking

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::time::SystemTime;

use chrono::{DateTime, Utc};
use fs2::FileExt;

use crate::{Error, NormalizedPath, Result};

/// Write content atomically to a file with locking.
///
/// Uses write-to-temp-then-rename so a reader never observes a partially
/// written note. Parent directories are created as needed.
pub fn write_atomic(path: &NormalizedPath, content: &[u8]) -> Result<()> {
    let native_path = path.to_native();

    if let Some(parent) = native_path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
        }
    }

    // Temp file in the same directory keeps the rename on one filesystem
    let temp_name = format!(
        ".{}.{}.tmp",
        native_path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_default(),
        std::process::id()
    );
    let temp_path = native_path.with_file_name(&temp_name);

    let mut temp_file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(&temp_path)
        .map_err(|e| Error::io(&temp_path, e))?;

    temp_file
        .lock_exclusive()
        .map_err(|_| Error::LockFailed {
            path: native_path.clone(),
        })?;

    temp_file
        .write_all(content)
        .map_err(|e| Error::io(&temp_path, e))?;
    temp_file
        .sync_all()
        .map_err(|e| Error::io(&temp_path, e))?;
    temp_file.unlock().map_err(|_| Error::LockFailed {
        path: native_path.clone(),
    })?;
    drop(temp_file);

    if let Err(e) = fs::rename(&temp_path, &native_path) {
        let _ = fs::remove_file(&temp_path);
        return Err(Error::io(&native_path, e));
    }

    tracing::trace!(path = %path, bytes = content.len(), "wrote file");
    Ok(())
}

/// Read text content from a file.
pub fn read_text(path: &NormalizedPath) -> Result<String> {
    let native_path = path.to_native();
    fs::read_to_string(&native_path).map_err(|e| Error::io(&native_path, e))
}

/// Write text content to a file atomically.
pub fn write_text(path: &NormalizedPath, content: &str) -> Result<()> {
    write_atomic(path, content.as_bytes())
}

/// Delete a file. A file that is already gone is not an error.
pub fn remove_file(path: &NormalizedPath) -> Result<()> {
    let native_path = path.to_native();
    match fs::remove_file(&native_path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(Error::io(&native_path, e)),
    }
}

/// Move a file to `to`, creating the destination directory if needed.
///
/// Refuses to overwrite an existing destination.
pub fn move_file(from: &NormalizedPath, to: &NormalizedPath) -> Result<()> {
    let src = from.to_native();
    let dst = to.to_native();

    if dst.exists() {
        return Err(Error::io(
            &dst,
            std::io::Error::new(std::io::ErrorKind::AlreadyExists, "destination exists"),
        ));
    }
    if let Some(parent) = dst.parent() {
        fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
    }
    fs::rename(&src, &dst).map_err(|e| Error::io(&src, e))?;

    tracing::debug!(from = %from, to = %to, "moved file");
    Ok(())
}

/// Last modification time of a file in UTC.
pub fn modified_time(path: &NormalizedPath) -> Result<DateTime<Utc>> {
    let native_path = path.to_native();
    let modified = fs::metadata(&native_path)
        .and_then(|m| m.modified())
        .map_err(|e| Error::io(&native_path, e))?;
    Ok(DateTime::<Utc>::from(modified))
}

/// Set the modification time of an existing file.
pub fn set_modified_time(path: &NormalizedPath, when: DateTime<Utc>) -> Result<()> {
    let native_path = path.to_native();
    let file = File::options()
        .write(true)
        .open(&native_path)
        .map_err(|e| Error::io(&native_path, e))?;
    file.set_modified(SystemTime::from(when))
        .map_err(|e| Error::io(&native_path, e))
}
