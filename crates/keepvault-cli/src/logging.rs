//! tracing subscriber setup

use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;

use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use crate::error::{CliError, Result};

/// Install the global subscriber.
///
/// `verbose` forces DEBUG; otherwise `RUST_LOG` decides, defaulting to WARN.
/// Events go to stderr and, when `log_file` is given, are appended there too.
pub fn init(verbose: bool, log_file: Option<&Path>) -> Result<()> {
    let filter_layer = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_writer(std::io::stderr)
        .compact();

    let file_layer = match log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|e| CliError::user(format!("Cannot open log file {}: {e}", path.display())))?;
            Some(
                fmt::layer()
                    .with_ansi(false)
                    .with_target(true)
                    .with_writer(Mutex::new(file)),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| CliError::user(format!("Failed to set up logging: {e}")))?;

    tracing::debug!(verbose, "logging initialised");
    Ok(())
}
