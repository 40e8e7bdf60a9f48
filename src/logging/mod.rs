//! Tracing subscriber initialization.
//!
//! Logs go to stderr unless a log file is configured, in which case they are
//! appended to that file without ANSI colors.

use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing_subscriber::EnvFilter;

/// Error type for logging initialization failures.
#[derive(Debug, Error)]
pub enum LoggingError {
    /// Failed to create log directory
    #[error("Failed to create log directory at {path:?}: {source}")]
    DirectoryCreation {
        /// The directory path that failed to be created
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Invalid log file path (no filename component)
    #[error("Invalid log file path: {0:?}")]
    InvalidPath(PathBuf),

    /// Log path has no parent directory
    #[error("Log path has no parent directory: {0:?}")]
    NoParentDirectory(PathBuf),

    /// Tracing subscriber already initialized
    #[error("Tracing subscriber already initialized")]
    SubscriberAlreadySet,
}

/// Respect RUST_LOG, default to "info".
fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Split a log file path into its directory and file name, creating the
/// directory if needed.
fn prepare_log_file(log_path: &Path) -> Result<(&Path, &str), LoggingError> {
    let file_name = log_path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| LoggingError::InvalidPath(log_path.to_path_buf()))?;

    let directory = log_path
        .parent()
        .ok_or_else(|| LoggingError::NoParentDirectory(log_path.to_path_buf()))?;

    // A bare file name has an empty parent: the working directory.
    let directory = if directory.as_os_str().is_empty() {
        Path::new(".")
    } else {
        directory
    };

    std::fs::create_dir_all(directory).map_err(|source| LoggingError::DirectoryCreation {
        path: directory.to_path_buf(),
        source,
    })?;

    Ok((directory, file_name))
}

/// Initialize the global tracing subscriber.
///
/// With `Some(path)` logs are appended to that file, creating its directory
/// first. With `None` they go to stderr.
///
/// # Errors
///
/// Fails if the log path is unusable, its directory cannot be created, or a
/// subscriber is already installed.
pub fn init(log_path: Option<&Path>) -> Result<(), LoggingError> {
    match log_path {
        Some(log_path) => {
            let (directory, file_name) = prepare_log_file(log_path)?;
            let file_appender = tracing_appender::rolling::never(directory, file_name);

            tracing_subscriber::fmt()
                .with_env_filter(env_filter())
                .with_writer(file_appender)
                .with_ansi(false)
                .try_init()
                .map_err(|_| LoggingError::SubscriberAlreadySet)
        }
        None => tracing_subscriber::fmt()
            .with_env_filter(env_filter())
            .with_writer(std::io::stderr)
            .try_init()
            .map_err(|_| LoggingError::SubscriberAlreadySet),
    }
}
