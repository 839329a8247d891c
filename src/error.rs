//! Errors produced by logger setup and the subprocess launcher.
//!
//! Per-sink write failures are *not* represented here: they are reported
//! through [`crate::diagnostics`] and do not stop the pipeline.

use std::path::PathBuf;
use thiserror::Error;

/// Fatal errors reported to the caller before any sink is committed.
#[derive(Error, Debug)]
pub enum LoggerError {
    /// A configuration value (filename, directory, ...) was invalid.
    #[error("bad argument: {0}")]
    BadArgument(String),

    /// A filesystem operation (open/stat/link/rename/unlink) failed.
    #[error("{operation} on {path:?} failed")]
    Filesystem {
        operation: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// No log directory could be resolved, or the resolved directory does
    /// not exist.
    #[error("log directory {0:?} does not exist")]
    NoLogDirectory(PathBuf),

    /// Locking the log file failed for a reason other than "someone else
    /// already holds it transiently"; rotation gives up but the writer
    /// keeps using the old descriptor.
    #[error("could not lock {path:?}: {source}")]
    LockRefused {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Forking or exec'ing the logger subprocess (or the wrapped program)
    /// failed.
    #[error("failed to spawn {what}: {source}")]
    Spawn {
        what: &'static str,
        #[source]
        source: std::io::Error,
    },

    /// The logger child did not end its ready-pipe output with the exact
    /// `SRT_LOGGER_READY=1\n` token.
    #[error("logger subprocess did not signal readiness")]
    NotReady,

    /// The ready pipe closed before any data was read at all.
    #[error("logger subprocess closed its ready pipe without reporting anything")]
    UnexpectedEof,

    /// An invariant of the engine was violated; this indicates a bug rather
    /// than a misconfiguration or environmental failure.
    #[error("internal error: {0}")]
    Internal(&'static str),
}

impl LoggerError {
    pub(crate) fn fs(operation: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        LoggerError::Filesystem {
            operation,
            path: path.into(),
            source,
        }
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, LoggerError>;
