use std::path::Path;
use thiserror::Error;

use crate::metadata::MetadataError;

/// Errors that can occur during Subversion operations
#[derive(Debug, Error)]
pub enum SvnError {
    #[error("svn executable not found or not runnable: {0}")]
    NotAvailable(String),

    #[error("Failed to launch svn: {0}")]
    Launch(#[source] std::io::Error),

    #[error("svn {command} failed: {message}")]
    CommandFailed { command: String, message: String },

    #[error("Operation not supported by the command-line client: {0}")]
    Unsupported(&'static str),

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Command already executed: {0}")]
    AlreadyExecuted(&'static str),

    #[error("Unexpected svn output: {0}")]
    Parse(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Metadata(#[from] MetadataError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Error text the executable prints when another process holds a working-copy lock.
const LOCK_CONTENTION_MARKERS: [&str; 3] = ["is already locked", "already-locked", "E155004"];

impl SvnError {
    /// Create a CommandFailed error from the collected error lines
    pub fn command_failed(command: &str, lines: &[String]) -> Self {
        Self::CommandFailed {
            command: command.to_string(),
            message: lines.join("\n"),
        }
    }

    /// Create an InvalidArgument error naming a path
    pub fn invalid_path(path: &Path, reason: &str) -> Self {
        Self::InvalidArgument(format!("{}: {reason}", path.display()))
    }

    /// Whether the call was cancelled rather than failed
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// Whether the caller should retry with a different client implementation
    pub fn is_unsupported(&self) -> bool {
        matches!(self, Self::Unsupported(_))
    }

    /// Whether the failure was caused by a transient working-copy lock
    pub fn is_lock_contention(&self) -> bool {
        match self {
            Self::CommandFailed { message, .. } => LOCK_CONTENTION_MARKERS
                .iter()
                .any(|marker| message.contains(marker)),
            _ => false,
        }
    }
}
