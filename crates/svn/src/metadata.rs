//! Boundary to a local working-copy metadata parser.
//!
//! A parser reads the on-disk administrative area directly and answers status
//! and info queries without spawning the executable. When it meets a format
//! it does not understand it reports [`MetadataError::UnsupportedFormat`] and
//! the client falls back to the executable for that path.

use std::path::Path;
use thiserror::Error;

use crate::types::{Info, Status};

/// Errors raised by a working-copy metadata parser
#[derive(Debug, Error)]
pub enum MetadataError {
    /// The working-copy format is newer or older than the parser understands
    #[error("Unsupported working copy format: {0}")]
    UnsupportedFormat(String),

    #[error("Corrupt working copy metadata: {0}")]
    Corrupt(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl MetadataError {
    /// Whether the caller should ask the executable instead
    pub fn is_unsupported_format(&self) -> bool {
        matches!(self, Self::UnsupportedFormat(_))
    }
}

/// Fast-path status provider reading working-copy metadata directly
pub trait WorkingCopyParser: Send + Sync {
    /// Status of a single path
    fn single_status(&self, path: &Path) -> Result<Status, MetadataError>;

    /// Metadata of a single working-copy path
    fn info_from_working_copy(&self, path: &Path) -> Result<Info, MetadataError>;
}
