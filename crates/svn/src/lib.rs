//! Subversion client over the `svn` command-line executable
//!
//! This crate drives the `svn` executable as a subprocess and turns its
//! human-readable output into typed records, behind a trait-based client
//! interface.
//!
//! # Design Goals
//!
//! - **Clean trait interface**: Operations are grouped by concern
//! - **One record per requested path**: Status never drops or reorders paths
//! - **Nothing interpolated into a shell**: Messages and values travel through files
//! - **Cancellable**: A long-running call can be killed from another thread
//!
//! # Example
//!
//! ```no_run
//! use svn::{ClientConfig, ClientFactory, SvnWorkingCopy};
//! use std::path::PathBuf;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let client = ClientFactory::create(&ClientConfig::default())?;
//! let statuses = client.status(&[PathBuf::from("/path/to/wc/file.txt")])?;
//! for status in statuses {
//!     println!("{:?} {}", status.text_status, status.path.display());
//! }
//! # Ok(())
//! # }
//! ```

mod backend;
mod error;
mod factory;
mod metadata;
mod traits;
mod types;

pub use backend::cli::CommandlineClient;
pub use backend::cli::notification::NotificationListener;
pub use backend::cli::process::{ExecOutcome, Executor, OutputKind, OutputSink, ProcessSession};
pub use error::SvnError;
pub use factory::{ClientConfig, ClientFactory, ClientType, CommitRetry, MIN_VERSION};
pub use metadata::{MetadataError, WorkingCopyParser};
pub use traits::{SvnClient, SvnHistory, SvnProperties, SvnSync, SvnTree, SvnWorkingCopy};
pub use types::{
    AddOptions, AnnotateLine, ChangedPath, ConflictChoice, ConflictFiles, Credentials, Depth,
    DiffSummary, Info, ListEntry, LockInfo, LockState, LogEntry, MergeOptions, NodeKind,
    Property, RemoveOptions, Revision, RevisionRange, Schedule, Status, StatusKind,
    StatusOptions, Target, Version,
};
