//! Shared helpers for the Subversion command-line client.

pub mod log;
pub mod shell;
pub mod svn;
