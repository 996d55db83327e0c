//! Concrete commands and the parsers for their output.

mod content;
mod info;
mod log;
mod property;
mod status;
mod sync;
mod tree;
mod version;
mod working_copy;

pub use content::{BlameCommand, CatCommand, ListCommand, correlate_annotations, parse_list};
pub use info::{InfoCommand, parse_info};
pub use log::{LogCommand, parse_log};
pub use property::{
    PropDelCommand, PropGetCommand, PropListCommand, PropSetCommand, parse_proplist,
};
pub use status::{StatusCommand, parse_status};
pub use sync::{
    CheckoutCommand, CommitCommand, ExportCommand, ImportCommand, SwitchCommand, UpdateCommand,
};
pub use tree::{
    CopyCommand, LockCommand, MergeCommand, MkdirCommand, MoveCommand, RemoveCommand,
    UnlockCommand,
};
pub use version::{VersionCommand, parse_version};
pub use working_copy::{
    AddCommand, CleanupCommand, RelocateCommand, ResolveCommand, RevertCommand, UpgradeCommand,
};

use chrono::{DateTime, Utc};
use regex::Regex;

use crate::error::SvnError;
use crate::types::Target;

/// Warnings about targets that are not (or no longer) under version control
const MISSING_TARGET_CODES: [&str; 3] = ["W155007", "W155010", "E200009"];

/// Stderr predicate for commands that report per-target misses and continue
pub(crate) fn is_error_ignoring_missing(line: &str) -> bool {
    super::command::is_error_line(line) && !MISSING_TARGET_CODES.iter().any(|c| line.contains(c))
}

/// Parse `2024-01-02 10:11:12 +0100 (Tue, 02 Jan 2024)`
pub(crate) fn parse_svn_date(value: &str) -> Option<DateTime<Utc>> {
    let stamp = value.split(" (").next()?.trim();
    DateTime::parse_from_str(stamp, "%Y-%m-%d %H:%M:%S %z")
        .ok()
        .map(|date| date.with_timezone(&Utc))
}

/// Access a lazily compiled output pattern
pub(crate) fn compiled(
    pattern: &'static Result<Regex, regex::Error>,
) -> Result<&'static Regex, SvnError> {
    pattern
        .as_ref()
        .map_err(|err| SvnError::Parse(format!("invalid output pattern: {err}")))
}

pub(crate) fn require_url<'a>(target: &'a Target, role: &str) -> Result<&'a Target, SvnError> {
    if target.is_url() {
        Ok(target)
    } else {
        Err(SvnError::InvalidArgument(format!(
            "{role} must be a repository URL, got {target}"
        )))
    }
}
