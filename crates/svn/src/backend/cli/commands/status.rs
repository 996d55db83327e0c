use std::path::PathBuf;

use super::is_error_ignoring_missing;
use crate::backend::cli::arguments::Arguments;
use crate::backend::cli::command::CommandKind;
use crate::error::SvnError;
use crate::types::{Depth, LockState, Status, StatusKind};

/// `svn status -v --depth empty` over explicit paths
pub struct StatusCommand<'a> {
    pub paths: &'a [PathBuf],
    pub contact_server: bool,
    pub no_ignore: bool,
}

impl CommandKind for StatusCommand<'_> {
    fn name(&self) -> &'static str {
        "status"
    }

    fn prepare(&self, args: &mut Arguments) -> Result<(), SvnError> {
        args.add("status").add("-v").add_depth(Depth::Empty);
        args.add_flag_if(self.contact_server, "-u")
            .add_flag_if(self.no_ignore, "--no-ignore");
        args.add_paths(self.paths)?;
        Ok(())
    }

    fn is_error_message(&self, line: &str) -> bool {
        is_error_ignoring_missing(line)
    }
}

/// Number of fixed-width columns before the revision fields
const COLUMNS: usize = 9;

const TEXT_FLAGS: &str = " ACDIMRX?!~";
const PROP_FLAGS: &str = " CM";
const WC_LOCK_FLAGS: &str = " L";
const COPIED_FLAGS: &str = " +";
const SWITCHED_FLAGS: &str = " SX";
const LOCK_TOKEN_FLAGS: &str = " KOTB";
const TREE_CONFLICT_FLAGS: &str = " C";
const OUT_OF_DATE_FLAGS: &str = " *";

/// Parse verbose status output into records in output order
///
/// Banners, changelist headers, tree-conflict detail lines and the conflict
/// summary are skipped; changelist membership is carried onto the entries
/// listed under each header.
pub fn parse_status(lines: &[String]) -> Vec<Status> {
    let mut statuses = Vec::new();
    let mut changelist: Option<String> = None;

    for line in lines {
        let line = line.trim_end_matches('\r');
        if let Some(name) = line
            .strip_prefix("--- Changelist '")
            .and_then(|rest| rest.strip_suffix("':"))
        {
            changelist = Some(name.to_string());
            continue;
        }
        if line.starts_with("Summary of conflicts") || line.starts_with("Status against revision")
        {
            continue;
        }
        if line.starts_with("Performing status on external item") {
            changelist = None;
            continue;
        }

        if let Some(mut status) = parse_status_line(line) {
            status.changelist = changelist.clone();
            statuses.push(status);
        }
    }

    statuses
}

fn parse_status_line(line: &str) -> Option<Status> {
    let flags: Vec<char> = line.chars().take(COLUMNS).collect();
    if flags.len() < COLUMNS {
        return None;
    }
    let valid = [
        TEXT_FLAGS,
        PROP_FLAGS,
        WC_LOCK_FLAGS,
        COPIED_FLAGS,
        SWITCHED_FLAGS,
        LOCK_TOKEN_FLAGS,
        TREE_CONFLICT_FLAGS,
        " ",
        OUT_OF_DATE_FLAGS,
    ]
    .iter()
    .zip(&flags)
    .all(|(allowed, flag)| allowed.contains(*flag));
    if !valid {
        return None;
    }

    let offset = line.char_indices().nth(COLUMNS).map(|(i, _)| i)?;
    let rest = &line[offset..];

    let text_status = StatusKind::from_text_column(flags[0]);
    let (path, revisions) = match text_status {
        StatusKind::Unversioned | StatusKind::Ignored => (rest.trim_start(), None),
        _ => split_revisions(rest),
    };
    if path.is_empty() {
        return None;
    }

    let mut status = Status::with_text_status(path, text_status);
    status.prop_status = StatusKind::from_prop_column(flags[1]);
    status.wc_locked = flags[2] == 'L';
    status.copied = flags[3] == '+';
    status.switched = flags[4] == 'S';
    status.lock_state = LockState::from_column(flags[5]);
    status.tree_conflicted = flags[6] == 'C';
    status.out_of_date = flags[8] == '*';
    if status.out_of_date {
        status.repository_text_status = StatusKind::Modified;
    }
    if let Some((revision, last_changed_revision, author)) = revisions {
        status.revision = revision;
        status.last_changed_revision = last_changed_revision;
        status.last_changed_author = author;
    }
    Some(status)
}

type Revisions = (Option<u64>, Option<u64>, Option<String>);

/// Split `WREV CREV AUTHOR PATH`; externals and similar lines carry only a path
fn split_revisions(rest: &str) -> (&str, Option<Revisions>) {
    let mut remaining = rest.trim_start();
    let mut fields = Vec::with_capacity(3);
    for _ in 0..3 {
        let end = remaining
            .find(char::is_whitespace)
            .unwrap_or(remaining.len());
        fields.push(&remaining[..end]);
        remaining = remaining[end..].trim_start();
    }

    let is_revision = |f: &str| f == "-" || f == "?" || f.parse::<u64>().is_ok();
    if remaining.is_empty() || !is_revision(fields[0]) || !is_revision(fields[1]) {
        return (rest.trim_start(), None);
    }

    let author = match fields[2] {
        "?" => None,
        author => Some(author.to_string()),
    };
    (
        remaining,
        Some((fields[0].parse().ok(), fields[1].parse().ok(), author)),
    )
}
