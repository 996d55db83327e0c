//! Recognition of the executable's human-readable progress lines.
//!
//! The table is ordered: specific phrasings come before the status-column
//! catch-all at the end, which would otherwise swallow some of them. A line
//! matching nothing is simply not a notification.

use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

/// A `(path, revision)` fact extracted from one output line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub path: Option<String>,
    pub revision: Option<u64>,
}

/// Observer told about every path a running command reports touching
///
/// Called on the thread that issued the client call, while the call is
/// still in progress.
pub trait NotificationListener: Send + Sync {
    fn state_changed(&self, path: &Path, revision: Option<u64>);
}

struct Pattern {
    regex: Regex,
    /// Reject matches whose `flags` group is blank (catch-all only)
    needs_flags: bool,
}

const PATTERNS: &[&str] = &[
    // revision summaries
    r"^Committed revision (?P<rev>\d+)\.$",
    r"^Checked out external at revision (?P<rev>\d+)\.$",
    r"^Checked out revision (?P<rev>\d+)\.$",
    r"^Updated external to revision (?P<rev>\d+)\.$",
    r"^Updated to revision (?P<rev>\d+)\.$",
    r"^External at revision (?P<rev>\d+)\.$",
    r"^At revision (?P<rev>\d+)\.$",
    r"^Exported external at revision (?P<rev>\d+)\.$",
    r"^Exported revision (?P<rev>\d+)\.$",
    // commit
    r"^Sending\s+copy of\s+(?P<path>.+)$",
    r"^Sending\s+(?P<path>.+)$",
    r"^Adding\s+copy of\s+(?P<path>.+)$",
    r"^Adding\s+\(bin\)\s+(?P<path>.+)$",
    r"^Adding\s+(?P<path>.+)$",
    r"^Deleting\s+(?P<path>.+)$",
    r"^Replacing\s+copy of\s+(?P<path>.+)$",
    r"^Replacing\s+(?P<path>.+)$",
    // revert / resolve
    r"^Restored '(?P<path>.+)'$",
    r"^Reverted '(?P<path>.+)'$",
    r"^Failed to revert '(?P<path>.+)' -- try updating instead\.$",
    r"^Resolved conflicted state of '(?P<path>.+)'$",
    r"^Merge conflicts in '(?P<path>.+)' marked as resolved\.$",
    r"^Tree conflict at '(?P<path>.+)' marked as resolved\.$",
    // lock / unlock
    r"^'(?P<path>.+)' locked by user '.*'\.$",
    r"^'(?P<path>.+)' unlocked\.$",
    r"^Unlock failed on '(?P<path>.+)'.*$",
    // skip
    r"^Skipped missing target: '(?P<path>.+)'$",
    r"^Skipped target: '(?P<path>.+)' -- .*$",
    r"^Skipped '(?P<path>.+)'(?: -- .*)?$",
    // externals, update and merge headers
    r"^Fetching external item into '(?P<path>.+)':?$",
    r"^Updating '(?P<path>.+)':$",
    r"^--- (?:Reverse-)?[Mm]erging .* into '(?P<path>.+)':$",
    r"^--- Recording mergeinfo for .* into '(?P<path>.+)':$",
    r"^--- Eliding mergeinfo from '(?P<path>.+)':$",
    r"^Upgraded '(?P<path>.+)'$",
    // add / delete / update status columns
    r"^A\s+\(bin\)\s+(?P<path>\S.*)$",
    r"^(?P<flags>[ADUCGER ][ UCG][ B][ C]?)\s+(?P<path>\S.*)$",
];

static TABLE: LazyLock<Vec<Pattern>> = LazyLock::new(|| {
    PATTERNS
        .iter()
        .filter_map(|source| match Regex::new(source) {
            Ok(regex) => Some(Pattern {
                needs_flags: source.contains("?P<flags>"),
                regex,
            }),
            Err(err) => {
                tracing::error!("invalid notification pattern {source}: {err}");
                None
            }
        })
        .collect()
});

/// Classify one output line; `None` for banners and unrecognized text
pub fn parse(line: &str) -> Option<Notification> {
    let line = line.trim_end_matches(['\r', '\n']);
    if line.is_empty() {
        return None;
    }

    for pattern in TABLE.iter() {
        let Some(caps) = pattern.regex.captures(line) else {
            continue;
        };
        if pattern.needs_flags
            && caps
                .name("flags")
                .is_none_or(|flags| flags.as_str().trim().is_empty())
        {
            continue;
        }

        let path = caps.name("path").map(|m| m.as_str().to_string());
        let revision = caps.name("rev").and_then(|m| m.as_str().parse().ok());
        return Some(Notification { path, revision });
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path_of(line: &str) -> Option<String> {
        parse(line).and_then(|n| n.path)
    }

    fn revision_of(line: &str) -> Option<u64> {
        parse(line).and_then(|n| n.revision)
    }

    #[test]
    fn test_table_compiles() {
        assert_eq!(TABLE.len(), PATTERNS.len());
    }

    #[test]
    fn test_committed_revision() {
        assert_eq!(
            parse("Committed revision 42."),
            Some(Notification {
                path: None,
                revision: Some(42)
            })
        );
    }

    #[test]
    fn test_update_column_line() {
        assert_eq!(
            parse("A    foo/bar.txt"),
            Some(Notification {
                path: Some("foo/bar.txt".into()),
                revision: None
            })
        );
        assert_eq!(path_of("U    src/main.c").as_deref(), Some("src/main.c"));
        assert_eq!(path_of(" U   src").as_deref(), Some("src"));
        assert_eq!(path_of("   C tree/conflict").as_deref(), Some("tree/conflict"));
        assert_eq!(path_of("G    merged.txt").as_deref(), Some("merged.txt"));
        // three-column layout of older releases
        assert_eq!(path_of("D   gone.txt").as_deref(), Some("gone.txt"));
    }

    #[test]
    fn test_add_output() {
        assert_eq!(path_of("A         dir/new.txt").as_deref(), Some("dir/new.txt"));
        assert_eq!(path_of("A  (bin)  logo.png").as_deref(), Some("logo.png"));
    }

    #[test]
    fn test_commit_progress() {
        assert_eq!(path_of("Sending        trunk/a.txt").as_deref(), Some("trunk/a.txt"));
        assert_eq!(path_of("Adding  (bin)  img.png").as_deref(), Some("img.png"));
        assert_eq!(path_of("Adding         b.txt").as_deref(), Some("b.txt"));
        assert_eq!(path_of("Deleting       c.txt").as_deref(), Some("c.txt"));
        assert_eq!(path_of("Replacing      d.txt").as_deref(), Some("d.txt"));
        assert_eq!(parse("Transmitting file data ..done"), None);
        assert_eq!(parse("Committing transaction..."), None);
    }

    #[test]
    fn test_revision_summaries() {
        assert_eq!(revision_of("Checked out revision 7."), Some(7));
        assert_eq!(revision_of("Updated to revision 8."), Some(8));
        assert_eq!(revision_of("At revision 9."), Some(9));
        assert_eq!(revision_of("Exported revision 10."), Some(10));
        assert_eq!(revision_of("External at revision 11."), Some(11));
        assert_eq!(path_of("At revision 9."), None);
    }

    #[test]
    fn test_quoted_paths() {
        assert_eq!(path_of("Reverted 'a b.txt'").as_deref(), Some("a b.txt"));
        assert_eq!(path_of("Restored 'x.txt'").as_deref(), Some("x.txt"));
        assert_eq!(
            path_of("Resolved conflicted state of 'conf.txt'").as_deref(),
            Some("conf.txt")
        );
        assert_eq!(
            path_of("'trunk/a.txt' locked by user 'alice'.").as_deref(),
            Some("trunk/a.txt")
        );
        assert_eq!(path_of("'trunk/a.txt' unlocked.").as_deref(), Some("trunk/a.txt"));
        assert_eq!(
            path_of("Unlock failed on 'trunk/a.txt' (403 Forbidden)").as_deref(),
            Some("trunk/a.txt")
        );
        assert_eq!(
            path_of("Skipped missing target: 'nope'").as_deref(),
            Some("nope")
        );
        assert_eq!(path_of("Skipped 'busy'").as_deref(), Some("busy"));
        assert_eq!(path_of("Updating 'wc':").as_deref(), Some("wc"));
        assert_eq!(
            path_of("--- Merging r3 through r5 into '.':").as_deref(),
            Some(".")
        );
        assert_eq!(
            path_of("--- Recording mergeinfo for merge of r3 through r5 into '.':").as_deref(),
            Some(".")
        );
    }

    #[test]
    fn test_unrecognized_lines() {
        assert_eq!(parse(""), None);
        assert_eq!(parse("Summary of conflicts:"), None);
        assert_eq!(parse("  Text conflicts: 1"), None);
        assert_eq!(parse("Export complete."), None);
        assert_eq!(parse("    leading blanks only"), None);
    }
}
