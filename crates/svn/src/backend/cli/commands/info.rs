use std::path::PathBuf;

use super::{is_error_ignoring_missing, parse_svn_date};
use crate::backend::cli::arguments::Arguments;
use crate::backend::cli::command::{CommandKind, is_error_line};
use crate::error::SvnError;
use crate::types::{Depth, Info, LockInfo, NodeKind, Revision, Schedule, Target};

/// `svn info` over one or more targets
pub struct InfoCommand<'a> {
    pub targets: &'a [Target],
    pub revision: Option<&'a Revision>,
    /// Report unversioned or missing targets as absent instead of failing
    pub tolerate_missing: bool,
}

impl CommandKind for InfoCommand<'_> {
    fn name(&self) -> &'static str {
        "info"
    }

    fn prepare(&self, args: &mut Arguments) -> Result<(), SvnError> {
        args.add("info").add_depth(Depth::Empty);
        if let Some(revision) = self.revision {
            args.add_revision(revision);
        }
        args.add_targets(self.targets)?;
        Ok(())
    }

    fn is_error_message(&self, line: &str) -> bool {
        if self.tolerate_missing {
            is_error_ignoring_missing(line)
        } else {
            is_error_line(line)
        }
    }
}

/// Parse `Key: Value` blocks separated by blank lines
pub fn parse_info(lines: &[String]) -> Vec<Info> {
    let mut infos = Vec::new();
    let mut current: Option<Info> = None;
    let mut in_tree_conflict = false;
    let mut iter = lines.iter().map(|l| l.trim_end_matches('\r'));

    while let Some(line) = iter.next() {
        if line.is_empty() {
            infos.extend(current.take());
            in_tree_conflict = false;
            continue;
        }

        let info = current.get_or_insert_with(Info::default);

        if let Some(count) = lock_comment_lines(line) {
            let comment: Vec<&str> = iter.by_ref().take(count).collect();
            info.lock.get_or_insert_with(LockInfo::default).comment = Some(comment.join("\n"));
            continue;
        }

        if line.starts_with(char::is_whitespace) {
            // indented tree-conflict source details
            if let Some(conflict) = info.tree_conflict.as_mut().filter(|_| in_tree_conflict) {
                conflict.push('\n');
                conflict.push_str(line.trim());
            }
            continue;
        }

        let Some((key, value)) = line
            .split_once(": ")
            .or_else(|| line.strip_suffix(':').map(|key| (key, "")))
        else {
            continue;
        };
        apply_field(info, key, value.trim());
        in_tree_conflict = key == "Tree conflict";
    }
    infos.extend(current);

    infos
}

/// `Lock Comment (2 lines):` announces that many raw lines
fn lock_comment_lines(line: &str) -> Option<usize> {
    let count = line.strip_prefix("Lock Comment (")?.split_whitespace().next()?;
    count.parse().ok()
}

fn apply_field(info: &mut Info, key: &str, value: &str) {
    let text = || Some(value.to_string());
    let number = || value.parse::<u64>().ok();

    match key {
        "Path" => info.path = Some(PathBuf::from(value)),
        "Name" => info.name = text(),
        "Working Copy Root Path" => info.working_copy_root = Some(PathBuf::from(value)),
        "URL" => info.url = text(),
        "Relative URL" => info.relative_url = text(),
        "Repository Root" => info.repository_root = text(),
        "Repository UUID" => info.repository_uuid = text(),
        "Revision" => info.revision = number(),
        "Node Kind" => info.node_kind = NodeKind::parse(value),
        "Schedule" => info.schedule = Schedule::parse(value),
        "Depth" => info.depth = value.parse().ok(),
        "Last Changed Author" => info.last_changed_author = text(),
        "Last Changed Rev" => info.last_changed_revision = number(),
        "Last Changed Date" => info.last_changed_date = parse_svn_date(value),
        "Text Last Updated" => info.text_last_updated = parse_svn_date(value),
        "Checksum" => info.checksum = text(),
        "Copied From URL" => info.copied_from_url = text(),
        "Copied From Rev" => info.copied_from_revision = number(),
        "Lock Token" => info.lock.get_or_insert_with(LockInfo::default).token = text(),
        "Lock Owner" => info.lock.get_or_insert_with(LockInfo::default).owner = text(),
        "Lock Created" => {
            info.lock.get_or_insert_with(LockInfo::default).created = parse_svn_date(value)
        }
        "Conflict Previous Base File" => info.conflict.base = Some(conflict_file(info, value)),
        "Conflict Previous Working File" => {
            info.conflict.working = Some(conflict_file(info, value))
        }
        "Conflict Current Base File" => info.conflict.incoming = Some(conflict_file(info, value)),
        "Tree conflict" => info.tree_conflict = text(),
        "Changelist" => info.changelist = text(),
        _ => {}
    }
}

/// Conflict files are reported relative to the conflicted node's directory
fn conflict_file(info: &Info, value: &str) -> PathBuf {
    match info.path.as_deref().and_then(|p| p.parent()) {
        Some(dir) if !dir.as_os_str().is_empty() => dir.join(value),
        _ => PathBuf::from(value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use std::path::Path;

    fn lines(text: &str) -> Vec<String> {
        text.lines().map(str::to_string).collect()
    }

    #[test]
    fn test_single_block() {
        let output = lines(
            "Path: /wc/trunk/a.txt\n\
             Name: a.txt\n\
             Working Copy Root Path: /wc\n\
             URL: file:///repo/trunk/a.txt\n\
             Relative URL: ^/trunk/a.txt\n\
             Repository Root: file:///repo\n\
             Repository UUID: 2c2d1f2a-0000-0000-0000-000000000000\n\
             Revision: 12\n\
             Node Kind: file\n\
             Schedule: normal\n\
             Last Changed Author: alice\n\
             Last Changed Rev: 10\n\
             Last Changed Date: 2024-01-02 10:11:12 +0000 (Tue, 02 Jan 2024)\n\
             Checksum: 3f786850e387550fdab836ed7e6dc881de23001b\n",
        );
        let infos = parse_info(&output);
        assert_eq!(infos.len(), 1);
        let info = &infos[0];
        assert_eq!(info.path.as_deref(), Some(Path::new("/wc/trunk/a.txt")));
        assert_eq!(info.url.as_deref(), Some("file:///repo/trunk/a.txt"));
        assert_eq!(info.repository_root.as_deref(), Some("file:///repo"));
        assert_eq!(info.revision, Some(12));
        assert_eq!(info.node_kind, NodeKind::File);
        assert_eq!(info.schedule, Schedule::Normal);
        assert_eq!(info.last_changed_revision, Some(10));
        assert_eq!(
            info.last_changed_date,
            Some(Utc.with_ymd_and_hms(2024, 1, 2, 10, 11, 12).unwrap())
        );
        assert!(info.lock.is_none());
    }

    #[test]
    fn test_multiple_blocks_and_copy_source() {
        let output = lines(
            "Path: one\n\
             Node Kind: directory\n\
             Schedule: add\n\
             Depth: immediates\n\
             Copied From URL: file:///repo/trunk/src\n\
             Copied From Rev: 4\n\
             \n\
             Path: two\n\
             Node Kind: file\n\
             Schedule: delete\n\
             \n",
        );
        let infos = parse_info(&output);
        assert_eq!(infos.len(), 2);
        assert_eq!(infos[0].node_kind, NodeKind::Directory);
        assert_eq!(infos[0].schedule, Schedule::Add);
        assert_eq!(infos[0].depth, Some(Depth::Immediates));
        assert_eq!(infos[0].copied_from_revision, Some(4));
        assert_eq!(infos[1].schedule, Schedule::Delete);
    }

    #[test]
    fn test_lock_with_multiline_comment() {
        let output = lines(
            "Path: locked.bin\n\
             Lock Token: opaquelocktoken:1234\n\
             Lock Owner: bob\n\
             Lock Created: 2024-03-04 05:06:07 +0200 (Mon, 04 Mar 2024)\n\
             Lock Comment (2 lines):\n\
             editing the logo\n\
             Path: not a key\n",
        );
        let infos = parse_info(&output);
        let lock = infos[0].lock.as_ref().unwrap();
        assert_eq!(lock.token.as_deref(), Some("opaquelocktoken:1234"));
        assert_eq!(lock.owner.as_deref(), Some("bob"));
        assert_eq!(lock.comment.as_deref(), Some("editing the logo\nPath: not a key"));
        assert_eq!(
            lock.created,
            Some(Utc.with_ymd_and_hms(2024, 3, 4, 3, 6, 7).unwrap())
        );
        assert_eq!(infos[0].path.as_deref(), Some(Path::new("locked.bin")));
    }

    #[test]
    fn test_conflict_files_and_tree_conflict() {
        let output = lines(
            "Path: /wc/conf.txt\n\
             Conflict Previous Base File: conf.txt.r1\n\
             Conflict Previous Working File: conf.txt.mine\n\
             Conflict Current Base File: conf.txt.r2\n\
             Tree conflict: local file edit, incoming file delete or move upon update\n\
             \x20 Source  left: (file) ^/trunk/conf.txt@1\n\
             \x20 Source right: (none) ^/trunk/conf.txt@2\n",
        );
        let info = &parse_info(&output)[0];
        assert_eq!(info.conflict.base.as_deref(), Some(Path::new("/wc/conf.txt.r1")));
        assert_eq!(info.conflict.working.as_deref(), Some(Path::new("/wc/conf.txt.mine")));
        assert_eq!(info.conflict.incoming.as_deref(), Some(Path::new("/wc/conf.txt.r2")));
        let tree = info.tree_conflict.as_deref().unwrap();
        assert!(tree.starts_with("local file edit"));
        assert!(tree.ends_with("Source right: (none) ^/trunk/conf.txt@2"));
    }

    #[test]
    fn test_empty_output() {
        assert!(parse_info(&[]).is_empty());
    }
}
