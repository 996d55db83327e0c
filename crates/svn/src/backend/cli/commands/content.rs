use std::sync::LazyLock;

use regex::Regex;

use super::{compiled, parse_svn_date};
use crate::backend::cli::arguments::Arguments;
use crate::backend::cli::command::CommandKind;
use crate::backend::cli::process::OutputKind;
use crate::error::SvnError;
use crate::types::{AnnotateLine, Depth, ListEntry, NodeKind, Revision, RevisionRange, Target};

/// `svn cat`, captured as raw bytes
pub struct CatCommand<'a> {
    pub target: &'a Target,
    pub revision: &'a Revision,
}

impl CommandKind for CatCommand<'_> {
    fn name(&self) -> &'static str {
        "cat"
    }

    fn output_kind(&self) -> OutputKind {
        OutputKind::Bytes
    }

    fn prepare(&self, args: &mut Arguments) -> Result<(), SvnError> {
        args.add("cat").add_revision(self.revision).add_target(self.target);
        Ok(())
    }
}

/// `svn blame -v`
pub struct BlameCommand<'a> {
    pub target: &'a Target,
    pub range: &'a RevisionRange,
}

impl CommandKind for BlameCommand<'_> {
    fn name(&self) -> &'static str {
        "blame"
    }

    fn prepare(&self, args: &mut Arguments) -> Result<(), SvnError> {
        args.add("blame")
            .add("-v")
            .add_range(self.range)
            .add_target(self.target);
        Ok(())
    }
}

/// `svn list`
pub struct ListCommand<'a> {
    pub target: &'a Target,
    pub revision: &'a Revision,
    pub recursive: bool,
}

impl CommandKind for ListCommand<'_> {
    fn name(&self) -> &'static str {
        "list"
    }

    fn prepare(&self, args: &mut Arguments) -> Result<(), SvnError> {
        args.add("list").add_revision(self.revision);
        if self.recursive {
            args.add_depth(Depth::Infinity);
        }
        args.add_target(self.target);
        Ok(())
    }
}

static BLAME_LINE: LazyLock<Result<Regex, regex::Error>> = LazyLock::new(|| {
    Regex::new(
        r"^\s*(?P<rev>\d+|-)\s+(?P<author>\S+)(?:\s+(?P<date>\d{4}-\d{2}-\d{2} \d{2}:\d{2}:\d{2} [+-]\d{4} \([^)]*\)))?",
    )
});

/// Pair each blame line with the matching line of the file content
///
/// The text column of blame output is re-encoded, so content comes from a
/// separate fetch and must have exactly as many lines.
pub fn correlate_annotations(
    blame: &[String],
    content: &[u8],
) -> Result<Vec<AnnotateLine>, SvnError> {
    let pattern = compiled(&BLAME_LINE)?;
    let text = String::from_utf8_lossy(content);
    let content_lines: Vec<&str> = text
        .split_terminator('\n')
        .map(|l| l.trim_end_matches('\r'))
        .collect();

    if blame.len() != content_lines.len() {
        return Err(SvnError::Parse(format!(
            "blame reported {} lines but the content has {}",
            blame.len(),
            content_lines.len()
        )));
    }

    blame
        .iter()
        .zip(content_lines)
        .enumerate()
        .map(|(index, (line, content))| {
            let caps = pattern
                .captures(line)
                .ok_or_else(|| SvnError::Parse(format!("unexpected blame line: {line}")))?;
            let author = match &caps["author"] {
                "-" => None,
                author => Some(author.to_string()),
            };
            Ok(AnnotateLine {
                line_number: index + 1,
                revision: caps["rev"].parse().ok(),
                author,
                date: caps.name("date").and_then(|m| parse_svn_date(m.as_str())),
                content: content.to_string(),
            })
        })
        .collect()
}

/// Directory entries end in `/`
pub fn parse_list(lines: &[String]) -> Vec<ListEntry> {
    lines
        .iter()
        .map(|l| l.trim_end_matches('\r'))
        .filter(|l| !l.is_empty())
        .map(|line| match line.strip_suffix('/') {
            Some(dir) => ListEntry {
                path: dir.to_string(),
                node_kind: NodeKind::Directory,
            },
            None => ListEntry {
                path: line.to_string(),
                node_kind: NodeKind::File,
            },
        })
        .collect()
}
