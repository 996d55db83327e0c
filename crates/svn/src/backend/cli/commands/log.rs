use std::sync::LazyLock;

use regex::Regex;

use super::{compiled, parse_svn_date};
use crate::backend::cli::arguments::Arguments;
use crate::backend::cli::command::CommandKind;
use crate::error::SvnError;
use crate::types::{ChangedPath, LogEntry, RevisionRange, Target};

pub struct LogCommand<'a> {
    pub target: &'a Target,
    pub range: &'a RevisionRange,
    pub limit: Option<usize>,
}

impl CommandKind for LogCommand<'_> {
    fn name(&self) -> &'static str {
        "log"
    }

    fn prepare(&self, args: &mut Arguments) -> Result<(), SvnError> {
        args.add("log").add("-v").add_range(self.range);
        if let Some(limit) = self.limit {
            args.add_option("--limit", limit.to_string());
        }
        args.add_target(self.target);
        Ok(())
    }
}

static HEADER: LazyLock<Result<Regex, regex::Error>> =
    LazyLock::new(|| Regex::new(r"^r(\d+) \| (.*) \| (.*) \| (\d+) lines?$"));

static CHANGED_PATH: LazyLock<Result<Regex, regex::Error>> =
    LazyLock::new(|| Regex::new(r"^\s+([ADMR]) (.+?)(?: \(from (.+):(\d+)\))?$"));

/// Parse `svn log -v` output
///
/// Messages are taken by the line count in each header, so a message that
/// itself contains a dashed separator is not split.
pub fn parse_log(lines: &[String]) -> Result<Vec<LogEntry>, SvnError> {
    let header = compiled(&HEADER)?;
    let changed_path = compiled(&CHANGED_PATH)?;
    let mut entries = Vec::new();
    let mut iter = lines.iter().map(|l| l.trim_end_matches('\r')).peekable();

    while let Some(line) = iter.next() {
        let Some(caps) = header.captures(line) else {
            continue;
        };
        let revision = caps[1]
            .parse()
            .map_err(|_| SvnError::Parse(format!("bad revision in log header: {line}")))?;
        let author = match &caps[2] {
            "(no author)" => None,
            author => Some(author.to_string()),
        };
        let date = parse_svn_date(&caps[3]);
        let message_lines: usize = caps[4]
            .parse()
            .map_err(|_| SvnError::Parse(format!("bad line count in log header: {line}")))?;

        let mut changed_paths = Vec::new();
        if iter.next_if(|l| *l == "Changed paths:").is_some() {
            while let Some(entry) = iter.next_if(|l| !l.is_empty()) {
                let caps = changed_path.captures(entry).ok_or_else(|| {
                    SvnError::Parse(format!("unexpected changed path line: {entry}"))
                })?;
                changed_paths.push(ChangedPath {
                    action: caps[1].chars().next().unwrap_or('M'),
                    path: caps[2].to_string(),
                    copied_from_path: caps.get(3).map(|m| m.as_str().to_string()),
                    copied_from_revision: caps.get(4).and_then(|m| m.as_str().parse().ok()),
                });
            }
        }
        // blank line between header block and message
        iter.next_if(|l| l.is_empty());

        let message: Vec<&str> = iter.by_ref().take(message_lines).collect();
        if message.len() != message_lines {
            return Err(SvnError::Parse(format!(
                "log message of r{revision} truncated"
            )));
        }

        entries.push(LogEntry {
            revision,
            author,
            date,
            message: message.join("\n"),
            changed_paths,
        });
    }

    Ok(entries)
}
