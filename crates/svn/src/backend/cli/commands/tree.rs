use std::path::Path;

use crate::backend::cli::arguments::Arguments;
use crate::backend::cli::command::CommandKind;
use crate::error::SvnError;
use crate::types::{MergeOptions, RemoveOptions, Revision, RevisionRange, Target};

/// Repository-side changes commit immediately and need a log message
fn add_message_for_urls(
    args: &mut Arguments,
    targets: &[&Target],
    message: Option<&str>,
) -> Result<(), SvnError> {
    if targets.iter().any(|t| t.is_url()) {
        args.add_message(message.unwrap_or_default())?;
    }
    Ok(())
}

pub struct CopyCommand<'a> {
    pub source: &'a Target,
    pub destination: &'a Target,
    pub revision: Option<&'a Revision>,
    pub message: Option<&'a str>,
}

impl CommandKind for CopyCommand<'_> {
    fn name(&self) -> &'static str {
        "copy"
    }

    fn prepare(&self, args: &mut Arguments) -> Result<(), SvnError> {
        args.add("copy");
        if let Some(revision) = self.revision {
            args.add_revision(revision);
        }
        add_message_for_urls(args, &[self.destination], self.message)?;
        args.add_target(self.source).add_target(self.destination);
        Ok(())
    }

    fn reports_progress(&self) -> bool {
        true
    }
}

pub struct MoveCommand<'a> {
    pub source: &'a Target,
    pub destination: &'a Target,
    pub message: Option<&'a str>,
    pub force: bool,
}

impl CommandKind for MoveCommand<'_> {
    fn name(&self) -> &'static str {
        "move"
    }

    fn prepare(&self, args: &mut Arguments) -> Result<(), SvnError> {
        args.add("move").add_flag_if(self.force, "--force");
        add_message_for_urls(args, &[self.destination], self.message)?;
        args.add_target(self.source).add_target(self.destination);
        Ok(())
    }

    fn reports_progress(&self) -> bool {
        true
    }
}

pub struct RemoveCommand<'a> {
    pub targets: &'a [Target],
    pub message: Option<&'a str>,
    pub options: &'a RemoveOptions,
}

impl CommandKind for RemoveCommand<'_> {
    fn name(&self) -> &'static str {
        "delete"
    }

    fn prepare(&self, args: &mut Arguments) -> Result<(), SvnError> {
        args.add("delete")
            .add_flag_if(self.options.force, "--force")
            .add_flag_if(self.options.keep_local, "--keep-local");
        let targets: Vec<&Target> = self.targets.iter().collect();
        add_message_for_urls(args, &targets, self.message)?;
        args.add_targets(self.targets)?;
        Ok(())
    }

    fn reports_progress(&self) -> bool {
        true
    }
}

pub struct MkdirCommand<'a> {
    pub targets: &'a [Target],
    pub message: Option<&'a str>,
    pub parents: bool,
}

impl CommandKind for MkdirCommand<'_> {
    fn name(&self) -> &'static str {
        "mkdir"
    }

    fn prepare(&self, args: &mut Arguments) -> Result<(), SvnError> {
        args.add("mkdir").add_flag_if(self.parents, "--parents");
        let targets: Vec<&Target> = self.targets.iter().collect();
        add_message_for_urls(args, &targets, self.message)?;
        args.add_targets(self.targets)?;
        Ok(())
    }

    fn reports_progress(&self) -> bool {
        true
    }
}

/// `svn merge -r START:END SOURCE PATH`
pub struct MergeCommand<'a> {
    pub source: &'a Target,
    pub range: &'a RevisionRange,
    pub path: &'a Path,
    pub options: &'a MergeOptions,
}

impl CommandKind for MergeCommand<'_> {
    fn name(&self) -> &'static str {
        "merge"
    }

    fn prepare(&self, args: &mut Arguments) -> Result<(), SvnError> {
        let options = self.options;
        args.add("merge")
            .add_range(self.range)
            .add_flag_if(options.dry_run, "--dry-run")
            .add_flag_if(options.ignore_ancestry, "--ignore-ancestry")
            .add_flag_if(options.force, "--force")
            .add_flag_if(options.record_only, "--record-only")
            .add_target(self.source)
            .add_path(self.path);
        Ok(())
    }

    fn reports_progress(&self) -> bool {
        true
    }
}

/// `svn lock` on repository URLs
pub struct LockCommand<'a> {
    pub targets: &'a [Target],
    pub comment: &'a str,
    pub force: bool,
}

impl CommandKind for LockCommand<'_> {
    fn name(&self) -> &'static str {
        "lock"
    }

    fn prepare(&self, args: &mut Arguments) -> Result<(), SvnError> {
        args.add("lock").add_flag_if(self.force, "--force");
        args.add_message(self.comment)?;
        args.add_targets(self.targets)?;
        Ok(())
    }

    fn reports_progress(&self) -> bool {
        true
    }
}

pub struct UnlockCommand<'a> {
    pub targets: &'a [Target],
    pub force: bool,
}

impl CommandKind for UnlockCommand<'_> {
    fn name(&self) -> &'static str {
        "unlock"
    }

    fn prepare(&self, args: &mut Arguments) -> Result<(), SvnError> {
        args.add("unlock").add_flag_if(self.force, "--force");
        args.add_targets(self.targets)?;
        Ok(())
    }

    fn reports_progress(&self) -> bool {
        true
    }
}
