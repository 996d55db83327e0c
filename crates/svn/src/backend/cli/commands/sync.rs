use std::path::{Path, PathBuf};

use super::require_url;
use crate::backend::cli::arguments::Arguments;
use crate::backend::cli::command::CommandKind;
use crate::error::SvnError;
use crate::types::{Depth, Revision, Target};

pub struct CheckoutCommand<'a> {
    pub url: &'a Target,
    pub path: &'a Path,
    pub revision: &'a Revision,
    pub depth: Depth,
}

impl CommandKind for CheckoutCommand<'_> {
    fn name(&self) -> &'static str {
        "checkout"
    }

    fn prepare(&self, args: &mut Arguments) -> Result<(), SvnError> {
        let url = require_url(self.url, "checkout source")?;
        args.add("checkout")
            .add_revision(self.revision)
            .add_depth(self.depth)
            .add_target(url)
            .add_path(self.path);
        Ok(())
    }

    fn reports_progress(&self) -> bool {
        true
    }
}

pub struct UpdateCommand<'a> {
    pub paths: &'a [PathBuf],
    pub revision: &'a Revision,
    pub depth: Depth,
}

impl CommandKind for UpdateCommand<'_> {
    fn name(&self) -> &'static str {
        "update"
    }

    fn prepare(&self, args: &mut Arguments) -> Result<(), SvnError> {
        args.add("update")
            .add_revision(self.revision)
            .add_depth(self.depth);
        args.add_paths(self.paths)?;
        Ok(())
    }

    fn reports_progress(&self) -> bool {
        true
    }
}

pub struct SwitchCommand<'a> {
    pub path: &'a Path,
    pub url: &'a Target,
    pub revision: &'a Revision,
    pub depth: Depth,
}

impl CommandKind for SwitchCommand<'_> {
    fn name(&self) -> &'static str {
        "switch"
    }

    fn prepare(&self, args: &mut Arguments) -> Result<(), SvnError> {
        let url = require_url(self.url, "switch target")?;
        args.add("switch")
            .add_revision(self.revision)
            .add_depth(self.depth)
            .add_target(url)
            .add_path(self.path);
        Ok(())
    }

    fn reports_progress(&self) -> bool {
        true
    }
}

/// `svn commit` with the message passed through a file
pub struct CommitCommand<'a> {
    pub paths: &'a [PathBuf],
    pub message: &'a str,
    pub keep_locks: bool,
}

impl CommandKind for CommitCommand<'_> {
    fn name(&self) -> &'static str {
        "commit"
    }

    fn prepare(&self, args: &mut Arguments) -> Result<(), SvnError> {
        args.add("commit");
        args.add_message(self.message)?;
        args.add_flag_if(self.keep_locks, "--no-unlock");
        args.add_paths(self.paths)?;
        Ok(())
    }

    fn reports_progress(&self) -> bool {
        true
    }
}

pub struct ExportCommand<'a> {
    pub source: &'a Target,
    pub destination: &'a Path,
    pub revision: &'a Revision,
    pub force: bool,
}

impl CommandKind for ExportCommand<'_> {
    fn name(&self) -> &'static str {
        "export"
    }

    fn prepare(&self, args: &mut Arguments) -> Result<(), SvnError> {
        args.add("export")
            .add_revision(self.revision)
            .add_flag_if(self.force, "--force")
            .add_target(self.source)
            .add_path(self.destination);
        Ok(())
    }

    fn reports_progress(&self) -> bool {
        true
    }
}

pub struct ImportCommand<'a> {
    pub path: &'a Path,
    pub url: &'a Target,
    pub message: &'a str,
}

impl CommandKind for ImportCommand<'_> {
    fn name(&self) -> &'static str {
        "import"
    }

    fn prepare(&self, args: &mut Arguments) -> Result<(), SvnError> {
        let url = require_url(self.url, "import destination")?;
        args.add("import");
        args.add_message(self.message)?;
        args.add_path(self.path).add_target(url);
        Ok(())
    }

    fn reports_progress(&self) -> bool {
        true
    }
}
