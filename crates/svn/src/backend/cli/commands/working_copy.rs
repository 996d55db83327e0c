use std::path::{Path, PathBuf};

use crate::backend::cli::arguments::Arguments;
use crate::backend::cli::command::CommandKind;
use crate::error::SvnError;
use crate::types::{AddOptions, ConflictChoice, Depth};

pub struct AddCommand<'a> {
    pub paths: &'a [PathBuf],
    pub options: &'a AddOptions,
}

impl CommandKind for AddCommand<'_> {
    fn name(&self) -> &'static str {
        "add"
    }

    fn prepare(&self, args: &mut Arguments) -> Result<(), SvnError> {
        let options = self.options;
        args.add("add")
            .add_depth(options.depth)
            .add_flag_if(options.force, "--force")
            .add_flag_if(options.no_ignore, "--no-ignore")
            .add_flag_if(options.parents, "--parents");
        args.add_paths(self.paths)?;
        Ok(())
    }

    fn reports_progress(&self) -> bool {
        true
    }
}

pub struct RevertCommand<'a> {
    pub paths: &'a [PathBuf],
    pub recursive: bool,
}

impl CommandKind for RevertCommand<'_> {
    fn name(&self) -> &'static str {
        "revert"
    }

    fn prepare(&self, args: &mut Arguments) -> Result<(), SvnError> {
        args.add("revert");
        if self.recursive {
            args.add_depth(Depth::Infinity);
        }
        args.add_paths(self.paths)?;
        Ok(())
    }

    fn reports_progress(&self) -> bool {
        true
    }
}

pub struct ResolveCommand<'a> {
    pub path: &'a Path,
    pub choice: ConflictChoice,
}

impl CommandKind for ResolveCommand<'_> {
    fn name(&self) -> &'static str {
        "resolve"
    }

    fn prepare(&self, args: &mut Arguments) -> Result<(), SvnError> {
        args.add("resolve")
            .add_option("--accept", self.choice.as_str())
            .add_path(self.path);
        Ok(())
    }

    fn reports_progress(&self) -> bool {
        true
    }
}

pub struct CleanupCommand<'a> {
    pub path: &'a Path,
}

impl CommandKind for CleanupCommand<'_> {
    fn name(&self) -> &'static str {
        "cleanup"
    }

    fn prepare(&self, args: &mut Arguments) -> Result<(), SvnError> {
        args.add("cleanup").add_path(self.path);
        Ok(())
    }
}

pub struct UpgradeCommand<'a> {
    pub path: &'a Path,
}

impl CommandKind for UpgradeCommand<'_> {
    fn name(&self) -> &'static str {
        "upgrade"
    }

    fn prepare(&self, args: &mut Arguments) -> Result<(), SvnError> {
        args.add("upgrade").add_path(self.path);
        Ok(())
    }

    fn reports_progress(&self) -> bool {
        true
    }
}

/// `svn relocate FROM TO PATH`
pub struct RelocateCommand<'a> {
    pub from: &'a str,
    pub to: &'a str,
    pub path: &'a Path,
}

impl CommandKind for RelocateCommand<'_> {
    fn name(&self) -> &'static str {
        "relocate"
    }

    fn prepare(&self, args: &mut Arguments) -> Result<(), SvnError> {
        args.add("relocate")
            .add(self.from)
            .add(self.to)
            .add_path(self.path);
        Ok(())
    }
}
