use std::path::Path;

use crate::backend::cli::arguments::Arguments;
use crate::backend::cli::command::{CommandKind, is_error_line};
use crate::backend::cli::process::OutputKind;
use crate::error::SvnError;
use crate::types::{Depth, Property, Target};

/// Warning printed by newer releases when the property is not set
const PROPERTY_NOT_FOUND: &str = "W200017";

/// Summary line that follows warnings on a non-zero exit
const PROBLEM_OCCURRED: &str = "E200000";

/// `svn propget --strict`, captured as raw bytes
pub struct PropGetCommand<'a> {
    pub target: &'a Target,
    pub name: &'a str,
}

impl PropGetCommand<'_> {
    /// Whether the captured stderr says the property is unset
    pub fn reported_missing(errors: &[String]) -> bool {
        errors.iter().any(|line| line.contains(PROPERTY_NOT_FOUND))
    }
}

impl CommandKind for PropGetCommand<'_> {
    fn name(&self) -> &'static str {
        "propget"
    }

    fn output_kind(&self) -> OutputKind {
        OutputKind::Bytes
    }

    fn prepare(&self, args: &mut Arguments) -> Result<(), SvnError> {
        args.add("propget")
            .add("--strict")
            .add(self.name)
            .add_target(self.target);
        Ok(())
    }

    fn is_error_message(&self, line: &str) -> bool {
        is_error_line(line)
            && !line.contains(PROPERTY_NOT_FOUND)
            && !line.contains(PROBLEM_OCCURRED)
    }
}

/// `svn proplist -v`
pub struct PropListCommand<'a> {
    pub target: &'a Target,
}

impl CommandKind for PropListCommand<'_> {
    fn name(&self) -> &'static str {
        "proplist"
    }

    fn prepare(&self, args: &mut Arguments) -> Result<(), SvnError> {
        args.add("proplist").add("-v").add_target(self.target);
        Ok(())
    }
}

/// `svn propset NAME -F FILE`; the value never touches the command line
pub struct PropSetCommand<'a> {
    pub path: &'a Path,
    pub name: &'a str,
    pub value: &'a [u8],
    pub recursive: bool,
}

impl CommandKind for PropSetCommand<'_> {
    fn name(&self) -> &'static str {
        "propset"
    }

    fn prepare(&self, args: &mut Arguments) -> Result<(), SvnError> {
        args.add("propset").add(self.name);
        args.add_file_option("-F", self.value)?;
        if self.recursive {
            args.add_depth(Depth::Infinity);
        }
        args.add_path(self.path);
        Ok(())
    }
}

pub struct PropDelCommand<'a> {
    pub path: &'a Path,
    pub name: &'a str,
    pub recursive: bool,
}

impl CommandKind for PropDelCommand<'_> {
    fn name(&self) -> &'static str {
        "propdel"
    }

    fn prepare(&self, args: &mut Arguments) -> Result<(), SvnError> {
        args.add("propdel").add(self.name);
        if self.recursive {
            args.add_depth(Depth::Infinity);
        }
        args.add_path(self.path);
        Ok(())
    }
}

/// Parse `svn proplist -v`: names indented by two spaces, value lines by four
pub fn parse_proplist(lines: &[String]) -> Vec<Property> {
    fn flush(properties: &mut [Property], value_lines: &mut Vec<&str>) {
        if let Some(last) = properties.last_mut() {
            last.value = value_lines.join("\n").into_bytes();
        }
        value_lines.clear();
    }

    let mut properties: Vec<Property> = Vec::new();
    let mut value_lines: Vec<&str> = Vec::new();

    for line in lines.iter().map(|l| l.trim_end_matches('\r')) {
        if let Some(value) = line.strip_prefix("    ") {
            if !properties.is_empty() {
                value_lines.push(value);
            }
        } else if let Some(name) = line.strip_prefix("  ") {
            flush(&mut properties, &mut value_lines);
            properties.push(Property {
                name: name.trim().to_string(),
                value: Vec::new(),
            });
        } else if line.starts_with("Properties on ") {
            flush(&mut properties, &mut value_lines);
        }
    }
    flush(&mut properties, &mut value_lines);

    properties
}
