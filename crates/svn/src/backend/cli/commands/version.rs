use crate::backend::cli::arguments::Arguments;
use crate::backend::cli::command::CommandKind;
use crate::error::SvnError;
use crate::types::Version;

/// `svn --version --quiet`
pub struct VersionCommand;

impl CommandKind for VersionCommand {
    fn name(&self) -> &'static str {
        "version"
    }

    fn prepare(&self, args: &mut Arguments) -> Result<(), SvnError> {
        args.add("--version").add("--quiet");
        Ok(())
    }
}

/// Parse `1.14.2` or `1.14.2 (r1899510)` from the first non-empty line
pub fn parse_version(lines: &[String]) -> Result<Version, SvnError> {
    let line = lines
        .iter()
        .map(|l| l.trim())
        .find(|l| !l.is_empty())
        .ok_or_else(|| SvnError::Parse("empty version output".to_string()))?;

    let number = line.split_whitespace().next().unwrap_or_default();
    let mut parts = number.split('.').map(|p| {
        let digits: String = p.chars().take_while(char::is_ascii_digit).collect();
        digits.parse::<u32>().ok()
    });
    match (parts.next().flatten(), parts.next().flatten(), parts.next()) {
        (Some(major), Some(minor), patch) => Ok(Version::new(
            major,
            minor,
            patch.flatten().unwrap_or_default(),
        )),
        _ => Err(SvnError::Parse(format!("unrecognized version: {line}"))),
    }
}
