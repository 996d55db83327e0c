//! Argument vector construction with the executable's encoding rules.
//!
//! Anything that may contain control characters or grow without bound
//! (messages, property values, long target lists) is written to a temporary
//! file and referenced by flag instead of being placed on the command line.

use std::ffi::{OsStr, OsString};
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::TempPath;

use crate::error::SvnError;
use crate::types::{Credentials, Depth, Revision, RevisionRange, Target};

/// Shown instead of the password in logged command lines.
const REDACTED: &str = "******";

/// Ordered arguments for one invocation plus the temp files they reference
#[derive(Default)]
pub struct Arguments {
    args: Vec<OsString>,
    redacted: Vec<usize>,
    temp_files: Vec<TempPath>,
    targets_threshold: usize,
}

impl Arguments {
    pub fn new(targets_threshold: usize) -> Self {
        Self {
            targets_threshold,
            ..Self::default()
        }
    }

    pub fn add(&mut self, arg: impl AsRef<OsStr>) -> &mut Self {
        self.args.push(arg.as_ref().to_os_string());
        self
    }

    /// Add a flag followed by its value
    pub fn add_option(&mut self, flag: &str, value: impl AsRef<OsStr>) -> &mut Self {
        self.add(flag).add(value)
    }

    pub fn add_flag_if(&mut self, condition: bool, flag: &str) -> &mut Self {
        if condition {
            self.add(flag);
        }
        self
    }

    /// Add a working-copy path, escaping an embedded peg separator
    pub fn add_path(&mut self, path: &Path) -> &mut Self {
        self.args.push(escape_path(path));
        self
    }

    /// Add a path or URL; a URL with a peg revision becomes `URL@REV`
    pub fn add_target(&mut self, target: &Target) -> &mut Self {
        self.args.push(render_target(target));
        self
    }

    /// Add many paths, spilling them into a `--targets` file when numerous
    pub fn add_paths(&mut self, paths: &[PathBuf]) -> Result<&mut Self, SvnError> {
        let rendered: Vec<OsString> = paths.iter().map(|p| escape_path(p)).collect();
        self.add_rendered_targets(rendered)
    }

    /// Add many paths or URLs, spilling them into a `--targets` file when numerous
    pub fn add_targets(&mut self, targets: &[Target]) -> Result<&mut Self, SvnError> {
        let rendered: Vec<OsString> = targets.iter().map(render_target).collect();
        self.add_rendered_targets(rendered)
    }

    fn add_rendered_targets(&mut self, rendered: Vec<OsString>) -> Result<&mut Self, SvnError> {
        if rendered.len() <= self.targets_threshold {
            self.args.extend(rendered);
            return Ok(self);
        }

        let mut contents = Vec::new();
        for target in &rendered {
            let line = target.to_str().ok_or_else(|| {
                SvnError::InvalidArgument(format!(
                    "target is not valid UTF-8: {}",
                    target.to_string_lossy()
                ))
            })?;
            contents.extend_from_slice(line.as_bytes());
            contents.push(b'\n');
        }
        let file = self.write_temp_file("svn-targets-", &contents)?;
        Ok(self.add_option("--targets", file))
    }

    /// `-r REV`
    pub fn add_revision(&mut self, revision: &Revision) -> &mut Self {
        self.add_option("-r", revision.to_string())
    }

    /// `-r START:END`, with `HEAD` for a missing endpoint
    pub fn add_range(&mut self, range: &RevisionRange) -> &mut Self {
        self.add_option("-r", range.to_arg())
    }

    pub fn add_depth(&mut self, depth: Depth) -> &mut Self {
        self.add_option("--depth", depth.as_str())
    }

    /// Reference a commit message through a temp file, never inline
    pub fn add_message(&mut self, message: &str) -> Result<&mut Self, SvnError> {
        let file = self.write_temp_file("svn-message-", message.as_bytes())?;
        Ok(self.add_option("-F", file).add_option("--encoding", "UTF-8"))
    }

    /// Reference arbitrary bytes (e.g. a property value) through a temp file
    pub fn add_file_option(&mut self, flag: &str, contents: &[u8]) -> Result<&mut Self, SvnError> {
        let file = self.write_temp_file("svn-value-", contents)?;
        Ok(self.add_option(flag, file))
    }

    pub fn add_credentials(&mut self, credentials: &Credentials) -> &mut Self {
        if credentials.username.is_empty() {
            return self;
        }
        self.add_option("--username", &credentials.username);
        self.add("--password");
        self.redacted.push(self.args.len());
        if credentials.password.is_empty() && cfg!(windows) {
            // cmd.exe drops empty arguments; the quotes reach svn as an empty token
            self.add("\"\"")
        } else {
            self.add(&credentials.password)
        }
    }

    /// Flags every invocation carries
    pub fn add_common(&mut self, config_dir: Option<&Path>) -> &mut Self {
        if let Some(dir) = config_dir {
            self.add_option("--config-dir", dir);
        }
        self.add("--non-interactive")
    }

    pub fn as_slice(&self) -> &[OsString] {
        &self.args
    }

    #[cfg(test)]
    pub fn temp_files(&self) -> impl Iterator<Item = &Path> {
        self.temp_files.iter().map(|p| &**p)
    }

    /// Command line for logs, with the password hidden
    pub fn redacted_command_line(&self, executable: &Path) -> String {
        let parts = std::iter::once(executable.to_string_lossy().into_owned()).chain(
            self.args.iter().enumerate().map(|(i, arg)| {
                if self.redacted.contains(&i) {
                    REDACTED.to_string()
                } else {
                    arg.to_string_lossy().into_owned()
                }
            }),
        );
        utils::shell::quote_command_line(parts)
    }

    /// Delete every temp file created for this invocation
    pub fn cleanup(&mut self) {
        for file in self.temp_files.drain(..) {
            let path = file.to_path_buf();
            if let Err(err) = file.close() {
                tracing::warn!(path = %path.display(), "failed to remove temp file: {err}");
            }
        }
    }

    fn write_temp_file(&mut self, prefix: &str, contents: &[u8]) -> Result<PathBuf, SvnError> {
        let mut file = tempfile::Builder::new().prefix(prefix).tempfile()?;
        file.write_all(contents)?;
        file.flush()?;
        let path = file.into_temp_path();
        let location = path.to_path_buf();
        self.temp_files.push(path);
        Ok(location)
    }
}

impl std::fmt::Debug for Arguments {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Arguments")
            .field("args", &self.redacted_command_line(Path::new("svn")))
            .field("temp_files", &self.temp_files.len())
            .finish()
    }
}

/// Append `@` to paths containing one, so the last `@` is not read as a peg
fn escape_path(path: &Path) -> OsString {
    let mut rendered = path.as_os_str().to_os_string();
    if path.to_string_lossy().contains('@') {
        rendered.push("@");
    }
    rendered
}

fn render_target(target: &Target) -> OsString {
    match target {
        Target::Path(path) => escape_path(path),
        Target::Url { url, peg: Some(peg) } => OsString::from(format!("{url}@{peg}")),
        Target::Url { url, peg: None } if url.contains('@') => OsString::from(format!("{url}@")),
        Target::Url { url, peg: None } => OsString::from(url),
    }
}
