//! Executable lookup and shell-style quoting helpers.

use std::path::{Path, PathBuf};

/// Resolve an executable name (or explicit path) the way a shell would.
///
/// Returns `None` when nothing runnable is found on `PATH`.
pub fn resolve_executable_path_blocking(executable: impl AsRef<Path>) -> Option<PathBuf> {
    let executable = executable.as_ref();
    match which::which(executable) {
        Ok(path) => Some(path),
        Err(err) => {
            tracing::debug!(executable = %executable.display(), "executable not resolved: {err}");
            None
        }
    }
}

/// Render a command line for logs, quoting arguments that need it.
pub fn quote_command_line<I, S>(parts: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    parts
        .into_iter()
        .map(|part| {
            let part = part.as_ref();
            match shlex::try_quote(part) {
                Ok(quoted) => quoted.into_owned(),
                // Interior NUL bytes cannot be quoted; show them escaped instead.
                Err(_) => part.escape_default().to_string(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
