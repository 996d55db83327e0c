//! One invocation of the executable and everything it produced.
//!
//! A [`Command`] walks `prepare → started → completed → finished` exactly
//! once. The kind-specific parts (subcommand, arguments, output mode and
//! which stderr lines count as failures) live behind [`CommandKind`].

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::arguments::Arguments;
use super::notification::{self, Notification, NotificationListener};
use super::process::{OutputKind, OutputSink};
use crate::error::SvnError;
use crate::types::Credentials;

/// Kind-specific behavior of a command
pub trait CommandKind {
    /// Short name used in errors and logs
    fn name(&self) -> &'static str;

    fn output_kind(&self) -> OutputKind {
        OutputKind::Lines
    }

    /// Append the subcommand and its arguments
    fn prepare(&self, args: &mut Arguments) -> Result<(), SvnError>;

    /// Whether a stderr line marks the command as failed
    fn is_error_message(&self, line: &str) -> bool {
        is_error_line(line)
    }

    /// Whether stdout lines are progress notifications worth broadcasting
    fn reports_progress(&self) -> bool {
        false
    }
}

/// Settings shared by every command a client issues
#[derive(Debug, Clone, Copy)]
pub struct CommandContext<'a> {
    pub config_dir: Option<&'a Path>,
    pub credentials: Option<&'a Credentials>,
    pub targets_threshold: usize,
    /// Directory the process runs in; relative notified paths resolve against it
    pub working_dir: Option<&'a Path>,
}

/// Every non-blank stderr line is an error, except signal noise from tunnels
pub fn is_error_line(line: &str) -> bool {
    let trimmed = line.trim();
    !trimmed.is_empty() && !trimmed.to_ascii_lowercase().contains("killed by signal")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Constructed,
    Prepared,
    Started,
    Completed,
    Finished,
}

pub struct Command<K> {
    kind: K,
    stage: Stage,
    args: Arguments,
    working_dir: Option<PathBuf>,
    listeners: Vec<Arc<dyn NotificationListener>>,
    output: Vec<String>,
    bytes: Vec<u8>,
    errors: Vec<String>,
    notifications: Vec<Notification>,
    failed: bool,
    exit_code: Option<i32>,
}

impl<K: CommandKind> Command<K> {
    pub fn new(kind: K, listeners: Vec<Arc<dyn NotificationListener>>) -> Self {
        Self {
            kind,
            stage: Stage::Constructed,
            args: Arguments::default(),
            working_dir: None,
            listeners,
            output: Vec::new(),
            bytes: Vec::new(),
            errors: Vec::new(),
            notifications: Vec::new(),
            failed: false,
            exit_code: None,
        }
    }

    pub fn name(&self) -> &'static str {
        self.kind.name()
    }

    /// Build the argument vector; allowed once per command
    pub fn prepare(&mut self, context: &CommandContext<'_>) -> Result<(), SvnError> {
        if self.stage != Stage::Constructed {
            return Err(SvnError::AlreadyExecuted(self.name()));
        }

        let mut args = Arguments::new(context.targets_threshold);
        self.kind.prepare(&mut args)?;
        if let Some(credentials) = context.credentials {
            args.add_credentials(credentials);
        }
        args.add_common(context.config_dir);

        self.args = args;
        self.working_dir = context.working_dir.map(Path::to_path_buf);
        self.stage = Stage::Prepared;
        Ok(())
    }

    pub fn started(&mut self, executable: &Path) -> Result<(), SvnError> {
        if self.stage != Stage::Prepared {
            return Err(SvnError::AlreadyExecuted(self.name()));
        }
        self.stage = Stage::Started;
        tracing::debug!(
            command = self.name(),
            "running {}",
            self.args.redacted_command_line(executable)
        );
        Ok(())
    }

    pub fn completed(&mut self, exit_code: Option<i32>) {
        self.exit_code = exit_code;
        self.stage = Stage::Completed;
        tracing::trace!(
            command = self.name(),
            ?exit_code,
            stdout_lines = self.output.len(),
            stderr_lines = self.errors.len(),
            "completed"
        );
    }

    /// Release temp files; safe to call on any path out of a run
    pub fn finished(&mut self) {
        self.args.cleanup();
        self.stage = Stage::Finished;
    }

    pub fn argv(&self) -> &[OsString] {
        self.args.as_slice()
    }

    pub fn working_dir(&self) -> Option<&Path> {
        self.working_dir.as_deref()
    }

    pub fn output(&self) -> &[String] {
        &self.output
    }

    pub fn take_bytes(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.bytes)
    }

    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    /// Revision of the last notification carrying one
    pub fn last_revision(&self) -> Option<u64> {
        self.notifications.iter().rev().find_map(|n| n.revision)
    }

    /// Turn the captured outcome into a result
    ///
    /// A non-zero exit with nothing on stderr also counts as failure.
    pub fn check(&self) -> Result<(), SvnError> {
        if self.failed {
            return Err(SvnError::command_failed(self.name(), &self.errors));
        }
        match self.exit_code {
            Some(code) if code != 0 && self.errors.is_empty() => Err(SvnError::command_failed(
                self.name(),
                &[format!("exited with status {code}")],
            )),
            _ => Ok(()),
        }
    }

    fn notify(&self, notification: &Notification) {
        let Some(path) = notification.path.as_deref() else {
            return;
        };
        let path = match self.working_dir.as_deref() {
            Some(dir) if Path::new(path).is_relative() => dir.join(path),
            _ => PathBuf::from(path),
        };
        for listener in &self.listeners {
            listener.state_changed(&path, notification.revision);
        }
    }
}

impl<K: CommandKind> OutputSink for Command<K> {
    fn output_kind(&self) -> OutputKind {
        self.kind.output_kind()
    }

    fn output_line(&mut self, line: &str) {
        tracing::trace!(command = self.name(), "stdout: {line}");
        if self.kind.reports_progress() {
            if let Some(notification) = notification::parse(line) {
                self.notify(&notification);
                self.notifications.push(notification);
            }
        }
        self.output.push(line.to_string());
    }

    fn output_bytes(&mut self, bytes: &[u8]) {
        self.bytes.extend_from_slice(bytes);
    }

    fn error_line(&mut self, line: &str) {
        tracing::debug!(command = self.name(), "stderr: {line}");
        if self.kind.is_error_message(line) {
            self.failed = true;
        }
        self.errors.push(line.to_string());
    }
}
