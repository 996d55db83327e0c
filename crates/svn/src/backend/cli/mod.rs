//! Command-line client implementation.
//!
//! Every operation builds a fresh [`command::Command`], runs it through an
//! [`process::Executor`] and parses what it printed:
//! - Status merges `svn status` with `svn info` and synthesizes records for
//!   paths outside any working copy
//! - Commits are retried while another process holds the working-copy lock
//! - Messages, property values and long target lists travel through temp files
//!
//! Calls on one client are serialized. [`CommandlineClient::cancel`] may be
//! called from any thread; it kills whatever is running and stops the
//! current call from issuing further commands or retries.

pub mod arguments;
pub mod command;
pub mod commands;
pub mod notification;
pub mod process;

#[cfg(test)]
mod testing;

use std::path::{Component, Path, PathBuf};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use self::command::{Command, CommandContext, CommandKind};
use self::commands::*;
use self::notification::NotificationListener;
use self::process::{Executor, ProcessSession};
use crate::error::SvnError;
use crate::factory::{ClientConfig, ClientType};
use crate::metadata::{MetadataError, WorkingCopyParser};
use crate::traits::*;
use crate::types::*;

/// Client driving the `svn` executable
pub struct CommandlineClient {
    config: ClientConfig,
    executor: Arc<dyn Executor>,
    metadata: Option<Arc<dyn WorkingCopyParser>>,
    listeners: Mutex<Vec<Arc<dyn NotificationListener>>>,
    serial: Mutex<()>,
    cancellation: Cancellation,
}

/// Cancellation of the call currently holding the serial lock
#[derive(Default)]
struct Cancellation {
    requested: Mutex<bool>,
    signal: Condvar,
}

impl Cancellation {
    fn reset(&self) {
        *lock(&self.requested) = false;
    }

    fn request(&self) {
        *lock(&self.requested) = true;
        self.signal.notify_all();
    }

    fn is_requested(&self) -> bool {
        *lock(&self.requested)
    }

    /// Sleep for `delay`, waking early on cancellation; true if cancelled
    fn wait(&self, delay: Duration) -> bool {
        let requested = lock(&self.requested);
        let (requested, _) = self
            .signal
            .wait_timeout_while(requested, delay, |requested| !*requested)
            .unwrap_or_else(PoisonError::into_inner);
        *requested
    }
}

impl CommandlineClient {
    /// Create a client spawning `config.executable`
    ///
    /// Availability is not checked here; [`crate::ClientFactory`] does that.
    pub fn new(config: ClientConfig) -> Self {
        let session = ProcessSession::new(config.executable.clone(), config.environment());
        Self::with_executor(config, Arc::new(session))
    }

    /// Create a client running commands through a custom executor
    pub fn with_executor(config: ClientConfig, executor: Arc<dyn Executor>) -> Self {
        Self {
            config,
            executor,
            metadata: None,
            listeners: Mutex::new(Vec::new()),
            serial: Mutex::new(()),
            cancellation: Cancellation::default(),
        }
    }

    /// Ask `parser` for status and info before spawning the executable
    pub fn with_metadata_parser(mut self, parser: Arc<dyn WorkingCopyParser>) -> Self {
        self.metadata = Some(parser);
        self
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Register a listener for paths touched by subsequent calls
    pub fn add_notification_listener(&self, listener: Arc<dyn NotificationListener>) {
        lock(&self.listeners).push(listener);
    }

    /// Start a call: wait for the previous one and forget its cancellation
    fn serialize(&self) -> MutexGuard<'_, ()> {
        let guard = lock(&self.serial);
        self.cancellation.reset();
        guard
    }

    fn context(&self) -> CommandContext<'_> {
        CommandContext {
            config_dir: self.config.config_dir.as_deref(),
            credentials: self.config.credentials.as_ref(),
            targets_threshold: self.config.targets_threshold,
            working_dir: self.config.working_dir.as_deref(),
        }
    }

    /// Absolute form of `path` without `.` components, as the executable echoes it
    fn absolute(&self, path: &Path) -> PathBuf {
        let path: PathBuf = path
            .components()
            .filter(|component| !matches!(component, Component::CurDir))
            .collect();
        if path.is_absolute() {
            return path;
        }
        let base = self
            .config
            .working_dir
            .clone()
            .or_else(|| std::env::current_dir().ok());
        match base {
            Some(base) if path.as_os_str().is_empty() => base,
            Some(base) => base.join(path),
            None => path,
        }
    }

    /// Run one command to completion; temp files are gone when this returns
    fn run<K: CommandKind>(&self, kind: K) -> Result<Command<K>, SvnError> {
        if self.cancellation.is_requested() {
            return Err(SvnError::Cancelled);
        }
        let listeners = lock(&self.listeners).clone();
        let mut command = Command::new(kind, listeners);
        command.prepare(&self.context())?;
        command.started(&self.config.executable)?;

        let argv = command.argv().to_vec();
        let working_dir = command.working_dir().map(Path::to_path_buf);
        let result = self
            .executor
            .execute(&argv, working_dir.as_deref(), &mut command);
        if let Ok(outcome) = &result {
            command.completed(outcome.exit_code);
        }
        command.finished();

        if result?.cancelled || self.cancellation.is_requested() {
            tracing::debug!(command = command.name(), "cancelled");
            return Err(SvnError::Cancelled);
        }
        command.check()?;
        Ok(command)
    }

    /// Metadata fast path; `None` means ask the executable
    fn query_metadata<T>(
        &self,
        path: &Path,
        query: impl FnOnce(&dyn WorkingCopyParser, &Path) -> Result<T, MetadataError>,
    ) -> Result<Option<T>, SvnError> {
        let Some(parser) = self.metadata.as_deref() else {
            return Ok(None);
        };
        match query(parser, path) {
            Ok(value) => Ok(Some(value)),
            Err(err) if err.is_unsupported_format() => {
                tracing::debug!(path = %path.display(), "falling back to svn: {err}");
                Ok(None)
            }
            Err(err) => Err(err.into()),
        }
    }

    fn cat(&self, target: &Target, revision: &Revision) -> Result<Vec<u8>, SvnError> {
        if let (Target::Path(path), Revision::Working) = (target, revision) {
            return Ok(std::fs::read(self.absolute(path))?);
        }
        let mut command = self.run(CatCommand { target, revision })?;
        Ok(command.take_bytes())
    }

    fn commit_with_retry(
        &self,
        paths: &[PathBuf],
        message: &str,
        keep_locks: bool,
    ) -> Result<Option<u64>, SvnError> {
        let retry = &self.config.commit_retry;
        let mut attempt = 1;
        loop {
            let result = self.run(CommitCommand {
                paths,
                message,
                keep_locks,
            });
            match result {
                Ok(command) => {
                    let revision = command.last_revision();
                    tracing::info!(?revision, attempt, paths = paths.len(), "commit finished");
                    return Ok(revision);
                }
                Err(err) if err.is_lock_contention() && attempt < retry.max_attempts => {
                    let delay = retry.delay(attempt);
                    tracing::warn!(
                        attempt,
                        ?delay,
                        "working copy locked, retrying commit: {err}"
                    );
                    if self.cancellation.wait(delay) {
                        tracing::debug!(attempt, "commit retry cancelled");
                        return Err(SvnError::Cancelled);
                    }
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }

    /// One record per requested path, in request order
    fn reconcile_status(
        &self,
        paths: &[PathBuf],
        options: &StatusOptions,
    ) -> Result<Vec<Status>, SvnError> {
        let resolved: Vec<PathBuf> = paths.iter().map(|path| self.absolute(path)).collect();
        let mut results: Vec<Option<Status>> = vec![None; paths.len()];
        let mut managed = Vec::new();

        for (index, path) in resolved.iter().enumerate() {
            if let Some(status) = self.query_metadata(path, |p, path| p.single_status(path))? {
                results[index] = Some(status);
            } else if utils::svn::has_metadata(path) {
                managed.push(index);
            } else {
                results[index] = Some(Status::unversioned(path));
            }
        }

        if !managed.is_empty() {
            let query: Vec<PathBuf> = managed.iter().map(|&i| resolved[i].clone()).collect();
            let command = self.run(StatusCommand {
                paths: &query,
                contact_server: options.contact_server,
                no_ignore: options.no_ignore,
            })?;
            let mut reported = parse_status(command.output());

            let info_targets: Vec<Target> = reported
                .iter()
                .filter(|status| status.is_managed())
                .map(|status| Target::Path(status.path.clone()))
                .collect();
            let infos = if info_targets.is_empty() {
                Vec::new()
            } else {
                let command = self.run(InfoCommand {
                    targets: &info_targets,
                    revision: None,
                    tolerate_missing: true,
                })?;
                parse_info(command.output())
            };

            for index in managed {
                let path = &resolved[index];
                let position = reported
                    .iter()
                    .position(|s| self.absolute(&s.path) == *path);
                let status = match position {
                    Some(position) => {
                        let status = reported.swap_remove(position);
                        let info = infos.iter().find(|info| {
                            info.path.as_deref().map(|p| self.absolute(p)).as_ref() == Some(path)
                        });
                        match info {
                            Some(info) => status.merge_info(info.clone()),
                            None => status,
                        }
                    }
                    None => Status::unversioned(path),
                };
                results[index] = Some(status);
            }
        }

        // records carry the path as the caller spelled it
        Ok(results
            .into_iter()
            .zip(paths)
            .map(|(status, path)| match status {
                Some(status) => Status {
                    path: path.clone(),
                    ..status
                },
                None => Status::unversioned(path),
            })
            .collect())
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn reject_working_copy_targets(
    targets: &[Target],
    operation: &'static str,
) -> Result<(), SvnError> {
    if targets.iter().any(|t| !t.is_url()) {
        return Err(SvnError::Unsupported(operation));
    }
    Ok(())
}

// ============================================================================
// SvnWorkingCopy Implementation
// ============================================================================

impl SvnWorkingCopy for CommandlineClient {
    fn status_with_options(
        &self,
        paths: &[PathBuf],
        options: &StatusOptions,
    ) -> Result<Vec<Status>, SvnError> {
        let _guard = self.serialize();
        self.reconcile_status(paths, options)
    }

    fn add(&self, paths: &[PathBuf], options: &AddOptions) -> Result<(), SvnError> {
        let _guard = self.serialize();
        self.run(AddCommand { paths, options })?;
        Ok(())
    }

    fn revert(&self, paths: &[PathBuf], recursive: bool) -> Result<(), SvnError> {
        let _guard = self.serialize();
        self.run(RevertCommand { paths, recursive })?;
        Ok(())
    }

    fn resolve(&self, path: &Path, choice: ConflictChoice) -> Result<(), SvnError> {
        let _guard = self.serialize();
        self.run(ResolveCommand { path, choice })?;
        Ok(())
    }

    fn cleanup(&self, path: &Path) -> Result<(), SvnError> {
        let _guard = self.serialize();
        self.run(CleanupCommand { path })?;
        Ok(())
    }

    fn upgrade(&self, path: &Path) -> Result<(), SvnError> {
        let _guard = self.serialize();
        self.run(UpgradeCommand { path })?;
        Ok(())
    }

    fn relocate(&self, from: &str, to: &str, path: &Path) -> Result<(), SvnError> {
        let _guard = self.serialize();
        self.run(RelocateCommand { from, to, path })?;
        Ok(())
    }
}

// ============================================================================
// SvnSync Implementation
// ============================================================================

impl SvnSync for CommandlineClient {
    fn checkout(
        &self,
        url: &Target,
        path: &Path,
        revision: &Revision,
        depth: Depth,
    ) -> Result<u64, SvnError> {
        let _guard = self.serialize();
        let command = self.run(CheckoutCommand {
            url,
            path,
            revision,
            depth,
        })?;
        command
            .last_revision()
            .ok_or_else(|| SvnError::Parse("checkout reported no revision".into()))
    }

    fn update(
        &self,
        paths: &[PathBuf],
        revision: &Revision,
        depth: Depth,
    ) -> Result<u64, SvnError> {
        let _guard = self.serialize();
        let command = self.run(UpdateCommand {
            paths,
            revision,
            depth,
        })?;
        command
            .last_revision()
            .ok_or_else(|| SvnError::Parse("update reported no revision".into()))
    }

    fn switch(
        &self,
        path: &Path,
        url: &Target,
        revision: &Revision,
        depth: Depth,
    ) -> Result<u64, SvnError> {
        let _guard = self.serialize();
        let command = self.run(SwitchCommand {
            path,
            url,
            revision,
            depth,
        })?;
        command
            .last_revision()
            .ok_or_else(|| SvnError::Parse("switch reported no revision".into()))
    }

    fn commit(
        &self,
        paths: &[PathBuf],
        message: &str,
        keep_locks: bool,
    ) -> Result<Option<u64>, SvnError> {
        let _guard = self.serialize();
        self.commit_with_retry(paths, message, keep_locks)
    }

    fn export(
        &self,
        source: &Target,
        destination: &Path,
        revision: &Revision,
        force: bool,
    ) -> Result<Option<u64>, SvnError> {
        let _guard = self.serialize();
        let command = self.run(ExportCommand {
            source,
            destination,
            revision,
            force,
        })?;
        Ok(command.last_revision())
    }

    fn import(&self, path: &Path, url: &str, message: &str) -> Result<Option<u64>, SvnError> {
        let _guard = self.serialize();
        let url = Target::url(url);
        let command = self.run(ImportCommand {
            path,
            url: &url,
            message,
        })?;
        Ok(command.last_revision())
    }
}

// ============================================================================
// SvnHistory Implementation
// ============================================================================

impl SvnHistory for CommandlineClient {
    fn info(&self, target: &Target) -> Result<Info, SvnError> {
        let _guard = self.serialize();
        if let Target::Path(path) = target {
            let cached = self.query_metadata(path, |p, path| p.info_from_working_copy(path))?;
            if let Some(info) = cached {
                return Ok(info);
            }
        }

        let command = self.run(InfoCommand {
            targets: std::slice::from_ref(target),
            revision: None,
            tolerate_missing: false,
        })?;
        parse_info(command.output())
            .into_iter()
            .next()
            .ok_or_else(|| SvnError::Parse(format!("no info reported for {target}")))
    }

    fn log(
        &self,
        target: &Target,
        range: &RevisionRange,
        limit: Option<usize>,
    ) -> Result<Vec<LogEntry>, SvnError> {
        let _guard = self.serialize();
        let command = self.run(LogCommand {
            target,
            range,
            limit,
        })?;
        parse_log(command.output())
    }

    fn content(&self, target: &Target, revision: &Revision) -> Result<Vec<u8>, SvnError> {
        let _guard = self.serialize();
        self.cat(target, revision)
    }

    fn annotate(
        &self,
        target: &Target,
        range: &RevisionRange,
    ) -> Result<Vec<AnnotateLine>, SvnError> {
        let _guard = self.serialize();
        let blame = self.run(BlameCommand { target, range })?;
        let revision = range.end.clone().unwrap_or(Revision::Head);
        let content = self.cat(target, &revision)?;
        correlate_annotations(blame.output(), &content)
    }

    fn list(
        &self,
        target: &Target,
        revision: &Revision,
        recursive: bool,
    ) -> Result<Vec<ListEntry>, SvnError> {
        let _guard = self.serialize();
        let command = self.run(ListCommand {
            target,
            revision,
            recursive,
        })?;
        Ok(parse_list(command.output()))
    }
}

// ============================================================================
// SvnProperties Implementation
// ============================================================================

impl SvnProperties for CommandlineClient {
    fn property_get(&self, target: &Target, name: &str) -> Result<Option<Vec<u8>>, SvnError> {
        let _guard = self.serialize();
        let mut command = self.run(PropGetCommand { target, name })?;
        if PropGetCommand::reported_missing(command.errors()) {
            return Ok(None);
        }
        let value = command.take_bytes();
        if value.is_empty() {
            // releases before 1.9 print nothing, without a warning, for unset properties
            let listed = self.run(PropListCommand { target })?;
            if !parse_proplist(listed.output()).iter().any(|p| p.name == name) {
                return Ok(None);
            }
        }
        Ok(Some(value))
    }

    fn property_list(&self, target: &Target) -> Result<Vec<Property>, SvnError> {
        let _guard = self.serialize();
        let command = self.run(PropListCommand { target })?;
        Ok(parse_proplist(command.output()))
    }

    fn property_set(
        &self,
        path: &Path,
        name: &str,
        value: &[u8],
        recursive: bool,
    ) -> Result<(), SvnError> {
        let _guard = self.serialize();
        self.run(PropSetCommand {
            path,
            name,
            value,
            recursive,
        })?;
        Ok(())
    }

    fn property_delete(&self, path: &Path, name: &str, recursive: bool) -> Result<(), SvnError> {
        let _guard = self.serialize();
        self.run(PropDelCommand {
            path,
            name,
            recursive,
        })?;
        Ok(())
    }
}

// ============================================================================
// SvnTree Implementation
// ============================================================================

impl SvnTree for CommandlineClient {
    fn copy(
        &self,
        source: &Target,
        destination: &Target,
        revision: Option<&Revision>,
        message: Option<&str>,
    ) -> Result<(), SvnError> {
        let _guard = self.serialize();
        self.run(CopyCommand {
            source,
            destination,
            revision,
            message,
        })?;
        Ok(())
    }

    fn move_to(
        &self,
        source: &Target,
        destination: &Target,
        message: Option<&str>,
        force: bool,
    ) -> Result<(), SvnError> {
        let _guard = self.serialize();
        self.run(MoveCommand {
            source,
            destination,
            message,
            force,
        })?;
        Ok(())
    }

    fn remove(
        &self,
        targets: &[Target],
        message: Option<&str>,
        options: &RemoveOptions,
    ) -> Result<(), SvnError> {
        let _guard = self.serialize();
        self.run(RemoveCommand {
            targets,
            message,
            options,
        })?;
        Ok(())
    }

    fn mkdir(
        &self,
        targets: &[Target],
        message: Option<&str>,
        parents: bool,
    ) -> Result<(), SvnError> {
        let _guard = self.serialize();
        self.run(MkdirCommand {
            targets,
            message,
            parents,
        })?;
        Ok(())
    }

    fn merge(
        &self,
        source: &Target,
        range: &RevisionRange,
        path: &Path,
        options: &MergeOptions,
    ) -> Result<(), SvnError> {
        let _guard = self.serialize();
        self.run(MergeCommand {
            source,
            range,
            path,
            options,
        })?;
        Ok(())
    }

    fn merge_reintegrate(
        &self,
        _source: &Target,
        _path: &Path,
        _dry_run: bool,
    ) -> Result<(), SvnError> {
        Err(SvnError::Unsupported("merge_reintegrate"))
    }

    fn diff_summarize(
        &self,
        _from: &Target,
        _to: &Target,
        _recursive: bool,
    ) -> Result<Vec<DiffSummary>, SvnError> {
        Err(SvnError::Unsupported("diff_summarize"))
    }

    fn lock(&self, targets: &[Target], comment: &str, force: bool) -> Result<(), SvnError> {
        reject_working_copy_targets(targets, "lock on working-copy paths")?;
        let _guard = self.serialize();
        self.run(LockCommand {
            targets,
            comment,
            force,
        })?;
        Ok(())
    }

    fn unlock(&self, targets: &[Target], force: bool) -> Result<(), SvnError> {
        reject_working_copy_targets(targets, "unlock on working-copy paths")?;
        let _guard = self.serialize();
        self.run(UnlockCommand { targets, force })?;
        Ok(())
    }
}

// ============================================================================
// SvnClient Implementation
// ============================================================================

impl SvnClient for CommandlineClient {
    fn client_type(&self) -> ClientType {
        ClientType::Commandline
    }

    fn version(&self) -> Result<Version, SvnError> {
        let _guard = self.serialize();
        let command = self.run(VersionCommand)?;
        parse_version(command.output())
    }

    fn cancel(&self) {
        tracing::debug!("cancel requested");
        self.cancellation.request();
        self.executor.cancel();
    }

    fn description(&self) -> String {
        format!("svn command-line client ({})", self.config.executable.display())
    }
}

#[cfg(test)]
mod tests {
    use super::testing::{Reply, ScriptedExecutor};
    use super::*;
    use crate::factory::CommitRetry;
    use crate::metadata::MetadataError;
    use std::fs;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Instant;
    use tempfile::TempDir;

    fn config() -> ClientConfig {
        ClientConfig {
            commit_retry: CommitRetry {
                max_attempts: 3,
                backoff_unit_ms: 1,
            },
            ..Default::default()
        }
    }

    fn client(executor: &Arc<ScriptedExecutor>) -> CommandlineClient {
        CommandlineClient::with_executor(config(), executor.clone())
    }

    fn status_line(flags: &str, path: &Path) -> String {
        format!("{flags:<9}{:>8} {:>8} {:<12} {}", 5, 3, "alice", path.display())
    }

    /// A working copy root plus a directory outside of it
    fn layout() -> (TempDir, PathBuf, PathBuf) {
        let temp = TempDir::new().unwrap();
        let wc = temp.path().join("wc");
        fs::create_dir_all(wc.join(".svn")).unwrap();
        let outside = temp.path().join("outside");
        fs::create_dir_all(&outside).unwrap();
        (temp, wc, outside)
    }

    #[test]
    fn test_status_preserves_order_and_synthesizes_unversioned() {
        let (_temp, wc, outside) = layout();
        let modified = wc.join("a.txt");
        let untracked = wc.join("b.txt");
        let foreign = outside.join("c.txt");

        let executor = ScriptedExecutor::new({
            let modified = modified.clone();
            let untracked = untracked.clone();
            move |argv| match argv[0].as_str() {
                "status" => Reply::ok(&[
                    &status_line("M", &modified),
                    &format!("?{}{}", " ".repeat(39), untracked.display()),
                ]),
                "info" => Reply::ok(&[
                    &format!("Path: {}", modified.display()),
                    "URL: file:///repo/trunk/a.txt",
                    "Repository Root: file:///repo",
                    "Revision: 5",
                    "Node Kind: file",
                    "Schedule: normal",
                    "",
                ]),
                other => panic!("unexpected command {other}"),
            }
        });

        let request = vec![foreign.clone(), modified.clone(), untracked.clone()];
        let statuses = client(&executor).status(&request).unwrap();

        assert_eq!(statuses.len(), 3);
        assert_eq!(statuses[0].path, foreign);
        assert_eq!(statuses[0].text_status, StatusKind::Unversioned);
        assert_eq!(statuses[1].path, modified);
        assert_eq!(statuses[1].text_status, StatusKind::Modified);
        assert_eq!(statuses[1].url.as_deref(), Some("file:///repo/trunk/a.txt"));
        assert_eq!(statuses[1].node_kind, NodeKind::File);
        assert_eq!(statuses[2].path, untracked);
        assert_eq!(statuses[2].text_status, StatusKind::Unversioned);

        let calls = executor.calls();
        assert_eq!(executor.subcommands(), vec!["status", "info"]);
        let foreign_arg = foreign.display().to_string();
        assert!(!calls[0].contains(&foreign_arg));
        assert!(calls[1].contains(&modified.display().to_string()));
        assert!(!calls[1].contains(&untracked.display().to_string()));
    }

    #[test]
    fn test_status_matches_relative_request_paths() {
        let (temp, wc, _outside) = layout();
        let file = wc.join("a.txt");
        let executor = ScriptedExecutor::new({
            let file = file.clone();
            move |argv| match argv[0].as_str() {
                "status" => Reply::ok(&[&status_line("M", &file)]),
                "info" => Reply::ok(&[
                    &format!("Path: {}", file.display()),
                    "Node Kind: file",
                    "Schedule: normal",
                    "",
                ]),
                other => panic!("unexpected command {other}"),
            }
        });
        let config = ClientConfig {
            working_dir: Some(temp.path().to_path_buf()),
            ..config()
        };
        let client = CommandlineClient::with_executor(config, executor.clone());

        let request = PathBuf::from("./wc/a.txt");
        let statuses = client.status(&[request.clone()]).unwrap();
        assert_eq!(statuses[0].path, request);
        assert_eq!(statuses[0].text_status, StatusKind::Modified);
        assert_eq!(statuses[0].node_kind, NodeKind::File);

        let calls = executor.calls();
        assert!(calls[0].contains(&file.display().to_string()));
        assert!(calls[1].contains(&file.display().to_string()));
    }

    #[test]
    fn test_status_outside_working_copy_never_spawns() {
        let (_temp, _wc, outside) = layout();
        let executor = ScriptedExecutor::new(|_| panic!("no command expected"));
        let statuses = client(&executor)
            .status(&[outside.join("x"), outside.join("y")])
            .unwrap();
        assert!(statuses.iter().all(|s| s.text_status == StatusKind::Unversioned));
        assert!(executor.calls().is_empty());
    }

    #[test]
    fn test_status_unreported_managed_path_is_unversioned() {
        let (_temp, wc, _outside) = layout();
        let executor = ScriptedExecutor::new(|_| Reply::ok(&[]));
        let statuses = client(&executor).status(&[wc.join("ghost.txt")]).unwrap();
        assert_eq!(statuses[0].text_status, StatusKind::Unversioned);
        assert_eq!(executor.subcommands(), vec!["status"]);
    }

    struct FixedParser;

    impl WorkingCopyParser for FixedParser {
        fn single_status(&self, path: &Path) -> Result<Status, MetadataError> {
            match path.file_name().and_then(|n| n.to_str()) {
                Some("fast.txt") => Ok(Status::from_info(path, Info::default())),
                Some("broken.txt") => Err(MetadataError::Corrupt("bad entries".into())),
                _ => Err(MetadataError::UnsupportedFormat("format 12".into())),
            }
        }

        fn info_from_working_copy(&self, _path: &Path) -> Result<Info, MetadataError> {
            Err(MetadataError::UnsupportedFormat("format 12".into()))
        }
    }

    #[test]
    fn test_metadata_parser_fast_path_and_fallback() {
        let (_temp, wc, _outside) = layout();
        let fast = wc.join("fast.txt");
        let slow = wc.join("slow.txt");
        let executor = ScriptedExecutor::new({
            let slow = slow.clone();
            move |argv| match argv[0].as_str() {
                "status" => Reply::ok(&[&status_line("A", &slow)]),
                _ => Reply::ok(&[]),
            }
        });
        let client = client(&executor).with_metadata_parser(Arc::new(FixedParser));

        let statuses = client.status(&[fast.clone(), slow.clone()]).unwrap();
        assert_eq!(statuses[0].text_status, StatusKind::Normal);
        assert_eq!(statuses[1].text_status, StatusKind::Added);

        let status_call = &executor.calls()[0];
        assert!(!status_call.contains(&fast.display().to_string()));
        assert!(status_call.contains(&slow.display().to_string()));
    }

    #[test]
    fn test_metadata_parser_errors_propagate() {
        let (_temp, wc, _outside) = layout();
        let executor = ScriptedExecutor::new(|_| Reply::ok(&[]));
        let client = client(&executor).with_metadata_parser(Arc::new(FixedParser));
        let err = client.status(&[wc.join("broken.txt")]).unwrap_err();
        assert!(matches!(err, SvnError::Metadata(MetadataError::Corrupt(_))));
        assert!(executor.calls().is_empty());
    }

    fn locked() -> Reply {
        Reply::failure(&["svn: E155004: Working copy '/wc' locked."])
    }

    #[test]
    fn test_commit_retries_lock_contention() {
        let executor = ScriptedExecutor::sequence(vec![
            locked(),
            locked(),
            Reply::ok(&["Sending        a.txt", "Committed revision 7."]),
        ]);
        let revision = client(&executor)
            .commit(&[PathBuf::from("a.txt")], "msg", false)
            .unwrap();
        assert_eq!(revision, Some(7));
        assert_eq!(executor.calls().len(), 3);
    }

    #[test]
    fn test_commit_gives_up_at_ceiling() {
        let executor = ScriptedExecutor::new(|_| locked());
        let err = client(&executor)
            .commit(&[PathBuf::from("a.txt")], "msg", false)
            .unwrap_err();
        assert!(err.is_lock_contention());
        assert_eq!(executor.calls().len(), 3);
    }

    #[test]
    fn test_commit_other_failures_are_not_retried() {
        let executor = ScriptedExecutor::new(|_| {
            Reply::failure(&["svn: E155011: File '/wc/a.txt' is out of date"])
        });
        let err = client(&executor)
            .commit(&[PathBuf::from("a.txt")], "msg", false)
            .unwrap_err();
        assert!(!err.is_lock_contention());
        assert_eq!(executor.calls().len(), 1);
    }

    #[test]
    fn test_commit_without_changes_has_no_revision() {
        let executor = ScriptedExecutor::new(|_| Reply::ok(&[]));
        let revision = client(&executor)
            .commit(&[PathBuf::from("a.txt")], "msg", true)
            .unwrap();
        assert_eq!(revision, None);
        assert!(executor.calls()[0].contains(&"--no-unlock".to_string()));
    }

    #[test]
    fn test_commit_message_file_is_removed_afterwards() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let executor = ScriptedExecutor::new({
            let seen = seen.clone();
            move |argv| {
                let position = argv.iter().position(|a| a == "-F").unwrap();
                let file = PathBuf::from(&argv[position + 1]);
                let message = fs::read_to_string(&file).unwrap();
                seen.lock().unwrap().push((file, message));
                Reply::ok(&["Committed revision 3."])
            }
        });
        let message = "subject\n\nbody with `backticks` and $(subshell)";
        client(&executor)
            .commit(&[PathBuf::from("a.txt")], message, false)
            .unwrap();

        let seen = seen.lock().unwrap();
        assert_eq!(seen[0].1, message);
        assert!(!seen[0].0.exists());
    }

    #[test]
    fn test_unsupported_operations() {
        let executor = ScriptedExecutor::new(|_| panic!("no command expected"));
        let client = client(&executor);
        let url = Target::url("file:///repo/branches/b");

        let err = client
            .merge_reintegrate(&url, Path::new("wc"), false)
            .unwrap_err();
        assert!(err.is_unsupported());
        assert!(client.diff_summarize(&url, &url, true).unwrap_err().is_unsupported());
        assert!(
            client
                .lock(&[Target::path("wc/a.txt")], "mine", false)
                .unwrap_err()
                .is_unsupported()
        );
        assert!(
            client
                .unlock(&[url.clone(), Target::path("wc/a.txt")], false)
                .unwrap_err()
                .is_unsupported()
        );
        assert!(executor.calls().is_empty());
    }

    #[test]
    fn test_lock_urls() {
        let executor = ScriptedExecutor::new(|_| {
            Reply::ok(&["'a.txt' locked by user 'alice'."])
        });
        client(&executor)
            .lock(&[Target::url("file:///repo/trunk/a.txt")], "editing", true)
            .unwrap();
        let call = &executor.calls()[0];
        assert_eq!(call[0], "lock");
        assert_eq!(call[1], "--force");
    }

    #[test]
    fn test_cancelled_call() {
        let executor = ScriptedExecutor::new(|_| Reply::cancelled());
        let err = client(&executor)
            .update(&[PathBuf::from("wc")], &Revision::Head, Depth::Infinity)
            .unwrap_err();
        assert!(err.is_cancelled());
    }

    #[test]
    fn test_cancel_reaches_executor() {
        let executor = ScriptedExecutor::new(|_| Reply::ok(&[]));
        let client = client(&executor);
        client.cancel();
        assert_eq!(executor.cancel_count(), 1);

        // an idle cancel does not leak into the next call
        client.cleanup(Path::new("wc")).unwrap();
        assert_eq!(executor.subcommands(), vec!["cleanup"]);
    }

    fn wait_for_first_call(executor: &ScriptedExecutor) {
        while executor.calls().is_empty() {
            std::thread::sleep(Duration::from_millis(5));
        }
    }

    #[test]
    fn test_cancel_during_commit_backoff() {
        let executor = ScriptedExecutor::new(|_| locked());
        let config = ClientConfig {
            commit_retry: CommitRetry {
                max_attempts: 5,
                backoff_unit_ms: 10_000,
            },
            ..config()
        };
        let client = CommandlineClient::with_executor(config, executor.clone());

        let started = Instant::now();
        let result = std::thread::scope(|scope| {
            scope.spawn(|| {
                wait_for_first_call(&executor);
                client.cancel();
            });
            client.commit(&[PathBuf::from("a.txt")], "msg", false)
        });

        assert!(result.unwrap_err().is_cancelled());
        assert_eq!(executor.calls().len(), 1);
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn test_cancel_stops_remaining_commands() {
        let (_temp, wc, _outside) = layout();
        let file = wc.join("a.txt");
        let released = Arc::new(AtomicBool::new(false));
        let executor = ScriptedExecutor::new({
            let released = released.clone();
            let file = file.clone();
            move |_| {
                while !released.load(Ordering::SeqCst) {
                    std::thread::sleep(Duration::from_millis(5));
                }
                Reply::ok(&[&status_line("M", &file)])
            }
        });
        let client = client(&executor);

        let result = std::thread::scope(|scope| {
            scope.spawn(|| {
                wait_for_first_call(&executor);
                client.cancel();
                released.store(true, Ordering::SeqCst);
            });
            client.status(&[file.clone()])
        });

        assert!(result.unwrap_err().is_cancelled());
        assert_eq!(executor.subcommands(), vec!["status"]);
    }

    #[test]
    fn test_default_config_passes_config_dir() {
        let Ok(expected) = utils::svn::default_config_dir() else {
            return;
        };
        let executor = ScriptedExecutor::new(|_| Reply::ok(&[]));
        CommandlineClient::with_executor(ClientConfig::default(), executor.clone())
            .cleanup(Path::new("wc"))
            .unwrap();

        let call = &executor.calls()[0];
        let position = call.iter().position(|a| a == "--config-dir").unwrap();
        assert_eq!(call[position + 1], expected.display().to_string());
        assert_eq!(call.last().map(String::as_str), Some("--non-interactive"));
    }

    #[test]
    fn test_cleanup_twice() {
        let executor = ScriptedExecutor::new(|_| Reply::ok(&[]));
        let client = client(&executor);
        client.cleanup(Path::new("wc")).unwrap();
        client.cleanup(Path::new("wc")).unwrap();
        assert_eq!(executor.subcommands(), vec!["cleanup", "cleanup"]);
    }

    #[derive(Default)]
    struct Recorder(Mutex<Vec<(PathBuf, Option<u64>)>>);

    impl NotificationListener for Recorder {
        fn state_changed(&self, path: &Path, revision: Option<u64>) {
            self.0.lock().unwrap().push((path.to_path_buf(), revision));
        }
    }

    #[test]
    fn test_update_reports_revision_and_notifies() {
        let executor = ScriptedExecutor::new(|_| {
            Reply::ok(&["Updating '.':", "U    a.txt", "Updated to revision 9."])
        });
        let recorder = Arc::new(Recorder::default());
        let client = client(&executor);
        client.add_notification_listener(recorder.clone());

        let revision = client
            .update(&[PathBuf::from(".")], &Revision::Head, Depth::Infinity)
            .unwrap();
        assert_eq!(revision, 9);
        assert_eq!(
            *recorder.0.lock().unwrap(),
            vec![(PathBuf::from("."), None), (PathBuf::from("a.txt"), None)]
        );
    }

    #[test]
    fn test_annotate_correlates_blame_and_content() {
        let executor = ScriptedExecutor::new(|argv| match argv[0].as_str() {
            "blame" => Reply::ok(&[
                "     1      alice 2024-01-02 10:11:12 +0000 (Tue, 02 Jan 2024) first",
                "     2        bob 2024-01-03 10:11:12 +0000 (Wed, 03 Jan 2024) second",
            ]),
            "cat" => Reply::bytes(b"first\nsecond\n"),
            other => panic!("unexpected command {other}"),
        });
        let lines = client(&executor)
            .annotate(&Target::url("file:///repo/a.txt"), &RevisionRange::new(1u64, 2u64))
            .unwrap();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1].author.as_deref(), Some("bob"));
        assert_eq!(lines[1].content, "second");

        let cat_call = &executor.calls()[1];
        assert_eq!(&cat_call[..3], ["cat", "-r", "2"]);
    }

    #[test]
    fn test_working_content_is_read_from_disk() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("local.txt");
        fs::write(&file, b"local edits").unwrap();
        let executor = ScriptedExecutor::new(|_| panic!("no command expected"));
        let content = client(&executor)
            .content(&Target::Path(file), &Revision::Working)
            .unwrap();
        assert_eq!(content, b"local edits");
    }

    #[test]
    fn test_property_get() {
        let executor = ScriptedExecutor::new(|argv| match argv[2].as_str() {
            "svn:eol-style" => Reply::bytes(b"native"),
            _ => Reply {
                stderr: vec!["svn: warning: W200017: Property 'x' not found on 'a.txt'".into()],
                exit_code: 1,
                ..Default::default()
            },
        });
        let client = client(&executor);
        let target = Target::path("a.txt");
        assert_eq!(
            client.property_get(&target, "svn:eol-style").unwrap(),
            Some(b"native".to_vec())
        );
        assert_eq!(client.property_get(&target, "x").unwrap(), None);
    }

    #[test]
    fn test_property_get_empty_output_checks_proplist() {
        let executor = ScriptedExecutor::new(|argv| match argv[0].as_str() {
            "propget" => Reply::bytes(b""),
            "proplist" => Reply::ok(&["Properties on 'a.txt':", "  custom:flag", "    "]),
            other => panic!("unexpected command {other}"),
        });
        let client = client(&executor);
        let target = Target::path("a.txt");

        assert_eq!(
            client.property_get(&target, "custom:flag").unwrap(),
            Some(Vec::new())
        );
        assert_eq!(client.property_get(&target, "custom:other").unwrap(), None);
        assert_eq!(
            executor.subcommands(),
            vec!["propget", "proplist", "propget", "proplist"]
        );
    }

    #[test]
    fn test_info_failure_is_an_error() {
        let executor = ScriptedExecutor::new(|_| {
            Reply::failure(&["svn: E155007: '/tmp/nowhere' is not a working copy"])
        });
        let err = client(&executor)
            .info(&Target::path("/tmp/nowhere"))
            .unwrap_err();
        assert!(matches!(err, SvnError::CommandFailed { .. }));
    }

    #[test]
    fn test_version() {
        let executor = ScriptedExecutor::new(|_| Reply::ok(&["1.14.3"]));
        let version = client(&executor).version().unwrap();
        assert_eq!(version, Version::new(1, 14, 3));
        assert_eq!(executor.calls()[0][..2], ["--version", "--quiet"]);
    }
}
