//! Subprocess lifecycle for the executable.
//!
//! stdout and stderr are drained concurrently by two reader threads so a
//! chatty stderr can never stall a process whose stdout is still being
//! consumed. Every callback is delivered on the calling thread, and stdout
//! callbacks arrive in the order the process produced them.

use std::ffi::OsString;
use std::io::{self, BufRead, BufReader, Read};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStderr, ChildStdout, Command, ExitStatus, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::Duration;

use crate::error::SvnError;

/// How often a blocked session re-checks for cancellation.
const POLL_INTERVAL: Duration = Duration::from_millis(25);

const BINARY_CHUNK: usize = 8 * 1024;

/// Whether a command consumes stdout as text lines or raw bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputKind {
    Lines,
    Bytes,
}

/// Receiver of a running process's output
pub trait OutputSink {
    fn output_kind(&self) -> OutputKind;

    fn output_line(&mut self, line: &str);

    fn output_bytes(&mut self, bytes: &[u8]);

    fn error_line(&mut self, line: &str);
}

/// How an execution ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecOutcome {
    /// Absent when the process was cancelled or killed by a signal
    pub exit_code: Option<i32>,
    pub cancelled: bool,
}

impl ExecOutcome {
    fn cancelled() -> Self {
        Self {
            exit_code: None,
            cancelled: true,
        }
    }
}

/// Runs one argument vector at a time against the executable
pub trait Executor: Send + Sync {
    /// Run `argv`, streaming output into `sink`; blocks until exit or cancellation
    fn execute(
        &self,
        argv: &[OsString],
        working_dir: Option<&Path>,
        sink: &mut dyn OutputSink,
    ) -> Result<ExecOutcome, SvnError>;

    /// Forcibly terminate the running process, if any
    fn cancel(&self);
}

enum StreamEvent {
    Line(String),
    Bytes(Vec<u8>),
    ErrorLine(String),
    ReadFailed(io::Error),
}

/// Real [`Executor`] spawning the executable as a child process
pub struct ProcessSession {
    executable: PathBuf,
    env: Vec<(String, String)>,
    serial: Mutex<()>,
    running: Mutex<Option<Child>>,
    cancel_requested: AtomicBool,
}

impl ProcessSession {
    /// `env` holds variables to set or override; everything else is inherited
    pub fn new(executable: impl Into<PathBuf>, env: Vec<(String, String)>) -> Self {
        Self {
            executable: executable.into(),
            env,
            serial: Mutex::new(()),
            running: Mutex::new(None),
            cancel_requested: AtomicBool::new(false),
        }
    }

    fn is_cancel_requested(&self) -> bool {
        self.cancel_requested.load(Ordering::SeqCst)
    }

    fn spawn(&self, argv: &[OsString], working_dir: Option<&Path>) -> Result<Child, SvnError> {
        let mut cmd = Command::new(&self.executable);
        cmd.args(argv);
        if let Some(dir) = working_dir {
            cmd.current_dir(dir);
        }
        for (key, value) in &self.env {
            cmd.env(key, value);
        }
        cmd.stdin(Stdio::null());
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());

        cmd.spawn().map_err(|err| match err.kind() {
            io::ErrorKind::NotFound => {
                SvnError::NotAvailable(self.executable.display().to_string())
            }
            _ => SvnError::Launch(err),
        })
    }

    /// Wait for the registered child to exit, killing it if cancellation arrives
    fn reap(&self) -> io::Result<Option<ExitStatus>> {
        loop {
            {
                let mut running = lock(&self.running);
                let Some(child) = running.as_mut() else {
                    return Ok(None);
                };
                if self.is_cancel_requested() {
                    // already dead if cancel() got to it first
                    let _ = child.kill();
                    child.wait()?;
                    running.take();
                    return Ok(None);
                }
                if let Some(status) = child.try_wait()? {
                    running.take();
                    return Ok(Some(status));
                }
            }
            thread::sleep(POLL_INTERVAL);
        }
    }
}

impl Executor for ProcessSession {
    fn execute(
        &self,
        argv: &[OsString],
        working_dir: Option<&Path>,
        sink: &mut dyn OutputSink,
    ) -> Result<ExecOutcome, SvnError> {
        let _serial = lock(&self.serial);
        self.cancel_requested.store(false, Ordering::SeqCst);

        let mut child = self.spawn(argv, working_dir)?;
        tracing::trace!(pid = child.id(), "spawned {}", self.executable.display());

        let (tx, rx) = mpsc::channel();
        let mut readers = Vec::with_capacity(2);
        if let Some(stdout) = child.stdout.take() {
            let tx = tx.clone();
            readers.push(match sink.output_kind() {
                OutputKind::Lines => thread::spawn(move || read_stdout_lines(stdout, tx)),
                OutputKind::Bytes => thread::spawn(move || read_stdout_bytes(stdout, tx)),
            });
        }
        if let Some(stderr) = child.stderr.take() {
            let tx = tx.clone();
            readers.push(thread::spawn(move || read_stderr_lines(stderr, tx)));
        }
        drop(tx);

        *lock(&self.running) = Some(child);
        if self.is_cancel_requested() {
            self.cancel();
        }

        let mut read_error = None;
        loop {
            if self.is_cancel_requested() {
                break;
            }
            match rx.recv_timeout(POLL_INTERVAL) {
                Ok(StreamEvent::Line(line)) => sink.output_line(&line),
                Ok(StreamEvent::Bytes(bytes)) => sink.output_bytes(&bytes),
                Ok(StreamEvent::ErrorLine(line)) => sink.error_line(&line),
                Ok(StreamEvent::ReadFailed(err)) => {
                    read_error.get_or_insert(err);
                }
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }

        let status = self.reap();

        if self.is_cancel_requested() {
            // Readers may still hold pipes shared with grandchildren; leave them detached.
            tracing::debug!("{} cancelled", self.executable.display());
            return Ok(ExecOutcome::cancelled());
        }

        for reader in readers {
            if reader.join().is_err() {
                tracing::warn!("output reader thread panicked");
            }
        }

        let status = status?;
        if let Some(err) = read_error {
            return Err(SvnError::Io(err));
        }

        let exit_code = status.and_then(|s| s.code());
        tracing::trace!(?exit_code, "{} exited", self.executable.display());
        Ok(ExecOutcome {
            exit_code,
            cancelled: false,
        })
    }

    fn cancel(&self) {
        self.cancel_requested.store(true, Ordering::SeqCst);
        if let Some(child) = lock(&self.running).as_mut() {
            if let Err(err) = child.kill() {
                tracing::debug!("kill after cancel failed: {err}");
            }
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn read_lines<R: Read>(stream: R, tx: Sender<StreamEvent>, wrap: fn(String) -> StreamEvent) {
    let mut reader = BufReader::new(stream);
    let mut buf = Vec::new();
    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf) {
            Ok(0) => break,
            Ok(_) => {
                while matches!(buf.last(), Some(b'\n' | b'\r')) {
                    buf.pop();
                }
                let line = String::from_utf8_lossy(&buf).into_owned();
                if tx.send(wrap(line)).is_err() {
                    break;
                }
            }
            Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
            Err(err) => {
                let _ = tx.send(StreamEvent::ReadFailed(err));
                break;
            }
        }
    }
}

fn read_stdout_lines(stdout: ChildStdout, tx: Sender<StreamEvent>) {
    read_lines(stdout, tx, StreamEvent::Line);
}

fn read_stderr_lines(stderr: ChildStderr, tx: Sender<StreamEvent>) {
    read_lines(stderr, tx, StreamEvent::ErrorLine);
}

fn read_stdout_bytes(mut stdout: ChildStdout, tx: Sender<StreamEvent>) {
    let mut buf = vec![0u8; BINARY_CHUNK];
    loop {
        match stdout.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => {
                if tx.send(StreamEvent::Bytes(buf[..n].to_vec())).is_err() {
                    break;
                }
            }
            Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
            Err(err) => {
                let _ = tx.send(StreamEvent::ReadFailed(err));
                break;
            }
        }
    }
}
