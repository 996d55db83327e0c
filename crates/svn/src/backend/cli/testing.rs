//! Scripted executor for client tests.

use std::collections::VecDeque;
use std::ffi::OsString;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use super::process::{ExecOutcome, Executor, OutputKind, OutputSink};
use crate::error::SvnError;

/// What a scripted process prints and how it exits
#[derive(Debug, Clone, Default)]
pub(crate) struct Reply {
    pub stdout: Vec<String>,
    pub stderr: Vec<String>,
    pub bytes: Vec<u8>,
    pub exit_code: i32,
    pub cancelled: bool,
}

impl Reply {
    pub fn ok(lines: &[&str]) -> Self {
        Self {
            stdout: lines.iter().map(|l| l.to_string()).collect(),
            ..Default::default()
        }
    }

    pub fn bytes(bytes: &[u8]) -> Self {
        Self {
            bytes: bytes.to_vec(),
            ..Default::default()
        }
    }

    pub fn failure(stderr: &[&str]) -> Self {
        Self {
            stderr: stderr.iter().map(|l| l.to_string()).collect(),
            exit_code: 1,
            ..Default::default()
        }
    }

    pub fn cancelled() -> Self {
        Self {
            cancelled: true,
            ..Default::default()
        }
    }
}

type Handler = Box<dyn Fn(&[String]) -> Reply + Send + Sync>;

/// Answers each argument vector with a [`Reply`] and records the call
pub(crate) struct ScriptedExecutor {
    handler: Handler,
    calls: Mutex<Vec<Vec<String>>>,
    cancels: AtomicUsize,
}

impl ScriptedExecutor {
    pub fn new(handler: impl Fn(&[String]) -> Reply + Send + Sync + 'static) -> Arc<Self> {
        Arc::new(Self {
            handler: Box::new(handler),
            calls: Mutex::new(Vec::new()),
            cancels: AtomicUsize::new(0),
        })
    }

    /// Replies in order; an exhausted script answers with empty success
    pub fn sequence(replies: Vec<Reply>) -> Arc<Self> {
        let replies = Mutex::new(VecDeque::from(replies));
        Self::new(move |_| replies.lock().unwrap().pop_front().unwrap_or_default())
    }

    pub fn calls(&self) -> Vec<Vec<String>> {
        self.calls.lock().unwrap().clone()
    }

    pub fn subcommands(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| call.into_iter().next())
            .collect()
    }

    pub fn cancel_count(&self) -> usize {
        self.cancels.load(Ordering::SeqCst)
    }
}

impl Executor for ScriptedExecutor {
    fn execute(
        &self,
        argv: &[OsString],
        _working_dir: Option<&Path>,
        sink: &mut dyn OutputSink,
    ) -> Result<ExecOutcome, SvnError> {
        let argv: Vec<String> = argv
            .iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();
        self.calls.lock().unwrap().push(argv.clone());

        let reply = (self.handler)(&argv);
        if reply.cancelled {
            return Ok(ExecOutcome {
                exit_code: None,
                cancelled: true,
            });
        }

        match sink.output_kind() {
            OutputKind::Lines => {
                for line in &reply.stdout {
                    sink.output_line(line);
                }
            }
            OutputKind::Bytes => sink.output_bytes(&reply.bytes),
        }
        for line in &reply.stderr {
            sink.error_line(line);
        }

        Ok(ExecOutcome {
            exit_code: Some(reply.exit_code),
            cancelled: false,
        })
    }

    fn cancel(&self) {
        self.cancels.fetch_add(1, Ordering::SeqCst);
    }
}
