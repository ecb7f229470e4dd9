//! Invoking the external upload tool
//!
//! The editor never talks to the board itself. A run spawns the upload tool
//! (by default `ampy -p <port> run <script>`) through `tokio::process`,
//! captures both output streams and bounds the wait with
//! `tokio::time::timeout`. When the deadline passes the child is killed,
//! reaped, and whatever output it had produced is still returned.
//!
//! [`UploadTool::run`] is blocking: it drives a current-thread runtime that
//! lives only for the duration of one run.

use crate::error::{EditorError, Result};
use std::path::Path;
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{info, warn};

/// How long to keep collecting output once the child is gone
const DRAIN_GRACE: Duration = Duration::from_millis(500);
const READ_CHUNK: usize = 4096;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stream {
    Stdout,
    Stderr,
}

type Chunk = (Stream, Vec<u8>);

/// How a run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    Completed { code: Option<i32>, success: bool },
    /// Deadline passed, the process was killed
    TimedOut,
}

#[derive(Debug, Clone)]
pub struct RunReport {
    pub outcome: RunOutcome,
    pub stdout: String,
    pub stderr: String,
    pub elapsed: Duration,
}

impl RunReport {
    pub fn timed_out(&self) -> bool {
        self.outcome == RunOutcome::TimedOut
    }

    pub fn succeeded(&self) -> bool {
        matches!(self.outcome, RunOutcome::Completed { success: true, .. })
    }
}

#[derive(Debug, Clone)]
pub struct UploadTool {
    program: String,
    args: Vec<String>,
    timeout: Duration,
}

impl UploadTool {
    pub fn new(program: impl Into<String>, args: Vec<String>, timeout: Duration) -> Self {
        UploadTool {
            program: program.into(),
            args,
            timeout,
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Argument list with `{port}` and `{script}` filled in
    pub fn command_args(&self, port: &str, script: &Path) -> Vec<String> {
        let script = script.to_string_lossy();
        self.args
            .iter()
            .map(|arg| arg.replace("{port}", port).replace("{script}", &script))
            .collect()
    }

    /// Run the tool against `script` on `port`, blocking until it exits or
    /// the deadline passes
    pub fn run(&self, port: &str, script: &Path) -> Result<RunReport> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        runtime.block_on(self.run_async(port, script))
    }

    async fn run_async(&self, port: &str, script: &Path) -> Result<RunReport> {
        let args = self.command_args(port, script);
        info!(program = %self.program, ?args, "starting upload tool");

        let start = Instant::now();
        let mut child = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| EditorError::ToolSpawn {
                program: self.program.clone(),
                source,
            })?;

        // Take the pipes first so the output survives a kill
        let (tx, mut rx) = mpsc::unbounded_channel();
        if let Some(out) = child.stdout.take() {
            spawn_reader(Stream::Stdout, out, tx.clone());
        }
        if let Some(err) = child.stderr.take() {
            spawn_reader(Stream::Stderr, err, tx.clone());
        }
        drop(tx);

        let waited = tokio::time::timeout(self.timeout, child.wait()).await;
        let outcome = match waited {
            Ok(status) => {
                let status = status?;
                RunOutcome::Completed {
                    code: status.code(),
                    success: status.success(),
                }
            }
            Err(_) => {
                // Kills and reaps
                if let Err(e) = child.kill().await {
                    warn!(error = %e, "failed to kill upload tool");
                }
                RunOutcome::TimedOut
            }
        };

        let mut output = Output::default();
        output.drain(&mut rx, DRAIN_GRACE).await;

        let report = RunReport {
            outcome,
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            elapsed: start.elapsed(),
        };
        match report.outcome {
            RunOutcome::TimedOut => warn!(
                elapsed_ms = report.elapsed.as_millis() as u64,
                "upload tool timed out and was killed"
            ),
            RunOutcome::Completed { code, .. } => info!(
                ?code,
                elapsed_ms = report.elapsed.as_millis() as u64,
                "upload tool finished"
            ),
        }
        Ok(report)
    }
}

fn spawn_reader<R>(stream: Stream, mut pipe: R, tx: UnboundedSender<Chunk>)
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut buf = vec![0u8; READ_CHUNK];
        loop {
            match pipe.read(&mut buf).await {
                Ok(0) | Err(_) => break,
                Ok(n) => {
                    if tx.send((stream, buf[..n].to_vec())).is_err() {
                        break;
                    }
                }
            }
        }
    });
}

#[derive(Default)]
struct Output {
    stdout: Vec<u8>,
    stderr: Vec<u8>,
}

impl Output {
    fn push(&mut self, (stream, bytes): Chunk) {
        match stream {
            Stream::Stdout => self.stdout.extend_from_slice(&bytes),
            Stream::Stderr => self.stderr.extend_from_slice(&bytes),
        }
    }

    /// Collect until every reader has hung up or `grace` runs out.
    ///
    /// A grandchild holding a pipe open would otherwise keep the readers
    /// alive indefinitely.
    async fn drain(&mut self, rx: &mut UnboundedReceiver<Chunk>, grace: Duration) {
        let deadline = tokio::time::Instant::now() + grace;
        while let Ok(Some(chunk)) = tokio::time::timeout_at(deadline, rx.recv()).await {
            self.push(chunk);
        }
    }
}
