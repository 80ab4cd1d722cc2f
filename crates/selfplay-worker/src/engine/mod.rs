//! External engine process adapter
//!
//! One [`EngineProcess`] owns one engine subprocess. Its stdout and stderr
//! are drained by their own tasks from the moment it starts, so the engine
//! never blocks on a full pipe no matter how slowly the caller reads.
//! Every stdout line is forwarded on a channel; the text between a `PGN`
//! line and an `END` line is collected as the game transcript.

pub mod uci;

use crate::error::{Result, WorkerError};
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin, Command};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// GPU selector meaning "run on the CPU"
pub const NO_GPU: i32 = -1;

/// Flags every engine run gets
pub const ENGINE_FLAGS: [&str; 4] = ["--randomize", "--noise", "-t1", "--quiet"];

/// How to start the engine: a program plus arguments that always lead
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineCommand {
    pub program: PathBuf,
    pub base_args: Vec<String>,
}

impl EngineCommand {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            base_args: Vec::new(),
        }
    }

    pub fn with_args(mut self, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.base_args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Full argument list for one run
    ///
    /// `--gpu` is left out for any negative selector.
    pub fn build_args(&self, weights: &Path, gpu: i32, extra: &[String]) -> Vec<String> {
        let mut args = self.base_args.clone();
        args.push(format!("--weights={}", weights.display()));
        if gpu >= 0 {
            args.push(format!("--gpu={}", gpu));
        }
        args.extend(ENGINE_FLAGS.iter().map(|f| f.to_string()));
        args.extend(extra.iter().cloned());
        args
    }
}

/// Accumulates the lines between `PGN` and `END`
#[derive(Debug, Default, Clone)]
pub struct TranscriptCollector {
    reading: bool,
    text: String,
}

impl TranscriptCollector {
    pub fn feed(&mut self, line: &str) {
        match line {
            "PGN" => self.reading = true,
            "END" => self.reading = false,
            _ if self.reading => {
                self.text.push_str(line);
                self.text.push('\n');
            },
            _ => {},
        }
    }

    pub fn into_text(self) -> String {
        self.text
    }
}

/// What a finished engine left behind
#[derive(Debug)]
pub struct EngineExit {
    pub status: ExitStatus,
    pub transcript: String,
}

pub struct EngineProcess {
    label: String,
    child: Child,
    stdin: Option<ChildStdin>,
    lines: mpsc::UnboundedReceiver<String>,
    stdout_task: JoinHandle<TranscriptCollector>,
    stderr_task: JoinHandle<()>,
}

impl EngineProcess {
    /// Start the engine in `cwd` with the given arguments
    pub fn spawn(label: impl Into<String>, program: &Path, args: &[String], cwd: &Path) -> Result<Self> {
        let label = label.into();
        tracing::info!(engine = %label, program = %program.display(), ?args, "Starting engine");

        let mut child = Command::new(program)
            .args(args)
            .current_dir(cwd)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                WorkerError::process(format!("Failed to start '{}': {}", program.display(), e))
            })?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| WorkerError::process("Engine stdout was not captured"))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| WorkerError::process("Engine stderr was not captured"))?;
        let stdin = child.stdin.take();

        let (tx, lines) = mpsc::unbounded_channel();

        let stdout_label = label.clone();
        let stdout_task = tokio::spawn(async move {
            let mut collector = TranscriptCollector::default();
            let mut reader = BufReader::new(stdout).lines();
            while let Ok(Some(line)) = reader.next_line().await {
                tracing::debug!(engine = %stdout_label, "{}", line);
                collector.feed(&line);
                // Nobody listening is fine; the drain must continue
                let _ = tx.send(line);
            }
            collector
        });

        let stderr_label = label.clone();
        let stderr_task = tokio::spawn(async move {
            let mut reader = BufReader::new(stderr).lines();
            while let Ok(Some(line)) = reader.next_line().await {
                tracing::debug!(engine = %stderr_label, stream = "stderr", "{}", line);
            }
        });

        Ok(Self {
            label,
            child,
            stdin,
            lines,
            stdout_task,
            stderr_task,
        })
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Write one command line to the engine's stdin
    pub async fn send_line(&mut self, line: &str) -> Result<()> {
        let stdin = self
            .stdin
            .as_mut()
            .ok_or_else(|| WorkerError::process(format!("{}: stdin already closed", self.label)))?;

        tracing::trace!(engine = %self.label, "> {}", line);
        let written = async {
            stdin.write_all(line.as_bytes()).await?;
            stdin.write_all(b"\n").await?;
            stdin.flush().await
        }
        .await;

        written.map_err(|e| WorkerError::process(format!("{}: write failed: {}", self.label, e)))
    }

    /// Next stdout line, failing if the engine closes stdout or stays
    /// silent past `timeout`
    pub async fn next_line(&mut self, timeout: Option<Duration>) -> Result<String> {
        let line = match timeout {
            Some(limit) => tokio::time::timeout(limit, self.lines.recv())
                .await
                .map_err(|_| {
                    WorkerError::process(format!("{}: no response within {:?}", self.label, limit))
                })?,
            None => self.lines.recv().await,
        };

        line.ok_or_else(|| WorkerError::process(format!("{}: engine closed its output", self.label)))
    }

    /// Close stdin so the engine sees end of input
    pub fn close_stdin(&mut self) {
        self.stdin.take();
    }

    /// Wait for the engine to exit and collect its transcript
    ///
    /// A non-zero or signal exit is a process failure.
    pub async fn wait(mut self) -> Result<EngineExit> {
        self.close_stdin();

        let status = self.child.wait().await?;
        let collector = self
            .stdout_task
            .await
            .map_err(|e| WorkerError::process(format!("{}: stdout drain failed: {}", self.label, e)))?;
        let _ = self.stderr_task.await;

        if !status.success() {
            return Err(WorkerError::process(format!("{}: exited with {}", self.label, status)));
        }

        tracing::debug!(engine = %self.label, %status, "Engine exited");
        Ok(EngineExit {
            status,
            transcript: collector.into_text(),
        })
    }

    /// Kill the engine without waiting for it to finish its work
    pub async fn kill(mut self) {
        if let Err(e) = self.child.kill().await {
            tracing::warn!(engine = %self.label, error = %e, "Failed to kill engine");
        }
        self.stdout_task.abort();
        self.stderr_task.abort();
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_build_args_with_gpu() {
        let command = EngineCommand::new("./lczero");
        let built = command.build_args(Path::new("networks/abcd"), 0, &args(&["--visits", "10"]));
        assert_eq!(
            built,
            args(&[
                "--weights=networks/abcd",
                "--gpu=0",
                "--randomize",
                "--noise",
                "-t1",
                "--quiet",
                "--visits",
                "10"
            ])
        );
    }

    #[test]
    fn test_build_args_without_gpu() {
        let command = EngineCommand::new("python3").with_args(["engine.py"]);
        let built = command.build_args(Path::new("w"), NO_GPU, &[]);
        assert_eq!(
            built,
            args(&["engine.py", "--weights=w", "--randomize", "--noise", "-t1", "--quiet"])
        );
        assert!(!built.iter().any(|a| a.starts_with("--gpu")));
    }

    #[test]
    fn test_transcript_extraction() {
        let mut collector = TranscriptCollector::default();
        for line in ["info string warming up", "PGN", "[Result \"1-0\"]", "", "1. e4 e5 1-0", "END", "bye"] {
            collector.feed(line);
        }
        assert_eq!(collector.into_text(), "[Result \"1-0\"]\n\n1. e4 e5 1-0\n");
    }

    #[test]
    fn test_transcript_empty_without_sentinel() {
        let mut collector = TranscriptCollector::default();
        collector.feed("1. e4 e5");
        collector.feed("END");
        assert_eq!(collector.into_text(), "");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_process_forwards_lines_and_collects_transcript() {
        let dir = tempfile::tempdir().unwrap();
        let script = "read cmd; echo \"got $cmd\"; echo PGN; echo '1. e4 e5'; echo END; echo oops >&2";
        let mut engine = EngineProcess::spawn(
            "test",
            Path::new("sh"),
            &args(&["-c", script]),
            dir.path(),
        )
        .unwrap();

        engine.send_line("hello").await.unwrap();
        assert_eq!(engine.next_line(Some(Duration::from_secs(5))).await.unwrap(), "got hello");

        let exit = engine.wait().await.unwrap();
        assert!(exit.status.success());
        assert_eq!(exit.transcript, "1. e4 e5\n");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_nonzero_exit_is_process_failure() {
        let dir = tempfile::tempdir().unwrap();
        let engine =
            EngineProcess::spawn("test", Path::new("sh"), &args(&["-c", "exit 3"]), dir.path()).unwrap();

        let err = engine.wait().await.unwrap_err();
        assert!(matches!(err, WorkerError::Process(_)));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_closed_output_is_process_failure() {
        let dir = tempfile::tempdir().unwrap();
        let mut engine =
            EngineProcess::spawn("test", Path::new("sh"), &args(&["-c", "true"]), dir.path()).unwrap();

        let err = engine.next_line(Some(Duration::from_secs(5))).await.unwrap_err();
        assert!(matches!(err, WorkerError::Process(_)));
    }

    #[tokio::test]
    async fn test_missing_program_fails_to_spawn() {
        let dir = tempfile::tempdir().unwrap();
        let result = EngineProcess::spawn("test", Path::new("/definitely/not/an/engine"), &[], dir.path());
        assert!(matches!(result, Err(WorkerError::Process(_))));
    }
}
