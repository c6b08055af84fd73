use std::process::Stdio;
use std::sync::{Arc, Mutex};

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::process::{Child, ChildStdout, Command};
use tokio::task::JoinHandle;

use crate::types::GeneratorOptions;
use crate::{AgentError, Result};

// ─── GeneratorProcess ─────────────────────────────────────────────────────

/// A running generator subprocess.
///
/// The prompt is fed to stdin by a writer task, which closes stdin when done.
/// Stdout is read line by line. Stderr is drained into a buffer by a
/// background task and surfaced when the process exits with an error.
pub(crate) struct GeneratorProcess {
    program: String,
    child: Child,
    lines: Lines<BufReader<ChildStdout>>,
    stderr_buf: Arc<Mutex<String>>,
    stderr_task: Option<JoinHandle<()>>,
}

impl GeneratorProcess {
    pub(crate) fn spawn(prompt: &str, opts: &GeneratorOptions) -> Result<Self> {
        let mut cmd = Command::new(&opts.program);
        cmd.args(&opts.args);
        for (k, v) in &opts.env {
            cmd.env(k, v);
        }
        if let Some(cwd) = &opts.cwd {
            cmd.current_dir(cwd);
        }
        cmd.stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = cmd.spawn().map_err(|source| AgentError::Spawn {
            program: opts.program.clone(),
            source,
        })?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| AgentError::Process("stdout not captured".into()))?;

        // Fed concurrently with the stdout reader.
        if let Some(mut stdin) = child.stdin.take() {
            let data = prompt.as_bytes().to_vec();
            tokio::spawn(async move {
                if let Err(e) = stdin.write_all(&data).await {
                    tracing::debug!(error = %e, "generator closed stdin early");
                    return;
                }
                let _ = stdin.shutdown().await;
            });
        }

        let stderr_buf = Arc::new(Mutex::new(String::new()));
        let stderr_task = child.stderr.take().map(|stderr| {
            let buf = Arc::clone(&stderr_buf);
            tokio::spawn(async move {
                let mut reader = BufReader::new(stderr).lines();
                while let Ok(Some(line)) = reader.next_line().await {
                    if let Ok(mut b) = buf.lock() {
                        if !b.is_empty() {
                            b.push('\n');
                        }
                        b.push_str(&line);
                    }
                }
            })
        });

        tracing::debug!(program = %opts.program, args = ?opts.args, "generator spawned");

        Ok(Self {
            program: opts.program.clone(),
            child,
            lines: BufReader::new(stdout).lines(),
            stderr_buf,
            stderr_task,
        })
    }

    /// Next stdout line, or `Ok(None)` on EOF.
    pub(crate) async fn next_line(&mut self) -> Result<Option<String>> {
        self.lines.next_line().await.map_err(AgentError::Io)
    }

    /// Wait for the child to exit. Returns an error if it exited non-zero or
    /// was killed by a signal, including any captured stderr.
    pub(crate) async fn wait_exit_error(&mut self) -> Option<AgentError> {
        let status = match self.child.wait().await {
            Ok(s) => s,
            Err(e) => return Some(AgentError::Io(e)),
        };

        if status.success() {
            return None;
        }

        if let Some(task) = self.stderr_task.take() {
            let _ = task.await;
        }
        let stderr = self
            .stderr_buf
            .lock()
            .ok()
            .map(|b| b.trim().to_string())
            .unwrap_or_default();

        let head = match status.code() {
            Some(code) => format!("{} exited with code {code}", self.program),
            None => format!("{} terminated by signal", self.program),
        };
        let msg = if stderr.is_empty() {
            head
        } else {
            format!("{head}\nstderr: {stderr}")
        };
        Some(AgentError::Process(msg))
    }

    pub(crate) async fn kill(&mut self) {
        let _ = self.child.kill().await;
    }
}
