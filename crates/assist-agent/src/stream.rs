use std::pin::Pin;
use std::task::{Context, Poll};

use futures::Stream;
use tokio::sync::mpsc;

use crate::process::GeneratorProcess;
use crate::types::{GenerationEvent, GeneratorOptions};

// ─── GenerationStream ─────────────────────────────────────────────────────

/// An async stream of [`GenerationEvent`]s from a generator subprocess.
///
/// Backed by a Tokio mpsc channel. A background task owns the process,
/// forwards each stdout line as a `Partial`, then sends exactly one terminal
/// event once stdout closes. The stream ends after the terminal event, even
/// if the sender misbehaves. Dropping the stream closes the receiver, which
/// makes the background task kill the process on its next send.
///
/// ```rust,ignore
/// use assist_agent::{generate_stream, GenerationEvent, GeneratorOptions};
/// use futures::StreamExt;
///
/// let mut stream = generate_stream("Bonjour", GeneratorOptions::new("llm"));
/// while let Some(event) = stream.next().await {
///     if let GenerationEvent::Partial(line) = event {
///         println!("{line}");
///     }
/// }
/// ```
pub struct GenerationStream {
    rx: mpsc::Receiver<GenerationEvent>,
    finished: bool,
}

impl GenerationStream {
    pub(crate) fn new(prompt: String, opts: GeneratorOptions) -> Self {
        let (tx, rx) = mpsc::channel(32);

        tokio::spawn(async move {
            let mut process = match GeneratorProcess::spawn(&prompt, &opts) {
                Ok(p) => p,
                Err(e) => {
                    let _ = tx.send(GenerationEvent::Failed(e.to_string())).await;
                    return;
                }
            };

            let mut output: Vec<String> = Vec::new();
            let terminal = loop {
                match process.next_line().await {
                    Err(e) => break GenerationEvent::Failed(e.to_string()),
                    Ok(None) => match process.wait_exit_error().await {
                        Some(e) => break GenerationEvent::Failed(e.to_string()),
                        None => break GenerationEvent::Completed(output.join("\n")),
                    },
                    Ok(Some(line)) => {
                        output.push(line.clone());
                        if tx.send(GenerationEvent::Partial(line)).await.is_err() {
                            tracing::debug!("generation stream dropped, killing generator");
                            process.kill().await;
                            return;
                        }
                    }
                }
            };

            let _ = tx.send(terminal).await;
            process.kill().await;
        });

        GenerationStream {
            rx,
            finished: false,
        }
    }

    /// Wrap a raw receiver. Used by tests to inject event sequences.
    #[cfg(test)]
    pub(crate) fn from_channel(rx: mpsc::Receiver<GenerationEvent>) -> Self {
        Self {
            rx,
            finished: false,
        }
    }
}

impl Stream for GenerationStream {
    type Item = GenerationEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        if self.finished {
            return Poll::Ready(None);
        }
        match self.rx.poll_recv(cx) {
            Poll::Ready(Some(event)) => {
                if event.is_terminal() {
                    self.finished = true;
                    self.rx.close();
                }
                Poll::Ready(Some(event))
            }
            other => other,
        }
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;

    fn sh(script: &str) -> GeneratorOptions {
        GeneratorOptions::new("sh").arg("-c").arg(script)
    }

    #[tokio::test]
    async fn echoes_prompt_as_partials_then_completes() {
        let stream = GenerationStream::new("ligne un\nligne deux\n".into(), sh("cat"));
        let events: Vec<_> = stream.collect().await;
        assert_eq!(
            events,
            vec![
                GenerationEvent::Partial("ligne un".into()),
                GenerationEvent::Partial("ligne deux".into()),
                GenerationEvent::Completed("ligne un\nligne deux".into()),
            ]
        );
    }

    #[tokio::test]
    async fn empty_output_still_completes() {
        let stream = GenerationStream::new("ignored".into(), sh("cat > /dev/null"));
        let events: Vec<_> = stream.collect().await;
        assert_eq!(events, vec![GenerationEvent::Completed(String::new())]);
    }

    #[tokio::test]
    async fn non_zero_exit_fails_with_stderr() {
        let stream = GenerationStream::new(
            String::new(),
            sh("echo partiel; echo 'quota exceeded' >&2; exit 3"),
        );
        let events: Vec<_> = stream.collect().await;
        assert_eq!(events.len(), 2);
        assert_eq!(events[0], GenerationEvent::Partial("partiel".into()));
        let GenerationEvent::Failed(msg) = &events[1] else {
            panic!("expected Failed, got {:?}", events[1]);
        };
        assert!(msg.contains("code 3"), "{msg}");
        assert!(msg.contains("quota exceeded"), "{msg}");
    }

    #[tokio::test]
    async fn missing_program_fails_once() {
        let stream = GenerationStream::new(
            "x".into(),
            GeneratorOptions::new("/nonexistent/assist-generator"),
        );
        let events: Vec<_> = stream.collect().await;
        assert_eq!(events.len(), 1);
        let GenerationEvent::Failed(msg) = &events[0] else {
            panic!("expected Failed");
        };
        assert!(msg.contains("failed to spawn"), "{msg}");
    }

    #[tokio::test]
    async fn env_and_cwd_are_applied() {
        let dir = tempfile::TempDir::new().unwrap();
        let opts = sh("printf '%s:' \"$GREETING\"; basename \"$(pwd -P)\"")
            .env("GREETING", "bonjour")
            .cwd(dir.path());
        let name = dir
            .path()
            .file_name()
            .unwrap()
            .to_string_lossy()
            .into_owned();
        let events: Vec<_> = GenerationStream::new(String::new(), opts).collect().await;
        assert_eq!(
            events.last(),
            Some(&GenerationEvent::Completed(format!("bonjour:{name}")))
        );
    }

    #[tokio::test]
    async fn nothing_is_yielded_after_terminal() {
        let (tx, rx) = mpsc::channel(8);
        tx.send(GenerationEvent::Partial("a".into())).await.unwrap();
        tx.send(GenerationEvent::Failed("boom".into())).await.unwrap();
        let _ = tx.send(GenerationEvent::Partial("late".into())).await;
        drop(tx);
        let events: Vec<_> = GenerationStream::from_channel(rx).collect().await;
        assert_eq!(
            events,
            vec![
                GenerationEvent::Partial("a".into()),
                GenerationEvent::Failed("boom".into()),
            ]
        );
    }
}
