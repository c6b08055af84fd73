use futures::StreamExt;

use crate::stream::GenerationStream;
use crate::types::{GenerationEvent, GeneratorOptions};
use crate::{generate_stream, AgentError, Result};

// ─── Callbacks ────────────────────────────────────────────────────────────

type SuccessFn<'a> = Box<dyn FnOnce(String) + Send + 'a>;
type ErrorFn<'a> = Box<dyn FnOnce(String) + Send + 'a>;
type PartialFn<'a> = Box<dyn FnMut(&str) + Send + 'a>;

/// Completion callbacks for an asynchronous generation task.
///
/// Exactly one of `on_success` / `on_error` runs per task. `on_partial`, when
/// present, sees every fragment in order before that.
pub struct Callbacks<'a> {
    on_success: SuccessFn<'a>,
    on_error: ErrorFn<'a>,
    on_partial: Option<PartialFn<'a>>,
}

impl<'a> Callbacks<'a> {
    pub fn new(
        on_success: impl FnOnce(String) + Send + 'a,
        on_error: impl FnOnce(String) + Send + 'a,
    ) -> Self {
        Self {
            on_success: Box::new(on_success),
            on_error: Box::new(on_error),
            on_partial: None,
        }
    }

    pub fn with_partial(mut self, on_partial: impl FnMut(&str) + Send + 'a) -> Self {
        self.on_partial = Some(Box::new(on_partial));
        self
    }
}

// ─── Public API ───────────────────────────────────────────────────────────

/// Run a prompt through the generator and return the full text.
pub async fn generate(prompt: impl Into<String>, opts: GeneratorOptions) -> Result<String> {
    collect(generate_stream(prompt, opts)).await
}

/// Drive a stream to its terminal event, routing events to `callbacks`.
///
/// A stream that closes without a terminal event is reported through
/// `on_error`.
pub async fn dispatch(mut stream: GenerationStream, callbacks: Callbacks<'_>) {
    let Callbacks {
        on_success,
        on_error,
        mut on_partial,
    } = callbacks;

    while let Some(event) = stream.next().await {
        match event {
            GenerationEvent::Partial(text) => {
                if let Some(cb) = on_partial.as_mut() {
                    cb(&text);
                }
            }
            GenerationEvent::Completed(text) => {
                on_success(text);
                return;
            }
            GenerationEvent::Failed(msg) => {
                tracing::debug!(error = %msg, "generation failed");
                on_error(msg);
                return;
            }
        }
    }
    on_error(NO_TERMINAL.to_string());
}

// ─── Internal ─────────────────────────────────────────────────────────────

const NO_TERMINAL: &str = "generation ended without a result";

pub(crate) async fn collect(mut stream: GenerationStream) -> Result<String> {
    while let Some(event) = stream.next().await {
        match event {
            GenerationEvent::Partial(_) => {}
            GenerationEvent::Completed(text) => return Ok(text),
            GenerationEvent::Failed(msg) => return Err(AgentError::Generation(msg)),
        }
    }
    Err(AgentError::Process(NO_TERMINAL.into()))
}

// ─── Tests ────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};
    use tokio::sync::mpsc;

    fn mock_stream(events: Vec<GenerationEvent>) -> GenerationStream {
        let (tx, rx) = mpsc::channel(32);
        tokio::spawn(async move {
            for event in events {
                if tx.send(event).await.is_err() {
                    break;
                }
            }
        });
        GenerationStream::from_channel(rx)
    }

    #[derive(Default)]
    struct Trace {
        partials: Vec<String>,
        success: Option<String>,
        error: Option<String>,
    }

    async fn run_dispatch(stream: GenerationStream, with_partial: bool) -> Trace {
        let trace = Arc::new(Mutex::new(Trace::default()));
        let (s, e, p) = (trace.clone(), trace.clone(), trace.clone());
        let mut callbacks = Callbacks::new(
            move |text| s.lock().unwrap().success = Some(text),
            move |msg| e.lock().unwrap().error = Some(msg),
        );
        if with_partial {
            callbacks =
                callbacks.with_partial(move |frag| p.lock().unwrap().partials.push(frag.into()));
        }
        dispatch(stream, callbacks).await;
        let mut guard = trace.lock().unwrap();
        std::mem::take(&mut *guard)
    }

    #[tokio::test]
    async fn collect_returns_completed_text() {
        let stream = mock_stream(vec![
            GenerationEvent::Partial("a".into()),
            GenerationEvent::Completed("a\nb".into()),
        ]);
        assert_eq!(collect(stream).await.unwrap(), "a\nb");
    }

    #[tokio::test]
    async fn collect_maps_failure_to_error() {
        let stream = mock_stream(vec![GenerationEvent::Failed("rate limited".into())]);
        let err = collect(stream).await.unwrap_err();
        assert!(matches!(err, AgentError::Generation(ref m) if m == "rate limited"));
    }

    #[tokio::test]
    async fn collect_without_terminal_is_error() {
        let (tx, rx) = mpsc::channel::<GenerationEvent>(1);
        drop(tx);
        let err = collect(GenerationStream::from_channel(rx)).await.unwrap_err();
        assert!(err.to_string().contains("without a result"));
    }

    #[tokio::test]
    async fn dispatch_delivers_partials_before_success() {
        let stream = mock_stream(vec![
            GenerationEvent::Partial("un".into()),
            GenerationEvent::Partial("deux".into()),
            GenerationEvent::Completed("un\ndeux".into()),
        ]);
        let trace = run_dispatch(stream, true).await;
        assert_eq!(trace.partials, vec!["un", "deux"]);
        assert_eq!(trace.success.as_deref(), Some("un\ndeux"));
        assert!(trace.error.is_none());
    }

    #[tokio::test]
    async fn dispatch_without_partial_callback_still_completes() {
        let stream = mock_stream(vec![
            GenerationEvent::Partial("x".into()),
            GenerationEvent::Completed("x".into()),
        ]);
        let trace = run_dispatch(stream, false).await;
        assert!(trace.partials.is_empty());
        assert_eq!(trace.success.as_deref(), Some("x"));
    }

    #[tokio::test]
    async fn dispatch_reports_failure_once() {
        let stream = mock_stream(vec![
            GenerationEvent::Partial("x".into()),
            GenerationEvent::Failed("boom".into()),
            GenerationEvent::Completed("late".into()),
        ]);
        let trace = run_dispatch(stream, true).await;
        assert_eq!(trace.error.as_deref(), Some("boom"));
        assert!(trace.success.is_none());
    }

    #[tokio::test]
    async fn dispatch_reports_truncated_stream_as_error() {
        let stream = mock_stream(vec![GenerationEvent::Partial("x".into())]);
        let trace = run_dispatch(stream, true).await;
        assert!(trace.success.is_none());
        assert!(trace.error.is_some());
    }

    #[tokio::test]
    async fn generate_runs_subprocess_end_to_end() {
        let opts = GeneratorOptions::new("sh")
            .arg("-c")
            .arg("tr 'a-z' 'A-Z'");
        let text = generate("bonjour\n", opts).await.unwrap();
        assert_eq!(text, "BONJOUR");
    }
}
