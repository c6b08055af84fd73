use std::collections::HashMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

// ─── GeneratorOptions ─────────────────────────────────────────────────────

/// How to launch the external text generator.
///
/// The generator is any program that reads a prompt on stdin and writes the
/// completion to stdout, one line at a time. A non-zero exit status is a
/// failure; whatever it wrote to stderr becomes the error message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratorOptions {
    pub program: String,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default)]
    pub env: HashMap<String, String>,
    #[serde(default)]
    pub cwd: Option<PathBuf>,
}

impl Default for GeneratorOptions {
    fn default() -> Self {
        Self {
            program: "llm".to_string(),
            args: Vec::new(),
            env: HashMap::new(),
            cwd: None,
        }
    }
}

impl GeneratorOptions {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            ..Default::default()
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    pub fn cwd(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }
}

// ─── GenerationEvent ──────────────────────────────────────────────────────

/// One event of a generation run.
///
/// A run yields zero or more `Partial` events in output order followed by
/// exactly one terminal event (`Completed` or `Failed`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "text", rename_all = "snake_case")]
pub enum GenerationEvent {
    /// One line of output, without its terminator.
    Partial(String),
    /// The full output: every partial line joined with `\n`.
    Completed(String),
    Failed(String),
}

impl GenerationEvent {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, GenerationEvent::Partial(_))
    }
}
