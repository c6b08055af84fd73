//! `assist-agent`: driver for an external text-generation program.
//!
//! The generator is treated as an opaque collaborator: a prompt goes in on
//! stdin, text comes out on stdout, and a non-zero exit is a failure.
//!
//! # Architecture
//!
//! ```text
//! ModuleRegistry  ← routes a task (`doc:`, `refactor:`, `analyse:`, chat)
//!     │               to a prompt
//!     ▼
//! GeneratorProcess ← spawns the configured program, feeds stdin,
//!     │               reads stdout lines, buffers stderr
//!     ▼
//! GenerationStream ← futures::Stream<Item = GenerationEvent>
//!     │               Partial* then exactly one Completed | Failed
//!     ▼
//! generate / dispatch ← collect to a String, or drive Callbacks
//! ```

pub mod error;
pub mod modules;
pub mod runner;
pub mod types;

pub(crate) mod process;
pub mod stream;

pub use error::AgentError;
pub use modules::{
    AnalysisModule, ChatModule, DocModule, Module, ModuleRegistry, RefactorModule,
};
pub use runner::{dispatch, generate, Callbacks};
pub use stream::GenerationStream;
pub use types::{GenerationEvent, GeneratorOptions};

/// Convenience `Result` alias for this crate.
pub type Result<T> = std::result::Result<T, AgentError>;

/// Start a generation run. Must be called inside a Tokio runtime.
pub fn generate_stream(prompt: impl Into<String>, opts: GeneratorOptions) -> GenerationStream {
    GenerationStream::new(prompt.into(), opts)
}
