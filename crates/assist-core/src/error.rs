use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AssistError {
    #[error("context file not found: {}", .0.display())]
    ContextNotFound(PathBuf),

    #[error("failed to parse context document: no project title and no phase heading found")]
    Parse,

    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid session state: cannot {action} while {state}")]
    InvalidState { action: String, state: String },

    #[error("no displayed finding for category: {0}")]
    UnknownCategory(String),

    #[error("'{choice}' is not an option for '{category}' (options: {options})")]
    InvalidChoice {
        category: String,
        choice: String,
        options: String,
    },

    #[error("invalid finding type: {0}")]
    InvalidFindingKind(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),
}

pub type Result<T> = std::result::Result<T, AssistError>;
