pub mod analyzer;
pub mod config;
pub mod document;
pub mod error;
pub mod io;
pub mod locator;
pub mod parser;
pub mod paths;
pub mod rewrite;
pub mod rules;
pub mod session;
pub mod types;

pub use error::{AssistError, Result};
