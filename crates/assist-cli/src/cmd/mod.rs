pub mod analyze;
pub mod apply;
pub mod config;
pub mod generate;
pub mod init;
pub mod review;

use anyhow::Context;
use assist_core::config::Config;
use assist_core::paths;
use assist_core::types::IgnoredCategories;
use std::path::{Path, PathBuf};

/// The document a command operates on: `--file` when given, otherwise the
/// configured context file.
pub(crate) fn context_path(root: &Path, file: Option<&Path>) -> anyhow::Result<PathBuf> {
    match file {
        Some(f) => Ok(paths::resolve(root, f)),
        None => {
            let config = Config::load(root).context("failed to load config")?;
            Ok(config.context_path(root))
        }
    }
}

pub(crate) fn ignored_set(categories: &[String]) -> IgnoredCategories {
    categories.iter().cloned().collect()
}
