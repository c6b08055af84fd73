use crate::output::{print_json, print_report};
use anyhow::Context;
use assist_core::analyzer::Analyzer;
use std::path::Path;

pub fn run(root: &Path, file: Option<&Path>, ignore: &[String], json: bool) -> anyhow::Result<()> {
    let path = super::context_path(root, file)?;
    let ignored = super::ignored_set(ignore);
    let report = Analyzer::default()
        .analyze_file(&path, &ignored)
        .with_context(|| format!("failed to analyze {}", path.display()))?;

    if json {
        print_json(&report)?;
    } else {
        print_report(&report);
    }
    Ok(())
}
