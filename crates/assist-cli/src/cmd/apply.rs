use crate::output::{print_json, print_report, print_rewrite};
use anyhow::Context;
use assist_core::session::{Resolution, Session};
use std::path::Path;

pub fn run(
    root: &Path,
    file: Option<&Path>,
    choose: &[String],
    ignore: &[String],
    json: bool,
) -> anyhow::Result<()> {
    let choices = choose
        .iter()
        .map(|c| parse_choice(c))
        .collect::<anyhow::Result<Vec<_>>>()?;

    let path = super::context_path(root, file)?;
    let mut session = Session::default();
    session
        .analyze(&path)
        .with_context(|| format!("failed to analyze {}", path.display()))?;

    for category in ignore {
        session.resolve(Resolution::Ignored {
            category: category.clone(),
        })?;
    }
    for (category, option) in &choices {
        session
            .choose(category, option)
            .with_context(|| format!("cannot apply {category}={option}"))?;
    }

    let outcome = session
        .apply_and_reanalyze(&path)
        .context("failed to apply decisions")?;

    if json {
        return print_json(&outcome);
    }

    if let Some(rewrite) = &outcome.rewrite {
        print_rewrite(&path, rewrite);
    }
    print_report(&outcome.report);
    Ok(())
}

/// Split `CATEGORY=OPTION`. The option may itself contain `=`.
fn parse_choice(raw: &str) -> anyhow::Result<(String, String)> {
    match raw.split_once('=') {
        Some((category, option)) if !category.trim().is_empty() && !option.trim().is_empty() => {
            Ok((category.trim().to_string(), option.trim().to_string()))
        }
        _ => anyhow::bail!("invalid --choose '{raw}': expected CATEGORY=OPTION"),
    }
}
