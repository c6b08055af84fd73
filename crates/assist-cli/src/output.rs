use assist_core::analyzer::AnalysisReport;
use assist_core::rewrite::RewriteOutcome;
use assist_core::types::Finding;
use serde::Serialize;
use std::path::Path;

pub fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    println!("{}", json);
    Ok(())
}

pub fn print_table(headers: &[&str], rows: Vec<Vec<String>>) {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in &rows {
        for (i, cell) in row.iter().enumerate() {
            if i < widths.len() {
                widths[i] = widths[i].max(cell.chars().count());
            }
        }
    }

    let header_row: Vec<String> = headers
        .iter()
        .enumerate()
        .map(|(i, h)| format!("{:width$}", h, width = widths[i]))
        .collect();
    println!("{}", header_row.join("  ").trim_end());

    let sep: Vec<String> = widths.iter().map(|&w| "-".repeat(w)).collect();
    println!("{}", sep.join("  "));

    for row in &rows {
        let cells: Vec<String> = row
            .iter()
            .enumerate()
            .map(|(i, cell)| {
                let w = widths.get(i).copied().unwrap_or(0);
                format!("{:width$}", cell, width = w)
            })
            .collect();
        println!("{}", cells.join("  ").trim_end());
    }
}

/// Human-readable report: a summary table, then one numbered block per
/// finding with its options and suggested actions.
pub fn print_report(report: &AnalysisReport) {
    if let Some(name) = &report.project_name {
        println!("Projet : {name}");
    }
    println!("Document : {}", report.source.display());
    println!();

    let rows = report
        .findings
        .iter()
        .enumerate()
        .map(|(i, f)| {
            vec![
                (i + 1).to_string(),
                f.kind.to_string(),
                f.category.clone().unwrap_or_else(|| "-".to_string()),
            ]
        })
        .collect();
    print_table(&["#", "TYPE", "CATEGORY"], rows);

    for (i, finding) in report.findings.iter().enumerate() {
        println!();
        print_finding(i + 1, finding);
    }
}

fn print_finding(index: usize, f: &Finding) {
    println!("[{index}] {}", f.message);
    if let Some(details) = &f.details {
        println!("    {details}");
    }
    if let (Some(phase), Some(question)) = (&f.phase, &f.question) {
        println!("    Phase : {phase} / Question : {question}");
    }
    if !f.related_phases.is_empty() {
        println!("    Phases liées : {}", f.related_phases.join(", "));
    }
    for (k, option) in f.options.iter().enumerate() {
        println!("    option {}: {option}", k + 1);
    }
    for (k, action) in f.suggested_actions.iter().enumerate() {
        println!("    action {}: {action}", k + 1);
    }
}

pub fn print_rewrite(path: &Path, rewrite: &RewriteOutcome) {
    if rewrite.changed {
        println!("Updated {}: {}", path.display(), rewrite.applied.join(", "));
    } else {
        println!("No change to {}", path.display());
    }
    if !rewrite.skipped.is_empty() {
        println!("Skipped: {}", rewrite.skipped.join(", "));
    }
    println!();
}
