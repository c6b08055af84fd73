use crate::document::ParsedDocument;
use crate::error::Result;
use crate::io::read_document;
use crate::parser::parse;
use crate::rules::{default_rules, Rule};
use crate::types::{Finding, FindingKind, IgnoredCategories};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const NO_ISSUES_MESSAGE: &str =
    "Aucune incohérence majeure détectée. Le document semble globalement cohérent.";

const TASK_KEYWORDS: &[&str] = &[
    "analyser markdown",
    "cohérence contexte",
    "verifier markdown",
    "cohérence md",
];

/// True when a free-text task asks for a coherence analysis.
pub fn can_handle(task: &str) -> bool {
    let lower = task.to_lowercase();
    TASK_KEYWORDS.iter().any(|k| lower.contains(k))
}

// ---------------------------------------------------------------------------
// Aggregation
// ---------------------------------------------------------------------------

/// Concatenate rule outputs in evaluation order and drop ignored advisories.
///
/// `decision_needed` findings survive the ignore set, since the document may
/// have changed under them. An empty result becomes a single uncategorized
/// `info` finding, built fresh on every call.
pub fn aggregate<I>(batches: I, ignored: &IgnoredCategories) -> Vec<Finding>
where
    I: IntoIterator<Item = Vec<Finding>>,
{
    let mut findings: Vec<Finding> = batches
        .into_iter()
        .flatten()
        .filter(|f| {
            f.is_decision()
                || f.category
                    .as_ref()
                    .map(|c| !ignored.contains(c))
                    .unwrap_or(true)
        })
        .collect();
    if findings.is_empty() {
        findings.push(Finding::new(FindingKind::Info, NO_ISSUES_MESSAGE));
    }
    findings
}

// ---------------------------------------------------------------------------
// Analyzer
// ---------------------------------------------------------------------------

pub struct Analyzer {
    rules: Vec<Rule>,
}

impl Default for Analyzer {
    fn default() -> Self {
        Self::new(default_rules())
    }
}

impl Analyzer {
    pub fn new(rules: Vec<Rule>) -> Self {
        Self { rules }
    }

    pub fn analyze(&self, doc: &ParsedDocument, ignored: &IgnoredCategories) -> Vec<Finding> {
        let batches = self.rules.iter().map(|rule| {
            let findings = (rule.evaluate)(doc);
            tracing::debug!(rule = rule.id, count = findings.len(), "rule evaluated");
            findings
        });
        aggregate(batches, ignored)
    }

    /// Read, parse and analyze the document at `path`.
    pub fn analyze_file(&self, path: &Path, ignored: &IgnoredCategories) -> Result<AnalysisReport> {
        let content = read_document(path)?;
        let doc = parse(&content)?;
        let findings = self.analyze(&doc, ignored);
        Ok(AnalysisReport {
            project_name: doc.project_name,
            source: path.to_path_buf(),
            analyzed_at: Utc::now(),
            findings,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisReport {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_name: Option<String>,
    pub source: PathBuf,
    pub analyzed_at: DateTime<Utc>,
    pub findings: Vec<Finding>,
}

impl AnalysisReport {
    /// True when the only finding is the synthesized "no issues" one.
    pub fn is_clean(&self) -> bool {
        matches!(self.findings.as_slice(), [f] if f.kind == FindingKind::Info && f.category.is_none())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
