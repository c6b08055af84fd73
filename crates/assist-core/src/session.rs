//! Interactive review session.
//!
//! ```text
//! Idle ──analyze──▶ Analyzing ──▶ ResultsDisplayed
//!   ▲                                  │  resolve / record_action
//!   └──────── apply_and_reanalyze ◀────┘  (loops back through Analyzing)
//! ```
//!
//! The analyzer itself is stateless; ignored categories and pending
//! decisions live here and are passed into each analysis pass.

use crate::analyzer::{AnalysisReport, Analyzer};
use crate::error::{AssistError, Result};
use crate::rewrite::{apply_to_file, RewriteOutcome};
use crate::types::{Decision, Finding, IgnoredCategories};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Idle,
    Analyzing,
    ResultsDisplayed,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SessionState::Idle => "idle",
            SessionState::Analyzing => "analyzing",
            SessionState::ResultsDisplayed => "results_displayed",
        })
    }
}

/// How the user resolved one displayed finding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Ignored { category: String },
    Chosen(Decision),
}

#[derive(Debug, Clone, Serialize)]
pub struct ApplyOutcome {
    /// `None` when no decision was pending and the file was left alone.
    pub rewrite: Option<RewriteOutcome>,
    pub report: AnalysisReport,
}

pub struct Session {
    analyzer: Analyzer,
    state: SessionState,
    ignored: IgnoredCategories,
    decisions: BTreeMap<String, Decision>,
    findings: Vec<Finding>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new(Analyzer::default())
    }
}

impl Session {
    pub fn new(analyzer: Analyzer) -> Self {
        Self {
            analyzer,
            state: SessionState::Idle,
            ignored: IgnoredCategories::new(),
            decisions: BTreeMap::new(),
            findings: Vec::new(),
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn findings(&self) -> &[Finding] {
        &self.findings
    }

    pub fn ignored(&self) -> &IgnoredCategories {
        &self.ignored
    }

    pub fn decisions(&self) -> &BTreeMap<String, Decision> {
        &self.decisions
    }

    /// Run an analysis pass. On failure the session returns to `Idle` and
    /// previously displayed findings are discarded.
    pub fn analyze(&mut self, path: &Path) -> Result<AnalysisReport> {
        if self.state == SessionState::Analyzing {
            return Err(self.invalid("analyze"));
        }
        self.state = SessionState::Analyzing;
        match self.analyzer.analyze_file(path, &self.ignored) {
            Ok(report) => {
                self.findings = report.findings.clone();
                self.state = SessionState::ResultsDisplayed;
                Ok(report)
            }
            Err(e) => {
                self.findings.clear();
                self.state = SessionState::Idle;
                Err(e)
            }
        }
    }

    /// Record a resolution for a displayed finding.
    pub fn resolve(&mut self, resolution: Resolution) -> Result<()> {
        if self.state != SessionState::ResultsDisplayed {
            return Err(self.invalid("resolve a finding"));
        }
        match resolution {
            Resolution::Ignored { category } => {
                tracing::debug!(category = %category, "advisory ignored for session");
                self.ignored.insert(category);
            }
            Resolution::Chosen(decision) => {
                let finding = self
                    .findings
                    .iter()
                    .find(|f| {
                        f.is_decision() && f.category.as_deref() == Some(decision.category.as_str())
                    })
                    .ok_or_else(|| AssistError::UnknownCategory(decision.category.clone()))?;
                if !finding.options.contains(&decision.choice) {
                    return Err(AssistError::InvalidChoice {
                        category: decision.category.clone(),
                        choice: decision.choice.clone(),
                        options: finding.options.join(", "),
                    });
                }
                self.decisions.insert(decision.category.clone(), decision);
            }
        }
        Ok(())
    }

    /// Choose option `choice` for the displayed decision of `category`.
    pub fn choose(&mut self, category: &str, choice: &str) -> Result<()> {
        let decision = self
            .findings
            .iter()
            .find(|f| f.is_decision() && f.category.as_deref() == Some(category))
            .and_then(|f| Decision::from_finding(f, choice))
            .ok_or_else(|| AssistError::UnknownCategory(category.to_string()))?;
        self.resolve(Resolution::Chosen(decision))
    }

    /// Take a suggested action on an advisory. Actions that mean "ignore"
    /// suppress the category; others are acknowledged only.
    pub fn record_action(&mut self, category: &str, action: &str) -> Result<bool> {
        if self.state != SessionState::ResultsDisplayed {
            return Err(self.invalid("record an action"));
        }
        if !self
            .findings
            .iter()
            .any(|f| f.category.as_deref() == Some(category))
        {
            return Err(AssistError::UnknownCategory(category.to_string()));
        }
        if is_ignore_action(action) {
            self.resolve(Resolution::Ignored {
                category: category.to_string(),
            })?;
            return Ok(true);
        }
        tracing::debug!(category, action, "action acknowledged");
        Ok(false)
    }

    /// Write pending decisions into the document and re-analyze.
    ///
    /// Decisions are cleared only after a successful write. On a read or
    /// write failure they are kept, the state is unchanged, and no
    /// re-analysis runs.
    pub fn apply_and_reanalyze(&mut self, path: &Path) -> Result<ApplyOutcome> {
        self.apply_with(path, apply_to_file)
    }

    fn apply_with<F>(&mut self, path: &Path, apply: F) -> Result<ApplyOutcome>
    where
        F: FnOnce(&Path, &BTreeMap<String, Decision>) -> Result<RewriteOutcome>,
    {
        if self.state != SessionState::ResultsDisplayed {
            return Err(self.invalid("apply decisions"));
        }
        let rewrite = if self.decisions.is_empty() {
            None
        } else {
            let outcome = apply(path, &self.decisions)?;
            self.decisions.clear();
            Some(outcome)
        };
        let report = self.analyze(path)?;
        Ok(ApplyOutcome { rewrite, report })
    }

    fn invalid(&self, action: &str) -> AssistError {
        AssistError::InvalidState {
            action: action.to_string(),
            state: self.state.to_string(),
        }
    }
}

pub fn is_ignore_action(action: &str) -> bool {
    action.to_lowercase().contains("ignorer")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
