use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

// ---------------------------------------------------------------------------
// FindingKind
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FindingKind {
    Info,
    DecisionNeeded,
    Warning,
    Suggestion,
}

impl FindingKind {
    pub fn as_str(self) -> &'static str {
        match self {
            FindingKind::Info => "info",
            FindingKind::DecisionNeeded => "decision_needed",
            FindingKind::Warning => "warning",
            FindingKind::Suggestion => "suggestion",
        }
    }
}

impl fmt::Display for FindingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for FindingKind {
    type Err = crate::error::AssistError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "info" => Ok(FindingKind::Info),
            "decision_needed" => Ok(FindingKind::DecisionNeeded),
            "warning" => Ok(FindingKind::Warning),
            "suggestion" => Ok(FindingKind::Suggestion),
            _ => Err(crate::error::AssistError::InvalidFindingKind(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// Finding
// ---------------------------------------------------------------------------

/// One unit of analysis output.
///
/// `decision_needed` findings always carry `options`, `phase` and `question`;
/// the rewriter relies on the latter two to find the answer to modify.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    #[serde(rename = "type")]
    pub kind: FindingKind,
    /// `None` only for the synthesized "no issues" finding.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phase: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub question: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub related_phases: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub suggested_actions: Vec<String>,
}

impl Finding {
    pub fn new(kind: FindingKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            category: None,
            message: message.into(),
            details: None,
            options: Vec::new(),
            phase: None,
            question: None,
            related_phases: Vec::new(),
            suggested_actions: Vec::new(),
        }
    }

    pub fn category(mut self, category: &str) -> Self {
        self.category = Some(category.to_string());
        self
    }

    pub fn details(mut self, details: &str) -> Self {
        self.details = Some(details.to_string());
        self
    }

    pub fn located(mut self, phase: &str, question: &str) -> Self {
        self.phase = Some(phase.to_string());
        self.question = Some(question.to_string());
        self
    }

    pub fn options(mut self, options: Vec<String>) -> Self {
        self.options = options;
        self
    }

    pub fn actions(mut self, actions: &[&str]) -> Self {
        self.suggested_actions = actions.iter().map(|a| a.to_string()).collect();
        self
    }

    pub fn is_decision(&self) -> bool {
        self.kind == FindingKind::DecisionNeeded
    }
}

// ---------------------------------------------------------------------------
// Decision / IgnoredCategories
// ---------------------------------------------------------------------------

/// A user's choice for a `decision_needed` finding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decision {
    pub category: String,
    pub choice: String,
    pub phase: String,
    pub question: String,
}

impl Decision {
    /// Build a decision from a displayed finding. Returns `None` when the
    /// finding lacks category or provenance.
    pub fn from_finding(finding: &Finding, choice: &str) -> Option<Self> {
        Some(Self {
            category: finding.category.clone()?,
            choice: choice.to_string(),
            phase: finding.phase.clone()?,
            question: finding.question.clone()?,
        })
    }
}

/// Categories whose advisories are suppressed for the rest of a session.
pub type IgnoredCategories = BTreeSet<String>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finding_kind_round_trips_through_str() {
        for kind in [
            FindingKind::Info,
            FindingKind::DecisionNeeded,
            FindingKind::Warning,
            FindingKind::Suggestion,
        ] {
            assert_eq!(kind.as_str().parse::<FindingKind>().unwrap(), kind);
        }
        assert!("fatal".parse::<FindingKind>().is_err());
    }

    #[test]
    fn empty_fields_are_not_serialized() {
        let f = Finding::new(FindingKind::Info, "ok");
        let json = serde_json::to_string(&f).unwrap();
        assert_eq!(json, r#"{"type":"info","message":"ok"}"#);
    }

    #[test]
    fn decision_from_finding_requires_provenance() {
        let bare = Finding::new(FindingKind::DecisionNeeded, "m").category("tech_stack_backend");
        assert!(Decision::from_finding(&bare, "Node.js").is_none());

        let located = bare.located("Conception", "Quelles technologies et frameworks utiliser?");
        let d = Decision::from_finding(&located, "Node.js").unwrap();
        assert_eq!(d.category, "tech_stack_backend");
        assert_eq!(d.phase, "Conception");
    }
}
