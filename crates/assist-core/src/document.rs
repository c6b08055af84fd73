//! Structured form of a project-context document and the heading grammar
//! shared by the parser and the rewriter.
//!
//! ```text
//! # Projet : <name>
//! ## Phase : <phase title>
//! ### <question text>
//! <response, one or more lines>
//! ```

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

// ---------------------------------------------------------------------------
// Model
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedDocument {
    pub project_name: Option<String>,
    pub phases: Vec<Phase>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Phase {
    pub title: String,
    pub questions: Vec<QuestionAnswer>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionAnswer {
    pub text: String,
    /// Newline-joined answer lines, in source order.
    pub response: String,
}

impl QuestionAnswer {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            response: String::new(),
        }
    }

    pub(crate) fn push_line(&mut self, line: &str) {
        if !self.response.is_empty() {
            self.response.push('\n');
        }
        self.response.push_str(line);
    }
}

// ---------------------------------------------------------------------------
// Heading grammar
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Line<'a> {
    Project(&'a str),
    Phase(&'a str),
    Question(&'a str),
    Body,
}

static PROJECT_RE: OnceLock<Regex> = OnceLock::new();
static PHASE_RE: OnceLock<Regex> = OnceLock::new();
static QUESTION_RE: OnceLock<Regex> = OnceLock::new();

fn project_re() -> &'static Regex {
    PROJECT_RE.get_or_init(|| Regex::new(r"^# (?i:projet) : (.+)$").unwrap())
}

fn phase_re() -> &'static Regex {
    PHASE_RE.get_or_init(|| Regex::new(r"^## (?i:phase) : (.+)$").unwrap())
}

fn question_re() -> &'static Regex {
    QUESTION_RE.get_or_init(|| Regex::new(r"^### (.+)$").unwrap())
}

/// Classify an already-trimmed line. Patterns are tried in priority order:
/// project title, phase heading, question heading.
pub fn classify_line(line: &str) -> Line<'_> {
    let capture = |re: &Regex| {
        re.captures(line)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().trim())
            .filter(|s| !s.is_empty())
    };
    if let Some(name) = capture(project_re()) {
        return Line::Project(name);
    }
    if let Some(title) = capture(phase_re()) {
        return Line::Phase(title);
    }
    if let Some(text) = capture(question_re()) {
        return Line::Question(text);
    }
    Line::Body
}
