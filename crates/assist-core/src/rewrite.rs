//! Apply decisions back onto the source document.
//!
//! For each decision the scanner finds the target question (case-insensitive
//! exact phase title and question text), emits the heading followed by the
//! new answer line, then drops the first old line with the same label before
//! the next heading. When no such line exists the new line simply stays
//! where it was inserted.

use crate::document::{classify_line, Line};
use crate::error::{AssistError, Result};
use crate::io::{atomic_write, read_document};
use crate::rules::{CATEGORY_BACKEND, CATEGORY_DATABASE};
use crate::types::Decision;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;

/// Categories whose decisions rewrite the document, and the label of the
/// answer line they own.
pub const ANSWER_LABELS: &[(&str, &str)] = &[
    (CATEGORY_BACKEND, "Backend"),
    (CATEGORY_DATABASE, "Base de données"),
];

pub fn answer_label(category: &str) -> Option<&'static str> {
    ANSWER_LABELS
        .iter()
        .find(|(c, _)| *c == category)
        .map(|(_, label)| *label)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RewriteOutcome {
    pub content: String,
    pub changed: bool,
    /// Categories whose target question was found and rewritten.
    pub applied: Vec<String>,
    /// Categories with no rewrite semantics, incomplete data, or no target.
    pub skipped: Vec<String>,
}

/// Rewrite `text` for every decision, in category order.
pub fn rewrite(text: &str, decisions: &BTreeMap<String, Decision>) -> RewriteOutcome {
    let mut content = text.to_string();
    let mut applied = Vec::new();
    let mut skipped = Vec::new();

    for (category, decision) in decisions {
        let Some(label) = answer_label(category) else {
            tracing::warn!(category = %category, "no rewrite semantics for category, skipping");
            skipped.push(category.clone());
            continue;
        };
        if decision.choice.is_empty() || decision.phase.is_empty() || decision.question.is_empty() {
            tracing::warn!(category = %category, "incomplete decision, skipping");
            skipped.push(category.clone());
            continue;
        }
        let line = format!("{label}: {}", decision.choice);
        match replace_answer(&content, decision, label, &line) {
            Some(updated) => {
                tracing::debug!(category = %category, line = %line, "answer rewritten");
                content = updated;
                applied.push(category.clone());
            }
            None => {
                tracing::warn!(
                    category = %category,
                    phase = %decision.phase,
                    question = %decision.question,
                    "target question not found, skipping"
                );
                skipped.push(category.clone());
            }
        }
    }

    RewriteOutcome {
        changed: content != text,
        content,
        applied,
        skipped,
    }
}

/// Read `path`, rewrite it, and write it back only when the content changed.
///
/// A read failure returns before anything is touched; a write failure is
/// returned as [`AssistError::Write`]. Callers keep their decisions on error.
pub fn apply_to_file(path: &Path, decisions: &BTreeMap<String, Decision>) -> Result<RewriteOutcome> {
    let content = read_document(path).map_err(|e| match e {
        AssistError::ContextNotFound(p) => AssistError::Read {
            path: p,
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        },
        other => other,
    })?;
    let outcome = rewrite(&content, decisions);
    if outcome.changed {
        atomic_write(path, outcome.content.as_bytes())?;
    }
    Ok(outcome)
}

#[derive(PartialEq)]
enum Scan {
    Normal,
    /// New line inserted; drop the first old labelled line before a heading.
    Seeking,
    Done,
}

fn replace_answer(text: &str, decision: &Decision, label: &str, new_line: &str) -> Option<String> {
    let phase = decision.phase.to_lowercase();
    let question = decision.question.to_lowercase();
    let prefix = format!("{}:", label.to_lowercase());

    let mut out = String::with_capacity(text.len() + new_line.len() + 1);
    let mut in_phase = false;
    let mut scan = Scan::Normal;

    for chunk in text.split_inclusive('\n') {
        let body = chunk.trim_end_matches(['\n', '\r']);
        let eol = &chunk[body.len()..];
        let trimmed = body.trim();

        match classify_line(trimmed) {
            Line::Phase(title) => {
                in_phase = title.to_lowercase() == phase;
                if scan == Scan::Seeking {
                    scan = Scan::Done;
                }
            }
            Line::Question(q) => {
                if scan == Scan::Seeking {
                    scan = Scan::Done;
                }
                if scan == Scan::Normal && in_phase && q.to_lowercase() == question {
                    out.push_str(chunk);
                    if eol.is_empty() {
                        out.push('\n');
                        out.push_str(new_line);
                    } else {
                        out.push_str(new_line);
                        out.push_str(eol);
                    }
                    scan = Scan::Seeking;
                    continue;
                }
            }
            Line::Project(_) => {
                if scan == Scan::Seeking {
                    scan = Scan::Done;
                }
            }
            Line::Body => {
                if scan == Scan::Seeking && trimmed.to_lowercase().starts_with(&prefix) {
                    scan = Scan::Done;
                    continue;
                }
            }
        }
        out.push_str(chunk);
    }

    (scan != Scan::Normal).then_some(out)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::locator::find_answer;
    use crate::parser::parse;
    use tempfile::TempDir;

    const TECH_Q: &str = "Quelles technologies et frameworks utiliser?";

    const DOC: &str = "\
# Projet : Test Widget Projet
## Phase : Conception
### Quelles technologies et frameworks utiliser?
Backend: Node.js, Java Spring, Python/Django
Base de données: PostgreSQL, MongoDB
Frontend: React
### Quelle architecture logicielle adopter pour le projet?
Microservices
## Phase : Tests
### Quels outils de test utiliser?
Jest, Mocha
";

    fn decisions(items: &[(&str, &str)]) -> BTreeMap<String, Decision> {
        items
            .iter()
            .map(|(category, choice)| {
                (
                    category.to_string(),
                    Decision {
                        category: category.to_string(),
                        choice: choice.to_string(),
                        phase: "Conception".to_string(),
                        question: TECH_Q.to_string(),
                    },
                )
            })
            .collect()
    }

    #[test]
    fn replaces_backend_line_in_place() {
        let out = rewrite(DOC, &decisions(&[(CATEGORY_BACKEND, "Node.js")]));
        assert!(out.changed);
        assert_eq!(out.applied, vec![CATEGORY_BACKEND]);
        let doc = parse(&out.content).unwrap();
        assert_eq!(
            find_answer(&doc, "conception", "technologies et frameworks"),
            Some("Backend: Node.js\nBase de données: PostgreSQL, MongoDB\nFrontend: React")
        );
        assert!(out.content.contains("### Quelle architecture logicielle adopter pour le projet?\nMicroservices\n"));
    }

    #[test]
    fn injected_line_is_first_line_of_answer() {
        let out = rewrite(DOC, &decisions(&[(CATEGORY_DATABASE, "MongoDB")]));
        let doc = parse(&out.content).unwrap();
        let answer = find_answer(&doc, "conception", "technologies et frameworks").unwrap();
        assert_eq!(answer.lines().next(), Some("Base de données: MongoDB"));
        assert_eq!(answer.matches("Base de données:").count(), 1);
    }

    #[test]
    fn both_decisions_apply_in_one_pass() {
        let out = rewrite(
            DOC,
            &decisions(&[(CATEGORY_BACKEND, "Java/Spring"), (CATEGORY_DATABASE, "PostgreSQL")]),
        );
        assert_eq!(out.applied.len(), 2);
        let doc = parse(&out.content).unwrap();
        let answer = find_answer(&doc, "conception", "technologies et frameworks").unwrap();
        assert!(answer.contains("Backend: Java/Spring"));
        assert!(answer.contains("Base de données: PostgreSQL"));
        assert!(!answer.contains("MongoDB"));
        assert!(answer.contains("Frontend: React"));
    }

    #[test]
    fn second_application_is_byte_identical() {
        let d = decisions(&[(CATEGORY_BACKEND, "Node.js"), (CATEGORY_DATABASE, "MongoDB")]);
        let first = rewrite(DOC, &d);
        let second = rewrite(&first.content, &d);
        assert_eq!(first.content, second.content);
        assert!(!second.changed);
    }

    #[test]
    fn missing_label_line_inserts_after_heading_without_duplicates() {
        let text = "## Phase : Conception\n### Quelles technologies et frameworks utiliser?\nReact partout\n### Autre?\nBackend: ne pas toucher\n";
        let out = rewrite(text, &decisions(&[(CATEGORY_BACKEND, "Node.js")]));
        assert_eq!(
            out.content,
            "## Phase : Conception\n### Quelles technologies et frameworks utiliser?\nBackend: Node.js\nReact partout\n### Autre?\nBackend: ne pas toucher\n"
        );
    }

    #[test]
    fn unknown_categories_are_skipped_not_failed() {
        let mut d = decisions(&[(CATEGORY_BACKEND, "Node.js")]);
        d.insert(
            "security_superficial".to_string(),
            Decision {
                category: "security_superficial".to_string(),
                choice: "Détailler".to_string(),
                phase: "Développement".to_string(),
                question: "Sécurité?".to_string(),
            },
        );
        let out = rewrite(DOC, &d);
        assert_eq!(out.applied, vec![CATEGORY_BACKEND]);
        assert_eq!(out.skipped, vec!["security_superficial"]);
    }

    #[test]
    fn no_known_category_is_a_no_op() {
        let mut d = BTreeMap::new();
        d.insert(
            "other".to_string(),
            Decision {
                category: "other".to_string(),
                choice: "x".to_string(),
                phase: "Conception".to_string(),
                question: TECH_Q.to_string(),
            },
        );
        let out = rewrite(DOC, &d);
        assert!(!out.changed);
        assert_eq!(out.content, DOC);
    }

    #[test]
    fn matching_is_case_insensitive_and_phase_scoped() {
        let text = "## Phase : Tests\n### quelles technologies et frameworks utiliser?\nBackend: A\n## Phase : CONCEPTION\n### QUELLES TECHNOLOGIES ET FRAMEWORKS UTILISER?\nBackend: B, C\n";
        let out = rewrite(text, &decisions(&[(CATEGORY_BACKEND, "C")]));
        assert!(out.content.contains("Backend: A\n"));
        assert!(out.content.ends_with("UTILISER?\nBackend: C\n"));
    }

    #[test]
    fn unmatched_target_is_reported_as_skipped() {
        let text = "## Phase : Tests\n### Quels outils?\nJest\n";
        let out = rewrite(text, &decisions(&[(CATEGORY_BACKEND, "Node.js")]));
        assert!(!out.changed);
        assert_eq!(out.skipped, vec![CATEGORY_BACKEND]);
    }

    #[test]
    fn crlf_line_endings_are_preserved() {
        let text = "## Phase : Conception\r\n### Quelles technologies et frameworks utiliser?\r\nBackend: X, Y\r\nFrontend: Z\r\n";
        let out = rewrite(text, &decisions(&[(CATEGORY_BACKEND, "X")]));
        assert_eq!(
            out.content,
            "## Phase : Conception\r\n### Quelles technologies et frameworks utiliser?\r\nBackend: X\r\nFrontend: Z\r\n"
        );
    }

    #[test]
    fn heading_on_last_line_without_newline() {
        let text = "## Phase : Conception\n### Quelles technologies et frameworks utiliser?";
        let out = rewrite(text, &decisions(&[(CATEGORY_BACKEND, "Node.js")]));
        assert_eq!(
            out.content,
            "## Phase : Conception\n### Quelles technologies et frameworks utiliser?\nBackend: Node.js"
        );
    }

    #[test]
    fn apply_to_file_writes_only_on_change() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("context.md");
        std::fs::write(&path, DOC).unwrap();

        let out = apply_to_file(&path, &decisions(&[(CATEGORY_BACKEND, "Node.js")])).unwrap();
        assert!(out.changed);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), out.content);

        let again = apply_to_file(&path, &decisions(&[(CATEGORY_BACKEND, "Node.js")])).unwrap();
        assert!(!again.changed);
    }

    #[test]
    fn apply_to_file_reports_read_failure() {
        let dir = TempDir::new().unwrap();
        let err = apply_to_file(
            &dir.path().join("missing.md"),
            &decisions(&[(CATEGORY_BACKEND, "Node.js")]),
        )
        .unwrap_err();
        assert!(matches!(err, AssistError::Read { .. }));
    }
}
