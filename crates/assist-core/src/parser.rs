use crate::document::{classify_line, Line, ParsedDocument, Phase, QuestionAnswer};
use crate::error::{AssistError, Result};

/// Parse a project-context document.
///
/// Malformed lines never fail the parse: a question heading with no open
/// phase is dropped, and body lines outside a question are discarded. Blank
/// lines are skipped without closing the current answer. The only failure
/// is a document with neither a project title nor any phase.
pub fn parse(text: &str) -> Result<ParsedDocument> {
    let mut doc = ParsedDocument::default();
    // Cursor into the last phase's questions; reset by every phase heading.
    let mut question_open = false;

    for raw in text.lines() {
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }
        match classify_line(line) {
            Line::Project(name) => {
                doc.project_name = Some(name.to_string());
            }
            Line::Phase(title) => {
                doc.phases.push(Phase {
                    title: title.to_string(),
                    questions: Vec::new(),
                });
                question_open = false;
            }
            Line::Question(text) => {
                if let Some(phase) = doc.phases.last_mut() {
                    phase.questions.push(QuestionAnswer::new(text));
                    question_open = true;
                }
            }
            Line::Body => {
                if !question_open {
                    continue;
                }
                if let Some(question) = doc
                    .phases
                    .last_mut()
                    .and_then(|p| p.questions.last_mut())
                {
                    question.push_line(line);
                }
            }
        }
    }

    if doc.project_name.is_none() && doc.phases.is_empty() {
        return Err(AssistError::Parse);
    }
    Ok(doc)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
