use crate::document::{ParsedDocument, Phase, QuestionAnswer};

/// Keyword pair addressing one answer of the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Lookup {
    pub phase: &'static str,
    pub question: &'static str,
}

/// A located answer together with the headings it was found under.
#[derive(Debug, Clone, Copy)]
pub struct Located<'a> {
    pub phase: &'a Phase,
    pub question: &'a QuestionAnswer,
}

impl<'a> Located<'a> {
    pub fn response(&self) -> &'a str {
        &self.question.response
    }
}

/// Find the first question whose text contains `question_keyword`, inside a
/// phase whose title contains `phase_keyword`. Both comparisons are
/// case-insensitive substring tests. Phases are visited in document order and
/// the search moves on to the next matching phase when one has no match.
pub fn locate<'a>(
    doc: &'a ParsedDocument,
    phase_keyword: &str,
    question_keyword: &str,
) -> Option<Located<'a>> {
    let phase_kw = phase_keyword.to_lowercase();
    let question_kw = question_keyword.to_lowercase();
    doc.phases
        .iter()
        .filter(|p| p.title.to_lowercase().contains(&phase_kw))
        .find_map(|phase| {
            phase
                .questions
                .iter()
                .find(|q| q.text.to_lowercase().contains(&question_kw))
                .map(|question| Located { phase, question })
        })
}

/// Response text of the located answer. `Some("")` is a found-but-empty
/// answer, distinct from `None`.
pub fn find_answer<'a>(
    doc: &'a ParsedDocument,
    phase_keyword: &str,
    question_keyword: &str,
) -> Option<&'a str> {
    locate(doc, phase_keyword, question_keyword).map(|l| l.response())
}

impl Lookup {
    /// Locate this answer, treating an empty response as absent.
    pub fn resolve<'a>(&self, doc: &'a ParsedDocument) -> Option<Located<'a>> {
        locate(doc, self.phase, self.question).filter(|l| !l.response().is_empty())
    }
}
