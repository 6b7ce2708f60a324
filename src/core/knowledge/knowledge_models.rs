// Domain models for the question-answering knowledge base.
// Nothing in here knows about files, HTTP or terminals - the JSON shape is
// derived with serde so the infra layer can read and write it directly.

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ============================================================================
// STORED DATA
// ============================================================================

/// A single taught question and its answer.
///
/// Pairs are never edited after they are created. The knowledge base only
/// grows by appending new pairs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct QAPair {
    pub question: String,
    pub answer: String,
}

/// Everything the bot has been taught, in insertion order.
///
/// **On disk:**
/// ```json
/// { "questions": [ { "question": "...", "answer": "..." } ] }
/// ```
///
/// Duplicate questions are legal. Lookups always resolve to the first one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct KnowledgeBase {
    questions: Vec<QAPair>,
}

/// Rejected caller input. Nothing is embedded or stored when this is returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidInput {
    #[error("question must not be empty")]
    EmptyQuestion,
    #[error("query must not be empty")]
    EmptyQuery,
}

impl KnowledgeBase {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub fn from_pairs(pairs: Vec<QAPair>) -> Self {
        Self { questions: pairs }
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    /// All question texts in insertion order. These are the matcher's candidates.
    pub fn questions(&self) -> Vec<String> {
        self.questions.iter().map(|p| p.question.clone()).collect()
    }

    /// Append a new pair. Whitespace-only questions are rejected and the
    /// base is left untouched.
    pub fn append(
        &mut self,
        question: impl Into<String>,
        answer: impl Into<String>,
    ) -> Result<(), InvalidInput> {
        let question = question.into();
        if question.trim().is_empty() {
            return Err(InvalidInput::EmptyQuestion);
        }

        self.questions.push(QAPair {
            question,
            answer: answer.into(),
        });
        Ok(())
    }

    /// Exact, case-sensitive lookup. The first matching pair wins.
    pub fn answer_for(&self, question: &str) -> Option<&str> {
        self.questions
            .iter()
            .find(|p| p.question == question)
            .map(|p| p.answer.as_str())
    }

    /// Pairs carrying an empty question. Older files may contain these since
    /// they used to be stored unconditionally.
    pub fn blank_question_count(&self) -> usize {
        self.questions
            .iter()
            .filter(|p| p.question.trim().is_empty())
            .count()
    }
}

// ============================================================================
// MATCHING RESULTS
// ============================================================================

/// Outcome of comparing a query against the stored questions.
#[derive(Debug, Clone, PartialEq)]
pub enum MatchResult {
    /// The best candidate scored strictly above the threshold.
    Matched { question: String, score: f32 },
    NoMatch,
}

/// What the front ends send back to the user.
///
/// `needs_teaching` is true exactly when the matcher found nothing, so the
/// caller can offer to teach a new pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatReply {
    pub response: String,
    pub needs_teaching: bool,
}

impl ChatReply {
    pub fn answer(response: impl Into<String>) -> Self {
        Self {
            response: response.into(),
            needs_teaching: false,
        }
    }

    pub fn teach_me(response: impl Into<String>) -> Self {
        Self {
            response: response.into(),
            needs_teaching: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn append_then_lookup_returns_answer() {
        let mut base = KnowledgeBase::new();
        base.append("What is X?", "X is Y").unwrap();

        assert_eq!(base.answer_for("What is X?"), Some("X is Y"));
        assert_eq!(base.len(), 1);
    }

    #[test]
    fn lookup_is_exact_and_case_sensitive() {
        let mut base = KnowledgeBase::new();
        base.append("What is X?", "X is Y").unwrap();

        assert_eq!(base.answer_for("what is x?"), None);
        assert_eq!(base.answer_for("What is X"), None);
    }

    #[test]
    fn duplicate_questions_resolve_to_first() {
        let mut base = KnowledgeBase::new();
        base.append("Hi", "first").unwrap();
        base.append("Hi", "second").unwrap();

        assert_eq!(base.len(), 2);
        assert_eq!(base.answer_for("Hi"), Some("first"));
    }

    #[test]
    fn blank_questions_are_rejected_without_mutation() {
        let mut base = KnowledgeBase::new();
        base.append("Kept", "yes").unwrap();

        assert_eq!(base.append("", "nope"), Err(InvalidInput::EmptyQuestion));
        assert_eq!(base.append(" \t\n", "nope"), Err(InvalidInput::EmptyQuestion));
        assert_eq!(base.len(), 1);
    }

    #[test]
    fn empty_answers_are_allowed() {
        let mut base = KnowledgeBase::new();
        base.append("Silent?", "").unwrap();
        assert_eq!(base.answer_for("Silent?"), Some(""));
    }

    #[test]
    fn serializes_to_questions_array() {
        let mut base = KnowledgeBase::new();
        base.append("Q", "A").unwrap();

        let json = serde_json::to_value(&base).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "questions": [ { "question": "Q", "answer": "A" } ] })
        );
    }

    #[test]
    fn rejects_extra_fields() {
        let raw = r#"{ "questions": [ { "question": "Q", "answer": "A", "score": 1 } ] }"#;
        assert!(serde_json::from_str::<KnowledgeBase>(raw).is_err());

        let raw = r#"{ "questions": [], "version": 2 }"#;
        assert!(serde_json::from_str::<KnowledgeBase>(raw).is_err());
    }

    #[test]
    fn counts_legacy_blank_questions() {
        let base = KnowledgeBase::from_pairs(vec![
            QAPair {
                question: String::new(),
                answer: "legacy".into(),
            },
            QAPair {
                question: "Real".into(),
                answer: "ok".into(),
            },
        ]);
        assert_eq!(base.blank_question_count(), 1);
    }

    #[test]
    fn chat_reply_wire_shape() {
        let reply = ChatReply::teach_me("teach me");
        let json = serde_json::to_value(&reply).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "response": "teach me", "needs_teaching": true })
        );
    }
}
