//! Core types for flashcard application.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Upper bound on flashcards kept from a single generation.
pub const MAX_FLASHCARDS: usize = 10;

/// A single question/answer pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QAItem {
    pub question: String,
    pub answer: String,
}

impl QAItem {
    pub fn new(question: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            answer: answer.into(),
        }
    }
}

/// Flashcards produced by one generation call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlashcardSet {
    pub topic: String,
    pub items: Vec<QAItem>,
}

impl FlashcardSet {
    /// Trim and check a freshly generated set.
    ///
    /// Every question and answer must be non-blank and at least one pair
    /// must be present. Pairs beyond [`MAX_FLASHCARDS`] are dropped.
    pub fn validated(self) -> Result<Self, ValidationError> {
        let topic = self.topic.trim().to_string();
        if topic.is_empty() {
            return Err(ValidationError::EmptyTopic);
        }
        if self.items.is_empty() {
            return Err(ValidationError::NoFlashcards);
        }

        let mut items = Vec::with_capacity(self.items.len().min(MAX_FLASHCARDS));
        for (i, item) in self.items.into_iter().take(MAX_FLASHCARDS).enumerate() {
            let question = item.question.trim();
            let answer = item.answer.trim();
            if question.is_empty() {
                return Err(ValidationError::EmptyField {
                    index: i + 1,
                    field: "question",
                });
            }
            if answer.is_empty() {
                return Err(ValidationError::EmptyField {
                    index: i + 1,
                    field: "answer",
                });
            }
            items.push(QAItem::new(question, answer));
        }

        Ok(Self { topic, items })
    }
}

/// One grading action recorded during a study session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudyAttempt {
    pub card_id: i64,
    pub success: bool,
    pub question: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn set_of(n: usize) -> FlashcardSet {
        FlashcardSet {
            topic: "Rust".to_string(),
            items: (1..=n)
                .map(|i| QAItem::new(format!("Question {i}?"), format!("Answer {i}.")))
                .collect(),
        }
    }

    #[test]
    fn validated_trims_whitespace() {
        let set = FlashcardSet {
            topic: "  Ownership ".to_string(),
            items: vec![QAItem::new(" What moves? ", "\tValues without Copy.\n")],
        };
        let set = set.validated().unwrap();
        assert_eq!(set.topic, "Ownership");
        assert_eq!(set.items, vec![QAItem::new("What moves?", "Values without Copy.")]);
    }

    #[test]
    fn validated_keeps_at_most_ten() {
        let set = set_of(13).validated().unwrap();
        assert_eq!(set.items.len(), MAX_FLASHCARDS);
        assert_eq!(set.items[9].question, "Question 10?");
    }

    #[test]
    fn validated_rejects_empty_set() {
        assert_eq!(set_of(0).validated(), Err(ValidationError::NoFlashcards));
    }

    #[test]
    fn validated_rejects_blank_topic() {
        let mut set = set_of(2);
        set.topic = "   ".to_string();
        assert_eq!(set.validated(), Err(ValidationError::EmptyTopic));
    }

    #[test]
    fn validated_rejects_blank_answer() {
        let mut set = set_of(3);
        set.items[1].answer = " ".to_string();
        assert_eq!(
            set.validated(),
            Err(ValidationError::EmptyField {
                index: 2,
                field: "answer"
            })
        );
    }

    #[test]
    fn study_attempt_json_shape() {
        let attempt: StudyAttempt =
            serde_json::from_str(r#"{"card_id": 7, "success": false, "question": "Why?"}"#)
                .unwrap();
        assert_eq!(
            attempt,
            StudyAttempt {
                card_id: 7,
                success: false,
                question: "Why?".to_string()
            }
        );
    }
}
