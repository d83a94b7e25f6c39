//! Test fixtures and factory functions for creating test data.

use serde_json::json;

use ai_flashcards_backend::models::{FlashcardSet, QAItem, StudyAttempt};

/// Numbered question/answer pairs.
pub fn qa_items(n: usize) -> Vec<QAItem> {
    (1..=n)
        .map(|i| QAItem::new(format!("Question {}?", i), format!("Answer {}.", i)))
        .collect()
}

/// A generated flashcard set with `n` numbered items.
pub fn sample_set(topic: &str, n: usize) -> FlashcardSet {
    FlashcardSet {
        topic: topic.to_string(),
        items: qa_items(n),
    }
}

pub fn generate_request(notes: &str, topic: &str) -> serde_json::Value {
    json!({ "notes": notes, "topic": topic })
}

pub fn grade_request(card_id: i64, success: bool) -> serde_json::Value {
    json!({ "card_id": card_id, "success": success })
}

pub fn attempt(card_id: i64, success: bool) -> StudyAttempt {
    StudyAttempt {
        card_id,
        success,
        question: format!("Question for card {}?", card_id),
    }
}
