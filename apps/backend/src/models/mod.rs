//! Database models and API types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

// Re-export shared types from flashcard-core
pub use flashcard_core::{
    CardPracticeNote, FlashcardSet, QAItem, SessionCard, SessionStatus, SessionSummary,
    StudyAttempt,
};

pub use crate::services::sessions::SessionView;

// === Database Entity Types ===

/// Deck stored in SQLite
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Deck {
    pub id: i64,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// Deck with its card count, for listings
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DeckInfo {
    pub id: i64,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub card_count: i64,
}

/// Flashcard stored in SQLite
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Flashcard {
    pub id: i64,
    pub deck_id: i64,
    pub question: String,
    pub answer: String,
    pub created_at: DateTime<Utc>,
    pub studied_count: i64,
    pub success_count: i64,
    pub last_studied: Option<DateTime<Utc>>,
    pub streak: i64,
}

impl Flashcard {
    /// Convert to the card shape used by study sessions
    pub fn to_session_card(&self) -> SessionCard {
        SessionCard {
            id: self.id,
            question: self.question.clone(),
        }
    }
}

/// Partial flashcard update. Only the fields that are set are changed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FlashcardUpdate {
    pub question: Option<String>,
    pub answer: Option<String>,
}

impl FlashcardUpdate {
    pub fn is_empty(&self) -> bool {
        self.question.is_none() && self.answer.is_none()
    }

    /// Apply the set fields onto `card`.
    pub fn apply_to(self, card: &mut Flashcard) {
        if let Some(question) = self.question {
            card.question = question;
        }
        if let Some(answer) = self.answer {
            card.answer = answer;
        }
    }
}

// === Statistics ===

/// Per-deck study statistics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeckStats {
    pub deck_id: i64,
    pub card_count: i64,
    pub total_studies: i64,
    pub total_successes: i64,
    /// `None` until a card in the deck has been studied
    pub success_rate: Option<f64>,
    pub cards_on_streak: i64,
}

/// Statistics across all decks
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OverallStats {
    pub deck_count: i64,
    pub card_count: i64,
    pub total_studies: i64,
    pub total_successes: i64,
    pub success_rate: Option<f64>,
}

// === API Request/Response Types ===

// Generation types
#[derive(Debug, Serialize, Deserialize)]
pub struct GenerateRequest {
    pub notes: String,
    pub topic: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DeckDetailResponse {
    pub deck: Deck,
    pub flashcards: Vec<Flashcard>,
}

// Deck types
#[derive(Debug, Serialize, Deserialize)]
pub struct CreateDeckRequest {
    pub name: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DeckListResponse {
    pub decks: Vec<DeckInfo>,
}

// Flashcard types
#[derive(Debug, Serialize, Deserialize)]
pub struct CreateFlashcardRequest {
    pub question: String,
    pub answer: String,
}

// Study types
#[derive(Debug, Serialize, Deserialize)]
pub struct GradeRequest {
    pub card_id: i64,
    pub success: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GradeResponse {
    pub attempt: StudyAttempt,
    pub session: SessionView,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SubmitResultsRequest {
    pub results: Vec<StudyAttempt>,
    #[serde(default)]
    pub total_attempts: Option<usize>,
    #[serde(default)]
    pub cards_mastered: Option<usize>,
}
