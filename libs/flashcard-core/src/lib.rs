//! Core flashcard library used by the backend service.
//!
//! Provides:
//! - Flashcard payload types and validation for generated decks
//! - The study session state machine that re-queues missed cards
//! - Summary statistics computed from a session's attempt log

pub mod error;
pub mod session;
pub mod summary;
pub mod types;

pub use error::{SessionError, ValidationError};
pub use session::{SessionCard, SessionStatus, StudySession};
pub use summary::{success_rate, CardPracticeNote, SessionSummary};
pub use types::{FlashcardSet, QAItem, StudyAttempt, MAX_FLASHCARDS};
