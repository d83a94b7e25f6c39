//! Error types for flashcard-core.

use thiserror::Error;

/// Errors raised by the study session state machine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("this study session belongs to deck {expected}, not deck {actual}")]
    SessionMismatch { expected: i64, actual: i64 },

    #[error("no active study session")]
    NoActiveSession,

    #[error("card {actual} is not the card being studied (expected card {expected})")]
    NotCurrentCard { expected: i64, actual: i64 },

    #[error("every card in this session has already been mastered")]
    AlreadyComplete,

    #[error("study session still has {remaining} card(s) to master")]
    NotComplete { remaining: usize },
}

/// Errors that can occur while validating a generated flashcard set.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("topic is empty")]
    EmptyTopic,

    #[error("flashcard set contains no flashcards")]
    NoFlashcards,

    #[error("flashcard {index} has an empty {field}")]
    EmptyField { index: usize, field: &'static str },
}
