pub mod decks;
pub mod flashcards;
pub mod generate;
pub mod stats;
pub mod study;
