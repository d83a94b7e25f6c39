//! Common test utilities for integration tests.
//!
//! Every `TestContext` owns a private in-memory SQLite database and a stub
//! generator, so tests need no external services and can run in parallel.

#![allow(dead_code)]

pub mod fixtures;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum_test::TestServer;

use ai_flashcards_backend::db::Database;
use ai_flashcards_backend::models::FlashcardSet;
use ai_flashcards_backend::services::generator::{FlashcardGenerator, ProviderError};
use ai_flashcards_backend::services::retry::RetryPolicy;
use ai_flashcards_backend::{router, AppState};

/// Generator that replays a fixed outcome and counts its calls.
pub struct StubGenerator {
    outcome: Result<FlashcardSet, ProviderError>,
    calls: AtomicUsize,
}

impl StubGenerator {
    pub fn succeeding(set: FlashcardSet) -> Self {
        Self {
            outcome: Ok(set),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing(error: ProviderError) -> Self {
        Self {
            outcome: Err(error),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl FlashcardGenerator for StubGenerator {
    async fn generate(&self, _notes: &str, _topic: &str) -> Result<FlashcardSet, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.outcome.clone()
    }
}

/// Retry policy with the default attempt count and no waiting.
pub fn instant_retry(max_retries: u32) -> RetryPolicy {
    RetryPolicy {
        max_retries,
        base_delay: Duration::ZERO,
        max_jitter: Duration::ZERO,
    }
}

/// Test context containing the database, generator stub and test server.
pub struct TestContext {
    pub db: Arc<Database>,
    pub generator: Arc<StubGenerator>,
    pub server: TestServer,
}

impl TestContext {
    /// Create a context whose generator returns the sample flashcard set.
    pub async fn new() -> Self {
        Self::with_generator(StubGenerator::succeeding(fixtures::sample_set("Biology", 3)), 3)
            .await
    }

    /// Create a context around a specific generator and retry budget.
    pub async fn with_generator(generator: StubGenerator, max_retries: u32) -> Self {
        let db = Database::connect_in_memory()
            .await
            .expect("Failed to open in-memory database");

        db.run_migrations()
            .await
            .expect("Failed to run migrations");

        let generator = Arc::new(generator);
        let state = AppState::new(db, generator.clone(), instant_retry(max_retries));
        let db = state.db.clone();

        let server = TestServer::new(router(state)).expect("Failed to start test server");

        Self {
            db,
            generator,
            server,
        }
    }

    /// Insert a deck with `n` numbered cards directly, returning the deck id
    /// and card ids in creation order.
    pub async fn seed_deck(&self, name: &str, n: usize) -> (i64, Vec<i64>) {
        let (deck, cards) = self
            .db
            .create_deck_with_flashcards(name, &fixtures::qa_items(n))
            .await
            .expect("Failed to seed deck");
        (deck.id, cards.into_iter().map(|c| c.id).collect())
    }

    pub async fn row_counts(&self) -> (i64, i64) {
        let decks: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM decks")
            .fetch_one(self.db.pool())
            .await
            .expect("Failed to count decks");
        let cards: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM flashcards")
            .fetch_one(self.db.pool())
            .await
            .expect("Failed to count flashcards");
        (decks, cards)
    }
}
