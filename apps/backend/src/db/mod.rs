//! SQLite database operations

use std::str::FromStr;

use chrono::Utc;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};

use crate::error::{ApiError, Result};
use crate::models::*;
use flashcard_core::success_rate;

const DECK_COLUMNS: &str = "id, name, created_at";
const FLASHCARD_COLUMNS: &str =
    "id, deck_id, question, answer, created_at, studied_count, success_count, last_studied, streak";

/// Database wrapper with connection pool
#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Open (creating if necessary) the SQLite database at `database_url`
    pub async fn connect(database_url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(database_url)?
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        Ok(Self { pool })
    }

    /// Open a private in-memory database (for testing).
    ///
    /// Uses a single long-lived connection; every connection to `:memory:`
    /// would otherwise see its own empty database.
    pub async fn connect_in_memory() -> Result<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        Ok(Self { pool })
    }

    /// Run database migrations
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| ApiError::Migration(e.to_string()))?;
        Ok(())
    }

    /// Get the connection pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    // === Deck Repository ===

    /// Create an empty deck
    pub async fn create_deck(&self, name: &str) -> Result<Deck> {
        let deck = sqlx::query_as::<_, Deck>(&format!(
            "INSERT INTO decks (name, created_at) VALUES (?1, ?2) RETURNING {DECK_COLUMNS}"
        ))
        .bind(name)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| deck_name_conflict(e, name))?;

        Ok(deck)
    }

    /// Create a deck together with its flashcards in one transaction.
    ///
    /// Either the deck and every card are stored, or nothing is.
    pub async fn create_deck_with_flashcards(
        &self,
        name: &str,
        items: &[QAItem],
    ) -> Result<(Deck, Vec<Flashcard>)> {
        let mut tx = self.pool.begin().await?;
        let now = Utc::now();

        let deck = sqlx::query_as::<_, Deck>(&format!(
            "INSERT INTO decks (name, created_at) VALUES (?1, ?2) RETURNING {DECK_COLUMNS}"
        ))
        .bind(name)
        .bind(now)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| deck_name_conflict(e, name))?;

        let insert = format!(
            "INSERT INTO flashcards (deck_id, question, answer, created_at)
             VALUES (?1, ?2, ?3, ?4)
             RETURNING {FLASHCARD_COLUMNS}"
        );
        let mut flashcards = Vec::with_capacity(items.len());
        for item in items {
            let card = sqlx::query_as::<_, Flashcard>(&insert)
                .bind(deck.id)
                .bind(&item.question)
                .bind(&item.answer)
                .bind(now)
                .fetch_one(&mut *tx)
                .await?;
            flashcards.push(card);
        }

        tx.commit().await?;
        Ok((deck, flashcards))
    }

    /// Whether a deck with this name exists
    pub async fn deck_name_exists(&self, name: &str) -> Result<bool> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM decks WHERE name = ?1")
            .bind(name)
            .fetch_one(&self.pool)
            .await?;

        Ok(count > 0)
    }

    /// Get deck by ID
    pub async fn get_deck(&self, deck_id: i64) -> Result<Option<Deck>> {
        let deck = sqlx::query_as::<_, Deck>(&format!(
            "SELECT {DECK_COLUMNS} FROM decks WHERE id = ?1"
        ))
        .bind(deck_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(deck)
    }

    /// List all decks with card counts, newest first
    pub async fn list_decks(&self) -> Result<Vec<DeckInfo>> {
        let decks = sqlx::query_as::<_, DeckInfo>(
            r#"
            SELECT d.id, d.name, d.created_at, COUNT(f.id) AS card_count
            FROM decks d
            LEFT JOIN flashcards f ON f.deck_id = d.id
            GROUP BY d.id
            ORDER BY d.created_at DESC, d.id DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(decks)
    }

    /// Delete a deck and, by cascade, its flashcards
    pub async fn delete_deck(&self, deck_id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM decks WHERE id = ?1")
            .bind(deck_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    // === Flashcard Repository ===

    /// Add a flashcard to a deck
    pub async fn create_flashcard(
        &self,
        deck_id: i64,
        question: &str,
        answer: &str,
    ) -> Result<Flashcard> {
        let card = sqlx::query_as::<_, Flashcard>(&format!(
            "INSERT INTO flashcards (deck_id, question, answer, created_at)
             VALUES (?1, ?2, ?3, ?4)
             RETURNING {FLASHCARD_COLUMNS}"
        ))
        .bind(deck_id)
        .bind(question)
        .bind(answer)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(card)
    }

    /// Get flashcard by ID
    pub async fn get_flashcard(&self, card_id: i64) -> Result<Option<Flashcard>> {
        let card = sqlx::query_as::<_, Flashcard>(&format!(
            "SELECT {FLASHCARD_COLUMNS} FROM flashcards WHERE id = ?1"
        ))
        .bind(card_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(card)
    }

    /// Get a deck's flashcards in creation order
    pub async fn get_flashcards_by_deck(&self, deck_id: i64) -> Result<Vec<Flashcard>> {
        let cards = sqlx::query_as::<_, Flashcard>(&format!(
            "SELECT {FLASHCARD_COLUMNS} FROM flashcards
             WHERE deck_id = ?1
             ORDER BY created_at ASC, id ASC"
        ))
        .bind(deck_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(cards)
    }

    /// Save a flashcard's question and answer
    pub async fn update_flashcard(&self, card: &Flashcard) -> Result<Option<Flashcard>> {
        let card = sqlx::query_as::<_, Flashcard>(&format!(
            "UPDATE flashcards SET question = ?1, answer = ?2
             WHERE id = ?3
             RETURNING {FLASHCARD_COLUMNS}"
        ))
        .bind(&card.question)
        .bind(&card.answer)
        .bind(card.id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(card)
    }

    /// Record one graded attempt on a flashcard's statistics.
    ///
    /// A success extends the streak; a miss resets it.
    pub async fn record_study_result(
        &self,
        card_id: i64,
        success: bool,
    ) -> Result<Option<Flashcard>> {
        let card = sqlx::query_as::<_, Flashcard>(&record_result_sql())
            .bind(card_id)
            .bind(i64::from(success))
            .bind(Utc::now())
            .fetch_optional(&self.pool)
            .await?;

        Ok(card)
    }

    /// Record a batch of graded attempts in one transaction.
    ///
    /// Either every attempt is applied or none is. Returns the ids of
    /// attempted cards that no longer exist.
    pub async fn record_study_results(&self, attempts: &[StudyAttempt]) -> Result<Vec<i64>> {
        let mut tx = self.pool.begin().await?;
        let now = Utc::now();
        let sql = record_result_sql();

        let mut missing = Vec::new();
        for attempt in attempts {
            let card = sqlx::query_as::<_, Flashcard>(&sql)
                .bind(attempt.card_id)
                .bind(i64::from(attempt.success))
                .bind(now)
                .fetch_optional(&mut *tx)
                .await?;
            if card.is_none() {
                missing.push(attempt.card_id);
            }
        }

        tx.commit().await?;
        Ok(missing)
    }

    /// Delete a flashcard
    pub async fn delete_flashcard(&self, card_id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM flashcards WHERE id = ?1")
            .bind(card_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    // === Stats Repository ===

    /// Aggregate study statistics for one deck
    pub async fn get_deck_stats(&self, deck_id: i64) -> Result<DeckStats> {
        let (card_count, total_studies, total_successes, cards_on_streak) =
            sqlx::query_as::<_, (i64, i64, i64, i64)>(
                r#"
                SELECT
                    COUNT(*),
                    COALESCE(SUM(studied_count), 0),
                    COALESCE(SUM(success_count), 0),
                    COALESCE(SUM(CASE WHEN streak > 0 THEN 1 ELSE 0 END), 0)
                FROM flashcards
                WHERE deck_id = ?1
                "#,
            )
            .bind(deck_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(DeckStats {
            deck_id,
            card_count,
            total_studies,
            total_successes,
            success_rate: studied_rate(total_successes, total_studies),
            cards_on_streak,
        })
    }

    /// Aggregate study statistics across all decks
    pub async fn get_overall_stats(&self) -> Result<OverallStats> {
        let (deck_count, card_count, total_studies, total_successes) =
            sqlx::query_as::<_, (i64, i64, i64, i64)>(
                r#"
                SELECT
                    (SELECT COUNT(*) FROM decks),
                    COUNT(*),
                    COALESCE(SUM(studied_count), 0),
                    COALESCE(SUM(success_count), 0)
                FROM flashcards
                "#,
            )
            .fetch_one(&self.pool)
            .await?;

        Ok(OverallStats {
            deck_count,
            card_count,
            total_studies,
            total_successes,
            success_rate: studied_rate(total_successes, total_studies),
        })
    }
}

fn record_result_sql() -> String {
    format!(
        "UPDATE flashcards
         SET studied_count = studied_count + 1,
             success_count = success_count + ?2,
             last_studied = ?3,
             streak = CASE WHEN ?2 = 1 THEN streak + 1 ELSE 0 END
         WHERE id = ?1
         RETURNING {FLASHCARD_COLUMNS}"
    )
}

fn studied_rate(successes: i64, studies: i64) -> Option<f64> {
    (studies > 0).then(|| success_rate(successes as usize, studies as usize))
}

fn deck_name_conflict(err: sqlx::Error, name: &str) -> ApiError {
    match err {
        sqlx::Error::Database(ref db) if db.is_unique_violation() => {
            ApiError::Conflict(format!("A deck named '{name}' already exists"))
        }
        other => ApiError::Database(other),
    }
}
