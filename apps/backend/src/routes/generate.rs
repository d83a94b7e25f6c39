//! Flashcard generation endpoint

use axum::{extract::State, http::StatusCode, Json};

use crate::error::{ApiError, Result};
use crate::models::*;
use crate::AppState;

/// POST /api/generate
///
/// Generates flashcards from the notes and stores them as a new deck named
/// after the topic. Nothing is stored unless generation succeeds.
pub async fn generate(
    State(state): State<AppState>,
    Json(payload): Json<GenerateRequest>,
) -> Result<(StatusCode, Json<DeckDetailResponse>)> {
    let notes = payload.notes.trim();
    let topic = payload.topic.trim();

    if notes.is_empty() {
        return Err(ApiError::BadRequest("Notes must not be empty".to_string()));
    }
    if topic.is_empty() {
        return Err(ApiError::BadRequest("Topic must not be empty".to_string()));
    }

    if state.db.deck_name_exists(topic).await? {
        return Err(ApiError::Conflict(format!(
            "A deck named '{}' already exists",
            topic
        )));
    }

    let generator = state.generator.clone();
    let set = state
        .retry
        .execute(|| {
            let generator = generator.clone();
            async move { generator.generate(notes, topic).await }
        })
        .await?;

    tracing::info!(topic, count = set.items.len(), "Storing generated deck");

    let (deck, flashcards) = state
        .db
        .create_deck_with_flashcards(topic, &set.items)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(DeckDetailResponse { deck, flashcards }),
    ))
}
