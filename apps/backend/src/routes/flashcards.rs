//! Flashcard endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::error::{ApiError, Result};
use crate::models::*;
use crate::routes::decks::find_deck;
use crate::AppState;

/// POST /api/decks/:deck_id/flashcards
pub async fn create(
    State(state): State<AppState>,
    Path(deck_id): Path<i64>,
    Json(payload): Json<CreateFlashcardRequest>,
) -> Result<(StatusCode, Json<Flashcard>)> {
    find_deck(&state, deck_id).await?;

    let question = non_blank("question", &payload.question)?;
    let answer = non_blank("answer", &payload.answer)?;

    let card = state.db.create_flashcard(deck_id, question, answer).await?;
    Ok((StatusCode::CREATED, Json(card)))
}

/// PATCH /api/flashcards/:card_id
pub async fn update(
    State(state): State<AppState>,
    Path(card_id): Path<i64>,
    Json(payload): Json<FlashcardUpdate>,
) -> Result<Json<Flashcard>> {
    if payload.is_empty() {
        return Err(ApiError::BadRequest("No fields to update".to_string()));
    }

    let update = FlashcardUpdate {
        question: payload
            .question
            .as_deref()
            .map(|q| non_blank("question", q).map(str::to_string))
            .transpose()?,
        answer: payload
            .answer
            .as_deref()
            .map(|a| non_blank("answer", a).map(str::to_string))
            .transpose()?,
    };

    let mut card = state
        .db
        .get_flashcard(card_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Flashcard {}", card_id)))?;

    update.apply_to(&mut card);

    let card = state
        .db
        .update_flashcard(&card)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Flashcard {}", card_id)))?;

    Ok(Json(card))
}

/// DELETE /api/flashcards/:card_id
pub async fn delete(
    State(state): State<AppState>,
    Path(card_id): Path<i64>,
) -> Result<StatusCode> {
    if !state.db.delete_flashcard(card_id).await? {
        return Err(ApiError::NotFound(format!("Flashcard {}", card_id)));
    }
    Ok(StatusCode::NO_CONTENT)
}

fn non_blank<'a>(field: &str, value: &'a str) -> Result<&'a str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ApiError::BadRequest(format!("{} must not be empty", field)));
    }
    Ok(trimmed)
}
