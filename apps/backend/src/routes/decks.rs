//! Deck endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::error::{ApiError, Result};
use crate::models::*;
use crate::AppState;

/// GET /api/decks
pub async fn list(State(state): State<AppState>) -> Result<Json<DeckListResponse>> {
    let decks = state.db.list_decks().await?;
    Ok(Json(DeckListResponse { decks }))
}

/// POST /api/decks
pub async fn create(
    State(state): State<AppState>,
    Json(payload): Json<CreateDeckRequest>,
) -> Result<(StatusCode, Json<Deck>)> {
    let name = payload.name.trim();
    if name.is_empty() {
        return Err(ApiError::BadRequest("Deck name must not be empty".to_string()));
    }

    let deck = state.db.create_deck(name).await?;
    Ok((StatusCode::CREATED, Json(deck)))
}

/// GET /api/decks/:deck_id
pub async fn get(
    State(state): State<AppState>,
    Path(deck_id): Path<i64>,
) -> Result<Json<DeckDetailResponse>> {
    let deck = find_deck(&state, deck_id).await?;
    let flashcards = state.db.get_flashcards_by_deck(deck_id).await?;
    Ok(Json(DeckDetailResponse { deck, flashcards }))
}

/// DELETE /api/decks/:deck_id
pub async fn delete(
    State(state): State<AppState>,
    Path(deck_id): Path<i64>,
) -> Result<StatusCode> {
    if !state.db.delete_deck(deck_id).await? {
        return Err(ApiError::NotFound(format!("Deck {}", deck_id)));
    }
    tracing::info!(deck_id, "Deleted deck");
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/decks/:deck_id/stats
pub async fn stats(
    State(state): State<AppState>,
    Path(deck_id): Path<i64>,
) -> Result<Json<DeckStats>> {
    find_deck(&state, deck_id).await?;
    let stats = state.db.get_deck_stats(deck_id).await?;
    Ok(Json(stats))
}

/// Load a deck or fail with `NotFound`.
pub(crate) async fn find_deck(state: &AppState, deck_id: i64) -> Result<Deck> {
    state
        .db
        .get_deck(deck_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Deck {}", deck_id)))
}
