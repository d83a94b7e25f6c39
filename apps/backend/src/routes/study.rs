//! Study endpoints

use std::collections::HashSet;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::error::{ApiError, Result};
use crate::models::*;
use crate::routes::decks::find_deck;
use crate::AppState;
use flashcard_core::SessionError;

/// POST /api/decks/:deck_id/study
pub async fn open(
    State(state): State<AppState>,
    Path(deck_id): Path<i64>,
) -> Result<(StatusCode, Json<SessionView>)> {
    find_deck(&state, deck_id).await?;

    let cards = state
        .db
        .get_flashcards_by_deck(deck_id)
        .await?
        .iter()
        .map(Flashcard::to_session_card)
        .collect();

    let view = state.sessions.open(deck_id, cards).await;
    Ok((StatusCode::CREATED, Json(view)))
}

/// GET /api/decks/:deck_id/study/:session_id
pub async fn view(
    State(state): State<AppState>,
    Path((deck_id, session_id)): Path<(i64, Uuid)>,
) -> Result<Json<SessionView>> {
    let view = state.sessions.view(session_id, deck_id).await?;
    Ok(Json(view))
}

/// POST /api/decks/:deck_id/study/:session_id/grade
pub async fn grade(
    State(state): State<AppState>,
    Path((deck_id, session_id)): Path<(i64, Uuid)>,
    Json(payload): Json<GradeRequest>,
) -> Result<Json<GradeResponse>> {
    // The session only advances once the card statistics are stored.
    state
        .sessions
        .check_grade(session_id, deck_id, payload.card_id)
        .await?;

    if state
        .db
        .record_study_result(payload.card_id, payload.success)
        .await?
        .is_none()
    {
        tracing::warn!(
            card_id = payload.card_id,
            "Graded card no longer exists; statistics not recorded"
        );
    }

    let (attempt, session) = state
        .sessions
        .grade(session_id, deck_id, payload.card_id, payload.success)
        .await?;

    Ok(Json(GradeResponse { attempt, session }))
}

/// POST /api/decks/:deck_id/study/:session_id/summary
pub async fn summary(
    State(state): State<AppState>,
    Path((deck_id, session_id)): Path<(i64, Uuid)>,
) -> Result<Json<SessionSummary>> {
    let summary = state.sessions.summarize(session_id, deck_id).await?;

    tracing::info!(
        %session_id,
        deck_id,
        attempts = summary.total_attempts,
        success_rate = summary.success_rate,
        "Study session finished"
    );

    Ok(Json(summary))
}

/// DELETE /api/decks/:deck_id/study/:session_id
pub async fn close(
    State(state): State<AppState>,
    Path((deck_id, session_id)): Path<(i64, Uuid)>,
) -> Result<StatusCode> {
    state.sessions.close(session_id, deck_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/decks/:deck_id/study/results
///
/// Accepts a whole session tracked by the client. The summary is recomputed
/// from the attempts; client totals are only cross-checked.
pub async fn submit_results(
    State(state): State<AppState>,
    Path(deck_id): Path<i64>,
    Json(payload): Json<SubmitResultsRequest>,
) -> Result<Json<SessionSummary>> {
    find_deck(&state, deck_id).await?;

    let deck_cards: HashSet<i64> = state
        .db
        .get_flashcards_by_deck(deck_id)
        .await?
        .iter()
        .map(|card| card.id)
        .collect();

    for result in &payload.results {
        if deck_cards.contains(&result.card_id) {
            continue;
        }
        return match state.db.get_flashcard(result.card_id).await? {
            Some(card) => Err(SessionError::SessionMismatch {
                expected: deck_id,
                actual: card.deck_id,
            }
            .into()),
            None => Err(ApiError::NotFound(format!("Flashcard {}", result.card_id))),
        };
    }

    for card_id in state.db.record_study_results(&payload.results).await? {
        tracing::warn!(card_id, "Graded card no longer exists; statistics not recorded");
    }

    let summary = SessionSummary::from_attempts(&payload.results);

    if let Some(reported) = payload.total_attempts {
        if reported != summary.total_attempts {
            tracing::warn!(
                deck_id,
                reported,
                actual = summary.total_attempts,
                "Client-reported attempt total disagrees with results"
            );
        }
    }
    if let Some(reported) = payload.cards_mastered {
        let actual = SessionSummary::mastered_in(&payload.results);
        if reported != actual {
            tracing::warn!(
                deck_id,
                reported,
                actual,
                "Client-reported mastered count disagrees with results"
            );
        }
    }

    Ok(Json(summary))
}
