//! Study session API tests.

mod common;

use axum::http::StatusCode;
use serde_json::{json, Value};

use common::fixtures;
use common::TestContext;

async fn open_session(ctx: &TestContext, deck_id: i64) -> Value {
    let response = ctx
        .server
        .post(&format!("/api/decks/{}/study", deck_id))
        .await;
    response.assert_status(StatusCode::CREATED);
    response.json()
}

async fn grade(ctx: &TestContext, deck_id: i64, session_id: &str, card_id: i64, success: bool) -> Value {
    let response = ctx
        .server
        .post(&format!("/api/decks/{}/study/{}/grade", deck_id, session_id))
        .json(&fixtures::grade_request(card_id, success))
        .await;
    response.assert_status_ok();
    response.json()
}

#[tokio::test]
async fn test_open_session_presents_first_card() {
    let ctx = TestContext::new().await;
    let (deck_id, card_ids) = ctx.seed_deck("Rust", 3).await;

    let view = open_session(&ctx, deck_id).await;

    assert_eq!(view["deck_id"], deck_id);
    assert_eq!(view["status"], "active");
    assert_eq!(view["remaining"], 3);
    assert_eq!(view["attempts"], 0);
    assert_eq!(view["current_card"]["id"], card_ids[0]);
    assert_eq!(view["current_card"]["question"], "Question 1?");
}

#[tokio::test]
async fn test_empty_deck_opens_complete() {
    let ctx = TestContext::new().await;
    let (deck_id, _) = ctx.seed_deck("Empty", 0).await;

    let view = open_session(&ctx, deck_id).await;
    assert_eq!(view["status"], "complete");
    assert!(view["current_card"].is_null());

    let session_id = view["session_id"].as_str().unwrap();
    let response = ctx
        .server
        .post(&format!("/api/decks/{}/study/{}/summary", deck_id, session_id))
        .await;
    response.assert_status_ok();
    let summary: Value = response.json();
    assert_eq!(summary["total_attempts"], 0);
    assert_eq!(summary["success_rate"], 100.0);
}

#[tokio::test]
async fn test_open_session_for_missing_deck() {
    let ctx = TestContext::new().await;
    let response = ctx.server.post("/api/decks/77/study").await;
    response.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_full_session_requeues_missed_card() {
    let ctx = TestContext::new().await;
    let (deck_id, ids) = ctx.seed_deck("Rust", 3).await;
    let (a, b, c) = (ids[0], ids[1], ids[2]);

    let view = open_session(&ctx, deck_id).await;
    let session_id = view["session_id"].as_str().unwrap().to_string();

    let body = grade(&ctx, deck_id, &session_id, a, true).await;
    assert_eq!(body["attempt"]["card_id"], a);
    assert_eq!(body["session"]["current_card"]["id"], b);

    let body = grade(&ctx, deck_id, &session_id, b, false).await;
    assert_eq!(body["attempt"]["success"], false);
    assert_eq!(body["session"]["current_card"]["id"], c);
    assert_eq!(body["session"]["remaining"], 2);

    let body = grade(&ctx, deck_id, &session_id, c, true).await;
    assert_eq!(body["session"]["current_card"]["id"], b);

    let body = grade(&ctx, deck_id, &session_id, b, true).await;
    assert_eq!(body["session"]["status"], "complete");
    assert_eq!(body["session"]["attempts"], 4);
    assert_eq!(body["session"]["mastered"], 3);

    let response = ctx
        .server
        .post(&format!("/api/decks/{}/study/{}/summary", deck_id, session_id))
        .await;
    response.assert_status_ok();
    let summary: Value = response.json();
    assert_eq!(summary["total_unique_cards"], 3);
    assert_eq!(summary["total_attempts"], 4);
    assert_eq!(summary["success_count"], 3);
    assert_eq!(summary["needs_practice_count"], 1);
    assert_eq!(summary["success_rate"], 75.0);
    assert_eq!(
        summary["cards_needing_extra"],
        json!([{ "card_id": b, "question": "Question 2?", "attempts": 2 }])
    );

    let again = ctx
        .server
        .post(&format!("/api/decks/{}/study/{}/summary", deck_id, session_id))
        .await;
    again.assert_status(StatusCode::NOT_FOUND);
    let body: Value = again.json();
    assert_eq!(body["error"], "no_active_session");

    let card = ctx.db.get_flashcard(b).await.unwrap().unwrap();
    assert_eq!(card.studied_count, 2);
    assert_eq!(card.success_count, 1);
    assert_eq!(card.streak, 1);
}

#[tokio::test]
async fn test_grade_rules() {
    let ctx = TestContext::new().await;
    let (deck_id, ids) = ctx.seed_deck("Rust", 2).await;
    let (other_deck, _) = ctx.seed_deck("Python", 1).await;

    let view = open_session(&ctx, deck_id).await;
    let session_id = view["session_id"].as_str().unwrap().to_string();

    let mismatch = ctx
        .server
        .post(&format!("/api/decks/{}/study/{}/grade", other_deck, session_id))
        .json(&fixtures::grade_request(ids[0], true))
        .await;
    mismatch.assert_status(StatusCode::FORBIDDEN);

    let out_of_turn = ctx
        .server
        .post(&format!("/api/decks/{}/study/{}/grade", deck_id, session_id))
        .json(&fixtures::grade_request(ids[1], true))
        .await;
    out_of_turn.assert_status(StatusCode::CONFLICT);

    let early_summary = ctx
        .server
        .post(&format!("/api/decks/{}/study/{}/summary", deck_id, session_id))
        .await;
    early_summary.assert_status(StatusCode::CONFLICT);

    let response = ctx
        .server
        .get(&format!("/api/decks/{}/study/{}", deck_id, session_id))
        .await;
    response.assert_status_ok();
    let view: Value = response.json();
    assert_eq!(view["attempts"], 0);
    assert_eq!(view["remaining"], 2);

    grade(&ctx, deck_id, &session_id, ids[0], true).await;
    grade(&ctx, deck_id, &session_id, ids[1], true).await;

    let finished = ctx
        .server
        .post(&format!("/api/decks/{}/study/{}/grade", deck_id, session_id))
        .json(&fixtures::grade_request(ids[1], true))
        .await;
    finished.assert_status(StatusCode::CONFLICT);
    let body: Value = finished.json();
    assert_eq!(body["error"], "session_complete");
}

#[tokio::test]
async fn test_failed_stats_write_does_not_advance_session() {
    let ctx = TestContext::new().await;
    let (deck_id, ids) = ctx.seed_deck("Rust", 2).await;
    let view = open_session(&ctx, deck_id).await;
    let session_id = view["session_id"].as_str().unwrap().to_string();

    ctx.db.pool().close().await;

    let response = ctx
        .server
        .post(&format!("/api/decks/{}/study/{}/grade", deck_id, session_id))
        .json(&fixtures::grade_request(ids[0], true))
        .await;
    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);

    let response = ctx
        .server
        .get(&format!("/api/decks/{}/study/{}", deck_id, session_id))
        .await;
    response.assert_status_ok();
    let view: Value = response.json();
    assert_eq!(view["attempts"], 0);
    assert_eq!(view["remaining"], 2);
    assert_eq!(view["current_card"]["id"], ids[0]);
}

#[tokio::test]
async fn test_unknown_session() {
    let ctx = TestContext::new().await;
    let (deck_id, _) = ctx.seed_deck("Rust", 1).await;

    let response = ctx
        .server
        .get(&format!(
            "/api/decks/{}/study/00000000-0000-0000-0000-000000000000",
            deck_id
        ))
        .await;
    response.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_close_session() {
    let ctx = TestContext::new().await;
    let (deck_id, _) = ctx.seed_deck("Rust", 2).await;
    let view = open_session(&ctx, deck_id).await;
    let session_id = view["session_id"].as_str().unwrap().to_string();

    let response = ctx
        .server
        .delete(&format!("/api/decks/{}/study/{}", deck_id, session_id))
        .await;
    response.assert_status(StatusCode::NO_CONTENT);

    let response = ctx
        .server
        .get(&format!("/api/decks/{}/study/{}", deck_id, session_id))
        .await;
    response.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_submit_results_recomputes_summary() {
    let ctx = TestContext::new().await;
    let (deck_id, ids) = ctx.seed_deck("Rust", 2).await;

    let response = ctx
        .server
        .post(&format!("/api/decks/{}/study/results", deck_id))
        .json(&json!({
            "results": [
                fixtures::attempt(ids[0], false),
                fixtures::attempt(ids[1], true),
                fixtures::attempt(ids[0], true),
            ],
            "total_attempts": 5,
            "cards_mastered": 2,
        }))
        .await;

    response.assert_status_ok();
    let summary: Value = response.json();
    assert_eq!(summary["total_unique_cards"], 2);
    assert_eq!(summary["total_attempts"], 3);
    assert_eq!(summary["success_rate"], 66.7);
    assert_eq!(summary["cards_needing_extra"][0]["card_id"], ids[0]);

    let card = ctx.db.get_flashcard(ids[0]).await.unwrap().unwrap();
    assert_eq!(card.studied_count, 2);
    assert_eq!(card.streak, 1);
}

#[tokio::test]
async fn test_submit_results_rejects_foreign_cards() {
    let ctx = TestContext::new().await;
    let (deck_id, _) = ctx.seed_deck("Rust", 1).await;
    let (_, other_ids) = ctx.seed_deck("Python", 1).await;

    let response = ctx
        .server
        .post(&format!("/api/decks/{}/study/results", deck_id))
        .json(&json!({ "results": [fixtures::attempt(other_ids[0], true)] }))
        .await;

    response.assert_status(StatusCode::FORBIDDEN);
    let card = ctx.db.get_flashcard(other_ids[0]).await.unwrap().unwrap();
    assert_eq!(card.studied_count, 0);
}
