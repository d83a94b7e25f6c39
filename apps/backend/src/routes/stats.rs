//! Statistics endpoints

use axum::{extract::State, Json};

use crate::error::Result;
use crate::models::*;
use crate::AppState;

/// GET /api/stats
pub async fn overall(State(state): State<AppState>) -> Result<Json<OverallStats>> {
    let stats = state.db.get_overall_stats().await?;
    Ok(Json(stats))
}
