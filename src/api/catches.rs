//! Catch-status endpoints. All of them act as the authenticated user.

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;
use std::sync::Arc;

use crate::catches;
use crate::db::{BulkMarkRequest, CatchStatus, TrackedFish, User};
use crate::AppState;

use super::error::ApiError;

#[derive(Debug, Serialize)]
pub struct BulkMarkResponse {
    pub updated: u64,
}

/// List the current user's board: every catalog fish with its catch state
///
/// GET /api/catches
pub async fn list_catches(
    State(state): State<Arc<AppState>>,
    user: User,
) -> Result<Json<Vec<TrackedFish>>, ApiError> {
    let board = catches::list_for_user(&state.db, user.id).await?;
    Ok(Json(board))
}

/// Flip the caught flag for one fish
///
/// POST /api/catches/:fish_id/toggle
pub async fn toggle_catch(
    State(state): State<Arc<AppState>>,
    user: User,
    Path(fish_id): Path<i64>,
) -> Result<Json<CatchStatus>, ApiError> {
    let row = catches::toggle(&state.db, user.id, fish_id)
        .await?
        .ok_or_else(|| ApiError::not_found("No catch record for that fish"))?;
    Ok(Json(row))
}

/// Set the caught flag for a batch of fish
///
/// PUT /api/catches
pub async fn bulk_mark(
    State(state): State<Arc<AppState>>,
    user: User,
    Json(req): Json<BulkMarkRequest>,
) -> Result<Json<BulkMarkResponse>, ApiError> {
    let updated = catches::bulk_mark(&state.db, user.id, &req.fish_ids, req.caught).await?;
    Ok(Json(BulkMarkResponse { updated }))
}
