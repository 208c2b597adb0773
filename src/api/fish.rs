//! Read-only fish catalog endpoints.

use axum::{
    extract::{Path, State},
    Json,
};
use std::sync::Arc;

use crate::db::Fish;
use crate::AppState;

use super::error::ApiError;

/// List the fish catalog
///
/// GET /api/fish
pub async fn list_fish(State(state): State<Arc<AppState>>) -> Result<Json<Vec<Fish>>, ApiError> {
    let fish = sqlx::query_as::<_, Fish>("SELECT * FROM fish ORDER BY name")
        .fetch_all(&state.db)
        .await?;
    Ok(Json(fish))
}

/// Get one catalog entry
///
/// GET /api/fish/:id
pub async fn get_fish(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<Fish>, ApiError> {
    let fish = sqlx::query_as::<_, Fish>("SELECT * FROM fish WHERE id = ?")
        .bind(id)
        .fetch_optional(&state.db)
        .await?
        .ok_or_else(|| ApiError::not_found("Fish not found"))?;
    Ok(Json(fish))
}
