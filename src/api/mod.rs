pub mod auth;
mod catches;
pub mod error;
mod fish;
pub mod validation;

use axum::{
    routing::{get, post, put},
    Json, Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    // Auth routes (public; /me requires a session)
    let auth_routes = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/logout", post(auth::logout))
        .route("/me", get(auth::me));

    // Catalog and catch-status routes. Catch handlers authenticate via the
    // User extractor, so there is no separate middleware layer.
    let api_routes = Router::new()
        .route("/fish", get(fish::list_fish))
        .route("/fish/:id", get(fish::get_fish))
        .route("/catches", get(catches::list_catches))
        .route("/catches", put(catches::bulk_mark))
        .route("/catches/:fish_id/toggle", post(catches::toggle_catch));

    Router::new()
        .route("/health", get(health_check))
        .nest("/api/auth", auth_routes)
        .nest("/api", api_routes)
        .merge(crate::ui::create_router())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint
async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
