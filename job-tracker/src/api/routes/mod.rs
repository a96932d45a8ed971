//! API route modules.
//!
//! Organizes routes by resource type.

pub mod auth;
pub mod health;
pub mod users;

use axum::{Json, Router, routing::get};
use utoipa::OpenApi;

use crate::api::openapi::ApiDoc;
use crate::api::server::AppState;

/// Create the main API router with all routes.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .nest("/api/auth", auth::router(&state))
        .nest("/api/users", users::router(&state))
        .nest("/api/health", health::router())
        .route("/api/docs/openapi.json", get(openapi_json))
        .with_state(state)
}

/// GET /api/docs/openapi.json
async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
