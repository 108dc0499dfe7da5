//! Health check handler.

use axum::extract::State;
use axum::response::IntoResponse;

use crate::error::AppResult;
use crate::response::ApiResponse;
use crate::state::AppState;

/// GET /health
///
/// Verifies database connectivity.
pub async fn health(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    civica_db::health_check(&state.pool).await?;
    Ok(ApiResponse::ok(
        "Service healthy.",
        serde_json::json!({ "status": "ok" }),
    ))
}
