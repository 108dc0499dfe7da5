//! Route builders, one module per aggregate.

pub mod asset_loans;
pub mod assets;
pub mod health;
pub mod verifications;

use axum::Router;

use crate::state::AppState;

/// All routes mounted under `/api/v1`.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/assets", assets::router())
        .nest("/asset-loans", asset_loans::router())
        .nest("/resident-verifications", verifications::router())
}
