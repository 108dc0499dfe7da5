//! Route definitions for the resident verification workflow.
//!
//! All routes are mounted under `/resident-verifications`.
//!
//! ```text
//! GET  /              -> list_verifications
//! POST /              -> create_verification (staff only)
//! GET  /statistics    -> statistics
//! POST /bulk          -> bulk_create (staff only)
//! GET  /{id}          -> get_verification
//! PUT  /{id}/approve  -> approve_verification (staff only)
//! PUT  /{id}/reject   -> reject_verification (staff only)
//! ```

use axum::routing::{get, post, put};
use axum::Router;

use crate::handlers::verifications;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(verifications::list_verifications).post(verifications::create_verification),
        )
        .route("/statistics", get(verifications::statistics))
        .route("/bulk", post(verifications::bulk_create))
        .route("/{id}", get(verifications::get_verification))
        .route("/{id}/approve", put(verifications::approve_verification))
        .route("/{id}/reject", put(verifications::reject_verification))
}
