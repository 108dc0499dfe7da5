//! Route definitions for the asset loan lifecycle.
//!
//! All routes are mounted under `/asset-loans`.
//!
//! ```text
//! GET  /              -> list_loans
//! POST /              -> request_loan
//! GET  /report        -> loan_report (public)
//! GET  /{id}          -> get_loan
//! POST /{id}/approve  -> approve_loan (staff only)
//! POST /{id}/return   -> return_loan (staff only)
//! POST /{id}/reject   -> reject_loan (staff only)
//! ```

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::asset_loans;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(asset_loans::list_loans).post(asset_loans::request_loan),
        )
        .route("/report", get(asset_loans::loan_report))
        .route("/{id}", get(asset_loans::get_loan))
        .route("/{id}/approve", post(asset_loans::approve_loan))
        .route("/{id}/return", post(asset_loans::return_loan))
        .route("/{id}/reject", post(asset_loans::reject_loan))
}
