//! Route definitions for the asset registry.
//!
//! All routes are mounted under `/assets`.
//!
//! ```text
//! GET    /        -> list_assets
//! POST   /        -> create_asset (staff only)
//! GET    /report  -> asset_report (public)
//! GET    /{id}    -> get_asset
//! PUT    /{id}    -> update_asset (staff only)
//! DELETE /{id}    -> delete_asset (staff only)
//! ```

use axum::routing::get;
use axum::Router;

use crate::handlers::assets;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(assets::list_assets).post(assets::create_asset))
        .route("/report", get(assets::asset_report))
        .route(
            "/{id}",
            get(assets::get_asset)
                .put(assets::update_asset)
                .delete(assets::delete_asset),
        )
}
