//! Handlers for the asset registry.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;

use civica_core::report;
use civica_core::types::DbId;
use civica_db::models::asset::{
    AssetListFilter, AssetReportFilter, AssetView, CreateAsset, UpdateAsset,
};
use civica_db::repositories::AssetRepo;
use civica_db::{clamp_page, clamp_per_page, DEFAULT_PER_PAGE};

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::RequireStaff;
use crate::response::{ApiResponse, PageMeta, Paged};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct AssetListQuery {
    pub keyword: Option<String>,
    pub asset_type: Option<String>,
    pub status: Option<String>,
    #[serde(default)]
    pub available_only: bool,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct AssetReportQuery {
    pub asset_type: Option<String>,
    pub status: Option<String>,
}

/// GET /api/v1/assets
pub async fn list_assets(
    _auth: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<AssetListQuery>,
) -> AppResult<impl IntoResponse> {
    let page = clamp_page(params.page);
    let per_page = clamp_per_page(params.per_page, DEFAULT_PER_PAGE);
    let filter = AssetListFilter {
        keyword: params.keyword,
        asset_type: params.asset_type,
        status: params.status,
        available_only: params.available_only,
        sort_by: params.sort_by,
        sort_order: params.sort_order,
    };

    let (assets, total) = AssetRepo::list(&state.pool, &filter, page, per_page).await?;
    let meta = PageMeta::new(page, per_page, total, assets.len());
    let items: Vec<AssetView> = assets.into_iter().map(AssetView::from).collect();

    Ok(ApiResponse::ok(
        "Assets retrieved successfully.",
        Paged { items, meta },
    ))
}

/// GET /api/v1/assets/report
pub async fn asset_report(
    State(state): State<AppState>,
    Query(params): Query<AssetReportQuery>,
) -> AppResult<impl IntoResponse> {
    let filter = AssetReportFilter {
        asset_type: params.asset_type,
        status: params.status,
    };
    let records = AssetRepo::report_records(&state.pool, &filter).await?;
    let report = report::build_asset_report(&records);

    Ok(ApiResponse::ok(
        "Asset report generated successfully.",
        report,
    ))
}

/// GET /api/v1/assets/{id}
pub async fn get_asset(
    _auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let asset = AssetRepo::get(&state.pool, id).await?;
    Ok(ApiResponse::ok(
        "Asset retrieved successfully.",
        AssetView::from(asset),
    ))
}

/// POST /api/v1/assets
pub async fn create_asset(
    RequireStaff(auth): RequireStaff,
    State(state): State<AppState>,
    Json(input): Json<CreateAsset>,
) -> AppResult<impl IntoResponse> {
    let asset = AssetRepo::create(&state.pool, &input).await?;

    tracing::info!(
        user_id = auth.user_id,
        asset_id = asset.id,
        code = %asset.code,
        "Asset created"
    );

    Ok((
        StatusCode::CREATED,
        ApiResponse::ok("Asset created successfully.", AssetView::from(asset)),
    ))
}

/// PUT /api/v1/assets/{id}
pub async fn update_asset(
    RequireStaff(auth): RequireStaff,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateAsset>,
) -> AppResult<impl IntoResponse> {
    let asset = AssetRepo::update(&state.pool, id, &input).await?;

    tracing::info!(user_id = auth.user_id, asset_id = asset.id, "Asset updated");

    Ok(ApiResponse::ok(
        "Asset updated successfully.",
        AssetView::from(asset),
    ))
}

/// DELETE /api/v1/assets/{id}
///
/// Business soft delete: blocked while outstanding loans exist.
pub async fn delete_asset(
    RequireStaff(auth): RequireStaff,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let asset = AssetRepo::deactivate(&state.pool, id).await?;

    tracing::info!(user_id = auth.user_id, asset_id = asset.id, "Asset deactivated");

    Ok(ApiResponse::ok(
        "Asset deleted successfully.",
        AssetView::from(asset),
    ))
}
