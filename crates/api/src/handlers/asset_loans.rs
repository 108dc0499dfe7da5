//! Handlers for the asset loan lifecycle.
//!
//! Listings are decorated with resident data from the resident service;
//! the decoration is best-effort and degrades to placeholders.

use std::collections::BTreeSet;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use chrono::NaiveDate;
use civica_core::error::CoreError;
use civica_core::report;
use civica_core::types::DbId;
use civica_db::models::loan::{CreateLoan, LoanListFilter, LoanReportFilter, LoanWithAsset};
use civica_db::repositories::LoanRepo;
use civica_db::{clamp_page, clamp_per_page, DEFAULT_PER_PAGE};
use serde::{Deserialize, Serialize};

use crate::clients::{resolve_resident_refs, ResidentRef};
use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::RequireStaff;
use crate::response::{ApiResponse, PageMeta, Paged};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct LoanListQuery {
    pub keyword: Option<String>,
    pub status: Option<String>,
    pub asset_type: Option<String>,
    pub resident_id: Option<DbId>,
    pub from_date: Option<NaiveDate>,
    pub to_date: Option<NaiveDate>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct LoanReportQuery {
    pub status: Option<String>,
    pub asset_type: Option<String>,
    pub from_date: Option<NaiveDate>,
    pub to_date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub struct RejectLoanRequest {
    pub rejected_reason: Option<String>,
}

/// A loan joined with its asset and decorated with resident data.
#[derive(Debug, Serialize)]
pub struct LoanView {
    #[serde(flatten)]
    pub loan: LoanWithAsset,
    pub resident: ResidentRef,
}

fn fallback_ref(resident_id: DbId) -> ResidentRef {
    ResidentRef {
        id: resident_id,
        name: format!("Resident #{resident_id}"),
        region_name: None,
    }
}

/// Decorate a single loan with its resident reference.
async fn decorate_loan(state: &AppState, loan: LoanWithAsset) -> LoanView {
    let refs = resolve_resident_refs(
        state.residents.as_ref(),
        state.regions.as_ref(),
        &[loan.resident_id],
    )
    .await;
    let resident = refs
        .get(&loan.resident_id)
        .cloned()
        .unwrap_or_else(|| fallback_ref(loan.resident_id));
    LoanView { loan, resident }
}

/// Decorate loans with resident references, one batch lookup per page.
async fn decorate_loans(state: &AppState, loans: Vec<LoanWithAsset>) -> Vec<LoanView> {
    let resident_ids: Vec<DbId> = loans
        .iter()
        .map(|loan| loan.resident_id)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    let refs = resolve_resident_refs(
        state.residents.as_ref(),
        state.regions.as_ref(),
        &resident_ids,
    )
    .await;

    loans
        .into_iter()
        .map(|loan| {
            let resident = refs
                .get(&loan.resident_id)
                .cloned()
                .unwrap_or_else(|| fallback_ref(loan.resident_id));
            LoanView { loan, resident }
        })
        .collect()
}

/// GET /api/v1/asset-loans
pub async fn list_loans(
    _auth: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<LoanListQuery>,
) -> AppResult<impl IntoResponse> {
    let page = clamp_page(params.page);
    let per_page = clamp_per_page(params.per_page, DEFAULT_PER_PAGE);
    let filter = LoanListFilter {
        keyword: params.keyword,
        status: params.status,
        asset_type: params.asset_type,
        resident_id: params.resident_id,
        from_date: params.from_date,
        to_date: params.to_date,
        sort_by: params.sort_by,
        sort_order: params.sort_order,
    };

    let (loans, total) = LoanRepo::list(&state.pool, &filter, page, per_page).await?;
    let meta = PageMeta::new(page, per_page, total, loans.len());
    let items = decorate_loans(&state, loans).await;

    Ok(ApiResponse::ok(
        "Asset loans retrieved successfully.",
        Paged { items, meta },
    ))
}

/// GET /api/v1/asset-loans/report
pub async fn loan_report(
    State(state): State<AppState>,
    Query(params): Query<LoanReportQuery>,
) -> AppResult<impl IntoResponse> {
    let filter = LoanReportFilter {
        status: params.status,
        asset_type: params.asset_type,
        from_date: params.from_date,
        to_date: params.to_date,
    };
    let records = LoanRepo::report_records(&state.pool, &filter).await?;
    let report = report::build_loan_report(&records);

    Ok(ApiResponse::ok("Loan report generated successfully.", report))
}

/// GET /api/v1/asset-loans/{id}
pub async fn get_loan(
    _auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let loan = LoanRepo::get_with_asset(&state.pool, id).await?;
    let view = decorate_loan(&state, loan).await;

    Ok(ApiResponse::ok("Asset loan retrieved successfully.", view))
}

/// POST /api/v1/asset-loans
///
/// Creates a loan in the `requested` state. Stock is verified but not
/// reserved; approval is the sole atomic gate.
pub async fn request_loan(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<CreateLoan>,
) -> AppResult<impl IntoResponse> {
    let loan = LoanRepo::request(&state.pool, &input).await?;

    tracing::info!(
        user_id = auth.user_id,
        loan_id = loan.id,
        asset_id = loan.asset_id,
        resident_id = loan.resident_id,
        quantity = loan.quantity,
        "Loan requested"
    );

    Ok((
        StatusCode::CREATED,
        ApiResponse::ok("Loan request created successfully.", loan),
    ))
}

/// POST /api/v1/asset-loans/{id}/approve
pub async fn approve_loan(
    RequireStaff(auth): RequireStaff,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let loan = LoanRepo::approve(&state.pool, id).await?;

    tracing::info!(user_id = auth.user_id, loan_id = loan.id, "Loan approved");

    Ok(ApiResponse::ok("Loan request approved successfully.", loan))
}

/// POST /api/v1/asset-loans/{id}/return
pub async fn return_loan(
    RequireStaff(auth): RequireStaff,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let loan = LoanRepo::return_loan(&state.pool, id).await?;

    tracing::info!(user_id = auth.user_id, loan_id = loan.id, "Loan returned");

    Ok(ApiResponse::ok("Loan request returned successfully.", loan))
}

/// POST /api/v1/asset-loans/{id}/reject
pub async fn reject_loan(
    RequireStaff(auth): RequireStaff,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<RejectLoanRequest>,
) -> AppResult<impl IntoResponse> {
    let reason = input
        .rejected_reason
        .as_deref()
        .map(str::trim)
        .filter(|reason| !reason.is_empty())
        .ok_or_else(|| {
            CoreError::validation("rejected_reason", "The rejected reason field is required.")
        })?;

    let loan = LoanRepo::reject(&state.pool, id, reason).await?;

    tracing::info!(user_id = auth.user_id, loan_id = loan.id, "Loan rejected");

    Ok(ApiResponse::ok("Loan request rejected successfully.", loan))
}
