//! Handlers for the resident verification workflow.

use std::collections::BTreeSet;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use chrono::NaiveDate;
use civica_core::error::CoreError;
use civica_core::types::DbId;
use civica_core::verification::{self, VerificationStatus};
use civica_db::models::verification::{
    BulkCreateRequest, CreateVerificationRequest, NewVerification, ResidentVerification,
    VerificationListFilter,
};
use civica_db::repositories::VerificationRepo;
use civica_db::{clamp_page, clamp_per_page};
use serde::{Deserialize, Serialize};

use crate::clients::{resolve_resident_refs, ResidentRef};
use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::RequireStaff;
use crate::response::{ApiResponse, PageMeta, Paged};
use crate::state::AppState;

/// Default page size for verification listings.
const VERIFICATION_PER_PAGE: i64 = 20;

/// Maximum length of a rejection reason.
const MAX_REASON_LEN: usize = 500;

#[derive(Debug, Deserialize)]
pub struct VerificationListQuery {
    pub status: Option<String>,
    pub resident_id: Option<DbId>,
    pub verified_by: Option<DbId>,
    pub from_date: Option<NaiveDate>,
    pub to_date: Option<NaiveDate>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ApproveVerificationRequest {
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RejectVerificationRequest {
    pub rejection_reason: Option<String>,
}

/// A verification decorated with resident data.
#[derive(Debug, Serialize)]
pub struct VerificationView {
    #[serde(flatten)]
    pub verification: ResidentVerification,
    pub resident: ResidentRef,
}

fn fallback_ref(resident_id: DbId) -> ResidentRef {
    ResidentRef {
        id: resident_id,
        name: format!("Resident #{resident_id}"),
        region_name: None,
    }
}

/// Decorate a single verification with its resident reference.
async fn decorate_verification(
    state: &AppState,
    verification: ResidentVerification,
) -> VerificationView {
    let refs = resolve_resident_refs(
        state.residents.as_ref(),
        state.regions.as_ref(),
        &[verification.resident_id],
    )
    .await;
    let resident = refs
        .get(&verification.resident_id)
        .cloned()
        .unwrap_or_else(|| fallback_ref(verification.resident_id));
    VerificationView {
        verification,
        resident,
    }
}

/// Decorate verifications with resident references, one batch lookup per
/// page.
async fn decorate_verifications(
    state: &AppState,
    verifications: Vec<ResidentVerification>,
) -> Vec<VerificationView> {
    let resident_ids: Vec<DbId> = verifications
        .iter()
        .map(|verification| verification.resident_id)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    let refs = resolve_resident_refs(
        state.residents.as_ref(),
        state.regions.as_ref(),
        &resident_ids,
    )
    .await;

    verifications
        .into_iter()
        .map(|verification| {
            let resident = refs
                .get(&verification.resident_id)
                .cloned()
                .unwrap_or_else(|| fallback_ref(verification.resident_id));
            VerificationView {
                verification,
                resident,
            }
        })
        .collect()
}

/// GET /api/v1/resident-verifications
pub async fn list_verifications(
    _auth: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<VerificationListQuery>,
) -> AppResult<impl IntoResponse> {
    let page = clamp_page(params.page);
    let per_page = clamp_per_page(params.per_page, VERIFICATION_PER_PAGE);
    let filter = VerificationListFilter {
        status: params.status,
        resident_id: params.resident_id,
        verified_by: params.verified_by,
        from_date: params.from_date,
        to_date: params.to_date,
        sort_by: params.sort_by,
        sort_order: params.sort_order,
    };

    let (verifications, total) =
        VerificationRepo::list(&state.pool, &filter, page, per_page).await?;
    let meta = PageMeta::new(page, per_page, total, verifications.len());
    let items = decorate_verifications(&state, verifications).await;

    Ok(ApiResponse::ok(
        "Verifications retrieved successfully.",
        Paged { items, meta },
    ))
}

/// GET /api/v1/resident-verifications/statistics
pub async fn statistics(
    _auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let (counts, recent) = VerificationRepo::statistics(&state.pool).await?;
    let recent = decorate_verifications(&state, recent).await;

    Ok(ApiResponse::ok(
        "Verification statistics retrieved successfully.",
        serde_json::json!({
            "statistics": counts,
            "recent_verifications": recent,
        }),
    ))
}

/// GET /api/v1/resident-verifications/{id}
pub async fn get_verification(
    _auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let verification = VerificationRepo::get(&state.pool, id).await?;
    let view = decorate_verification(&state, verification).await;

    Ok(ApiResponse::ok("Verification retrieved successfully.", view))
}

/// POST /api/v1/resident-verifications
///
/// Creates a verification, `pending` by default. A non-pending creation
/// must carry a snapshot that passes resident-schema validation, and is
/// stamped with the resolver.
pub async fn create_verification(
    RequireStaff(auth): RequireStaff,
    State(state): State<AppState>,
    Json(input): Json<CreateVerificationRequest>,
) -> AppResult<impl IntoResponse> {
    let status = VerificationStatus::parse_input(
        input.status.as_deref().unwrap_or(verification::STATUS_PENDING),
    )?;

    let new = match status {
        // Resolution fields stay empty while pending.
        VerificationStatus::Pending => NewVerification {
            resident_id: input.resident_id,
            status: status.as_str().to_string(),
            notes: input.notes,
            verified_data: None,
            verified_by: None,
            verified_at: None,
        },
        VerificationStatus::Verified | VerificationStatus::Rejected => {
            let snapshot = input.verified_data.ok_or_else(|| {
                CoreError::validation("verified_data", "The verified data field is required.")
            })?;
            verification::validate_snapshot(&snapshot)?;
            NewVerification {
                resident_id: input.resident_id,
                status: status.as_str().to_string(),
                notes: input.notes,
                verified_data: Some(snapshot),
                verified_by: Some(input.verified_by.unwrap_or(auth.user_id)),
                verified_at: Some(input.verified_at.unwrap_or_else(chrono::Utc::now)),
            }
        }
    };

    let created = VerificationRepo::create(&state.pool, &new).await?;

    tracing::info!(
        user_id = auth.user_id,
        verification_id = created.id,
        resident_id = created.resident_id,
        status = %created.status,
        "Verification created"
    );

    Ok((
        StatusCode::CREATED,
        ApiResponse::ok("Verification created successfully.", created),
    ))
}

/// POST /api/v1/resident-verifications/bulk
///
/// Creates pending verifications for each listed resident lacking one;
/// residents with an unresolved verification are silently skipped.
pub async fn bulk_create(
    RequireStaff(auth): RequireStaff,
    State(state): State<AppState>,
    Json(input): Json<BulkCreateRequest>,
) -> AppResult<impl IntoResponse> {
    let created = VerificationRepo::bulk_create(&state.pool, &input.resident_ids).await?;

    tracing::info!(
        user_id = auth.user_id,
        requested = input.resident_ids.len(),
        created = created.len(),
        "Bulk verifications created"
    );

    let message = format!("{} verifications created.", created.len());
    Ok((StatusCode::CREATED, ApiResponse::ok(message, created)))
}

/// PUT /api/v1/resident-verifications/{id}/approve
///
/// Snapshots the resident's current live data from the resident service.
/// An unreachable directory degrades to a marked placeholder snapshot
/// rather than blocking the approval.
pub async fn approve_verification(
    RequireStaff(auth): RequireStaff,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<ApproveVerificationRequest>,
) -> AppResult<impl IntoResponse> {
    let notes = input.notes;

    let current = VerificationRepo::get(&state.pool, id).await?;
    let snapshot = match state.residents.find_by_id(current.resident_id).await {
        Some(record) => record.record,
        None => {
            tracing::warn!(
                resident_id = current.resident_id,
                "Resident directory unavailable, storing placeholder snapshot"
            );
            verification::placeholder_snapshot(current.resident_id)
        }
    };

    let approved =
        VerificationRepo::approve(&state.pool, id, auth.user_id, &snapshot, notes.as_deref())
            .await?;

    Ok(ApiResponse::ok("Resident verified successfully.", approved))
}

/// PUT /api/v1/resident-verifications/{id}/reject
pub async fn reject_verification(
    RequireStaff(auth): RequireStaff,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<RejectVerificationRequest>,
) -> AppResult<impl IntoResponse> {
    let reason = input
        .rejection_reason
        .as_deref()
        .map(str::trim)
        .filter(|reason| !reason.is_empty())
        .ok_or_else(|| {
            CoreError::validation("rejection_reason", "The rejection reason field is required.")
        })?;
    if reason.len() > MAX_REASON_LEN {
        return Err(CoreError::validation(
            "rejection_reason",
            format!("The rejection reason may not exceed {MAX_REASON_LEN} characters."),
        )
        .into());
    }

    let notes = verification::rejection_notes(reason);
    let rejected = VerificationRepo::reject(&state.pool, id, auth.user_id, &notes).await?;

    Ok(ApiResponse::ok("Verification rejected.", rejected))
}
