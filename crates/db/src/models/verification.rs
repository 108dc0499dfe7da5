//! Resident verification models and DTOs.

use chrono::NaiveDate;
use civica_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `resident_verifications` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ResidentVerification {
    pub id: DbId,
    pub resident_id: DbId,
    pub verified_by: Option<DbId>,
    pub status: String,
    pub notes: Option<String>,
    pub verified_data: Option<serde_json::Value>,
    pub verified_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Fully-validated insert payload, assembled by the handler after the
/// domain checks have run.
#[derive(Debug, Clone)]
pub struct NewVerification {
    pub resident_id: DbId,
    pub status: String,
    pub notes: Option<String>,
    pub verified_data: Option<serde_json::Value>,
    pub verified_by: Option<DbId>,
    pub verified_at: Option<Timestamp>,
}

/// Request body for creating a verification.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateVerificationRequest {
    pub resident_id: DbId,
    /// Defaults to `pending` when omitted.
    pub status: Option<String>,
    pub notes: Option<String>,
    pub verified_data: Option<serde_json::Value>,
    pub verified_by: Option<DbId>,
    pub verified_at: Option<Timestamp>,
}

/// Request body for bulk-creating pending verifications.
#[derive(Debug, Clone, Deserialize)]
pub struct BulkCreateRequest {
    pub resident_ids: Vec<DbId>,
}

/// Aggregate counts for the statistics endpoint.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct VerificationCounts {
    pub total: i64,
    pub pending: i64,
    pub verified: i64,
    pub rejected: i64,
}

/// Filters for the verification listing.
#[derive(Debug, Clone, Default)]
pub struct VerificationListFilter {
    pub status: Option<String>,
    pub resident_id: Option<DbId>,
    pub verified_by: Option<DbId>,
    pub from_date: Option<NaiveDate>,
    pub to_date: Option<NaiveDate>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
}
