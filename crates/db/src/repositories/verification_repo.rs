//! Repository for the `resident_verifications` table.
//!
//! The single-pending-per-resident invariant is enforced twice: an
//! explicit pre-check that produces a clean Conflict error, and the
//! partial unique index `uq_resident_verifications_pending` as the
//! race backstop.

use civica_core::error::CoreError;
use civica_core::types::DbId;
use civica_core::verification::{self, VerificationStatus};

use crate::models::verification::{
    NewVerification, ResidentVerification, VerificationCounts, VerificationListFilter,
};
use crate::repositories::sort_direction;
use crate::{is_unique_violation, DbError, DbPool};

/// Column list for `resident_verifications` queries.
const VERIFICATION_COLUMNS: &str = "\
    id, resident_id, verified_by, status, notes, verified_data, verified_at, \
    created_at, updated_at";

/// Number of records returned by the statistics endpoint.
const RECENT_LIMIT: i64 = 5;

/// Provides CRUD and the resolution transitions for verifications.
pub struct VerificationRepo;

impl VerificationRepo {
    /// Insert a verification. Fails with Conflict when the resident
    /// already has an unresolved pending verification.
    pub async fn create(pool: &DbPool, input: &NewVerification) -> Result<ResidentVerification, DbError> {
        let pending_exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM resident_verifications WHERE resident_id = $1 AND status = 'pending')",
        )
        .bind(input.resident_id)
        .fetch_one(pool)
        .await?;
        if pending_exists {
            return Err(CoreError::Conflict(
                "Resident already has a pending verification.".to_string(),
            )
            .into());
        }

        let query = format!(
            "INSERT INTO resident_verifications (resident_id, status, notes, verified_data, verified_by, verified_at)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {VERIFICATION_COLUMNS}"
        );
        let created = sqlx::query_as::<_, ResidentVerification>(&query)
            .bind(input.resident_id)
            .bind(&input.status)
            .bind(input.notes.as_deref())
            .bind(input.verified_data.as_ref())
            .bind(input.verified_by)
            .bind(input.verified_at)
            .fetch_one(pool)
            .await
            .map_err(|err| {
                if is_unique_violation(&err, "uq_resident_verifications_pending") {
                    DbError::Core(CoreError::Conflict(
                        "Resident already has a pending verification.".to_string(),
                    ))
                } else {
                    DbError::Sqlx(err)
                }
            })?;
        Ok(created)
    }

    /// Create pending verifications for every listed resident that lacks
    /// one. Residents that already have a pending verification are
    /// silently skipped; the created subset is returned.
    pub async fn bulk_create(
        pool: &DbPool,
        resident_ids: &[DbId],
    ) -> Result<Vec<ResidentVerification>, sqlx::Error> {
        if resident_ids.is_empty() {
            return Ok(Vec::new());
        }

        let query = format!(
            "INSERT INTO resident_verifications (resident_id, status)
             SELECT DISTINCT rid, 'pending' FROM UNNEST($1::BIGINT[]) AS t(rid)
             ON CONFLICT (resident_id) WHERE status = 'pending' DO NOTHING
             RETURNING {VERIFICATION_COLUMNS}"
        );
        sqlx::query_as::<_, ResidentVerification>(&query)
            .bind(resident_ids)
            .fetch_all(pool)
            .await
    }

    /// Approve a pending verification, storing the resident snapshot
    /// captured by the caller at approval time.
    pub async fn approve(
        pool: &DbPool,
        id: DbId,
        actor: DbId,
        snapshot: &serde_json::Value,
        notes: Option<&str>,
    ) -> Result<ResidentVerification, DbError> {
        let mut tx = pool.begin().await?;

        let current = Self::lock(&mut tx, id).await?;
        let status = VerificationStatus::parse(&current.status)?;
        verification::ensure_pending("approve", status)?;

        let query = format!(
            "UPDATE resident_verifications
             SET status = $1, verified_by = $2, verified_data = $3, verified_at = NOW(),
                 notes = COALESCE($4, notes), updated_at = NOW()
             WHERE id = $5
             RETURNING {VERIFICATION_COLUMNS}"
        );
        let updated = sqlx::query_as::<_, ResidentVerification>(&query)
            .bind(verification::STATUS_VERIFIED)
            .bind(actor)
            .bind(snapshot)
            .bind(notes)
            .bind(id)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;

        tracing::info!(
            verification_id = updated.id,
            resident_id = updated.resident_id,
            verified_by = actor,
            "Resident verification approved"
        );
        Ok(updated)
    }

    /// Reject a pending verification with a formatted reason.
    pub async fn reject(
        pool: &DbPool,
        id: DbId,
        actor: DbId,
        notes: &str,
    ) -> Result<ResidentVerification, DbError> {
        let mut tx = pool.begin().await?;

        let current = Self::lock(&mut tx, id).await?;
        let status = VerificationStatus::parse(&current.status)?;
        verification::ensure_pending("reject", status)?;

        let query = format!(
            "UPDATE resident_verifications
             SET status = $1, verified_by = $2, verified_at = NOW(), notes = $3, updated_at = NOW()
             WHERE id = $4
             RETURNING {VERIFICATION_COLUMNS}"
        );
        let updated = sqlx::query_as::<_, ResidentVerification>(&query)
            .bind(verification::STATUS_REJECTED)
            .bind(actor)
            .bind(notes)
            .bind(id)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(updated)
    }

    /// Find a verification by ID.
    pub async fn find_by_id(
        pool: &DbPool,
        id: DbId,
    ) -> Result<Option<ResidentVerification>, sqlx::Error> {
        let query = format!("SELECT {VERIFICATION_COLUMNS} FROM resident_verifications WHERE id = $1");
        sqlx::query_as::<_, ResidentVerification>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find a verification by ID, failing with NotFound when absent.
    pub async fn get(pool: &DbPool, id: DbId) -> Result<ResidentVerification, DbError> {
        Self::find_by_id(pool, id).await?.ok_or_else(|| {
            CoreError::NotFound { entity: "ResidentVerification", id }.into()
        })
    }

    /// List verifications with filters, sorting, and pagination.
    pub async fn list(
        pool: &DbPool,
        filter: &VerificationListFilter,
        page: i64,
        per_page: i64,
    ) -> Result<(Vec<ResidentVerification>, i64), sqlx::Error> {
        const FILTER_CLAUSE: &str = "\
            ($1::TEXT IS NULL OR status = $1) \
            AND ($2::BIGINT IS NULL OR resident_id = $2) \
            AND ($3::BIGINT IS NULL OR verified_by = $3) \
            AND ($4::DATE IS NULL OR created_at::DATE >= $4) \
            AND ($5::DATE IS NULL OR created_at::DATE <= $5)";

        let count_query =
            format!("SELECT COUNT(*) FROM resident_verifications WHERE {FILTER_CLAUSE}");
        let total: i64 = sqlx::query_scalar(&count_query)
            .bind(filter.status.as_deref())
            .bind(filter.resident_id)
            .bind(filter.verified_by)
            .bind(filter.from_date)
            .bind(filter.to_date)
            .fetch_one(pool)
            .await?;

        let column = Self::sort_column(filter.sort_by.as_deref());
        let direction = sort_direction(filter.sort_order.as_deref());
        let page_query = format!(
            "SELECT {VERIFICATION_COLUMNS} FROM resident_verifications
             WHERE {FILTER_CLAUSE}
             ORDER BY {column} {direction} LIMIT $6 OFFSET $7"
        );
        let verifications = sqlx::query_as::<_, ResidentVerification>(&page_query)
            .bind(filter.status.as_deref())
            .bind(filter.resident_id)
            .bind(filter.verified_by)
            .bind(filter.from_date)
            .bind(filter.to_date)
            .bind(per_page)
            .bind((page - 1) * per_page)
            .fetch_all(pool)
            .await?;

        Ok((verifications, total))
    }

    /// Aggregate counts plus the most recent records.
    pub async fn statistics(
        pool: &DbPool,
    ) -> Result<(VerificationCounts, Vec<ResidentVerification>), sqlx::Error> {
        let counts = sqlx::query_as::<_, VerificationCounts>(
            "SELECT COUNT(*) AS total,
                    COUNT(*) FILTER (WHERE status = 'pending') AS pending,
                    COUNT(*) FILTER (WHERE status = 'verified') AS verified,
                    COUNT(*) FILTER (WHERE status = 'rejected') AS rejected
             FROM resident_verifications",
        )
        .fetch_one(pool)
        .await?;

        let recent_query = format!(
            "SELECT {VERIFICATION_COLUMNS} FROM resident_verifications
             ORDER BY created_at DESC LIMIT $1"
        );
        let recent = sqlx::query_as::<_, ResidentVerification>(&recent_query)
            .bind(RECENT_LIMIT)
            .fetch_all(pool)
            .await?;

        Ok((counts, recent))
    }

    /// Lock a verification row for the duration of a resolution transaction.
    async fn lock(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        id: DbId,
    ) -> Result<ResidentVerification, DbError> {
        let query =
            format!("SELECT {VERIFICATION_COLUMNS} FROM resident_verifications WHERE id = $1 FOR UPDATE");
        sqlx::query_as::<_, ResidentVerification>(&query)
            .bind(id)
            .fetch_optional(&mut **tx)
            .await?
            .ok_or_else(|| CoreError::NotFound { entity: "ResidentVerification", id }.into())
    }

    /// Whitelisted sort columns for the verification listing.
    fn sort_column(requested: Option<&str>) -> &'static str {
        match requested {
            Some("id") => "id",
            Some("status") => "status",
            Some("verified_at") => "verified_at",
            Some("updated_at") => "updated_at",
            _ => "created_at",
        }
    }
}
