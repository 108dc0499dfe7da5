//! Repository for the `asset_loans` table, including the transactional
//! state transitions that mutate asset stock.
//!
//! Each transition runs in one transaction: the loan row and then the
//! asset row are locked with `SELECT ... FOR UPDATE` (always in that
//! order), state and stock are re-validated under the lock, and the
//! status change plus stock mutation commit together or not at all.

use civica_core::error::CoreError;
use civica_core::loan::{self, LoanStatus};
use civica_core::report::LoanRecord;
use civica_core::types::DbId;

use crate::models::asset::Asset;
use crate::models::loan::{AssetLoan, CreateLoan, LoanListFilter, LoanReportFilter, LoanWithAsset};
use crate::repositories::sort_direction;
use crate::{DbError, DbPool};

/// Column list for `asset_loans` queries.
const LOAN_COLUMNS: &str = "\
    id, asset_id, resident_id, quantity, loan_date, planned_return_date, \
    actual_return_date, status, loan_reason, rejected_reason, created_at, updated_at";

/// Column list for loan queries joined with `assets` (aliased `l` / `a`).
const LOAN_WITH_ASSET_COLUMNS: &str = "\
    l.id, l.asset_id, l.resident_id, l.quantity, l.loan_date, l.planned_return_date, \
    l.actual_return_date, l.status, l.loan_reason, l.rejected_reason, l.created_at, \
    l.updated_at, a.code AS asset_code, a.name AS asset_name, a.asset_type";

/// Provides CRUD and the state-machine transitions for asset loans.
pub struct LoanRepo;

impl LoanRepo {
    /// Create a loan in the `requested` state.
    ///
    /// Stock is verified against the asset as observed now but not
    /// reserved; approval re-checks it authoritatively.
    pub async fn request(pool: &DbPool, input: &CreateLoan) -> Result<AssetLoan, DbError> {
        let asset = asset_for_request(pool, input.asset_id).await?;

        loan::validate_request(
            input.quantity,
            input.loan_date,
            input.planned_return_date,
            asset.available_stock,
        )?;

        let query = format!(
            "INSERT INTO asset_loans (asset_id, resident_id, quantity, loan_date, planned_return_date, status, loan_reason)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING {LOAN_COLUMNS}"
        );
        let created = sqlx::query_as::<_, AssetLoan>(&query)
            .bind(asset.id)
            .bind(input.resident_id)
            .bind(input.quantity)
            .bind(input.loan_date)
            .bind(input.planned_return_date)
            .bind(loan::STATUS_REQUESTED)
            .bind(input.loan_reason.as_deref())
            .fetch_one(pool)
            .await?;
        Ok(created)
    }

    /// Approve a requested loan: the only point where stock is reserved.
    pub async fn approve(pool: &DbPool, id: DbId) -> Result<AssetLoan, DbError> {
        let mut tx = pool.begin().await?;

        let loan = Self::lock_loan(&mut tx, id).await?;
        let status = LoanStatus::parse(&loan.status)?;
        loan::ensure_can_approve(status)?;

        let asset = Self::lock_asset(&mut tx, loan.asset_id).await?;
        if asset.available_stock < loan.quantity {
            return Err(CoreError::InsufficientStock {
                requested: loan.quantity,
                available: asset.available_stock,
            }
            .into());
        }

        sqlx::query("UPDATE assets SET available_stock = available_stock - $1, updated_at = NOW() WHERE id = $2")
            .bind(loan.quantity)
            .bind(asset.id)
            .execute(&mut *tx)
            .await?;

        let update_query = format!(
            "UPDATE asset_loans SET status = $1, updated_at = NOW() WHERE id = $2 RETURNING {LOAN_COLUMNS}"
        );
        let updated = sqlx::query_as::<_, AssetLoan>(&update_query)
            .bind(loan::STATUS_BORROWED)
            .bind(id)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;

        tracing::info!(
            loan_id = updated.id,
            asset_id = updated.asset_id,
            quantity = updated.quantity,
            "Loan approved, stock reserved"
        );
        Ok(updated)
    }

    /// Return a borrowed loan, releasing its reserved stock.
    pub async fn return_loan(pool: &DbPool, id: DbId) -> Result<AssetLoan, DbError> {
        let mut tx = pool.begin().await?;

        let loan = Self::lock_loan(&mut tx, id).await?;
        let status = LoanStatus::parse(&loan.status)?;
        loan::ensure_can_return(status)?;

        // Lock the asset row so the increment pairs with the approval's
        // decrement under the same discipline.
        let asset = Self::lock_asset(&mut tx, loan.asset_id).await?;
        sqlx::query("UPDATE assets SET available_stock = available_stock + $1, updated_at = NOW() WHERE id = $2")
            .bind(loan.quantity)
            .bind(asset.id)
            .execute(&mut *tx)
            .await?;

        let update_query = format!(
            "UPDATE asset_loans
             SET status = $1, actual_return_date = CURRENT_DATE, updated_at = NOW()
             WHERE id = $2
             RETURNING {LOAN_COLUMNS}"
        );
        let updated = sqlx::query_as::<_, AssetLoan>(&update_query)
            .bind(loan::STATUS_RETURNED)
            .bind(id)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;

        tracing::info!(
            loan_id = updated.id,
            asset_id = updated.asset_id,
            quantity = updated.quantity,
            "Loan returned, stock released"
        );
        Ok(updated)
    }

    /// Reject a requested loan. Stock was never reserved, so none moves.
    pub async fn reject(pool: &DbPool, id: DbId, rejected_reason: &str) -> Result<AssetLoan, DbError> {
        let mut tx = pool.begin().await?;

        let loan = Self::lock_loan(&mut tx, id).await?;
        let status = LoanStatus::parse(&loan.status)?;
        loan::ensure_can_reject(status)?;

        let update_query = format!(
            "UPDATE asset_loans
             SET status = $1, rejected_reason = $2, updated_at = NOW()
             WHERE id = $3
             RETURNING {LOAN_COLUMNS}"
        );
        let updated = sqlx::query_as::<_, AssetLoan>(&update_query)
            .bind(loan::STATUS_REJECTED)
            .bind(rejected_reason)
            .bind(id)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(updated)
    }

    /// Find a loan by ID.
    pub async fn find_by_id(pool: &DbPool, id: DbId) -> Result<Option<AssetLoan>, sqlx::Error> {
        let query = format!("SELECT {LOAN_COLUMNS} FROM asset_loans WHERE id = $1");
        sqlx::query_as::<_, AssetLoan>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find a loan joined with its asset, failing with NotFound when absent.
    pub async fn get_with_asset(pool: &DbPool, id: DbId) -> Result<LoanWithAsset, DbError> {
        let query = format!(
            "SELECT {LOAN_WITH_ASSET_COLUMNS}
             FROM asset_loans l JOIN assets a ON a.id = l.asset_id
             WHERE l.id = $1"
        );
        sqlx::query_as::<_, LoanWithAsset>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await?
            .ok_or_else(|| CoreError::NotFound { entity: "AssetLoan", id }.into())
    }

    /// List loans with filters, sorting, and pagination. Returns the page
    /// plus the total row count for the filter.
    pub async fn list(
        pool: &DbPool,
        filter: &LoanListFilter,
        page: i64,
        per_page: i64,
    ) -> Result<(Vec<LoanWithAsset>, i64), sqlx::Error> {
        const FILTER_CLAUSE: &str = "\
            ($1::TEXT IS NULL OR a.name ILIKE '%' || $1 || '%' \
                OR a.code ILIKE '%' || $1 || '%') \
            AND ($2::TEXT IS NULL OR l.status = $2) \
            AND ($3::TEXT IS NULL OR a.asset_type = $3) \
            AND ($4::BIGINT IS NULL OR l.resident_id = $4) \
            AND ($5::DATE IS NULL OR l.loan_date >= $5) \
            AND ($6::DATE IS NULL OR l.loan_date <= $6)";

        let count_query = format!(
            "SELECT COUNT(*) FROM asset_loans l JOIN assets a ON a.id = l.asset_id
             WHERE {FILTER_CLAUSE}"
        );
        let total: i64 = sqlx::query_scalar(&count_query)
            .bind(filter.keyword.as_deref())
            .bind(filter.status.as_deref())
            .bind(filter.asset_type.as_deref())
            .bind(filter.resident_id)
            .bind(filter.from_date)
            .bind(filter.to_date)
            .fetch_one(pool)
            .await?;

        let column = Self::sort_column(filter.sort_by.as_deref());
        let direction = sort_direction(filter.sort_order.as_deref());
        let page_query = format!(
            "SELECT {LOAN_WITH_ASSET_COLUMNS}
             FROM asset_loans l JOIN assets a ON a.id = l.asset_id
             WHERE {FILTER_CLAUSE}
             ORDER BY l.{column} {direction} LIMIT $7 OFFSET $8"
        );
        let loans = sqlx::query_as::<_, LoanWithAsset>(&page_query)
            .bind(filter.keyword.as_deref())
            .bind(filter.status.as_deref())
            .bind(filter.asset_type.as_deref())
            .bind(filter.resident_id)
            .bind(filter.from_date)
            .bind(filter.to_date)
            .bind(per_page)
            .bind((page - 1) * per_page)
            .fetch_all(pool)
            .await?;

        Ok((loans, total))
    }

    /// Fetch the rows feeding the loan report.
    pub async fn report_records(
        pool: &DbPool,
        filter: &LoanReportFilter,
    ) -> Result<Vec<LoanRecord>, DbError> {
        let query = format!(
            "SELECT {LOAN_WITH_ASSET_COLUMNS}
             FROM asset_loans l JOIN assets a ON a.id = l.asset_id
             WHERE ($1::TEXT IS NULL OR l.status = $1)
               AND ($2::TEXT IS NULL OR a.asset_type = $2)
               AND ($3::DATE IS NULL OR l.loan_date >= $3)
               AND ($4::DATE IS NULL OR l.loan_date <= $4)
             ORDER BY l.id ASC"
        );
        let rows = sqlx::query_as::<_, LoanWithAsset>(&query)
            .bind(filter.status.as_deref())
            .bind(filter.asset_type.as_deref())
            .bind(filter.from_date)
            .bind(filter.to_date)
            .fetch_all(pool)
            .await?;

        rows.iter()
            .map(|row| row.to_record().map_err(DbError::Core))
            .collect()
    }

    /// Lock a loan row for the duration of a transition transaction.
    async fn lock_loan(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        id: DbId,
    ) -> Result<AssetLoan, DbError> {
        let query = format!("SELECT {LOAN_COLUMNS} FROM asset_loans WHERE id = $1 FOR UPDATE");
        sqlx::query_as::<_, AssetLoan>(&query)
            .bind(id)
            .fetch_optional(&mut **tx)
            .await?
            .ok_or_else(|| CoreError::NotFound { entity: "AssetLoan", id }.into())
    }

    /// Lock the asset row backing a loan transition.
    async fn lock_asset(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        id: DbId,
    ) -> Result<Asset, DbError> {
        let query = "SELECT id, code, name, description, asset_type, total_stock, available_stock, \
             location, status, created_at, updated_at FROM assets WHERE id = $1 FOR UPDATE";
        sqlx::query_as::<_, Asset>(query)
            .bind(id)
            .fetch_optional(&mut **tx)
            .await?
            .ok_or_else(|| CoreError::NotFound { entity: "Asset", id }.into())
    }

    /// Whitelisted sort columns for the loan listing.
    fn sort_column(requested: Option<&str>) -> &'static str {
        match requested {
            Some("id") => "id",
            Some("loan_date") => "loan_date",
            Some("planned_return_date") => "planned_return_date",
            Some("actual_return_date") => "actual_return_date",
            Some("status") => "status",
            _ => "created_at",
        }
    }
}

/// Fetch the asset referenced by a loan request; a missing asset is a
/// validation failure on `asset_id`, mirroring the request contract.
async fn asset_for_request(pool: &DbPool, id: DbId) -> Result<Asset, DbError> {
    crate::repositories::AssetRepo::find_by_id(pool, id)
        .await?
        .ok_or_else(|| CoreError::validation("asset_id", "The selected asset id is invalid.").into())
}
