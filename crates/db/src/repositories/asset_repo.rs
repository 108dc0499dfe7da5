//! Repository for the `assets` table.

use civica_core::asset;
use civica_core::error::CoreError;
use civica_core::report::AssetRecord;
use civica_core::types::DbId;

use crate::models::asset::{Asset, AssetListFilter, AssetReportFilter, CreateAsset, UpdateAsset};
use crate::repositories::sort_direction;
use crate::{DbError, DbPool};

/// Column list for `assets` queries.
const ASSET_COLUMNS: &str = "\
    id, code, name, description, asset_type, total_stock, available_stock, \
    location, status, created_at, updated_at";

/// Provides CRUD and reporting reads for the asset registry.
pub struct AssetRepo;

impl AssetRepo {
    /// Register a new asset. Available stock starts equal to total stock
    /// and the status starts active.
    pub async fn create(pool: &DbPool, input: &CreateAsset) -> Result<Asset, DbError> {
        asset::validate_new_asset(
            &input.code,
            &input.name,
            &input.asset_type,
            input.total_stock,
            input.location.as_deref(),
        )?;

        let code_taken: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM assets WHERE code = $1)")
                .bind(&input.code)
                .fetch_one(pool)
                .await?;
        if code_taken {
            return Err(CoreError::validation("code", "The code has already been taken.").into());
        }

        let name_taken: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM assets WHERE name = $1)")
                .bind(&input.name)
                .fetch_one(pool)
                .await?;
        if name_taken {
            return Err(CoreError::validation("name", "The name has already been taken.").into());
        }

        let query = format!(
            "INSERT INTO assets (code, name, description, asset_type, total_stock, available_stock, location, status)
             VALUES ($1, $2, $3, $4, $5, $5, $6, $7)
             RETURNING {ASSET_COLUMNS}"
        );
        let created = sqlx::query_as::<_, Asset>(&query)
            .bind(&input.code)
            .bind(&input.name)
            .bind(input.description.as_deref())
            .bind(&input.asset_type)
            .bind(input.total_stock)
            .bind(input.location.as_deref())
            .bind(asset::STATUS_ACTIVE)
            .fetch_one(pool)
            .await?;
        Ok(created)
    }

    /// Find an asset by ID.
    pub async fn find_by_id(pool: &DbPool, id: DbId) -> Result<Option<Asset>, sqlx::Error> {
        let query = format!("SELECT {ASSET_COLUMNS} FROM assets WHERE id = $1");
        sqlx::query_as::<_, Asset>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find an asset by ID, failing with NotFound when absent.
    pub async fn get(pool: &DbPool, id: DbId) -> Result<Asset, DbError> {
        Self::find_by_id(pool, id)
            .await?
            .ok_or_else(|| CoreError::NotFound { entity: "Asset", id }.into())
    }

    /// Partial update. A total-stock change recomputes available stock so
    /// the borrowed amount is preserved; shrinking below the borrowed
    /// amount is rejected.
    pub async fn update(pool: &DbPool, id: DbId, input: &UpdateAsset) -> Result<Asset, DbError> {
        let mut tx = pool.begin().await?;

        let query = format!("SELECT {ASSET_COLUMNS} FROM assets WHERE id = $1 FOR UPDATE");
        let current = sqlx::query_as::<_, Asset>(&query)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(CoreError::NotFound { entity: "Asset", id })?;

        if let Some(name) = &input.name {
            if name.trim().is_empty() {
                return Err(CoreError::validation("name", "The name field is required.").into());
            }
            if name.len() > asset::MAX_NAME_LEN {
                return Err(CoreError::validation(
                    "name",
                    format!("The name may not exceed {} characters.", asset::MAX_NAME_LEN),
                )
                .into());
            }
            let taken: bool =
                sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM assets WHERE name = $1 AND id <> $2)")
                    .bind(name)
                    .bind(id)
                    .fetch_one(&mut *tx)
                    .await?;
            if taken {
                return Err(CoreError::validation("name", "The name has already been taken.").into());
            }
        }

        if let Some(asset_type) = &input.asset_type {
            asset::validate_asset_type(asset_type)?;
        }
        if let Some(status) = &input.status {
            asset::validate_asset_status(status)?;
        }
        if let Some(location) = &input.location {
            if location.len() > asset::MAX_LOCATION_LEN {
                return Err(CoreError::validation(
                    "location",
                    format!("The location may not exceed {} characters.", asset::MAX_LOCATION_LEN),
                )
                .into());
            }
        }

        let (total_stock, available_stock) = match input.total_stock {
            Some(new_total) => (
                new_total,
                asset::recompute_available(new_total, current.borrowed_stock())?,
            ),
            None => (current.total_stock, current.available_stock),
        };

        let update_query = format!(
            "UPDATE assets
             SET name = $1, description = $2, asset_type = $3, total_stock = $4,
                 available_stock = $5, location = $6, status = $7, updated_at = NOW()
             WHERE id = $8
             RETURNING {ASSET_COLUMNS}"
        );
        let updated = sqlx::query_as::<_, Asset>(&update_query)
            .bind(input.name.as_ref().unwrap_or(&current.name))
            .bind(input.description.as_ref().or(current.description.as_ref()))
            .bind(input.asset_type.as_ref().unwrap_or(&current.asset_type))
            .bind(total_stock)
            .bind(available_stock)
            .bind(input.location.as_ref().or(current.location.as_ref()))
            .bind(input.status.as_ref().unwrap_or(&current.status))
            .bind(id)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(updated)
    }

    /// Business soft delete: refuse while outstanding loans exist, then
    /// retire the asset from circulation.
    pub async fn deactivate(pool: &DbPool, id: DbId) -> Result<Asset, DbError> {
        let mut tx = pool.begin().await?;

        let query = format!("SELECT {ASSET_COLUMNS} FROM assets WHERE id = $1 FOR UPDATE");
        let current = sqlx::query_as::<_, Asset>(&query)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(CoreError::NotFound { entity: "Asset", id })?;

        let outstanding: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM asset_loans
             WHERE asset_id = $1 AND status IN ('requested', 'borrowed')",
        )
        .bind(current.id)
        .fetch_one(&mut *tx)
        .await?;
        if outstanding > 0 {
            return Err(CoreError::Conflict(format!(
                "Asset has {outstanding} outstanding loans and cannot be deleted."
            ))
            .into());
        }

        let update_query = format!(
            "UPDATE assets SET status = $1, updated_at = NOW() WHERE id = $2 RETURNING {ASSET_COLUMNS}"
        );
        let updated = sqlx::query_as::<_, Asset>(&update_query)
            .bind(asset::STATUS_INACTIVE)
            .bind(id)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(updated)
    }

    /// List assets with filters, sorting, and pagination. Returns the page
    /// plus the total row count for the filter.
    pub async fn list(
        pool: &DbPool,
        filter: &AssetListFilter,
        page: i64,
        per_page: i64,
    ) -> Result<(Vec<Asset>, i64), sqlx::Error> {
        const FILTER_CLAUSE: &str = "\
            ($1::TEXT IS NULL OR code ILIKE '%' || $1 || '%' \
                OR name ILIKE '%' || $1 || '%' \
                OR location ILIKE '%' || $1 || '%') \
            AND ($2::TEXT IS NULL OR asset_type = $2) \
            AND ($3::TEXT IS NULL OR status = $3) \
            AND (NOT $4::BOOL OR available_stock > 0)";

        let count_query = format!("SELECT COUNT(*) FROM assets WHERE {FILTER_CLAUSE}");
        let total: i64 = sqlx::query_scalar(&count_query)
            .bind(filter.keyword.as_deref())
            .bind(filter.asset_type.as_deref())
            .bind(filter.status.as_deref())
            .bind(filter.available_only)
            .fetch_one(pool)
            .await?;

        let column = Self::sort_column(filter.sort_by.as_deref());
        let direction = sort_direction(filter.sort_order.as_deref());
        let page_query = format!(
            "SELECT {ASSET_COLUMNS} FROM assets WHERE {FILTER_CLAUSE}
             ORDER BY {column} {direction} LIMIT $5 OFFSET $6"
        );
        let assets = sqlx::query_as::<_, Asset>(&page_query)
            .bind(filter.keyword.as_deref())
            .bind(filter.asset_type.as_deref())
            .bind(filter.status.as_deref())
            .bind(filter.available_only)
            .bind(per_page)
            .bind((page - 1) * per_page)
            .fetch_all(pool)
            .await?;

        Ok((assets, total))
    }

    /// Fetch the rows feeding the asset report.
    pub async fn report_records(
        pool: &DbPool,
        filter: &AssetReportFilter,
    ) -> Result<Vec<AssetRecord>, sqlx::Error> {
        let rows: Vec<(String, i32, i32)> = sqlx::query_as(
            "SELECT asset_type, total_stock, available_stock FROM assets
             WHERE ($1::TEXT IS NULL OR asset_type = $1)
               AND ($2::TEXT IS NULL OR status = $2)",
        )
        .bind(filter.asset_type.as_deref())
        .bind(filter.status.as_deref())
        .fetch_all(pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(asset_type, total_stock, available_stock)| AssetRecord {
                asset_type,
                total_stock,
                available_stock,
            })
            .collect())
    }

    /// Whitelisted sort columns for the asset listing.
    fn sort_column(requested: Option<&str>) -> &'static str {
        match requested {
            Some("id") => "id",
            Some("code") => "code",
            Some("name") => "name",
            Some("asset_type") => "asset_type",
            Some("total_stock") => "total_stock",
            Some("available_stock") => "available_stock",
            Some("updated_at") => "updated_at",
            _ => "created_at",
        }
    }
}
