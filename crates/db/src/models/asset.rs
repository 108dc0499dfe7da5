//! Asset registry models and DTOs.

use civica_core::asset;
use civica_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `assets` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Asset {
    pub id: DbId,
    pub code: String,
    pub name: String,
    pub description: Option<String>,
    pub asset_type: String,
    pub total_stock: i32,
    pub available_stock: i32,
    pub location: Option<String>,
    pub status: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Asset {
    /// Units currently out on loan.
    pub fn borrowed_stock(&self) -> i32 {
        asset::borrowed_stock(self.total_stock, self.available_stock)
    }
}

/// Asset response payload with the derived `borrowed_stock` field.
#[derive(Debug, Serialize)]
pub struct AssetView {
    #[serde(flatten)]
    pub asset: Asset,
    pub borrowed_stock: i32,
}

impl From<Asset> for AssetView {
    fn from(asset: Asset) -> Self {
        let borrowed_stock = asset.borrowed_stock();
        Self {
            asset,
            borrowed_stock,
        }
    }
}

/// Request body for creating an asset.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateAsset {
    pub code: String,
    pub name: String,
    pub description: Option<String>,
    pub asset_type: String,
    pub total_stock: i32,
    pub location: Option<String>,
}

/// Request body for a partial asset update.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateAsset {
    pub name: Option<String>,
    pub description: Option<String>,
    pub asset_type: Option<String>,
    pub total_stock: Option<i32>,
    pub location: Option<String>,
    pub status: Option<String>,
}

/// Filters for the asset listing.
#[derive(Debug, Clone, Default)]
pub struct AssetListFilter {
    /// Case-insensitive substring match on code, name, or location.
    pub keyword: Option<String>,
    pub asset_type: Option<String>,
    pub status: Option<String>,
    /// Restrict to assets with available stock.
    pub available_only: bool,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
}

/// Filters for the asset report.
#[derive(Debug, Clone, Default)]
pub struct AssetReportFilter {
    pub asset_type: Option<String>,
    pub status: Option<String>,
}
