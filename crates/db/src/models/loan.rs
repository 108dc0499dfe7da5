//! Asset loan models and DTOs.

use chrono::NaiveDate;
use civica_core::error::CoreError;
use civica_core::loan::LoanStatus;
use civica_core::report::LoanRecord;
use civica_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `asset_loans` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct AssetLoan {
    pub id: DbId,
    pub asset_id: DbId,
    pub resident_id: DbId,
    pub quantity: i32,
    pub loan_date: NaiveDate,
    pub planned_return_date: NaiveDate,
    pub actual_return_date: Option<NaiveDate>,
    pub status: String,
    pub loan_reason: Option<String>,
    pub rejected_reason: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// A loan row joined with its asset's identifying columns.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct LoanWithAsset {
    pub id: DbId,
    pub asset_id: DbId,
    pub resident_id: DbId,
    pub quantity: i32,
    pub loan_date: NaiveDate,
    pub planned_return_date: NaiveDate,
    pub actual_return_date: Option<NaiveDate>,
    pub status: String,
    pub loan_reason: Option<String>,
    pub rejected_reason: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    pub asset_code: String,
    pub asset_name: String,
    pub asset_type: String,
}

impl LoanWithAsset {
    /// Convert into a report record, parsing the stored status.
    pub fn to_record(&self) -> Result<LoanRecord, CoreError> {
        Ok(LoanRecord {
            loan_id: self.id,
            asset_id: self.asset_id,
            asset_name: self.asset_name.clone(),
            asset_type: self.asset_type.clone(),
            resident_id: self.resident_id,
            quantity: self.quantity,
            status: LoanStatus::parse(&self.status)?,
            loan_date: self.loan_date,
            actual_return_date: self.actual_return_date,
        })
    }
}

/// Request body for a resident-initiated loan request.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateLoan {
    pub asset_id: DbId,
    pub resident_id: DbId,
    pub quantity: i32,
    pub loan_date: NaiveDate,
    pub planned_return_date: NaiveDate,
    pub loan_reason: Option<String>,
}

/// Filters for the loan listing.
#[derive(Debug, Clone, Default)]
pub struct LoanListFilter {
    /// Case-insensitive substring match on the asset's name or code.
    pub keyword: Option<String>,
    pub status: Option<String>,
    pub asset_type: Option<String>,
    pub resident_id: Option<DbId>,
    pub from_date: Option<NaiveDate>,
    pub to_date: Option<NaiveDate>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
}

/// Filters for the loan report.
#[derive(Debug, Clone, Default)]
pub struct LoanReportFilter {
    pub status: Option<String>,
    pub asset_type: Option<String>,
    pub from_date: Option<NaiveDate>,
    pub to_date: Option<NaiveDate>,
}
