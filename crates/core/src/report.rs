//! Report aggregation over loan and asset rows.
//!
//! The repositories fetch filtered rows; everything here is pure
//! computation so the aggregation rules are testable without a database.
//! Rankings use a deterministic tie-break (id ascending) rather than
//! iteration order.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;

use crate::loan::LoanStatus;
use crate::types::DbId;

/// Number of entries in the "top" rankings.
pub const TOP_RANKING_SIZE: usize = 5;

/// One loan row, joined with its asset, fed into the loan report.
#[derive(Debug, Clone)]
pub struct LoanRecord {
    pub loan_id: DbId,
    pub asset_id: DbId,
    pub asset_name: String,
    pub asset_type: String,
    pub resident_id: DbId,
    pub quantity: i32,
    pub status: LoanStatus,
    pub loan_date: NaiveDate,
    pub actual_return_date: Option<NaiveDate>,
}

#[derive(Debug, Default, PartialEq, Eq, Serialize)]
pub struct LoanSummary {
    pub total_loans: i64,
    pub requested: i64,
    pub borrowed: i64,
    pub returned: i64,
    pub rejected: i64,
}

/// Per-status share of all loans, rounded to 2 decimals. The denominator
/// is floored to 1 so an empty report yields zeros rather than NaN.
#[derive(Debug, Default, PartialEq, Serialize)]
pub struct StatusPercentage {
    pub requested: f64,
    pub borrowed: f64,
    pub returned: f64,
    pub rejected: f64,
}

#[derive(Debug, Default, PartialEq, Eq, Serialize)]
pub struct GroupTotals {
    pub total_loans: i64,
    pub total_quantity: i64,
}

#[derive(Debug, PartialEq, Eq, Serialize)]
pub struct TopAsset {
    pub asset_id: DbId,
    pub asset_name: String,
    pub total_quantity: i64,
}

#[derive(Debug, PartialEq, Eq, Serialize)]
pub struct TopBorrower {
    pub resident_id: DbId,
    pub approved_loans: i64,
}

#[derive(Debug, Serialize)]
pub struct LoanReport {
    pub summary: LoanSummary,
    pub percentage: StatusPercentage,
    /// Total quantity currently out on borrowed loans.
    pub active_quantity: i64,
    pub group_by_asset: BTreeMap<String, GroupTotals>,
    pub group_by_type: BTreeMap<String, GroupTotals>,
    /// Mean days between loan date and actual return, over returned loans
    /// with a recorded return date; `null` when there are none.
    pub average_duration_days: Option<f64>,
    pub top_assets: Vec<TopAsset>,
    pub top_borrowers: Vec<TopBorrower>,
    /// Request counts keyed by `YYYY-MM`.
    pub monthly: BTreeMap<String, i64>,
    /// Request counts keyed by `YYYY-MM-DD`.
    pub daily: BTreeMap<String, i64>,
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Aggregate the loan report from pre-filtered records.
pub fn build_loan_report(records: &[LoanRecord]) -> LoanReport {
    let mut summary = LoanSummary::default();
    let mut active_quantity: i64 = 0;
    let mut group_by_asset: BTreeMap<String, GroupTotals> = BTreeMap::new();
    let mut group_by_type: BTreeMap<String, GroupTotals> = BTreeMap::new();
    let mut monthly: BTreeMap<String, i64> = BTreeMap::new();
    let mut daily: BTreeMap<String, i64> = BTreeMap::new();
    let mut quantity_by_asset: BTreeMap<DbId, (String, i64)> = BTreeMap::new();
    let mut approved_by_resident: BTreeMap<DbId, i64> = BTreeMap::new();
    let mut duration_days: i64 = 0;
    let mut duration_count: i64 = 0;

    for record in records {
        summary.total_loans += 1;
        match record.status {
            LoanStatus::Requested => summary.requested += 1,
            LoanStatus::Borrowed => summary.borrowed += 1,
            LoanStatus::Returned => summary.returned += 1,
            LoanStatus::Rejected => summary.rejected += 1,
        }

        if record.status == LoanStatus::Borrowed {
            active_quantity += i64::from(record.quantity);
        }

        // Approved loans are those that reached the borrowed state,
        // whether or not they have come back yet.
        if matches!(record.status, LoanStatus::Borrowed | LoanStatus::Returned) {
            *approved_by_resident.entry(record.resident_id).or_default() += 1;
        }

        if record.status == LoanStatus::Returned {
            if let Some(returned) = record.actual_return_date {
                duration_days += (returned - record.loan_date).num_days();
                duration_count += 1;
            }
        }

        let by_asset = group_by_asset.entry(record.asset_name.clone()).or_default();
        by_asset.total_loans += 1;
        by_asset.total_quantity += i64::from(record.quantity);

        let by_type = group_by_type.entry(record.asset_type.clone()).or_default();
        by_type.total_loans += 1;
        by_type.total_quantity += i64::from(record.quantity);

        let ranked = quantity_by_asset
            .entry(record.asset_id)
            .or_insert_with(|| (record.asset_name.clone(), 0));
        ranked.1 += i64::from(record.quantity);

        *monthly.entry(record.loan_date.format("%Y-%m").to_string()).or_default() += 1;
        *daily.entry(record.loan_date.format("%Y-%m-%d").to_string()).or_default() += 1;
    }

    let denominator = summary.total_loans.max(1) as f64;
    let percentage = StatusPercentage {
        requested: round2(summary.requested as f64 / denominator * 100.0),
        borrowed: round2(summary.borrowed as f64 / denominator * 100.0),
        returned: round2(summary.returned as f64 / denominator * 100.0),
        rejected: round2(summary.rejected as f64 / denominator * 100.0),
    };

    let average_duration_days = if duration_count > 0 {
        Some(round2(duration_days as f64 / duration_count as f64))
    } else {
        None
    };

    let mut top_assets: Vec<TopAsset> = quantity_by_asset
        .into_iter()
        .map(|(asset_id, (asset_name, total_quantity))| TopAsset {
            asset_id,
            asset_name,
            total_quantity,
        })
        .collect();
    top_assets.sort_by(|a, b| {
        b.total_quantity
            .cmp(&a.total_quantity)
            .then(a.asset_id.cmp(&b.asset_id))
    });
    top_assets.truncate(TOP_RANKING_SIZE);

    let mut top_borrowers: Vec<TopBorrower> = approved_by_resident
        .into_iter()
        .map(|(resident_id, approved_loans)| TopBorrower {
            resident_id,
            approved_loans,
        })
        .collect();
    top_borrowers.sort_by(|a, b| {
        b.approved_loans
            .cmp(&a.approved_loans)
            .then(a.resident_id.cmp(&b.resident_id))
    });
    top_borrowers.truncate(TOP_RANKING_SIZE);

    LoanReport {
        summary,
        percentage,
        active_quantity,
        group_by_asset,
        group_by_type,
        average_duration_days,
        top_assets,
        top_borrowers,
        monthly,
        daily,
    }
}

/// One asset row fed into the asset report.
#[derive(Debug, Clone)]
pub struct AssetRecord {
    pub asset_type: String,
    pub total_stock: i32,
    pub available_stock: i32,
}

#[derive(Debug, Default, PartialEq, Eq, Serialize)]
pub struct AssetSummary {
    pub total_assets: i64,
    pub total_stock: i64,
    pub available_stock: i64,
    pub borrowed_stock: i64,
}

#[derive(Debug, Default, PartialEq, Eq, Serialize)]
pub struct AssetGroupTotals {
    pub total_assets: i64,
    pub total_stock: i64,
    pub available_stock: i64,
}

#[derive(Debug, Serialize)]
pub struct AssetReport {
    pub summary: AssetSummary,
    pub group_by_type: BTreeMap<String, AssetGroupTotals>,
}

/// Aggregate the asset report from pre-filtered records.
pub fn build_asset_report(records: &[AssetRecord]) -> AssetReport {
    let mut summary = AssetSummary::default();
    let mut group_by_type: BTreeMap<String, AssetGroupTotals> = BTreeMap::new();

    for record in records {
        summary.total_assets += 1;
        summary.total_stock += i64::from(record.total_stock);
        summary.available_stock += i64::from(record.available_stock);

        let group = group_by_type.entry(record.asset_type.clone()).or_default();
        group.total_assets += 1;
        group.total_stock += i64::from(record.total_stock);
        group.available_stock += i64::from(record.available_stock);
    }

    summary.borrowed_stock = summary.total_stock - summary.available_stock;

    AssetReport {
        summary,
        group_by_type,
    }
}
