//! Asset loan state machine.
//!
//! A loan moves along exactly three edges:
//!
//! ```text
//! requested --approve--> borrowed --return--> returned
//! requested --reject---> rejected
//! ```
//!
//! `returned` and `rejected` are terminal. Stock is reserved only on the
//! requested -> borrowed edge and released only on borrowed -> returned.

use chrono::NaiveDate;

use crate::error::{CoreError, FieldErrors};

pub const STATUS_REQUESTED: &str = "requested";
pub const STATUS_BORROWED: &str = "borrowed";
pub const STATUS_RETURNED: &str = "returned";
pub const STATUS_REJECTED: &str = "rejected";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoanStatus {
    Requested,
    Borrowed,
    Returned,
    Rejected,
}

impl LoanStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            LoanStatus::Requested => STATUS_REQUESTED,
            LoanStatus::Borrowed => STATUS_BORROWED,
            LoanStatus::Returned => STATUS_RETURNED,
            LoanStatus::Rejected => STATUS_REJECTED,
        }
    }

    /// Parse a stored status string. An unknown value means the row was
    /// written outside this service and is treated as corruption.
    pub fn parse(value: &str) -> Result<Self, CoreError> {
        match value {
            STATUS_REQUESTED => Ok(LoanStatus::Requested),
            STATUS_BORROWED => Ok(LoanStatus::Borrowed),
            STATUS_RETURNED => Ok(LoanStatus::Returned),
            STATUS_REJECTED => Ok(LoanStatus::Rejected),
            other => Err(CoreError::Internal(format!("unknown loan status '{other}'"))),
        }
    }
}

fn state_error(action: &'static str, current: LoanStatus) -> CoreError {
    CoreError::State {
        entity: "asset loan",
        action,
        current: current.as_str().to_string(),
    }
}

/// Only requested loans can be approved.
pub fn ensure_can_approve(current: LoanStatus) -> Result<(), CoreError> {
    match current {
        LoanStatus::Requested => Ok(()),
        other => Err(state_error("approve", other)),
    }
}

/// Only borrowed loans can be returned.
pub fn ensure_can_return(current: LoanStatus) -> Result<(), CoreError> {
    match current {
        LoanStatus::Borrowed => Ok(()),
        other => Err(state_error("return", other)),
    }
}

/// Only requested loans can be rejected.
pub fn ensure_can_reject(current: LoanStatus) -> Result<(), CoreError> {
    match current {
        LoanStatus::Requested => Ok(()),
        other => Err(state_error("reject", other)),
    }
}

/// Validate a loan request against the asset's stock as observed at
/// request time.
///
/// This is a soft check: nothing is reserved, and concurrent requests may
/// all pass it. Stock is enforced authoritatively at approval.
pub fn validate_request(
    quantity: i32,
    loan_date: NaiveDate,
    planned_return_date: NaiveDate,
    available_stock: i32,
) -> Result<(), CoreError> {
    let mut errors = FieldErrors::new();

    if quantity < 1 {
        errors.push("quantity", "The quantity must be at least 1.");
    } else if quantity > available_stock {
        errors.push("quantity", "Not enough available stock.");
    }

    if planned_return_date < loan_date {
        errors.push(
            "planned_return_date",
            "The planned return date must be on or after the loan date.",
        );
    }

    errors.into_result()
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn status_round_trips_through_strings() {
        for status in [
            LoanStatus::Requested,
            LoanStatus::Borrowed,
            LoanStatus::Returned,
            LoanStatus::Rejected,
        ] {
            assert_eq!(LoanStatus::parse(status.as_str()).unwrap(), status);
        }
        assert_matches!(LoanStatus::parse("lost"), Err(CoreError::Internal(_)));
    }

    #[test]
    fn approve_only_from_requested() {
        assert!(ensure_can_approve(LoanStatus::Requested).is_ok());
        for status in [LoanStatus::Borrowed, LoanStatus::Returned, LoanStatus::Rejected] {
            assert_matches!(
                ensure_can_approve(status),
                Err(CoreError::State { action: "approve", .. })
            );
        }
    }

    #[test]
    fn return_only_from_borrowed() {
        assert!(ensure_can_return(LoanStatus::Borrowed).is_ok());
        for status in [LoanStatus::Requested, LoanStatus::Returned, LoanStatus::Rejected] {
            assert_matches!(
                ensure_can_return(status),
                Err(CoreError::State { action: "return", .. })
            );
        }
    }

    #[test]
    fn reject_only_from_requested() {
        assert!(ensure_can_reject(LoanStatus::Requested).is_ok());
        for status in [LoanStatus::Borrowed, LoanStatus::Returned, LoanStatus::Rejected] {
            assert_matches!(
                ensure_can_reject(status),
                Err(CoreError::State { action: "reject", .. })
            );
        }
    }

    #[test]
    fn request_accepts_same_day_return() {
        assert!(validate_request(1, date(2026, 1, 10), date(2026, 1, 10), 5).is_ok());
    }

    #[test]
    fn request_rejects_zero_quantity() {
        let err = validate_request(0, date(2026, 1, 10), date(2026, 1, 12), 5).unwrap_err();
        assert_matches!(err, CoreError::Validation { errors, .. } if errors.0.contains_key("quantity"));
    }

    #[test]
    fn request_rejects_quantity_over_available() {
        let err = validate_request(6, date(2026, 1, 10), date(2026, 1, 12), 5).unwrap_err();
        assert_matches!(err, CoreError::Validation { errors, .. } if errors.0["quantity"] == vec!["Not enough available stock.".to_string()]);
    }

    #[test]
    fn request_rejects_return_before_loan() {
        let err = validate_request(1, date(2026, 1, 10), date(2026, 1, 9), 5).unwrap_err();
        assert_matches!(err, CoreError::Validation { errors, .. } if errors.0.contains_key("planned_return_date"));
    }
}
