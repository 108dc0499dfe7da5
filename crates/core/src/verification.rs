//! Resident verification state machine and snapshot validation.
//!
//! A verification starts `pending` and is resolved exactly once, to
//! `verified` or `rejected`. The `verified_data` column holds a JSON
//! snapshot of the resident record as evidence of what was reviewed.

use serde_json::Value;

use crate::error::{CoreError, FieldErrors};
use crate::types::DbId;

pub const STATUS_PENDING: &str = "pending";
pub const STATUS_VERIFIED: &str = "verified";
pub const STATUS_REJECTED: &str = "rejected";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerificationStatus {
    Pending,
    Verified,
    Rejected,
}

impl VerificationStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            VerificationStatus::Pending => STATUS_PENDING,
            VerificationStatus::Verified => STATUS_VERIFIED,
            VerificationStatus::Rejected => STATUS_REJECTED,
        }
    }

    /// Parse a status string supplied by a client.
    pub fn parse_input(value: &str) -> Result<Self, CoreError> {
        Self::from_str_opt(value).ok_or_else(|| {
            CoreError::validation(
                "status",
                format!("The status must be one of: {STATUS_PENDING}, {STATUS_VERIFIED}, {STATUS_REJECTED}."),
            )
        })
    }

    /// Parse a status string read back from storage.
    pub fn parse(value: &str) -> Result<Self, CoreError> {
        Self::from_str_opt(value)
            .ok_or_else(|| CoreError::Internal(format!("unknown verification status '{value}'")))
    }

    fn from_str_opt(value: &str) -> Option<Self> {
        match value {
            STATUS_PENDING => Some(VerificationStatus::Pending),
            STATUS_VERIFIED => Some(VerificationStatus::Verified),
            STATUS_REJECTED => Some(VerificationStatus::Rejected),
            _ => None,
        }
    }
}

/// Both resolution edges leave `pending`; anything else is terminal.
pub fn ensure_pending(action: &'static str, current: VerificationStatus) -> Result<(), CoreError> {
    match current {
        VerificationStatus::Pending => Ok(()),
        other => Err(CoreError::State {
            entity: "verification",
            action,
            current: other.as_str().to_string(),
        }),
    }
}

/// Notes stored when a verification is rejected.
pub fn rejection_notes(reason: &str) -> String {
    format!("Rejected: {reason}")
}

/// Snapshot recorded when the resident directory cannot be reached at
/// approval time. The marker keeps degraded approvals auditable.
pub fn placeholder_snapshot(resident_id: DbId) -> Value {
    serde_json::json!({
        "id": resident_id,
        "name": format!("Resident #{resident_id}"),
        "placeholder": true,
    })
}

/// Required string fields of a resident snapshot, with maximum lengths.
const SNAPSHOT_FIELDS: &[(&str, usize)] = &[
    ("national_number_id", 16),
    ("name", 100),
    ("place_of_birth", 50),
    ("religion", 20),
    ("rt", 3),
    ("rw", 3),
    ("education", 50),
    ("occupation", 50),
    ("marital_status", 20),
    ("citizenship", 3),
    ("blood_type", 3),
    ("disabilities", 50),
    ("father_name", 100),
    ("mother_name", 100),
];

/// Validate a client-supplied `verified_data` snapshot against the
/// resident schema.
pub fn validate_snapshot(snapshot: &Value) -> Result<(), CoreError> {
    let Some(object) = snapshot.as_object() else {
        return Err(CoreError::validation(
            "verified_data",
            "The verified data must be a JSON object.",
        ));
    };

    let mut errors = FieldErrors::new();

    for (field, max_len) in SNAPSHOT_FIELDS {
        match object.get(*field).and_then(Value::as_str) {
            None => errors.push(field, "This field is required."),
            Some(value) if value.trim().is_empty() => {
                errors.push(field, "This field is required.")
            }
            Some(value) if value.len() > *max_len => {
                errors.push(field, format!("May not exceed {max_len} characters."))
            }
            Some(_) => {}
        }
    }

    match object.get("gender").and_then(Value::as_str) {
        Some("male") | Some("female") => {}
        _ => errors.push("gender", "The gender must be male or female."),
    }

    match object.get("date_of_birth").and_then(Value::as_str) {
        Some(value) if value.parse::<chrono::NaiveDate>().is_ok() => {}
        _ => errors.push("date_of_birth", "The date of birth must be a valid date."),
    }

    if let Some(region_id) = object.get("region_id") {
        if !region_id.is_null() && !region_id.is_i64() {
            errors.push("region_id", "The region id must be an integer.");
        }
    }

    errors.into_result()
}
