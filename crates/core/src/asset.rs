//! Asset registry domain rules: type/status constants, input validation,
//! and the stock arithmetic that backs the loan engine.

use crate::error::{CoreError, FieldErrors};

/// A countable inventory item.
pub const TYPE_ITEM: &str = "item";
/// A reservable room.
pub const TYPE_ROOM: &str = "room";

/// All valid asset types.
pub const VALID_ASSET_TYPES: &[&str] = &[TYPE_ITEM, TYPE_ROOM];

/// Asset accepts loan requests.
pub const STATUS_ACTIVE: &str = "active";
/// Asset is retired from circulation (business soft delete).
pub const STATUS_INACTIVE: &str = "inactive";

/// All valid asset statuses.
pub const VALID_ASSET_STATUSES: &[&str] = &[STATUS_ACTIVE, STATUS_INACTIVE];

/// Maximum length of an asset code.
pub const MAX_CODE_LEN: usize = 30;
/// Maximum length of an asset name.
pub const MAX_NAME_LEN: usize = 100;
/// Maximum length of a location label.
pub const MAX_LOCATION_LEN: usize = 100;

/// Units currently out on loan.
pub fn borrowed_stock(total_stock: i32, available_stock: i32) -> i32 {
    total_stock - available_stock
}

/// Validate that `value` is a known asset type.
pub fn validate_asset_type(value: &str) -> Result<(), CoreError> {
    if VALID_ASSET_TYPES.contains(&value) {
        Ok(())
    } else {
        Err(CoreError::validation(
            "asset_type",
            format!("The asset type must be one of: {}.", VALID_ASSET_TYPES.join(", ")),
        ))
    }
}

/// Validate that `value` is a known asset status.
pub fn validate_asset_status(value: &str) -> Result<(), CoreError> {
    if VALID_ASSET_STATUSES.contains(&value) {
        Ok(())
    } else {
        Err(CoreError::validation(
            "status",
            format!("The status must be one of: {}.", VALID_ASSET_STATUSES.join(", ")),
        ))
    }
}

/// Shape validation for a new asset. Uniqueness of code and name is the
/// repository's responsibility; everything checkable without the database
/// is checked here.
pub fn validate_new_asset(
    code: &str,
    name: &str,
    asset_type: &str,
    total_stock: i32,
    location: Option<&str>,
) -> Result<(), CoreError> {
    let mut errors = FieldErrors::new();

    if code.trim().is_empty() {
        errors.push("code", "The code field is required.");
    } else if code.len() > MAX_CODE_LEN {
        errors.push("code", format!("The code may not exceed {MAX_CODE_LEN} characters."));
    }

    if name.trim().is_empty() {
        errors.push("name", "The name field is required.");
    } else if name.len() > MAX_NAME_LEN {
        errors.push("name", format!("The name may not exceed {MAX_NAME_LEN} characters."));
    }

    if !VALID_ASSET_TYPES.contains(&asset_type) {
        errors.push(
            "asset_type",
            format!("The asset type must be one of: {}.", VALID_ASSET_TYPES.join(", ")),
        );
    }

    if total_stock < 1 {
        errors.push("total_stock", "The total stock must be at least 1.");
    }

    if let Some(location) = location {
        if location.len() > MAX_LOCATION_LEN {
            errors.push(
                "location",
                format!("The location may not exceed {MAX_LOCATION_LEN} characters."),
            );
        }
    }

    errors.into_result()
}

/// Recompute `available_stock` after a total-stock change, preserving the
/// borrowed amount.
///
/// Lowering the total below the currently borrowed quantity is rejected:
/// the units are out on loan and the registry cannot un-borrow them.
pub fn recompute_available(new_total: i32, borrowed: i32) -> Result<i32, CoreError> {
    if new_total < 1 {
        return Err(CoreError::validation(
            "total_stock",
            "The total stock must be at least 1.",
        ));
    }
    if new_total < borrowed {
        return Err(CoreError::validation(
            "total_stock",
            format!("The total stock may not be lowered below the {borrowed} units currently borrowed."),
        ));
    }
    Ok(new_total - borrowed)
}
