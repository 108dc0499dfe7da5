//! Role name constants carried in access-token claims.

/// Administrator: full access to every back-office operation.
pub const ROLE_ADMIN: &str = "admin";

/// Registry staff: may manage assets and resolve loans and verifications.
pub const ROLE_STAFF: &str = "staff";

/// Whether a role may perform staff-level mutations.
pub fn is_staff(role: &str) -> bool {
    role == ROLE_ADMIN || role == ROLE_STAFF
}
