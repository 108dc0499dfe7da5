//! Pure domain logic for the civil-registry back office.
//!
//! This crate holds the rules that do not depend on the database or the
//! HTTP layer: status state machines for asset loans and resident
//! verifications, stock arithmetic for the asset registry, resident
//! snapshot validation, and report aggregation.

pub mod asset;
pub mod error;
pub mod loan;
pub mod report;
pub mod roles;
pub mod types;
pub mod verification;
