mod asset_repo;
mod loan_repo;
mod verification_repo;

pub use asset_repo::AssetRepo;
pub use loan_repo::LoanRepo;
pub use verification_repo::VerificationRepo;

/// Resolve a whitelisted sort direction, defaulting to descending.
pub(crate) fn sort_direction(requested: Option<&str>) -> &'static str {
    match requested {
        Some(dir) if dir.eq_ignore_ascii_case("asc") => "ASC",
        _ => "DESC",
    }
}
