pub mod asset_loans;
pub mod assets;
pub mod health;
pub mod verifications;
