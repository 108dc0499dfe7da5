//! Database access layer: connection pool helpers, migrations, models,
//! and repositories.
//!
//! All multi-entity mutations (loan approval/return, verification
//! resolution) are single transactional functions in the repository
//! layer; handlers never compose partial writes.

pub mod models;
pub mod repositories;

use civica_core::error::CoreError;
use sqlx::postgres::PgPoolOptions;

pub type DbPool = sqlx::PgPool;

/// Error type returned by repository operations that enforce domain rules
/// inside the database transaction.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

/// Create a connection pool from a database URL.
pub async fn create_pool(database_url: &str) -> Result<DbPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(20)
        .connect(database_url)
        .await
}

/// Verify the database is reachable.
pub async fn health_check(pool: &DbPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}

/// Apply any pending migrations.
pub async fn run_migrations(pool: &DbPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}

/// Default page size for listings.
pub const DEFAULT_PER_PAGE: i64 = 10;
/// Maximum page size for listings.
pub const MAX_PER_PAGE: i64 = 100;

/// Clamp a requested page size into `[1, MAX_PER_PAGE]`.
pub fn clamp_per_page(requested: Option<i64>, default: i64) -> i64 {
    requested.unwrap_or(default).clamp(1, MAX_PER_PAGE)
}

/// Clamp a requested page number to at least 1.
pub fn clamp_page(requested: Option<i64>) -> i64 {
    requested.unwrap_or(1).max(1)
}

/// Whether a sqlx error is a unique violation on the named constraint or
/// index.
pub fn is_unique_violation(error: &sqlx::Error, constraint: &str) -> bool {
    match error {
        sqlx::Error::Database(db_err) => {
            db_err.code().as_deref() == Some("23505")
                && db_err.constraint() == Some(constraint)
        }
        _ => false,
    }
}
