use std::sync::Arc;

use crate::clients::{RegionDirectory, ResidentDirectory};
use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via
/// `State<AppState>`.
///
/// Cheaply cloneable (inner data is behind `Arc`).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: civica_db::DbPool,
    /// Server configuration (accessed by middleware and handlers).
    pub config: Arc<ServerConfig>,
    /// Resident lookup service (best-effort enrichment + snapshots).
    pub residents: Arc<dyn ResidentDirectory>,
    /// Region lookup service (best-effort enrichment).
    pub regions: Arc<dyn RegionDirectory>,
}
