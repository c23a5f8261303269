use std::sync::Arc;

use wtstat_db::DbPool;
use wtstat_engine::Orchestrator;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<Orchestrator>,
    /// Present when running on PostgreSQL; used by the health check.
    pub pool: Option<DbPool>,
    pub config: Arc<ServerConfig>,
}
