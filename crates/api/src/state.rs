use std::sync::Arc;

use casting_core::store::EntityStore;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable: the pool is reference-counted and everything else is
/// behind `Arc`.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool, used by the plain CRUD handlers.
    pub pool: casting_db::DbPool,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Store boundary for the integrity and archival workflows.
    pub store: Arc<dyn EntityStore>,
}

impl AppState {
    /// State whose workflows run against Postgres through `pool`.
    pub fn new(pool: casting_db::DbPool, config: ServerConfig) -> Self {
        let store = Arc::new(casting_db::PgEntityStore::new(pool.clone()));
        Self {
            pool,
            config: Arc::new(config),
            store,
        }
    }
}
