use std::sync::Arc;

use labelpool_core::assignment::AssignmentCoordinator;
use labelpool_core::blob::BlobStore;
use labelpool_db::PgAssignmentStore;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable: every field is a pool handle or behind an `Arc`.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: labelpool_db::DbPool,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Destination of uploaded job images.
    pub blob_store: Arc<dyn BlobStore>,
    /// Race-free labeller admission.
    pub coordinator: Arc<AssignmentCoordinator<PgAssignmentStore>>,
}
