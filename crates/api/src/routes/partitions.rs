//! Route definitions for the `/partitions` resource.

use axum::routing::get;
use axum::Router;

use crate::handlers::partitions;
use crate::state::AppState;

/// Routes mounted at `/partitions`.
///
/// ```text
/// GET    /{id}/state  -> get_state
/// PUT    /{id}/state  -> save_state
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route(
        "/{id}/state",
        get(partitions::get_state).put(partitions::save_state),
    )
}
