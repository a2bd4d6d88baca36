//! Route tree for the `/api/v1` prefix.

pub mod health;
pub mod jobs;
pub mod partitions;

use axum::Router;

use crate::state::AppState;

/// All `/api/v1` routes. Every handler below requires a Bearer token.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // Job submission, browsing and accepting seats.
        .nest("/jobs", jobs::router())
        // A labeller's saved work on their partition.
        .nest("/partitions", partitions::router())
}
