//! Route definitions for the `/jobs` resource.

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use labelpool_core::blob::{MAX_UPLOAD_BYTES, MAX_UPLOAD_FILES};

use crate::handlers::jobs;
use crate::state::AppState;

/// Upper bound for a whole job submission body. Per-file and per-batch
/// limits are checked again after parsing.
const MAX_SUBMISSION_BYTES: usize = 1024 * 1024 * 1024;

/// Routes mounted at `/jobs`.
///
/// ```text
/// GET    /                 -> list_jobs
/// POST   /                 -> create_job (multipart)
/// GET    /{id}             -> get_job
/// POST   /{id}/accept      -> accept_job
/// GET    /{id}/label-info  -> label_info
/// ```
pub fn router() -> Router<AppState> {
    let body_limit = MAX_SUBMISSION_BYTES.min(MAX_UPLOAD_BYTES.saturating_mul(MAX_UPLOAD_FILES));

    Router::new()
        .route(
            "/",
            get(jobs::list_jobs)
                .post(jobs::create_job)
                .layer(DefaultBodyLimit::max(body_limit)),
        )
        .route("/{id}", get(jobs::get_job))
        .route("/{id}/accept", post(jobs::accept_job))
        .route("/{id}/label-info", get(jobs::label_info))
}
