//! Job image entity (an uploaded image assigned to one partition).

use labelpool_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `job_images` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct JobImage {
    pub id: DbId,
    pub job_id: DbId,
    pub partition_id: DbId,
    /// Global upload position within the job.
    pub position: i32,
    pub image_uri: String,
    pub created_at: Timestamp,
}
