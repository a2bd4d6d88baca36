//! Per-image labels saved by a labeller.

use labelpool_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::models::image::JobImage;

/// A row from the `image_labels` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ImageLabel {
    pub id: DbId,
    pub labeller_id: DbId,
    pub image_id: DbId,
    pub label: String,
    pub updated_at: Timestamp,
}

/// DTO for `PUT /api/v1/partitions/{id}/state`.
///
/// `image_ids[i]` is labelled `labels[i]`.
#[derive(Debug, Clone, Deserialize)]
pub struct SaveLabellingState {
    pub image_ids: Vec<DbId>,
    pub labels: Vec<String>,
    #[serde(default)]
    pub is_complete: bool,
}

/// A labeller's saved progress on their partition.
#[derive(Debug, Clone, Serialize)]
pub struct LabellingState {
    pub partition_id: DbId,
    pub image_ids: Vec<DbId>,
    pub labels: Vec<String>,
    pub is_complete: bool,
}

/// Everything a labeller needs to work on their partition.
#[derive(Debug, Clone, Serialize)]
pub struct LabelInfo {
    pub job_id: DbId,
    pub title: String,
    pub description: String,
    pub labels: Vec<String>,
    pub partition_id: DbId,
    pub partition_number: i32,
    pub is_complete: bool,
    pub images: Vec<JobImage>,
}
