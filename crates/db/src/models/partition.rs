//! Job partition entity.

use labelpool_core::assignment::PartitionSlot;
use labelpool_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `job_partitions` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct JobPartition {
    pub id: DbId,
    pub job_id: DbId,
    pub partition_number: i32,
    pub capacity: i32,
    pub filled: i32,
    pub is_full: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl From<&JobPartition> for PartitionSlot {
    fn from(p: &JobPartition) -> Self {
        PartitionSlot {
            partition_id: p.id,
            job_id: p.job_id,
            partition_number: p.partition_number,
            capacity: p.capacity,
            filled: p.filled,
        }
    }
}

/// A partition with its image count, for job detail views.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct PartitionSummary {
    pub id: DbId,
    pub partition_number: i32,
    pub capacity: i32,
    pub filled: i32,
    pub is_full: bool,
    pub image_count: i64,
}
