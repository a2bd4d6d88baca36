//! Repository for the `job_partitions` table.

use labelpool_core::types::DbId;
use sqlx::PgPool;

use crate::models::partition::{JobPartition, PartitionSummary};

/// Column list for `job_partitions` queries.
pub(crate) const COLUMNS: &str =
    "id, job_id, partition_number, capacity, filled, is_full, created_at, updated_at";

/// Read access to job partitions. Writes to `filled` / `is_full` go through
/// [`crate::PgAssignmentStore`] only.
pub struct PartitionRepo;

impl PartitionRepo {
    /// Find a partition by its primary key.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<JobPartition>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM job_partitions WHERE id = $1");
        sqlx::query_as::<_, JobPartition>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Partitions of a job with their image counts.
    pub async fn list_summaries(
        pool: &PgPool,
        job_id: DbId,
    ) -> Result<Vec<PartitionSummary>, sqlx::Error> {
        sqlx::query_as::<_, PartitionSummary>(
            "SELECT p.id, p.partition_number, p.capacity, p.filled, p.is_full, \
                    COUNT(i.id) AS image_count \
             FROM job_partitions p \
             LEFT JOIN job_images i ON i.partition_id = p.id \
             WHERE p.job_id = $1 \
             GROUP BY p.id \
             ORDER BY p.partition_number",
        )
        .bind(job_id)
        .fetch_all(pool)
        .await
    }

    /// The open partition with the lowest partition number.
    ///
    /// Plain read without row locks; the caller must re-validate capacity
    /// before writing.
    pub async fn first_open(pool: &PgPool, job_id: DbId) -> Result<Option<JobPartition>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM job_partitions \
             WHERE job_id = $1 AND is_full = false \
             ORDER BY partition_number \
             LIMIT 1"
        );
        sqlx::query_as::<_, JobPartition>(&query)
            .bind(job_id)
            .fetch_optional(pool)
            .await
    }
}
