//! Repository for the `job_labellers` table.

use labelpool_core::types::DbId;
use sqlx::PgPool;

use crate::models::labeller::JobLabeller;

/// Column list for `job_labellers` queries.
pub(crate) const COLUMNS: &str =
    "id, job_id, partition_id, user_id, is_complete, assigned_at, completed_at";

/// Read access to labeller seats. Seats are only created by
/// [`crate::PgAssignmentStore`].
pub struct LabellerRepo;

impl LabellerRepo {
    /// The user's earliest seat in a job, if any.
    pub async fn find_by_job_and_user(
        pool: &PgPool,
        job_id: DbId,
        user_id: DbId,
    ) -> Result<Option<JobLabeller>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM job_labellers \
             WHERE job_id = $1 AND user_id = $2 \
             ORDER BY id \
             LIMIT 1"
        );
        sqlx::query_as::<_, JobLabeller>(&query)
            .bind(job_id)
            .bind(user_id)
            .fetch_optional(pool)
            .await
    }

    /// The user's seat on a specific partition, if any.
    pub async fn find_by_partition_and_user(
        pool: &PgPool,
        partition_id: DbId,
        user_id: DbId,
    ) -> Result<Option<JobLabeller>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM job_labellers \
             WHERE partition_id = $1 AND user_id = $2 \
             ORDER BY id \
             LIMIT 1"
        );
        sqlx::query_as::<_, JobLabeller>(&query)
            .bind(partition_id)
            .bind(user_id)
            .fetch_optional(pool)
            .await
    }

    /// All seats on a partition, in assignment order.
    pub async fn list_by_partition(
        pool: &PgPool,
        partition_id: DbId,
    ) -> Result<Vec<JobLabeller>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM job_labellers \
             WHERE partition_id = $1 \
             ORDER BY id"
        );
        sqlx::query_as::<_, JobLabeller>(&query)
            .bind(partition_id)
            .fetch_all(pool)
            .await
    }

    /// Count seats on a partition.
    pub async fn count_by_partition(pool: &PgPool, partition_id: DbId) -> Result<i64, sqlx::Error> {
        let row: (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM job_labellers WHERE partition_id = $1")
                .bind(partition_id)
                .fetch_one(pool)
                .await?;
        Ok(row.0)
    }
}
