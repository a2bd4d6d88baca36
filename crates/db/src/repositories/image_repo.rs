//! Repository for the `job_images` table.

use labelpool_core::types::DbId;
use sqlx::PgPool;

use crate::models::image::JobImage;

/// Column list for `job_images` queries.
const COLUMNS: &str = "id, job_id, partition_id, position, image_uri, created_at";

/// Read access to partitioned job images. Rows are only written by
/// [`crate::repositories::JobRepo::create_with_partitions`].
pub struct JobImageRepo;

impl JobImageRepo {
    /// Images of one partition, in upload order.
    pub async fn list_by_partition(
        pool: &PgPool,
        partition_id: DbId,
    ) -> Result<Vec<JobImage>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM job_images \
             WHERE partition_id = $1 \
             ORDER BY position"
        );
        sqlx::query_as::<_, JobImage>(&query)
            .bind(partition_id)
            .fetch_all(pool)
            .await
    }

    /// Images of a whole job, in upload order.
    pub async fn list_by_job(pool: &PgPool, job_id: DbId) -> Result<Vec<JobImage>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM job_images \
             WHERE job_id = $1 \
             ORDER BY position"
        );
        sqlx::query_as::<_, JobImage>(&query)
            .bind(job_id)
            .fetch_all(pool)
            .await
    }

    /// The first `per_job` image URIs of each job in `job_ids`, as
    /// `(job_id, image_uri)` pairs ordered by job then position.
    pub async fn previews_for_jobs(
        pool: &PgPool,
        job_ids: &[DbId],
        per_job: i64,
    ) -> Result<Vec<(DbId, String)>, sqlx::Error> {
        sqlx::query_as(
            "SELECT job_id, image_uri FROM ( \
                 SELECT job_id, image_uri, position, \
                        ROW_NUMBER() OVER (PARTITION BY job_id ORDER BY position) AS rn \
                 FROM job_images \
                 WHERE job_id = ANY($1) \
             ) ranked \
             WHERE rn <= $2 \
             ORDER BY job_id, position",
        )
        .bind(job_ids)
        .bind(per_job)
        .fetch_all(pool)
        .await
    }
}
