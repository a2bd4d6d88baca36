//! Repository for the `jobs` table and the rows created alongside a job.

use labelpool_core::job_plan::JobPlan;
use labelpool_core::types::DbId;
use sqlx::PgPool;

use crate::models::job::{CreateJob, Job, JobListQuery};
use crate::models::partition::JobPartition;
use crate::repositories::partition_repo::COLUMNS as PARTITION_COLUMNS;

/// Column list for `jobs` queries.
const COLUMNS: &str = "id, title, description, credits, owner_id, created_at, updated_at";

/// Maximum page size for job listing.
const MAX_LIMIT: i64 = 100;

/// Default page size for job listing.
const DEFAULT_LIMIT: i64 = 50;

/// Provides CRUD operations for labelling jobs.
pub struct JobRepo;

impl JobRepo {
    /// Create a job together with its labels, partitions and images.
    ///
    /// Runs in a single transaction: readers never observe a job whose
    /// partitions or image assignments are only partly written. Any failure
    /// rolls the whole job back.
    pub async fn create_with_partitions(
        pool: &PgPool,
        owner_id: DbId,
        input: &CreateJob,
        plan: &JobPlan,
    ) -> Result<(Job, Vec<JobPartition>), sqlx::Error> {
        let mut tx = pool.begin().await?;

        let query = format!(
            "INSERT INTO jobs (title, description, credits, owner_id) \
             VALUES ($1, $2, $3, $4) \
             RETURNING {COLUMNS}"
        );
        let job = sqlx::query_as::<_, Job>(&query)
            .bind(&input.title)
            .bind(&input.description)
            .bind(input.credits)
            .bind(owner_id)
            .fetch_one(&mut *tx)
            .await?;

        let positions: Vec<i32> = (0..plan.labels.len() as i32).collect();
        sqlx::query(
            "INSERT INTO job_labels (job_id, position, label) \
             SELECT $1, * FROM UNNEST($2::INTEGER[], $3::TEXT[])",
        )
        .bind(job.id)
        .bind(&positions)
        .bind(&plan.labels)
        .execute(&mut *tx)
        .await?;

        let partition_query = format!(
            "INSERT INTO job_partitions (job_id, partition_number, capacity) \
             VALUES ($1, $2, $3) \
             RETURNING {PARTITION_COLUMNS}"
        );
        let mut partitions = Vec::with_capacity(plan.partitions.len());
        let mut next_position: i32 = 0;
        for planned in &plan.partitions {
            let partition = sqlx::query_as::<_, JobPartition>(&partition_query)
                .bind(job.id)
                .bind(planned.partition_number)
                .bind(planned.capacity)
                .fetch_one(&mut *tx)
                .await?;

            if !planned.image_uris.is_empty() {
                let count = planned.image_uris.len() as i32;
                let image_positions: Vec<i32> = (next_position..next_position + count).collect();
                next_position += count;

                sqlx::query(
                    "INSERT INTO job_images (job_id, partition_id, position, image_uri) \
                     SELECT $1, $2, * FROM UNNEST($3::INTEGER[], $4::TEXT[])",
                )
                .bind(job.id)
                .bind(partition.id)
                .bind(&image_positions)
                .bind(&planned.image_uris)
                .execute(&mut *tx)
                .await?;
            }

            partitions.push(partition);
        }

        tx.commit().await?;
        Ok((job, partitions))
    }

    /// Find a job by its ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Job>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM jobs WHERE id = $1");
        sqlx::query_as::<_, Job>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Check whether a job exists.
    pub async fn exists(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let row: (bool,) = sqlx::query_as("SELECT EXISTS(SELECT 1 FROM jobs WHERE id = $1)")
            .bind(id)
            .fetch_one(pool)
            .await?;
        Ok(row.0)
    }

    /// List jobs, newest first, with pagination.
    pub async fn list(pool: &PgPool, params: &JobListQuery) -> Result<Vec<Job>, sqlx::Error> {
        let limit = params.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
        let offset = params.offset.unwrap_or(0).max(0);

        let query = format!(
            "SELECT {COLUMNS} FROM jobs \
             ORDER BY created_at DESC, id DESC \
             LIMIT $1 OFFSET $2"
        );
        sqlx::query_as::<_, Job>(&query)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// The job's label set, in submission order.
    pub async fn list_labels(pool: &PgPool, job_id: DbId) -> Result<Vec<String>, sqlx::Error> {
        let rows: Vec<(String,)> =
            sqlx::query_as("SELECT label FROM job_labels WHERE job_id = $1 ORDER BY position")
                .bind(job_id)
                .fetch_all(pool)
                .await?;
        Ok(rows.into_iter().map(|(label,)| label).collect())
    }
}
