//! Postgres implementation of the core [`AssignmentStore`].
//!
//! A reservation is one transaction around a conditional update:
//!
//! ```sql
//! UPDATE job_partitions
//! SET filled = filled + 1, is_full = (filled + 1 = capacity)
//! WHERE id = $1 AND filled < capacity
//! ```
//!
//! Concurrent updates of the same row queue on its row lock and re-evaluate
//! the `WHERE` clause after the previous holder commits, so a partition can
//! never be pushed past its capacity. When no row matches, the partition is
//! full and nothing is written. Different partitions never block each other.

use async_trait::async_trait;
use labelpool_core::assignment::{
    Assignment, AssignmentStore, DuplicatePolicy, PartitionSlot, ReserveError, StoreError,
};
use labelpool_core::types::DbId;
use sqlx::PgPool;

use crate::models::labeller::JobLabeller;
use crate::repositories::labeller_repo::COLUMNS as LABELLER_COLUMNS;
use crate::repositories::{JobRepo, LabellerRepo, PartitionRepo};

/// PostgreSQL SQLSTATE codes for aborts caused by contention.
const SERIALIZATION_FAILURE: &str = "40001";
const DEADLOCK_DETECTED: &str = "40P01";

/// Assignment store backed by the `job_partitions` and `job_labellers` tables.
#[derive(Debug, Clone)]
pub struct PgAssignmentStore {
    pool: PgPool,
}

impl PgAssignmentStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// `true` when Postgres aborted the statement because of a concurrent
/// transaction, in which case the reservation may simply be retried.
fn is_contention(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => matches!(
            db_err.code().as_deref(),
            Some(SERIALIZATION_FAILURE) | Some(DEADLOCK_DETECTED)
        ),
        _ => false,
    }
}

fn reserve_error(err: sqlx::Error, partition_id: DbId) -> ReserveError {
    if is_contention(&err) {
        ReserveError::Conflict(partition_id)
    } else {
        ReserveError::Store(StoreError::new(err))
    }
}

#[async_trait]
impl AssignmentStore for PgAssignmentStore {
    async fn job_exists(&self, job_id: DbId) -> Result<bool, StoreError> {
        JobRepo::exists(&self.pool, job_id)
            .await
            .map_err(StoreError::new)
    }

    async fn first_open_partition(
        &self,
        job_id: DbId,
    ) -> Result<Option<PartitionSlot>, StoreError> {
        let partition = PartitionRepo::first_open(&self.pool, job_id)
            .await
            .map_err(StoreError::new)?;
        Ok(partition.as_ref().map(PartitionSlot::from))
    }

    async fn find_assignment(
        &self,
        job_id: DbId,
        user_id: DbId,
    ) -> Result<Option<Assignment>, StoreError> {
        let row = LabellerRepo::find_by_job_and_user(&self.pool, job_id, user_id)
            .await
            .map_err(StoreError::new)?;
        Ok(row.map(Assignment::from))
    }

    async fn try_reserve(
        &self,
        slot: &PartitionSlot,
        user_id: DbId,
        policy: DuplicatePolicy,
    ) -> Result<Assignment, ReserveError> {
        let partition_id = slot.partition_id;
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| reserve_error(e, partition_id))?;

        if policy == DuplicatePolicy::Reject {
            // Serialize admissions of the same user to the same job until commit.
            sqlx::query("SELECT pg_advisory_xact_lock(hashtextextended($1::TEXT || ':' || $2::TEXT, 0))")
                .bind(slot.job_id)
                .bind(user_id)
                .execute(&mut *tx)
                .await
                .map_err(|e| reserve_error(e, partition_id))?;

            let query = format!(
                "SELECT {LABELLER_COLUMNS} FROM job_labellers \
                 WHERE job_id = $1 AND user_id = $2 \
                 ORDER BY id \
                 LIMIT 1"
            );
            let existing = sqlx::query_as::<_, JobLabeller>(&query)
                .bind(slot.job_id)
                .bind(user_id)
                .fetch_optional(&mut *tx)
                .await
                .map_err(|e| reserve_error(e, partition_id))?;
            if let Some(existing) = existing {
                return Err(ReserveError::AlreadyAssigned(existing.into()));
            }
        }

        let reserved: Option<(i32, i32, bool)> = sqlx::query_as(
            "UPDATE job_partitions \
             SET filled = filled + 1, \
                 is_full = (filled + 1 = capacity), \
                 updated_at = NOW() \
             WHERE id = $1 AND job_id = $2 AND filled < capacity \
             RETURNING filled, capacity, is_full",
        )
        .bind(partition_id)
        .bind(slot.job_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| reserve_error(e, partition_id))?;

        let Some((filled, capacity, is_full)) = reserved else {
            return Err(ReserveError::CapacityExceeded(partition_id));
        };

        let query = format!(
            "INSERT INTO job_labellers (job_id, partition_id, user_id) \
             VALUES ($1, $2, $3) \
             RETURNING {LABELLER_COLUMNS}"
        );
        let labeller = sqlx::query_as::<_, JobLabeller>(&query)
            .bind(slot.job_id)
            .bind(partition_id)
            .bind(user_id)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| reserve_error(e, partition_id))?;

        tx.commit()
            .await
            .map_err(|e| reserve_error(e, partition_id))?;

        if is_full {
            tracing::info!(
                job_id = slot.job_id,
                partition_id,
                filled,
                capacity,
                "Partition is now full",
            );
        }
        Ok(labeller.into())
    }
}
