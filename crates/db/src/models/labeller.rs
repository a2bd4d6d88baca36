//! Labeller seat entity.

use labelpool_core::assignment::Assignment;
use labelpool_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `job_labellers` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct JobLabeller {
    pub id: DbId,
    pub job_id: DbId,
    pub partition_id: DbId,
    pub user_id: DbId,
    pub is_complete: bool,
    pub assigned_at: Timestamp,
    pub completed_at: Option<Timestamp>,
}

impl From<JobLabeller> for Assignment {
    fn from(row: JobLabeller) -> Self {
        Assignment {
            id: row.id,
            job_id: row.job_id,
            partition_id: row.partition_id,
            user_id: row.user_id,
            assigned_at: row.assigned_at,
        }
    }
}
