//! Assignment of labellers to job partitions.
//!
//! [`AssignmentCoordinator::accept`] picks the first open partition of a job
//! with a plain read, then asks the store to reserve a slot atomically. The
//! reservation re-checks `filled < capacity`, records the labeller, bumps the
//! counter and flips `is_full` on the last slot, all as one unit. A lost race
//! sends the caller back to partition selection, up to a bounded number of
//! attempts.

use std::error::Error as StdError;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;

use crate::types::{DbId, Timestamp};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Default number of reservation attempts per accept call.
pub const DEFAULT_MAX_RETRIES: u32 = 8;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Snapshot of a partition as seen during selection. May be stale by the
/// time it is handed to [`AssignmentStore::try_reserve`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PartitionSlot {
    pub partition_id: DbId,
    pub job_id: DbId,
    pub partition_number: i32,
    pub capacity: i32,
    pub filled: i32,
}

/// A labeller's seat on a partition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Assignment {
    pub id: DbId,
    pub job_id: DbId,
    pub partition_id: DbId,
    pub user_id: DbId,
    pub assigned_at: Timestamp,
}

/// Whether a user may hold more than one seat within the same job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DuplicatePolicy {
    /// A second accept by the same user is declined with the existing seat.
    #[default]
    Reject,
    /// Every accept takes a new seat, possibly on another partition.
    Allow,
}

/// Tunables for [`AssignmentCoordinator`].
#[derive(Debug, Clone, Copy)]
pub struct CoordinatorConfig {
    /// Reservation attempts before the call is declined as contended.
    pub max_retries: u32,
    pub duplicate_policy: DuplicatePolicy,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            duplicate_policy: DuplicatePolicy::default(),
        }
    }
}

/// Result of an accept call. Only `Assigned` creates state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum AcceptOutcome {
    /// A seat was reserved.
    Assigned(Assignment),
    /// Every partition of the job is full.
    JobFull,
    /// The user already holds a seat in this job.
    AlreadyAssigned(Assignment),
    /// Every attempt lost its race; the caller may try again later.
    Contended,
}

impl AcceptOutcome {
    /// `true` when this call created a new seat.
    pub fn is_assigned(&self) -> bool {
        matches!(self, Self::Assigned(_))
    }

    /// Short machine-readable name of the outcome.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Assigned(_) => "assigned",
            Self::JobFull => "job_full",
            Self::AlreadyAssigned(_) => "already_assigned",
            Self::Contended => "contended",
        }
    }

    /// The seat this outcome refers to, if any.
    pub fn assignment(&self) -> Option<&Assignment> {
        match self {
            Self::Assigned(a) | Self::AlreadyAssigned(a) => Some(a),
            Self::JobFull | Self::Contended => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// A failure of the storage backend itself.
#[derive(Debug, thiserror::Error)]
#[error("Assignment store error: {0}")]
pub struct StoreError(#[source] pub Box<dyn StdError + Send + Sync>);

impl StoreError {
    pub fn new(err: impl StdError + Send + Sync + 'static) -> Self {
        Self(Box::new(err))
    }
}

/// Why a single reservation attempt did not produce a seat.
#[derive(Debug, thiserror::Error)]
pub enum ReserveError {
    /// The partition was already full when the reservation ran.
    #[error("Partition {0} is already full")]
    CapacityExceeded(DbId),

    /// The backend aborted the attempt because of contention.
    #[error("Reservation on partition {0} aborted by a concurrent update")]
    Conflict(DbId),

    /// Under [`DuplicatePolicy::Reject`], the user already holds a seat.
    #[error("User already holds an assignment in this job")]
    AlreadyAssigned(Assignment),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Errors surfaced by [`AssignmentCoordinator::accept`].
#[derive(Debug, thiserror::Error)]
pub enum AssignmentError {
    #[error("Job {0} not found")]
    NotFound(DbId),

    #[error(transparent)]
    Store(#[from] StoreError),
}

// ---------------------------------------------------------------------------
// Store seam
// ---------------------------------------------------------------------------

/// Persistence operations the coordinator needs.
#[async_trait]
pub trait AssignmentStore: Send + Sync {
    async fn job_exists(&self, job_id: DbId) -> Result<bool, StoreError>;

    /// The open partition with the lowest partition number, if any. Weak
    /// consistency is acceptable here.
    async fn first_open_partition(&self, job_id: DbId)
        -> Result<Option<PartitionSlot>, StoreError>;

    /// The user's existing seat in the job, if any.
    async fn find_assignment(
        &self,
        job_id: DbId,
        user_id: DbId,
    ) -> Result<Option<Assignment>, StoreError>;

    /// Atomically re-check capacity, create the seat, increment `filled` and
    /// set `is_full` when the last slot is taken. Nothing is written when an
    /// error is returned.
    async fn try_reserve(
        &self,
        slot: &PartitionSlot,
        user_id: DbId,
        policy: DuplicatePolicy,
    ) -> Result<Assignment, ReserveError>;
}

#[async_trait]
impl<T: AssignmentStore + ?Sized> AssignmentStore for Arc<T> {
    async fn job_exists(&self, job_id: DbId) -> Result<bool, StoreError> {
        (**self).job_exists(job_id).await
    }

    async fn first_open_partition(
        &self,
        job_id: DbId,
    ) -> Result<Option<PartitionSlot>, StoreError> {
        (**self).first_open_partition(job_id).await
    }

    async fn find_assignment(
        &self,
        job_id: DbId,
        user_id: DbId,
    ) -> Result<Option<Assignment>, StoreError> {
        (**self).find_assignment(job_id, user_id).await
    }

    async fn try_reserve(
        &self,
        slot: &PartitionSlot,
        user_id: DbId,
        policy: DuplicatePolicy,
    ) -> Result<Assignment, ReserveError> {
        (**self).try_reserve(slot, user_id, policy).await
    }
}

// ---------------------------------------------------------------------------
// Coordinator
// ---------------------------------------------------------------------------

/// Hands out partition seats to labellers without overbooking.
#[derive(Debug, Clone)]
pub struct AssignmentCoordinator<S> {
    store: S,
    config: CoordinatorConfig,
}

impl<S: AssignmentStore> AssignmentCoordinator<S> {
    pub fn new(store: S, config: CoordinatorConfig) -> Self {
        Self { store, config }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Reserve a seat for `user_id` on the first partition of `job_id` that
    /// still has room.
    pub async fn accept(
        &self,
        job_id: DbId,
        user_id: DbId,
    ) -> Result<AcceptOutcome, AssignmentError> {
        if !self.store.job_exists(job_id).await? {
            return Err(AssignmentError::NotFound(job_id));
        }

        let policy = self.config.duplicate_policy;
        if policy == DuplicatePolicy::Reject {
            if let Some(existing) = self.store.find_assignment(job_id, user_id).await? {
                tracing::debug!(
                    job_id,
                    user_id,
                    partition_id = existing.partition_id,
                    "User already assigned",
                );
                return Ok(AcceptOutcome::AlreadyAssigned(existing));
            }
        }

        for attempt in 1..=self.config.max_retries.max(1) {
            let Some(slot) = self.store.first_open_partition(job_id).await? else {
                tracing::debug!(job_id, user_id, "No open partition left");
                return Ok(AcceptOutcome::JobFull);
            };

            match self.store.try_reserve(&slot, user_id, policy).await {
                Ok(assignment) => {
                    tracing::info!(
                        job_id,
                        user_id,
                        partition_id = slot.partition_id,
                        partition_number = slot.partition_number,
                        attempt,
                        "Labeller assigned",
                    );
                    return Ok(AcceptOutcome::Assigned(assignment));
                }
                Err(ReserveError::CapacityExceeded(partition_id))
                | Err(ReserveError::Conflict(partition_id)) => {
                    tracing::debug!(
                        job_id,
                        user_id,
                        partition_id,
                        attempt,
                        "Reservation lost race, retrying",
                    );
                }
                Err(ReserveError::AlreadyAssigned(existing)) => {
                    return Ok(AcceptOutcome::AlreadyAssigned(existing));
                }
                Err(ReserveError::Store(err)) => return Err(err.into()),
            }
        }

        tracing::warn!(
            job_id,
            user_id,
            max_retries = self.config.max_retries,
            "Accept declined after exhausting retries",
        );
        Ok(AcceptOutcome::Contended)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
