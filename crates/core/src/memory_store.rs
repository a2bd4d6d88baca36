//! In-process [`AssignmentStore`] backed by atomics.
//!
//! Each partition keeps its `filled` counter in an [`AtomicI32`]; a
//! reservation is a conditional compare-and-swap that only succeeds while
//! `filled < capacity`, so concurrent callers can never push a partition past
//! its capacity. Partitions of a job do not share a lock, except that the
//! duplicate check under [`DuplicatePolicy::Reject`] holds a per-job admission
//! lock so one user cannot slip into two partitions at once.
//!
//! Used by tests and by tooling that runs without a database.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicI32, AtomicI64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

use async_trait::async_trait;

use crate::assignment::{
    Assignment, AssignmentStore, DuplicatePolicy, PartitionSlot, ReserveError, StoreError,
};
use crate::error::CoreError;
use crate::types::DbId;

/// Point-in-time view of one partition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartitionSnapshot {
    pub id: DbId,
    pub job_id: DbId,
    pub partition_number: i32,
    pub capacity: i32,
    pub filled: i32,
    pub is_full: bool,
}

struct MemoryPartition {
    id: DbId,
    job_id: DbId,
    partition_number: i32,
    capacity: i32,
    filled: AtomicI32,
    is_full: AtomicBool,
    labellers: Mutex<Vec<Assignment>>,
}

impl MemoryPartition {
    fn snapshot(&self) -> PartitionSnapshot {
        PartitionSnapshot {
            id: self.id,
            job_id: self.job_id,
            partition_number: self.partition_number,
            capacity: self.capacity,
            filled: self.filled.load(Ordering::Acquire),
            is_full: self.is_full.load(Ordering::Acquire),
        }
    }

    fn labellers(&self) -> MutexGuard<'_, Vec<Assignment>> {
        self.labellers.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

struct MemoryJob {
    /// Ordered by partition number.
    partitions: Vec<Arc<MemoryPartition>>,
    admission: Mutex<()>,
}

impl MemoryJob {
    fn find_assignment(&self, user_id: DbId) -> Option<Assignment> {
        self.partitions.iter().find_map(|p| {
            p.labellers()
                .iter()
                .find(|a| a.user_id == user_id)
                .cloned()
        })
    }
}

/// Thread-safe in-memory store of jobs, partitions and labeller seats.
#[derive(Default)]
pub struct MemoryAssignmentStore {
    jobs: RwLock<HashMap<DbId, Arc<MemoryJob>>>,
    next_id: AtomicI64,
}

impl MemoryAssignmentStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_id(&self) -> DbId {
        self.next_id.fetch_add(1, Ordering::Relaxed) + 1
    }

    fn job(&self, job_id: DbId) -> Option<Arc<MemoryJob>> {
        self.jobs
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&job_id)
            .cloned()
    }

    fn find_partition(&self, partition_id: DbId) -> Option<Arc<MemoryPartition>> {
        self.jobs
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .flat_map(|job| job.partitions.iter())
            .find(|p| p.id == partition_id)
            .cloned()
    }

    /// Register a job whose partitions have the given capacities, in
    /// partition-number order. Returns the new partition ids.
    pub fn add_job(&self, job_id: DbId, capacities: &[i32]) -> Vec<DbId> {
        let partitions: Vec<Arc<MemoryPartition>> = capacities
            .iter()
            .enumerate()
            .map(|(number, &capacity)| {
                Arc::new(MemoryPartition {
                    id: self.next_id(),
                    job_id,
                    partition_number: number as i32,
                    capacity,
                    filled: AtomicI32::new(0),
                    is_full: AtomicBool::new(capacity <= 0),
                    labellers: Mutex::new(Vec::new()),
                })
            })
            .collect();
        let ids = partitions.iter().map(|p| p.id).collect();

        self.jobs
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(
                job_id,
                Arc::new(MemoryJob {
                    partitions,
                    admission: Mutex::new(()),
                }),
            );
        ids
    }

    pub fn partition(&self, partition_id: DbId) -> Option<PartitionSnapshot> {
        self.find_partition(partition_id).map(|p| p.snapshot())
    }

    /// All seats on a partition, in reservation order.
    pub fn assignments_for(&self, partition_id: DbId) -> Vec<Assignment> {
        self.find_partition(partition_id)
            .map(|p| p.labellers().clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl AssignmentStore for MemoryAssignmentStore {
    async fn job_exists(&self, job_id: DbId) -> Result<bool, StoreError> {
        Ok(self.job(job_id).is_some())
    }

    async fn first_open_partition(
        &self,
        job_id: DbId,
    ) -> Result<Option<PartitionSlot>, StoreError> {
        let Some(job) = self.job(job_id) else {
            return Ok(None);
        };
        Ok(job
            .partitions
            .iter()
            // The counter is bumped before `is_full` is flipped.
            .find(|p| {
                !p.is_full.load(Ordering::Acquire)
                    && p.filled.load(Ordering::Acquire) < p.capacity
            })
            .map(|p| PartitionSlot {
                partition_id: p.id,
                job_id: p.job_id,
                partition_number: p.partition_number,
                capacity: p.capacity,
                filled: p.filled.load(Ordering::Acquire),
            }))
    }

    async fn find_assignment(
        &self,
        job_id: DbId,
        user_id: DbId,
    ) -> Result<Option<Assignment>, StoreError> {
        Ok(self.job(job_id).and_then(|job| job.find_assignment(user_id)))
    }

    async fn try_reserve(
        &self,
        slot: &PartitionSlot,
        user_id: DbId,
        policy: DuplicatePolicy,
    ) -> Result<Assignment, ReserveError> {
        let job = self.job(slot.job_id).ok_or_else(|| {
            StoreError::new(CoreError::NotFound {
                entity: "Job",
                id: slot.job_id,
            })
        })?;
        let partition = job
            .partitions
            .iter()
            .find(|p| p.id == slot.partition_id)
            .cloned()
            .ok_or_else(|| {
                StoreError::new(CoreError::NotFound {
                    entity: "Partition",
                    id: slot.partition_id,
                })
            })?;

        let _admission = match policy {
            DuplicatePolicy::Reject => {
                let guard = job.admission.lock().unwrap_or_else(PoisonError::into_inner);
                if let Some(existing) = job.find_assignment(user_id) {
                    return Err(ReserveError::AlreadyAssigned(existing));
                }
                Some(guard)
            }
            DuplicatePolicy::Allow => None,
        };

        let capacity = partition.capacity;
        let previous = partition
            .filled
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |filled| {
                (filled < capacity).then_some(filled + 1)
            })
            .map_err(|_| ReserveError::CapacityExceeded(partition.id))?;

        let assignment = Assignment {
            id: self.next_id(),
            job_id: partition.job_id,
            partition_id: partition.id,
            user_id,
            assigned_at: chrono::Utc::now(),
        };
        partition.labellers().push(assignment.clone());

        if previous + 1 == capacity {
            partition.is_full.store(true, Ordering::Release);
        }
        Ok(assignment)
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    fn slot_for(store: &MemoryAssignmentStore, partition_id: DbId) -> PartitionSlot {
        let p = store.partition(partition_id).unwrap();
        PartitionSlot {
            partition_id: p.id,
            job_id: p.job_id,
            partition_number: p.partition_number,
            capacity: p.capacity,
            filled: p.filled,
        }
    }

    #[tokio::test]
    async fn reserve_flips_full_on_last_slot() {
        let store = MemoryAssignmentStore::new();
        let ids = store.add_job(1, &[2]);
        let slot = slot_for(&store, ids[0]);

        store.try_reserve(&slot, 1, DuplicatePolicy::Allow).await.unwrap();
        assert!(!store.partition(ids[0]).unwrap().is_full);

        store.try_reserve(&slot, 2, DuplicatePolicy::Allow).await.unwrap();
        let snapshot = store.partition(ids[0]).unwrap();
        assert_eq!(snapshot.filled, 2);
        assert!(snapshot.is_full);
    }

    #[tokio::test]
    async fn reserve_on_full_partition_writes_nothing() {
        let store = MemoryAssignmentStore::new();
        let ids = store.add_job(1, &[1]);
        let slot = slot_for(&store, ids[0]);

        store.try_reserve(&slot, 1, DuplicatePolicy::Allow).await.unwrap();
        assert_matches!(
            store.try_reserve(&slot, 2, DuplicatePolicy::Allow).await,
            Err(ReserveError::CapacityExceeded(id)) if id == ids[0]
        );
        assert_eq!(store.assignments_for(ids[0]).len(), 1);
        assert_eq!(store.partition(ids[0]).unwrap().filled, 1);
    }

    #[tokio::test]
    async fn duplicate_rejected_across_partitions() {
        let store = MemoryAssignmentStore::new();
        let ids = store.add_job(1, &[3, 3]);

        store
            .try_reserve(&slot_for(&store, ids[0]), 5, DuplicatePolicy::Reject)
            .await
            .unwrap();
        assert_matches!(
            store
                .try_reserve(&slot_for(&store, ids[1]), 5, DuplicatePolicy::Reject)
                .await,
            Err(ReserveError::AlreadyAssigned(a)) if a.partition_id == ids[0]
        );
        assert_eq!(store.partition(ids[1]).unwrap().filled, 0);
    }

    #[tokio::test]
    async fn first_open_partition_skips_full_ones() {
        let store = MemoryAssignmentStore::new();
        let ids = store.add_job(1, &[1, 1]);
        let slot = slot_for(&store, ids[0]);
        store.try_reserve(&slot, 1, DuplicatePolicy::Allow).await.unwrap();

        let open = store.first_open_partition(1).await.unwrap().unwrap();
        assert_eq!(open.partition_id, ids[1]);
        assert_eq!(open.partition_number, 1);
    }

    #[tokio::test]
    async fn first_open_partition_skips_counter_filled_before_flag() {
        let store = MemoryAssignmentStore::new();
        let ids = store.add_job(1, &[1, 1]);

        // A reservation that has won the counter but not yet flipped `is_full`.
        let first = store.find_partition(ids[0]).unwrap();
        first.filled.store(1, Ordering::Release);
        assert!(!first.is_full.load(Ordering::Acquire));

        let open = store.first_open_partition(1).await.unwrap().unwrap();
        assert_eq!(open.partition_id, ids[1]);
    }

    #[tokio::test]
    async fn unknown_job_has_no_partitions() {
        let store = MemoryAssignmentStore::new();
        assert!(!store.job_exists(3).await.unwrap());
        assert!(store.first_open_partition(3).await.unwrap().is_none());
    }
}
