//! Partition planning: how many images each partition of a job receives.
//!
//! Every partition but the last gets `floor(items / partitions)` images and the
//! last partition absorbs the remainder, so it is never smaller than the
//! others. This tie-break is observable (partition sizes are shown to job
//! owners) and must not be replaced with a round-robin spread.

use crate::error::CoreError;

/// Compute the ordered partition sizes for `item_count` items split into
/// `partition_count` partitions.
///
/// The returned vector has exactly `partition_count` entries and sums to
/// `item_count`. Fails with [`CoreError::Validation`] when `partition_count`
/// is not positive.
pub fn plan_partitions(item_count: usize, partition_count: i64) -> Result<Vec<usize>, CoreError> {
    if partition_count <= 0 {
        return Err(CoreError::Validation(format!(
            "Partition count must be positive, got {partition_count}"
        )));
    }

    let count = partition_count as usize;
    let base = item_count / count;

    let mut sizes = vec![base; count];
    // The last partition takes whatever the even split left over.
    sizes[count - 1] = item_count - base * (count - 1);
    Ok(sizes)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn remainder_goes_to_last_partition() {
        assert_eq!(plan_partitions(10, 3).unwrap(), vec![3, 3, 4]);
    }

    #[test]
    fn single_partition_holds_everything() {
        assert_eq!(plan_partitions(7, 1).unwrap(), vec![7]);
    }

    #[test]
    fn zero_items_gives_empty_partitions() {
        assert_eq!(plan_partitions(0, 2).unwrap(), vec![0, 0]);
    }

    #[test]
    fn odd_batch_two_partitions() {
        assert_eq!(plan_partitions(9, 2).unwrap(), vec![4, 5]);
    }

    #[test]
    fn more_partitions_than_items() {
        // base is 0, so everything lands in the last partition.
        assert_eq!(plan_partitions(2, 4).unwrap(), vec![0, 0, 0, 2]);
    }

    #[test]
    fn last_partition_never_smaller() {
        for items in 0..60usize {
            for parts in 1..12i64 {
                let sizes = plan_partitions(items, parts).unwrap();
                let last = *sizes.last().unwrap();
                assert!(sizes.iter().all(|&s| s <= last), "{items}/{parts}: {sizes:?}");
            }
        }
    }

    #[test]
    fn sizes_sum_to_item_count_and_match_partition_count() {
        for items in 0..200usize {
            for parts in 1..20i64 {
                let sizes = plan_partitions(items, parts).unwrap();
                assert_eq!(sizes.len(), parts as usize);
                assert_eq!(sizes.iter().sum::<usize>(), items);
            }
        }
    }

    #[test]
    fn zero_partitions_rejected() {
        assert_matches!(plan_partitions(10, 0), Err(CoreError::Validation(_)));
    }

    #[test]
    fn negative_partitions_rejected() {
        assert_matches!(plan_partitions(10, -3), Err(CoreError::Validation(_)));
    }

    #[test]
    fn large_partition_counts_are_planned() {
        let sizes = plan_partitions(5_000, 1_001).unwrap();
        assert_eq!(sizes.len(), 1_001);
        assert_eq!(sizes.iter().sum::<usize>(), 5_000);
        assert_eq!(sizes[0], 4);
        assert_eq!(sizes[1_000], 1_000);
    }
}
