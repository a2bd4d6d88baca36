//! Contributor capacity per partition.

/// Maximum number of labellers a partition admits for a job with
/// `label_count` labels.
///
/// Always odd so that a later majority vote over per-image labels can never
/// tie: even label counts are rounded up by one, odd counts are kept. A job
/// with no labels still admits a single labeller.
pub fn partition_capacity(label_count: usize) -> i32 {
    let count = i32::try_from(label_count).unwrap_or(i32::MAX - 1);
    if count % 2 == 0 {
        count + 1
    } else {
        count
    }
}
