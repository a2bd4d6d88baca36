//! Distribution of uploaded images across planned partitions.

use crate::error::CoreError;

/// Slice `items` into consecutive groups whose lengths are `sizes`.
///
/// Group `i` receives the `sizes[i]` items that follow everything handed to
/// groups `0..i`, so concatenating the groups in order reproduces `items`.
/// Fails without producing any groups when the sizes do not add up to the
/// number of items.
pub fn distribute<T: Clone>(items: &[T], sizes: &[usize]) -> Result<Vec<Vec<T>>, CoreError> {
    let total = sizes
        .iter()
        .try_fold(0usize, |acc, &size| acc.checked_add(size))
        .ok_or_else(|| {
            CoreError::Validation("Partition sizes overflow the item count".to_string())
        })?;
    if total != items.len() {
        return Err(CoreError::Validation(format!(
            "Partition sizes sum to {total} but {} items were supplied",
            items.len()
        )));
    }

    let mut groups = Vec::with_capacity(sizes.len());
    let mut offset = 0;
    for &size in sizes {
        groups.push(items[offset..offset + size].to_vec());
        offset += size;
    }
    Ok(groups)
}
