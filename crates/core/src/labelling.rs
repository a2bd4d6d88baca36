//! Validation of a labeller's saved work on a partition.

use std::collections::HashSet;

use crate::error::CoreError;
use crate::types::DbId;

/// Check a labelling submission against its partition and job.
///
/// - `image_ids` and `labels` pair up one-to-one.
/// - Every image belongs to the partition, and appears at most once.
/// - Every label is part of the job's label set.
pub fn validate_labelling_state(
    image_ids: &[DbId],
    labels: &[String],
    partition_image_ids: &[DbId],
    label_set: &[String],
) -> Result<(), CoreError> {
    if image_ids.len() != labels.len() {
        return Err(CoreError::Validation(format!(
            "Got {} image ids but {} labels",
            image_ids.len(),
            labels.len()
        )));
    }

    let allowed_images: HashSet<DbId> = partition_image_ids.iter().copied().collect();
    let mut seen = HashSet::with_capacity(image_ids.len());
    for &image_id in image_ids {
        if !allowed_images.contains(&image_id) {
            return Err(CoreError::Validation(format!(
                "Image {image_id} does not belong to this partition"
            )));
        }
        if !seen.insert(image_id) {
            return Err(CoreError::Validation(format!(
                "Image {image_id} labelled more than once"
            )));
        }
    }

    if let Some(unknown) = labels.iter().find(|l| !label_set.contains(*l)) {
        return Err(CoreError::Validation(format!(
            "Label \"{unknown}\" is not part of this job"
        )));
    }
    Ok(())
}
