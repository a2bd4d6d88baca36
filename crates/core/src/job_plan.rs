//! Job submission validation and the partition layout persisted with a job.
//!
//! [`JobPlan::build`] runs the planner, the capacity policy and the image
//! distributor together so the repository can write the whole job in one
//! transaction from a single, already-validated value.

use std::collections::HashSet;

use serde::Serialize;

use crate::capacity::partition_capacity;
use crate::distribution::distribute;
use crate::error::CoreError;
use crate::partition::plan_partitions;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Maximum length of a job title.
pub const MAX_TITLE_LEN: usize = 200;

/// Maximum length of a job description.
pub const MAX_DESCRIPTION_LEN: usize = 5_000;

/// Maximum number of labels in a job's label set.
pub const MAX_LABELS: usize = 64;

/// Maximum length of a single label.
pub const MAX_LABEL_LEN: usize = 64;

/// Upper bound on the number of partitions a single job may request.
pub const MAX_PARTITIONS: i64 = 1_000;

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Validate a job title: non-blank and at most [`MAX_TITLE_LEN`] characters.
pub fn validate_title(title: &str) -> Result<(), CoreError> {
    if title.trim().is_empty() {
        return Err(CoreError::Validation("Job title must not be empty".into()));
    }
    if title.chars().count() > MAX_TITLE_LEN {
        return Err(CoreError::Validation(format!(
            "Job title must not exceed {MAX_TITLE_LEN} characters"
        )));
    }
    Ok(())
}

/// Validate a job description length.
pub fn validate_description(description: &str) -> Result<(), CoreError> {
    if description.chars().count() > MAX_DESCRIPTION_LEN {
        return Err(CoreError::Validation(format!(
            "Job description must not exceed {MAX_DESCRIPTION_LEN} characters"
        )));
    }
    Ok(())
}

/// Credits paid out for a job must not be negative.
pub fn validate_credits(credits: i32) -> Result<(), CoreError> {
    if credits < 0 {
        return Err(CoreError::Validation(format!(
            "Credits must not be negative, got {credits}"
        )));
    }
    Ok(())
}

/// Trim and validate a label set, preserving the submitted order.
///
/// Rules:
/// - At least one label and at most [`MAX_LABELS`].
/// - No blank labels; each at most [`MAX_LABEL_LEN`] characters.
/// - No duplicates after trimming (case-sensitive).
pub fn normalize_labels(labels: &[String]) -> Result<Vec<String>, CoreError> {
    if labels.is_empty() {
        return Err(CoreError::Validation(
            "A job needs at least one label".to_string(),
        ));
    }
    if labels.len() > MAX_LABELS {
        return Err(CoreError::Validation(format!(
            "A job may have at most {MAX_LABELS} labels"
        )));
    }

    let mut seen = HashSet::with_capacity(labels.len());
    let mut normalized = Vec::with_capacity(labels.len());
    for (i, raw) in labels.iter().enumerate() {
        let label = raw.trim();
        if label.is_empty() {
            return Err(CoreError::Validation(format!(
                "Label at index {i} must not be empty"
            )));
        }
        if label.chars().count() > MAX_LABEL_LEN {
            return Err(CoreError::Validation(format!(
                "Label at index {i} exceeds {MAX_LABEL_LEN} characters"
            )));
        }
        if !seen.insert(label) {
            return Err(CoreError::Validation(format!("Duplicate label: \"{label}\"")));
        }
        normalized.push(label.to_string());
    }
    Ok(normalized)
}

/// Partition sizes for `image_count` images, rejecting layouts that would
/// leave a partition without images.
///
/// An empty batch is allowed and yields empty partitions. At most
/// [`MAX_PARTITIONS`] partitions may be requested. Handlers call this before
/// uploading so a bad layout never leaves orphaned blobs.
pub fn plan_layout(image_count: usize, partition_count: i64) -> Result<Vec<usize>, CoreError> {
    if partition_count > MAX_PARTITIONS {
        return Err(CoreError::Validation(format!(
            "Partition count must not exceed {MAX_PARTITIONS}, got {partition_count}"
        )));
    }
    if image_count > 0 && partition_count > image_count as i64 {
        return Err(CoreError::Validation(format!(
            "Cannot split {image_count} images into {partition_count} partitions"
        )));
    }
    plan_partitions(image_count, partition_count)
}

// ---------------------------------------------------------------------------
// Plan
// ---------------------------------------------------------------------------

/// One partition of a planned job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PartitionPlan {
    /// Zero-based, stable sequence number within the job.
    pub partition_number: i32,
    /// Maximum number of labellers.
    pub capacity: i32,
    /// Image URIs in upload order.
    pub image_uris: Vec<String>,
}

/// The complete layout of a job: its normalized labels and partitions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobPlan {
    pub labels: Vec<String>,
    pub partitions: Vec<PartitionPlan>,
}

impl JobPlan {
    /// Validate the labels and lay out `image_uris` over `partition_count`
    /// partitions, all sharing the capacity derived from the label count.
    ///
    /// A non-empty batch must have at least one image per partition; an empty
    /// batch is allowed and produces empty partitions.
    pub fn build(
        labels: &[String],
        partition_count: i64,
        image_uris: Vec<String>,
    ) -> Result<Self, CoreError> {
        let labels = normalize_labels(labels)?;
        let sizes = plan_layout(image_uris.len(), partition_count)?;
        let capacity = partition_capacity(labels.len());
        let groups = distribute(&image_uris, &sizes)?;

        let partitions = groups
            .into_iter()
            .enumerate()
            .map(|(i, image_uris)| PartitionPlan {
                partition_number: i as i32,
                capacity,
                image_uris,
            })
            .collect();

        Ok(Self { labels, partitions })
    }

    /// Total number of images across all partitions.
    pub fn image_count(&self) -> usize {
        self.partitions.iter().map(|p| p.image_uris.len()).sum()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn labels(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn uris(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("https://blobs.test/{i}.png")).collect()
    }

    // -- validation -----------------------------------------------------------

    #[test]
    fn blank_title_rejected() {
        assert_matches!(validate_title("   "), Err(CoreError::Validation(_)));
    }

    #[test]
    fn long_title_rejected() {
        let title = "x".repeat(MAX_TITLE_LEN + 1);
        assert_matches!(validate_title(&title), Err(CoreError::Validation(_)));
        assert!(validate_title(&"x".repeat(MAX_TITLE_LEN)).is_ok());
    }

    #[test]
    fn negative_credits_rejected() {
        assert_matches!(validate_credits(-1), Err(CoreError::Validation(_)));
        assert!(validate_credits(0).is_ok());
    }

    #[test]
    fn labels_are_trimmed_in_order() {
        let out = normalize_labels(&labels(&[" cat", "dog ", "bird"])).unwrap();
        assert_eq!(out, labels(&["cat", "dog", "bird"]));
    }

    #[test]
    fn duplicate_labels_after_trim_rejected() {
        assert_matches!(
            normalize_labels(&labels(&["cat", " cat "])),
            Err(CoreError::Validation(msg)) if msg.contains("Duplicate")
        );
    }

    #[test]
    fn labels_are_case_sensitive() {
        assert!(normalize_labels(&labels(&["Cat", "cat"])).is_ok());
    }

    #[test]
    fn empty_label_set_rejected() {
        assert_matches!(normalize_labels(&[]), Err(CoreError::Validation(_)));
    }

    #[test]
    fn blank_label_rejected() {
        assert_matches!(
            normalize_labels(&labels(&["cat", "  "])),
            Err(CoreError::Validation(_))
        );
    }

    #[test]
    fn too_many_labels_rejected() {
        let many: Vec<String> = (0..=MAX_LABELS).map(|i| format!("l{i}")).collect();
        assert_matches!(normalize_labels(&many), Err(CoreError::Validation(_)));
    }

    // -- JobPlan --------------------------------------------------------------

    #[test]
    fn plan_for_odd_label_set() {
        let plan = JobPlan::build(&labels(&["a", "b", "c"]), 2, uris(9)).unwrap();

        assert_eq!(plan.partitions.len(), 2);
        assert_eq!(plan.partitions[0].image_uris.len(), 4);
        assert_eq!(plan.partitions[1].image_uris.len(), 5);
        assert!(plan.partitions.iter().all(|p| p.capacity == 3));
        assert_eq!(plan.partitions[0].partition_number, 0);
        assert_eq!(plan.partitions[1].partition_number, 1);
        assert_eq!(plan.image_count(), 9);
    }

    #[test]
    fn plan_for_even_label_set_gets_odd_capacity() {
        let plan = JobPlan::build(&labels(&["a", "b", "c", "d"]), 1, uris(3)).unwrap();
        assert_eq!(plan.partitions[0].capacity, 5);
    }

    #[test]
    fn plan_preserves_upload_order() {
        let images = uris(10);
        let plan = JobPlan::build(&labels(&["a"]), 3, images.clone()).unwrap();
        let flattened: Vec<String> = plan
            .partitions
            .iter()
            .flat_map(|p| p.image_uris.clone())
            .collect();
        assert_eq!(flattened, images);
    }

    #[test]
    fn empty_batch_allowed() {
        let plan = JobPlan::build(&labels(&["a"]), 2, Vec::new()).unwrap();
        assert_eq!(plan.partitions.len(), 2);
        assert_eq!(plan.image_count(), 0);
    }

    #[test]
    fn more_partitions_than_images_rejected() {
        assert_matches!(
            JobPlan::build(&labels(&["a"]), 4, uris(3)),
            Err(CoreError::Validation(_))
        );
    }

    #[test]
    fn non_positive_partition_count_rejected() {
        assert_matches!(
            JobPlan::build(&labels(&["a"]), 0, uris(3)),
            Err(CoreError::Validation(_))
        );
    }

    #[test]
    fn layout_matches_planner_when_images_suffice() {
        assert_eq!(plan_layout(10, 3).unwrap(), vec![3, 3, 4]);
        assert_eq!(plan_layout(0, 2).unwrap(), vec![0, 0]);
        assert_matches!(plan_layout(2, 3), Err(CoreError::Validation(_)));
    }

    #[test]
    fn too_many_partitions_rejected() {
        assert!(plan_layout(5_000, MAX_PARTITIONS).is_ok());
        assert_matches!(
            plan_layout(5_000, MAX_PARTITIONS + 1),
            Err(CoreError::Validation(msg)) if msg.contains("must not exceed")
        );
    }
}
