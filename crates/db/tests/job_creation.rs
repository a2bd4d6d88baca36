//! Integration tests for atomic job creation.
//!
//! Exercises the repository layer against a real database (run with
//! `DATABASE_URL` set and `--ignored`):
//! - Partitions, labels and images written together
//! - Cumulative image distribution across many partitions
//! - Rollback of a failed creation
//! - Listing with preview images

use labelpool_core::job_plan::{JobPlan, PartitionPlan};
use labelpool_db::models::job::{CreateJob, JobListQuery};
use labelpool_db::repositories::{JobImageRepo, JobRepo, PartitionRepo};
use sqlx::PgPool;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn new_job(title: &str) -> CreateJob {
    CreateJob {
        title: title.to_string(),
        description: "Label every animal".to_string(),
        credits: 10,
    }
}

fn labels(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

fn uris(n: usize) -> Vec<String> {
    (0..n).map(|i| format!("https://blobs.test/{i}.png")).collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires a Postgres DATABASE_URL"]
async fn create_job_writes_partitions_labels_and_images(pool: PgPool) {
    let plan = JobPlan::build(&labels(&["cat", "dog", "bird"]), 2, uris(9)).unwrap();
    let (job, partitions) = JobRepo::create_with_partitions(&pool, 42, &new_job("Animals"), &plan)
        .await
        .unwrap();

    assert_eq!(job.owner_id, 42);
    assert_eq!(partitions.len(), 2);
    assert!(partitions.iter().all(|p| p.capacity == 3 && p.filled == 0 && !p.is_full));

    let summaries = PartitionRepo::list_summaries(&pool, job.id).await.unwrap();
    let counts: Vec<i64> = summaries.iter().map(|s| s.image_count).collect();
    assert_eq!(counts, vec![4, 5]);

    let job_labels = JobRepo::list_labels(&pool, job.id).await.unwrap();
    assert_eq!(job_labels, labels(&["cat", "dog", "bird"]));
}

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires a Postgres DATABASE_URL"]
async fn images_follow_cumulative_offsets(pool: PgPool) {
    let images = uris(10);
    let plan = JobPlan::build(&labels(&["a"]), 3, images.clone()).unwrap();
    let (_, partitions) = JobRepo::create_with_partitions(&pool, 1, &new_job("Offsets"), &plan)
        .await
        .unwrap();

    // Remainder belongs to the last partition: [3, 3, 4].
    let expected = vec![
        images[0..3].to_vec(),
        images[3..6].to_vec(),
        images[6..10].to_vec(),
    ];

    for (partition, want) in partitions.iter().zip(&expected) {
        let stored: Vec<String> = JobImageRepo::list_by_partition(&pool, partition.id)
            .await
            .unwrap()
            .into_iter()
            .map(|img| img.image_uri)
            .collect();
        assert_eq!(&stored, want, "partition {}", partition.partition_number);
    }
}

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires a Postgres DATABASE_URL"]
async fn failed_creation_leaves_nothing_behind(pool: PgPool) {
    // An even capacity violates the schema check on the partition insert,
    // after the job and its labels were already written.
    let plan = JobPlan {
        labels: labels(&["a", "b"]),
        partitions: vec![PartitionPlan {
            partition_number: 0,
            capacity: 2,
            image_uris: uris(2),
        }],
    };

    let result = JobRepo::create_with_partitions(&pool, 1, &new_job("Broken"), &plan).await;
    assert!(result.is_err());

    let jobs: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM jobs")
        .fetch_one(&pool)
        .await
        .unwrap();
    let labels_left: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM job_labels")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(jobs.0, 0);
    assert_eq!(labels_left.0, 0);
}

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires a Postgres DATABASE_URL"]
async fn empty_batch_creates_empty_partitions(pool: PgPool) {
    let plan = JobPlan::build(&labels(&["a"]), 2, Vec::new()).unwrap();
    let (job, partitions) = JobRepo::create_with_partitions(&pool, 1, &new_job("Empty"), &plan)
        .await
        .unwrap();

    assert_eq!(partitions.len(), 2);
    assert!(JobImageRepo::list_by_job(&pool, job.id).await.unwrap().is_empty());
}

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires a Postgres DATABASE_URL"]
async fn listing_returns_newest_first_with_previews(pool: PgPool) {
    let first = JobPlan::build(&labels(&["a"]), 1, uris(6)).unwrap();
    let second = JobPlan::build(&labels(&["a"]), 1, uris(2)).unwrap();
    let (older, _) = JobRepo::create_with_partitions(&pool, 1, &new_job("Older"), &first)
        .await
        .unwrap();
    let (newer, _) = JobRepo::create_with_partitions(&pool, 1, &new_job("Newer"), &second)
        .await
        .unwrap();

    let jobs = JobRepo::list(
        &pool,
        &JobListQuery {
            limit: None,
            offset: None,
        },
    )
    .await
    .unwrap();
    assert_eq!(jobs[0].id, newer.id);
    assert_eq!(jobs[1].id, older.id);

    let previews = JobImageRepo::previews_for_jobs(&pool, &[older.id, newer.id], 4)
        .await
        .unwrap();
    let older_previews = previews.iter().filter(|(id, _)| *id == older.id).count();
    let newer_previews = previews.iter().filter(|(id, _)| *id == newer.id).count();
    assert_eq!(older_previews, 4);
    assert_eq!(newer_previews, 2);
}
