//! Handlers for labelling jobs: submission, browsing, accepting a seat, and
//! the labeller's view of their partition.

use std::collections::HashMap;

use axum::extract::{Multipart, Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use labelpool_core::assignment::AcceptOutcome;
use labelpool_core::blob::{validate_image_batch, BlobUpload};
use labelpool_core::error::CoreError;
use labelpool_core::job_plan::{
    normalize_labels, plan_layout, validate_credits, validate_description, validate_title,
    JobPlan,
};
use labelpool_core::types::DbId;
use labelpool_db::models::job::{CreateJob, Job, JobDetail, JobListQuery, JobSummary};
use labelpool_db::models::labelling::LabelInfo;
use labelpool_db::repositories::{JobImageRepo, JobRepo, LabellerRepo, PartitionRepo};
use labelpool_db::DbPool;
use serde::Serialize;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// Preview images shown per job in listings.
const PREVIEW_IMAGES_PER_JOB: i64 = 4;

// ---------------------------------------------------------------------------
// Multipart submission
// ---------------------------------------------------------------------------

/// Parsed `POST /api/v1/jobs` form.
#[derive(Debug, Default)]
struct JobSubmission {
    title: String,
    description: String,
    credits: i32,
    labels: Vec<String>,
    num_partitions: Option<i64>,
    files: Vec<BlobUpload>,
}

async fn read_submission(mut multipart: Multipart) -> AppResult<JobSubmission> {
    let mut submission = JobSubmission::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "files" => {
                let file_name = field.file_name().unwrap_or("image").to_string();
                let content_type = field.content_type().map(str::to_string);
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(e.to_string()))?;
                submission.files.push(BlobUpload {
                    file_name,
                    content_type,
                    bytes: bytes.to_vec(),
                });
            }
            "title" | "description" | "credits" | "labels" | "num_partitions" => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| AppError::BadRequest(e.to_string()))?;
                match name.as_str() {
                    "title" => submission.title = text,
                    "description" => submission.description = text,
                    "credits" => {
                        submission.credits = text.trim().parse().map_err(|_| {
                            AppError::BadRequest(format!("Invalid credits value '{text}'"))
                        })?;
                    }
                    "labels" => submission.labels.push(text),
                    _ => {
                        let count = text.trim().parse().map_err(|_| {
                            AppError::BadRequest(format!("Invalid num_partitions value '{text}'"))
                        })?;
                        submission.num_partitions = Some(count);
                    }
                }
            }
            other => {
                return Err(AppError::BadRequest(format!(
                    "Unexpected form field '{other}'"
                )));
            }
        }
    }

    Ok(submission)
}

// ---------------------------------------------------------------------------
// Responses
// ---------------------------------------------------------------------------

/// Body of `POST /api/v1/jobs/{id}/accept`.
#[derive(Debug, Serialize)]
pub struct AcceptResponse {
    /// `true` only when this call created a seat.
    pub accepted: bool,
    pub outcome: &'static str,
    /// The seat's partition, for `assigned` and `already_assigned`.
    pub partition_id: Option<DbId>,
}

impl From<&AcceptOutcome> for AcceptResponse {
    fn from(outcome: &AcceptOutcome) -> Self {
        Self {
            accepted: outcome.is_assigned(),
            outcome: outcome.as_str(),
            partition_id: outcome.assignment().map(|a| a.partition_id),
        }
    }
}

async fn load_detail(pool: &DbPool, job: Job) -> AppResult<JobDetail> {
    let labels = JobRepo::list_labels(pool, job.id).await?;
    let partitions = PartitionRepo::list_summaries(pool, job.id).await?;
    Ok(JobDetail {
        job,
        labels,
        partitions,
    })
}

fn job_not_found(id: DbId) -> AppError {
    AppError::Core(CoreError::NotFound { entity: "Job", id })
}

/// The caller holds no seat on an existing job. `id` is the job's.
fn seat_not_found(job_id: DbId) -> AppError {
    AppError::Core(CoreError::NotFound {
        entity: "Labeller seat on job",
        id: job_id,
    })
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/v1/jobs
///
/// Validates the whole submission before uploading anything, uploads the
/// images as one batch, then writes the job, labels, partitions and images
/// in a single transaction.
pub async fn create_job(
    State(state): State<AppState>,
    user: AuthUser,
    multipart: Multipart,
) -> AppResult<(StatusCode, Json<DataResponse<JobDetail>>)> {
    let submission = read_submission(multipart).await?;

    validate_title(&submission.title)?;
    validate_description(&submission.description)?;
    validate_credits(submission.credits)?;
    let labels = normalize_labels(&submission.labels)?;
    let num_partitions = submission.num_partitions.ok_or_else(|| {
        AppError::BadRequest("Missing required field 'num_partitions'".to_string())
    })?;
    validate_image_batch(&submission.files)?;
    plan_layout(submission.files.len(), num_partitions)?;

    let image_count = submission.files.len();
    let image_uris = state.blob_store.put_batch(submission.files).await?;
    if image_uris.len() != image_count {
        return Err(AppError::InternalError(format!(
            "Blob store returned {} URIs for {image_count} images",
            image_uris.len()
        )));
    }

    let plan = JobPlan::build(&labels, num_partitions, image_uris)?;
    let input = CreateJob {
        title: submission.title.trim().to_string(),
        description: submission.description,
        credits: submission.credits,
    };

    // Any failure here has rolled back the whole job.
    let (job, partitions) =
        JobRepo::create_with_partitions(&state.pool, user.user_id, &input, &plan)
            .await
            .map_err(|e| {
                AppError::Core(CoreError::Internal(format!("Job creation failed: {e}")))
            })?;

    tracing::info!(
        job_id = job.id,
        owner_id = user.user_id,
        partitions = partitions.len(),
        images = plan.image_count(),
        capacity = partitions.first().map_or(0, |p| p.capacity),
        "Job created",
    );

    let detail = load_detail(&state.pool, job).await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: detail })))
}

/// GET /api/v1/jobs
pub async fn list_jobs(
    State(state): State<AppState>,
    _user: AuthUser,
    Query(params): Query<JobListQuery>,
) -> AppResult<Json<DataResponse<Vec<JobSummary>>>> {
    let jobs = JobRepo::list(&state.pool, &params).await?;
    let ids: Vec<DbId> = jobs.iter().map(|j| j.id).collect();

    let mut previews: HashMap<DbId, Vec<String>> = HashMap::new();
    for (job_id, uri) in
        JobImageRepo::previews_for_jobs(&state.pool, &ids, PREVIEW_IMAGES_PER_JOB).await?
    {
        previews.entry(job_id).or_default().push(uri);
    }

    let data = jobs
        .into_iter()
        .map(|job| {
            let preview_images = previews.remove(&job.id).unwrap_or_default();
            JobSummary {
                job,
                preview_images,
            }
        })
        .collect();
    Ok(Json(DataResponse { data }))
}

/// GET /api/v1/jobs/{id}
pub async fn get_job(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<JobDetail>>> {
    let job = JobRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| job_not_found(id))?;
    let detail = load_detail(&state.pool, job).await?;
    Ok(Json(DataResponse { data: detail }))
}

/// POST /api/v1/jobs/{id}/accept
///
/// A full job or a lost race is a normal `200` with `accepted: false`.
pub async fn accept_job(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<AcceptResponse>>> {
    let outcome = state.coordinator.accept(id, user.user_id).await?;
    Ok(Json(DataResponse {
        data: AcceptResponse::from(&outcome),
    }))
}

/// GET /api/v1/jobs/{id}/label-info
pub async fn label_info(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<LabelInfo>>> {
    let job = JobRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| job_not_found(id))?;

    let seat = LabellerRepo::find_by_job_and_user(&state.pool, id, user.user_id)
        .await?
        .ok_or_else(|| seat_not_found(id))?;

    let partition = PartitionRepo::find_by_id(&state.pool, seat.partition_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Partition",
            id: seat.partition_id,
        }))?;

    let labels = JobRepo::list_labels(&state.pool, id).await?;
    let images = JobImageRepo::list_by_partition(&state.pool, partition.id).await?;

    Ok(Json(DataResponse {
        data: LabelInfo {
            job_id: job.id,
            title: job.title,
            description: job.description,
            labels,
            partition_id: partition.id,
            partition_number: partition.partition_number,
            is_complete: seat.is_complete,
            images,
        },
    }))
}
