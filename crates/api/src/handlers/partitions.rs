//! Handlers for a labeller's saved work on their partition.

use axum::extract::{Path, State};
use axum::Json;
use labelpool_core::error::CoreError;
use labelpool_core::labelling::validate_labelling_state;
use labelpool_core::types::DbId;
use labelpool_db::models::labeller::JobLabeller;
use labelpool_db::models::labelling::{LabellingState, SaveLabellingState};
use labelpool_db::models::partition::JobPartition;
use labelpool_db::repositories::{
    JobImageRepo, JobRepo, LabellerRepo, LabellingRepo, PartitionRepo,
};
use labelpool_db::DbPool;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// Load a partition and the caller's seat on it.
///
/// Unknown partition is 404; a partition the caller holds no seat on is 403.
async fn seat_for(
    pool: &DbPool,
    partition_id: DbId,
    user_id: DbId,
) -> AppResult<(JobPartition, JobLabeller)> {
    let partition = PartitionRepo::find_by_id(pool, partition_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Partition",
            id: partition_id,
        }))?;

    let seat = LabellerRepo::find_by_partition_and_user(pool, partition_id, user_id)
        .await?
        .ok_or_else(|| {
            AppError::Core(CoreError::Forbidden(
                "You are not assigned to this partition".to_string(),
            ))
        })?;

    Ok((partition, seat))
}

async fn load_state(pool: &DbPool, seat: &JobLabeller) -> AppResult<LabellingState> {
    let saved = LabellingRepo::list_by_labeller(pool, seat.id).await?;
    let (image_ids, labels) = saved.into_iter().map(|l| (l.image_id, l.label)).unzip();
    Ok(LabellingState {
        partition_id: seat.partition_id,
        image_ids,
        labels,
        is_complete: seat.is_complete,
    })
}

/// GET /api/v1/partitions/{id}/state
pub async fn get_state(
    State(state): State<AppState>,
    user: AuthUser,
    Path(partition_id): Path<DbId>,
) -> AppResult<Json<DataResponse<LabellingState>>> {
    let (_, seat) = seat_for(&state.pool, partition_id, user.user_id).await?;
    let data = load_state(&state.pool, &seat).await?;
    Ok(Json(DataResponse { data }))
}

/// PUT /api/v1/partitions/{id}/state
///
/// Upserts the given image labels. Images not mentioned keep their previous
/// label, so a client may save progress incrementally.
pub async fn save_state(
    State(state): State<AppState>,
    user: AuthUser,
    Path(partition_id): Path<DbId>,
    Json(input): Json<SaveLabellingState>,
) -> AppResult<Json<DataResponse<LabellingState>>> {
    let (partition, seat) = seat_for(&state.pool, partition_id, user.user_id).await?;

    let partition_image_ids: Vec<DbId> = JobImageRepo::list_by_partition(&state.pool, partition.id)
        .await?
        .into_iter()
        .map(|img| img.id)
        .collect();
    let label_set = JobRepo::list_labels(&state.pool, partition.job_id).await?;

    validate_labelling_state(
        &input.image_ids,
        &input.labels,
        &partition_image_ids,
        &label_set,
    )?;

    LabellingRepo::save_state(
        &state.pool,
        seat.id,
        &input.image_ids,
        &input.labels,
        input.is_complete,
    )
    .await?;

    tracing::info!(
        job_id = partition.job_id,
        partition_id,
        user_id = user.user_id,
        saved = input.image_ids.len(),
        is_complete = input.is_complete,
        "Labelling state saved",
    );

    let seat = JobLabeller {
        is_complete: input.is_complete,
        ..seat
    };
    let data = load_state(&state.pool, &seat).await?;
    Ok(Json(DataResponse { data }))
}
