//! Repository for the `image_labels` table and labeller completion.

use labelpool_core::types::DbId;
use sqlx::PgPool;

use crate::models::labelling::ImageLabel;

/// Saves and loads the per-image labels of one labeller.
pub struct LabellingRepo;

impl LabellingRepo {
    /// Upsert the given image labels for a labeller and record completion.
    ///
    /// Runs in a transaction so a reader never sees the labels without the
    /// matching completion flag. Images not mentioned keep their previous
    /// label. `completed_at` is set the first time `is_complete` is true.
    pub async fn save_state(
        pool: &PgPool,
        labeller_id: DbId,
        image_ids: &[DbId],
        labels: &[String],
        is_complete: bool,
    ) -> Result<(), sqlx::Error> {
        let mut tx = pool.begin().await?;

        if !image_ids.is_empty() {
            sqlx::query(
                "INSERT INTO image_labels (labeller_id, image_id, label) \
                 SELECT $1, * FROM UNNEST($2::BIGINT[], $3::TEXT[]) \
                 ON CONFLICT ON CONSTRAINT uq_image_labels_labeller_image \
                 DO UPDATE SET label = EXCLUDED.label, updated_at = NOW()",
            )
            .bind(labeller_id)
            .bind(image_ids)
            .bind(labels)
            .execute(&mut *tx)
            .await?;
        }

        sqlx::query(
            "UPDATE job_labellers \
             SET is_complete = $2, \
                 completed_at = CASE \
                     WHEN $2 THEN COALESCE(completed_at, NOW()) \
                     ELSE NULL \
                 END \
             WHERE id = $1",
        )
        .bind(labeller_id)
        .bind(is_complete)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    /// All labels saved by a labeller, ordered by image upload position.
    pub async fn list_by_labeller(
        pool: &PgPool,
        labeller_id: DbId,
    ) -> Result<Vec<ImageLabel>, sqlx::Error> {
        sqlx::query_as::<_, ImageLabel>(
            "SELECT l.id, l.labeller_id, l.image_id, l.label, l.updated_at \
             FROM image_labels l \
             JOIN job_images i ON i.id = l.image_id \
             WHERE l.labeller_id = $1 \
             ORDER BY i.position",
        )
        .bind(labeller_id)
        .fetch_all(pool)
        .await
    }
}
