//! Postgres persistence for labelling jobs.
//!
//! Models map rows one-to-one, repositories are zero-sized structs with async
//! query methods, and [`PgAssignmentStore`] implements the core assignment
//! seam on top of a single-row conditional update.

use sqlx::postgres::PgPoolOptions;

pub mod assignment_store;
pub mod models;
pub mod repositories;

pub use assignment_store::PgAssignmentStore;

pub type DbPool = sqlx::PgPool;

/// Create a connection pool from a database URL.
pub async fn create_pool(database_url: &str) -> Result<DbPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(20)
        .connect(database_url)
        .await
}

/// Round-trip a trivial query to verify the database is reachable.
pub async fn health_check(pool: &DbPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}

/// Apply all pending migrations from `db/migrations`.
pub async fn run_migrations(pool: &DbPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("../../db/migrations").run(pool).await
}
