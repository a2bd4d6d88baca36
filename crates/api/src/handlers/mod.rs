//! Request handlers.
//!
//! Handlers delegate to the repositories in `labelpool_db` and to the
//! assignment coordinator, and map errors via [`crate::error::AppError`].

pub mod jobs;
pub mod partitions;
