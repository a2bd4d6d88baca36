//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async query methods
//! that accept `&PgPool` as the first argument.

pub mod image_repo;
pub mod job_repo;
pub mod labeller_repo;
pub mod labelling_repo;
pub mod partition_repo;

pub use image_repo::JobImageRepo;
pub use job_repo::JobRepo;
pub use labeller_repo::LabellerRepo;
pub use labelling_repo::LabellingRepo;
pub use partition_repo::PartitionRepo;
