//! Domain core for partitioned labelling jobs.
//!
//! Pure planning functions (partition sizes, capacities, image distribution),
//! the assignment coordinator with its storage seam, and the blob store seam.
//! Has no dependency on the database or HTTP crates.

pub mod assignment;
pub mod blob;
pub mod capacity;
pub mod distribution;
pub mod error;
pub mod job_plan;
pub mod labelling;
pub mod memory_store;
pub mod partition;
pub mod types;
