//! Domain model structs and DTOs.
//!
//! Each submodule contains:
//! - A `FromRow` + `Serialize` entity struct matching the database row
//! - `Deserialize` DTOs for inserts and queries where the table takes input

pub mod image;
pub mod job;
pub mod labeller;
pub mod labelling;
pub mod partition;
