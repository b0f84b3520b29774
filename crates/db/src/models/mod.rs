//! Row models and DTOs.
//!
//! Each submodule contains:
//! - A `FromRow` + `Serialize` entity struct matching the database row
//! - A `Deserialize` create DTO for inserts
//! - Where the row takes part in integrity or archival workflows, a
//!   `TryFrom` conversion into the matching `casting_core::store` record

pub mod booking;
pub mod photo;
pub mod profile;
pub mod project;
pub mod role;
pub mod submission;
