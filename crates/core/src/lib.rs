//! Domain logic for the casting backend.
//!
//! Everything in this crate is storage-agnostic: data access goes through the
//! [`store::EntityStore`] trait, implemented over Postgres in `casting_db` and
//! in memory (feature `test-support`) for tests.

pub mod archive;
pub mod error;
pub mod mapping;
#[cfg(any(test, feature = "test-support"))]
pub mod memory;
pub mod orphan;
pub mod repoint;
pub mod status;
pub mod store;
pub mod types;
