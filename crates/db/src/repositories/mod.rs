//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async query methods
//! that accept `&PgPool` (or an open transaction) as the first argument.

pub mod booking_repo;
pub mod photo_repo;
pub mod profile_repo;
pub mod project_repo;
pub mod role_repo;
pub mod submission_repo;

pub use booking_repo::BookingRepo;
pub use photo_repo::PhotoRepo;
pub use profile_repo::ProfileRepo;
pub use project_repo::ProjectRepo;
pub use role_repo::RoleRepo;
pub use submission_repo::SubmissionRepo;
