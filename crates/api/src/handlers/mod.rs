pub mod integrity;
pub mod project;
pub mod role;
pub mod submission;
