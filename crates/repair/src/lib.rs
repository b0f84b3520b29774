//! `role-repair`: find bookings and submissions that point at deleted roles
//! and repoint them at their replacements.
//!
//! The binary is a thin shell over [`session::run`], which takes the store
//! and the terminal streams as parameters so it can be driven from tests.

pub mod cli;
pub mod config;
pub mod session;

pub use cli::RepairArgs;
pub use session::{run, Outcome};
