//! Shared helpers for integration tests.

pub mod database;
pub mod fixtures;

pub use database::*;
pub use fixtures::*;
