//! # Polls Infrastructure
//!
//! Concrete implementations of the storage ports defined in `polls-core`.
//!
//! ## Feature Flags
//!
//! - `postgres` (default) - PostgreSQL storage via SeaORM
//! - `minimal` - No external dependencies, in-memory storage only

pub mod database;

pub use database::{DatabaseConfig, InMemoryPollStore};

#[cfg(feature = "postgres")]
pub use database::{PostgresChoiceRepository, PostgresQuestionRepository};
