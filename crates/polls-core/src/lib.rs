//! # Polls Core
//!
//! The domain layer of the polls application.
//! This crate contains pure business logic with zero infrastructure dependencies:
//! the question/choice model, the storage ports, and the poll service.

pub mod domain;
pub mod error;
pub mod ports;
pub mod service;

pub use error::DomainError;
pub use service::{NewPoll, PollService};
