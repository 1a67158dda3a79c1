//! # Polls Shared
//!
//! Request forms and response bodies exchanged with polls clients.

pub mod dto;
pub mod response;

pub use response::{ApiResponse, ErrorResponse};
