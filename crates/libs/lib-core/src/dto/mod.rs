//! # Data Transfer Objects (DTOs)
//!
//! Data structures used for communication between the front-end and backend
//! via the REST API.

pub mod auth;
pub mod coins;
pub mod tools;

pub use auth::*;
pub use coins::*;
pub use tools::*;

use serde::{Deserialize, Serialize};

/// Standard error response body.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}
