//! # Core Library
//!
//! Configuration, central error type, pricing tables, SQLite store, and
//! wire DTOs for the platform.

pub mod config;
pub mod dto;
pub mod error;
pub mod model;
pub mod pricing;

// Re-export commonly used types
pub use config::Config;
pub use error::{AppError, Result};
pub use model::store::{create_pool, DbPool};
pub use pricing::ToolId;
