//! # Utilities Library
//!
//! Shared utility functions for base64 encoding, environment variables, and validation.

pub mod b64;
pub mod envs;
pub mod validation;

// Re-export commonly used functions
pub use b64::{b64_decode, b64_encode, data_url_png};
pub use envs::{get_env, get_env_parse};
pub use validation::{validate_email, validate_min_length, validate_not_empty};
