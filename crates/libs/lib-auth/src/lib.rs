//! # Authentication Library
//!
//! Password hashing (Argon2) and JWT session tokens for the platform.

pub mod pwd;
pub mod token;

pub use pwd::{hash_password, verify_password};
pub use token::{decode_jwt, encode_jwt, Claims};

use thiserror::Error;

/// Authentication error type shared by password and token modules.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Password must be at least {0} characters long")]
    PasswordTooShort(usize),

    #[error("Failed to hash password: {0}")]
    Hash(String),

    #[error("Invalid password hash: {0}")]
    InvalidHash(String),

    #[error("Password does not match")]
    BadCredentials,

    #[error("Failed to encode token: {0}")]
    TokenEncode(String),

    #[error("Invalid or expired token: {0}")]
    TokenDecode(String),
}
