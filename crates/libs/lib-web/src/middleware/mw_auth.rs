//! # Authentication Middleware
//!
//! Axum middleware for JWT token validation and user authentication.
//!
//! Extracts and validates the `Authorization: Bearer <token>` header, then
//! injects the authenticated user's claims into the request extensions.
//! Handlers extract them with `Extension<Claims>`.

use axum::{extract::Request, http::header::AUTHORIZATION, middleware::Next, response::Response};
use lib_auth::decode_jwt;
use lib_core::config::core_config;
use lib_core::AppError;
use tracing::{debug, warn};

/// Authentication middleware that validates JWT tokens.
///
/// # Behavior
///
/// - **Valid token**: Continues to next middleware/handler with `Claims` in extensions
/// - **Missing/invalid token**: Returns `401 Unauthorized` with error body
pub async fn require_auth(mut req: Request, next: Next) -> Result<Response, AppError> {
    let auth_header = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| {
            warn!("[AUTH] Missing Authorization header");
            AppError::Unauthenticated("Missing Authorization header".to_string())
        })?;

    let token = auth_header.strip_prefix("Bearer ").ok_or_else(|| {
        warn!("[AUTH] Invalid Authorization header format");
        AppError::Unauthenticated("Invalid Authorization header format".to_string())
    })?;

    let config = core_config();
    let claims = decode_jwt(token, &config.jwt_secret).map_err(|e| {
        warn!("[AUTH] JWT validation failed: {}", e);
        AppError::Unauthenticated("Invalid or expired token".to_string())
    })?;

    debug!(
        "[AUTH] Authenticated user: {} (id: {})",
        claims.username, claims.sub
    );

    req.extensions_mut().insert(claims);

    Ok(next.run(req).await)
}
