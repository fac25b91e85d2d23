//! # Authentication Handlers
//!
//! HTTP request handlers for user authentication endpoints.
//!
//! ## Overview
//!
//! - User signup with email/password; every new account gets a coin account
//!   with the configured signup grant
//! - User login with email or username
//! - JWT token generation

use axum::{
    extract::{Json, State},
    http::StatusCode,
};
use lib_auth::{encode_jwt, hash_password, verify_password};
use lib_core::dto::{AuthResponse, ErrorResponse, LoginRequest, SignupRequest, UserInfo};
use lib_core::model::store::{LedgerRepository, UserRepository};
use lib_core::model::store::models::UserForCreate;
use lib_core::{Config, DbPool};
use lib_utils::{validate_email, validate_min_length};
use tracing::{debug, error, info, instrument, warn};

/// Signup handler - creates a new user account with a starter coin grant.
///
/// # Returns
///
/// * `Ok((StatusCode::CREATED, AuthResponse))` - User created with JWT token
/// * `Err((StatusCode, ErrorResponse))` - Validation error, duplicate user, or server error
///
/// # Validation
///
/// - Username must be at least 3 characters and unique
/// - Email must look like an address ('@' and a dot) and be unique
/// - Password must be at least 8 characters (validated in hash_password)
#[instrument(skip(pool, config, req), fields(username = %req.username, email = %req.email))]
pub async fn signup(
    State(pool): State<DbPool>,
    State(config): State<Config>,
    Json(req): Json<SignupRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), (StatusCode, Json<ErrorResponse>)> {
    info!("[SIGNUP] New user signup request");
    debug!("   Username: {}", req.username);

    if let Err(e) = validate_min_length(&req.username, 3, "Username") {
        warn!("[SIGNUP] Username too short");
        return Err((StatusCode::BAD_REQUEST, Json(ErrorResponse { error: e })));
    }

    if let Err(e) = validate_email(&req.email) {
        warn!("[SIGNUP] Invalid email format");
        return Err((StatusCode::BAD_REQUEST, Json(ErrorResponse { error: e })));
    }

    match UserRepository::find_by_email(&pool, &req.email).await {
        Ok(Some(_)) => {
            warn!("[SIGNUP] Email already registered: {}", req.email);
            return Err((
                StatusCode::CONFLICT,
                Json(ErrorResponse {
                    error: "Email already registered".to_string(),
                }),
            ));
        }
        Ok(None) => {}
        Err(e) => {
            error!("[SIGNUP] Database error checking email: {}", e);
            return Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Database error".to_string(),
                }),
            ));
        }
    }

    match UserRepository::find_by_username(&pool, &req.username).await {
        Ok(Some(_)) => {
            warn!("[SIGNUP] Username already taken: {}", req.username);
            return Err((
                StatusCode::CONFLICT,
                Json(ErrorResponse {
                    error: "Username already taken".to_string(),
                }),
            ));
        }
        Ok(None) => {}
        Err(e) => {
            error!("[SIGNUP] Database error checking username: {}", e);
            return Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Database error".to_string(),
                }),
            ));
        }
    }

    let password_hash = match hash_password(&req.password) {
        Ok(hash) => hash,
        Err(e) => {
            warn!("[SIGNUP] Password hashing failed: {}", e);
            return Err((
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse {
                    error: e.to_string(),
                }),
            ));
        }
    };

    let user = match UserRepository::create(
        &pool,
        UserForCreate::new(req.username.clone(), req.email.clone(), password_hash),
    )
    .await
    {
        Ok(user) => user,
        Err(e) => {
            error!("[SIGNUP] Failed to create user: {}", e);
            return Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Failed to create user".to_string(),
                }),
            ));
        }
    };

    // Starter coin grant; idempotent in case of a retried signup
    if let Err(e) = LedgerRepository::create_account(&pool, user.id, config.signup_grant).await {
        error!("[SIGNUP] Failed to create coin account: {}", e);
        return Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse {
                error: "Failed to create coin account".to_string(),
            }),
        ));
    }

    let token = match encode_jwt(
        user.id,
        user.username.clone(),
        &config.jwt_secret,
        config.jwt_expiration_hours,
    ) {
        Ok(token) => token,
        Err(e) => {
            error!("[SIGNUP] JWT encoding failed: {}", e);
            return Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Failed to generate token".to_string(),
                }),
            ));
        }
    };

    info!(
        "[SIGNUP] User {} (id {}) created with {} coins",
        user.username, user.id, config.signup_grant
    );

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            token,
            user: UserInfo {
                id: user.id,
                username: user.username,
                email: user.email,
                coins: config.signup_grant,
            },
            message: "Signup successful".to_string(),
        }),
    ))
}

/// Login handler - authenticates existing user.
///
/// # Authentication
///
/// - Accepts either email (contains '@') or username
/// - Verifies password using Argon2
/// - Checks if account is active
/// - Updates last_login timestamp
pub async fn login(
    State(pool): State<DbPool>,
    State(config): State<Config>,
    Json(req): Json<LoginRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), (StatusCode, Json<ErrorResponse>)> {
    info!("[LOGIN] Login attempt");
    debug!("   Identifier: {}", req.email_or_username);

    let user = if req.email_or_username.contains('@') {
        UserRepository::find_by_email(&pool, &req.email_or_username).await
    } else {
        UserRepository::find_by_username(&pool, &req.email_or_username).await
    };

    let user = match user {
        Ok(Some(user)) => user,
        Ok(None) => {
            warn!("[LOGIN] User not found: {}", req.email_or_username);
            return Err((
                StatusCode::UNAUTHORIZED,
                Json(ErrorResponse {
                    error: "Invalid credentials".to_string(),
                }),
            ));
        }
        Err(e) => {
            error!("[LOGIN] Database error: {}", e);
            return Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Database error".to_string(),
                }),
            ));
        }
    };

    if !user.is_active {
        warn!("[LOGIN] Account deactivated: {}", user.username);
        return Err((
            StatusCode::FORBIDDEN,
            Json(ErrorResponse {
                error: "Account is deactivated".to_string(),
            }),
        ));
    }

    let is_valid = match verify_password(&req.password, &user.password_hash) {
        Ok(valid) => valid,
        Err(e) => {
            error!("[LOGIN] Password verification error: {}", e);
            return Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Authentication error".to_string(),
                }),
            ));
        }
    };

    if !is_valid {
        warn!("[LOGIN] Invalid password for user: {}", user.username);
        return Err((
            StatusCode::UNAUTHORIZED,
            Json(ErrorResponse {
                error: "Invalid credentials".to_string(),
            }),
        ));
    }

    let _ = UserRepository::update_last_login(&pool, user.id).await;

    let coins = LedgerRepository::balance(&pool, user.id)
        .await
        .unwrap_or(0);

    let token = match encode_jwt(
        user.id,
        user.username.clone(),
        &config.jwt_secret,
        config.jwt_expiration_hours,
    ) {
        Ok(token) => token,
        Err(e) => {
            error!("[LOGIN] JWT encoding failed: {}", e);
            return Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Failed to generate token".to_string(),
                }),
            ));
        }
    };

    info!(
        "[LOGIN] User {} (id {}) authenticated, {} coins",
        user.username, user.id, coins
    );

    Ok((
        StatusCode::OK,
        Json(AuthResponse {
            token,
            user: UserInfo {
                id: user.id,
                username: user.username,
                email: user.email,
                coins,
            },
            message: "Login successful".to_string(),
        }),
    ))
}
