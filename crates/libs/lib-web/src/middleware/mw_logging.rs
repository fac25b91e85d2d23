//! # Request/Response Logging Middleware
//!
//! Structured logging for HTTP requests and responses with request IDs.
//!
//! This middleware logs:
//! - Request method, path, query params
//! - Request headers (sanitized)
//! - Response status and duration
//!
//! Bodies of sensitive endpoints (credentials, image payloads) are never
//! logged.

use axum::{extract::Request, middleware::Next, response::Response};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Sensitive headers that should not be logged
const SENSITIVE_HEADERS: &[&str] = &[
    "authorization",
    "cookie",
    "x-api-key",
    "x-auth-token",
    "authentication",
];

/// Endpoints whose bodies and query strings must never appear in logs:
/// credentials, base64 image payloads (the latter also for size reasons),
/// and the balance WebSocket, which carries its JWT in the query.
const SENSITIVE_ENDPOINTS: &[&str] = &[
    "/api/auth/login",
    "/api/auth/signup",
    "/api/tools/resize",
    "/api/tools/remove-background",
    "/api/assets",
    "/api/ws/balance",
];

/// Query string as it may appear in logs: sensitive endpoints get a
/// redaction marker instead of the raw string.
fn loggable_query(path: &str, query: Option<&str>) -> Option<String> {
    let query = query?;
    if SENSITIVE_ENDPOINTS.iter().any(|ep| path.starts_with(ep)) {
        Some("***REDACTED***".to_string())
    } else {
        Some(query.to_string())
    }
}

/// Request/response logging middleware.
pub async fn log_requests(req: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = req.method().clone();
    let uri = req.uri().clone();
    let path = uri.path().to_string();
    let query = loggable_query(&path, uri.query());

    let request_id = req
        .extensions()
        .get::<crate::middleware::mw_req_stamp::RequestStamp>()
        .map(|s| s.id.clone())
        .unwrap_or_else(|| "unknown".to_string());

    let is_sensitive = SENSITIVE_ENDPOINTS.iter().any(|ep| path.starts_with(ep));

    let headers: Vec<(String, String)> = req
        .headers()
        .iter()
        .filter_map(|(name, value)| {
            let name_lower = name.as_str().to_lowercase();
            if SENSITIVE_HEADERS.iter().any(|h| name_lower.contains(h)) {
                Some((name.to_string(), "***REDACTED***".to_string()))
            } else {
                value.to_str().ok().map(|v| (name.to_string(), v.to_string()))
            }
        })
        .collect();

    info!(
        request_id = %request_id,
        method = %method,
        path = %path,
        query = ?query,
        sensitive = is_sensitive,
        "[REQUEST] {} {}{}",
        method,
        path,
        query.as_ref().map(|q| format!("?{}", q)).unwrap_or_default()
    );

    debug!(
        request_id = %request_id,
        headers = ?headers,
        "[REQUEST] Headers"
    );

    let res = next.run(req).await;

    let status = res.status();
    let duration_ms = start.elapsed().as_millis();

    if status.is_server_error() || status.is_client_error() {
        warn!(
            request_id = %request_id,
            status = %status,
            duration_ms,
            "[RESPONSE] {} {} -> {} ({}ms)",
            method,
            path,
            status,
            duration_ms
        );
    } else {
        info!(
            request_id = %request_id,
            status = %status,
            duration_ms,
            "[RESPONSE] {} {} -> {} ({}ms)",
            method,
            path,
            status,
            duration_ms
        );
    }

    res
}
