//! JWT authentication middleware.
//!
//! Validates the Bearer token and stores the caller's identity in request
//! extensions, for routes whose downstream middleware (e.g. the claim rate
//! limiter) needs the identity before the handler runs. Handlers using the
//! `UserAuth` extractor pick the same value up from extensions.

use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::app::AppState;
use crate::extractors::UserAuth;

/// Middleware that requires JWT user authentication.
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let auth_header = req
        .headers()
        .get("Authorization")
        .and_then(|v| v.to_str().ok());

    let token = match auth_header.and_then(|h| h.strip_prefix("Bearer ")) {
        Some(token) => token,
        None => return unauthenticated_response("Missing or invalid Authorization header"),
    };

    let jwt_config = match UserAuth::create_jwt_config(&state.config.jwt) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Failed to create JWT config: {}", e);
            return internal_error_response("Authentication service unavailable");
        }
    };

    let claims = match jwt_config.validate_access_token(token) {
        Ok(claims) => claims,
        Err(e) => {
            tracing::debug!("JWT validation failed: {}", e);
            return unauthenticated_response("Invalid or expired token");
        }
    };

    match UserAuth::from_claims(&claims) {
        Ok(auth) => {
            req.extensions_mut().insert(auth);
            next.run(req).await
        }
        Err(_) => unauthenticated_response("Invalid or expired token"),
    }
}

fn unauthenticated_response(message: &str) -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({
            "error": "unauthenticated",
            "message": message
        })),
    )
        .into_response()
}

fn internal_error_response(message: &str) -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({
            "error": "internal_error",
            "message": message
        })),
    )
        .into_response()
}
