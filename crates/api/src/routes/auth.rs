//! Authentication routes: registration, login, token management and the
//! self-service default-role grant.

use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use validator::Validate;

use domain::models::{EnsureRoleResponse, UserResponse, UserRole};
use persistence::repositories::UserRepository;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::UserAuth;
use crate::services::auth::{AuthError, AuthResult};

/// Request body for user registration.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    /// User's email address
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    /// User's password (min 8 chars, 1 upper, 1 lower, 1 digit)
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,

    /// User's display name
    #[validate(length(min = 1, max = 100, message = "Display name must be 1-100 characters"))]
    pub display_name: String,
}

/// Request body for login.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Request body for token refresh.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    #[validate(length(min = 1, message = "Refresh token is required"))]
    pub refresh_token: String,
}

/// Token information in responses.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokensResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    pub expires_in: i64,
}

/// Response body for register/login.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub user_id: String,
    pub email: String,
    pub display_name: String,
    pub role: Option<UserRole>,
    pub therapist_types: Vec<String>,
    pub tokens: TokensResponse,
}

impl From<AuthResult> for AuthResponse {
    fn from(result: AuthResult) -> Self {
        Self {
            user_id: result.user_id.to_string(),
            email: result.email,
            display_name: result.display_name,
            role: result.role,
            therapist_types: result.therapist_types,
            tokens: TokensResponse {
                access_token: result.access_token,
                refresh_token: result.refresh_token,
                token_type: "Bearer".to_string(),
                expires_in: result.access_token_expires_in,
            },
        }
    }
}

/// Maps auth service errors onto the API error taxonomy.
fn map_auth_error(e: AuthError) -> ApiError {
    match e {
        AuthError::EmailAlreadyExists => ApiError::Conflict("Email already registered".to_string()),
        AuthError::WeakPassword(msg) => ApiError::InvalidArgument(msg),
        AuthError::InvalidCredentials => {
            ApiError::Unauthenticated("Invalid email or password".to_string())
        }
        AuthError::UserDisabled => ApiError::PermissionDenied("Account is disabled".to_string()),
        AuthError::UserNotFound => ApiError::NotFound("User not found".to_string()),
        AuthError::InvalidRefreshToken | AuthError::SessionNotFound => {
            ApiError::Unauthenticated("Invalid or expired refresh token".to_string())
        }
        AuthError::DatabaseError(db_err) => ApiError::from(db_err),
        AuthError::TokenError(e) => ApiError::Internal(format!("Token error: {}", e)),
        AuthError::PasswordError(e) => ApiError::Internal(format!("Password error: {}", e)),
        AuthError::Internal(msg) => ApiError::Internal(msg),
    }
}

/// Register a new user with email and password.
///
/// POST /api/v1/auth/register
pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), ApiError> {
    request.validate()?;

    let result = state
        .auth
        .register(&request.email, &request.password, &request.display_name)
        .await
        .map_err(map_auth_error)?;

    tracing::info!(user_id = %result.user_id, "User registered");

    Ok((StatusCode::CREATED, Json(result.into())))
}

/// Login with email and password.
///
/// POST /api/v1/auth/login
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    request.validate()?;

    let result = state
        .auth
        .login(&request.email, &request.password)
        .await
        .map_err(map_auth_error)?;

    Ok(Json(result.into()))
}

/// Rotate a refresh token into a fresh token pair.
///
/// POST /api/v1/auth/refresh
pub async fn refresh(
    State(state): State<AppState>,
    Json(request): Json<RefreshRequest>,
) -> Result<Json<TokensResponse>, ApiError> {
    request.validate()?;

    let result = state
        .auth
        .refresh(&request.refresh_token)
        .await
        .map_err(map_auth_error)?;

    Ok(Json(TokensResponse {
        access_token: result.access_token,
        refresh_token: result.refresh_token,
        token_type: "Bearer".to_string(),
        expires_in: result.expires_in,
    }))
}

/// Delete the caller's current session.
///
/// POST /api/v1/auth/logout
pub async fn logout(
    State(state): State<AppState>,
    auth: UserAuth,
) -> Result<StatusCode, ApiError> {
    state
        .auth
        .logout(auth.user_id, &auth.jti)
        .await
        .map_err(map_auth_error)?;

    Ok(StatusCode::NO_CONTENT)
}

/// The caller's own profile.
///
/// GET /api/v1/auth/me
pub async fn me(
    State(state): State<AppState>,
    auth: UserAuth,
) -> Result<Json<UserResponse>, ApiError> {
    let users = UserRepository::new(state.pool.clone());

    let user = users
        .find_by_id(auth.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User profile not found".to_string()))?;

    Ok(Json(domain::models::User::from(user).into()))
}

/// Idempotent default-role grant.
///
/// POST /api/v1/auth/ensure-role
///
/// Grants the patient role to a caller whose profile has none; returns the
/// existing role otherwise. Never downgrades.
pub async fn ensure_role(
    State(state): State<AppState>,
    auth: UserAuth,
) -> Result<Json<EnsureRoleResponse>, ApiError> {
    let users = UserRepository::new(state.pool.clone());

    let granted = users.ensure_default_role(auth.user_id).await?;

    let user = users
        .find_by_id(auth.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User profile not found".to_string()))?;

    let role = user.role.unwrap_or(UserRole::Patient);

    if granted {
        tracing::info!(user_id = %auth.user_id, "Granted default patient role");
    }

    Ok(Json(EnsureRoleResponse { role, granted }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_request_validation() {
        let request = RegisterRequest {
            email: "test@example.com".to_string(),
            password: "SecureP@ss1".to_string(),
            display_name: "Test User".to_string(),
        };
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_register_request_invalid_email() {
        let request = RegisterRequest {
            email: "not-an-email".to_string(),
            password: "SecureP@ss1".to_string(),
            display_name: "Test User".to_string(),
        };
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_register_request_empty_display_name() {
        let request = RegisterRequest {
            email: "test@example.com".to_string(),
            password: "SecureP@ss1".to_string(),
            display_name: "".to_string(),
        };
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_login_request_validation() {
        let request = LoginRequest {
            email: "test@example.com".to_string(),
            password: "pw".to_string(),
        };
        assert!(request.validate().is_ok());

        let empty = LoginRequest {
            email: "test@example.com".to_string(),
            password: "".to_string(),
        };
        assert!(empty.validate().is_err());
    }

    #[test]
    fn test_map_auth_error_statuses() {
        assert!(matches!(
            map_auth_error(AuthError::EmailAlreadyExists),
            ApiError::Conflict(_)
        ));
        assert!(matches!(
            map_auth_error(AuthError::InvalidCredentials),
            ApiError::Unauthenticated(_)
        ));
        assert!(matches!(
            map_auth_error(AuthError::UserDisabled),
            ApiError::PermissionDenied(_)
        ));
        assert!(matches!(
            map_auth_error(AuthError::SessionNotFound),
            ApiError::Unauthenticated(_)
        ));
    }
}
