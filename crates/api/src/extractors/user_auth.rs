//! User JWT authentication extractor.
//!
//! Validates the Bearer token and exposes the caller's identity claims
//! (user id, role, therapist sub-types) to handlers.

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use std::str::FromStr;
use uuid::Uuid;

use domain::models::UserRole;
use shared::jwt::{Claims, JwtConfig};

use crate::app::AppState;
use crate::config::JwtAuthConfig;
use crate::error::ApiError;

/// Authenticated caller information from JWT claims.
#[derive(Debug, Clone)]
pub struct UserAuth {
    /// User ID from the JWT subject claim.
    pub user_id: Uuid,
    /// Role claim; None when the token was issued before a role existed.
    pub role: Option<UserRole>,
    /// Therapist sub-type claims.
    pub therapist_types: Vec<String>,
    /// JWT ID (jti) for session tracking.
    pub jti: String,
}

impl UserAuth {
    /// Builds auth info from validated claims.
    pub fn from_claims(claims: &Claims) -> Result<Self, ApiError> {
        let user_id = Uuid::parse_str(&claims.sub)
            .map_err(|_| ApiError::Unauthenticated("Invalid user ID in token".to_string()))?;

        Ok(UserAuth {
            user_id,
            role: UserRole::from_str(&claims.role).ok(),
            therapist_types: claims.therapist_types.clone(),
            jti: claims.jti.clone(),
        })
    }

    /// Creates a JwtConfig from the app's JWT settings.
    pub fn create_jwt_config(config: &JwtAuthConfig) -> Result<JwtConfig, String> {
        JwtConfig::with_leeway(
            &config.private_key,
            &config.public_key,
            config.access_token_expiry_secs,
            config.refresh_token_expiry_secs,
            config.leeway_secs,
        )
        .map_err(|e| format!("Failed to initialize JWT config: {}", e))
    }

    /// True when the caller carries the admin role claim.
    pub fn is_admin(&self) -> bool {
        self.role == Some(UserRole::Admin)
    }

    /// Requires the admin role.
    pub fn require_admin(&self) -> Result<(), ApiError> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(ApiError::PermissionDenied(
                "Admin privileges required".to_string(),
            ))
        }
    }

    /// Requires the therapist role (admins pass as well).
    pub fn require_therapist(&self) -> Result<(), ApiError> {
        match self.role {
            Some(UserRole::Therapist) | Some(UserRole::Admin) => Ok(()),
            _ => Err(ApiError::PermissionDenied(
                "Therapist privileges required".to_string(),
            )),
        }
    }
}

#[async_trait]
impl FromRequestParts<AppState> for UserAuth {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        // Check if auth info was already inserted by middleware
        if let Some(auth) = parts.extensions.get::<UserAuth>() {
            return Ok(auth.clone());
        }

        let auth_header = parts
            .headers
            .get("Authorization")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| {
                ApiError::Unauthenticated("Missing Authorization header".to_string())
            })?;

        let token = auth_header.strip_prefix("Bearer ").ok_or_else(|| {
            ApiError::Unauthenticated("Invalid Authorization header format".to_string())
        })?;

        let jwt_config =
            UserAuth::create_jwt_config(&state.config.jwt).map_err(ApiError::Internal)?;

        let claims = jwt_config
            .validate_access_token(token)
            .map_err(|_| ApiError::Unauthenticated("Invalid or expired token".to_string()))?;

        UserAuth::from_claims(&claims)
    }
}

/// Optional user JWT authentication.
///
/// Allows routes to check for authentication without rejecting
/// unauthenticated requests.
#[derive(Debug, Clone)]
pub struct OptionalUserAuth(pub Option<UserAuth>);

#[async_trait]
impl FromRequestParts<AppState> for OptionalUserAuth {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        match UserAuth::from_request_parts(parts, state).await {
            Ok(auth) => Ok(OptionalUserAuth(Some(auth))),
            Err(_) => Ok(OptionalUserAuth(None)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::jwt::TokenType;

    fn claims_for(role: &str, types: Vec<String>) -> Claims {
        Claims {
            sub: Uuid::new_v4().to_string(),
            role: role.to_string(),
            therapist_types: types,
            exp: 0,
            iat: 0,
            jti: "test_jti".to_string(),
            token_type: TokenType::Access,
        }
    }

    #[test]
    fn test_from_claims_parses_role() {
        let auth = UserAuth::from_claims(&claims_for("admin", vec![])).unwrap();
        assert_eq!(auth.role, Some(UserRole::Admin));
        assert!(auth.is_admin());
    }

    #[test]
    fn test_from_claims_unknown_role_is_none() {
        let auth = UserAuth::from_claims(&claims_for("", vec![])).unwrap();
        assert_eq!(auth.role, None);
        assert!(!auth.is_admin());
    }

    #[test]
    fn test_from_claims_invalid_sub() {
        let mut claims = claims_for("patient", vec![]);
        claims.sub = "not-a-uuid".to_string();
        assert!(UserAuth::from_claims(&claims).is_err());
    }

    #[test]
    fn test_require_admin() {
        let admin = UserAuth::from_claims(&claims_for("admin", vec![])).unwrap();
        assert!(admin.require_admin().is_ok());

        let therapist = UserAuth::from_claims(&claims_for("therapist", vec![])).unwrap();
        assert!(matches!(
            therapist.require_admin(),
            Err(ApiError::PermissionDenied(_))
        ));
    }

    #[test]
    fn test_require_therapist() {
        let therapist = UserAuth::from_claims(&claims_for(
            "therapist",
            vec!["physiotherapie".to_string()],
        ))
        .unwrap();
        assert!(therapist.require_therapist().is_ok());
        assert_eq!(therapist.therapist_types, vec!["physiotherapie".to_string()]);

        // Admins pass the therapist check too
        let admin = UserAuth::from_claims(&claims_for("admin", vec![])).unwrap();
        assert!(admin.require_therapist().is_ok());

        let patient = UserAuth::from_claims(&claims_for("patient", vec![])).unwrap();
        assert!(patient.require_therapist().is_err());
    }
}
