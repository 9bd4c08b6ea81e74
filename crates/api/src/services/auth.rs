//! Authentication service for registration, login and token management.
//!
//! Issued tokens embed the caller's role and therapist sub-types as custom
//! claims; sessions back refresh-token rotation and revocation.

use chrono::Utc;
use sqlx::PgPool;
use thiserror::Error;
use uuid::Uuid;

use domain::models::UserRole;
use persistence::entities::UserEntity;
use persistence::repositories::{SessionRepository, UserRepository};
use shared::crypto::sha256_hex;
use shared::jwt::{JwtConfig, JwtError, TokenIdentity};
use shared::password::{hash_password, verify_password, PasswordError};

use crate::config::JwtAuthConfig;

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Email already registered")]
    EmailAlreadyExists,

    #[error("Password does not meet requirements")]
    WeakPassword(String),

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("User not found")]
    UserNotFound,

    #[error("User is disabled")]
    UserDisabled,

    #[error("Invalid refresh token")]
    InvalidRefreshToken,

    #[error("Session not found")]
    SessionNotFound,

    #[error("Token error: {0}")]
    TokenError(#[from] JwtError),

    #[error("Password error: {0}")]
    PasswordError(#[from] PasswordError),

    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result of a successful authentication.
#[derive(Debug, Clone)]
pub struct AuthResult {
    pub user_id: Uuid,
    pub email: String,
    pub display_name: String,
    pub role: Option<UserRole>,
    pub therapist_types: Vec<String>,
    pub access_token: String,
    pub refresh_token: String,
    pub access_token_expires_in: i64,
}

/// Token pair with metadata.
#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access_token: String,
    pub access_token_jti: String,
    pub refresh_token: String,
    pub refresh_token_jti: String,
}

/// Result of a successful token refresh.
#[derive(Debug, Clone)]
pub struct RefreshResult {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: i64,
}

/// Authentication service.
#[derive(Clone)]
pub struct AuthService {
    pool: PgPool,
    jwt_config: JwtConfig,
    access_token_expiry: i64,
}

impl AuthService {
    /// Creates a new AuthService with the given database pool and JWT configuration.
    pub fn new(pool: PgPool, jwt_config: &JwtAuthConfig) -> Result<Self, AuthError> {
        let private_key = Self::normalize_pem_key(&jwt_config.private_key);
        let public_key = Self::normalize_pem_key(&jwt_config.public_key);

        let jwt = JwtConfig::with_leeway(
            &private_key,
            &public_key,
            jwt_config.access_token_expiry_secs,
            jwt_config.refresh_token_expiry_secs,
            jwt_config.leeway_secs,
        )
        .map_err(|e| AuthError::Internal(format!("Failed to initialize JWT: {}", e)))?;

        Ok(Self {
            pool,
            jwt_config: jwt,
            access_token_expiry: jwt_config.access_token_expiry_secs,
        })
    }

    /// Normalize PEM key by converting literal \n sequences to newlines,
    /// which is how keys survive environment-variable transport.
    fn normalize_pem_key(key: &str) -> String {
        let key = key.trim_matches('"').trim_matches('\'');
        key.replace("\\n", "\n")
    }

    /// Register a new user with email and password.
    ///
    /// New identities start with the patient role.
    pub async fn register(
        &self,
        email: &str,
        password: &str,
        display_name: &str,
    ) -> Result<AuthResult, AuthError> {
        self.validate_password(password)?;

        let password_hash = hash_password(password)?;
        let users = UserRepository::new(self.pool.clone());

        if users.find_by_email(email).await?.is_some() {
            return Err(AuthError::EmailAlreadyExists);
        }

        let created = users
            .create(email, Some(&password_hash), display_name, Some(UserRole::Patient))
            .await;

        // Unique constraint violation means a concurrent registration won.
        let user = match created {
            Err(sqlx::Error::Database(db_err))
                if db_err.code().as_deref() == Some("23505") =>
            {
                return Err(AuthError::EmailAlreadyExists);
            }
            other => other?,
        };

        let tokens = self.issue_session(&user).await?;

        Ok(AuthResult {
            user_id: user.id,
            email: user.email,
            display_name: user.display_name,
            role: user.role,
            therapist_types: user.therapist_types,
            access_token: tokens.access_token,
            refresh_token: tokens.refresh_token,
            access_token_expires_in: self.access_token_expiry,
        })
    }

    /// Login with email and password.
    pub async fn login(&self, email: &str, password: &str) -> Result<AuthResult, AuthError> {
        let users = UserRepository::new(self.pool.clone());

        let user = users
            .find_by_email(email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        if !user.is_active {
            return Err(AuthError::UserDisabled);
        }

        let password_hash = user
            .password_hash
            .as_deref()
            .ok_or(AuthError::InvalidCredentials)?;
        if !verify_password(password, password_hash)? {
            return Err(AuthError::InvalidCredentials);
        }

        users.record_login(user.id).await?;

        let tokens = self.issue_session(&user).await?;

        Ok(AuthResult {
            user_id: user.id,
            email: user.email,
            display_name: user.display_name,
            role: user.role,
            therapist_types: user.therapist_types,
            access_token: tokens.access_token,
            refresh_token: tokens.refresh_token,
            access_token_expires_in: self.access_token_expiry,
        })
    }

    /// Refresh access token using a valid refresh token.
    ///
    /// Implements token rotation: the old refresh token is invalidated and a
    /// new pair is issued. Claims are rebuilt from the current profile row,
    /// so a role change becomes visible on the next refresh at the latest.
    pub async fn refresh(&self, refresh_token: &str) -> Result<RefreshResult, AuthError> {
        let claims = self
            .jwt_config
            .validate_refresh_token(refresh_token)
            .map_err(|e| match e {
                JwtError::TokenExpired | JwtError::InvalidToken => AuthError::InvalidRefreshToken,
                _ => AuthError::TokenError(e),
            })?;

        let user_id = Uuid::parse_str(&claims.sub).map_err(|_| AuthError::InvalidRefreshToken)?;

        let sessions = SessionRepository::new(self.pool.clone());
        let jti_hash = sha256_hex(&claims.jti);

        let session = sessions
            .find_by_refresh_hash(user_id, &jti_hash)
            .await?
            .ok_or(AuthError::SessionNotFound)?;

        if session.expires_at < Utc::now() {
            sessions.delete(session.id).await?;
            return Err(AuthError::InvalidRefreshToken);
        }

        let users = UserRepository::new(self.pool.clone());
        let user = users
            .find_by_id(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        if !user.is_active {
            return Err(AuthError::UserDisabled);
        }

        let new_tokens = self.generate_tokens(&user)?;

        let new_expires_at =
            Utc::now() + chrono::Duration::seconds(self.jwt_config.refresh_token_expiry_secs);
        sessions
            .rotate(
                session.id,
                &sha256_hex(&new_tokens.access_token_jti),
                &sha256_hex(&new_tokens.refresh_token_jti),
                new_expires_at,
            )
            .await?;

        Ok(RefreshResult {
            access_token: new_tokens.access_token,
            refresh_token: new_tokens.refresh_token,
            expires_in: self.access_token_expiry,
        })
    }

    /// Logout: delete the session belonging to the presented access token.
    pub async fn logout(&self, user_id: Uuid, access_token_jti: &str) -> Result<(), AuthError> {
        let sessions = SessionRepository::new(self.pool.clone());
        sessions
            .delete_by_token_hash(user_id, &sha256_hex(access_token_jti))
            .await?;
        Ok(())
    }

    /// Revokes every session of a user.
    ///
    /// Used after role changes so stale refresh tokens cannot resurrect the
    /// old claims.
    pub async fn revoke_sessions(&self, user_id: Uuid) -> Result<u64, AuthError> {
        let sessions = SessionRepository::new(self.pool.clone());
        Ok(sessions.revoke_all_for_user(user_id).await?)
    }

    /// Issues a fresh token pair plus session for a user row.
    pub async fn issue_session(&self, user: &UserEntity) -> Result<TokenPair, AuthError> {
        let tokens = self.generate_tokens(user)?;

        let sessions = SessionRepository::new(self.pool.clone());
        let expires_at =
            Utc::now() + chrono::Duration::seconds(self.jwt_config.refresh_token_expiry_secs);
        sessions
            .create(
                user.id,
                &sha256_hex(&tokens.access_token_jti),
                &sha256_hex(&tokens.refresh_token_jti),
                expires_at,
            )
            .await?;

        Ok(tokens)
    }

    /// Access token expiry in seconds.
    pub fn access_token_expiry(&self) -> i64 {
        self.access_token_expiry
    }

    /// Generate access and refresh tokens carrying the user's claims.
    fn generate_tokens(&self, user: &UserEntity) -> Result<TokenPair, AuthError> {
        let identity = TokenIdentity {
            user_id: user.id,
            // Identities without a role claim are treated as patients until
            // the default-role grant persists it.
            role: user
                .role
                .map(|r| r.as_str().to_string())
                .unwrap_or_else(|| UserRole::Patient.as_str().to_string()),
            therapist_types: user.therapist_types.clone(),
        };

        let (access_token, access_jti) = self.jwt_config.generate_access_token(&identity)?;
        let (refresh_token, refresh_jti) = self.jwt_config.generate_refresh_token(&identity)?;

        Ok(TokenPair {
            access_token,
            access_token_jti: access_jti,
            refresh_token,
            refresh_token_jti: refresh_jti,
        })
    }

    /// Validate password meets security requirements.
    ///
    /// Requirements: minimum 8 characters, at least one uppercase letter,
    /// one lowercase letter and one digit.
    fn validate_password(&self, password: &str) -> Result<(), AuthError> {
        if password.len() < 8 {
            return Err(AuthError::WeakPassword(
                "Password must be at least 8 characters".to_string(),
            ));
        }

        if !password.chars().any(|c| c.is_uppercase()) {
            return Err(AuthError::WeakPassword(
                "Password must contain at least one uppercase letter".to_string(),
            ));
        }

        if !password.chars().any(|c| c.is_lowercase()) {
            return Err(AuthError::WeakPassword(
                "Password must contain at least one lowercase letter".to_string(),
            ));
        }

        if !password.chars().any(|c| c.is_ascii_digit()) {
            return Err(AuthError::WeakPassword(
                "Password must contain at least one digit".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_pem_key_literal_newlines() {
        let raw = "-----BEGIN KEY-----\\nabc\\n-----END KEY-----";
        let normalized = AuthService::normalize_pem_key(raw);
        assert_eq!(normalized.matches('\n').count(), 2);
    }

    #[test]
    fn test_normalize_pem_key_strips_quotes() {
        let raw = "\"-----BEGIN KEY-----\"";
        let normalized = AuthService::normalize_pem_key(raw);
        assert!(!normalized.contains('"'));
    }

    #[test]
    fn test_normalize_pem_key_untouched() {
        let raw = "-----BEGIN KEY-----\nabc\n-----END KEY-----";
        assert_eq!(AuthService::normalize_pem_key(raw), raw);
    }

    #[test]
    fn test_auth_error_display() {
        assert!(format!("{}", AuthError::EmailAlreadyExists).contains("already registered"));
        assert!(format!("{}", AuthError::InvalidCredentials).contains("Invalid credentials"));
        assert!(format!("{}", AuthError::SessionNotFound).contains("Session"));
    }
}
