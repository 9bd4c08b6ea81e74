//! Repository for user session database operations.
//!
//! Sessions back refresh-token rotation; deleting a user's sessions is the
//! "revoke refresh tokens" primitive used after role changes.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::UserSessionEntity;

/// Repository for session operations.
#[derive(Clone)]
pub struct SessionRepository {
    pool: PgPool,
}

impl SessionRepository {
    /// Creates a new session repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Creates a session row for freshly issued tokens.
    pub async fn create(
        &self,
        user_id: Uuid,
        token_hash: &str,
        refresh_token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<Uuid, sqlx::Error> {
        let session_id = Uuid::new_v4();

        sqlx::query(
            r#"
            INSERT INTO user_sessions
                (id, user_id, token_hash, refresh_token_hash, expires_at, created_at, last_used_at)
            VALUES ($1, $2, $3, $4, $5, NOW(), NOW())
            "#,
        )
        .bind(session_id)
        .bind(user_id)
        .bind(token_hash)
        .bind(refresh_token_hash)
        .bind(expires_at)
        .execute(&self.pool)
        .await?;

        Ok(session_id)
    }

    /// Finds a session by the hash of its refresh token jti.
    pub async fn find_by_refresh_hash(
        &self,
        user_id: Uuid,
        refresh_token_hash: &str,
    ) -> Result<Option<UserSessionEntity>, sqlx::Error> {
        sqlx::query_as::<_, UserSessionEntity>(
            r#"
            SELECT id, user_id, token_hash, refresh_token_hash, expires_at,
                   created_at, last_used_at
            FROM user_sessions
            WHERE refresh_token_hash = $1 AND user_id = $2
            "#,
        )
        .bind(refresh_token_hash)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
    }

    /// Rotates a session's token hashes after a refresh.
    pub async fn rotate(
        &self,
        session_id: Uuid,
        token_hash: &str,
        refresh_token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            UPDATE user_sessions
            SET token_hash = $2, refresh_token_hash = $3, expires_at = $4, last_used_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(session_id)
        .bind(token_hash)
        .bind(refresh_token_hash)
        .bind(expires_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Deletes a single session by ID.
    pub async fn delete(&self, session_id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM user_sessions WHERE id = $1")
            .bind(session_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Deletes the session matching an access-token hash (logout).
    pub async fn delete_by_token_hash(
        &self,
        user_id: Uuid,
        token_hash: &str,
    ) -> Result<bool, sqlx::Error> {
        let result =
            sqlx::query("DELETE FROM user_sessions WHERE user_id = $1 AND token_hash = $2")
                .bind(user_id)
                .bind(token_hash)
                .execute(&self.pool)
                .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Revokes all of a user's sessions.
    ///
    /// Returns the number of sessions removed.
    pub async fn revoke_all_for_user(&self, user_id: Uuid) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM user_sessions WHERE user_id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    /// Deletes expired sessions.
    pub async fn delete_expired(&self) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM user_sessions WHERE expires_at < NOW()")
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}
