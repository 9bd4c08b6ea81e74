//! Repository for user profile database operations.

use sqlx::PgPool;
use uuid::Uuid;

use domain::models::UserRole;

use crate::entities::UserEntity;

/// Repository for user profile operations.
#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    /// Creates a new user repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Finds a user by ID.
    pub async fn find_by_id(&self, user_id: Uuid) -> Result<Option<UserEntity>, sqlx::Error> {
        sqlx::query_as::<_, UserEntity>(
            r#"
            SELECT id, email, password_hash, display_name, role, therapist_types,
                   invite_id, license_valid_until, contract_reference, is_active,
                   created_at, updated_at, last_login_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
    }

    /// Finds a user by email (stored lowercased).
    pub async fn find_by_email(&self, email: &str) -> Result<Option<UserEntity>, sqlx::Error> {
        sqlx::query_as::<_, UserEntity>(
            r#"
            SELECT id, email, password_hash, display_name, role, therapist_types,
                   invite_id, license_valid_until, contract_reference, is_active,
                   created_at, updated_at, last_login_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email.to_lowercase())
        .fetch_optional(&self.pool)
        .await
    }

    /// Lists users, newest first.
    pub async fn list(&self, limit: i64, offset: i64) -> Result<Vec<UserEntity>, sqlx::Error> {
        sqlx::query_as::<_, UserEntity>(
            r#"
            SELECT id, email, password_hash, display_name, role, therapist_types,
                   invite_id, license_valid_until, contract_reference, is_active,
                   created_at, updated_at, last_login_at
            FROM users
            ORDER BY created_at DESC
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
    }

    /// Counts all users.
    pub async fn count(&self) -> Result<i64, sqlx::Error> {
        let result: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;

        Ok(result.0)
    }

    /// Lists users with a given role, ordered by display name.
    pub async fn list_by_role(&self, role: UserRole) -> Result<Vec<UserEntity>, sqlx::Error> {
        sqlx::query_as::<_, UserEntity>(
            r#"
            SELECT id, email, password_hash, display_name, role, therapist_types,
                   invite_id, license_valid_until, contract_reference, is_active,
                   created_at, updated_at, last_login_at
            FROM users
            WHERE role = $1
            ORDER BY display_name ASC
            "#,
        )
        .bind(role)
        .fetch_all(&self.pool)
        .await
    }

    /// Sets a user's role.
    ///
    /// Returns true if the user exists.
    pub async fn set_role(&self, user_id: Uuid, role: UserRole) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET role = $2, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(user_id)
        .bind(role)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Grants the default role to a user that has none.
    ///
    /// Returns true when the grant happened, false when a role was already
    /// present (the call is idempotent and never downgrades).
    pub async fn ensure_default_role(&self, user_id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET role = 'patient', updated_at = NOW()
            WHERE id = $1 AND role IS NULL
            "#,
        )
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Inserts a new user profile.
    pub async fn create(
        &self,
        email: &str,
        password_hash: Option<&str>,
        display_name: &str,
        role: Option<UserRole>,
    ) -> Result<UserEntity, sqlx::Error> {
        sqlx::query_as::<_, UserEntity>(
            r#"
            INSERT INTO users (id, email, password_hash, display_name, role)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, email, password_hash, display_name, role, therapist_types,
                      invite_id, license_valid_until, contract_reference, is_active,
                      created_at, updated_at, last_login_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(email.to_lowercase())
        .bind(password_hash)
        .bind(display_name)
        .bind(role)
        .fetch_one(&self.pool)
        .await
    }

    /// Stamps a successful login.
    pub async fn record_login(&self, user_id: Uuid) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE users SET last_login_at = NOW() WHERE id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Inserts or refreshes a profile row from an external identity record.
    ///
    /// Used by the operator sync tooling; existing role and therapist
    /// metadata are preserved unless the incoming record carries a role.
    pub async fn upsert_profile(
        &self,
        user_id: Uuid,
        email: &str,
        display_name: &str,
        role: Option<UserRole>,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO users (id, email, password_hash, display_name, role)
            VALUES ($1, $2, NULL, $3, $4)
            ON CONFLICT (id) DO UPDATE
            SET email = EXCLUDED.email,
                display_name = EXCLUDED.display_name,
                role = COALESCE(EXCLUDED.role, users.role),
                updated_at = NOW()
            "#,
        )
        .bind(user_id)
        .bind(email.to_lowercase())
        .bind(display_name)
        .bind(role)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
