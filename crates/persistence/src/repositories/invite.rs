//! Repository for therapist invite database operations.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use domain::models::{InviteStatus, MAX_CODE_GENERATION_ATTEMPTS};
use shared::crypto::generate_invite_code;

use crate::entities::TherapistInviteEntity;

/// Outcome of an attempt to claim a pending invite.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClaimOutcome {
    /// The invite was marked used and the profile was promoted.
    Claimed,
    /// A concurrent claim won the conditional update; nothing was changed.
    AlreadyTaken,
}

/// Repository for therapist invite operations.
#[derive(Clone)]
pub struct InviteRepository {
    pool: PgPool,
}

impl InviteRepository {
    /// Creates a new invite repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Creates a new invite.
    #[allow(clippy::too_many_arguments)]
    pub async fn create(
        &self,
        code: &str,
        therapist_types: &[String],
        email: Option<&str>,
        license_valid_until: Option<DateTime<Utc>>,
        contract_reference: Option<&str>,
        notes: Option<&str>,
        created_by: Uuid,
    ) -> Result<TherapistInviteEntity, sqlx::Error> {
        sqlx::query_as::<_, TherapistInviteEntity>(
            r#"
            INSERT INTO therapist_invites
                (id, code, status, therapist_types, email, license_valid_until,
                 contract_reference, notes, created_by)
            VALUES ($1, $2, 'pending', $3, $4, $5, $6, $7, $8)
            RETURNING id, code, status, therapist_types, email, assigned_user_id,
                      license_valid_until, contract_reference, notes, created_by, used_at,
                      created_at, updated_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(code)
        .bind(therapist_types)
        .bind(email)
        .bind(license_valid_until)
        .bind(contract_reference)
        .bind(notes)
        .bind(created_by)
        .fetch_one(&self.pool)
        .await
    }

    /// Finds an invite by its code (exact, case-sensitive match).
    pub async fn find_by_code(
        &self,
        code: &str,
    ) -> Result<Option<TherapistInviteEntity>, sqlx::Error> {
        sqlx::query_as::<_, TherapistInviteEntity>(
            r#"
            SELECT id, code, status, therapist_types, email, assigned_user_id,
                   license_valid_until, contract_reference, notes, created_by, used_at,
                   created_at, updated_at
            FROM therapist_invites
            WHERE code = $1
            "#,
        )
        .bind(code)
        .fetch_optional(&self.pool)
        .await
    }

    /// Finds an invite by ID.
    pub async fn find_by_id(
        &self,
        invite_id: Uuid,
    ) -> Result<Option<TherapistInviteEntity>, sqlx::Error> {
        sqlx::query_as::<_, TherapistInviteEntity>(
            r#"
            SELECT id, code, status, therapist_types, email, assigned_user_id,
                   license_valid_until, contract_reference, notes, created_by, used_at,
                   created_at, updated_at
            FROM therapist_invites
            WHERE id = $1
            "#,
        )
        .bind(invite_id)
        .fetch_optional(&self.pool)
        .await
    }

    /// Lists invites, newest first, optionally filtered by status.
    pub async fn list(
        &self,
        status: Option<InviteStatus>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<TherapistInviteEntity>, sqlx::Error> {
        match status {
            Some(status) => {
                sqlx::query_as::<_, TherapistInviteEntity>(
                    r#"
                    SELECT id, code, status, therapist_types, email, assigned_user_id,
                           license_valid_until, contract_reference, notes, created_by, used_at,
                           created_at, updated_at
                    FROM therapist_invites
                    WHERE status = $1
                    ORDER BY created_at DESC
                    LIMIT $2 OFFSET $3
                    "#,
                )
                .bind(status)
                .bind(limit)
                .bind(offset)
                .fetch_all(&self.pool)
                .await
            }
            None => {
                sqlx::query_as::<_, TherapistInviteEntity>(
                    r#"
                    SELECT id, code, status, therapist_types, email, assigned_user_id,
                           license_valid_until, contract_reference, notes, created_by, used_at,
                           created_at, updated_at
                    FROM therapist_invites
                    ORDER BY created_at DESC
                    LIMIT $1 OFFSET $2
                    "#,
                )
                .bind(limit)
                .bind(offset)
                .fetch_all(&self.pool)
                .await
            }
        }
    }

    /// Counts invites, optionally filtered by status.
    pub async fn count(&self, status: Option<InviteStatus>) -> Result<i64, sqlx::Error> {
        let result: (i64,) = match status {
            Some(status) => {
                sqlx::query_as("SELECT COUNT(*) FROM therapist_invites WHERE status = $1")
                    .bind(status)
                    .fetch_one(&self.pool)
                    .await?
            }
            None => {
                sqlx::query_as("SELECT COUNT(*) FROM therapist_invites")
                    .fetch_one(&self.pool)
                    .await?
            }
        };

        Ok(result.0)
    }

    /// Gets per-status invite counts.
    pub async fn summary_counts(&self) -> Result<InviteSummaryCounts, sqlx::Error> {
        let result: (i64, i64, i64) = sqlx::query_as(
            r#"
            SELECT
                COUNT(*) FILTER (WHERE status = 'pending') as pending,
                COUNT(*) FILTER (WHERE status = 'used') as used,
                COUNT(*) FILTER (WHERE status = 'revoked') as revoked
            FROM therapist_invites
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(InviteSummaryCounts {
            pending: result.0,
            used: result.1,
            revoked: result.2,
        })
    }

    /// Updates an invite's editable fields.
    ///
    /// Used invites are immutable; the WHERE clause refuses them so an admin
    /// edit can never resurrect a consumed code. Returns the updated row, or
    /// None if the invite was missing or already used.
    #[allow(clippy::too_many_arguments)]
    pub async fn update(
        &self,
        invite_id: Uuid,
        status: InviteStatus,
        therapist_types: &[String],
        email: Option<&str>,
        license_valid_until: Option<DateTime<Utc>>,
        contract_reference: Option<&str>,
        notes: Option<&str>,
    ) -> Result<Option<TherapistInviteEntity>, sqlx::Error> {
        sqlx::query_as::<_, TherapistInviteEntity>(
            r#"
            UPDATE therapist_invites
            SET status = $2, therapist_types = $3, email = $4, license_valid_until = $5,
                contract_reference = $6, notes = $7, updated_at = NOW()
            WHERE id = $1 AND status != 'used'
            RETURNING id, code, status, therapist_types, email, assigned_user_id,
                      license_valid_until, contract_reference, notes, created_by, used_at,
                      created_at, updated_at
            "#,
        )
        .bind(invite_id)
        .bind(status)
        .bind(therapist_types)
        .bind(email)
        .bind(license_valid_until)
        .bind(contract_reference)
        .bind(notes)
        .fetch_optional(&self.pool)
        .await
    }

    /// Revokes a pending invite.
    ///
    /// Returns true if the invite was revoked, false if it was not pending.
    pub async fn revoke(&self, invite_id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE therapist_invites
            SET status = 'revoked', updated_at = NOW()
            WHERE id = $1 AND status = 'pending'
            "#,
        )
        .bind(invite_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Deletes a non-used invite.
    ///
    /// Returns true if an invite was deleted.
    pub async fn delete(&self, invite_id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            DELETE FROM therapist_invites
            WHERE id = $1 AND status != 'used'
            "#,
        )
        .bind(invite_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Claims a pending invite for a user, atomically.
    ///
    /// The status transition is a conditional update guarded by
    /// `status = 'pending'`, and the profile promotion happens in the same
    /// transaction: two concurrent claims of one code can never both
    /// succeed, and a claimed invite always comes with a promoted profile.
    pub async fn claim(
        &self,
        invite: &TherapistInviteEntity,
        user_id: Uuid,
        display_name: Option<&str>,
    ) -> Result<ClaimOutcome, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        let marked = sqlx::query(
            r#"
            UPDATE therapist_invites
            SET status = 'used', assigned_user_id = $2, used_at = NOW(), updated_at = NOW()
            WHERE id = $1 AND status = 'pending'
            "#,
        )
        .bind(invite.id)
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

        if marked.rows_affected() == 0 {
            // Lost the race; dropping the transaction rolls back.
            return Ok(ClaimOutcome::AlreadyTaken);
        }

        sqlx::query(
            r#"
            UPDATE users
            SET role = 'therapist',
                therapist_types = $2,
                invite_id = $3,
                license_valid_until = $4,
                contract_reference = $5,
                display_name = COALESCE($6, display_name),
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(user_id)
        .bind(&invite.therapist_types)
        .bind(invite.id)
        .bind(invite.license_valid_until)
        .bind(invite.contract_reference.as_deref())
        .bind(display_name)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(ClaimOutcome::Claimed)
    }

    /// Generates an invite code that is not yet present in the store.
    pub async fn generate_unique_code(&self) -> Result<String, sqlx::Error> {
        for _ in 0..MAX_CODE_GENERATION_ATTEMPTS {
            let code = generate_invite_code();
            if self.find_by_code(&code).await?.is_none() {
                return Ok(code);
            }
        }

        // 32^8 possible codes; repeated collisions mean something is wrong.
        Err(sqlx::Error::Protocol(
            "Failed to generate a unique invite code".to_string(),
        ))
    }
}

/// Summary counts per invite status.
#[derive(Debug, Clone)]
pub struct InviteSummaryCounts {
    pub pending: i64,
    pub used: i64,
    pub revoked: i64,
}
