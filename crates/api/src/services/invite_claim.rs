//! The invite claim workflow.
//!
//! Converts a one-time invite code submitted by an authenticated caller
//! into the therapist role plus populated profile metadata. The sequence:
//!
//! 1. Look up the invite by exact (trimmed, case-sensitive) code.
//! 2. Require status `pending`.
//! 3. Enforce the restricted-email match when both sides carry an email.
//! 4. Commit: conditional status transition and profile promotion in one
//!    transaction, so concurrent claims of the same code cannot both win
//!    and a used invite always has a promoted profile.
//! 5. Revoke the caller's sessions and issue a fresh token pair carrying
//!    the new claims.

use sqlx::PgPool;
use thiserror::Error;
use uuid::Uuid;

use domain::models::{ClaimInviteRequest, ClaimInviteResponse, InviteStatus, UserRole};
use persistence::repositories::{ClaimOutcome, InviteRepository, UserRepository};

use crate::middleware::metrics::record_invite_claim;
use crate::services::auth::{AuthError, AuthService};

/// Errors produced by the claim workflow.
#[derive(Debug, Error)]
pub enum ClaimError {
    #[error("Invite code is required")]
    EmptyCode,

    #[error("Invalid invite code")]
    UnknownCode,

    #[error("Invite code has already been used")]
    AlreadyUsed,

    #[error("Invite code has been revoked")]
    Revoked,

    #[error("Invite is restricted to a different email address")]
    EmailMismatch,

    #[error("User profile not found")]
    ProfileNotFound,

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),
}

/// Service executing the claim workflow.
#[derive(Clone)]
pub struct ClaimService {
    pool: PgPool,
    auth: AuthService,
}

impl ClaimService {
    /// Creates a new claim service.
    pub fn new(pool: PgPool, auth: AuthService) -> Self {
        Self { pool, auth }
    }

    /// Claims an invite code for the authenticated caller.
    pub async fn claim(
        &self,
        caller_id: Uuid,
        request: &ClaimInviteRequest,
    ) -> Result<ClaimInviteResponse, ClaimError> {
        let code = request.code.trim();
        if code.is_empty() {
            return Err(ClaimError::EmptyCode);
        }

        let invites = InviteRepository::new(self.pool.clone());
        let users = UserRepository::new(self.pool.clone());

        // Step 1: lookup, exact match.
        let invite = invites
            .find_by_code(code)
            .await?
            .ok_or(ClaimError::UnknownCode)?;

        // Step 2: status precondition.
        match invite.status {
            InviteStatus::Pending => {}
            InviteStatus::Used => {
                record_invite_claim("already_used");
                return Err(ClaimError::AlreadyUsed);
            }
            InviteStatus::Revoked => {
                record_invite_claim("revoked");
                return Err(ClaimError::Revoked);
            }
        }

        let user = users
            .find_by_id(caller_id)
            .await?
            .ok_or(ClaimError::ProfileNotFound)?;

        // Step 3: restricted email, case-insensitive. Skipped when either
        // side has no email on record.
        if let Some(restricted) = invite.email.as_deref() {
            if !user.email.is_empty()
                && !restricted.trim().is_empty()
                && !restricted.trim().eq_ignore_ascii_case(user.email.trim())
            {
                record_invite_claim("email_mismatch");
                return Err(ClaimError::EmailMismatch);
            }
        }

        // Step 4: atomic commit. A concurrent claim that won the conditional
        // update surfaces as AlreadyTaken here.
        let display_name = request.display_name.as_deref().map(str::trim);
        let outcome = invites
            .claim(&invite, caller_id, display_name.filter(|s| !s.is_empty()))
            .await?;

        if outcome == ClaimOutcome::AlreadyTaken {
            record_invite_claim("lost_race");
            return Err(ClaimError::AlreadyUsed);
        }

        // Step 5: revoke old sessions, issue tokens with the new claims.
        self.auth.revoke_sessions(caller_id).await?;

        let promoted = users
            .find_by_id(caller_id)
            .await?
            .ok_or(ClaimError::ProfileNotFound)?;
        let tokens = self.auth.issue_session(&promoted).await?;

        tracing::info!(
            user_id = %caller_id,
            invite_id = %invite.id,
            therapist_types = ?invite.therapist_types,
            "Invite claimed, caller promoted to therapist"
        );
        record_invite_claim("claimed");

        Ok(ClaimInviteResponse {
            invite_id: invite.id,
            role: UserRole::Therapist,
            therapist_types: invite.therapist_types,
            license_valid_until: invite.license_valid_until,
            contract_reference: invite.contract_reference,
            access_token: tokens.access_token,
            refresh_token: tokens.refresh_token,
            expires_in: self.auth.access_token_expiry(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_claim_error_messages_distinguish_status() {
        // Used and revoked invites both fail the precondition, with
        // different human-readable text.
        let used = format!("{}", ClaimError::AlreadyUsed);
        let revoked = format!("{}", ClaimError::Revoked);
        assert_ne!(used, revoked);
        assert!(used.contains("used"));
        assert!(revoked.contains("revoked"));
    }

    #[test]
    fn test_claim_error_unknown_code_message() {
        assert_eq!(format!("{}", ClaimError::UnknownCode), "Invalid invite code");
    }
}
