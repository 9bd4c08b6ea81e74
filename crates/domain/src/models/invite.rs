//! Therapist invite domain models.
//!
//! Invites are one-time codes created by administrators. Claiming a pending
//! code promotes the caller to the therapist role with the sub-types and
//! license metadata recorded on the invite.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;
use validator::Validate;

use shared::validation::validate_invite_code;

/// Maximum attempts when generating a unique invite code.
pub const MAX_CODE_GENERATION_ATTEMPTS: usize = 5;

/// Invite lifecycle state.
///
/// `pending -> used` happens only through the claim workflow; `pending <->
/// revoked` only through admin updates. `used` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "invite_status", rename_all = "lowercase")]
pub enum InviteStatus {
    Pending,
    Used,
    Revoked,
}

impl InviteStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InviteStatus::Pending => "pending",
            InviteStatus::Used => "used",
            InviteStatus::Revoked => "revoked",
        }
    }
}

impl fmt::Display for InviteStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Therapist invite record.
#[derive(Debug, Clone)]
pub struct TherapistInvite {
    pub id: Uuid,
    pub code: String,
    pub status: InviteStatus,
    pub therapist_types: Vec<String>,
    pub email: Option<String>,
    pub assigned_user_id: Option<Uuid>,
    pub license_valid_until: Option<DateTime<Utc>>,
    pub contract_reference: Option<String>,
    pub notes: Option<String>,
    pub created_by: Uuid,
    pub used_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Request to create a new therapist invite.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateInviteRequest {
    /// Sub-types granted on claim (at least one).
    #[validate(length(min = 1, message = "At least one therapist type is required"))]
    pub therapist_types: Vec<String>,

    /// Restrict the claim to this email (case-insensitive).
    #[validate(email(message = "Invalid email address"))]
    pub email: Option<String>,

    /// License expiry copied to the therapist profile on claim.
    pub license_valid_until: Option<DateTime<Utc>>,

    /// Contract reference copied to the therapist profile on claim.
    #[validate(length(max = 100, message = "Contract reference must be at most 100 characters"))]
    pub contract_reference: Option<String>,

    /// Free-form note for admin tracking.
    #[validate(length(max = 500, message = "Notes must be at most 500 characters"))]
    pub notes: Option<String>,

    /// Explicit code override; generated server-side when omitted.
    #[validate(custom(function = "validate_invite_code"))]
    pub code: Option<String>,
}

/// Request to update an invite (admin only).
///
/// Only `pending` and `revoked` invites can be edited; the status field
/// accepts exactly those two values so a used invite can never be reopened.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateInviteRequest {
    pub therapist_types: Option<Vec<String>>,

    #[validate(email(message = "Invalid email address"))]
    pub email: Option<String>,

    pub license_valid_until: Option<DateTime<Utc>>,

    #[validate(length(max = 100, message = "Contract reference must be at most 100 characters"))]
    pub contract_reference: Option<String>,

    #[validate(length(max = 500, message = "Notes must be at most 500 characters"))]
    pub notes: Option<String>,

    /// "pending" or "revoked".
    pub status: Option<InviteStatus>,
}

/// Query parameters for listing invites.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ListInvitesQuery {
    /// Filter by status: "pending", "used", "revoked" or "all" (default: "all").
    pub status: Option<String>,

    /// Page number (default: 1).
    pub page: Option<i64>,

    /// Items per page (default: 50, max: 100).
    pub per_page: Option<i64>,
}

impl ListInvitesQuery {
    /// Get the page number (1-indexed).
    pub fn page(&self) -> i64 {
        self.page.unwrap_or(1).max(1)
    }

    /// Get items per page (clamped to 1-100).
    pub fn per_page(&self) -> i64 {
        self.per_page.unwrap_or(50).clamp(1, 100)
    }

    /// Get the offset for pagination.
    pub fn offset(&self) -> i64 {
        (self.page() - 1) * self.per_page()
    }

    /// Status filter, normalized ("all" and unknown values mean no filter).
    pub fn status_filter(&self) -> Option<InviteStatus> {
        match self.status.as_deref() {
            Some("pending") => Some(InviteStatus::Pending),
            Some("used") => Some(InviteStatus::Used),
            Some("revoked") => Some(InviteStatus::Revoked),
            _ => None,
        }
    }
}

/// Invite as returned by the admin API.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InviteResponse {
    pub id: Uuid,
    pub code: String,
    pub status: InviteStatus,
    pub therapist_types: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_user_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub license_valid_until: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contract_reference: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub created_by: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub used_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<TherapistInvite> for InviteResponse {
    fn from(invite: TherapistInvite) -> Self {
        Self {
            id: invite.id,
            code: invite.code,
            status: invite.status,
            therapist_types: invite.therapist_types,
            email: invite.email,
            assigned_user_id: invite.assigned_user_id,
            license_valid_until: invite.license_valid_until,
            contract_reference: invite.contract_reference,
            notes: invite.notes,
            created_by: invite.created_by,
            used_at: invite.used_at,
            created_at: invite.created_at,
            updated_at: invite.updated_at,
        }
    }
}

/// Response for listing invites.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListInvitesResponse {
    pub invites: Vec<InviteResponse>,
    pub pagination: InvitePagination,
    pub summary: InviteSummary,
}

/// Pagination info for invite listings.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvitePagination {
    pub page: i64,
    pub per_page: i64,
    pub total: i64,
    pub total_pages: i64,
}

impl InvitePagination {
    pub fn new(page: i64, per_page: i64, total: i64) -> Self {
        let total_pages = (total + per_page - 1) / per_page;
        Self {
            page,
            per_page,
            total,
            total_pages,
        }
    }
}

/// Summary counts per status.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InviteSummary {
    pub pending: i64,
    pub used: i64,
    pub revoked: i64,
}

/// Request to claim an invite code.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ClaimInviteRequest {
    /// The invite code, matched exactly after trimming.
    #[validate(length(min = 1, message = "code is required"))]
    pub code: String,

    /// Optional display-name override written to the profile.
    #[validate(length(min = 1, max = 100, message = "Display name must be 1-100 characters"))]
    pub display_name: Option<String>,
}

/// Outcome of a successful claim.
///
/// Carries everything the caller needs to reflect the promotion without a
/// second read, plus a fresh token pair (existing sessions are revoked).
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimInviteResponse {
    pub invite_id: Uuid,
    pub role: super::UserRole,
    pub therapist_types: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub license_valid_until: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contract_reference: Option<String>,
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invite_status_serialization() {
        assert_eq!(
            serde_json::to_string(&InviteStatus::Pending).unwrap(),
            "\"pending\""
        );
        assert_eq!(
            serde_json::to_string(&InviteStatus::Used).unwrap(),
            "\"used\""
        );
        assert_eq!(
            serde_json::to_string(&InviteStatus::Revoked).unwrap(),
            "\"revoked\""
        );
    }

    #[test]
    fn test_create_invite_request_validation() {
        let valid = CreateInviteRequest {
            therapist_types: vec!["physiotherapie".to_string()],
            email: Some("new.therapist@example.com".to_string()),
            license_valid_until: None,
            contract_reference: Some("K-2024-17".to_string()),
            notes: None,
            code: None,
        };
        assert!(valid.validate().is_ok());
    }

    #[test]
    fn test_create_invite_requires_therapist_type() {
        let invalid = CreateInviteRequest {
            therapist_types: vec![],
            email: None,
            license_valid_until: None,
            contract_reference: None,
            notes: None,
            code: None,
        };
        assert!(invalid.validate().is_err());
    }

    #[test]
    fn test_create_invite_invalid_email() {
        let invalid = CreateInviteRequest {
            therapist_types: vec!["physiotherapie".to_string()],
            email: Some("not-an-email".to_string()),
            license_valid_until: None,
            contract_reference: None,
            notes: None,
            code: None,
        };
        assert!(invalid.validate().is_err());
    }

    #[test]
    fn test_create_invite_invalid_code_override() {
        let invalid = CreateInviteRequest {
            therapist_types: vec!["physiotherapie".to_string()],
            email: None,
            license_valid_until: None,
            contract_reference: None,
            notes: None,
            code: Some("bad code".to_string()),
        };
        assert!(invalid.validate().is_err());

        let valid = CreateInviteRequest {
            code: Some("ABCD2345".to_string()),
            ..invalid
        };
        assert!(valid.validate().is_ok());
    }

    #[test]
    fn test_list_invites_query_defaults() {
        let query = ListInvitesQuery::default();
        assert_eq!(query.page(), 1);
        assert_eq!(query.per_page(), 50);
        assert_eq!(query.offset(), 0);
        assert!(query.status_filter().is_none());
    }

    #[test]
    fn test_list_invites_query_clamping() {
        let query = ListInvitesQuery {
            status: None,
            page: Some(-5),
            per_page: Some(500),
        };
        assert_eq!(query.page(), 1);
        assert_eq!(query.per_page(), 100);
    }

    #[test]
    fn test_list_invites_query_status_filter() {
        let query = ListInvitesQuery {
            status: Some("used".to_string()),
            page: Some(3),
            per_page: Some(25),
        };
        assert_eq!(query.status_filter(), Some(InviteStatus::Used));
        assert_eq!(query.offset(), 50);

        let all = ListInvitesQuery {
            status: Some("all".to_string()),
            ..Default::default()
        };
        assert!(all.status_filter().is_none());
    }

    #[test]
    fn test_pagination_new() {
        let pagination = InvitePagination::new(2, 25, 75);
        assert_eq!(pagination.total_pages, 3);

        let uneven = InvitePagination::new(1, 50, 101);
        assert_eq!(uneven.total_pages, 3);
    }

    #[test]
    fn test_claim_request_validation() {
        let valid = ClaimInviteRequest {
            code: "ABCD2345".to_string(),
            display_name: Some("Dr. Weber".to_string()),
        };
        assert!(valid.validate().is_ok());

        let empty_code = ClaimInviteRequest {
            code: "".to_string(),
            display_name: None,
        };
        assert!(empty_code.validate().is_err());
    }
}
