//! User profile domain models.
//!
//! The user row doubles as the denormalized profile: identity fields plus
//! the role and therapist metadata copied from a claimed invite.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;
use validator::Validate;

/// Account role carried in the identity claims.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
pub enum UserRole {
    Admin,
    Therapist,
    Patient,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Admin => "admin",
            UserRole::Therapist => "therapist",
            UserRole::Patient => "patient",
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(UserRole::Admin),
            "therapist" => Ok(UserRole::Therapist),
            "patient" => Ok(UserRole::Patient),
            other => Err(format!("unknown role: {}", other)),
        }
    }
}

/// User profile.
#[derive(Debug, Clone)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub password_hash: Option<String>,
    pub display_name: String,
    /// None for identities imported without a role claim; the default-role
    /// grant backfills these to `patient`.
    pub role: Option<UserRole>,
    pub therapist_types: Vec<String>,
    pub invite_id: Option<Uuid>,
    pub license_valid_until: Option<DateTime<Utc>>,
    pub contract_reference: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub last_login_at: Option<DateTime<Utc>>,
}

/// Request to change a user's role (admin only).
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SetUserRoleRequest {
    /// Target role: "admin", "therapist" or "patient".
    #[validate(length(min = 1, message = "role is required"))]
    pub role: String,
}

/// User profile as returned by the API.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: Uuid,
    pub email: String,
    pub display_name: String,
    pub role: Option<UserRole>,
    pub therapist_types: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invite_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub license_valid_until: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contract_reference: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            display_name: user.display_name,
            role: user.role,
            therapist_types: user.therapist_types,
            invite_id: user.invite_id,
            license_valid_until: user.license_valid_until,
            contract_reference: user.contract_reference,
            is_active: user.is_active,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

/// Response of the idempotent default-role grant.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnsureRoleResponse {
    pub role: UserRole,
    /// True when the call granted the default role, false when a role
    /// was already present.
    pub granted: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_round_trip() {
        for role in [UserRole::Admin, UserRole::Therapist, UserRole::Patient] {
            assert_eq!(UserRole::from_str(role.as_str()).unwrap(), role);
        }
    }

    #[test]
    fn test_role_from_str_rejects_unknown() {
        assert!(UserRole::from_str("superadmin").is_err());
        assert!(UserRole::from_str("").is_err());
        assert!(UserRole::from_str("Admin").is_err()); // case sensitive
    }

    #[test]
    fn test_role_serialization() {
        assert_eq!(serde_json::to_string(&UserRole::Admin).unwrap(), "\"admin\"");
        assert_eq!(
            serde_json::to_string(&UserRole::Therapist).unwrap(),
            "\"therapist\""
        );
        assert_eq!(
            serde_json::to_string(&UserRole::Patient).unwrap(),
            "\"patient\""
        );
    }

    #[test]
    fn test_set_user_role_request_validation() {
        let valid = SetUserRoleRequest {
            role: "therapist".to_string(),
        };
        assert!(valid.validate().is_ok());

        let empty = SetUserRoleRequest {
            role: "".to_string(),
        };
        assert!(empty.validate().is_err());
    }

    #[test]
    fn test_user_response_skips_empty_optionals() {
        let response = UserResponse {
            id: Uuid::new_v4(),
            email: "p@example.com".to_string(),
            display_name: "Pat".to_string(),
            role: Some(UserRole::Patient),
            therapist_types: vec![],
            invite_id: None,
            license_valid_until: None,
            contract_reference: None,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let json = serde_json::to_string(&response).unwrap();
        assert!(!json.contains("inviteId"));
        assert!(!json.contains("licenseValidUntil"));
        assert!(json.contains("displayName"));
    }
}
