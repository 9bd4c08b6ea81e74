//! Therapist invite entity (database row mapping).

use chrono::{DateTime, Utc};
use domain::models::InviteStatus;
use sqlx::FromRow;
use uuid::Uuid;

/// Database row mapping for the therapist_invites table.
#[derive(Debug, Clone, FromRow)]
pub struct TherapistInviteEntity {
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

impl From<TherapistInviteEntity> for domain::models::TherapistInvite {
    fn from(entity: TherapistInviteEntity) -> Self {
        Self {
            id: entity.id,
            code: entity.code,
            status: entity.status,
            therapist_types: entity.therapist_types,
            email: entity.email,
            assigned_user_id: entity.assigned_user_id,
            license_valid_until: entity.license_valid_until,
            contract_reference: entity.contract_reference,
            notes: entity.notes,
            created_by: entity.created_by,
            used_at: entity.used_at,
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        }
    }
}
