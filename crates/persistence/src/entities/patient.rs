//! Patient entity (database row mapping).

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// Database row mapping for the patients table.
#[derive(Debug, Clone, FromRow)]
pub struct PatientEntity {
    pub id: Uuid,
    pub therapist_id: Uuid,
    pub firstname: String,
    pub lastname: String,
    pub diagnosis: Option<String>,
    pub next_appointment: Option<DateTime<Utc>>,
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<PatientEntity> for domain::models::Patient {
    fn from(entity: PatientEntity) -> Self {
        Self {
            id: entity.id,
            therapist_id: entity.therapist_id,
            firstname: entity.firstname,
            lastname: entity.lastname,
            diagnosis: entity.diagnosis,
            next_appointment: entity.next_appointment,
            image: entity.image,
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        }
    }
}
