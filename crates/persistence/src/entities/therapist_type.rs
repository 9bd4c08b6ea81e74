//! Therapist type entity (database row mapping).

use sqlx::FromRow;

/// Database row mapping for the therapist_types table.
#[derive(Debug, Clone, FromRow)]
pub struct TherapistTypeEntity {
    pub id: String,
    pub name: String,
}

impl From<TherapistTypeEntity> for domain::models::TherapistType {
    fn from(entity: TherapistTypeEntity) -> Self {
        Self {
            id: entity.id,
            name: entity.name,
        }
    }
}
