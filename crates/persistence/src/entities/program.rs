//! Program entity (database row mapping).

use chrono::{DateTime, Utc};
use domain::models::{ProgramType, TemplateScope};
use sqlx::FromRow;
use std::str::FromStr;
use uuid::Uuid;

/// Database row mapping for the programs table.
#[derive(Debug, Clone, FromRow)]
pub struct ProgramEntity {
    pub id: Uuid,
    pub title: String,
    pub subtitle: String,
    pub description: String,
    pub program_type: String,
    pub task_template_ids: Vec<Uuid>,
    pub icon: String,
    pub color: String,
    pub owner_id: Uuid,
    pub roles: Vec<String>,
    pub therapist_types: Vec<String>,
    pub scope: String,
    pub is_published: bool,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ProgramEntity> for domain::models::Program {
    fn from(entity: ProgramEntity) -> Self {
        Self {
            id: entity.id,
            title: entity.title,
            subtitle: entity.subtitle,
            description: entity.description,
            program_type: ProgramType::from_str(&entity.program_type)
                .unwrap_or(ProgramType::Challenge),
            task_template_ids: entity.task_template_ids,
            icon: entity.icon,
            color: entity.color,
            owner_id: entity.owner_id,
            roles: entity.roles,
            therapist_types: entity.therapist_types,
            scope: TemplateScope::from_str(&entity.scope).unwrap_or(TemplateScope::Private),
            is_published: entity.is_published,
            start_date: entity.start_date,
            end_date: entity.end_date,
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        }
    }
}
