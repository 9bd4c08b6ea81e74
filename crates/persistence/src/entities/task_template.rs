//! Task template entity (database row mapping).

use chrono::{DateTime, Utc};
use domain::models::{TaskType, TaskVisibility, TemplateScope};
use sqlx::FromRow;
use std::str::FromStr;
use uuid::Uuid;

/// Database row mapping for the task_templates table.
///
/// `task_type`, `visibility` and `scope` are stored as their wire tags;
/// `config` and `evidence_config` are stored as JSONB documents.
#[derive(Debug, Clone, FromRow)]
pub struct TaskTemplateEntity {
    pub id: Uuid,
    pub title: String,
    pub task_type: String,
    pub icon: String,
    pub description: Option<String>,
    pub visibility: String,
    pub config: Option<serde_json::Value>,
    pub evidence_config: Option<serde_json::Value>,
    pub roles: Vec<String>,
    pub therapist_types: Vec<String>,
    pub scope: String,
    pub owner_id: Option<Uuid>,
    pub is_published: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<TaskTemplateEntity> for domain::models::TaskTemplate {
    fn from(entity: TaskTemplateEntity) -> Self {
        Self {
            id: entity.id,
            title: entity.title,
            // Rows are written through the typed DTOs, so the tags parse;
            // fall back to a timer rather than panic on hand-edited data.
            task_type: TaskType::from_str(&entity.task_type).unwrap_or(TaskType::Timer),
            icon: entity.icon,
            description: entity.description,
            visibility: TaskVisibility::from_str(&entity.visibility)
                .unwrap_or(TaskVisibility::VisibleToPatients),
            config: entity
                .config
                .and_then(|value| serde_json::from_value(value).ok()),
            evidence_config: entity
                .evidence_config
                .and_then(|value| serde_json::from_value(value).ok()),
            roles: entity.roles,
            therapist_types: entity.therapist_types,
            scope: TemplateScope::from_str(&entity.scope).unwrap_or(TemplateScope::Private),
            owner_id: entity.owner_id,
            is_published: entity.is_published,
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        }
    }
}
