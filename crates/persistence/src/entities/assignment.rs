//! Program assignment entity (database row mapping).

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// Database row mapping for the program_assignments table.
#[derive(Debug, Clone, FromRow)]
pub struct ProgramAssignmentEntity {
    pub id: Uuid,
    pub program_id: Uuid,
    pub user_id: Uuid,
    pub assigned_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub is_active: bool,
    pub progress: f64,
    pub current_task_index: i32,
    pub streak_count: i32,
    pub best_streak: i32,
    pub last_completion_date: Option<DateTime<Utc>>,
}

impl From<ProgramAssignmentEntity> for domain::models::ProgramAssignment {
    fn from(entity: ProgramAssignmentEntity) -> Self {
        Self {
            id: entity.id,
            program_id: entity.program_id,
            user_id: entity.user_id,
            assigned_at: entity.assigned_at,
            completed_at: entity.completed_at,
            is_active: entity.is_active,
            progress: entity.progress,
            current_task_index: entity.current_task_index,
            streak_count: entity.streak_count,
            best_streak: entity.best_streak,
            last_completion_date: entity.last_completion_date,
        }
    }
}
