//! Repository for program assignment database operations.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::ProgramAssignmentEntity;

const ASSIGNMENT_COLUMNS: &str = r#"id, program_id, user_id, assigned_at, completed_at, is_active,
                   progress, current_task_index, streak_count, best_streak, last_completion_date"#;

/// Progress fields written by an update.
#[derive(Debug, Clone)]
pub struct ProgressUpdate {
    pub progress: f64,
    pub current_task_index: i32,
    pub streak_count: i32,
    pub best_streak: i32,
    pub last_completion_date: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

/// Repository for assignment operations.
#[derive(Clone)]
pub struct AssignmentRepository {
    pool: PgPool,
}

impl AssignmentRepository {
    /// Creates a new assignment repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Creates an assignment.
    pub async fn create(
        &self,
        program_id: Uuid,
        user_id: Uuid,
    ) -> Result<ProgramAssignmentEntity, sqlx::Error> {
        let sql = format!(
            r#"
            INSERT INTO program_assignments (id, program_id, user_id)
            VALUES ($1, $2, $3)
            RETURNING {ASSIGNMENT_COLUMNS}
            "#
        );

        sqlx::query_as::<_, ProgramAssignmentEntity>(&sql)
            .bind(Uuid::new_v4())
            .bind(program_id)
            .bind(user_id)
            .fetch_one(&self.pool)
            .await
    }

    /// Finds an assignment by ID.
    pub async fn find_by_id(
        &self,
        assignment_id: Uuid,
    ) -> Result<Option<ProgramAssignmentEntity>, sqlx::Error> {
        let sql = format!("SELECT {ASSIGNMENT_COLUMNS} FROM program_assignments WHERE id = $1");

        sqlx::query_as::<_, ProgramAssignmentEntity>(&sql)
            .bind(assignment_id)
            .fetch_optional(&self.pool)
            .await
    }

    /// Checks whether a user already has an active assignment of a program.
    pub async fn has_active(&self, program_id: Uuid, user_id: Uuid) -> Result<bool, sqlx::Error> {
        let result: (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*) FROM program_assignments
            WHERE program_id = $1 AND user_id = $2 AND is_active
            "#,
        )
        .bind(program_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(result.0 > 0)
    }

    /// Counts active assignments of a program.
    pub async fn count_active_for_program(&self, program_id: Uuid) -> Result<i64, sqlx::Error> {
        let result: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM program_assignments WHERE program_id = $1 AND is_active",
        )
        .bind(program_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(result.0)
    }

    /// Lists assignments, optionally filtered by user and active flag.
    pub async fn list(
        &self,
        user_id: Option<Uuid>,
        active: Option<bool>,
    ) -> Result<Vec<ProgramAssignmentEntity>, sqlx::Error> {
        let sql = format!(
            r#"
            SELECT {ASSIGNMENT_COLUMNS} FROM program_assignments
            WHERE ($1::uuid IS NULL OR user_id = $1)
              AND ($2::boolean IS NULL OR is_active = $2)
            ORDER BY assigned_at DESC
            "#
        );

        sqlx::query_as::<_, ProgramAssignmentEntity>(&sql)
            .bind(user_id)
            .bind(active)
            .fetch_all(&self.pool)
            .await
    }

    /// Writes a progress update. Returns the updated row if it exists.
    pub async fn update_progress(
        &self,
        assignment_id: Uuid,
        update: &ProgressUpdate,
    ) -> Result<Option<ProgramAssignmentEntity>, sqlx::Error> {
        let sql = format!(
            r#"
            UPDATE program_assignments
            SET progress = $2, current_task_index = $3, streak_count = $4, best_streak = $5,
                last_completion_date = $6, completed_at = $7
            WHERE id = $1
            RETURNING {ASSIGNMENT_COLUMNS}
            "#
        );

        sqlx::query_as::<_, ProgramAssignmentEntity>(&sql)
            .bind(assignment_id)
            .bind(update.progress)
            .bind(update.current_task_index)
            .bind(update.streak_count)
            .bind(update.best_streak)
            .bind(update.last_completion_date)
            .bind(update.completed_at)
            .fetch_optional(&self.pool)
            .await
    }

    /// Deactivates an assignment.
    ///
    /// Returns true if an active assignment was deactivated.
    pub async fn deactivate(&self, assignment_id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE program_assignments SET is_active = FALSE WHERE id = $1 AND is_active",
        )
        .bind(assignment_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
