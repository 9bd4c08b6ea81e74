//! Repository for program database operations.

use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::ProgramEntity;

const PROGRAM_COLUMNS: &str = r#"id, title, subtitle, description, program_type, task_template_ids,
                   icon, color, owner_id, roles, therapist_types, scope, is_published,
                   start_date, end_date, created_at, updated_at"#;

/// Insert payload for a program.
#[derive(Debug, Clone)]
pub struct NewProgram {
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
    pub start_date: Option<chrono::DateTime<chrono::Utc>>,
    pub end_date: Option<chrono::DateTime<chrono::Utc>>,
}

/// Repository for program operations.
#[derive(Clone)]
pub struct ProgramRepository {
    pool: PgPool,
}

impl ProgramRepository {
    /// Creates a new program repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Inserts a program.
    pub async fn create(&self, program: &NewProgram) -> Result<ProgramEntity, sqlx::Error> {
        let sql = format!(
            r#"
            INSERT INTO programs
                (id, title, subtitle, description, program_type, task_template_ids, icon, color,
                 owner_id, roles, therapist_types, scope, is_published, start_date, end_date)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            RETURNING {PROGRAM_COLUMNS}
            "#
        );

        sqlx::query_as::<_, ProgramEntity>(&sql)
            .bind(Uuid::new_v4())
            .bind(&program.title)
            .bind(&program.subtitle)
            .bind(&program.description)
            .bind(&program.program_type)
            .bind(&program.task_template_ids)
            .bind(&program.icon)
            .bind(&program.color)
            .bind(program.owner_id)
            .bind(&program.roles)
            .bind(&program.therapist_types)
            .bind(&program.scope)
            .bind(program.is_published)
            .bind(program.start_date)
            .bind(program.end_date)
            .fetch_one(&self.pool)
            .await
    }

    /// Finds a program by ID.
    pub async fn find_by_id(
        &self,
        program_id: Uuid,
    ) -> Result<Option<ProgramEntity>, sqlx::Error> {
        let sql = format!("SELECT {PROGRAM_COLUMNS} FROM programs WHERE id = $1");

        sqlx::query_as::<_, ProgramEntity>(&sql)
            .bind(program_id)
            .fetch_optional(&self.pool)
            .await
    }

    /// Lists every program (admin view), newest first.
    pub async fn list_all(&self) -> Result<Vec<ProgramEntity>, sqlx::Error> {
        let sql = format!("SELECT {PROGRAM_COLUMNS} FROM programs ORDER BY created_at DESC");

        sqlx::query_as::<_, ProgramEntity>(&sql)
            .fetch_all(&self.pool)
            .await
    }

    /// Lists programs visible to a therapist (same scope rules as templates).
    pub async fn list_visible(
        &self,
        owner_id: Uuid,
        therapist_types: &[String],
    ) -> Result<Vec<ProgramEntity>, sqlx::Error> {
        let sql = format!(
            r#"
            SELECT {PROGRAM_COLUMNS} FROM programs
            WHERE scope = 'global'
               OR (scope = 'therapistType' AND therapist_types && $2)
               OR (scope = 'private' AND owner_id = $1)
            ORDER BY created_at DESC
            "#
        );

        sqlx::query_as::<_, ProgramEntity>(&sql)
            .bind(owner_id)
            .bind(therapist_types)
            .fetch_all(&self.pool)
            .await
    }

    /// Updates a program. Returns the updated row if it exists.
    pub async fn update(
        &self,
        program_id: Uuid,
        program: &NewProgram,
    ) -> Result<Option<ProgramEntity>, sqlx::Error> {
        let sql = format!(
            r#"
            UPDATE programs
            SET title = $2, subtitle = $3, description = $4, task_template_ids = $5, icon = $6,
                color = $7, roles = $8, therapist_types = $9, is_published = $10,
                start_date = $11, end_date = $12, updated_at = NOW()
            WHERE id = $1
            RETURNING {PROGRAM_COLUMNS}
            "#
        );

        sqlx::query_as::<_, ProgramEntity>(&sql)
            .bind(program_id)
            .bind(&program.title)
            .bind(&program.subtitle)
            .bind(&program.description)
            .bind(&program.task_template_ids)
            .bind(&program.icon)
            .bind(&program.color)
            .bind(&program.roles)
            .bind(&program.therapist_types)
            .bind(program.is_published)
            .bind(program.start_date)
            .bind(program.end_date)
            .fetch_optional(&self.pool)
            .await
    }

    /// Deletes a program.
    ///
    /// Returns true if a row was deleted.
    pub async fn delete(&self, program_id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM programs WHERE id = $1")
            .bind(program_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
