//! Repository for task template database operations.

use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::TaskTemplateEntity;

const TEMPLATE_COLUMNS: &str = r#"id, title, task_type, icon, description, visibility, config,
                   evidence_config, roles, therapist_types, scope, owner_id, is_published,
                   created_at, updated_at"#;

/// Insert payload for a task template.
#[derive(Debug, Clone)]
pub struct NewTaskTemplate {
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
}

/// Repository for task template operations.
#[derive(Clone)]
pub struct TaskTemplateRepository {
    pool: PgPool,
}

impl TaskTemplateRepository {
    /// Creates a new task template repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Inserts a template.
    pub async fn create(
        &self,
        template: &NewTaskTemplate,
    ) -> Result<TaskTemplateEntity, sqlx::Error> {
        let sql = format!(
            r#"
            INSERT INTO task_templates
                (id, title, task_type, icon, description, visibility, config, evidence_config,
                 roles, therapist_types, scope, owner_id, is_published)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            RETURNING {TEMPLATE_COLUMNS}
            "#
        );

        sqlx::query_as::<_, TaskTemplateEntity>(&sql)
            .bind(Uuid::new_v4())
            .bind(&template.title)
            .bind(&template.task_type)
            .bind(&template.icon)
            .bind(&template.description)
            .bind(&template.visibility)
            .bind(&template.config)
            .bind(&template.evidence_config)
            .bind(&template.roles)
            .bind(&template.therapist_types)
            .bind(&template.scope)
            .bind(template.owner_id)
            .bind(template.is_published)
            .fetch_one(&self.pool)
            .await
    }

    /// Finds a template by ID.
    pub async fn find_by_id(
        &self,
        template_id: Uuid,
    ) -> Result<Option<TaskTemplateEntity>, sqlx::Error> {
        let sql = format!("SELECT {TEMPLATE_COLUMNS} FROM task_templates WHERE id = $1");

        sqlx::query_as::<_, TaskTemplateEntity>(&sql)
            .bind(template_id)
            .fetch_optional(&self.pool)
            .await
    }

    /// Lists every template (admin view), newest first.
    pub async fn list_all(&self) -> Result<Vec<TaskTemplateEntity>, sqlx::Error> {
        let sql = format!(
            "SELECT {TEMPLATE_COLUMNS} FROM task_templates ORDER BY created_at DESC"
        );

        sqlx::query_as::<_, TaskTemplateEntity>(&sql)
            .fetch_all(&self.pool)
            .await
    }

    /// Lists templates visible to a therapist: global templates, templates
    /// scoped to one of the given therapist types, and the caller's own
    /// private templates.
    pub async fn list_visible(
        &self,
        owner_id: Uuid,
        therapist_types: &[String],
    ) -> Result<Vec<TaskTemplateEntity>, sqlx::Error> {
        let sql = format!(
            r#"
            SELECT {TEMPLATE_COLUMNS} FROM task_templates
            WHERE scope = 'global'
               OR (scope = 'therapistType' AND therapist_types && $2)
               OR (scope = 'private' AND owner_id = $1)
            ORDER BY created_at DESC
            "#
        );

        sqlx::query_as::<_, TaskTemplateEntity>(&sql)
            .bind(owner_id)
            .bind(therapist_types)
            .fetch_all(&self.pool)
            .await
    }

    /// Updates a template. Returns the updated row if it exists.
    pub async fn update(
        &self,
        template_id: Uuid,
        template: &NewTaskTemplate,
    ) -> Result<Option<TaskTemplateEntity>, sqlx::Error> {
        let sql = format!(
            r#"
            UPDATE task_templates
            SET title = $2, icon = $3, description = $4, visibility = $5, config = $6,
                evidence_config = $7, roles = $8, therapist_types = $9, is_published = $10,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {TEMPLATE_COLUMNS}
            "#
        );

        sqlx::query_as::<_, TaskTemplateEntity>(&sql)
            .bind(template_id)
            .bind(&template.title)
            .bind(&template.icon)
            .bind(&template.description)
            .bind(&template.visibility)
            .bind(&template.config)
            .bind(&template.evidence_config)
            .bind(&template.roles)
            .bind(&template.therapist_types)
            .bind(template.is_published)
            .fetch_optional(&self.pool)
            .await
    }

    /// Deletes a template.
    ///
    /// Returns true if a row was deleted.
    pub async fn delete(&self, template_id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM task_templates WHERE id = $1")
            .bind(template_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Checks that every given template id exists.
    pub async fn all_exist(&self, template_ids: &[Uuid]) -> Result<bool, sqlx::Error> {
        if template_ids.is_empty() {
            return Ok(true);
        }

        let result: (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM task_templates WHERE id = ANY($1)")
                .bind(template_ids)
                .fetch_one(&self.pool)
                .await?;

        Ok(result.0 == template_ids.len() as i64)
    }
}
