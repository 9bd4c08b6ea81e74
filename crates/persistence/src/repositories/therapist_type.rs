//! Repository for the therapist type catalogue.

use sqlx::PgPool;

use crate::entities::TherapistTypeEntity;

/// Repository for therapist type operations.
#[derive(Clone)]
pub struct TherapistTypeRepository {
    pool: PgPool,
}

impl TherapistTypeRepository {
    /// Creates a new therapist type repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Lists all therapist types, ordered by name.
    pub async fn list(&self) -> Result<Vec<TherapistTypeEntity>, sqlx::Error> {
        sqlx::query_as::<_, TherapistTypeEntity>(
            "SELECT id, name FROM therapist_types ORDER BY name ASC",
        )
        .fetch_all(&self.pool)
        .await
    }

    /// Finds a therapist type by its slug.
    pub async fn find_by_id(&self, id: &str) -> Result<Option<TherapistTypeEntity>, sqlx::Error> {
        sqlx::query_as::<_, TherapistTypeEntity>(
            "SELECT id, name FROM therapist_types WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
    }

    /// Inserts a therapist type.
    pub async fn create(&self, id: &str, name: &str) -> Result<TherapistTypeEntity, sqlx::Error> {
        sqlx::query_as::<_, TherapistTypeEntity>(
            r#"
            INSERT INTO therapist_types (id, name)
            VALUES ($1, $2)
            RETURNING id, name
            "#,
        )
        .bind(id)
        .bind(name)
        .fetch_one(&self.pool)
        .await
    }

    /// Deletes a therapist type.
    ///
    /// Returns true if a row was deleted.
    pub async fn delete(&self, id: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM therapist_types WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
