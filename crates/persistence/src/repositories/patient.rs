//! Repository for patient record database operations.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::PatientEntity;

const PATIENT_COLUMNS: &str = r#"id, therapist_id, firstname, lastname, diagnosis,
                   next_appointment, image, created_at, updated_at"#;

/// Repository for patient record operations.
#[derive(Clone)]
pub struct PatientRepository {
    pool: PgPool,
}

impl PatientRepository {
    /// Creates a new patient repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Inserts a patient record.
    #[allow(clippy::too_many_arguments)]
    pub async fn create(
        &self,
        therapist_id: Uuid,
        firstname: &str,
        lastname: &str,
        diagnosis: Option<&str>,
        next_appointment: Option<DateTime<Utc>>,
        image: Option<&str>,
    ) -> Result<PatientEntity, sqlx::Error> {
        let sql = format!(
            r#"
            INSERT INTO patients
                (id, therapist_id, firstname, lastname, diagnosis, next_appointment, image)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {PATIENT_COLUMNS}
            "#
        );

        sqlx::query_as::<_, PatientEntity>(&sql)
            .bind(Uuid::new_v4())
            .bind(therapist_id)
            .bind(firstname)
            .bind(lastname)
            .bind(diagnosis)
            .bind(next_appointment)
            .bind(image)
            .fetch_one(&self.pool)
            .await
    }

    /// Finds a patient by ID.
    pub async fn find_by_id(
        &self,
        patient_id: Uuid,
    ) -> Result<Option<PatientEntity>, sqlx::Error> {
        let sql = format!("SELECT {PATIENT_COLUMNS} FROM patients WHERE id = $1");

        sqlx::query_as::<_, PatientEntity>(&sql)
            .bind(patient_id)
            .fetch_optional(&self.pool)
            .await
    }

    /// Lists a therapist's patients, by last name.
    pub async fn list_by_therapist(
        &self,
        therapist_id: Uuid,
    ) -> Result<Vec<PatientEntity>, sqlx::Error> {
        let sql = format!(
            r#"
            SELECT {PATIENT_COLUMNS} FROM patients
            WHERE therapist_id = $1
            ORDER BY lastname ASC, firstname ASC
            "#
        );

        sqlx::query_as::<_, PatientEntity>(&sql)
            .bind(therapist_id)
            .fetch_all(&self.pool)
            .await
    }

    /// Updates a patient record. Returns the updated row if it exists.
    #[allow(clippy::too_many_arguments)]
    pub async fn update(
        &self,
        patient_id: Uuid,
        firstname: &str,
        lastname: &str,
        diagnosis: Option<&str>,
        next_appointment: Option<DateTime<Utc>>,
        image: Option<&str>,
    ) -> Result<Option<PatientEntity>, sqlx::Error> {
        let sql = format!(
            r#"
            UPDATE patients
            SET firstname = $2, lastname = $3, diagnosis = $4, next_appointment = $5,
                image = $6, updated_at = NOW()
            WHERE id = $1
            RETURNING {PATIENT_COLUMNS}
            "#
        );

        sqlx::query_as::<_, PatientEntity>(&sql)
            .bind(patient_id)
            .bind(firstname)
            .bind(lastname)
            .bind(diagnosis)
            .bind(next_appointment)
            .bind(image)
            .fetch_optional(&self.pool)
            .await
    }

    /// Deletes a patient record.
    ///
    /// Returns true if a row was deleted.
    pub async fn delete(&self, patient_id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM patients WHERE id = $1")
            .bind(patient_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
