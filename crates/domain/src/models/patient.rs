//! Patient record domain models.
//!
//! Patient records are owned by the therapist who created them and are
//! separate from patient login accounts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// A patient record managed by a therapist.
#[derive(Debug, Clone)]
pub struct Patient {
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

/// Request to create a patient record.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreatePatientRequest {
    #[validate(length(min = 1, max = 100, message = "First name must be 1-100 characters"))]
    pub firstname: String,

    #[validate(length(min = 1, max = 100, message = "Last name must be 1-100 characters"))]
    pub lastname: String,

    #[validate(length(max = 500, message = "Diagnosis must be at most 500 characters"))]
    pub diagnosis: Option<String>,

    pub next_appointment: Option<DateTime<Utc>>,

    #[validate(url(message = "Image must be a valid URL"))]
    pub image: Option<String>,
}

/// Request to update a patient record. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePatientRequest {
    #[validate(length(min = 1, max = 100, message = "First name must be 1-100 characters"))]
    pub firstname: Option<String>,

    #[validate(length(min = 1, max = 100, message = "Last name must be 1-100 characters"))]
    pub lastname: Option<String>,

    #[validate(length(max = 500, message = "Diagnosis must be at most 500 characters"))]
    pub diagnosis: Option<String>,

    pub next_appointment: Option<DateTime<Utc>>,

    #[validate(url(message = "Image must be a valid URL"))]
    pub image: Option<String>,
}

/// Patient as returned by the API.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientResponse {
    pub id: Uuid,
    pub therapist_id: Uuid,
    pub firstname: String,
    pub lastname: String,
    pub full_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diagnosis: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_appointment: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Patient> for PatientResponse {
    fn from(patient: Patient) -> Self {
        let full_name = format!("{} {}", patient.firstname, patient.lastname)
            .trim()
            .to_string();
        Self {
            id: patient.id,
            therapist_id: patient.therapist_id,
            firstname: patient.firstname,
            lastname: patient.lastname,
            full_name,
            diagnosis: patient.diagnosis,
            next_appointment: patient.next_appointment,
            image: patient.image,
            created_at: patient.created_at,
            updated_at: patient.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_patient_request_validation() {
        let valid = CreatePatientRequest {
            firstname: "Anna".to_string(),
            lastname: "Schmidt".to_string(),
            diagnosis: Some("Lumbago".to_string()),
            next_appointment: None,
            image: None,
        };
        assert!(valid.validate().is_ok());
    }

    #[test]
    fn test_create_patient_empty_name_rejected() {
        let invalid = CreatePatientRequest {
            firstname: "".to_string(),
            lastname: "Schmidt".to_string(),
            diagnosis: None,
            next_appointment: None,
            image: None,
        };
        assert!(invalid.validate().is_err());
    }

    #[test]
    fn test_create_patient_invalid_image_url() {
        let invalid = CreatePatientRequest {
            firstname: "Anna".to_string(),
            lastname: "Schmidt".to_string(),
            diagnosis: None,
            next_appointment: None,
            image: Some("not a url".to_string()),
        };
        assert!(invalid.validate().is_err());
    }

    #[test]
    fn test_patient_response_full_name() {
        let patient = Patient {
            id: Uuid::new_v4(),
            therapist_id: Uuid::new_v4(),
            firstname: "Anna".to_string(),
            lastname: "Schmidt".to_string(),
            diagnosis: None,
            next_appointment: None,
            image: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let response = PatientResponse::from(patient);
        assert_eq!(response.full_name, "Anna Schmidt");
    }
}
