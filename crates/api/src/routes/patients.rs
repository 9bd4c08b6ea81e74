//! Patient record routes (therapist-owned).

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use domain::models::{CreatePatientRequest, Patient, PatientResponse, UpdatePatientRequest};
use persistence::repositories::PatientRepository;
use tracing::info;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::UserAuth;

/// GET /api/v1/patients
///
/// List the caller's patient records.
pub async fn list_patients(
    State(state): State<AppState>,
    auth: UserAuth,
) -> Result<impl IntoResponse, ApiError> {
    auth.require_therapist()?;

    let patients = PatientRepository::new(state.pool.clone());

    let entities = patients.list_by_therapist(auth.user_id).await?;
    let responses: Vec<PatientResponse> = entities
        .into_iter()
        .map(|entity| PatientResponse::from(Patient::from(entity)))
        .collect();

    Ok(Json(responses))
}

/// GET /api/v1/patients/{id}
pub async fn get_patient(
    State(state): State<AppState>,
    auth: UserAuth,
    Path(patient_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    auth.require_therapist()?;

    let patients = PatientRepository::new(state.pool.clone());

    let entity = patients
        .find_by_id(patient_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Patient not found".to_string()))?;

    if entity.therapist_id != auth.user_id && !auth.is_admin() {
        return Err(ApiError::NotFound("Patient not found".to_string()));
    }

    Ok(Json(PatientResponse::from(Patient::from(entity))))
}

/// POST /api/v1/patients
pub async fn create_patient(
    State(state): State<AppState>,
    auth: UserAuth,
    Json(request): Json<CreatePatientRequest>,
) -> Result<impl IntoResponse, ApiError> {
    auth.require_therapist()?;
    request.validate()?;

    let patients = PatientRepository::new(state.pool.clone());

    let entity = patients
        .create(
            auth.user_id,
            request.firstname.trim(),
            request.lastname.trim(),
            request.diagnosis.as_deref().map(str::trim),
            request.next_appointment,
            request.image.as_deref(),
        )
        .await?;

    info!(therapist_id = %auth.user_id, patient_id = %entity.id, "Created patient record");

    Ok((
        StatusCode::CREATED,
        Json(PatientResponse::from(Patient::from(entity))),
    ))
}

/// PUT /api/v1/patients/{id}
pub async fn update_patient(
    State(state): State<AppState>,
    auth: UserAuth,
    Path(patient_id): Path<Uuid>,
    Json(request): Json<UpdatePatientRequest>,
) -> Result<impl IntoResponse, ApiError> {
    auth.require_therapist()?;
    request.validate()?;

    let patients = PatientRepository::new(state.pool.clone());

    let existing = patients
        .find_by_id(patient_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Patient not found".to_string()))?;

    if existing.therapist_id != auth.user_id && !auth.is_admin() {
        return Err(ApiError::NotFound("Patient not found".to_string()));
    }

    let updated = patients
        .update(
            patient_id,
            request
                .firstname
                .as_deref()
                .map(str::trim)
                .unwrap_or(&existing.firstname),
            request
                .lastname
                .as_deref()
                .map(str::trim)
                .unwrap_or(&existing.lastname),
            request
                .diagnosis
                .as_deref()
                .map(str::trim)
                .or(existing.diagnosis.as_deref()),
            request.next_appointment.or(existing.next_appointment),
            request.image.as_deref().or(existing.image.as_deref()),
        )
        .await?
        .ok_or_else(|| ApiError::NotFound("Patient not found".to_string()))?;

    Ok(Json(PatientResponse::from(Patient::from(updated))))
}

/// DELETE /api/v1/patients/{id}
pub async fn delete_patient(
    State(state): State<AppState>,
    auth: UserAuth,
    Path(patient_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    auth.require_therapist()?;

    let patients = PatientRepository::new(state.pool.clone());

    let existing = patients
        .find_by_id(patient_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Patient not found".to_string()))?;

    if existing.therapist_id != auth.user_id && !auth.is_admin() {
        return Err(ApiError::NotFound("Patient not found".to_string()));
    }

    patients.delete(patient_id).await?;

    info!(therapist_id = %auth.user_id, patient_id = %patient_id, "Deleted patient record");

    Ok(StatusCode::NO_CONTENT)
}
