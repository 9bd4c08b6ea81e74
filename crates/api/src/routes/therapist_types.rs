//! Therapist type catalogue routes (admin).

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use validator::Validate;

use domain::models::{CreateTherapistTypeRequest, TherapistType};
use persistence::repositories::TherapistTypeRepository;
use tracing::info;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::UserAuth;

/// GET /api/v1/admin/therapist-types
///
/// Readable by any authenticated caller; the catalogue feeds template
/// scoping pickers in every role's UI.
pub async fn list_therapist_types(
    State(state): State<AppState>,
    _auth: UserAuth,
) -> Result<impl IntoResponse, ApiError> {
    let types = TherapistTypeRepository::new(state.pool.clone());

    let entities = types.list().await?;
    let types: Vec<TherapistType> = entities.into_iter().map(Into::into).collect();

    Ok(Json(types))
}

/// POST /api/v1/admin/therapist-types
pub async fn create_therapist_type(
    State(state): State<AppState>,
    auth: UserAuth,
    Json(request): Json<CreateTherapistTypeRequest>,
) -> Result<impl IntoResponse, ApiError> {
    auth.require_admin()?;
    request.validate()?;

    let types = TherapistTypeRepository::new(state.pool.clone());

    if types.find_by_id(&request.id).await?.is_some() {
        return Err(ApiError::Conflict(format!(
            "Therapist type '{}' already exists",
            request.id
        )));
    }

    let entity = types.create(&request.id, request.name.trim()).await?;

    info!(admin_id = %auth.user_id, type_id = %entity.id, "Created therapist type");

    Ok((StatusCode::CREATED, Json(TherapistType::from(entity))))
}

/// DELETE /api/v1/admin/therapist-types/{id}
pub async fn delete_therapist_type(
    State(state): State<AppState>,
    auth: UserAuth,
    Path(type_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    auth.require_admin()?;

    let types = TherapistTypeRepository::new(state.pool.clone());

    if !types.delete(&type_id).await? {
        return Err(ApiError::NotFound("Therapist type not found".to_string()));
    }

    info!(admin_id = %auth.user_id, type_id = %type_id, "Deleted therapist type");

    Ok(StatusCode::NO_CONTENT)
}
