//! Therapist invite routes.
//!
//! Admin endpoints manage the invite lifecycle; the claim endpoint converts
//! a pending code into the therapist role for the authenticated caller.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use domain::models::{
    ClaimInviteRequest, CreateInviteRequest, InvitePagination, InviteResponse, InviteStatus,
    InviteSummary, ListInvitesQuery, ListInvitesResponse, UpdateInviteRequest,
};
use persistence::repositories::InviteRepository;
use shared::validation::{normalize_email, normalize_type_list};
use tracing::info;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::UserAuth;
use crate::services::invite_claim::{ClaimError, ClaimService};

/// Maps claim workflow errors onto the API error taxonomy.
fn map_claim_error(e: ClaimError) -> ApiError {
    match e {
        ClaimError::EmptyCode => ApiError::InvalidArgument(ClaimError::EmptyCode.to_string()),
        ClaimError::UnknownCode => ApiError::NotFound(ClaimError::UnknownCode.to_string()),
        ClaimError::AlreadyUsed => {
            ApiError::FailedPrecondition(ClaimError::AlreadyUsed.to_string())
        }
        ClaimError::Revoked => ApiError::FailedPrecondition(ClaimError::Revoked.to_string()),
        ClaimError::EmailMismatch => {
            ApiError::PermissionDenied(ClaimError::EmailMismatch.to_string())
        }
        ClaimError::ProfileNotFound => {
            ApiError::NotFound(ClaimError::ProfileNotFound.to_string())
        }
        ClaimError::Database(db_err) => ApiError::from(db_err),
        ClaimError::Auth(e) => ApiError::Internal(format!("Auth error: {}", e)),
    }
}

/// POST /api/v1/invites/claim
///
/// Claim an invite code; on success the caller is promoted to therapist and
/// receives a fresh token pair carrying the new claims.
pub async fn claim_invite(
    State(state): State<AppState>,
    auth: UserAuth,
    Json(request): Json<ClaimInviteRequest>,
) -> Result<impl IntoResponse, ApiError> {
    request.validate()?;

    let service = ClaimService::new(state.pool.clone(), state.auth.clone());
    let response = service
        .claim(auth.user_id, &request)
        .await
        .map_err(map_claim_error)?;

    Ok(Json(response))
}

/// POST /api/v1/admin/invites
///
/// Create a new therapist invite. The code is generated server-side unless
/// an explicit override is supplied.
pub async fn create_invite(
    State(state): State<AppState>,
    auth: UserAuth,
    Json(request): Json<CreateInviteRequest>,
) -> Result<impl IntoResponse, ApiError> {
    auth.require_admin()?;
    request.validate()?;

    let therapist_types = normalize_type_list(&request.therapist_types);
    if therapist_types.is_empty() {
        return Err(ApiError::InvalidArgument(
            "At least one therapist type is required".to_string(),
        ));
    }

    let invites = InviteRepository::new(state.pool.clone());

    let code = match request.code.as_deref().map(str::trim) {
        Some(code) if !code.is_empty() => {
            if invites.find_by_code(code).await?.is_some() {
                return Err(ApiError::Conflict(
                    "An invite with this code already exists".to_string(),
                ));
            }
            code.to_string()
        }
        _ => invites.generate_unique_code().await?,
    };

    let email = request.email.as_deref().map(normalize_email);
    let entity = invites
        .create(
            &code,
            &therapist_types,
            email.as_deref(),
            request.license_valid_until,
            request.contract_reference.as_deref().map(str::trim),
            request.notes.as_deref().map(str::trim),
            auth.user_id,
        )
        .await?;

    info!(
        admin_id = %auth.user_id,
        invite_id = %entity.id,
        therapist_types = ?entity.therapist_types,
        "Created therapist invite"
    );

    Ok((
        StatusCode::CREATED,
        Json(InviteResponse::from(domain::models::TherapistInvite::from(
            entity,
        ))),
    ))
}

/// GET /api/v1/admin/invites
///
/// List invites with optional status filter and pagination.
pub async fn list_invites(
    State(state): State<AppState>,
    auth: UserAuth,
    Query(query): Query<ListInvitesQuery>,
) -> Result<impl IntoResponse, ApiError> {
    auth.require_admin()?;

    let invites = InviteRepository::new(state.pool.clone());

    let status = query.status_filter();
    let entities = invites
        .list(status, query.per_page(), query.offset())
        .await?;
    let total = invites.count(status).await?;
    let summary = invites.summary_counts().await?;

    let invites: Vec<InviteResponse> = entities
        .into_iter()
        .map(|entity| InviteResponse::from(domain::models::TherapistInvite::from(entity)))
        .collect();

    Ok(Json(ListInvitesResponse {
        invites,
        pagination: InvitePagination::new(query.page(), query.per_page(), total),
        summary: InviteSummary {
            pending: summary.pending,
            used: summary.used,
            revoked: summary.revoked,
        },
    }))
}

/// GET /api/v1/admin/invites/{id}
pub async fn get_invite(
    State(state): State<AppState>,
    auth: UserAuth,
    Path(invite_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    auth.require_admin()?;

    let invites = InviteRepository::new(state.pool.clone());

    let entity = invites
        .find_by_id(invite_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Invite not found".to_string()))?;

    Ok(Json(InviteResponse::from(
        domain::models::TherapistInvite::from(entity),
    )))
}

/// PATCH /api/v1/admin/invites/{id}
///
/// Update a pending or revoked invite. The status field accepts only
/// "pending" and "revoked": a used invite is immutable, and this is also
/// the explicit path for reopening a revoked code.
pub async fn update_invite(
    State(state): State<AppState>,
    auth: UserAuth,
    Path(invite_id): Path<Uuid>,
    Json(request): Json<UpdateInviteRequest>,
) -> Result<impl IntoResponse, ApiError> {
    auth.require_admin()?;
    request.validate()?;

    if request.status == Some(InviteStatus::Used) {
        return Err(ApiError::InvalidArgument(
            "Invites cannot be marked used by hand".to_string(),
        ));
    }

    let invites = InviteRepository::new(state.pool.clone());

    let existing = invites
        .find_by_id(invite_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Invite not found".to_string()))?;

    if existing.status == InviteStatus::Used {
        return Err(ApiError::FailedPrecondition(
            "Used invites cannot be edited".to_string(),
        ));
    }

    let therapist_types = request
        .therapist_types
        .as_deref()
        .map(normalize_type_list)
        .unwrap_or(existing.therapist_types);
    if therapist_types.is_empty() {
        return Err(ApiError::InvalidArgument(
            "At least one therapist type is required".to_string(),
        ));
    }

    let email = request
        .email
        .as_deref()
        .map(normalize_email)
        .or(existing.email);
    let license_valid_until = request.license_valid_until.or(existing.license_valid_until);
    let contract_reference = request
        .contract_reference
        .as_deref()
        .map(|s| s.trim().to_string())
        .or(existing.contract_reference);
    let notes = request
        .notes
        .as_deref()
        .map(|s| s.trim().to_string())
        .or(existing.notes);
    let status = request.status.unwrap_or(existing.status);

    let updated = invites
        .update(
            invite_id,
            status,
            &therapist_types,
            email.as_deref(),
            license_valid_until,
            contract_reference.as_deref(),
            notes.as_deref(),
        )
        .await?
        .ok_or_else(|| {
            // Claimed between the read and the guarded update.
            ApiError::FailedPrecondition("Used invites cannot be edited".to_string())
        })?;

    info!(
        admin_id = %auth.user_id,
        invite_id = %invite_id,
        status = %updated.status,
        "Updated therapist invite"
    );

    Ok(Json(InviteResponse::from(
        domain::models::TherapistInvite::from(updated),
    )))
}

/// POST /api/v1/admin/invites/{id}/revoke
///
/// Revoke a pending invite.
pub async fn revoke_invite(
    State(state): State<AppState>,
    auth: UserAuth,
    Path(invite_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    auth.require_admin()?;

    let invites = InviteRepository::new(state.pool.clone());

    let entity = invites
        .find_by_id(invite_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Invite not found".to_string()))?;

    if entity.status != InviteStatus::Pending {
        return Err(ApiError::FailedPrecondition(format!(
            "Only pending invites can be revoked (status: {})",
            entity.status
        )));
    }

    if !invites.revoke(invite_id).await? {
        // Claimed between the read and the guarded update.
        return Err(ApiError::FailedPrecondition(
            "Invite is no longer pending".to_string(),
        ));
    }

    info!(admin_id = %auth.user_id, invite_id = %invite_id, "Revoked therapist invite");

    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /api/v1/admin/invites/{id}
///
/// Delete a non-used invite.
pub async fn delete_invite(
    State(state): State<AppState>,
    auth: UserAuth,
    Path(invite_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    auth.require_admin()?;

    let invites = InviteRepository::new(state.pool.clone());

    let entity = invites
        .find_by_id(invite_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Invite not found".to_string()))?;

    if entity.status == InviteStatus::Used {
        return Err(ApiError::FailedPrecondition(
            "Used invites cannot be deleted".to_string(),
        ));
    }

    if !invites.delete(invite_id).await? {
        return Err(ApiError::NotFound("Invite not found".to_string()));
    }

    info!(admin_id = %auth.user_id, invite_id = %invite_id, "Deleted therapist invite");

    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_claim_error_kinds() {
        assert!(matches!(
            map_claim_error(ClaimError::EmptyCode),
            ApiError::InvalidArgument(_)
        ));
        assert!(matches!(
            map_claim_error(ClaimError::UnknownCode),
            ApiError::NotFound(_)
        ));
        assert!(matches!(
            map_claim_error(ClaimError::AlreadyUsed),
            ApiError::FailedPrecondition(_)
        ));
        assert!(matches!(
            map_claim_error(ClaimError::Revoked),
            ApiError::FailedPrecondition(_)
        ));
        assert!(matches!(
            map_claim_error(ClaimError::EmailMismatch),
            ApiError::PermissionDenied(_)
        ));
    }

    #[test]
    fn test_used_and_revoked_precondition_messages_differ() {
        let used = map_claim_error(ClaimError::AlreadyUsed);
        let revoked = map_claim_error(ClaimError::Revoked);
        match (used, revoked) {
            (ApiError::FailedPrecondition(a), ApiError::FailedPrecondition(b)) => {
                assert_ne!(a, b)
            }
            _ => panic!("Expected FailedPrecondition for both"),
        }
    }
}
