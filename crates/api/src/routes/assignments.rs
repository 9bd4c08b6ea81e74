//! Program assignment routes.
//!
//! Patients read and progress their own assignments; therapists and admins
//! can read and progress any.

use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use uuid::Uuid;
use validator::Validate;

use domain::models::{
    advance_streak, AssignmentResponse, ListAssignmentsQuery, Program, ProgramAssignment,
    UpdateProgressRequest, UserRole,
};
use persistence::repositories::{
    assignment::ProgressUpdate, AssignmentRepository, ProgramRepository,
};

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::UserAuth;

fn is_staff(auth: &UserAuth) -> bool {
    matches!(
        auth.role,
        Some(UserRole::Admin) | Some(UserRole::Therapist)
    )
}

/// GET /api/v1/assignments
///
/// List assignments. Patients are always scoped to their own; staff can
/// filter by any user.
pub async fn list_assignments(
    State(state): State<AppState>,
    auth: UserAuth,
    Query(query): Query<ListAssignmentsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let assignments = AssignmentRepository::new(state.pool.clone());

    let user_filter = if is_staff(&auth) {
        query.user_id
    } else {
        Some(auth.user_id)
    };

    let entities = assignments.list(user_filter, query.active).await?;

    let responses: Vec<AssignmentResponse> = entities
        .into_iter()
        .map(|entity| AssignmentResponse::from(ProgramAssignment::from(entity)))
        .collect();

    Ok(Json(responses))
}

/// GET /api/v1/assignments/{id}
pub async fn get_assignment(
    State(state): State<AppState>,
    auth: UserAuth,
    Path(assignment_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let assignments = AssignmentRepository::new(state.pool.clone());

    let entity = assignments
        .find_by_id(assignment_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Assignment not found".to_string()))?;

    if !is_staff(&auth) && entity.user_id != auth.user_id {
        return Err(ApiError::NotFound("Assignment not found".to_string()));
    }

    Ok(Json(AssignmentResponse::from(ProgramAssignment::from(
        entity,
    ))))
}

/// PATCH /api/v1/assignments/{id}/progress
///
/// Record progress. When the update completes a cadence unit the streak
/// advances at the owning program's cadence; reaching full progress stamps
/// the completion time.
pub async fn update_progress(
    State(state): State<AppState>,
    auth: UserAuth,
    Path(assignment_id): Path<Uuid>,
    Json(request): Json<UpdateProgressRequest>,
) -> Result<impl IntoResponse, ApiError> {
    request.validate()?;

    let assignments = AssignmentRepository::new(state.pool.clone());
    let programs = ProgramRepository::new(state.pool.clone());

    let entity = assignments
        .find_by_id(assignment_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Assignment not found".to_string()))?;

    if !is_staff(&auth) && entity.user_id != auth.user_id {
        return Err(ApiError::NotFound("Assignment not found".to_string()));
    }

    if !entity.is_active {
        return Err(ApiError::FailedPrecondition(
            "Assignment is no longer active".to_string(),
        ));
    }

    let program = Program::from(
        programs
            .find_by_id(entity.program_id)
            .await?
            .ok_or_else(|| ApiError::NotFound("Program not found".to_string()))?,
    );

    let now = Utc::now();
    let (streak_count, best_streak, last_completion_date) = if request.completed_unit {
        let update = advance_streak(
            entity.streak_count,
            entity.best_streak,
            entity.last_completion_date,
            now,
            program.program_type.cadence(),
        );
        (update.streak_count, update.best_streak, Some(now))
    } else {
        (
            entity.streak_count,
            entity.best_streak,
            entity.last_completion_date,
        )
    };

    // Completion is stamped once, when full progress is first reached.
    let completed_at = match entity.completed_at {
        Some(existing) => Some(existing),
        None if request.progress >= 1.0 => Some(now),
        None => None,
    };

    let updated = assignments
        .update_progress(
            assignment_id,
            &ProgressUpdate {
                progress: request.progress,
                current_task_index: request.current_task_index,
                streak_count,
                best_streak,
                last_completion_date,
                completed_at,
            },
        )
        .await?
        .ok_or_else(|| ApiError::NotFound("Assignment not found".to_string()))?;

    Ok(Json(AssignmentResponse::from(ProgramAssignment::from(
        updated,
    ))))
}

/// DELETE /api/v1/assignments/{id}
///
/// Deactivate an assignment (staff only).
pub async fn deactivate_assignment(
    State(state): State<AppState>,
    auth: UserAuth,
    Path(assignment_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    auth.require_therapist()?;

    let assignments = AssignmentRepository::new(state.pool.clone());

    if !assignments.deactivate(assignment_id).await? {
        return Err(ApiError::NotFound(
            "Active assignment not found".to_string(),
        ));
    }

    Ok(axum::http::StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn auth_with(role: Option<UserRole>) -> UserAuth {
        UserAuth {
            user_id: Uuid::new_v4(),
            role,
            therapist_types: vec![],
            jti: "jti".to_string(),
        }
    }

    #[test]
    fn test_is_staff() {
        assert!(is_staff(&auth_with(Some(UserRole::Admin))));
        assert!(is_staff(&auth_with(Some(UserRole::Therapist))));
        assert!(!is_staff(&auth_with(Some(UserRole::Patient))));
        assert!(!is_staff(&auth_with(None)));
    }
}
