//! Program routes.
//!
//! Therapists build programs from task templates and assign them to
//! patient users. Scope visibility matches task templates.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use domain::models::{
    AssignProgramRequest, AssignmentResponse, CreateProgramRequest, ListProgramsQuery, Program,
    ProgramResponse, TemplateScope, UpdateProgramRequest, UserRole,
};
use persistence::repositories::{
    program::NewProgram, AssignmentRepository, ProgramRepository, TaskTemplateRepository,
    UserRepository,
};
use tracing::info;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::UserAuth;

fn can_view(auth: &UserAuth, program: &Program) -> bool {
    if auth.is_admin() {
        return true;
    }
    match program.scope {
        TemplateScope::Global => true,
        TemplateScope::TherapistType => program
            .therapist_types
            .iter()
            .any(|t| auth.therapist_types.contains(t)),
        TemplateScope::Private => program.owner_id == auth.user_id,
    }
}

fn can_modify(auth: &UserAuth, program: &Program) -> bool {
    auth.is_admin() || program.owner_id == auth.user_id
}

/// GET /api/v1/programs
pub async fn list_programs(
    State(state): State<AppState>,
    auth: UserAuth,
    Query(query): Query<ListProgramsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    auth.require_therapist()?;

    let programs = ProgramRepository::new(state.pool.clone());

    let entities = if auth.is_admin() {
        programs.list_all().await?
    } else {
        programs
            .list_visible(auth.user_id, &auth.therapist_types)
            .await?
    };

    let responses: Vec<ProgramResponse> = entities
        .into_iter()
        .map(Program::from)
        .filter(|program| {
            query
                .published
                .map_or(true, |published| program.is_published == published)
        })
        .map(ProgramResponse::from)
        .collect();

    Ok(Json(responses))
}

/// GET /api/v1/programs/{id}
pub async fn get_program(
    State(state): State<AppState>,
    auth: UserAuth,
    Path(program_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    auth.require_therapist()?;

    let programs = ProgramRepository::new(state.pool.clone());

    let entity = programs
        .find_by_id(program_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Program not found".to_string()))?;

    let program = Program::from(entity);
    if !can_view(&auth, &program) {
        return Err(ApiError::NotFound("Program not found".to_string()));
    }

    Ok(Json(ProgramResponse::from(program)))
}

/// POST /api/v1/programs
pub async fn create_program(
    State(state): State<AppState>,
    auth: UserAuth,
    Json(request): Json<CreateProgramRequest>,
) -> Result<impl IntoResponse, ApiError> {
    auth.require_therapist()?;
    request.validate()?;
    request.validate_dates().map_err(ApiError::InvalidArgument)?;

    if !auth.is_admin() && request.scope != TemplateScope::Private {
        return Err(ApiError::PermissionDenied(
            "Only admins can create shared programs".to_string(),
        ));
    }

    // Every referenced task template must exist.
    let templates = TaskTemplateRepository::new(state.pool.clone());
    if !templates.all_exist(&request.task_template_ids).await? {
        return Err(ApiError::InvalidArgument(
            "Unknown task template in program".to_string(),
        ));
    }

    let programs = ProgramRepository::new(state.pool.clone());

    let new_program = NewProgram {
        title: request.title.trim().to_string(),
        subtitle: request.subtitle.trim().to_string(),
        description: request.description.trim().to_string(),
        program_type: request.program_type.as_str().to_string(),
        task_template_ids: request.task_template_ids.clone(),
        icon: request.icon.clone(),
        color: request.color.clone(),
        owner_id: auth.user_id,
        roles: request.roles.clone(),
        therapist_types: request.therapist_types.clone(),
        scope: request.scope.as_str().to_string(),
        is_published: request.is_published,
        start_date: request.start_date,
        end_date: request.end_date,
    };

    let entity = programs.create(&new_program).await?;

    info!(
        user_id = %auth.user_id,
        program_id = %entity.id,
        program_type = %entity.program_type,
        "Created program"
    );

    Ok((
        StatusCode::CREATED,
        Json(ProgramResponse::from(Program::from(entity))),
    ))
}

/// PUT /api/v1/programs/{id}
pub async fn update_program(
    State(state): State<AppState>,
    auth: UserAuth,
    Path(program_id): Path<Uuid>,
    Json(request): Json<UpdateProgramRequest>,
) -> Result<impl IntoResponse, ApiError> {
    auth.require_therapist()?;
    request.validate()?;

    let programs = ProgramRepository::new(state.pool.clone());

    let existing = Program::from(
        programs
            .find_by_id(program_id)
            .await?
            .ok_or_else(|| ApiError::NotFound("Program not found".to_string()))?,
    );

    if !can_modify(&auth, &existing) {
        return Err(ApiError::PermissionDenied(
            "Only the owner or an admin can edit this program".to_string(),
        ));
    }

    if let Some(task_template_ids) = &request.task_template_ids {
        if task_template_ids.is_empty() {
            return Err(ApiError::InvalidArgument(
                "A program needs at least one task".to_string(),
            ));
        }
        let templates = TaskTemplateRepository::new(state.pool.clone());
        if !templates.all_exist(task_template_ids).await? {
            return Err(ApiError::InvalidArgument(
                "Unknown task template in program".to_string(),
            ));
        }
    }

    let merged = NewProgram {
        title: request
            .title
            .as_deref()
            .map(|s| s.trim().to_string())
            .unwrap_or(existing.title),
        subtitle: request.subtitle.unwrap_or(existing.subtitle),
        description: request.description.unwrap_or(existing.description),
        program_type: existing.program_type.as_str().to_string(),
        task_template_ids: request
            .task_template_ids
            .unwrap_or(existing.task_template_ids),
        icon: request.icon.unwrap_or(existing.icon),
        color: request.color.unwrap_or(existing.color),
        owner_id: existing.owner_id,
        roles: request.roles.unwrap_or(existing.roles),
        therapist_types: request.therapist_types.unwrap_or(existing.therapist_types),
        scope: existing.scope.as_str().to_string(),
        is_published: request.is_published.unwrap_or(existing.is_published),
        start_date: request.start_date.or(existing.start_date),
        end_date: request.end_date.or(existing.end_date),
    };

    let updated = programs
        .update(program_id, &merged)
        .await?
        .ok_or_else(|| ApiError::NotFound("Program not found".to_string()))?;

    Ok(Json(ProgramResponse::from(Program::from(updated))))
}

/// DELETE /api/v1/programs/{id}
///
/// Deleting a program with active assignments is rejected.
pub async fn delete_program(
    State(state): State<AppState>,
    auth: UserAuth,
    Path(program_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    auth.require_therapist()?;

    let programs = ProgramRepository::new(state.pool.clone());
    let assignments = AssignmentRepository::new(state.pool.clone());

    let program = Program::from(
        programs
            .find_by_id(program_id)
            .await?
            .ok_or_else(|| ApiError::NotFound("Program not found".to_string()))?,
    );

    if !can_modify(&auth, &program) {
        return Err(ApiError::PermissionDenied(
            "Only the owner or an admin can delete this program".to_string(),
        ));
    }

    let active = assignments.count_active_for_program(program_id).await?;
    if active > 0 {
        return Err(ApiError::FailedPrecondition(format!(
            "Program has {} active assignment(s)",
            active
        )));
    }

    programs.delete(program_id).await?;

    info!(user_id = %auth.user_id, program_id = %program_id, "Deleted program");

    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/programs/{id}/assignments
///
/// Assign a program to a patient user.
pub async fn assign_program(
    State(state): State<AppState>,
    auth: UserAuth,
    Path(program_id): Path<Uuid>,
    Json(request): Json<AssignProgramRequest>,
) -> Result<impl IntoResponse, ApiError> {
    auth.require_therapist()?;
    request.validate()?;

    let programs = ProgramRepository::new(state.pool.clone());
    let assignments = AssignmentRepository::new(state.pool.clone());
    let users = UserRepository::new(state.pool.clone());

    let program = Program::from(
        programs
            .find_by_id(program_id)
            .await?
            .ok_or_else(|| ApiError::NotFound("Program not found".to_string()))?,
    );

    if !can_view(&auth, &program) {
        return Err(ApiError::NotFound("Program not found".to_string()));
    }

    let target = users
        .find_by_id(request.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    // Programs are assigned to patient accounts; unset roles count as
    // patients until the default grant runs.
    if matches!(target.role, Some(UserRole::Admin) | Some(UserRole::Therapist)) {
        return Err(ApiError::InvalidArgument(
            "Programs can only be assigned to patients".to_string(),
        ));
    }

    if assignments.has_active(program_id, request.user_id).await? {
        return Err(ApiError::Conflict(
            "User already has an active assignment of this program".to_string(),
        ));
    }

    let entity = assignments.create(program_id, request.user_id).await?;

    info!(
        user_id = %auth.user_id,
        program_id = %program_id,
        patient_id = %request.user_id,
        "Assigned program"
    );

    Ok((
        StatusCode::CREATED,
        Json(AssignmentResponse::from(
            domain::models::ProgramAssignment::from(entity),
        )),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use domain::models::ProgramType;

    fn auth_with(role: UserRole, types: Vec<&str>) -> UserAuth {
        UserAuth {
            user_id: Uuid::new_v4(),
            role: Some(role),
            therapist_types: types.into_iter().map(String::from).collect(),
            jti: "jti".to_string(),
        }
    }

    fn program(scope: TemplateScope, owner_id: Uuid, types: Vec<&str>) -> Program {
        Program {
            id: Uuid::new_v4(),
            title: "p".to_string(),
            subtitle: "".to_string(),
            description: "".to_string(),
            program_type: ProgramType::Challenge,
            task_template_ids: vec![Uuid::new_v4()],
            icon: "i".to_string(),
            color: "#000000".to_string(),
            owner_id,
            roles: vec![],
            therapist_types: types.into_iter().map(String::from).collect(),
            scope,
            is_published: true,
            start_date: None,
            end_date: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_program_visibility_matches_template_rules() {
        let auth = auth_with(UserRole::Therapist, vec!["logopaedie"]);
        assert!(can_view(&auth, &program(TemplateScope::Global, Uuid::new_v4(), vec![])));
        assert!(can_view(
            &auth,
            &program(TemplateScope::TherapistType, Uuid::new_v4(), vec!["logopaedie"])
        ));
        assert!(!can_view(
            &auth,
            &program(TemplateScope::TherapistType, Uuid::new_v4(), vec!["physiotherapie"])
        ));
        assert!(!can_view(
            &auth,
            &program(TemplateScope::Private, Uuid::new_v4(), vec![])
        ));
        assert!(can_view(
            &auth,
            &program(TemplateScope::Private, auth.user_id, vec![])
        ));
    }

    #[test]
    fn test_program_modify_rights() {
        let auth = auth_with(UserRole::Therapist, vec![]);
        assert!(can_modify(&auth, &program(TemplateScope::Private, auth.user_id, vec![])));
        assert!(!can_modify(
            &auth,
            &program(TemplateScope::Global, Uuid::new_v4(), vec![])
        ));

        let admin = auth_with(UserRole::Admin, vec![]);
        assert!(can_modify(
            &admin,
            &program(TemplateScope::Private, Uuid::new_v4(), vec![])
        ));
    }
}
