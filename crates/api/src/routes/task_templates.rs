//! Task template routes.
//!
//! Admins manage global and type-scoped templates; therapists manage their
//! own private templates and see global templates plus those scoped to one
//! of their therapist types.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use domain::models::{
    CreateTaskTemplateRequest, ListTaskTemplatesQuery, TaskTemplate, TaskTemplateResponse,
    TemplateScope, UpdateTaskTemplateRequest,
};
use persistence::repositories::{task_template::NewTaskTemplate, TaskTemplateRepository};
use tracing::info;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::UserAuth;

/// Whether the caller may see a template.
fn can_view(auth: &UserAuth, template: &TaskTemplate) -> bool {
    if auth.is_admin() {
        return true;
    }
    match template.scope {
        TemplateScope::Global => true,
        TemplateScope::TherapistType => template
            .therapist_types
            .iter()
            .any(|t| auth.therapist_types.contains(t)),
        TemplateScope::Private => template.owner_id == Some(auth.user_id),
    }
}

/// Whether the caller may modify a template.
fn can_modify(auth: &UserAuth, template: &TaskTemplate) -> bool {
    auth.is_admin() || template.owner_id == Some(auth.user_id)
}

fn to_json(value: &impl serde::Serialize) -> Result<serde_json::Value, ApiError> {
    serde_json::to_value(value).map_err(|e| ApiError::Internal(e.to_string()))
}

/// GET /api/v1/task-templates
pub async fn list_task_templates(
    State(state): State<AppState>,
    auth: UserAuth,
    Query(query): Query<ListTaskTemplatesQuery>,
) -> Result<impl IntoResponse, ApiError> {
    auth.require_therapist()?;

    let templates = TaskTemplateRepository::new(state.pool.clone());

    let entities = if auth.is_admin() {
        templates.list_all().await?
    } else {
        templates
            .list_visible(auth.user_id, &auth.therapist_types)
            .await?
    };

    let responses: Vec<TaskTemplateResponse> = entities
        .into_iter()
        .map(|entity| TaskTemplate::from(entity))
        .filter(|template| {
            query
                .published
                .map_or(true, |published| template.is_published == published)
        })
        .filter(|template| {
            query
                .task_type
                .as_deref()
                .map_or(true, |tag| template.task_type.as_str() == tag)
        })
        .map(TaskTemplateResponse::from)
        .collect();

    Ok(Json(responses))
}

/// GET /api/v1/task-templates/{id}
pub async fn get_task_template(
    State(state): State<AppState>,
    auth: UserAuth,
    Path(template_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    auth.require_therapist()?;

    let templates = TaskTemplateRepository::new(state.pool.clone());

    let entity = templates
        .find_by_id(template_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task template not found".to_string()))?;

    let template = TaskTemplate::from(entity);
    if !can_view(&auth, &template) {
        // Hidden rather than forbidden, like any other missing resource.
        return Err(ApiError::NotFound("Task template not found".to_string()));
    }

    Ok(Json(TaskTemplateResponse::from(template)))
}

/// POST /api/v1/task-templates
pub async fn create_task_template(
    State(state): State<AppState>,
    auth: UserAuth,
    Json(request): Json<CreateTaskTemplateRequest>,
) -> Result<impl IntoResponse, ApiError> {
    auth.require_therapist()?;
    request.validate()?;
    request
        .validate_config()
        .map_err(ApiError::InvalidArgument)?;

    // Only admins publish shared templates; therapists keep them private.
    if !auth.is_admin() && request.scope != TemplateScope::Private {
        return Err(ApiError::PermissionDenied(
            "Only admins can create shared templates".to_string(),
        ));
    }

    let templates = TaskTemplateRepository::new(state.pool.clone());

    let new_template = NewTaskTemplate {
        title: request.title.trim().to_string(),
        task_type: request.task_type.as_str().to_string(),
        icon: request.icon.clone(),
        description: request.description.clone(),
        visibility: request.visibility.as_str().to_string(),
        config: request.config.as_ref().map(to_json).transpose()?,
        evidence_config: request.evidence_config.as_ref().map(to_json).transpose()?,
        roles: request.roles.clone(),
        therapist_types: request.therapist_types.clone(),
        scope: request.scope.as_str().to_string(),
        owner_id: Some(auth.user_id),
        is_published: request.is_published,
    };

    let entity = templates.create(&new_template).await?;

    info!(
        user_id = %auth.user_id,
        template_id = %entity.id,
        task_type = %entity.task_type,
        "Created task template"
    );

    Ok((
        StatusCode::CREATED,
        Json(TaskTemplateResponse::from(TaskTemplate::from(entity))),
    ))
}

/// PUT /api/v1/task-templates/{id}
pub async fn update_task_template(
    State(state): State<AppState>,
    auth: UserAuth,
    Path(template_id): Path<Uuid>,
    Json(request): Json<UpdateTaskTemplateRequest>,
) -> Result<impl IntoResponse, ApiError> {
    auth.require_therapist()?;
    request.validate()?;

    let templates = TaskTemplateRepository::new(state.pool.clone());

    let entity = templates
        .find_by_id(template_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task template not found".to_string()))?;

    let existing = TaskTemplate::from(entity.clone());
    if !can_modify(&auth, &existing) {
        return Err(ApiError::PermissionDenied(
            "Only the owner or an admin can edit this template".to_string(),
        ));
    }

    // The config tag has to keep matching the template's task type.
    if let Some(config) = &request.config {
        if config.task_type() != existing.task_type {
            return Err(ApiError::InvalidArgument(format!(
                "Config tag {} does not match task type {}",
                config.task_type(),
                existing.task_type
            )));
        }
        config.validate().map_err(ApiError::InvalidArgument)?;
    }
    if let Some(evidence) = &request.evidence_config {
        evidence.validate().map_err(ApiError::InvalidArgument)?;
    }

    let merged = NewTaskTemplate {
        title: request
            .title
            .as_deref()
            .map(|s| s.trim().to_string())
            .unwrap_or(existing.title),
        task_type: existing.task_type.as_str().to_string(),
        icon: request.icon.unwrap_or(existing.icon),
        description: request.description.or(existing.description),
        visibility: request
            .visibility
            .unwrap_or(existing.visibility)
            .as_str()
            .to_string(),
        config: match &request.config {
            Some(config) => Some(to_json(config)?),
            None => entity.config,
        },
        evidence_config: match &request.evidence_config {
            Some(evidence) => Some(to_json(evidence)?),
            None => entity.evidence_config,
        },
        roles: request.roles.unwrap_or(existing.roles),
        therapist_types: request.therapist_types.unwrap_or(existing.therapist_types),
        scope: existing.scope.as_str().to_string(),
        owner_id: existing.owner_id,
        is_published: request.is_published.unwrap_or(existing.is_published),
    };

    let updated = templates
        .update(template_id, &merged)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task template not found".to_string()))?;

    Ok(Json(TaskTemplateResponse::from(TaskTemplate::from(updated))))
}

/// DELETE /api/v1/task-templates/{id}
pub async fn delete_task_template(
    State(state): State<AppState>,
    auth: UserAuth,
    Path(template_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    auth.require_therapist()?;

    let templates = TaskTemplateRepository::new(state.pool.clone());

    let entity = templates
        .find_by_id(template_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task template not found".to_string()))?;

    let template = TaskTemplate::from(entity);
    if !can_modify(&auth, &template) {
        return Err(ApiError::PermissionDenied(
            "Only the owner or an admin can delete this template".to_string(),
        ));
    }

    templates.delete(template_id).await?;

    info!(user_id = %auth.user_id, template_id = %template_id, "Deleted task template");

    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use domain::models::{TaskType, TaskVisibility, UserRole};

    fn auth_with(role: UserRole, types: Vec<&str>) -> UserAuth {
        UserAuth {
            user_id: Uuid::new_v4(),
            role: Some(role),
            therapist_types: types.into_iter().map(String::from).collect(),
            jti: "jti".to_string(),
        }
    }

    fn template(scope: TemplateScope, owner: Option<Uuid>, types: Vec<&str>) -> TaskTemplate {
        TaskTemplate {
            id: Uuid::new_v4(),
            title: "t".to_string(),
            task_type: TaskType::Timer,
            icon: "timer".to_string(),
            description: None,
            visibility: TaskVisibility::VisibleToPatients,
            config: None,
            evidence_config: None,
            roles: vec![],
            therapist_types: types.into_iter().map(String::from).collect(),
            scope,
            owner_id: owner,
            is_published: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_can_view_global() {
        let auth = auth_with(UserRole::Therapist, vec!["physiotherapie"]);
        let t = template(TemplateScope::Global, None, vec![]);
        assert!(can_view(&auth, &t));
    }

    #[test]
    fn test_can_view_type_scoped_requires_overlap() {
        let auth = auth_with(UserRole::Therapist, vec!["physiotherapie"]);
        let matching = template(TemplateScope::TherapistType, None, vec!["physiotherapie"]);
        let other = template(TemplateScope::TherapistType, None, vec!["logopaedie"]);
        assert!(can_view(&auth, &matching));
        assert!(!can_view(&auth, &other));
    }

    #[test]
    fn test_can_view_private_owner_only() {
        let auth = auth_with(UserRole::Therapist, vec![]);
        let own = template(TemplateScope::Private, Some(auth.user_id), vec![]);
        let foreign = template(TemplateScope::Private, Some(Uuid::new_v4()), vec![]);
        assert!(can_view(&auth, &own));
        assert!(!can_view(&auth, &foreign));
    }

    #[test]
    fn test_admin_sees_everything() {
        let auth = auth_with(UserRole::Admin, vec![]);
        let foreign = template(TemplateScope::Private, Some(Uuid::new_v4()), vec![]);
        assert!(can_view(&auth, &foreign));
        assert!(can_modify(&auth, &foreign));
    }

    #[test]
    fn test_can_modify_owner() {
        let auth = auth_with(UserRole::Therapist, vec![]);
        let own = template(TemplateScope::Private, Some(auth.user_id), vec![]);
        let foreign = template(TemplateScope::Global, None, vec![]);
        assert!(can_modify(&auth, &own));
        assert!(!can_modify(&auth, &foreign));
    }
}
