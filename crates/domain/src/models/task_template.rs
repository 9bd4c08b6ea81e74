//! Task template domain models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::{EvidenceConfig, TaskConfig, TaskType, TaskVisibility, TemplateScope};

/// A reusable task definition.
#[derive(Debug, Clone)]
pub struct TaskTemplate {
    pub id: Uuid,
    pub title: String,
    pub task_type: TaskType,
    pub icon: String,
    pub description: Option<String>,
    pub visibility: TaskVisibility,
    pub config: Option<TaskConfig>,
    pub evidence_config: Option<EvidenceConfig>,
    pub roles: Vec<String>,
    pub therapist_types: Vec<String>,
    pub scope: TemplateScope,
    pub owner_id: Option<Uuid>,
    pub is_published: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Request to create a task template.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaskTemplateRequest {
    #[validate(length(min = 1, max = 200, message = "Title must be 1-200 characters"))]
    pub title: String,

    pub task_type: TaskType,

    #[serde(default = "default_task_icon")]
    pub icon: String,

    #[validate(length(max = 2000, message = "Description must be at most 2000 characters"))]
    pub description: Option<String>,

    pub visibility: TaskVisibility,

    /// Typed config; its tag must agree with `task_type`.
    pub config: Option<TaskConfig>,

    pub evidence_config: Option<EvidenceConfig>,

    #[serde(default)]
    pub roles: Vec<String>,

    #[serde(default)]
    pub therapist_types: Vec<String>,

    pub scope: TemplateScope,

    #[serde(default)]
    pub is_published: bool,
}

fn default_task_icon() -> String {
    "assignment".to_string()
}

impl CreateTaskTemplateRequest {
    /// Cross-field checks beyond derive validation.
    pub fn validate_config(&self) -> Result<(), String> {
        if let Some(config) = &self.config {
            if config.task_type() != self.task_type {
                return Err(format!(
                    "Config tag {} does not match task type {}",
                    config.task_type(),
                    self.task_type
                ));
            }
            config.validate()?;
        }
        if let Some(evidence) = &self.evidence_config {
            evidence.validate()?;
        }
        if self.scope == TemplateScope::TherapistType && self.therapist_types.is_empty() {
            return Err("Therapist-type scoped templates need at least one type".to_string());
        }
        Ok(())
    }
}

/// Request to update a task template. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTaskTemplateRequest {
    #[validate(length(min = 1, max = 200, message = "Title must be 1-200 characters"))]
    pub title: Option<String>,

    pub icon: Option<String>,

    #[validate(length(max = 2000, message = "Description must be at most 2000 characters"))]
    pub description: Option<String>,

    pub visibility: Option<TaskVisibility>,

    pub config: Option<TaskConfig>,

    pub evidence_config: Option<EvidenceConfig>,

    pub roles: Option<Vec<String>>,

    pub therapist_types: Option<Vec<String>>,

    pub is_published: Option<bool>,
}

/// Task template as returned by the API.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskTemplateResponse {
    pub id: Uuid,
    pub title: String,
    pub task_type: TaskType,
    pub icon: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub visibility: TaskVisibility,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config: Option<TaskConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub evidence_config: Option<EvidenceConfig>,
    pub roles: Vec<String>,
    pub therapist_types: Vec<String>,
    pub scope: TemplateScope,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner_id: Option<Uuid>,
    pub is_published: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<TaskTemplate> for TaskTemplateResponse {
    fn from(template: TaskTemplate) -> Self {
        Self {
            id: template.id,
            title: template.title,
            task_type: template.task_type,
            icon: template.icon,
            description: template.description,
            visibility: template.visibility,
            config: template.config,
            evidence_config: template.evidence_config,
            roles: template.roles,
            therapist_types: template.therapist_types,
            scope: template.scope,
            owner_id: template.owner_id,
            is_published: template.is_published,
            created_at: template.created_at,
            updated_at: template.updated_at,
        }
    }
}

/// Query parameters for listing task templates.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ListTaskTemplatesQuery {
    /// Restrict to published templates only.
    pub published: Option<bool>,

    /// Restrict to a single task type tag.
    pub task_type: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn timer_request() -> CreateTaskTemplateRequest {
        CreateTaskTemplateRequest {
            title: "Breathing exercise".to_string(),
            task_type: TaskType::Timer,
            icon: "timer".to_string(),
            description: None,
            visibility: TaskVisibility::VisibleToPatients,
            config: Some(TaskConfig::Timer {
                seconds: 300,
                allow_pause: true,
            }),
            evidence_config: None,
            roles: vec![],
            therapist_types: vec!["physiotherapie".to_string()],
            scope: TemplateScope::TherapistType,
            is_published: true,
        }
    }

    #[test]
    fn test_create_request_valid() {
        let request = timer_request();
        assert!(request.validate().is_ok());
        assert!(request.validate_config().is_ok());
    }

    #[test]
    fn test_config_tag_must_match_task_type() {
        let mut request = timer_request();
        request.config = Some(TaskConfig::Scale {
            min: 0,
            max: 10,
            step: 1,
            left_label: None,
            right_label: None,
        });
        assert!(request.validate_config().is_err());
    }

    #[test]
    fn test_type_scope_requires_types() {
        let mut request = timer_request();
        request.therapist_types = vec![];
        assert!(request.validate_config().is_err());

        request.scope = TemplateScope::Private;
        assert!(request.validate_config().is_ok());
    }

    #[test]
    fn test_invalid_nested_config_rejected() {
        let mut request = timer_request();
        request.config = Some(TaskConfig::Timer {
            seconds: 0,
            allow_pause: false,
        });
        assert!(request.validate_config().is_err());
    }

    #[test]
    fn test_empty_title_rejected() {
        let mut request = timer_request();
        request.title = "".to_string();
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_default_icon_applied_on_deserialize() {
        let json = r#"{
            "title": "Journal",
            "taskType": "textInput",
            "visibility": "visibleToPatients",
            "scope": "global"
        }"#;
        let request: CreateTaskTemplateRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.icon, "assignment");
    }
}
