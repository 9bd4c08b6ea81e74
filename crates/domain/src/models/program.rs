//! Program domain models.
//!
//! A program is an ordered collection of task templates assigned to
//! patients. The program type determines its completion cadence.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;
use validator::Validate;

use shared::validation::validate_hex_color;

use super::TemplateScope;

/// Kind of program, which fixes the completion cadence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProgramType {
    #[serde(rename = "challenge")]
    Challenge,
    #[serde(rename = "sequential")]
    Sequential,
    #[serde(rename = "adaptiveNormal")]
    AdaptiveNormal,
}

impl ProgramType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProgramType::Challenge => "challenge",
            ProgramType::Sequential => "sequential",
            ProgramType::AdaptiveNormal => "adaptiveNormal",
        }
    }

    /// Completion cadence for this program type.
    pub fn cadence(&self) -> ProgramCadence {
        match self {
            ProgramType::Challenge => ProgramCadence::Daily,
            ProgramType::Sequential => ProgramCadence::Weekly,
            ProgramType::AdaptiveNormal => ProgramCadence::Daily,
        }
    }
}

impl fmt::Display for ProgramType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProgramType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "challenge" => Ok(ProgramType::Challenge),
            "sequential" => Ok(ProgramType::Sequential),
            "adaptiveNormal" => Ok(ProgramType::AdaptiveNormal),
            other => Err(format!("unknown program type: {}", other)),
        }
    }
}

/// How often a completion advances the streak.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProgramCadence {
    Daily,
    Weekly,
}

impl ProgramCadence {
    /// Length of one cadence unit in days.
    pub fn days(&self) -> i64 {
        match self {
            ProgramCadence::Daily => 1,
            ProgramCadence::Weekly => 7,
        }
    }
}

/// A therapy program.
#[derive(Debug, Clone)]
pub struct Program {
    pub id: Uuid,
    pub title: String,
    pub subtitle: String,
    pub description: String,
    pub program_type: ProgramType,
    pub task_template_ids: Vec<Uuid>,
    pub icon: String,
    pub color: String,
    pub owner_id: Uuid,
    pub roles: Vec<String>,
    pub therapist_types: Vec<String>,
    pub scope: TemplateScope,
    pub is_published: bool,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Request to create a program.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateProgramRequest {
    #[validate(length(min = 1, max = 200, message = "Title must be 1-200 characters"))]
    pub title: String,

    #[serde(default)]
    #[validate(length(max = 200, message = "Subtitle must be at most 200 characters"))]
    pub subtitle: String,

    #[serde(default)]
    #[validate(length(max = 2000, message = "Description must be at most 2000 characters"))]
    pub description: String,

    pub program_type: ProgramType,

    /// Ordered task template ids (at least one).
    #[validate(length(min = 1, message = "A program needs at least one task"))]
    pub task_template_ids: Vec<Uuid>,

    #[serde(default = "default_program_icon")]
    pub icon: String,

    #[serde(default = "default_program_color")]
    #[validate(custom(function = "validate_hex_color"))]
    pub color: String,

    #[serde(default)]
    pub roles: Vec<String>,

    #[serde(default)]
    pub therapist_types: Vec<String>,

    pub scope: TemplateScope,

    #[serde(default)]
    pub is_published: bool,

    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
}

fn default_program_icon() -> String {
    "fitness_center".to_string()
}

fn default_program_color() -> String {
    "#4f46e5".to_string()
}

impl CreateProgramRequest {
    /// Cross-field checks beyond derive validation.
    pub fn validate_dates(&self) -> Result<(), String> {
        if let (Some(start), Some(end)) = (self.start_date, self.end_date) {
            if end <= start {
                return Err("Program end date must be after the start date".to_string());
            }
        }
        Ok(())
    }
}

/// Request to update a program. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProgramRequest {
    #[validate(length(min = 1, max = 200, message = "Title must be 1-200 characters"))]
    pub title: Option<String>,

    #[validate(length(max = 200, message = "Subtitle must be at most 200 characters"))]
    pub subtitle: Option<String>,

    #[validate(length(max = 2000, message = "Description must be at most 2000 characters"))]
    pub description: Option<String>,

    pub task_template_ids: Option<Vec<Uuid>>,

    pub icon: Option<String>,

    #[validate(custom(function = "validate_hex_color"))]
    pub color: Option<String>,

    pub roles: Option<Vec<String>>,

    pub therapist_types: Option<Vec<String>>,

    pub is_published: Option<bool>,

    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
}

/// Program as returned by the API.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgramResponse {
    pub id: Uuid,
    pub title: String,
    pub subtitle: String,
    pub description: String,
    pub program_type: ProgramType,
    pub cadence: ProgramCadence,
    pub task_template_ids: Vec<Uuid>,
    pub icon: String,
    pub color: String,
    pub owner_id: Uuid,
    pub roles: Vec<String>,
    pub therapist_types: Vec<String>,
    pub scope: TemplateScope,
    pub is_published: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Program> for ProgramResponse {
    fn from(program: Program) -> Self {
        Self {
            id: program.id,
            title: program.title,
            subtitle: program.subtitle,
            description: program.description,
            program_type: program.program_type,
            cadence: program.program_type.cadence(),
            task_template_ids: program.task_template_ids,
            icon: program.icon,
            color: program.color,
            owner_id: program.owner_id,
            roles: program.roles,
            therapist_types: program.therapist_types,
            scope: program.scope,
            is_published: program.is_published,
            start_date: program.start_date,
            end_date: program.end_date,
            created_at: program.created_at,
            updated_at: program.updated_at,
        }
    }
}

/// Query parameters for listing programs.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ListProgramsQuery {
    pub published: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_cadence_by_type() {
        assert_eq!(ProgramType::Challenge.cadence(), ProgramCadence::Daily);
        assert_eq!(ProgramType::Sequential.cadence(), ProgramCadence::Weekly);
        assert_eq!(ProgramType::AdaptiveNormal.cadence(), ProgramCadence::Daily);
    }

    #[test]
    fn test_cadence_days() {
        assert_eq!(ProgramCadence::Daily.days(), 1);
        assert_eq!(ProgramCadence::Weekly.days(), 7);
    }

    #[test]
    fn test_program_type_round_trip() {
        for tag in ["challenge", "sequential", "adaptiveNormal"] {
            assert_eq!(ProgramType::from_str(tag).unwrap().as_str(), tag);
        }
        assert!(ProgramType::from_str("marathon").is_err());
    }

    fn base_request() -> CreateProgramRequest {
        CreateProgramRequest {
            title: "Back pain basics".to_string(),
            subtitle: "".to_string(),
            description: "".to_string(),
            program_type: ProgramType::Challenge,
            task_template_ids: vec![Uuid::new_v4()],
            icon: "fitness_center".to_string(),
            color: "#4f46e5".to_string(),
            roles: vec![],
            therapist_types: vec![],
            scope: TemplateScope::Private,
            is_published: false,
            start_date: None,
            end_date: None,
        }
    }

    #[test]
    fn test_create_request_valid() {
        let request = base_request();
        assert!(request.validate().is_ok());
        assert!(request.validate_dates().is_ok());
    }

    #[test]
    fn test_create_request_needs_tasks() {
        let mut request = base_request();
        request.task_template_ids = vec![];
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_create_request_invalid_color() {
        let mut request = base_request();
        request.color = "blue".to_string();
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_create_request_date_ordering() {
        let mut request = base_request();
        let now = Utc::now();
        request.start_date = Some(now);
        request.end_date = Some(now - Duration::days(1));
        assert!(request.validate_dates().is_err());

        request.end_date = Some(now + Duration::days(28));
        assert!(request.validate_dates().is_ok());
    }

    #[test]
    fn test_response_includes_cadence() {
        let program = Program {
            id: Uuid::new_v4(),
            title: "t".to_string(),
            subtitle: "s".to_string(),
            description: "d".to_string(),
            program_type: ProgramType::Sequential,
            task_template_ids: vec![],
            icon: "i".to_string(),
            color: "#000000".to_string(),
            owner_id: Uuid::new_v4(),
            roles: vec![],
            therapist_types: vec![],
            scope: TemplateScope::Global,
            is_published: true,
            start_date: None,
            end_date: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let response = ProgramResponse::from(program);
        assert_eq!(response.cadence, ProgramCadence::Weekly);
    }
}
