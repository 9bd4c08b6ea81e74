//! Task types and the task configuration variant set.
//!
//! Every task template carries a `taskType` tag plus a matching config
//! payload. The config is a tagged union: the serde representation keeps
//! the original wire tags (`timerTask`, `quizTask`, ...) so stored
//! documents stay readable by existing clients.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Task type tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskType {
    #[serde(rename = "timerTask")]
    Timer,
    #[serde(rename = "textInput")]
    TextInput,
    #[serde(rename = "quizTask")]
    Quiz,
    #[serde(rename = "progressTask")]
    Progress,
    #[serde(rename = "mediaTask")]
    Media,
    #[serde(rename = "goalTask")]
    Goal,
    #[serde(rename = "scaleTask")]
    Scale,
    #[serde(rename = "stateLog")]
    StateLog,
}

impl TaskType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskType::Timer => "timerTask",
            TaskType::TextInput => "textInput",
            TaskType::Quiz => "quizTask",
            TaskType::Progress => "progressTask",
            TaskType::Media => "mediaTask",
            TaskType::Goal => "goalTask",
            TaskType::Scale => "scaleTask",
            TaskType::StateLog => "stateLog",
        }
    }
}

impl fmt::Display for TaskType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "timerTask" => Ok(TaskType::Timer),
            "textInput" => Ok(TaskType::TextInput),
            "quizTask" => Ok(TaskType::Quiz),
            "progressTask" => Ok(TaskType::Progress),
            "mediaTask" => Ok(TaskType::Media),
            "goalTask" => Ok(TaskType::Goal),
            "scaleTask" => Ok(TaskType::Scale),
            "stateLog" => Ok(TaskType::StateLog),
            other => Err(format!("unknown task type: {}", other)),
        }
    }
}

/// Whether patients see the task in their program view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskVisibility {
    #[serde(rename = "visibleToPatients")]
    VisibleToPatients,
    #[serde(rename = "hiddenFromPatients")]
    HiddenFromPatients,
}

impl TaskVisibility {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskVisibility::VisibleToPatients => "visibleToPatients",
            TaskVisibility::HiddenFromPatients => "hiddenFromPatients",
        }
    }
}

impl FromStr for TaskVisibility {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "visibleToPatients" => Ok(TaskVisibility::VisibleToPatients),
            "hiddenFromPatients" => Ok(TaskVisibility::HiddenFromPatients),
            other => Err(format!("unknown visibility: {}", other)),
        }
    }
}

/// Template scope: who can see and use a template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TemplateScope {
    #[serde(rename = "global")]
    Global,
    #[serde(rename = "therapistType")]
    TherapistType,
    #[serde(rename = "private")]
    Private,
}

impl TemplateScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            TemplateScope::Global => "global",
            TemplateScope::TherapistType => "therapistType",
            TemplateScope::Private => "private",
        }
    }
}

impl FromStr for TemplateScope {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "global" => Ok(TemplateScope::Global),
            "therapistType" => Ok(TemplateScope::TherapistType),
            "private" => Ok(TemplateScope::Private),
            other => Err(format!("unknown scope: {}", other)),
        }
    }
}

/// Kind of media referenced by a media task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Audio,
    Video,
    Image,
    Document,
}

/// A single quiz answer option.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizOption {
    pub label: String,
    pub is_correct: bool,
}

/// Task configuration, discriminated by `taskType`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "taskType")]
pub enum TaskConfig {
    #[serde(rename = "timerTask", rename_all = "camelCase")]
    Timer { seconds: u32, allow_pause: bool },

    #[serde(rename = "textInput", rename_all = "camelCase")]
    TextInput {
        min_length: u32,
        max_length: u32,
        show_history: bool,
    },

    #[serde(rename = "quizTask", rename_all = "camelCase")]
    Quiz {
        single_choice: bool,
        options: Vec<QuizOption>,
        #[serde(skip_serializing_if = "Option::is_none")]
        explanation: Option<String>,
    },

    #[serde(rename = "progressTask", rename_all = "camelCase")]
    Progress {
        target: u32,
        allow_partial: bool,
        unit: String,
    },

    #[serde(rename = "mediaTask", rename_all = "camelCase")]
    Media {
        media_url: String,
        kind: MediaKind,
        #[serde(skip_serializing_if = "Option::is_none")]
        file_name: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        file_size: Option<u64>,
        #[serde(skip_serializing_if = "Option::is_none")]
        storage_path: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        content_type: Option<String>,
    },

    #[serde(rename = "goalTask", rename_all = "camelCase")]
    Goal {
        goal_description: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        due_date: Option<chrono::DateTime<chrono::Utc>>,
    },

    #[serde(rename = "scaleTask", rename_all = "camelCase")]
    Scale {
        min: i32,
        max: i32,
        step: u32,
        #[serde(skip_serializing_if = "Option::is_none")]
        left_label: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        right_label: Option<String>,
    },

    #[serde(rename = "stateLog", rename_all = "camelCase")]
    StateLog {
        emoji_keys: Vec<String>,
        show_chart: bool,
    },
}

impl TaskConfig {
    /// The task type this config belongs to.
    pub fn task_type(&self) -> TaskType {
        match self {
            TaskConfig::Timer { .. } => TaskType::Timer,
            TaskConfig::TextInput { .. } => TaskType::TextInput,
            TaskConfig::Quiz { .. } => TaskType::Quiz,
            TaskConfig::Progress { .. } => TaskType::Progress,
            TaskConfig::Media { .. } => TaskType::Media,
            TaskConfig::Goal { .. } => TaskType::Goal,
            TaskConfig::Scale { .. } => TaskType::Scale,
            TaskConfig::StateLog { .. } => TaskType::StateLog,
        }
    }

    /// Validates per-variant invariants.
    pub fn validate(&self) -> Result<(), String> {
        match self {
            TaskConfig::Timer { seconds, .. } => {
                if *seconds == 0 {
                    return Err("Timer duration must be positive".to_string());
                }
            }
            TaskConfig::TextInput {
                min_length,
                max_length,
                ..
            } => {
                if *max_length == 0 {
                    return Err("Maximum text length must be positive".to_string());
                }
                if min_length > max_length {
                    return Err("Minimum text length cannot exceed maximum".to_string());
                }
            }
            TaskConfig::Quiz {
                single_choice,
                options,
                ..
            } => {
                if options.len() < 2 {
                    return Err("Quiz needs at least two options".to_string());
                }
                let correct = options.iter().filter(|o| o.is_correct).count();
                if correct == 0 {
                    return Err("Quiz needs at least one correct option".to_string());
                }
                if *single_choice && correct > 1 {
                    return Err("Single-choice quiz can only have one correct option".to_string());
                }
                if options.iter().any(|o| o.label.trim().is_empty()) {
                    return Err("Quiz options must have labels".to_string());
                }
            }
            TaskConfig::Progress { target, unit, .. } => {
                if *target == 0 {
                    return Err("Progress target must be positive".to_string());
                }
                if unit.trim().is_empty() {
                    return Err("Progress unit is required".to_string());
                }
            }
            TaskConfig::Media { media_url, .. } => {
                if media_url.trim().is_empty() {
                    return Err("Media URL is required".to_string());
                }
            }
            TaskConfig::Goal {
                goal_description, ..
            } => {
                if goal_description.trim().is_empty() {
                    return Err("Goal description is required".to_string());
                }
            }
            TaskConfig::Scale { min, max, step, .. } => {
                if min >= max {
                    return Err("Scale minimum must be below maximum".to_string());
                }
                if *step == 0 {
                    return Err("Scale step must be positive".to_string());
                }
            }
            TaskConfig::StateLog { emoji_keys, .. } => {
                if emoji_keys.is_empty() {
                    return Err("State log needs at least one emoji key".to_string());
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_type_round_trip() {
        for tag in [
            "timerTask",
            "textInput",
            "quizTask",
            "progressTask",
            "mediaTask",
            "goalTask",
            "scaleTask",
            "stateLog",
        ] {
            let parsed = TaskType::from_str(tag).unwrap();
            assert_eq!(parsed.as_str(), tag);
        }
        assert!(TaskType::from_str("unknownTask").is_err());
    }

    #[test]
    fn test_config_is_tagged_by_task_type() {
        let config = TaskConfig::Timer {
            seconds: 120,
            allow_pause: true,
        };
        let json = serde_json::to_value(&config).unwrap();
        assert_eq!(json["taskType"], "timerTask");
        assert_eq!(json["seconds"], 120);
        assert_eq!(json["allowPause"], true);
    }

    #[test]
    fn test_config_deserializes_from_tag() {
        let json = r#"{"taskType":"scaleTask","min":0,"max":10,"step":1,"leftLabel":"no pain"}"#;
        let config: TaskConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.task_type(), TaskType::Scale);
        match config {
            TaskConfig::Scale {
                min,
                max,
                left_label,
                right_label,
                ..
            } => {
                assert_eq!(min, 0);
                assert_eq!(max, 10);
                assert_eq!(left_label.as_deref(), Some("no pain"));
                assert!(right_label.is_none());
            }
            other => panic!("Expected scale config, got {:?}", other),
        }
    }

    #[test]
    fn test_config_rejects_unknown_tag() {
        let json = r#"{"taskType":"danceTask","steps":3}"#;
        assert!(serde_json::from_str::<TaskConfig>(json).is_err());
    }

    #[test]
    fn test_timer_validation() {
        let zero = TaskConfig::Timer {
            seconds: 0,
            allow_pause: false,
        };
        assert!(zero.validate().is_err());

        let ok = TaskConfig::Timer {
            seconds: 60,
            allow_pause: false,
        };
        assert!(ok.validate().is_ok());
    }

    #[test]
    fn test_text_input_validation() {
        let inverted = TaskConfig::TextInput {
            min_length: 50,
            max_length: 10,
            show_history: false,
        };
        assert!(inverted.validate().is_err());
    }

    #[test]
    fn test_quiz_validation() {
        let no_correct = TaskConfig::Quiz {
            single_choice: true,
            options: vec![
                QuizOption {
                    label: "A".to_string(),
                    is_correct: false,
                },
                QuizOption {
                    label: "B".to_string(),
                    is_correct: false,
                },
            ],
            explanation: None,
        };
        assert!(no_correct.validate().is_err());

        let two_correct_single = TaskConfig::Quiz {
            single_choice: true,
            options: vec![
                QuizOption {
                    label: "A".to_string(),
                    is_correct: true,
                },
                QuizOption {
                    label: "B".to_string(),
                    is_correct: true,
                },
            ],
            explanation: None,
        };
        assert!(two_correct_single.validate().is_err());

        let multi = TaskConfig::Quiz {
            single_choice: false,
            options: vec![
                QuizOption {
                    label: "A".to_string(),
                    is_correct: true,
                },
                QuizOption {
                    label: "B".to_string(),
                    is_correct: true,
                },
            ],
            explanation: Some("both work".to_string()),
        };
        assert!(multi.validate().is_ok());
    }

    #[test]
    fn test_scale_validation() {
        let bad = TaskConfig::Scale {
            min: 5,
            max: 5,
            step: 1,
            left_label: None,
            right_label: None,
        };
        assert!(bad.validate().is_err());

        let negative_range = TaskConfig::Scale {
            min: -5,
            max: 5,
            step: 1,
            left_label: None,
            right_label: None,
        };
        assert!(negative_range.validate().is_ok());
    }

    #[test]
    fn test_state_log_validation() {
        let empty = TaskConfig::StateLog {
            emoji_keys: vec![],
            show_chart: true,
        };
        assert!(empty.validate().is_err());
    }

    #[test]
    fn test_media_kind_serialization() {
        assert_eq!(
            serde_json::to_string(&MediaKind::Document).unwrap(),
            "\"document\""
        );
    }
}
