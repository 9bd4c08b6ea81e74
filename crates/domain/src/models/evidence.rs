//! Evidence requirements attached to task templates.
//!
//! A task can require proof of completion (photo, audio, geolocation, ...)
//! with per-type attachment bounds.

use serde::{Deserialize, Serialize};

/// Type of evidence a task may require.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EvidenceType {
    #[serde(rename = "photo")]
    Photo,
    #[serde(rename = "audio")]
    Audio,
    #[serde(rename = "video")]
    Video,
    #[serde(rename = "geolocation")]
    Geolocation,
    #[serde(rename = "checklist")]
    Checklist,
    #[serde(rename = "qrCode")]
    QrCode,
}

/// A single evidence requirement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvidenceRequirement {
    #[serde(rename = "type")]
    pub evidence_type: EvidenceType,
    pub min_attachments: u32,
    pub max_attachments: u32,
    #[serde(default)]
    pub is_mandatory: bool,
}

/// Evidence configuration for a task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvidenceConfig {
    pub requirements: Vec<EvidenceRequirement>,
    pub notes_enabled: bool,
    pub comment_required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment_label_key: Option<String>,
}

impl EvidenceConfig {
    /// Validates attachment bounds on every requirement.
    pub fn validate(&self) -> Result<(), String> {
        for requirement in &self.requirements {
            if requirement.max_attachments == 0 {
                return Err("Evidence max attachments must be positive".to_string());
            }
            if requirement.min_attachments > requirement.max_attachments {
                return Err(
                    "Evidence minimum attachments cannot exceed maximum".to_string()
                );
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn photo_requirement(min: u32, max: u32) -> EvidenceRequirement {
        EvidenceRequirement {
            evidence_type: EvidenceType::Photo,
            min_attachments: min,
            max_attachments: max,
            is_mandatory: true,
        }
    }

    #[test]
    fn test_evidence_config_valid() {
        let config = EvidenceConfig {
            requirements: vec![photo_requirement(1, 3)],
            notes_enabled: true,
            comment_required: false,
            comment_label_key: None,
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_evidence_config_inverted_bounds() {
        let config = EvidenceConfig {
            requirements: vec![photo_requirement(4, 2)],
            notes_enabled: false,
            comment_required: false,
            comment_label_key: None,
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_evidence_config_zero_max() {
        let config = EvidenceConfig {
            requirements: vec![photo_requirement(0, 0)],
            notes_enabled: false,
            comment_required: false,
            comment_label_key: None,
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_evidence_config_empty_requirements_ok() {
        let config = EvidenceConfig {
            requirements: vec![],
            notes_enabled: true,
            comment_required: true,
            comment_label_key: Some("evidence.comment".to_string()),
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_evidence_type_wire_tags() {
        assert_eq!(
            serde_json::to_string(&EvidenceType::QrCode).unwrap(),
            "\"qrCode\""
        );
        assert_eq!(
            serde_json::to_string(&EvidenceType::Geolocation).unwrap(),
            "\"geolocation\""
        );
    }

    #[test]
    fn test_requirement_type_field_name() {
        let requirement = photo_requirement(1, 1);
        let json = serde_json::to_value(&requirement).unwrap();
        assert_eq!(json["type"], "photo");
        assert_eq!(json["minAttachments"], 1);
    }
}
