//! Therapist type catalogue models.

use serde::{Deserialize, Serialize};
use validator::Validate;

use shared::validation::validate_type_slug;

/// A therapist sub-type, e.g. "physiotherapie".
///
/// The id is the slug used in invite grants, template scoping and identity
/// claims; the name is the human-readable label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TherapistType {
    pub id: String,
    pub name: String,
}

/// Request to add a therapist type to the catalogue.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateTherapistTypeRequest {
    #[validate(custom(function = "validate_type_slug"))]
    pub id: String,

    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_therapist_type_valid() {
        let request = CreateTherapistTypeRequest {
            id: "physiotherapie".to_string(),
            name: "Physiotherapie".to_string(),
        };
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_create_therapist_type_invalid_slug() {
        let request = CreateTherapistTypeRequest {
            id: "Physio Therapie".to_string(),
            name: "Physiotherapie".to_string(),
        };
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_create_therapist_type_empty_name() {
        let request = CreateTherapistTypeRequest {
            id: "physiotherapie".to_string(),
            name: "".to_string(),
        };
        assert!(request.validate().is_err());
    }
}
