//! Common validation utilities.

use lazy_static::lazy_static;
use regex::Regex;
use validator::ValidationError;

lazy_static! {
    /// Invite codes: 6-32 characters from the unambiguous upper-case alphabet.
    static ref INVITE_CODE_RE: Regex = Regex::new(r"^[A-HJ-NP-Z2-9]{6,32}$").unwrap();

    /// Therapist type slugs: lower-case ascii, digits and hyphens.
    static ref TYPE_SLUG_RE: Regex = Regex::new(r"^[a-z0-9][a-z0-9-]{1,49}$").unwrap();

    /// Hex colors like `#aabbcc`.
    static ref HEX_COLOR_RE: Regex = Regex::new(r"^#[0-9a-fA-F]{6}$").unwrap();
}

/// Validates the format of an invite code supplied by an administrator.
///
/// Server-generated codes always pass; this guards explicit overrides.
pub fn validate_invite_code(code: &str) -> Result<(), ValidationError> {
    if INVITE_CODE_RE.is_match(code) {
        Ok(())
    } else {
        let mut err = ValidationError::new("invite_code_format");
        err.message =
            Some("Invite code must be 6-32 characters from A-Z (no O/I) and 2-9".into());
        Err(err)
    }
}

/// Validates a therapist type identifier (e.g. "physiotherapie").
pub fn validate_type_slug(slug: &str) -> Result<(), ValidationError> {
    if TYPE_SLUG_RE.is_match(slug) {
        Ok(())
    } else {
        let mut err = ValidationError::new("type_slug_format");
        err.message = Some("Type must be lower-case letters, digits or hyphens".into());
        Err(err)
    }
}

/// Validates a `#rrggbb` hex color.
pub fn validate_hex_color(color: &str) -> Result<(), ValidationError> {
    if HEX_COLOR_RE.is_match(color) {
        Ok(())
    } else {
        let mut err = ValidationError::new("hex_color_format");
        err.message = Some("Color must be a #rrggbb hex value".into());
        Err(err)
    }
}

/// Normalizes an email for comparison and storage.
///
/// The restricted-email check on invites is case-insensitive.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Trims and drops empty entries from a list of therapist types.
pub fn normalize_type_list(types: &[String]) -> Vec<String> {
    types
        .iter()
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_invite_code() {
        assert!(validate_invite_code("ABCD2345").is_ok());
        assert!(validate_invite_code("XYZXYZ").is_ok());
        assert!(validate_invite_code("abcd2345").is_err()); // lower case
        assert!(validate_invite_code("ABCD0345").is_err()); // contains 0
        assert!(validate_invite_code("ABCDI345").is_err()); // contains I
        assert!(validate_invite_code("AB1").is_err()); // too short
        assert!(validate_invite_code("").is_err());
    }

    #[test]
    fn test_validate_type_slug() {
        assert!(validate_type_slug("physiotherapie").is_ok());
        assert!(validate_type_slug("logopaedie").is_ok());
        assert!(validate_type_slug("ergo-therapie").is_ok());
        assert!(validate_type_slug("Physio").is_err());
        assert!(validate_type_slug("-leading").is_err());
        assert!(validate_type_slug("a").is_err());
    }

    #[test]
    fn test_validate_hex_color() {
        assert!(validate_hex_color("#aabbcc").is_ok());
        assert!(validate_hex_color("#AABBCC").is_ok());
        assert!(validate_hex_color("aabbcc").is_err());
        assert!(validate_hex_color("#abc").is_err());
        assert!(validate_hex_color("#aabbcg").is_err());
    }

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("  User@Example.COM "), "user@example.com");
        assert_eq!(normalize_email("plain@example.com"), "plain@example.com");
    }

    #[test]
    fn test_normalize_type_list() {
        let input = vec![
            " physiotherapie ".to_string(),
            "".to_string(),
            "logopaedie".to_string(),
            "   ".to_string(),
        ];
        assert_eq!(
            normalize_type_list(&input),
            vec!["physiotherapie".to_string(), "logopaedie".to_string()]
        );
    }

    #[test]
    fn test_normalize_type_list_empty() {
        assert!(normalize_type_list(&[]).is_empty());
    }
}
