use crate::error::{EngineError, EngineResult};
use crate::models::InteractionKind;

/// User identifiers key storage records, so an empty one is a programmer error.
pub fn validate_user_id(user_id: &str) -> EngineResult<()> {
    if user_id.trim().is_empty() {
        return Err(EngineError::InvalidInput(
            "user id cannot be empty".to_string(),
        ));
    }
    if user_id.len() > 256 {
        return Err(EngineError::InvalidInput(
            "user id too long (max 256 bytes)".to_string(),
        ));
    }
    Ok(())
}

/// Parses an interaction kind from its wire form. "skipped" is accepted as a
/// legacy alias for "dismissed".
pub fn parse_interaction_kind(kind: &str) -> EngineResult<InteractionKind> {
    match kind.trim().to_lowercase().as_str() {
        "selected" => Ok(InteractionKind::Selected),
        "visited" => Ok(InteractionKind::Visited),
        "dismissed" | "skipped" => Ok(InteractionKind::Dismissed),
        "rated" => Ok(InteractionKind::Rated),
        other => Err(EngineError::InvalidInput(format!(
            "unknown interaction kind: {other}"
        ))),
    }
}

pub fn validate_user_rating(rating: Option<f32>) -> EngineResult<()> {
    if let Some(rating) = rating {
        if !rating.is_finite() {
            return Err(EngineError::InvalidInput(
                "user rating must be a finite number".to_string(),
            ));
        }
        if !(0.0..=5.0).contains(&rating) {
            return Err(EngineError::InvalidInput(format!(
                "user rating out of range: {rating} (expected 0-5)"
            )));
        }
    }
    Ok(())
}

pub fn validate_dietary_restrictions(restrictions: &[String]) -> EngineResult<()> {
    for restriction in restrictions {
        if restriction.trim().is_empty() {
            return Err(EngineError::InvalidInput(
                "dietary restriction cannot be empty".to_string(),
            ));
        }
        if restriction.len() > 100 {
            return Err(EngineError::InvalidInput(
                "dietary restriction too long (max 100 characters)".to_string(),
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_user_id() {
        assert!(validate_user_id("u1").is_ok());
        assert!(validate_user_id("").is_err());
        assert!(validate_user_id("   ").is_err());
        assert!(validate_user_id(&"x".repeat(300)).is_err());
    }

    #[test]
    fn test_parse_interaction_kind() {
        assert_eq!(
            parse_interaction_kind("selected").unwrap(),
            InteractionKind::Selected
        );
        assert_eq!(
            parse_interaction_kind(" Visited ").unwrap(),
            InteractionKind::Visited
        );
        assert_eq!(
            parse_interaction_kind("skipped").unwrap(),
            InteractionKind::Dismissed
        );
        assert_eq!(
            parse_interaction_kind("rated").unwrap(),
            InteractionKind::Rated
        );
        assert!(parse_interaction_kind("purchased").is_err());
    }

    #[test]
    fn test_validate_user_rating() {
        assert!(validate_user_rating(None).is_ok());
        assert!(validate_user_rating(Some(4.5)).is_ok());
        assert!(validate_user_rating(Some(-1.0)).is_err());
        assert!(validate_user_rating(Some(5.5)).is_err());
        assert!(validate_user_rating(Some(f32::NAN)).is_err());
    }

    #[test]
    fn test_validate_dietary_restrictions() {
        let ok = vec!["vegetarian".to_string(), "gluten-free".to_string()];
        assert!(validate_dietary_restrictions(&ok).is_ok());
        let empty = vec![" ".to_string()];
        assert!(validate_dietary_restrictions(&empty).is_err());
    }
}
