//! Utility functions and helpers

/// Generate an identifier for a single build, used to correlate log lines
pub fn generate_build_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Mask a secret for display, keeping only its length visible
pub fn mask_secret(secret: &str) -> String {
    if secret.is_empty() {
        return String::new();
    }
    "*".repeat(secret.chars().count().min(8))
}

/// Split a `key=value` pair. The key must be non-empty; the value may be empty.
pub fn parse_property_pair(pair: &str) -> Result<(String, String), String> {
    let (key, value) = pair
        .split_once('=')
        .ok_or_else(|| format!("Expected key=value, got '{}'", pair))?;

    let key = key.trim();
    if key.is_empty() {
        return Err(format!("Property key cannot be empty in '{}'", pair));
    }

    Ok((key.to_string(), value.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_ids_are_unique() {
        assert_ne!(generate_build_id(), generate_build_id());
    }

    #[test]
    fn test_mask_secret() {
        assert_eq!(mask_secret(""), "");
        assert_eq!(mask_secret("abc"), "***");
        assert_eq!(mask_secret("a-very-long-password"), "********");
    }

    #[test]
    fn test_parse_property_pair() {
        assert_eq!(
            parse_property_pair("driver=test-driver").unwrap(),
            ("driver".to_string(), "test-driver".to_string())
        );
        assert_eq!(
            parse_property_pair("url=jdbc:h2:mem:a=b").unwrap(),
            ("url".to_string(), "jdbc:h2:mem:a=b".to_string())
        );
        assert_eq!(parse_property_pair(" empty =").unwrap().1, "");
        assert!(parse_property_pair("novalue").is_err());
        assert!(parse_property_pair("=value").is_err());
    }
}
