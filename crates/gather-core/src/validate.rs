use crate::error::{CoreError, Result};

pub const MAX_BODY_CHARS: usize = 5000;

/// Trims `value` and checks its length in characters.
pub fn text<'a>(field: &str, value: &'a str, min: usize, max: usize) -> Result<&'a str> {
    let trimmed = value.trim();
    let len = trimmed.chars().count();
    if len < min || len > max {
        return Err(CoreError::InvalidArgument(if min == 1 && len == 0 {
            format!("{field} is required")
        } else {
            format!("{field} must be between {min} and {max} characters")
        }));
    }
    Ok(trimmed)
}

pub fn username(value: &str) -> Result<&str> {
    let value = text("username", value, 3, 32)?;
    if !value
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.')
    {
        return Err(CoreError::InvalidArgument(
            "username may only contain letters, digits, '_' and '.'".into(),
        ));
    }
    Ok(value)
}

pub fn email(value: &str) -> Result<&str> {
    let value = text("email", value, 3, 254)?;
    let valid = match value.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
        }
        None => false,
    };
    if !valid {
        return Err(CoreError::InvalidArgument("email is malformed".into()));
    }
    Ok(value)
}

/// `+` followed by one to three digits.
pub fn country_code(value: &str) -> Result<&str> {
    let value = value.trim();
    let digits = value.strip_prefix('+').unwrap_or("");
    if digits.is_empty() || digits.len() > 3 || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(CoreError::InvalidArgument("country code is malformed".into()));
    }
    Ok(value)
}

pub fn phone_number(value: &str) -> Result<&str> {
    let value = value.trim();
    if !(4..=15).contains(&value.len()) || !value.chars().all(|c| c.is_ascii_digit()) {
        return Err(CoreError::InvalidArgument(
            "phone number must be 4 to 15 digits".into(),
        ));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_trims_and_bounds() {
        assert_eq!(text("title", "  hi  ", 1, 10).unwrap(), "hi");
        assert!(text("title", "   ", 1, 10).is_err());
        assert!(text("title", "abcdefghijk", 1, 10).is_err());
        // Length is counted in characters, not bytes.
        assert!(text("title", "ééééé", 1, 5).is_ok());
    }

    #[test]
    fn test_usernames() {
        assert!(username("alice_01").is_ok());
        assert!(username("al").is_err());
        assert!(username("alice smith").is_err());
    }

    #[test]
    fn test_emails() {
        assert!(email("a@b.co").is_ok());
        assert!(email("a@b").is_err());
        assert!(email("@b.co").is_err());
        assert!(email("a@@b.co").is_err());
        assert!(email("a@b.").is_err());
    }

    #[test]
    fn test_phone_parts() {
        assert!(country_code("+44").is_ok());
        assert!(country_code("44").is_err());
        assert!(country_code("+1234").is_err());
        assert!(phone_number("5550001").is_ok());
        assert!(phone_number("555-0001").is_err());
    }
}
