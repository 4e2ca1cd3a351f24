//! Masking of personal data for display and logs.

use std::sync::OnceLock;

use regex::Regex;

use sealkit_common::{Error, Result};

const EMAIL_PATTERN: &str = r"^[^@\s]+@[^@\s]+\.[^@\s.]+$";

/// Characters of the local part left visible.
const VISIBLE_EMAIL_PREFIX: usize = 2;

/// Trailing digits of a phone number left visible.
const VISIBLE_PHONE_SUFFIX: usize = 4;

fn email_regex() -> Result<&'static Regex> {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    if let Some(regex) = EMAIL.get() {
        return Ok(regex);
    }
    let regex = Regex::new(EMAIL_PATTERN)
        .map_err(|e| Error::InvalidInput(format!("Email pattern: {}", e)))?;
    Ok(EMAIL.get_or_init(|| regex))
}

/// Keep the first two characters of the local part and star the rest.
///
/// `"test@example.com"` becomes `"te**@example.com"`.
///
/// # Errors
/// - `InvalidInput` if `email` is not an email address
pub fn mask_email(email: &str) -> Result<String> {
    if !email_regex()?.is_match(email) {
        return Err(Error::InvalidInput("Invalid email address".to_string()));
    }

    let (local, domain) = email
        .split_once('@')
        .ok_or_else(|| Error::InvalidInput("Invalid email address".to_string()))?;

    let visible: String = local.chars().take(VISIBLE_EMAIL_PREFIX).collect();
    let hidden = local.chars().count().saturating_sub(VISIBLE_EMAIL_PREFIX);
    Ok(format!("{}{}@{}", visible, "*".repeat(hidden), domain))
}

/// Star all but the last four characters.
///
/// # Errors
/// - `InvalidInput` if `phone_number` is empty
pub fn mask_phone_number(phone_number: &str) -> Result<String> {
    if phone_number.is_empty() {
        return Err(Error::InvalidInput("Invalid phone number".to_string()));
    }

    let length = phone_number.chars().count();
    if length <= VISIBLE_PHONE_SUFFIX {
        return Ok(phone_number.to_string());
    }

    let hidden = length - VISIBLE_PHONE_SUFFIX;
    let visible: String = phone_number.chars().skip(hidden).collect();
    Ok(format!("{}{}", "*".repeat(hidden), visible))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_email() {
        let cases = [
            ("vazgen.Sargsyan@vazgen.com", "va*************@vazgen.com"),
            ("test@example.com", "te**@example.com"),
            ("ab@c.com", "ab@c.com"),
            ("a@b.com", "a@b.com"),
        ];
        for (input, expected) in cases {
            assert_eq!(mask_email(input).unwrap(), expected);
        }
    }

    #[test]
    fn test_mask_email_invalid() {
        let invalid = [
            "",
            "notanemail",
            "two@@example.com",
            "no spaces@example.com",
            "user@localhost",
        ];
        for input in invalid {
            assert!(
                matches!(mask_email(input), Err(Error::InvalidInput(_))),
                "{:?} accepted",
                input
            );
        }
    }

    #[test]
    fn test_mask_phone_number() {
        assert_eq!(mask_phone_number("1234567890").unwrap(), "******7890");
        assert_eq!(mask_phone_number("+37499123456").unwrap(), "********3456");
        assert_eq!(mask_phone_number("1234").unwrap(), "1234");
        assert_eq!(mask_phone_number("12").unwrap(), "12");
    }

    #[test]
    fn test_mask_phone_number_empty() {
        assert!(matches!(mask_phone_number(""), Err(Error::InvalidInput(_))));
    }
}
