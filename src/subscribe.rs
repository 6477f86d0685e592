//! Email validation for the subscription form. Nothing is stored here: the
//! form posts to a configured endpoint or falls back to a `mailto:` link.

use regex::Regex;
use std::fmt;
use std::sync::LazyLock;

/// The pattern an address must match. The same string is emitted as the
/// form input's `pattern` attribute so browsers apply the same rule.
pub const EMAIL_PATTERN: &str = r"^[^\s@]+@[^\s@]+\.[^\s@]+$";

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(EMAIL_PATTERN).unwrap());

/// Checks that `email` is a plausible address. Surrounding whitespace is
/// ignored.
pub fn validate_email(email: &str) -> Result<(), EmailError> {
    let email = email.trim();
    if email.is_empty() {
        Err(EmailError::Empty)
    } else if !EMAIL_RE.is_match(email) {
        Err(EmailError::Invalid(email.to_owned()))
    } else {
        Ok(())
    }
}

/// Builds the `mailto:` link used when no form endpoint is configured.
pub fn mailto(to: &str, subject: &str) -> String {
    format!("mailto:{}?subject={}", to, subject.replace(' ', "%20"))
}

#[derive(Debug, PartialEq)]
pub enum EmailError {
    /// No address was given.
    Empty,

    /// The address doesn't look like `name@domain.tld`.
    Invalid(String),
}

impl fmt::Display for EmailError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            EmailError::Empty => write!(f, "Please enter an email address"),
            EmailError::Invalid(email) => {
                write!(f, "`{}` is not a valid email address", email)
            }
        }
    }
}

impl std::error::Error for EmailError {}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_validate_email() {
        assert_eq!(Ok(()), validate_email("ferris@example.org"));
        assert_eq!(Ok(()), validate_email("  first.last+news@mail.example.co.uk "));
        assert_eq!(Err(EmailError::Empty), validate_email(""));
        assert_eq!(Err(EmailError::Empty), validate_email("   "));
        assert_eq!(
            Err(EmailError::Invalid("ferris".to_owned())),
            validate_email("ferris")
        );
        assert!(validate_email("ferris@localhost").is_err());
        assert!(validate_email("fer ris@example.org").is_err());
        assert!(validate_email("ferris@@example.org").is_err());
    }

    #[test]
    fn test_mailto() {
        assert_eq!(
            "mailto:ferris@example.org?subject=Subscribe%20to%20Ferris",
            mailto("ferris@example.org", "Subscribe to Ferris")
        );
    }
}
