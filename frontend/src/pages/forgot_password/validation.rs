//! Local shape check for the address typed into the forgot-password form.
//!
//! This is deliberately minimal: one `@`, non-empty local part, and a domain
//! containing a dot. Anything stricter is left to the server.

use serde::Serialize;
use std::{fmt, str::FromStr};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum InvalidEmail {
    #[error("Email is required")]
    Empty,
    #[error("Email must contain an @")]
    MissingAt,
    #[error("Email must contain a single @")]
    MultipleAt,
    #[error("Email is missing the part before @")]
    EmptyLocalPart,
    #[error("Email is missing the domain")]
    EmptyDomain,
    #[error("Email domain must contain a dot")]
    DomainWithoutDot,
}

/// An address that passed [`validate`]. Always stored trimmed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Email(String);

impl Email {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Email {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<&str> for Email {
    type Error = InvalidEmail;

    fn try_from(raw: &str) -> Result<Self, Self::Error> {
        validate(raw)
    }
}

impl FromStr for Email {
    type Err = InvalidEmail;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        validate(raw)
    }
}

pub fn validate(raw: &str) -> Result<Email, InvalidEmail> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(InvalidEmail::Empty);
    }

    let mut parts = trimmed.split('@');
    let local = parts.next().unwrap_or_default();
    let domain = parts.next().ok_or(InvalidEmail::MissingAt)?;
    if parts.next().is_some() {
        return Err(InvalidEmail::MultipleAt);
    }

    if local.is_empty() {
        return Err(InvalidEmail::EmptyLocalPart);
    }
    if domain.is_empty() {
        return Err(InvalidEmail::EmptyDomain);
    }
    if !domain.contains('.') {
        return Err(InvalidEmail::DomainWithoutDot);
    }

    Ok(Email(trimmed.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn rejects_empty_and_whitespace() {
        assert_eq!(validate(""), Err(InvalidEmail::Empty));
        assert_eq!(validate("   \t\n"), Err(InvalidEmail::Empty));
    }

    #[test]
    fn rejects_missing_at() {
        assert_eq!(validate("not-an-email"), Err(InvalidEmail::MissingAt));
    }

    #[test]
    fn rejects_multiple_at() {
        assert_eq!(validate("a@b@c.com"), Err(InvalidEmail::MultipleAt));
    }

    #[test]
    fn rejects_empty_parts() {
        assert_eq!(validate("@example.com"), Err(InvalidEmail::EmptyLocalPart));
        assert_eq!(validate("user@"), Err(InvalidEmail::EmptyDomain));
    }

    #[test]
    fn rejects_domain_without_dot() {
        assert_eq!(validate("user@localhost"), Err(InvalidEmail::DomainWithoutDot));
    }

    #[test]
    fn accepts_and_trims_valid_address() {
        let email = validate("  user@example.com \n").expect("valid");
        assert_eq!(email.as_str(), "user@example.com");
        assert_eq!(email.to_string(), "user@example.com");
    }

    #[test]
    fn parse_and_try_from_share_validation() {
        assert!("a@b.com".parse::<Email>().is_ok());
        assert_eq!(Email::try_from("a@b"), Err(InvalidEmail::DomainWithoutDot));
    }

    #[test]
    fn serializes_as_plain_string() {
        let email = validate("a@b.com").unwrap();
        assert_eq!(serde_json::to_value(&email).unwrap(), serde_json::json!("a@b.com"));
    }

    proptest! {
        #[test]
        fn strings_without_at_are_rejected(raw in "[^@]*") {
            prop_assert!(validate(&raw).is_err());
        }

        #[test]
        fn empty_local_part_is_rejected(domain in "[a-z]{1,8}\\.[a-z]{2,4}") {
            let raw = format!("@{}", domain);
            prop_assert_eq!(validate(&raw), Err(InvalidEmail::EmptyLocalPart));
        }

        #[test]
        fn empty_domain_is_rejected(local in "[a-z0-9._]{1,12}") {
            let raw = format!("{}@", local);
            prop_assert_eq!(validate(&raw), Err(InvalidEmail::EmptyDomain));
        }

        #[test]
        fn shape_valid_input_round_trips_trimmed(
            local in "[a-zA-Z0-9._+-]{1,16}",
            host in "[a-z0-9-]{1,12}",
            tld in "[a-z]{2,6}",
            left in "[ \t]{0,3}",
            right in "[ \t\n]{0,3}",
        ) {
            let address = format!("{}@{}.{}", local, host, tld);
            let raw = format!("{}{}{}", left, address, right);
            let email = validate(&raw).expect("shape-valid input");
            prop_assert_eq!(email.as_str(), address.as_str());
        }
    }
}
