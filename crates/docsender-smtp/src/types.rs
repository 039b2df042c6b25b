//! Envelope address type.

use crate::error::{Error, Result};

/// Email address for the SMTP envelope.
///
/// Validation is intentionally shallow: the server is the authority on
/// deliverability, this type only rejects strings that cannot possibly
/// be addresses.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Address(String);

impl Address {
    /// Creates a new address from a string.
    ///
    /// # Errors
    ///
    /// Returns an error if the address is empty, lacks an `@`, or has
    /// an empty local or domain part.
    pub fn new(addr: impl Into<String>) -> Result<Self> {
        let addr = addr.into();
        let Some((local, domain)) = addr.split_once('@') else {
            return Err(Error::InvalidAddress(addr));
        };
        if local.is_empty() || domain.is_empty() || domain.contains('@') {
            return Err(Error::InvalidAddress(addr));
        }
        Ok(Self(addr))
    }

    /// Returns the address as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_address() {
        let addr = Address::new("user@example.com").unwrap();
        assert_eq!(addr.as_str(), "user@example.com");
    }

    #[test]
    fn rejects_missing_at() {
        assert!(Address::new("userexample.com").is_err());
    }

    #[test]
    fn rejects_empty() {
        assert!(Address::new("").is_err());
    }

    #[test]
    fn rejects_empty_local() {
        assert!(Address::new("@example.com").is_err());
    }

    #[test]
    fn rejects_empty_domain() {
        assert!(Address::new("user@").is_err());
    }

    #[test]
    fn rejects_double_at() {
        assert!(Address::new("user@host@example.com").is_err());
    }
}
