//! Remote address construction

use crate::error::{SoftphoneError, SoftphoneResult};

/// Name of the header carrying the caller DID
pub const DID_HEADER: &str = "X-DID";

/// A `sip:` address built from a dialled destination
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SipUri {
    user: String,
    host: String,
}

impl SipUri {
    /// Build `sip:<destination>@<domain>`
    ///
    /// The destination must be a non-empty user part made of unreserved
    /// characters (letters, digits, `+`, `-`, `.`, `_`, `*`, `#`). A full
    /// `sip:` address is not accepted as destination.
    pub fn for_destination(destination: &str, domain: &str) -> SoftphoneResult<Self> {
        let user = destination.trim();
        let invalid = || SoftphoneError::invalid_address(format!("sip:{user}@{domain}"));

        if user.is_empty() || !user.chars().all(is_user_char) {
            return Err(invalid());
        }
        if domain.is_empty() || !domain.chars().all(is_host_char) {
            return Err(invalid());
        }

        Ok(Self { user: user.to_string(), host: domain.to_string() })
    }

    pub fn user(&self) -> &str {
        &self.user
    }

    pub fn host(&self) -> &str {
        &self.host
    }
}

impl std::fmt::Display for SipUri {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "sip:{}@{}", self.user, self.host)
    }
}

fn is_user_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.' | '_' | '*' | '#')
}

fn is_host_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '-' | '.' | ':' | '[' | ']')
}

/// Extra header attached to an outgoing INVITE
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomHeader {
    pub name: String,
    pub value: String,
}

impl CustomHeader {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self { name: name.into(), value: value.into() }
    }

    pub fn did(number: impl Into<String>) -> Self {
        Self::new(DID_HEADER, number)
    }
}
