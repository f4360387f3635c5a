//! Registration state model

use serde::{Deserialize, Serialize};

/// Text used when the engine reports a failure without a message
pub const UNKNOWN_FAILURE: &str = "unknown registration failure";

/// State of the SIP account registration
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum RegistrationState {
    /// No registration attempted
    #[default]
    None,
    /// REGISTER sent, waiting for the final response
    Progress,
    /// Registered with the server
    Ok,
    /// Registration removed
    Cleared,
    /// Registration refused or timed out; always carries a diagnostic
    Failed(String),
}

impl RegistrationState {
    /// Build a `Failed` state, substituting a fixed text for an empty message
    pub fn failed(reason: impl Into<String>) -> Self {
        let reason = reason.into();
        if reason.trim().is_empty() {
            RegistrationState::Failed(UNKNOWN_FAILURE.to_string())
        } else {
            RegistrationState::Failed(reason)
        }
    }

    /// Check if the account is registered
    pub fn is_registered(&self) -> bool {
        matches!(self, RegistrationState::Ok)
    }
}

impl std::fmt::Display for RegistrationState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RegistrationState::None => f.write_str("none"),
            RegistrationState::Progress => f.write_str("progress"),
            RegistrationState::Ok => f.write_str("ok"),
            RegistrationState::Cleared => f.write_str("cleared"),
            RegistrationState::Failed(reason) => write!(f, "failed ({reason})"),
        }
    }
}
