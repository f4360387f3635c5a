//! Error types for the softphone core
//!
//! Every failure the core can report belongs to one closed taxonomy,
//! [`SoftphoneError`]. None of them is fatal to the process: the controller
//! publishes each one on the event bus as [`DomainEvent::Error`] and also
//! returns it to the caller, so observers (including the call UI) decide how
//! to present it.
//!
//! Errors coming from collaborators (the signalling engine, the platform audio
//! session) are translated at the boundary. The raw collaborator text is kept
//! as [`SoftphoneError::detail`], while [`SoftphoneError::kind`] drives
//! behaviour.
//!
//! # Example
//!
//! ```rust
//! use softphone_core::{ErrorKind, SoftphoneError};
//!
//! let err = SoftphoneError::call_creation_failed("503 Service Unavailable");
//! assert_eq!(err.kind(), ErrorKind::CallCreationFailed);
//! assert_eq!(err.to_string(), "Failed to create call");
//! assert_eq!(err.detail(), Some("503 Service Unavailable"));
//! ```
//!
//! [`DomainEvent::Error`]: crate::events::DomainEvent::Error

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for softphone operations
pub type SoftphoneResult<T> = Result<T, SoftphoneError>;

/// Closed set of failures surfaced by the core
///
/// The `Display` text is the short, user-facing message. Use
/// [`detail`](Self::detail) for the underlying diagnostic.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SoftphoneError {
    /// No engine has been initialized with a configuration yet
    #[error("SDK not initialized")]
    NotInitialized,

    /// The SIP account is not registered with the server
    #[error("SIP account not registered")]
    NotRegistered,

    /// The destination could not be turned into a SIP address
    #[error("Invalid destination address")]
    InvalidAddress { address: String },

    /// The call could not be created or failed while being set up
    #[error("Failed to create call")]
    CallCreationFailed { reason: String },

    /// The signalling engine could not be created or started
    #[error("Failed to setup signalling engine")]
    CoreSetupFailed { reason: String },

    /// The account registration could not be started or was refused
    #[error("SIP registration failed")]
    RegistrationFailed { reason: String },

    /// The platform audio session could not be configured
    #[error("Audio session error")]
    AudioSessionFailed { reason: String },

    /// The engine refused to terminate the call
    #[error("Failed to terminate call")]
    CallTerminationFailed { reason: String },
}

/// Discriminant of [`SoftphoneError`], convenient for matching and filtering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    NotInitialized,
    NotRegistered,
    InvalidAddress,
    CallCreationFailed,
    CoreSetupFailed,
    RegistrationFailed,
    AudioSessionFailed,
    CallTerminationFailed,
}

impl SoftphoneError {
    /// Create an invalid address error
    pub fn invalid_address(address: impl Into<String>) -> Self {
        Self::InvalidAddress { address: address.into() }
    }

    /// Create a call creation error
    pub fn call_creation_failed(reason: impl Into<String>) -> Self {
        Self::CallCreationFailed { reason: reason.into() }
    }

    /// Create an engine setup error
    pub fn core_setup_failed(reason: impl Into<String>) -> Self {
        Self::CoreSetupFailed { reason: reason.into() }
    }

    /// Create a registration error
    pub fn registration_failed(reason: impl Into<String>) -> Self {
        Self::RegistrationFailed { reason: reason.into() }
    }

    /// Create an audio session error
    pub fn audio_session_failed(reason: impl Into<String>) -> Self {
        Self::AudioSessionFailed { reason: reason.into() }
    }

    /// Create a call termination error
    pub fn call_termination_failed(reason: impl Into<String>) -> Self {
        Self::CallTerminationFailed { reason: reason.into() }
    }

    /// The kind of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            SoftphoneError::NotInitialized => ErrorKind::NotInitialized,
            SoftphoneError::NotRegistered => ErrorKind::NotRegistered,
            SoftphoneError::InvalidAddress { .. } => ErrorKind::InvalidAddress,
            SoftphoneError::CallCreationFailed { .. } => ErrorKind::CallCreationFailed,
            SoftphoneError::CoreSetupFailed { .. } => ErrorKind::CoreSetupFailed,
            SoftphoneError::RegistrationFailed { .. } => ErrorKind::RegistrationFailed,
            SoftphoneError::AudioSessionFailed { .. } => ErrorKind::AudioSessionFailed,
            SoftphoneError::CallTerminationFailed { .. } => ErrorKind::CallTerminationFailed,
        }
    }

    /// Raw diagnostic text carried by the error, if any
    pub fn detail(&self) -> Option<&str> {
        match self {
            SoftphoneError::NotInitialized | SoftphoneError::NotRegistered => None,
            SoftphoneError::InvalidAddress { address } => Some(address),
            SoftphoneError::CallCreationFailed { reason }
            | SoftphoneError::CoreSetupFailed { reason }
            | SoftphoneError::RegistrationFailed { reason }
            | SoftphoneError::AudioSessionFailed { reason }
            | SoftphoneError::CallTerminationFailed { reason } => Some(reason),
        }
    }

    /// Check if the error concerns a call attempt rather than the account
    pub fn is_call_error(&self) -> bool {
        matches!(
            self,
            SoftphoneError::InvalidAddress { .. }
                | SoftphoneError::CallCreationFailed { .. }
                | SoftphoneError::CallTerminationFailed { .. }
        )
    }

    /// Get error category for logging
    pub fn category(&self) -> &'static str {
        match self {
            SoftphoneError::NotInitialized | SoftphoneError::CoreSetupFailed { .. } => "setup",

            SoftphoneError::NotRegistered | SoftphoneError::RegistrationFailed { .. } => {
                "registration"
            }

            SoftphoneError::InvalidAddress { .. }
            | SoftphoneError::CallCreationFailed { .. }
            | SoftphoneError::CallTerminationFailed { .. } => "call",

            SoftphoneError::AudioSessionFailed { .. } => "audio",
        }
    }
}
