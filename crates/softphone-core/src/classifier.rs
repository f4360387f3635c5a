//! Classification of raw engine notifications
//!
//! The signalling engine reports a large set of low-level states together with
//! a free-text reason. The functions here fold them into the closed
//! [`CallState`] and [`RegistrationState`] sets. They are pure and total.
//!
//! A failed call is split into three outcomes from its reason text: busy,
//! no answer, or a generic error. Only the generic error also produces a
//! [`SoftphoneError::CallCreationFailed`], which is published ahead of the
//! state change.

use serde::{Deserialize, Serialize};

use crate::call::CallState;
use crate::error::SoftphoneError;
use crate::events::DomainEvent;
use crate::registration::RegistrationState;

/// Call states as reported by the signalling engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RawCallState {
    Idle,
    IncomingReceived,
    PushIncomingReceived,
    OutgoingInit,
    OutgoingProgress,
    OutgoingRinging,
    OutgoingEarlyMedia,
    Connected,
    StreamsRunning,
    Pausing,
    Paused,
    Resuming,
    Referred,
    Error,
    End,
    PausedByRemote,
    UpdatedByRemote,
    IncomingEarlyMedia,
    Updating,
    Released,
    EarlyUpdatedByRemote,
    EarlyUpdating,
}

/// Registration states as reported by the signalling engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RawRegistrationState {
    None,
    Progress,
    Ok,
    Cleared,
    Failed,
    Refreshing,
}

/// Result of classifying one call notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallClassification {
    pub state: CallState,
    /// Error published before the state change, set only for generic errors
    pub error: Option<SoftphoneError>,
}

impl CallClassification {
    fn state(state: CallState) -> Self {
        Self { state, error: None }
    }

    /// The events to publish, in publish order
    pub fn into_events(self) -> Vec<DomainEvent> {
        let mut events = Vec::with_capacity(2);
        if let Some(error) = self.error {
            events.push(DomainEvent::Error(error));
        }
        events.push(DomainEvent::CallStateChanged(self.state));
        events
    }
}

/// Classify a call notification from its raw state and reason text
pub fn classify_call_state(raw: RawCallState, reason: &str) -> CallClassification {
    match raw {
        RawCallState::OutgoingInit
        | RawCallState::OutgoingProgress
        | RawCallState::OutgoingEarlyMedia => CallClassification::state(CallState::Calling),
        RawCallState::OutgoingRinging => CallClassification::state(CallState::Ringing),
        RawCallState::Connected | RawCallState::StreamsRunning => {
            CallClassification::state(CallState::Connected)
        }
        RawCallState::End | RawCallState::Released => CallClassification::state(CallState::Ended),
        RawCallState::Error => classify_failure_text(reason),
        _ => CallClassification::state(CallState::Idle),
    }
}

/// Classify a call notification, preferring a SIP status code when present
///
/// For failed calls, 486 and 600 mean busy, 408 and 480 mean no answer.
/// Any other code falls back to matching the reason text.
pub fn classify_call_state_with_status(
    raw: RawCallState,
    reason: &str,
    status: Option<u16>,
) -> CallClassification {
    if raw != RawCallState::Error {
        return classify_call_state(raw, reason);
    }
    match status {
        Some(486) | Some(600) => CallClassification::state(CallState::Busy),
        Some(408) | Some(480) => CallClassification::state(CallState::NoAnswer),
        _ => classify_failure_text(reason),
    }
}

fn classify_failure_text(reason: &str) -> CallClassification {
    let lowered = reason.to_lowercase();
    if lowered.contains("busy") {
        CallClassification::state(CallState::Busy)
    } else if lowered.contains("timeout") {
        CallClassification::state(CallState::NoAnswer)
    } else {
        CallClassification {
            state: CallState::Error,
            error: Some(SoftphoneError::call_creation_failed(reason)),
        }
    }
}

/// Classify a registration notification
pub fn classify_registration_state(raw: RawRegistrationState, message: &str) -> RegistrationState {
    match raw {
        RawRegistrationState::Ok => RegistrationState::Ok,
        RawRegistrationState::Failed => RegistrationState::failed(message),
        RawRegistrationState::Progress => RegistrationState::Progress,
        RawRegistrationState::Cleared => RegistrationState::Cleared,
        _ => RegistrationState::None,
    }
}
