//! Call state model
//!
//! [`CallState`] is the closed set of application-level call states that the
//! classifier produces and the controller tracks. [`Session`] is the single
//! in-flight call owned by the controller.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::engine::CallHandle;

/// Correlation id of a call, shared with the platform call-management bridge
pub type CallId = Uuid;

/// Application-level state of the current call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CallState {
    /// No call activity
    #[default]
    Idle,
    /// Outgoing call is being set up (INVITE sent, progress, early media)
    Calling,
    /// Remote party is ringing
    Ringing,
    /// Call answered and media is flowing
    Connected,
    /// Call finished normally
    Ended,
    /// Call failed for a reason other than busy / no answer
    Error,
    /// Remote party is busy
    Busy,
    /// Remote party did not answer in time
    NoAnswer,
    /// Call not owned by this client
    Unowned,
}

impl CallState {
    /// Check if this state ends a session instance
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            CallState::Ended | CallState::Error | CallState::Busy | CallState::NoAnswer
        )
    }

    /// Check if the call is established
    pub fn is_active(&self) -> bool {
        matches!(self, CallState::Connected)
    }

    /// Status line shown by a call view; `None` while the call timer is shown
    pub fn status_text(&self) -> Option<&'static str> {
        match self {
            CallState::Idle => Some("Ready"),
            CallState::Calling => Some("Calling…"),
            CallState::Ringing => Some("Ringing…"),
            CallState::Connected => None,
            CallState::Ended => Some("Call Ended"),
            CallState::Error => Some("Call Failed"),
            CallState::Busy | CallState::Unowned => Some("User Busy"),
            CallState::NoAnswer => Some("No Answer"),
        }
    }
}

impl std::fmt::Display for CallState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            CallState::Idle => "idle",
            CallState::Calling => "calling",
            CallState::Ringing => "ringing",
            CallState::Connected => "connected",
            CallState::Ended => "ended",
            CallState::Error => "error",
            CallState::Busy => "busy",
            CallState::NoAnswer => "no-answer",
            CallState::Unowned => "unowned",
        };
        f.write_str(name)
    }
}

/// Why a session finished
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EndReason {
    /// Either side hung up after a normal call
    Completed,
    /// The call failed
    Failed,
    /// The callee was busy
    Busy,
    /// The callee did not answer
    NoAnswer,
}

impl EndReason {
    /// Map a terminal call state to its end reason
    pub fn from_terminal_state(state: CallState) -> Option<Self> {
        match state {
            CallState::Ended => Some(EndReason::Completed),
            CallState::Error => Some(EndReason::Failed),
            CallState::Busy => Some(EndReason::Busy),
            CallState::NoAnswer => Some(EndReason::NoAnswer),
            _ => None,
        }
    }
}

/// The single in-flight call
#[derive(Debug, Clone)]
pub struct Session {
    /// Correlation id shared with the platform bridge
    pub id: CallId,
    /// Destination as dialled by the user (extension or number)
    pub destination: String,
    /// Canonical remote SIP address
    pub remote_uri: String,
    /// Handle returned by the engine once the call was originated
    pub handle: Option<CallHandle>,
    /// Current state
    pub state: CallState,
    /// Whether the microphone is muted
    pub muted: bool,
    /// Whether audio is routed to the loudspeaker
    pub speaker_on: bool,
    /// When the session was created
    pub created_at: DateTime<Utc>,
    /// When the call was answered
    pub started_at: Option<DateTime<Utc>>,
    /// When the call reached a terminal state
    pub ended_at: Option<DateTime<Utc>>,
    /// Why the call ended
    pub end_reason: Option<EndReason>,
}

impl Session {
    pub(crate) fn new(id: CallId, destination: String, remote_uri: String) -> Self {
        Self {
            id,
            destination,
            remote_uri,
            handle: None,
            state: CallState::Calling,
            muted: false,
            speaker_on: false,
            created_at: Utc::now(),
            started_at: None,
            ended_at: None,
            end_reason: None,
        }
    }

    /// Apply a classified state to the session, stamping start and end times
    ///
    /// Returns `false` when the session already is in `state`.
    pub(crate) fn apply(&mut self, state: CallState) -> bool {
        if self.state == state {
            return false;
        }
        self.state = state;
        if state == CallState::Connected && self.started_at.is_none() {
            self.started_at = Some(Utc::now());
        }
        if let Some(reason) = EndReason::from_terminal_state(state) {
            self.ended_at = Some(Utc::now());
            self.end_reason = Some(reason);
        }
        true
    }

    /// Duration of the answered part of the call, if it was answered
    pub fn talk_time(&self) -> Option<chrono::Duration> {
        let started = self.started_at?;
        Some(self.ended_at.unwrap_or_else(Utc::now) - started)
    }
}
