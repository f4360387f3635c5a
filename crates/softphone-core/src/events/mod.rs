//! Domain events and observers
//!
//! Everything that happens to the account or the current call is expressed as
//! a [`DomainEvent`]. Events are published on the [`EventBus`] and delivered to
//! every live [`EventObserver`].
//!
//! # Usage
//!
//! ```rust
//! use softphone_core::events::{DomainEvent, EventObserver};
//! use async_trait::async_trait;
//!
//! struct PrintingObserver;
//!
//! #[async_trait]
//! impl EventObserver for PrintingObserver {
//!     async fn handle_event(&self, event: DomainEvent) {
//!         println!("event: {event:?}");
//!     }
//! }
//! ```

pub mod bus;
pub mod delegate;

pub use bus::EventBus;
pub use delegate::{DelegateBridge, LegacyDelegate};

use async_trait::async_trait;

use crate::call::CallState;
use crate::error::SoftphoneError;
use crate::registration::RegistrationState;

/// A state change or failure observed by the core
///
/// One event is one atomic snapshot; consumers never see partial updates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomainEvent {
    /// The account registration changed
    RegistrationStateChanged(RegistrationState),
    /// The current call changed state
    CallStateChanged(CallState),
    /// An operation failed
    Error(SoftphoneError),
    /// Audio output was routed to or away from the loudspeaker
    AudioRouteChanged { speaker_on: bool },
    /// The microphone was muted or unmuted
    MicrophoneStateChanged { muted: bool },
    /// Network reachability changed
    NetworkStateChanged { reachable: bool },
}

/// Priority levels for domain events
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum EventPriority {
    /// Audio route and microphone changes
    Low,
    /// Call progress
    Normal,
    /// Registration and network changes, terminal call states
    High,
    /// Failures
    Critical,
}

impl DomainEvent {
    /// Get the priority of this event
    pub fn priority(&self) -> EventPriority {
        match self {
            DomainEvent::Error(_) => EventPriority::Critical,
            DomainEvent::RegistrationStateChanged(_) | DomainEvent::NetworkStateChanged { .. } => {
                EventPriority::High
            }
            DomainEvent::CallStateChanged(state) if state.is_terminal() => EventPriority::High,
            DomainEvent::CallStateChanged(_) => EventPriority::Normal,
            DomainEvent::AudioRouteChanged { .. } | DomainEvent::MicrophoneStateChanged { .. } => {
                EventPriority::Low
            }
        }
    }

    /// Short name used in log fields
    pub fn name(&self) -> &'static str {
        match self {
            DomainEvent::RegistrationStateChanged(_) => "registration_state_changed",
            DomainEvent::CallStateChanged(_) => "call_state_changed",
            DomainEvent::Error(_) => "error",
            DomainEvent::AudioRouteChanged { .. } => "audio_route_changed",
            DomainEvent::MicrophoneStateChanged { .. } => "microphone_state_changed",
            DomainEvent::NetworkStateChanged { .. } => "network_state_changed",
        }
    }
}

/// Receiver of domain events
///
/// Observers are held weakly by the bus. Dropping the last `Arc` to an
/// observer is enough to stop delivery to it.
#[async_trait]
pub trait EventObserver: Send + Sync {
    /// Handle one event
    ///
    /// Called from the bus delivery task, one event at a time and in publish
    /// order. Long-running work should be spawned.
    async fn handle_event(&self, event: DomainEvent);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priorities() {
        assert_eq!(
            DomainEvent::Error(SoftphoneError::NotRegistered).priority(),
            EventPriority::Critical
        );
        assert_eq!(
            DomainEvent::CallStateChanged(CallState::Busy).priority(),
            EventPriority::High
        );
        assert_eq!(
            DomainEvent::CallStateChanged(CallState::Ringing).priority(),
            EventPriority::Normal
        );
        assert_eq!(
            DomainEvent::MicrophoneStateChanged { muted: true }.priority(),
            EventPriority::Low
        );
        assert!(EventPriority::Critical > EventPriority::High);
    }
}
