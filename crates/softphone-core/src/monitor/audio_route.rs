//! Audio route change listener

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::events::{DomainEvent, EventBus};

/// Why the platform changed the audio route
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RouteChangeReason {
    NewDeviceAvailable,
    OldDeviceUnavailable,
    CategoryChange,
    /// The output was explicitly overridden (speaker toggled)
    Override,
    WakeFromSleep,
    NoSuitableRouteForCategory,
    RouteConfigurationChange,
    Unknown,
}

/// Receives route change notifications from the host audio session
///
/// Only explicit overrides are published; device arrivals and category
/// changes are logged.
#[derive(Debug, Clone)]
pub struct AudioRouteListener {
    bus: EventBus,
}

impl AudioRouteListener {
    pub fn new(bus: EventBus) -> Self {
        Self { bus }
    }

    /// Handle one route change; `speaker_active` is whether the built-in
    /// loudspeaker is among the current outputs
    pub fn on_route_change(&self, reason: RouteChangeReason, speaker_active: bool) {
        match reason {
            RouteChangeReason::Override => {
                debug!(speaker_active, "audio route overridden");
                self.bus.publish(DomainEvent::AudioRouteChanged { speaker_on: speaker_active });
            }
            other => debug!(reason = ?other, speaker_active, "audio route changed"),
        }
    }
}
