//! Engine notification sink
//!
//! [`EngineListener`] is installed on the engine during initialization. It
//! runs every notification through the classifiers and publishes the result
//! on the bus. Call statistics and engine lifecycle changes are only logged.
//!
//! Call notifications carry the engine's call handle. When a `CallTracker`
//! is attached, it sees each classified notification first and decides
//! whether the call is still tracked; notifications for calls nobody tracks
//! any more are dropped instead of being published.

use std::sync::Weak;

use tracing::{debug, info, warn};

use crate::call::CallState;
use crate::classifier::{
    classify_call_state_with_status, classify_registration_state, RawCallState,
    RawRegistrationState,
};
use crate::engine::{CallHandle, CallStats, EngineNotificationSink, GlobalState};
use crate::error::SoftphoneError;
use crate::events::{DomainEvent, EventBus};
use crate::registration::RegistrationState;

/// Reason text of the error published when the network goes away
pub const NETWORK_UNREACHABLE: &str = "Network unreachable";

/// Owner of the call sessions, correlating engine call handles
pub(crate) trait CallTracker: Send + Sync {
    /// Apply a classified state reported for `handle`
    ///
    /// Returns `false` when the handle belongs to no tracked call.
    fn on_call_notification(&self, handle: &CallHandle, state: CallState) -> bool;
}

/// Translates engine notifications into domain events
#[derive(Debug, Clone)]
pub struct EngineListener {
    bus: EventBus,
    calls: Option<Weak<dyn CallTracker>>,
}

impl EngineListener {
    pub fn new(bus: EventBus) -> Self {
        Self { bus, calls: None }
    }

    pub(crate) fn with_tracker(bus: EventBus, calls: Weak<dyn CallTracker>) -> Self {
        Self { bus, calls: Some(calls) }
    }
}

impl EngineNotificationSink for EngineListener {
    fn on_registration_state_changed(&self, state: RawRegistrationState, message: &str) {
        let classified = classify_registration_state(state, message);
        match &classified {
            RegistrationState::Ok => info!("SIP registration successful"),
            RegistrationState::Failed(reason) => warn!(reason = %reason, "SIP registration failed"),
            other => debug!(raw = ?state, state = %other, "SIP registration state changed"),
        }
        self.bus.publish(DomainEvent::RegistrationStateChanged(classified));
    }

    fn on_call_state_changed(
        &self,
        handle: &CallHandle,
        state: RawCallState,
        message: &str,
        status: Option<u16>,
    ) {
        let classification = classify_call_state_with_status(state, message, status);
        info!(
            call = %handle,
            raw = ?state,
            status = ?status,
            message,
            state = %classification.state,
            "call state changed"
        );
        if let Some(calls) = self.calls.as_ref().and_then(Weak::upgrade) {
            if !calls.on_call_notification(handle, classification.state) {
                debug!(call = %handle, state = %classification.state, "notification for an untracked call dropped");
                return;
            }
        }
        for event in classification.into_events() {
            self.bus.publish(event);
        }
    }

    fn on_network_reachable(&self, reachable: bool) {
        self.bus.publish(DomainEvent::NetworkStateChanged { reachable });
        if reachable {
            info!("network reachable");
        } else {
            warn!("network unreachable");
            self.bus
                .publish(DomainEvent::Error(SoftphoneError::call_creation_failed(NETWORK_UNREACHABLE)));
        }
    }

    fn on_call_stats_updated(&self, handle: &CallHandle, stats: CallStats) {
        debug!(
            call = %handle,
            download_kbps = stats.download_bandwidth_kbps,
            upload_kbps = stats.upload_bandwidth_kbps,
            jitter_buffer_ms = stats.jitter_buffer_ms,
            late_packets = stats.late_packets,
            "call stats"
        );
    }

    fn on_global_state_changed(&self, state: GlobalState, message: &str) {
        if state == GlobalState::Shutdown {
            info!(message, "signalling engine shutting down");
        } else {
            debug!(state = ?state, message, "signalling engine state changed");
        }
    }
}
