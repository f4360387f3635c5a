//! Boundary to the external signalling/media engine
//!
//! The engine performs the SIP registration handshake, the INVITE exchange
//! and media negotiation. The core only drives it through [`SignalingEngine`]
//! and learns about progress through the [`EngineNotificationSink`] it
//! installs. Engine calls are synchronous: they start an operation and return,
//! and the outcome arrives later as a notification, possibly from another
//! thread.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::address::{CustomHeader, SipUri};
use crate::classifier::{RawCallState, RawRegistrationState};
use crate::config::{AccountParams, EngineSettings};

/// Opaque reference to a call owned by the engine
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CallHandle(pub String);

impl CallHandle {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CallHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Failure reported synchronously by the engine
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct EngineError {
    pub message: String,
}

impl EngineError {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}

/// Lifecycle state of the engine itself
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GlobalState {
    Off,
    Startup,
    On,
    Shutdown,
    Configuring,
    Ready,
}

/// Media statistics of a running call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallStats {
    pub download_bandwidth_kbps: f32,
    pub upload_bandwidth_kbps: f32,
    pub jitter_buffer_ms: u32,
    /// Packets that arrived too late to be played, since the call started
    pub late_packets: u64,
}

/// Commands accepted by the signalling engine
pub trait SignalingEngine: Send + Sync {
    /// Create and start the engine core
    fn start(&self, settings: &EngineSettings) -> Result<(), EngineError>;

    /// Install the receiver of engine notifications
    fn register_notification_sink(&self, sink: Arc<dyn EngineNotificationSink>);

    /// Configure the account and start registering it
    fn register_account(&self, params: &AccountParams) -> Result<(), EngineError>;

    /// Send an INVITE to `address`
    fn originate_call(
        &self,
        address: &SipUri,
        headers: &[CustomHeader],
    ) -> Result<CallHandle, EngineError>;

    /// Terminate a call started with [`originate_call`](Self::originate_call)
    fn terminate_call(&self, handle: &CallHandle) -> Result<(), EngineError>;

    /// Mute or unmute the microphone of the current call
    fn set_microphone_muted(&self, muted: bool);

    /// Raw registration state of the default account
    fn current_registration_state(&self) -> RawRegistrationState;

    /// Stop the engine and release its resources
    fn shutdown(&self);
}

/// Notifications emitted by the signalling engine
///
/// Implementations must not block: notifications may arrive on an engine
/// thread.
pub trait EngineNotificationSink: Send + Sync {
    fn on_registration_state_changed(&self, state: RawRegistrationState, message: &str);

    /// `status` is the SIP response code behind the change, when known
    fn on_call_state_changed(
        &self,
        handle: &CallHandle,
        state: RawCallState,
        message: &str,
        status: Option<u16>,
    );

    fn on_network_reachable(&self, reachable: bool);

    fn on_call_stats_updated(&self, handle: &CallHandle, stats: CallStats);

    fn on_global_state_changed(&self, state: GlobalState, message: &str);
}
