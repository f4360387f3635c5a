//! Session controller
//!
//! [`CallController`] owns the lifecycle of the single active call. It starts
//! the engine and registers the account, places and hangs up calls, toggles
//! speaker and microphone, and reacts to classified call states coming back
//! over the bus by driving the platform call bridge, the proximity sensor and
//! the call view.
//!
//! The operations are split across submodules:
//!
//! - [`builder`] - construction and collaborator injection
//! - `calls` - initialization, placing and ending calls
//! - `controls` - speaker and microphone toggles
//! - `events` - call state transitions correlated by engine call handle, and
//!   the bus observer updating the call view
//!
//! Public methods are synchronous hand-offs. Their outcome is observed
//! through events; failures are also returned.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use softphone_core::{CallConfig, CallControllerBuilder, EventBus};
//! # use softphone_core::engine::SignalingEngine;
//! # fn engine() -> Arc<dyn SignalingEngine> { unimplemented!() }
//!
//! # async fn run() -> softphone_core::SoftphoneResult<()> {
//! let bus = EventBus::new();
//! let controller = CallControllerBuilder::new(bus.clone(), engine()).build();
//!
//! controller.initialize(CallConfig::new("1001", "secret", "pbx.example.com", "proxy.example.com", 443))?;
//! // wait for RegistrationStateChanged(Ok) on the bus, then
//! let call_id = controller.place_call("1002")?;
//! # let _ = call_id;
//! # Ok(())
//! # }
//! ```

pub mod builder;
mod calls;
mod controls;
mod events;

pub use builder::CallControllerBuilder;

use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use tracing::{info, warn};

use crate::call::{CallId, CallState, Session};
use crate::config::CallConfig;
use crate::engine::SignalingEngine;
use crate::error::{SoftphoneError, SoftphoneResult};
use crate::events::{DelegateBridge, DomainEvent, EventBus, EventObserver, LegacyDelegate};
use crate::monitor::{AudioRouteListener, ReachabilityMonitor, ReachabilityProbe};
use crate::platform::{AudioRouter, CallUi, PlatformCallBridge, ProximityMonitor};

/// Mutable controller state, guarded by one lock
///
/// The lock is never held across an engine call or a collaborator callback.
#[derive(Default)]
struct ControllerState {
    /// Set once `initialize` succeeded
    config: Option<CallConfig>,
    session: Option<Session>,
    /// Sessions hung up locally whose end the engine has not confirmed yet
    hung_up: Vec<Session>,
    /// `hangup` arrived while the engine was still originating this call
    hangup_requested: Option<CallId>,
    /// Correlation id of the current call; outlives `session` after a local
    /// hangup until the engine confirms the end of the call, unless a new
    /// call is placed first
    call_id: Option<CallId>,
    call_state: CallState,
    last_session: Option<Session>,
    speaker_on: bool,
    mic_muted: bool,
    proximity_enabled: bool,
    ui: Option<Arc<dyn CallUi>>,
    delegate: Option<Arc<DelegateBridge>>,
    monitor: Option<ReachabilityMonitor>,
}

/// Controller of the single active call
pub struct CallController {
    bus: EventBus,
    engine: Arc<dyn SignalingEngine>,
    platform: Arc<dyn PlatformCallBridge>,
    audio: Arc<dyn AudioRouter>,
    proximity: Arc<dyn ProximityMonitor>,
    reachability_probe: Option<Arc<dyn ReachabilityProbe>>,
    state: Mutex<ControllerState>,
    /// Serializes speaker toggles across the audio router call
    route_lock: Mutex<()>,
    self_ref: Weak<CallController>,
}

impl CallController {
    /// The bus this controller publishes on
    pub fn event_bus(&self) -> &EventBus {
        &self.bus
    }

    /// Whether `initialize` has succeeded
    pub fn is_initialized(&self) -> bool {
        self.state.lock().config.is_some()
    }

    /// Whether the account is registered, as reported by the engine
    pub fn is_registered(&self) -> bool {
        self.is_initialized()
            && crate::classifier::classify_registration_state(
                self.engine.current_registration_state(),
                "",
            )
            .is_registered()
    }

    /// Last classified state of the current or most recent call
    pub fn current_call_state(&self) -> CallState {
        self.state.lock().call_state
    }

    /// Snapshot of the active session
    pub fn current_session(&self) -> Option<Session> {
        self.state.lock().session.clone()
    }

    /// Correlation id of the call in progress, if any
    pub fn current_call_id(&self) -> Option<CallId> {
        self.state.lock().call_id
    }

    /// Snapshot of the most recently finished session
    pub fn last_session(&self) -> Option<Session> {
        self.state.lock().last_session.clone()
    }

    pub fn is_speaker_on(&self) -> bool {
        self.state.lock().speaker_on
    }

    pub fn is_microphone_muted(&self) -> bool {
        self.state.lock().mic_muted
    }

    /// Subscribe an observer to the bus
    pub fn add_observer(&self, observer: &Arc<dyn EventObserver>) {
        self.bus.subscribe_shared(observer);
    }

    /// Unsubscribe an observer from the bus
    pub fn remove_observer(&self, observer: &Arc<dyn EventObserver>) {
        self.bus.unsubscribe_shared(observer);
    }

    /// Install, replace or remove the single-delegate callback receiver
    pub fn set_delegate(&self, delegate: Option<Arc<dyn LegacyDelegate>>) {
        let bridge = delegate.map(|d| DelegateBridge::attach(&self.bus, &d));
        let previous = std::mem::replace(&mut self.state.lock().delegate, bridge);
        if let Some(previous) = previous {
            self.bus.unsubscribe(&previous);
        }
    }

    /// Install or remove the call view
    pub fn set_call_ui(&self, ui: Option<Arc<dyn CallUi>>) {
        self.state.lock().ui = ui;
    }

    /// Listener to feed audio route change notifications into
    pub fn audio_route_listener(&self) -> AudioRouteListener {
        AudioRouteListener::new(self.bus.clone())
    }

    /// Tear everything down: stop monitoring, drop all observers, shut the
    /// engine down and reset local state
    ///
    /// The controller can be initialized again afterwards.
    pub fn shutdown(&self) {
        let (was_initialized, proximity_was_enabled) = {
            let mut state = self.state.lock();
            if let Some(monitor) = state.monitor.take() {
                monitor.stop();
            }
            let was_initialized = state.config.is_some();
            let proximity_was_enabled = state.proximity_enabled;
            let ui = state.ui.take();
            *state = ControllerState { ui, ..ControllerState::default() };
            (was_initialized, proximity_was_enabled)
        };

        self.bus.unsubscribe_all();
        if proximity_was_enabled {
            self.proximity.set_enabled(false);
        }
        if was_initialized {
            self.engine.shutdown();
        }
        info!("softphone controller shut down");
    }

    /// Publish `error` and return it
    fn fail<T>(&self, error: SoftphoneError) -> SoftphoneResult<T> {
        warn!(
            category = error.category(),
            detail = error.detail().unwrap_or_default(),
            "{error}"
        );
        self.bus.publish(DomainEvent::Error(error.clone()));
        Err(error)
    }

    /// Ensure this controller is subscribed to its bus
    fn ensure_subscribed(&self) {
        if let Some(me) = self.self_ref.upgrade() {
            self.bus.subscribe(&me);
        }
    }
}

impl std::fmt::Debug for CallController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("CallController")
            .field("initialized", &state.config.is_some())
            .field("call_id", &state.call_id)
            .field("call_state", &state.call_state)
            .field("speaker_on", &state.speaker_on)
            .field("mic_muted", &state.mic_muted)
            .finish()
    }
}
