//! Initialization and call lifecycle operations

use std::sync::{Arc, Weak};

use tracing::{debug, info, warn};

use super::events::show_status;
use super::CallController;
use crate::address::{CustomHeader, SipUri};
use crate::call::{CallId, CallState, Session};
use crate::config::{AccountParams, CallConfig, EngineSettings};
use crate::error::{SoftphoneError, SoftphoneResult};
use crate::events::DomainEvent;
use crate::engine::CallHandle;
use crate::listener::{CallTracker, EngineListener};
use crate::monitor::{ReachabilityMonitor, ReachabilityProbe, TcpConnectProbe};

impl CallController {
    /// Start the engine and register the account described by `config`
    ///
    /// Registration completes asynchronously; watch for
    /// `RegistrationStateChanged` on the bus. Calling this again re-applies
    /// the new configuration.
    pub fn initialize(&self, config: CallConfig) -> SoftphoneResult<()> {
        if let Err(e) = config.validate() {
            return self.fail(e);
        }

        if let Err(e) = self.audio.activate_voice_session() {
            return self.fail(SoftphoneError::audio_session_failed(e));
        }

        if let Err(e) = self.engine.start(&EngineSettings::default()) {
            return self.fail(SoftphoneError::core_setup_failed(e.message));
        }
        let calls: Weak<dyn CallTracker> = self.self_ref.clone();
        self.engine
            .register_notification_sink(Arc::new(EngineListener::with_tracker(self.bus.clone(), calls)));

        if let Err(e) = self.engine.register_account(&AccountParams::from_config(&config)) {
            return self.fail(SoftphoneError::registration_failed(e.message));
        }

        self.ensure_subscribed();

        let monitor = config.reachability_interval.map(|period| {
            let probe: Arc<dyn ReachabilityProbe> = match &self.reachability_probe {
                Some(probe) => probe.clone(),
                None => Arc::new(TcpConnectProbe::new(config.proxy_socket_addr())),
            };
            ReachabilityMonitor::spawn(probe, self.bus.clone(), period)
        });

        info!(
            identity = %config.identity_uri(),
            proxy = %config.proxy_uri(),
            "softphone initialized"
        );

        let previous = {
            let mut state = self.state.lock();
            state.config = Some(config);
            std::mem::replace(&mut state.monitor, monitor)
        };
        if let Some(previous) = previous {
            previous.stop();
        }
        Ok(())
    }

    /// Place an outgoing call to `destination` (an extension or number)
    ///
    /// Fails without creating a session unless the engine is initialized and
    /// the account registered, and while another call is in progress.
    pub fn place_call(&self, destination: &str) -> SoftphoneResult<CallId> {
        if !self.is_initialized() {
            return self.fail(SoftphoneError::NotInitialized);
        }
        if !self.is_registered() {
            return self.fail(SoftphoneError::NotRegistered);
        }
        self.start_call(destination, CallId::new_v4())
    }

    /// End the current call
    ///
    /// Without a session this is a no-op. The correlation id is kept until
    /// the engine confirms the end of the call. A hangup that arrives while
    /// the engine is still originating the call is carried out as soon as
    /// the engine hands the call over.
    pub fn hangup(&self) -> SoftphoneResult<()> {
        let (call_id, handle) = {
            let mut state = self.state.lock();
            let state = &mut *state;
            let Some(session) = state.session.as_ref() else {
                debug!("hangup without an active call");
                return Ok(());
            };
            let call_id = session.id;
            match session.handle.clone() {
                Some(handle) => (call_id, handle),
                None => {
                    state.hangup_requested = Some(call_id);
                    info!(call_id = %call_id, "hangup deferred until the call is originated");
                    return Ok(());
                }
            }
        };
        self.terminate(call_id, &handle)
    }

    /// The platform asked to start a call, under its own correlation id
    pub fn handle_platform_start(&self, destination: &str, id: CallId) -> SoftphoneResult<CallId> {
        info!(call_id = %id, destination, "platform requested call start");
        self.start_call(destination, id)
    }

    /// The platform asked to end the call `id`
    ///
    /// Requests for a call other than the current one are ignored.
    pub fn handle_platform_end(&self, id: CallId) -> SoftphoneResult<()> {
        if self.current_call_id() != Some(id) {
            debug!(call_id = %id, "platform end request for unknown call ignored");
            return Ok(());
        }
        info!(call_id = %id, "platform requested call end");
        self.hangup()
    }

    /// Ask the engine to end `handle` and set the session aside until the
    /// engine confirms
    fn terminate(&self, call_id: CallId, handle: &CallHandle) -> SoftphoneResult<()> {
        if let Err(e) = self.engine.terminate_call(handle) {
            return self.fail(SoftphoneError::call_termination_failed(e.message));
        }

        let mut state = self.state.lock();
        if state.session.as_ref().is_some_and(|s| s.id == call_id) {
            if let Some(session) = state.session.take() {
                state.hung_up.push(session);
            }
        }
        info!(call_id = %call_id, handle = %handle, "call hung up");
        Ok(())
    }

    fn start_call(&self, destination: &str, id: CallId) -> SoftphoneResult<CallId> {
        let Some(config) = self.state.lock().config.clone() else {
            return self.fail(SoftphoneError::NotInitialized);
        };

        let address = match SipUri::for_destination(destination, &config.domain) {
            Ok(address) => address,
            Err(e) => return self.fail(e),
        };
        let headers: Vec<CustomHeader> =
            config.did_number.iter().map(|did| CustomHeader::did(did.clone())).collect();

        let ui = {
            let mut state = self.state.lock();
            if let Some(active_id) = state.session.as_ref().map(|s| s.id) {
                drop(state);
                return self.fail(SoftphoneError::call_creation_failed(format!(
                    "call {active_id} already in progress"
                )));
            }
            state.session =
                Some(Session::new(id, destination.trim().to_string(), address.to_string()));
            state.call_id = Some(id);
            state.call_state = CallState::Calling;
            state.ui.clone()
        };

        if let Some(ui) = &ui {
            ui.show_call(destination.trim());
            show_status(ui.as_ref(), CallState::Calling);
        }

        let handle = match self.engine.originate_call(&address, &headers) {
            Ok(handle) => handle,
            Err(e) => {
                {
                    let mut state = self.state.lock();
                    if state.session.as_ref().is_some_and(|s| s.id == id) {
                        state.session = None;
                        state.call_id = None;
                        state.call_state = CallState::Idle;
                    }
                    if state.hangup_requested == Some(id) {
                        state.hangup_requested = None;
                    }
                }
                if let Some(ui) = &ui {
                    ui.dismiss();
                }
                return self.fail(SoftphoneError::call_creation_failed(e.message));
            }
        };

        let outcome = {
            let mut state = self.state.lock();
            let state = &mut *state;
            match state.session.as_mut().filter(|s| s.id == id) {
                Some(session) => {
                    session.handle = Some(handle.clone());
                    if state.hangup_requested == Some(id) {
                        state.hangup_requested = None;
                        Originated::HangupRequested
                    } else {
                        Originated::Started
                    }
                }
                None if state
                    .hung_up
                    .iter()
                    .chain(state.last_session.iter())
                    .any(|s| s.id == id) =>
                {
                    Originated::AlreadyEnded
                }
                None => Originated::Discarded,
            }
        };

        match outcome {
            Originated::Started | Originated::HangupRequested => {
                info!(call_id = %id, remote = %address, handle = %handle, "outgoing call started");
                self.platform.report_outgoing_started(id);
                if self.advance(id, CallState::Calling) {
                    self.bus.publish(DomainEvent::CallStateChanged(CallState::Calling));
                }
                if outcome == Originated::HangupRequested {
                    // a rejection is published by terminate
                    let _ = self.terminate(id, &handle);
                }
                Ok(id)
            }
            Originated::AlreadyEnded => {
                debug!(call_id = %id, handle = %handle, "call ended while it was being originated");
                Ok(id)
            }
            Originated::Discarded => {
                warn!(call_id = %id, handle = %handle, "session discarded while originating, terminating call");
                if let Err(e) = self.engine.terminate_call(&handle) {
                    warn!(call_id = %id, error = %e, "terminating the discarded call failed");
                }
                self.fail(SoftphoneError::call_creation_failed(format!(
                    "call {id} was discarded before the engine accepted it"
                )))
            }
        }
    }
}

/// What `start_call` found once the engine accepted the call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Originated {
    Started,
    HangupRequested,
    AlreadyEnded,
    Discarded,
}
