//! Side effects of call state changes and bus events
//!
//! Engine call notifications reach the controller through `CallTracker`,
//! tagged with the engine's call handle, before they are published. The
//! handle decides which session a notification belongs to, so a late end of
//! a call that was already hung up never touches the call placed after it.
//! Errors and audio events are picked up from the bus.

use async_trait::async_trait;
use tracing::{debug, info, warn};

use super::{CallController, ControllerState};
use crate::call::{CallId, CallState, EndReason};
use crate::engine::CallHandle;
use crate::events::{DomainEvent, EventObserver};
use crate::listener::CallTracker;
use crate::platform::{CallUi, EndedReason};

/// Session an engine notification belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Target {
    /// The active session
    Active(CallId),
    /// A session hung up locally, waiting for the engine to end it
    HungUp(CallId),
    /// Nothing tracked; the call already finished or was never ours
    Untracked,
}

impl ControllerState {
    fn correlate(&mut self, handle: &CallHandle) -> Target {
        if let Some(session) = &self.session {
            if session.handle.as_ref() == Some(handle) {
                return Target::Active(session.id);
            }
        }
        if let Some(session) = self.hung_up.iter().find(|s| s.handle.as_ref() == Some(handle)) {
            return Target::HungUp(session.id);
        }
        if self.last_session.as_ref().is_some_and(|s| s.handle.as_ref() == Some(handle)) {
            return Target::Untracked;
        }
        // the engine may report on a call before originate_call returned
        if let Some(session) = self.session.as_mut().filter(|s| s.handle.is_none()) {
            session.handle = Some(handle.clone());
            return Target::Active(session.id);
        }
        Target::Untracked
    }
}

/// Show the status line of `state`, if it has one
pub(super) fn show_status(ui: &dyn CallUi, state: CallState) {
    if let Some(text) = state.status_text() {
        ui.update_status(text);
    }
}

impl CallTracker for CallController {
    fn on_call_notification(&self, handle: &CallHandle, state: CallState) -> bool {
        let target = self.state.lock().correlate(handle);
        match target {
            Target::Active(id) => self.advance(id, state),
            Target::HungUp(id) if state.is_terminal() => self.advance(id, state),
            Target::HungUp(id) => {
                debug!(call_id = %id, state = %state, "call already hung up");
                false
            }
            Target::Untracked => false,
        }
    }
}

#[async_trait]
impl EventObserver for CallController {
    async fn handle_event(&self, event: DomainEvent) {
        match event {
            DomainEvent::CallStateChanged(state) => {
                debug!(state = %state, "call state observed");
            }
            DomainEvent::Error(error) => {
                debug!(category = error.category(), "presenting error");
                let ui = self.state.lock().ui.clone();
                if let Some(ui) = ui {
                    ui.present_error(&error);
                }
            }
            DomainEvent::AudioRouteChanged { speaker_on } => {
                let ui = self.state.lock().ui.clone();
                if let Some(ui) = ui {
                    ui.update_speaker_button(speaker_on);
                }
            }
            DomainEvent::MicrophoneStateChanged { muted } => {
                let ui = self.state.lock().ui.clone();
                if let Some(ui) = ui {
                    ui.update_mic_button(!muted);
                }
            }
            DomainEvent::RegistrationStateChanged(state) => {
                debug!(state = %state, "registration state observed");
            }
            DomainEvent::NetworkStateChanged { reachable } => {
                debug!(reachable, "network state observed");
            }
        }
    }
}

impl CallController {
    /// Move call `id` to `state` and run the side effects of the transition
    ///
    /// Returns whether `id` is the current call, i.e. whether the change is
    /// worth publishing.
    pub(super) fn advance(&self, id: CallId, state: CallState) -> bool {
        let (current, changed, enable_proximity, ui) = {
            let mut guard = self.state.lock();
            let current = guard.call_id == Some(id);
            let changed = current && guard.call_state != state;
            if current {
                guard.call_state = state;
            }
            if let Some(session) = guard.session.as_mut().filter(|s| s.id == id) {
                session.apply(state);
            }
            let enable_proximity = current && state == CallState::Calling && !guard.proximity_enabled;
            if enable_proximity {
                guard.proximity_enabled = true;
            }
            (current, changed, enable_proximity, guard.ui.clone())
        };

        if changed {
            if let Some(ui) = &ui {
                show_status(ui.as_ref(), state);
            }
        }

        match state {
            CallState::Calling if enable_proximity => self.proximity.set_enabled(true),
            CallState::Connected if changed => {
                info!(call_id = %id, "call connected");
                self.platform.report_connected(id);
            }
            CallState::Ended => {
                info!(call_id = %id, "call ended");
                self.platform.report_ended(id, EndedReason::RemoteEnded);
                self.release_call(id, state);
            }
            CallState::Error | CallState::Busy | CallState::NoAnswer => {
                warn!(call_id = %id, state = %state, "call failed");
                self.platform.report_ended(id, EndedReason::Failed);
                self.release_call(id, state);
            }
            _ => {}
        }
        current
    }

    /// Finish session `id`; if it is the current call, also undo the
    /// call-scoped side effects
    fn release_call(&self, id: CallId, terminal: CallState) {
        let (ui, disable_proximity) = {
            let mut guard = self.state.lock();
            let guard = &mut *guard;
            let finished = if guard.session.as_ref().is_some_and(|s| s.id == id) {
                guard.session.take()
            } else {
                guard
                    .hung_up
                    .iter()
                    .position(|s| s.id == id)
                    .map(|i| guard.hung_up.remove(i))
            };
            if let Some(mut session) = finished {
                session.apply(terminal);
                guard.last_session = Some(session);
            }
            if guard.hangup_requested == Some(id) {
                guard.hangup_requested = None;
            }
            if guard.call_id != Some(id) {
                debug!(call_id = %id, "earlier call finished");
                return;
            }
            guard.call_id = None;
            let disable_proximity = std::mem::take(&mut guard.proximity_enabled);
            (guard.ui.clone(), disable_proximity)
        };

        if disable_proximity {
            self.proximity.set_enabled(false);
        }
        if let Some(ui) = ui {
            ui.dismiss();
        }
        debug!(end_reason = ?EndReason::from_terminal_state(terminal), "call released");
    }
}
