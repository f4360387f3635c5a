//! Host platform collaborators
//!
//! The controller never talks to the operating system directly. The native
//! call-management subsystem, the audio session, the proximity sensor and the
//! on-screen call view are reached through the traits in this module.
//! [`Headless`] implements all of them as no-ops for hosts without a UI.

use serde::{Deserialize, Serialize};

use crate::call::CallId;
use crate::error::SoftphoneError;

/// Why a call reported to the platform ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EndedReason {
    RemoteEnded,
    Failed,
}

/// The OS call-management subsystem (native call UI, call history)
pub trait PlatformCallBridge: Send + Sync {
    /// An outgoing call started connecting
    fn report_outgoing_started(&self, id: CallId);

    /// The outgoing call was answered
    fn report_connected(&self, id: CallId);

    /// The call ended
    fn report_ended(&self, id: CallId, reason: EndedReason);
}

/// The platform audio session
pub trait AudioRouter: Send + Sync {
    /// Configure the session for a voice call
    fn activate_voice_session(&self) -> Result<(), String>;

    /// Route output to the loudspeaker, or back to the default route
    fn set_speaker_output(&self, enabled: bool) -> Result<(), String>;
}

/// The proximity sensor that blanks the screen during a call
pub trait ProximityMonitor: Send + Sync {
    fn set_enabled(&self, enabled: bool);
}

/// On-screen call view
///
/// Buttons are updated with their *enabled* state: the microphone button is
/// enabled when the microphone is live.
pub trait CallUi: Send + Sync {
    /// Present the view for a call to `destination`
    fn show_call(&self, destination: &str);

    fn update_speaker_button(&self, enabled: bool);

    fn update_mic_button(&self, enabled: bool);

    /// Show the status line of the call ("Calling…", "User Busy", ...)
    fn update_status(&self, status: &str) {
        let _ = status;
    }

    /// Present a failure to the user
    fn present_error(&self, error: &SoftphoneError) {
        let _ = error;
    }

    /// Close the call view
    fn dismiss(&self);
}

/// No-op implementation of every platform collaborator
#[derive(Debug, Clone, Copy, Default)]
pub struct Headless;

impl PlatformCallBridge for Headless {
    fn report_outgoing_started(&self, _id: CallId) {}

    fn report_connected(&self, _id: CallId) {}

    fn report_ended(&self, _id: CallId, _reason: EndedReason) {}
}

impl AudioRouter for Headless {
    fn activate_voice_session(&self) -> Result<(), String> {
        Ok(())
    }

    fn set_speaker_output(&self, _enabled: bool) -> Result<(), String> {
        Ok(())
    }
}

impl ProximityMonitor for Headless {
    fn set_enabled(&self, _enabled: bool) {}
}

impl CallUi for Headless {
    fn show_call(&self, _destination: &str) {}

    fn update_speaker_button(&self, _enabled: bool) {}

    fn update_mic_button(&self, _enabled: bool) {}

    fn dismiss(&self) {}
}
