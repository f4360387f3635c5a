//! Speaker and microphone controls

use tracing::info;

use super::CallController;
use crate::error::{SoftphoneError, SoftphoneResult};
use crate::events::DomainEvent;

impl CallController {
    /// Route audio to or away from the loudspeaker
    ///
    /// Returns the new speaker state. When the audio session refuses the new
    /// route the flag is left unchanged.
    pub fn toggle_speaker(&self) -> SoftphoneResult<bool> {
        let _route = self.route_lock.lock();
        let enabled = !self.state.lock().speaker_on;

        if let Err(e) = self.audio.set_speaker_output(enabled) {
            return self.fail(SoftphoneError::audio_session_failed(e));
        }

        {
            let mut state = self.state.lock();
            state.speaker_on = enabled;
            if let Some(session) = state.session.as_mut() {
                session.speaker_on = enabled;
            }
        }
        info!(speaker_on = enabled, "speaker toggled");
        self.bus.publish(DomainEvent::AudioRouteChanged { speaker_on: enabled });
        Ok(enabled)
    }

    /// Mute or unmute the microphone; returns whether it is now muted
    pub fn toggle_microphone(&self) -> bool {
        let (muted, initialized) = {
            let mut state = self.state.lock();
            state.mic_muted = !state.mic_muted;
            let muted = state.mic_muted;
            if let Some(session) = state.session.as_mut() {
                session.muted = muted;
            }
            (muted, state.config.is_some())
        };

        if initialized {
            self.engine.set_microphone_muted(muted);
        }
        info!(muted, "microphone toggled");
        self.bus.publish(DomainEvent::MicrophoneStateChanged { muted });
        muted
    }
}
