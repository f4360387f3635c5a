//! Scripted call against a simulated signalling engine
//!
//! Registers, places a call, lets it ring and connect, toggles the speaker and
//! microphone, then hangs up. Every domain event is logged.
//!
//! ```text
//! cargo run --example scripted_call
//! RUST_LOG=softphone_core=debug cargo run --example scripted_call
//! ```

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::info;

use softphone_core::config::{AccountParams, EngineSettings};
use softphone_core::logging::{setup_logging, LoggingConfig};
use softphone_core::{
    CallConfig, CallControllerBuilder, CallHandle, CustomHeader, DomainEvent, EngineError,
    EngineNotificationSink, EventBus, EventObserver, RawCallState, RawRegistrationState,
    RegistrationState, SignalingEngine, SipUri,
};

/// Engine that answers every request after a short delay
#[derive(Default)]
struct SimulatedEngine {
    sink: Mutex<Option<Arc<dyn EngineNotificationSink>>>,
    registration: Mutex<Option<RawRegistrationState>>,
    next_call: AtomicU32,
}

impl SimulatedEngine {
    fn notify_later(&self, delay: Duration, f: impl FnOnce(&dyn EngineNotificationSink) + Send + 'static) {
        if let Some(sink) = self.sink.lock().clone() {
            tokio::spawn(async move {
                tokio::time::sleep(delay).await;
                f(sink.as_ref());
            });
        }
    }
}

impl SignalingEngine for SimulatedEngine {
    fn start(&self, settings: &EngineSettings) -> Result<(), EngineError> {
        info!(user_agent = %settings.user_agent, codecs = settings.codecs.len(), "engine started");
        Ok(())
    }

    fn register_notification_sink(&self, sink: Arc<dyn EngineNotificationSink>) {
        *self.sink.lock() = Some(sink);
    }

    fn register_account(&self, params: &AccountParams) -> Result<(), EngineError> {
        info!(identity = %params.identity, proxy = %params.proxy, "registering");
        *self.registration.lock() = Some(RawRegistrationState::Ok);
        self.notify_later(Duration::from_millis(100), |sink| {
            sink.on_registration_state_changed(RawRegistrationState::Progress, "");
            sink.on_registration_state_changed(RawRegistrationState::Ok, "Registration successful");
        });
        Ok(())
    }

    fn originate_call(&self, address: &SipUri, headers: &[CustomHeader]) -> Result<CallHandle, EngineError> {
        let handle = CallHandle::new(format!("sim-{}", self.next_call.fetch_add(1, Ordering::SeqCst)));
        info!(to = %address, headers = headers.len(), handle = %handle, "INVITE sent");

        let ringing = handle.clone();
        self.notify_later(Duration::from_millis(300), move |sink| {
            sink.on_call_state_changed(&ringing, RawCallState::OutgoingRinging, "Ringing", Some(180));
        });
        let answered = handle.clone();
        self.notify_later(Duration::from_millis(800), move |sink| {
            sink.on_call_state_changed(&answered, RawCallState::Connected, "Connected", Some(200));
            sink.on_call_state_changed(&answered, RawCallState::StreamsRunning, "Streams running", None);
        });
        Ok(handle)
    }

    fn terminate_call(&self, handle: &CallHandle) -> Result<(), EngineError> {
        let ended = handle.clone();
        self.notify_later(Duration::from_millis(100), move |sink| {
            sink.on_call_state_changed(&ended, RawCallState::End, "Call terminated", None);
            sink.on_call_state_changed(&ended, RawCallState::Released, "Call released", None);
        });
        Ok(())
    }

    fn set_microphone_muted(&self, muted: bool) {
        info!(muted, "engine microphone");
    }

    fn current_registration_state(&self) -> RawRegistrationState {
        self.registration.lock().unwrap_or(RawRegistrationState::None)
    }

    fn shutdown(&self) {
        info!("engine shut down");
    }
}

struct LoggingObserver;

#[async_trait]
impl EventObserver for LoggingObserver {
    async fn handle_event(&self, event: DomainEvent) {
        info!(priority = ?event.priority(), "event: {event:?}");
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    setup_logging(LoggingConfig::default())?;

    let bus = EventBus::new();
    let observer = Arc::new(LoggingObserver);
    bus.subscribe(&observer);
    let mut events = bus.subscribe_events();

    let engine = Arc::new(SimulatedEngine::default());
    let controller = CallControllerBuilder::new(bus.clone(), engine).build();

    let config = CallConfig::new("1001", "secret", "pbx.example.com", "proxy.example.com", 443)
        .with_did_number("+15550100");
    controller.initialize(config)?;

    while let Ok(event) = events.recv().await {
        if event == DomainEvent::RegistrationStateChanged(RegistrationState::Ok) {
            break;
        }
    }

    let call_id = controller.place_call("1002")?;
    info!(call_id = %call_id, "call placed");

    tokio::time::sleep(Duration::from_secs(1)).await;
    controller.toggle_speaker()?;
    controller.toggle_microphone();
    tokio::time::sleep(Duration::from_millis(500)).await;

    controller.hangup()?;
    tokio::time::sleep(Duration::from_millis(300)).await;
    bus.flush().await;

    if let Some(session) = controller.last_session() {
        info!(
            end_reason = ?session.end_reason,
            talk_time_ms = session.talk_time().map(|d| d.num_milliseconds()),
            "call finished"
        );
    }

    controller.shutdown();
    Ok(())
}
