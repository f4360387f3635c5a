//! Shared test doubles for the integration tests
#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Barrier};

use async_trait::async_trait;
use parking_lot::Mutex;

use softphone_core::config::{AccountParams, EngineSettings};
use softphone_core::{
    AudioRouter, CallConfig, CallController, CallControllerBuilder, CallHandle, CallId, CallUi,
    CustomHeader, DomainEvent, EndedReason, EngineError, EngineNotificationSink, ErrorKind,
    EventBus, EventObserver, PlatformCallBridge, ProximityMonitor, RawCallState,
    RawRegistrationState, SignalingEngine, SipUri, SoftphoneError,
};

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("softphone_core=debug")
        .with_test_writer()
        .try_init();
}

pub fn test_config() -> CallConfig {
    CallConfig::new("1001", "secret", "pbx.example.com", "proxy.example.com", 443)
        .with_did_number("+15550100")
}

/// Scriptable signalling engine
pub struct MockEngine {
    sink: Mutex<Option<Arc<dyn EngineNotificationSink>>>,
    registration: Mutex<RawRegistrationState>,
    auto_register: AtomicBool,
    pub started: Mutex<Option<EngineSettings>>,
    pub account: Mutex<Option<AccountParams>>,
    pub originated: Mutex<Vec<(String, Vec<CustomHeader>)>>,
    pub terminated: Mutex<Vec<CallHandle>>,
    pub muted: Mutex<Vec<bool>>,
    pub shutdown_called: AtomicBool,
    pub fail_start: Mutex<Option<String>>,
    pub fail_register: Mutex<Option<String>>,
    pub fail_originate: Mutex<Option<String>>,
    pub fail_terminate: Mutex<Option<String>>,
    originate_gate: Mutex<Option<OriginateGate>>,
    next_handle: AtomicU32,
}

/// Holds `originate_call` until the test releases it
#[derive(Clone)]
pub struct OriginateGate {
    entered: Arc<Barrier>,
    release: Arc<Barrier>,
}

impl OriginateGate {
    /// Block until the engine is inside `originate_call`
    pub fn wait_entered(&self) {
        self.entered.wait();
    }

    /// Let `originate_call` return
    pub fn release(&self) {
        self.release.wait();
    }
}

impl MockEngine {
    /// Engine that registers the account as soon as it is asked to
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            sink: Mutex::new(None),
            registration: Mutex::new(RawRegistrationState::None),
            auto_register: AtomicBool::new(true),
            started: Mutex::new(None),
            account: Mutex::new(None),
            originated: Mutex::new(Vec::new()),
            terminated: Mutex::new(Vec::new()),
            muted: Mutex::new(Vec::new()),
            shutdown_called: AtomicBool::new(false),
            fail_start: Mutex::new(None),
            fail_register: Mutex::new(None),
            fail_originate: Mutex::new(None),
            fail_terminate: Mutex::new(None),
            originate_gate: Mutex::new(None),
            next_handle: AtomicU32::new(1),
        })
    }

    /// Engine whose registration never completes on its own
    pub fn without_auto_register() -> Arc<Self> {
        let engine = Self::new();
        engine.auto_register.store(false, Ordering::SeqCst);
        engine
    }

    fn sink(&self) -> Arc<dyn EngineNotificationSink> {
        self.sink.lock().clone().expect("notification sink installed")
    }

    pub fn set_registration(&self, state: RawRegistrationState, message: &str) {
        *self.registration.lock() = state;
        self.sink().on_registration_state_changed(state, message);
    }

    pub fn emit_call_state(&self, state: RawCallState, message: &str) {
        self.emit_call_state_with_status(state, message, None);
    }

    pub fn emit_call_state_with_status(&self, state: RawCallState, message: &str, status: Option<u16>) {
        let handle = self.last_handle().unwrap_or_else(|| CallHandle::new("none"));
        self.sink().on_call_state_changed(&handle, state, message, status);
    }

    /// Report a state change of a specific call
    pub fn emit_call_state_for(&self, handle: &CallHandle, state: RawCallState, message: &str) {
        self.sink().on_call_state_changed(handle, state, message, None);
    }

    /// Make the next `originate_call` block until released
    pub fn hold_originate(&self) -> OriginateGate {
        let gate = OriginateGate { entered: Arc::new(Barrier::new(2)), release: Arc::new(Barrier::new(2)) };
        *self.originate_gate.lock() = Some(gate.clone());
        gate
    }

    pub fn emit_network(&self, reachable: bool) {
        self.sink().on_network_reachable(reachable);
    }

    pub fn last_handle(&self) -> Option<CallHandle> {
        let n = self.next_handle.load(Ordering::SeqCst);
        (n > 1).then(|| CallHandle::new(format!("call-{}", n - 1)))
    }
}

impl SignalingEngine for MockEngine {
    fn start(&self, settings: &EngineSettings) -> Result<(), EngineError> {
        if let Some(reason) = self.fail_start.lock().clone() {
            return Err(EngineError::new(reason));
        }
        *self.started.lock() = Some(settings.clone());
        Ok(())
    }

    fn register_notification_sink(&self, sink: Arc<dyn EngineNotificationSink>) {
        *self.sink.lock() = Some(sink);
    }

    fn register_account(&self, params: &AccountParams) -> Result<(), EngineError> {
        if let Some(reason) = self.fail_register.lock().clone() {
            return Err(EngineError::new(reason));
        }
        *self.account.lock() = Some(params.clone());
        if self.auto_register.load(Ordering::SeqCst) {
            self.set_registration(RawRegistrationState::Progress, "");
            self.set_registration(RawRegistrationState::Ok, "Registration successful");
        }
        Ok(())
    }

    fn originate_call(&self, address: &SipUri, headers: &[CustomHeader]) -> Result<CallHandle, EngineError> {
        let gate = self.originate_gate.lock().take();
        if let Some(gate) = gate {
            gate.entered.wait();
            gate.release.wait();
        }
        if let Some(reason) = self.fail_originate.lock().clone() {
            return Err(EngineError::new(reason));
        }
        self.originated.lock().push((address.to_string(), headers.to_vec()));
        let n = self.next_handle.fetch_add(1, Ordering::SeqCst);
        Ok(CallHandle::new(format!("call-{n}")))
    }

    fn terminate_call(&self, handle: &CallHandle) -> Result<(), EngineError> {
        if let Some(reason) = self.fail_terminate.lock().clone() {
            return Err(EngineError::new(reason));
        }
        self.terminated.lock().push(handle.clone());
        Ok(())
    }

    fn set_microphone_muted(&self, muted: bool) {
        self.muted.lock().push(muted);
    }

    fn current_registration_state(&self) -> RawRegistrationState {
        *self.registration.lock()
    }

    fn shutdown(&self) {
        self.shutdown_called.store(true, Ordering::SeqCst);
    }
}

/// What the platform collaborators were asked to do
#[derive(Debug, Clone, PartialEq)]
pub enum PlatformCall {
    OutgoingStarted(CallId),
    Connected(CallId),
    Ended(CallId, EndedReason),
    VoiceSession,
    SpeakerOutput(bool),
    Proximity(bool),
    ShowCall(String),
    SpeakerButton(bool),
    MicButton(bool),
    PresentError(ErrorKind),
    Dismiss,
}

/// Records every call into the platform collaborators
#[derive(Default)]
pub struct RecordingPlatform {
    calls: Mutex<Vec<PlatformCall>>,
    statuses: Mutex<Vec<String>>,
    pub fail_speaker: Mutex<Option<String>>,
    pub fail_voice_session: Mutex<Option<String>>,
}

impl RecordingPlatform {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn calls(&self) -> Vec<PlatformCall> {
        self.calls.lock().clone()
    }

    /// Status lines shown by the call view, in order
    pub fn statuses(&self) -> Vec<String> {
        self.statuses.lock().clone()
    }

    pub fn count(&self, call: &PlatformCall) -> usize {
        self.calls.lock().iter().filter(|c| *c == call).count()
    }

    pub fn clear(&self) {
        self.calls.lock().clear();
        self.statuses.lock().clear();
    }

    fn record(&self, call: PlatformCall) {
        self.calls.lock().push(call);
    }
}

impl PlatformCallBridge for RecordingPlatform {
    fn report_outgoing_started(&self, id: CallId) {
        self.record(PlatformCall::OutgoingStarted(id));
    }

    fn report_connected(&self, id: CallId) {
        self.record(PlatformCall::Connected(id));
    }

    fn report_ended(&self, id: CallId, reason: EndedReason) {
        self.record(PlatformCall::Ended(id, reason));
    }
}

impl AudioRouter for RecordingPlatform {
    fn activate_voice_session(&self) -> Result<(), String> {
        if let Some(reason) = self.fail_voice_session.lock().clone() {
            return Err(reason);
        }
        self.record(PlatformCall::VoiceSession);
        Ok(())
    }

    fn set_speaker_output(&self, enabled: bool) -> Result<(), String> {
        if let Some(reason) = self.fail_speaker.lock().clone() {
            return Err(reason);
        }
        self.record(PlatformCall::SpeakerOutput(enabled));
        Ok(())
    }
}

impl ProximityMonitor for RecordingPlatform {
    fn set_enabled(&self, enabled: bool) {
        self.record(PlatformCall::Proximity(enabled));
    }
}

impl CallUi for RecordingPlatform {
    fn show_call(&self, destination: &str) {
        self.record(PlatformCall::ShowCall(destination.to_string()));
    }

    fn update_speaker_button(&self, enabled: bool) {
        self.record(PlatformCall::SpeakerButton(enabled));
    }

    fn update_mic_button(&self, enabled: bool) {
        self.record(PlatformCall::MicButton(enabled));
    }

    fn update_status(&self, status: &str) {
        self.statuses.lock().push(status.to_string());
    }

    fn present_error(&self, error: &SoftphoneError) {
        self.record(PlatformCall::PresentError(error.kind()));
    }

    fn dismiss(&self) {
        self.record(PlatformCall::Dismiss);
    }
}

/// Observer keeping every event it receives
#[derive(Default)]
pub struct Recorder {
    events: Mutex<Vec<DomainEvent>>,
}

impl Recorder {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn events(&self) -> Vec<DomainEvent> {
        self.events.lock().clone()
    }

    pub fn clear(&self) {
        self.events.lock().clear();
    }

    pub fn errors(&self) -> Vec<SoftphoneError> {
        self.events
            .lock()
            .iter()
            .filter_map(|e| match e {
                DomainEvent::Error(err) => Some(err.clone()),
                _ => None,
            })
            .collect()
    }
}

#[async_trait]
impl EventObserver for Recorder {
    async fn handle_event(&self, event: DomainEvent) {
        self.events.lock().push(event);
    }
}

pub struct Harness {
    pub bus: EventBus,
    pub engine: Arc<MockEngine>,
    pub platform: Arc<RecordingPlatform>,
    pub controller: Arc<CallController>,
    pub recorder: Arc<Recorder>,
}

impl Harness {
    /// Controller wired to recording collaborators, not yet initialized
    pub fn new(engine: Arc<MockEngine>) -> Self {
        let bus = EventBus::new();
        let platform = RecordingPlatform::new();
        let controller = CallControllerBuilder::new(bus.clone(), engine.clone())
            .platform_bridge(platform.clone())
            .audio_router(platform.clone())
            .proximity_monitor(platform.clone())
            .call_ui(platform.clone())
            .build();
        let recorder = Recorder::new();
        bus.subscribe(&recorder);
        Self { bus, engine, platform, controller, recorder }
    }

    /// Controller initialized against an auto-registering engine
    pub async fn registered() -> Self {
        let harness = Self::new(MockEngine::new());
        harness.controller.initialize(test_config()).expect("initialize");
        harness.settle().await;
        harness.recorder.clear();
        harness.platform.clear();
        harness
    }

    /// Wait until everything published so far has been delivered
    pub async fn settle(&self) {
        self.bus.flush().await;
    }
}
