//! # Softphone Core - SIP call-session state machine and event fabric
//!
//! This crate sits between an application and an external SIP/media engine.
//! It turns the engine's low-level notifications into a small, observable
//! state model and owns the lifecycle of the single active call:
//!
//! - **classifier**: pure mapping of raw engine call and registration states
//!   into [`CallState`] and [`RegistrationState`], including busy / no-answer
//!   disambiguation of failed calls
//! - **events**: the [`EventBus`], a weak-observer publish/subscribe registry
//!   delivering [`DomainEvent`]s on a single consumer task
//! - **controller**: the [`CallController`] driving the engine, the platform
//!   call bridge, the proximity sensor and the call view
//! - **monitor**: reachability and audio route listeners
//!
//! ## Architecture
//!
//! ```text
//! engine ──► EngineListener ──► classifier ──► CallController ──► platform / UI
//!                                                   │  (by call handle)
//!                                                   ▼
//!                                               EventBus ──┬─► CallController ──► UI buttons, errors
//!                                                          ├─► DelegateBridge ──► legacy delegate
//!                                                          └─► application observers
//! ```
//!
//! Call notifications are matched to a session by the engine's call handle
//! before they are published, so a late notification of an earlier call
//! never affects the current one.
//!
//! The engine and all platform collaborators are traits ([`SignalingEngine`],
//! [`PlatformCallBridge`], [`AudioRouter`], [`ProximityMonitor`], [`CallUi`]);
//! the crate never talks SIP on the wire itself.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use softphone_core::{CallConfig, CallControllerBuilder, DomainEvent, EventBus, RegistrationState};
//! # use softphone_core::SignalingEngine;
//! # fn my_engine() -> Arc<dyn SignalingEngine> { unimplemented!() }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let bus = EventBus::new();
//!     let mut events = bus.subscribe_events();
//!     let controller = CallControllerBuilder::new(bus.clone(), my_engine()).build();
//!
//!     controller.initialize(CallConfig::new("1001", "secret", "pbx.example.com", "proxy.example.com", 443))?;
//!
//!     while let Ok(event) = events.recv().await {
//!         if event == DomainEvent::RegistrationStateChanged(RegistrationState::Ok) {
//!             controller.place_call("1002")?;
//!         }
//!     }
//!     Ok(())
//! }
//! ```

pub mod address;
pub mod call;
pub mod classifier;
pub mod config;
pub mod controller;
pub mod engine;
pub mod error;
pub mod events;
pub mod listener;
pub mod logging;
pub mod monitor;
pub mod platform;
pub mod registration;

// Re-export main types
pub use address::{CustomHeader, SipUri};
pub use call::{CallId, CallState, EndReason, Session};
pub use classifier::{
    classify_call_state, classify_call_state_with_status, classify_registration_state,
    CallClassification, RawCallState, RawRegistrationState,
};
pub use config::{AccountParams, CallConfig, EngineSettings, Transport};
pub use controller::{CallController, CallControllerBuilder};
pub use engine::{CallHandle, EngineError, EngineNotificationSink, SignalingEngine};
pub use error::{ErrorKind, SoftphoneError, SoftphoneResult};
pub use events::{DelegateBridge, DomainEvent, EventBus, EventObserver, LegacyDelegate};
pub use listener::EngineListener;
pub use monitor::{AudioRouteListener, ReachabilityMonitor, ReachabilityProbe};
pub use platform::{AudioRouter, CallUi, EndedReason, Headless, PlatformCallBridge, ProximityMonitor};
pub use registration::RegistrationState;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
