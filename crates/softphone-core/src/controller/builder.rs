//! Builder for [`CallController`]
//!
//! Only the bus and the engine are mandatory. Platform collaborators default
//! to [`Headless`] no-ops.
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use softphone_core::{CallControllerBuilder, EventBus, Headless};
//! # use softphone_core::engine::SignalingEngine;
//! # fn engine() -> Arc<dyn SignalingEngine> { unimplemented!() }
//!
//! # async fn build() {
//! let controller = CallControllerBuilder::new(EventBus::new(), engine())
//!     .platform_bridge(Arc::new(Headless))
//!     .build();
//! # let _ = controller;
//! # }
//! ```

use std::sync::Arc;

use parking_lot::Mutex;

use super::{CallController, ControllerState};
use crate::engine::SignalingEngine;
use crate::events::EventBus;
use crate::monitor::ReachabilityProbe;
use crate::platform::{AudioRouter, CallUi, Headless, PlatformCallBridge, ProximityMonitor};

/// Fluent constructor of a [`CallController`]
pub struct CallControllerBuilder {
    bus: EventBus,
    engine: Arc<dyn SignalingEngine>,
    platform: Arc<dyn PlatformCallBridge>,
    audio: Arc<dyn AudioRouter>,
    proximity: Arc<dyn ProximityMonitor>,
    ui: Option<Arc<dyn CallUi>>,
    reachability_probe: Option<Arc<dyn ReachabilityProbe>>,
}

impl CallControllerBuilder {
    pub fn new(bus: EventBus, engine: Arc<dyn SignalingEngine>) -> Self {
        Self {
            bus,
            engine,
            platform: Arc::new(Headless),
            audio: Arc::new(Headless),
            proximity: Arc::new(Headless),
            ui: None,
            reachability_probe: None,
        }
    }

    /// OS call-management bridge notified of call progress
    pub fn platform_bridge(mut self, platform: Arc<dyn PlatformCallBridge>) -> Self {
        self.platform = platform;
        self
    }

    pub fn audio_router(mut self, audio: Arc<dyn AudioRouter>) -> Self {
        self.audio = audio;
        self
    }

    pub fn proximity_monitor(mut self, proximity: Arc<dyn ProximityMonitor>) -> Self {
        self.proximity = proximity;
        self
    }

    pub fn call_ui(mut self, ui: Arc<dyn CallUi>) -> Self {
        self.ui = Some(ui);
        self
    }

    /// Probe used when the configuration enables reachability monitoring
    ///
    /// Without one, a TCP connect to the SIP proxy is used.
    pub fn reachability_probe(mut self, probe: Arc<dyn ReachabilityProbe>) -> Self {
        self.reachability_probe = Some(probe);
        self
    }

    /// Build the controller and subscribe it to the bus
    pub fn build(self) -> Arc<CallController> {
        let controller = Arc::new_cyclic(|self_ref| CallController {
            bus: self.bus,
            engine: self.engine,
            platform: self.platform,
            audio: self.audio,
            proximity: self.proximity,
            reachability_probe: self.reachability_probe,
            state: Mutex::new(ControllerState { ui: self.ui, ..ControllerState::default() }),
            route_lock: Mutex::new(()),
            self_ref: self_ref.clone(),
        });
        controller.bus.subscribe(&controller);
        controller
    }
}
