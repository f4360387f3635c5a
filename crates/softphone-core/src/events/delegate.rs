//! Single-delegate callback adapter
//!
//! Applications written against the older callback interface implement
//! [`LegacyDelegate`] instead of observing the bus. [`DelegateBridge`]
//! subscribes to the bus and forwards the subset of events that interface
//! knows about: successful registration, call state changes and errors (as
//! their user-facing text). Everything else is dropped.

use std::sync::{Arc, Weak};

use async_trait::async_trait;

use super::{DomainEvent, EventBus, EventObserver};
use crate::call::CallState;

/// Callback interface of the older single-delegate API
pub trait LegacyDelegate: Send + Sync {
    /// The account registered successfully
    fn on_registered(&self);

    /// The current call changed state
    fn on_call_state_changed(&self, state: CallState);

    /// An operation failed
    fn on_error(&self, message: String);
}

/// Forwards bus events to a weakly held [`LegacyDelegate`]
pub struct DelegateBridge {
    delegate: Weak<dyn LegacyDelegate>,
}

impl DelegateBridge {
    pub fn new(delegate: &Arc<dyn LegacyDelegate>) -> Self {
        Self { delegate: Arc::downgrade(delegate) }
    }

    /// Create a bridge and subscribe it to `bus`
    ///
    /// The bus only keeps a weak reference: the returned `Arc` must be kept
    /// alive for as long as callbacks are wanted.
    pub fn attach(bus: &EventBus, delegate: &Arc<dyn LegacyDelegate>) -> Arc<Self> {
        let bridge = Arc::new(Self::new(delegate));
        bus.subscribe(&bridge);
        bridge
    }

    /// Check if the delegate is still alive
    pub fn is_connected(&self) -> bool {
        self.delegate.strong_count() > 0
    }
}

#[async_trait]
impl EventObserver for DelegateBridge {
    async fn handle_event(&self, event: DomainEvent) {
        let Some(delegate) = self.delegate.upgrade() else {
            return;
        };
        match event {
            DomainEvent::RegistrationStateChanged(state) if state.is_registered() => {
                delegate.on_registered();
            }
            DomainEvent::CallStateChanged(state) => delegate.on_call_state_changed(state),
            DomainEvent::Error(error) => delegate.on_error(error.to_string()),
            _ => {}
        }
    }
}

impl std::fmt::Debug for DelegateBridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DelegateBridge")
            .field("connected", &self.is_connected())
            .finish()
    }
}
