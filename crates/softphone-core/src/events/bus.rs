//! Publish/subscribe fabric for domain events
//!
//! The bus runs two tasks. The registry task is the only owner of the
//! observer list; subscribe, unsubscribe and publish requests reach it as
//! commands over an unbounded channel, so they are applied in the order they
//! were issued. For each publish it takes a snapshot of the live observers and
//! hands it to the dispatcher task, which awaits each observer in turn. The
//! dispatcher is the single consumer context: observers see events one at a
//! time and in publish order.
//!
//! Observers are held as `Weak` references. Dead entries are pruned whenever
//! the registry changes and skipped during delivery.
//!
//! Repeated `NetworkStateChanged` events carrying the same value as the last
//! published one are dropped.

use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Weak};

use futures::FutureExt;
use tokio::sync::{broadcast, mpsc, oneshot};
use tracing::{debug, error, trace, warn};

use super::{DomainEvent, EventObserver};

/// Capacity of the broadcast stream returned by [`EventBus::subscribe_events`]
const BROADCAST_CAPACITY: usize = 256;

enum BusCommand {
    Subscribe(Weak<dyn EventObserver>),
    Unsubscribe(Weak<dyn EventObserver>),
    UnsubscribeAll,
    Publish(DomainEvent),
    Count(oneshot::Sender<usize>),
    Flush(oneshot::Sender<()>),
}

enum Delivery {
    Event(DomainEvent, Vec<Weak<dyn EventObserver>>),
    Flush(oneshot::Sender<()>),
}

/// Handle to the event bus
///
/// Cheap to clone; all clones talk to the same registry. Must be created
/// inside a Tokio runtime. The bus tasks stop once every handle is dropped.
#[derive(Clone)]
pub struct EventBus {
    commands: mpsc::UnboundedSender<BusCommand>,
    broadcast_tx: broadcast::Sender<DomainEvent>,
}

impl EventBus {
    /// Create a bus and spawn its registry and dispatcher tasks
    pub fn new() -> Self {
        let (commands, command_rx) = mpsc::unbounded_channel();
        let (delivery_tx, delivery_rx) = mpsc::unbounded_channel();
        let (broadcast_tx, _) = broadcast::channel(BROADCAST_CAPACITY);

        tokio::spawn(run_registry(command_rx, delivery_tx, broadcast_tx.clone()));
        tokio::spawn(run_dispatcher(delivery_rx));

        Self { commands, broadcast_tx }
    }

    /// Register an observer; subscribing the same observer twice is a no-op
    pub fn subscribe<O: EventObserver + 'static>(&self, observer: &Arc<O>) {
        let weak: Weak<O> = Arc::downgrade(observer);
        self.send(BusCommand::Subscribe(weak));
    }

    /// Register a type-erased observer
    pub fn subscribe_shared(&self, observer: &Arc<dyn EventObserver>) {
        self.send(BusCommand::Subscribe(Arc::downgrade(observer)));
    }

    /// Remove an observer; unknown observers are ignored
    pub fn unsubscribe<O: EventObserver + 'static>(&self, observer: &Arc<O>) {
        let weak: Weak<O> = Arc::downgrade(observer);
        self.send(BusCommand::Unsubscribe(weak));
    }

    /// Remove a type-erased observer
    pub fn unsubscribe_shared(&self, observer: &Arc<dyn EventObserver>) {
        self.send(BusCommand::Unsubscribe(Arc::downgrade(observer)));
    }

    /// Remove every observer
    pub fn unsubscribe_all(&self) {
        self.send(BusCommand::UnsubscribeAll);
    }

    /// Publish an event to every observer registered before this call
    ///
    /// Returns immediately; delivery happens on the dispatcher task.
    pub fn publish(&self, event: DomainEvent) {
        trace!(event = event.name(), "publishing event");
        self.send(BusCommand::Publish(event));
    }

    /// Wait until every event published before this call has been delivered
    pub async fn flush(&self) {
        let (tx, rx) = oneshot::channel();
        self.send(BusCommand::Flush(tx));
        let _ = rx.await;
    }

    /// Number of live observers
    pub async fn observer_count(&self) -> usize {
        let (tx, rx) = oneshot::channel();
        self.send(BusCommand::Count(tx));
        rx.await.unwrap_or(0)
    }

    /// Stream of every published event, for async consumers
    ///
    /// Slow receivers lag and lose the oldest events instead of blocking the
    /// bus.
    pub fn subscribe_events(&self) -> broadcast::Receiver<DomainEvent> {
        self.broadcast_tx.subscribe()
    }

    fn send(&self, command: BusCommand) {
        if self.commands.send(command).is_err() {
            warn!("event bus registry has stopped, command dropped");
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("stream_receivers", &self.broadcast_tx.receiver_count())
            .finish()
    }
}

fn same_observer(a: &Weak<dyn EventObserver>, b: &Weak<dyn EventObserver>) -> bool {
    std::ptr::eq(a.as_ptr() as *const (), b.as_ptr() as *const ())
}

fn prune(observers: &mut Vec<Weak<dyn EventObserver>>) {
    observers.retain(|o| o.strong_count() > 0);
}

async fn run_registry(
    mut commands: mpsc::UnboundedReceiver<BusCommand>,
    deliveries: mpsc::UnboundedSender<Delivery>,
    broadcast_tx: broadcast::Sender<DomainEvent>,
) {
    let mut observers: Vec<Weak<dyn EventObserver>> = Vec::new();
    let mut last_network_state: Option<bool> = None;

    while let Some(command) = commands.recv().await {
        match command {
            BusCommand::Subscribe(observer) => {
                prune(&mut observers);
                if observer.strong_count() > 0
                    && !observers.iter().any(|o| same_observer(o, &observer))
                {
                    observers.push(observer);
                    debug!(observers = observers.len(), "observer subscribed");
                }
            }
            BusCommand::Unsubscribe(observer) => {
                prune(&mut observers);
                observers.retain(|o| !same_observer(o, &observer));
                debug!(observers = observers.len(), "observer unsubscribed");
            }
            BusCommand::UnsubscribeAll => {
                observers.clear();
                debug!("all observers unsubscribed");
            }
            BusCommand::Publish(event) => {
                if let DomainEvent::NetworkStateChanged { reachable } = event {
                    if last_network_state == Some(reachable) {
                        trace!(reachable, "duplicate network state suppressed");
                        continue;
                    }
                    last_network_state = Some(reachable);
                }
                prune(&mut observers);
                let _ = broadcast_tx.send(event.clone());
                if deliveries.send(Delivery::Event(event, observers.clone())).is_err() {
                    break;
                }
            }
            BusCommand::Count(reply) => {
                prune(&mut observers);
                let _ = reply.send(observers.len());
            }
            BusCommand::Flush(reply) => {
                if deliveries.send(Delivery::Flush(reply)).is_err() {
                    break;
                }
            }
        }
    }
    debug!("event bus registry stopped");
}

async fn run_dispatcher(mut deliveries: mpsc::UnboundedReceiver<Delivery>) {
    while let Some(delivery) = deliveries.recv().await {
        match delivery {
            Delivery::Event(event, observers) => {
                for observer in observers.iter().filter_map(Weak::upgrade) {
                    let handled = AssertUnwindSafe(observer.handle_event(event.clone()))
                        .catch_unwind()
                        .await;
                    if handled.is_err() {
                        error!(event = event.name(), "observer panicked while handling event");
                    }
                }
            }
            Delivery::Flush(reply) => {
                let _ = reply.send(());
            }
        }
    }
}
