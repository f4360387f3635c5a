//! Event bus delivery, de-duplication and observer lifetime tests

mod common;

use std::sync::Arc;

use async_trait::async_trait;
use common::{init_tracing, Recorder};
use softphone_core::{CallState, DomainEvent, EventBus, EventObserver, RegistrationState};

#[tokio::test]
async fn test_events_delivered_in_publish_order() {
    init_tracing();
    let bus = EventBus::new();
    let recorder = Recorder::new();
    bus.subscribe(&recorder);

    let events = vec![
        DomainEvent::RegistrationStateChanged(RegistrationState::Progress),
        DomainEvent::RegistrationStateChanged(RegistrationState::Ok),
        DomainEvent::CallStateChanged(CallState::Calling),
        DomainEvent::CallStateChanged(CallState::Ringing),
        DomainEvent::CallStateChanged(CallState::Connected),
    ];
    for event in events.clone() {
        bus.publish(event);
    }
    bus.flush().await;

    assert_eq!(recorder.events(), events);
}

#[tokio::test]
async fn test_repeated_network_state_is_suppressed() {
    let bus = EventBus::new();
    let recorder = Recorder::new();
    bus.subscribe(&recorder);

    for reachable in [true, true, false, false, true] {
        bus.publish(DomainEvent::NetworkStateChanged { reachable });
    }
    bus.flush().await;

    assert_eq!(
        recorder.events(),
        vec![
            DomainEvent::NetworkStateChanged { reachable: true },
            DomainEvent::NetworkStateChanged { reachable: false },
            DomainEvent::NetworkStateChanged { reachable: true },
        ]
    );
}

#[tokio::test]
async fn test_subscribe_is_idempotent() {
    let bus = EventBus::new();
    let recorder = Recorder::new();
    bus.subscribe(&recorder);
    bus.subscribe(&recorder);
    assert_eq!(bus.observer_count().await, 1);

    bus.publish(DomainEvent::MicrophoneStateChanged { muted: true });
    bus.flush().await;
    assert_eq!(recorder.events().len(), 1);
}

#[tokio::test]
async fn test_unsubscribe_is_idempotent() {
    let bus = EventBus::new();
    let recorder = Recorder::new();
    let other = Recorder::new();
    bus.subscribe(&recorder);
    bus.subscribe(&other);

    bus.unsubscribe(&recorder);
    bus.unsubscribe(&recorder);
    assert_eq!(bus.observer_count().await, 1);

    bus.publish(DomainEvent::AudioRouteChanged { speaker_on: true });
    bus.flush().await;
    assert!(recorder.events().is_empty());
    assert_eq!(other.events().len(), 1);
}

#[tokio::test]
async fn test_unsubscribe_all() {
    let bus = EventBus::new();
    let a = Recorder::new();
    let b = Recorder::new();
    bus.subscribe(&a);
    bus.subscribe(&b);

    bus.unsubscribe_all();
    bus.publish(DomainEvent::CallStateChanged(CallState::Calling));
    bus.flush().await;

    assert_eq!(bus.observer_count().await, 0);
    assert!(a.events().is_empty());
    assert!(b.events().is_empty());
}

#[tokio::test]
async fn test_dropped_observer_is_skipped() {
    let bus = EventBus::new();
    let kept = Recorder::new();
    let dropped = Recorder::new();
    bus.subscribe(&kept);
    bus.subscribe(&dropped);
    drop(dropped);

    bus.publish(DomainEvent::CallStateChanged(CallState::Ringing));
    bus.flush().await;

    assert_eq!(kept.events(), vec![DomainEvent::CallStateChanged(CallState::Ringing)]);
    assert_eq!(bus.observer_count().await, 1);
}

#[tokio::test]
async fn test_late_subscriber_misses_earlier_events() {
    let bus = EventBus::new();
    let early = Recorder::new();
    bus.subscribe(&early);
    bus.publish(DomainEvent::CallStateChanged(CallState::Calling));

    let late = Recorder::new();
    bus.subscribe(&late);
    bus.publish(DomainEvent::CallStateChanged(CallState::Connected));
    bus.flush().await;

    assert_eq!(early.events().len(), 2);
    assert_eq!(late.events(), vec![DomainEvent::CallStateChanged(CallState::Connected)]);
}

#[tokio::test]
async fn test_type_erased_observers() {
    let bus = EventBus::new();
    let recorder = Recorder::new();
    let shared: Arc<dyn EventObserver> = recorder.clone();

    bus.subscribe_shared(&shared);
    bus.subscribe(&recorder);
    assert_eq!(bus.observer_count().await, 1);

    bus.unsubscribe_shared(&shared);
    assert_eq!(bus.observer_count().await, 0);
}

struct Panicking;

#[async_trait]
impl EventObserver for Panicking {
    async fn handle_event(&self, _event: DomainEvent) {
        panic!("observer failure");
    }
}

#[tokio::test]
async fn test_panicking_observer_does_not_stop_delivery() {
    let bus = EventBus::new();
    let panicking = Arc::new(Panicking);
    let recorder = Recorder::new();
    bus.subscribe(&panicking);
    bus.subscribe(&recorder);

    bus.publish(DomainEvent::CallStateChanged(CallState::Calling));
    bus.publish(DomainEvent::CallStateChanged(CallState::Ended));
    bus.flush().await;

    assert_eq!(recorder.events().len(), 2);
}

#[tokio::test]
async fn test_broadcast_stream_sees_published_events() {
    let bus = EventBus::new();
    let mut stream = bus.subscribe_events();

    bus.publish(DomainEvent::NetworkStateChanged { reachable: false });
    bus.publish(DomainEvent::NetworkStateChanged { reachable: false });
    bus.publish(DomainEvent::CallStateChanged(CallState::Idle));
    bus.flush().await;

    assert_eq!(
        stream.recv().await.unwrap(),
        DomainEvent::NetworkStateChanged { reachable: false }
    );
    assert_eq!(stream.recv().await.unwrap(), DomainEvent::CallStateChanged(CallState::Idle));
    assert!(stream.try_recv().is_err());
}
