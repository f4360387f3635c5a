//! Background listeners feeding platform signals into the bus
//!
//! - [`ReachabilityMonitor`] probes connectivity on a fixed period and
//!   publishes `NetworkStateChanged`.
//! - [`AudioRouteListener`] turns audio route change notifications into
//!   `AudioRouteChanged`.

pub mod audio_route;
pub mod reachability;

pub use audio_route::{AudioRouteListener, RouteChangeReason};
pub use reachability::{ReachabilityMonitor, ReachabilityProbe, TcpConnectProbe};
