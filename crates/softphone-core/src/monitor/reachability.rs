//! Periodic network reachability monitor

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::net::TcpStream;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::events::{DomainEvent, EventBus};

/// Connectivity check run by [`ReachabilityMonitor`]
#[async_trait]
pub trait ReachabilityProbe: Send + Sync {
    /// Whether the network is usable right now
    async fn probe(&self) -> bool;
}

/// Probe that opens a TCP connection to a fixed target
#[derive(Debug, Clone)]
pub struct TcpConnectProbe {
    target: String,
    timeout: Duration,
}

impl TcpConnectProbe {
    /// `target` is a `host:port` pair
    pub fn new(target: impl Into<String>) -> Self {
        Self { target: target.into(), timeout: Duration::from_secs(3) }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait]
impl ReachabilityProbe for TcpConnectProbe {
    async fn probe(&self) -> bool {
        match tokio::time::timeout(self.timeout, TcpStream::connect(&self.target)).await {
            Ok(Ok(_)) => true,
            Ok(Err(e)) => {
                debug!(target = %self.target, error = %e, "reachability probe failed");
                false
            }
            Err(_) => {
                debug!(target = %self.target, "reachability probe timed out");
                false
            }
        }
    }
}

/// Background task probing reachability on a fixed period
///
/// The first probe runs immediately. Every result is published; the bus drops
/// repeated values. The task stops when the monitor is stopped or dropped.
#[derive(Debug)]
pub struct ReachabilityMonitor {
    task_handle: JoinHandle<()>,
    period: Duration,
}

impl ReachabilityMonitor {
    /// Start probing; must be called inside a Tokio runtime
    pub fn spawn(probe: Arc<dyn ReachabilityProbe>, bus: EventBus, period: Duration) -> Self {
        let task_handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            loop {
                interval.tick().await;
                let reachable = probe.probe().await;
                bus.publish(DomainEvent::NetworkStateChanged { reachable });
            }
        });
        info!(period_secs = period.as_secs_f64(), "network monitoring started");
        Self { task_handle, period }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn is_running(&self) -> bool {
        !self.task_handle.is_finished()
    }

    /// Stop probing
    pub fn stop(&self) {
        if !self.task_handle.is_finished() {
            self.task_handle.abort();
            info!("network monitoring stopped");
        }
    }
}

impl Drop for ReachabilityMonitor {
    fn drop(&mut self) {
        self.task_handle.abort();
    }
}
