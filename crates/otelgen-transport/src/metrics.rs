//! Server-side counters, readable while the server runs.

use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe counters shared by every connection task of one server.
#[derive(Debug, Default)]
pub struct ServerMetrics {
    /// Requests that passed validation and reached the receiver
    pub requests_accepted: AtomicU64,
    /// Spans or metrics carried by accepted requests
    pub items_received: AtomicU64,
    /// Connections accepted by the listener
    pub connections_opened: AtomicU64,
    /// Connections torn down by a fatal error
    pub connections_failed: AtomicU64,
    /// Connections torn down for breaking the identifier rules
    pub protocol_violations: AtomicU64,
}

impl ServerMetrics {
    pub fn requests_accepted(&self) -> u64 {
        self.requests_accepted.load(Ordering::Relaxed)
    }

    pub fn items_received(&self) -> u64 {
        self.items_received.load(Ordering::Relaxed)
    }

    pub fn connections_opened(&self) -> u64 {
        self.connections_opened.load(Ordering::Relaxed)
    }

    pub fn connections_failed(&self) -> u64 {
        self.connections_failed.load(Ordering::Relaxed)
    }

    pub fn protocol_violations(&self) -> u64 {
        self.protocol_violations.load(Ordering::Relaxed)
    }

    pub(crate) fn record_request(&self, item_count: usize) {
        self.requests_accepted.fetch_add(1, Ordering::Relaxed);
        self.items_received.fetch_add(item_count as u64, Ordering::Relaxed);
    }

    pub(crate) fn record_connection(&self) {
        self.connections_opened.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_failure(&self, protocol_violation: bool) {
        self.connections_failed.fetch_add(1, Ordering::Relaxed);
        if protocol_violation {
            self.protocol_violations.fetch_add(1, Ordering::Relaxed);
        }
    }
}
