//! Pipeline counters.
//!
//! [`Counter`] is an atomic monotonic counter; [`IngressMetrics`] groups the
//! counters the ingress loop, composer and notification router bump.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// A monotonically increasing counter backed by [`AtomicU64`].
///
/// Relaxed ordering: values are statistics, not synchronization.
#[derive(Default)]
pub struct Counter(AtomicU64);

impl Counter {
    pub fn new() -> Self {
        Self(AtomicU64::new(0))
    }

    pub fn inc(&self) {
        self.0.fetch_add(1, Ordering::Relaxed);
    }

    pub fn get(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }
}

impl fmt::Debug for Counter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Counter").field(&self.get()).finish()
    }
}

/// Counters shared by one client across sessions.
#[derive(Debug, Default)]
pub struct IngressMetrics {
    pub events_received: Counter,
    /// Events whose handling finished, whatever the outcome.
    pub events_processed: Counter,
    pub self_echoes_discarded: Counter,
    pub duplicates_discarded: Counter,
    pub malformed_discarded: Counter,
    pub transcript_appends: Counter,
    pub lookup_fallbacks: Counter,
    pub resubscribes: Counter,
    pub notifications_routed: Counter,
    pub notifications_dropped: Counter,
    pub notification_failures: Counter,
    pub persist_failures: Counter,
}

/// Point-in-time copy of [`IngressMetrics`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct MetricsSnapshot {
    pub events_received: u64,
    pub events_processed: u64,
    pub self_echoes_discarded: u64,
    pub duplicates_discarded: u64,
    pub malformed_discarded: u64,
    pub transcript_appends: u64,
    pub lookup_fallbacks: u64,
    pub resubscribes: u64,
    pub notifications_routed: u64,
    pub notifications_dropped: u64,
    pub notification_failures: u64,
    pub persist_failures: u64,
}

impl IngressMetrics {
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            events_received: self.events_received.get(),
            events_processed: self.events_processed.get(),
            self_echoes_discarded: self.self_echoes_discarded.get(),
            duplicates_discarded: self.duplicates_discarded.get(),
            malformed_discarded: self.malformed_discarded.get(),
            transcript_appends: self.transcript_appends.get(),
            lookup_fallbacks: self.lookup_fallbacks.get(),
            resubscribes: self.resubscribes.get(),
            notifications_routed: self.notifications_routed.get(),
            notifications_dropped: self.notifications_dropped.get(),
            notification_failures: self.notification_failures.get(),
            persist_failures: self.persist_failures.get(),
        }
    }
}
