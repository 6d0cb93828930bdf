//! Counters for everything the monitor reports instead of failing on.

use std::sync::atomic::{AtomicU64, Ordering};

/// Live counters shared by the reactor and the dispatch loop.
#[derive(Debug, Default)]
pub struct MonitorStats {
    notifications_received: AtomicU64,
    unsupported_events: AtomicU64,
    decode_errors: AtomicU64,
    partial_decodes: AtomicU64,
    unresolved_devices: AtomicU64,
    state_changes_handled: AtomicU64,
    unknown_events_handled: AtomicU64,
    handler_errors: AtomicU64,
    handler_timeouts: AtomicU64,
}

/// Point-in-time copy of [`MonitorStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    /// Notifications taken off the listener queue by the reactor
    pub notifications_received: u64,
    /// Notifications of a type that is not decoded
    pub unsupported_events: u64,
    /// Malformed payloads
    pub decode_errors: u64,
    /// State changes whose track metadata had to be dropped
    pub partial_decodes: u64,
    /// Events whose source had no registered device
    pub unresolved_devices: u64,
    pub state_changes_handled: u64,
    pub unknown_events_handled: u64,
    /// Handler failures, timeouts included
    pub handler_errors: u64,
    pub handler_timeouts: u64,
}

impl StatsSnapshot {
    /// Items the dispatch loop consumed, whatever became of them.
    ///
    /// A partial decode is reported and then dispatched as a state change, so
    /// it is only counted by where its recovered event ended up.
    pub fn events_dispatched(&self) -> u64 {
        self.decode_errors
            + self.unresolved_devices
            + self.state_changes_handled
            + self.unknown_events_handled
            + self.handler_errors
    }
}

impl MonitorStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            notifications_received: self.notifications_received.load(Ordering::Relaxed),
            unsupported_events: self.unsupported_events.load(Ordering::Relaxed),
            decode_errors: self.decode_errors.load(Ordering::Relaxed),
            partial_decodes: self.partial_decodes.load(Ordering::Relaxed),
            unresolved_devices: self.unresolved_devices.load(Ordering::Relaxed),
            state_changes_handled: self.state_changes_handled.load(Ordering::Relaxed),
            unknown_events_handled: self.unknown_events_handled.load(Ordering::Relaxed),
            handler_errors: self.handler_errors.load(Ordering::Relaxed),
            handler_timeouts: self.handler_timeouts.load(Ordering::Relaxed),
        }
    }

    pub(crate) fn record_notification(&self) {
        self.notifications_received.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_unsupported(&self) {
        self.unsupported_events.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_decode_error(&self) {
        self.decode_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_partial_decode(&self) {
        self.partial_decodes.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_unresolved(&self) {
        self.unresolved_devices.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_state_change_handled(&self) {
        self.state_changes_handled.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_unknown_handled(&self) {
        self.unknown_events_handled.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_handler_error(&self, timed_out: bool) {
        self.handler_errors.fetch_add(1, Ordering::Relaxed);
        if timed_out {
            self.handler_timeouts.fetch_add(1, Ordering::Relaxed);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_reflects_counters() {
        let stats = MonitorStats::new();
        stats.record_notification();
        stats.record_notification();
        stats.record_decode_error();
        stats.record_state_change_handled();
        stats.record_handler_error(true);
        stats.record_handler_error(false);

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.notifications_received, 2);
        assert_eq!(snapshot.decode_errors, 1);
        assert_eq!(snapshot.state_changes_handled, 1);
        assert_eq!(snapshot.handler_errors, 2);
        assert_eq!(snapshot.handler_timeouts, 1);
        assert_eq!(snapshot.events_dispatched(), 4);
    }

    #[test]
    fn test_partial_decode_counts_once_in_dispatched() {
        let stats = MonitorStats::new();
        stats.record_partial_decode();
        stats.record_state_change_handled();

        assert_eq!(stats.snapshot().events_dispatched(), 1);
    }
}
