//! The dispatch loop: single consumer of the reactor's event queue.
//!
//! Items are taken strictly in arrival order. Each one is either reported
//! (decode failure, unresolved device, handler failure) or handed to the
//! handler for its variant. Nothing that happens to one item stops the loop.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

use crate::error::{DecodeError, HandlerError};
use crate::event::Event;
use crate::handlers::{LogUnknownEvents, StateChangeHandler, UnknownEventHandler};
use crate::registry::{Correlator, DeviceRegistry};
use crate::stats::{MonitorStats, StatsSnapshot};
use crate::types::Device;

/// What the reactor publishes for every notification.
pub type EventResult = Result<Event, DecodeError>;

const DEFAULT_HANDLER_TIMEOUT: Duration = Duration::from_secs(5);

/// Correlates events with devices and drives the handlers.
pub struct Dispatcher {
    correlator: Correlator,
    state_handler: Arc<dyn StateChangeHandler>,
    unknown_handler: Arc<dyn UnknownEventHandler>,
    handler_timeout: Duration,
    stats: Arc<MonitorStats>,
}

impl Dispatcher {
    /// Dispatcher with the logging unknown-event handler, a 5 second handler
    /// timeout and its own counters.
    pub fn new(registry: Arc<DeviceRegistry>, state_handler: Arc<dyn StateChangeHandler>) -> Self {
        Self {
            correlator: Correlator::new(registry),
            state_handler,
            unknown_handler: Arc::new(LogUnknownEvents),
            handler_timeout: DEFAULT_HANDLER_TIMEOUT,
            stats: Arc::new(MonitorStats::new()),
        }
    }

    pub fn with_unknown_handler(mut self, handler: Arc<dyn UnknownEventHandler>) -> Self {
        self.unknown_handler = handler;
        self
    }

    pub fn with_handler_timeout(mut self, timeout: Duration) -> Self {
        self.handler_timeout = timeout;
        self
    }

    /// Count into `stats` instead of private counters.
    pub fn with_stats(mut self, stats: Arc<MonitorStats>) -> Self {
        self.stats = stats;
        self
    }

    pub fn stats(&self) -> &Arc<MonitorStats> {
        &self.stats
    }

    /// Drain `events` until the producer closes the queue.
    ///
    /// `shutdown` marks the start of the drain: once it fires the loop only
    /// waits for the producer to finish publishing what it has buffered. The
    /// loop never ends because of anything inside an item.
    pub async fn run(
        self,
        mut events: mpsc::Receiver<EventResult>,
        mut shutdown: watch::Receiver<bool>,
    ) -> StatsSnapshot {
        let mut draining = *shutdown.borrow();
        info!("Dispatch loop started");

        loop {
            tokio::select! {
                biased;

                item = events.recv() => match item {
                    Some(item) => self.dispatch(item).await,
                    None => break,
                },

                // A dropped sender counts as a shutdown request too
                _ = shutdown.changed(), if !draining => {
                    draining = true;
                    info!("Shutdown requested, draining queued events");
                }
            }
        }

        if !draining {
            warn!("Event queue closed without a shutdown request");
        }

        let snapshot = self.stats.snapshot();
        info!(
            dispatched = snapshot.events_dispatched(),
            decode_errors = snapshot.decode_errors,
            unresolved = snapshot.unresolved_devices,
            handler_errors = snapshot.handler_errors,
            "Dispatch loop stopped"
        );
        snapshot
    }

    /// Handle one queue item.
    pub async fn dispatch(&self, item: EventResult) {
        let event = match item {
            Ok(event) => event,
            Err(err) => match self.report_decode_error(err) {
                Some(recovered) => recovered,
                None => return,
            },
        };

        let device = match self.correlator.correlate(&event) {
            Ok(device) => device,
            Err(err) => {
                self.stats.record_unresolved();
                warn!(kind = event.kind(), error = %err, "Dropping event from unknown device");
                return;
            }
        };

        match event {
            Event::StateChange(change) => {
                let outcome = self
                    .bounded(self.state_handler.on_state_change(device.clone(), &change))
                    .await;
                match outcome {
                    Ok(()) => self.stats.record_state_change_handled(),
                    Err(err) => self.report_handler_error(&device, err),
                }
            }
            Event::Unknown(unknown) => {
                debug!(room = %device.room_name, error = %unknown.unsupported(), "Routing to unknown-event handler");
                let outcome = self
                    .bounded(self.unknown_handler.on_unknown_event(device.clone(), &unknown))
                    .await;
                match outcome {
                    Ok(()) => self.stats.record_unknown_handled(),
                    Err(err) => self.report_handler_error(&device, err),
                }
            }
        }
    }

    /// Report a decode failure, returning the event to dispatch in its place.
    fn report_decode_error(&self, err: DecodeError) -> Option<Event> {
        match &err {
            DecodeError::PartialDecode { .. } => {
                self.stats.record_partial_decode();
                warn!(error = %err, "Dispatching transport state without track metadata");
                err.recovered().map(Event::StateChange)
            }
            DecodeError::UnsupportedType { .. } => {
                debug!(error = %err, "Unsupported event type");
                None
            }
            DecodeError::Malformed(_) => {
                self.stats.record_decode_error();
                warn!(error = %err, "Discarding undecodable notification");
                None
            }
        }
    }

    fn report_handler_error(&self, device: &Device, err: HandlerError) {
        let timed_out = matches!(err, HandlerError::RemoteCallTimedOut { .. });
        self.stats.record_handler_error(timed_out);
        warn!(room = %device.room_name, device = %device.id, error = %err, "Event handler failed");
    }

    async fn bounded<F>(&self, call: F) -> Result<(), HandlerError>
    where
        F: Future<Output = Result<(), HandlerError>>,
    {
        tokio::time::timeout(self.handler_timeout, call)
            .await
            .unwrap_or_else(|_| {
                Err(HandlerError::RemoteCallTimedOut {
                    operation: "event handler".to_string(),
                    after: self.handler_timeout,
                })
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{StateChangeEvent, TransportState, UnknownEvent};
    use crate::types::{EventTypeTag, ServiceIdentity};
    use async_trait::async_trait;
    use bytes::Bytes;
    use parking_lot::Mutex;
    use std::net::{IpAddr, Ipv4Addr};

    #[derive(Default)]
    struct Recorder {
        state_changes: Mutex<Vec<(String, StateChangeEvent)>>,
        unknown: Mutex<Vec<(String, EventTypeTag)>>,
    }

    #[async_trait]
    impl StateChangeHandler for Recorder {
        async fn on_state_change(
            &self,
            device: Arc<Device>,
            event: &StateChangeEvent,
        ) -> Result<(), HandlerError> {
            self.state_changes
                .lock()
                .push((device.room_name.clone(), event.clone()));
            Ok(())
        }
    }

    #[async_trait]
    impl UnknownEventHandler for Recorder {
        async fn on_unknown_event(
            &self,
            device: Arc<Device>,
            event: &UnknownEvent,
        ) -> Result<(), HandlerError> {
            self.unknown
                .lock()
                .push((device.room_name.clone(), event.event_type.clone()));
            Ok(())
        }
    }

    /// Hangs on the URI `x-file:hang`, records everything else.
    struct Stubborn(Arc<Recorder>);

    #[async_trait]
    impl StateChangeHandler for Stubborn {
        async fn on_state_change(
            &self,
            device: Arc<Device>,
            event: &StateChangeEvent,
        ) -> Result<(), HandlerError> {
            if event.current_track_uri == "x-file:hang" {
                tokio::time::sleep(Duration::from_secs(30)).await;
            }
            self.0.on_state_change(device, event).await
        }
    }

    fn registry() -> Arc<DeviceRegistry> {
        let registry = Arc::new(DeviceRegistry::new());
        registry.register(Device::new("RINCON_A", "Kitchen", "svcA", IpAddr::V4(Ipv4Addr::LOCALHOST)));
        registry
    }

    fn change(service: &str, uri: &str) -> StateChangeEvent {
        StateChangeEvent {
            source: ServiceIdentity::new(service),
            transport_state: TransportState::Playing,
            current_track_uri: uri.to_string(),
            track_metadata: None,
        }
    }

    fn state_event(service: &str, uri: &str) -> EventResult {
        Ok(Event::StateChange(change(service, uri)))
    }

    fn uris(recorder: &Recorder) -> Vec<String> {
        recorder
            .state_changes
            .lock()
            .iter()
            .map(|(_, event)| event.current_track_uri.clone())
            .collect()
    }

    #[tokio::test]
    async fn test_state_change_reaches_handler_with_device() {
        let recorder = Arc::new(Recorder::default());
        let dispatcher = Dispatcher::new(registry(), recorder.clone());

        dispatcher.dispatch(state_event("svcA", "x-file:track1")).await;

        let calls = recorder.state_changes.lock();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, "Kitchen");
        assert_eq!(calls[0].1, change("svcA", "x-file:track1"));
    }

    #[tokio::test]
    async fn test_unresolved_device_does_not_block_next_event() {
        let recorder = Arc::new(Recorder::default());
        let dispatcher = Dispatcher::new(registry(), recorder.clone());

        dispatcher.dispatch(state_event("svcB", "x-file:lost")).await;
        dispatcher.dispatch(state_event("svcA", "x-file:found")).await;

        assert_eq!(uris(&recorder), vec!["x-file:found".to_string()]);
        assert_eq!(dispatcher.stats().snapshot().unresolved_devices, 1);
    }

    #[tokio::test]
    async fn test_malformed_is_reported_not_dispatched() {
        let recorder = Arc::new(Recorder::default());
        let dispatcher = Dispatcher::new(registry(), recorder.clone());

        dispatcher
            .dispatch(Err(DecodeError::Malformed("not xml".to_string())))
            .await;
        dispatcher.dispatch(state_event("svcA", "x-file:after")).await;

        assert_eq!(uris(&recorder), vec!["x-file:after".to_string()]);
        assert_eq!(dispatcher.stats().snapshot().decode_errors, 1);
    }

    #[tokio::test]
    async fn test_partial_decode_still_delivers_transition() {
        let recorder = Arc::new(Recorder::default());
        let dispatcher = Dispatcher::new(registry(), recorder.clone());

        dispatcher
            .dispatch(Err(DecodeError::PartialDecode {
                service: ServiceIdentity::new("svcA"),
                transport_state: TransportState::Stopped,
                current_track_uri: "x-file:track9".to_string(),
                reason: "metadata descriptor has no item".to_string(),
            }))
            .await;

        let calls = recorder.state_changes.lock();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].1.transport_state, TransportState::Stopped);
        assert!(calls[0].1.track_metadata.is_none());
        drop(calls);

        let stats = dispatcher.stats().snapshot();
        assert_eq!(stats.partial_decodes, 1);
        assert_eq!(stats.state_changes_handled, 1);
    }

    #[tokio::test]
    async fn test_unknown_event_goes_to_unknown_handler_once() {
        let recorder = Arc::new(Recorder::default());
        let dispatcher =
            Dispatcher::new(registry(), recorder.clone()).with_unknown_handler(recorder.clone());

        dispatcher
            .dispatch(Ok(Event::Unknown(UnknownEvent {
                source: ServiceIdentity::new("svcA"),
                event_type: EventTypeTag::parse("SomeFutureEventType"),
                body: Bytes::from_static(b"\x01\x02"),
            })))
            .await;
        dispatcher.dispatch(state_event("svcA", "x-file:next")).await;

        let unknown = recorder.unknown.lock().clone();
        assert_eq!(
            unknown,
            vec![(
                "Kitchen".to_string(),
                EventTypeTag::Other("SomeFutureEventType".to_string())
            )]
        );
        assert_eq!(uris(&recorder), vec!["x-file:next".to_string()]);
    }

    #[tokio::test]
    async fn test_handler_timeout_does_not_stall_loop() {
        let recorder = Arc::new(Recorder::default());
        let dispatcher = Dispatcher::new(registry(), Arc::new(Stubborn(recorder.clone())))
            .with_handler_timeout(Duration::from_millis(50));

        let (tx, rx) = mpsc::channel(8);
        let (_shutdown_tx, shutdown_rx) = watch::channel(false);

        tx.send(state_event("svcA", "x-file:hang")).await.unwrap();
        tx.send(state_event("svcA", "x-file:ok")).await.unwrap();
        drop(tx);

        let snapshot = tokio::time::timeout(Duration::from_secs(5), dispatcher.run(rx, shutdown_rx))
            .await
            .expect("dispatch loop stalled");

        assert_eq!(uris(&recorder), vec!["x-file:ok".to_string()]);
        assert_eq!(snapshot.handler_timeouts, 1);
        assert_eq!(snapshot.state_changes_handled, 1);
    }

    #[tokio::test]
    async fn test_run_preserves_order() {
        let recorder = Arc::new(Recorder::default());
        let dispatcher = Dispatcher::new(registry(), recorder.clone());

        let (tx, rx) = mpsc::channel(4);
        let (_shutdown_tx, shutdown_rx) = watch::channel(false);
        let run = tokio::spawn(dispatcher.run(rx, shutdown_rx));

        let expected: Vec<String> = (0..50).map(|i| format!("x-file:track{}", i)).collect();
        for uri in &expected {
            tx.send(state_event("svcA", uri)).await.unwrap();
        }
        drop(tx);

        let snapshot = run.await.unwrap();
        assert_eq!(uris(&recorder), expected);
        assert_eq!(snapshot.state_changes_handled, 50);
    }

    #[tokio::test]
    async fn test_shutdown_drains_buffered_events() {
        let recorder = Arc::new(Recorder::default());
        let dispatcher = Dispatcher::new(registry(), recorder.clone());

        let (tx, rx) = mpsc::channel(16);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        for i in 0..5 {
            tx.send(state_event("svcA", &format!("x-file:queued{}", i)))
                .await
                .unwrap();
        }
        shutdown_tx.send(true).unwrap();

        let run = tokio::spawn(dispatcher.run(rx, shutdown_rx));

        // Still accepted after the signal: the producer decides when it is done
        tx.send(state_event("svcA", "x-file:late")).await.unwrap();
        drop(tx);

        let snapshot = run.await.unwrap();
        assert_eq!(snapshot.state_changes_handled, 6);
        assert_eq!(uris(&recorder).last().map(String::as_str), Some("x-file:late"));
    }
}
