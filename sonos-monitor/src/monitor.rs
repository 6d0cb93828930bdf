//! [`EventMonitor`]: reactor, dispatch loop and shutdown signal wired together.

use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::info;

use crate::config::MonitorConfig;
use crate::dispatch::Dispatcher;
use crate::error::{Result, TransportError};
use crate::handlers::{LogUnknownEvents, LoggingHandler, StateChangeHandler, UnknownEventHandler};
use crate::position::SoapPositionQuery;
use crate::reactor::EventReactor;
use crate::registry::DeviceRegistry;
use crate::stats::{MonitorStats, StatsSnapshot};
use crate::types::{EventTypeTag, ServiceIdentity};

/// A running monitor.
///
/// ```rust,no_run
/// use sonos_monitor::{Device, EventMonitor, EventTypeTag, MonitorConfig};
///
/// # async fn example() -> sonos_monitor::Result<()> {
/// let monitor = EventMonitor::builder(MonitorConfig::default()).start().await?;
///
/// monitor.registry().register(Device::new(
///     "RINCON_000E58A0123401400",
///     "Kitchen",
///     "RINCON_000E58A0123401400/AVTransport",
///     "192.168.1.20".parse().unwrap(),
/// ));
/// // After SUBSCRIBE-ing with CALLBACK <{callback_url}>:
/// monitor
///     .register_subscription(
///         "uuid:RINCON_000E58A0123401400_sub0000000042",
///         "RINCON_000E58A0123401400/AVTransport".into(),
///         EventTypeTag::AVTransport,
///     )
///     .await;
///
/// let stats = monitor.shutdown().await?;
/// println!("handled {} state changes", stats.state_changes_handled);
/// # Ok(())
/// # }
/// ```
pub struct EventMonitor {
    registry: Arc<DeviceRegistry>,
    reactor: EventReactor,
    dispatcher: JoinHandle<StatsSnapshot>,
    shutdown_tx: watch::Sender<bool>,
    stats: Arc<MonitorStats>,
}

/// Builder for [`EventMonitor`].
pub struct EventMonitorBuilder {
    config: MonitorConfig,
    registry: Option<Arc<DeviceRegistry>>,
    state_handler: Option<Arc<dyn StateChangeHandler>>,
    unknown_handler: Option<Arc<dyn UnknownEventHandler>>,
}

impl EventMonitorBuilder {
    /// Share an existing registry instead of creating an empty one.
    pub fn registry(mut self, registry: Arc<DeviceRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Defaults to [`LoggingHandler`] with SOAP position queries.
    pub fn state_change_handler(mut self, handler: Arc<dyn StateChangeHandler>) -> Self {
        self.state_handler = Some(handler);
        self
    }

    /// Defaults to [`LogUnknownEvents`].
    pub fn unknown_event_handler(mut self, handler: Arc<dyn UnknownEventHandler>) -> Self {
        self.unknown_handler = Some(handler);
        self
    }

    /// Validate the configuration, bind the listener and start both tasks.
    pub async fn start(self) -> Result<EventMonitor> {
        let config = self.config;
        config.validate()?;

        let registry = self.registry.unwrap_or_default();
        let stats = Arc::new(MonitorStats::new());

        let state_handler: Arc<dyn StateChangeHandler> = match self.state_handler {
            Some(handler) => handler,
            None => Arc::new(LoggingHandler::with_position_query(
                Arc::new(SoapPositionQuery::from_config(&config)),
                config.position_timeout,
            )),
        };
        let unknown_handler: Arc<dyn UnknownEventHandler> = match self.unknown_handler {
            Some(handler) => handler,
            None => Arc::new(LogUnknownEvents),
        };

        let (event_tx, event_rx) = mpsc::channel(config.event_buffer_size);
        let reactor = EventReactor::start(&config, event_tx, stats.clone()).await?;

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let dispatcher = Dispatcher::new(registry.clone(), state_handler)
            .with_unknown_handler(unknown_handler)
            .with_handler_timeout(config.handler_timeout)
            .with_stats(stats.clone());
        let dispatcher = tokio::spawn(dispatcher.run(event_rx, shutdown_rx));

        info!(callback_url = reactor.callback_url(), "Event monitor running");

        Ok(EventMonitor {
            registry,
            reactor,
            dispatcher,
            shutdown_tx,
            stats,
        })
    }
}

impl EventMonitor {
    pub fn builder(config: MonitorConfig) -> EventMonitorBuilder {
        EventMonitorBuilder {
            config,
            registry: None,
            state_handler: None,
            unknown_handler: None,
        }
    }

    pub fn registry(&self) -> &Arc<DeviceRegistry> {
        &self.registry
    }

    pub fn callback_url(&self) -> &str {
        self.reactor.callback_url()
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.reactor.local_addr()
    }

    /// See [`EventReactor::register_subscription`].
    pub async fn register_subscription(
        &self,
        sid: impl Into<String>,
        service: ServiceIdentity,
        event_type: EventTypeTag,
    ) {
        self.reactor
            .register_subscription(sid, service, event_type)
            .await
    }

    pub async fn unregister_subscription(&self, sid: &str) -> bool {
        self.reactor.unregister_subscription(sid).await
    }

    /// Counters so far.
    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    /// Stop listening, drain everything already accepted, and return the
    /// final counters.
    pub async fn shutdown(self) -> Result<StatsSnapshot> {
        info!("Shutting down event monitor");
        // Err only means the dispatcher already exited
        let _ = self.shutdown_tx.send(true);

        let reactor_result = self.reactor.shutdown().await;
        let snapshot = self
            .dispatcher
            .await
            .map_err(|e| TransportError::ListenerClosed(e.to_string()))?;
        reactor_result?;

        Ok(snapshot)
    }
}
