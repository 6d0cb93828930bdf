//! The event reactor: owns the notification listener and the decoder task.
//!
//! Notifications accepted by the listener are decoded in arrival order and
//! every result, failures included, is published on one bounded queue. When
//! the queue is full the reactor waits, which in turn holds the sending
//! device's HTTP request open; nothing is dropped.

use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use callback_server::{CallbackServer, NotificationPayload, SubscriptionRoute};

use crate::config::MonitorConfig;
use crate::decoder;
use crate::dispatch::EventResult;
use crate::error::TransportError;
use crate::event::Event;
use crate::stats::MonitorStats;
use crate::types::{EventTypeTag, ServiceIdentity};

/// A running listener plus the task decoding what it receives.
pub struct EventReactor {
    server: CallbackServer,
    task: JoinHandle<Result<(), TransportError>>,
}

impl EventReactor {
    /// Bind the listener and start decoding into `output`.
    ///
    /// A bind failure is returned as [`TransportError::BindFailed`]; it is
    /// not retried.
    pub async fn start(
        config: &MonitorConfig,
        output: mpsc::Sender<EventResult>,
        stats: Arc<MonitorStats>,
    ) -> Result<Self, TransportError> {
        let (inbound_tx, inbound_rx) = mpsc::channel(config.event_buffer_size);

        let server = CallbackServer::bind(config.listen_addr(), config.advertised_ip, inbound_tx).await?;
        let task = tokio::spawn(run(inbound_rx, output, stats));

        info!(callback_url = server.base_url(), "Event reactor started");

        Ok(Self { server, task })
    }

    /// The URL the subscription layer must advertise as `CALLBACK`.
    pub fn callback_url(&self) -> &str {
        self.server.base_url()
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.server.local_addr()
    }

    /// Attribute notifications carrying `sid` to `service` and `event_type`.
    pub async fn register_subscription(
        &self,
        sid: impl Into<String>,
        service: ServiceIdentity,
        event_type: EventTypeTag,
    ) {
        let sid = sid.into();
        let route = SubscriptionRoute::new(service.as_str(), event_type.as_str());
        if let Some(previous) = self.server.router().register(sid.clone(), route).await {
            debug!(sid = %sid, previous = %previous.service_id, "Subscription re-attributed");
        }
        debug!(sid = %sid, service = %service, event_type = %event_type, "Subscription registered");
    }

    /// Stop accepting notifications for `sid`. Returns whether it was known.
    pub async fn unregister_subscription(&self, sid: &str) -> bool {
        self.server.router().unregister(sid).await.is_some()
    }

    /// Stop the listener, then finish publishing everything it accepted.
    ///
    /// The output sender is dropped once the last queued notification has
    /// been published, which lets the consumer finish its own drain.
    pub async fn shutdown(self) -> Result<(), TransportError> {
        self.server.shutdown().await?;
        let result = self
            .task
            .await
            .map_err(|e| TransportError::ListenerClosed(e.to_string()))?;
        info!("Event reactor stopped");
        result
    }
}

/// Decode loop. Ends when the listener side of `inbound` is gone.
async fn run(
    mut inbound: mpsc::Receiver<NotificationPayload>,
    output: mpsc::Sender<EventResult>,
    stats: Arc<MonitorStats>,
) -> Result<(), TransportError> {
    while let Some(notification) = inbound.recv().await {
        stats.record_notification();

        let source = ServiceIdentity::new(notification.service_id);
        let event_type = EventTypeTag::parse(&notification.event_type);
        debug!(
            sid = %notification.subscription_id,
            seq = ?notification.seq,
            service = %source,
            event_type = %event_type,
            bytes = notification.body.len(),
            "Decoding notification"
        );

        let decoded = decoder::decode(&source, &event_type, &notification.body);
        match &decoded {
            Ok(Event::Unknown(unknown)) => {
                stats.record_unsupported();
                debug!(error = %unknown.unsupported(), "Publishing unrecognised event");
            }
            Err(err) => debug!(service = %source, error = %err, "Publishing decode failure"),
            Ok(Event::StateChange(_)) => {}
        }

        if output.send(decoded).await.is_err() {
            warn!("Event consumer is gone, stopping reactor");
            return Err(TransportError::ListenerClosed(
                "event consumer dropped".to_string(),
            ));
        }
    }

    debug!("Listener queue closed");
    Ok(())
}
