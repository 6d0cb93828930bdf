//! Event routing for HTTP callback notifications.
//!
//! The `EventRouter` maps active subscription IDs (the GENA `SID` header) to
//! the service that owns them and forwards each accepted notification to a
//! bounded channel in arrival order.

use bytes::Bytes;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{mpsc, RwLock};

/// Attribution for a subscription: which service endpoint it belongs to and
/// which kind of events it delivers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionRoute {
    /// Opaque identity of the emitting service endpoint
    pub service_id: String,
    /// Event-type tag declared when the subscription was made
    pub event_type: String,
}

impl SubscriptionRoute {
    pub fn new(service_id: impl Into<String>, event_type: impl Into<String>) -> Self {
        Self {
            service_id: service_id.into(),
            event_type: event_type.into(),
        }
    }
}

/// A notification accepted by the listener.
///
/// Carries the raw body untouched together with the attribution recorded for
/// its subscription. Nothing in here is derived from the body itself.
#[derive(Debug, Clone)]
pub struct NotificationPayload {
    /// The subscription ID from the `SID` header
    pub subscription_id: String,
    /// Service identity registered for the subscription
    pub service_id: String,
    /// Event-type tag registered for the subscription
    pub event_type: String,
    /// GENA event key from the `SEQ` header, if present and numeric
    pub seq: Option<u32>,
    /// Raw request body
    pub body: Bytes,
}

/// Result of handing a notification to the router.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteOutcome {
    /// Queued for the consumer
    Routed,
    /// No route registered for the SID
    UnknownSubscription,
    /// The consumer side of the channel is gone
    Closed,
}

/// Routes events from HTTP callbacks to a channel.
#[derive(Clone)]
pub struct EventRouter {
    routes: Arc<RwLock<HashMap<String, SubscriptionRoute>>>,
    event_sender: mpsc::Sender<NotificationPayload>,
}

impl EventRouter {
    /// Create a new event router.
    ///
    /// ```
    /// use tokio::sync::mpsc;
    /// use callback_server::router::{EventRouter, NotificationPayload};
    ///
    /// let (tx, _rx) = mpsc::channel::<NotificationPayload>(16);
    /// let router = EventRouter::new(tx);
    /// ```
    pub fn new(event_sender: mpsc::Sender<NotificationPayload>) -> Self {
        Self {
            routes: Arc::new(RwLock::new(HashMap::new())),
            event_sender,
        }
    }

    /// Register a subscription ID, returning the route it replaced.
    pub async fn register(
        &self,
        subscription_id: impl Into<String>,
        route: SubscriptionRoute,
    ) -> Option<SubscriptionRoute> {
        let mut routes = self.routes.write().await;
        routes.insert(subscription_id.into(), route)
    }

    /// Unregister a subscription ID.
    pub async fn unregister(&self, subscription_id: &str) -> Option<SubscriptionRoute> {
        let mut routes = self.routes.write().await;
        routes.remove(subscription_id)
    }

    /// Number of registered subscriptions.
    pub async fn subscription_count(&self) -> usize {
        self.routes.read().await.len()
    }

    /// Route an incoming notification.
    ///
    /// Waits for channel capacity when the consumer is behind, so a slow
    /// consumer stalls the sending device instead of losing events.
    pub async fn route_event(
        &self,
        subscription_id: String,
        seq: Option<u32>,
        body: Bytes,
    ) -> RouteOutcome {
        let route = {
            let routes = self.routes.read().await;
            match routes.get(&subscription_id) {
                Some(route) => route.clone(),
                None => return RouteOutcome::UnknownSubscription,
            }
        };

        let payload = NotificationPayload {
            subscription_id,
            service_id: route.service_id,
            event_type: route.event_type,
            seq,
            body,
        };

        match self.event_sender.send(payload).await {
            Ok(()) => RouteOutcome::Routed,
            Err(_) => RouteOutcome::Closed,
        }
    }
}
