//! HTTP server for receiving UPnP event notifications.

use bytes::Bytes;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use warp::http::StatusCode;
use warp::Filter;

use crate::error::CallbackServerError;
use crate::router::{EventRouter, NotificationPayload, RouteOutcome};

/// HTTP callback server for receiving UPnP event notifications.
///
/// Binds one socket and accepts GENA `NOTIFY` requests on any path. Each
/// request is validated and handed to the [`EventRouter`], which forwards it
/// to the channel given at construction.
///
/// ```no_run
/// use std::net::SocketAddr;
/// use tokio::sync::mpsc;
/// use callback_server::{CallbackServer, NotificationPayload};
///
/// #[tokio::main]
/// async fn main() {
///     let (tx, mut rx) = mpsc::channel::<NotificationPayload>(64);
///     let addr: SocketAddr = "0.0.0.0:5007".parse().unwrap();
///
///     let server = CallbackServer::bind(addr, None, tx)
///         .await
///         .expect("Failed to bind callback server");
///
///     println!("Subscribe with callback <{}>", server.base_url());
///
///     while let Some(notification) = rx.recv().await {
///         println!("{} -> {} bytes", notification.subscription_id, notification.body.len());
///     }
/// }
/// ```
pub struct CallbackServer {
    /// The address the socket is actually bound to
    local_addr: SocketAddr,
    /// URL devices should deliver notifications to
    base_url: String,
    event_router: Arc<EventRouter>,
    shutdown_tx: Option<mpsc::Sender<()>>,
    server_handle: Option<tokio::task::JoinHandle<()>>,
}

impl CallbackServer {
    /// Bind the listener and start serving.
    ///
    /// Binding happens before this returns: an address already in use is
    /// reported as [`CallbackServerError::Bind`] rather than surfacing later
    /// from the server task. Port `0` asks the OS for a free port.
    ///
    /// `advertised_ip` is the address put in [`base_url`](Self::base_url);
    /// when `None` the outbound interface address is detected, falling back
    /// to loopback.
    pub async fn bind(
        addr: SocketAddr,
        advertised_ip: Option<IpAddr>,
        event_sender: mpsc::Sender<NotificationPayload>,
    ) -> Result<Self, CallbackServerError> {
        let event_router = Arc::new(EventRouter::new(event_sender));

        let (shutdown_tx, mut shutdown_rx) = mpsc::channel::<()>(1);

        let routes = notify_route(event_router.clone()).recover(handle_rejection);

        let (local_addr, server) = warp::serve(routes)
            .try_bind_with_graceful_shutdown(addr, async move {
                shutdown_rx.recv().await;
            })
            .map_err(|e| CallbackServerError::Bind {
                addr,
                reason: e.to_string(),
            })?;

        let ip = advertised_ip.unwrap_or_else(|| {
            Self::detect_local_ip().unwrap_or_else(|| {
                warn!("Could not detect a local IP address, advertising loopback");
                IpAddr::V4(Ipv4Addr::LOCALHOST)
            })
        });
        let base_url = format!("http://{}:{}", ip, local_addr.port());

        let server_handle = tokio::spawn(server);

        info!("Callback server listening on {} (advertised as {})", local_addr, base_url);

        Ok(Self {
            local_addr,
            base_url,
            event_router,
            shutdown_tx: Some(shutdown_tx),
            server_handle: Some(server_handle),
        })
    }

    /// The URL to hand to devices as the subscription callback.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Get the port the server is bound to.
    pub fn port(&self) -> u16 {
        self.local_addr.port()
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// The router used to register and unregister subscription IDs.
    pub fn router(&self) -> &Arc<EventRouter> {
        &self.event_router
    }

    /// Stop accepting notifications and wait for in-flight requests.
    pub async fn shutdown(mut self) -> Result<(), CallbackServerError> {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(()).await;
        }

        if let Some(handle) = self.server_handle.take() {
            handle
                .await
                .map_err(|e| CallbackServerError::Task(e.to_string()))?;
        }

        info!("Callback server on {} stopped", self.local_addr);
        Ok(())
    }

    /// Detect the local IP address for callback URLs.
    ///
    /// Uses a connected UDP socket to learn which interface the OS would
    /// route through. No data is sent.
    fn detect_local_ip() -> Option<IpAddr> {
        let socket = std::net::UdpSocket::bind("0.0.0.0:0").ok()?;
        socket.connect("8.8.8.8:80").ok()?;
        let ip = socket.local_addr().ok()?.ip();
        (!ip.is_unspecified()).then_some(ip)
    }
}

/// Validate UPnP event notification headers.
///
/// `SID` is required. `NT`/`NTS` are optional, but when both are present they
/// must be `upnp:event` / `upnp:propchange`.
fn validate_upnp_headers(sid: &Option<String>, nt: &Option<String>, nts: &Option<String>) -> bool {
    if sid.is_none() {
        return false;
    }

    if let (Some(nt_val), Some(nts_val)) = (nt, nts) {
        if nt_val != "upnp:event" || nts_val != "upnp:propchange" {
            return false;
        }
    }

    true
}

fn notify_route(
    router: Arc<EventRouter>,
) -> impl Filter<Extract = (warp::reply::WithStatus<&'static str>,), Error = warp::Rejection> + Clone {
    warp::method()
        .and(warp::path::full())
        .and(warp::header::optional::<String>("sid"))
        .and(warp::header::optional::<String>("nt"))
        .and(warp::header::optional::<String>("nts"))
        .and(warp::header::optional::<String>("seq"))
        .and(warp::body::bytes())
        .and_then(
            move |method: warp::http::Method,
                  path: warp::path::FullPath,
                  sid: Option<String>,
                  nt: Option<String>,
                  nts: Option<String>,
                  seq: Option<String>,
                  body: Bytes| {
                let router = router.clone();
                async move {
                    if method.as_str() != "NOTIFY" {
                        return Err(warp::reject::custom(UnsupportedMethod));
                    }

                    debug!(
                        path = path.as_str(),
                        sid = sid.as_deref().unwrap_or("-"),
                        seq = seq.as_deref().unwrap_or("-"),
                        bytes = body.len(),
                        "NOTIFY received"
                    );

                    if !validate_upnp_headers(&sid, &nt, &nts) {
                        return Err(warp::reject::custom(InvalidUpnpHeaders));
                    }
                    let Some(sid) = sid else {
                        return Err(warp::reject::custom(InvalidUpnpHeaders));
                    };
                    let seq = seq.and_then(|s| s.trim().parse::<u32>().ok());

                    match router.route_event(sid, seq, body).await {
                        RouteOutcome::Routed => Ok(warp::reply::with_status("", StatusCode::OK)),
                        RouteOutcome::UnknownSubscription => {
                            Err(warp::reject::custom(UnknownSubscription))
                        }
                        RouteOutcome::Closed => Err(warp::reject::custom(ConsumerClosed)),
                    }
                }
            },
        )
}

#[derive(Debug)]
struct InvalidUpnpHeaders;

impl warp::reject::Reject for InvalidUpnpHeaders {}

#[derive(Debug)]
struct UnknownSubscription;

impl warp::reject::Reject for UnknownSubscription {}

#[derive(Debug)]
struct ConsumerClosed;

impl warp::reject::Reject for ConsumerClosed {}

#[derive(Debug)]
struct UnsupportedMethod;

impl warp::reject::Reject for UnsupportedMethod {}

/// Handle rejections and convert them to HTTP responses.
async fn handle_rejection(
    err: warp::Rejection,
) -> Result<impl warp::Reply, std::convert::Infallible> {
    let (code, message) = if err.find::<UnknownSubscription>().is_some() {
        // GENA: unknown SID is a failed precondition
        (StatusCode::PRECONDITION_FAILED, "Subscription not found")
    } else if err.find::<InvalidUpnpHeaders>().is_some() {
        (StatusCode::BAD_REQUEST, "Invalid UPnP headers")
    } else if err.find::<UnsupportedMethod>().is_some() {
        (StatusCode::METHOD_NOT_ALLOWED, "Only NOTIFY is accepted")
    } else if err.find::<ConsumerClosed>().is_some() {
        (StatusCode::SERVICE_UNAVAILABLE, "Listener is shutting down")
    } else if err.is_not_found() {
        (StatusCode::NOT_FOUND, "Not found")
    } else {
        (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
    };

    debug!("Rejected callback request: {} {}", code, message);

    Ok(warp::reply::with_status(message, code))
}
