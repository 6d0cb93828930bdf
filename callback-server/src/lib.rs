//! UPnP callback listener for receiving GENA event notifications.
//!
//! Devices that accepted a `SUBSCRIBE` push their state changes back as HTTP
//! `NOTIFY` requests. This crate owns that inbound side and nothing else:
//!
//! - [`CallbackServer`]: binds one socket and accepts `NOTIFY` on any path.
//! - [`EventRouter`]: maps the `SID` header to the [`SubscriptionRoute`]
//!   recorded for it and queues a [`NotificationPayload`] on a bounded channel.
//!
//! The listener never looks inside the body. Attribution (which service sent
//! it, what kind of event it is) comes from the route registered alongside the
//! subscription, so decoding stays the consumer's job.
//!
//! ```no_run
//! use callback_server::{CallbackServer, NotificationPayload, SubscriptionRoute};
//! use tokio::sync::mpsc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let (tx, mut rx) = mpsc::channel::<NotificationPayload>(256);
//!     let server = CallbackServer::bind("0.0.0.0:5007".parse()?, None, tx).await?;
//!
//!     server
//!         .router()
//!         .register("uuid:RINCON_000E58A0123401400_sub0000000001", SubscriptionRoute::new("RINCON_000E58A0123401400", "AVTransport"))
//!         .await;
//!
//!     while let Some(notification) = rx.recv().await {
//!         println!("{} sent {} bytes", notification.service_id, notification.body.len());
//!     }
//!
//!     server.shutdown().await?;
//!     Ok(())
//! }
//! ```

mod error;
pub mod router;
mod server;

pub use error::CallbackServerError;
pub use router::{EventRouter, NotificationPayload, RouteOutcome, SubscriptionRoute};
pub use server::CallbackServer;
