//! # sonos-monitor
//!
//! Receives UPnP event notifications from Sonos players, decodes them into
//! typed events, works out which player sent each one and hands it to your
//! handler. A malformed or unexpected notification is reported and skipped;
//! it never stops the monitor.
//!
//! ## Architecture
//!
//! ```text
//! NOTIFY ─► EventReactor ─► decoder ─► [bounded queue] ─► Dispatcher ─► handler
//!           (listener)       │                             │
//!                            └─ metadata (DIDL-Lite)       └─ DeviceRegistry
//! ```
//!
//! - [`decoder::decode`] and [`metadata::decode`] are pure functions.
//! - [`DeviceRegistry`] maps a [`ServiceIdentity`] to its [`Device`].
//! - [`EventReactor`] owns the listener and publishes
//!   `Result<Event, DecodeError>` in arrival order.
//! - [`Dispatcher`] consumes that queue, correlates, and calls the
//!   [`StateChangeHandler`] or [`UnknownEventHandler`].
//! - [`EventMonitor`] wires it all together.
//!
//! Discovery and the SUBSCRIBE handshake live elsewhere: register devices in
//! the registry, and register each subscription ID with the monitor so the
//! listener knows who a notification belongs to.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use sonos_monitor::{
//!     async_trait, Device, EventMonitor, EventTypeTag, HandlerError, MonitorConfig,
//!     StateChangeEvent, StateChangeHandler,
//! };
//!
//! struct PrintState;
//!
//! #[async_trait]
//! impl StateChangeHandler for PrintState {
//!     async fn on_state_change(&self, device: Arc<Device>, event: &StateChangeEvent) -> Result<(), HandlerError> {
//!         println!("{}: {}", device.room_name, event.transport_state);
//!         Ok(())
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let monitor = EventMonitor::builder(MonitorConfig::default())
//!         .state_change_handler(Arc::new(PrintState))
//!         .start()
//!         .await?;
//!
//!     monitor.registry().register(Device::new(
//!         "RINCON_000E58A0123401400",
//!         "Kitchen",
//!         "RINCON_000E58A0123401400",
//!         "192.168.1.20".parse()?,
//!     ));
//!     monitor
//!         .register_subscription("uuid:RINCON_000E58A0123401400_sub0000000042", "RINCON_000E58A0123401400".into(), EventTypeTag::AVTransport)
//!         .await;
//!
//!     tokio::signal::ctrl_c().await?;
//!     monitor.shutdown().await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod decoder;
pub mod dispatch;
pub mod error;
pub mod event;
pub mod handlers;
pub mod logging;
pub mod metadata;
pub mod monitor;
pub mod position;
pub mod reactor;
pub mod registry;
pub mod stats;
pub mod types;

pub use config::MonitorConfig;
pub use dispatch::{Dispatcher, EventResult};
pub use error::{
    ConfigError, CorrelationError, DecodeError, HandlerError, MonitorError, Result, TransportError,
};
pub use event::{Event, StateChangeEvent, TrackMetadata, TransportState, UnknownEvent};
pub use handlers::{LogUnknownEvents, LoggingHandler, StateChangeHandler, UnknownEventHandler};
pub use monitor::{EventMonitor, EventMonitorBuilder};
pub use position::{PositionInfo, PositionQuery, SoapPositionQuery};
pub use reactor::EventReactor;
pub use registry::{Correlator, DeviceRegistry};
pub use stats::{MonitorStats, StatsSnapshot};
pub use types::{Device, DeviceId, EventTypeTag, ServiceIdentity};

// Handler implementations need the same macro the traits are declared with
pub use async_trait::async_trait;
