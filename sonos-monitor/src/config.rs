//! Configuration for the event monitor
//!
//! Controls where the notification listener binds, what callback address it
//! advertises, how deep the event queue is, and how long handlers and
//! position queries may take.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

use crate::error::ConfigError;

/// Configuration for an [`EventMonitor`](crate::EventMonitor)
#[derive(Debug, Clone, PartialEq)]
pub struct MonitorConfig {
    /// Port the notification listener binds to; `0` picks a free port
    /// Default: 5007
    pub callback_port: u16,

    /// Local address the listener binds to
    /// Default: 0.0.0.0
    pub bind_address: IpAddr,

    /// Address put in the callback URL handed to devices
    /// Default: None (detect the outbound interface)
    pub advertised_ip: Option<IpAddr>,

    /// Capacity of the listener and event queues
    /// Default: 1000
    pub event_buffer_size: usize,

    /// Upper bound on one handler invocation
    /// Default: 5 seconds
    pub handler_timeout: Duration,

    /// Upper bound on one position query made from a handler
    /// Default: 3 seconds
    pub position_timeout: Duration,

    /// Connect timeout of the SOAP client used for position queries
    /// Default: 2 seconds
    pub soap_connect_timeout: Duration,

    /// Read timeout of the SOAP client used for position queries
    /// Default: 3 seconds
    pub soap_read_timeout: Duration,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            callback_port: 5007,
            bind_address: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            advertised_ip: None,
            event_buffer_size: 1000,
            handler_timeout: Duration::from_secs(5),
            position_timeout: Duration::from_secs(3),
            soap_connect_timeout: Duration::from_secs(2),
            soap_read_timeout: Duration::from_secs(3),
        }
    }
}

impl MonitorConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Listener on an ephemeral loopback port, advertised as loopback
    pub fn loopback() -> Self {
        Self {
            callback_port: 0,
            bind_address: IpAddr::V4(Ipv4Addr::LOCALHOST),
            advertised_ip: Some(IpAddr::V4(Ipv4Addr::LOCALHOST)),
            event_buffer_size: 64,
            ..Default::default()
        }
    }

    /// Smaller queues and shorter remote-call budgets for small setups
    pub fn resource_efficient() -> Self {
        Self {
            event_buffer_size: 100,
            handler_timeout: Duration::from_secs(3),
            position_timeout: Duration::from_secs(2),
            soap_connect_timeout: Duration::from_secs(1),
            soap_read_timeout: Duration::from_secs(2),
            ..Default::default()
        }
    }

    /// The socket address the listener binds to.
    pub fn listen_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_address, self.callback_port)
    }

    /// Validate the configuration and return any issues
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.event_buffer_size == 0 {
            return Err(ConfigError::Invalid(
                "Event buffer size must be greater than 0".to_string(),
            ));
        }

        if self.handler_timeout == Duration::ZERO {
            return Err(ConfigError::Invalid(
                "Handler timeout must be greater than 0".to_string(),
            ));
        }

        if self.position_timeout == Duration::ZERO {
            return Err(ConfigError::Invalid(
                "Position timeout must be greater than 0".to_string(),
            ));
        }

        if self.position_timeout > self.handler_timeout {
            return Err(ConfigError::Invalid(
                "Position timeout must not exceed the handler timeout".to_string(),
            ));
        }

        if self.soap_connect_timeout == Duration::ZERO || self.soap_read_timeout == Duration::ZERO {
            return Err(ConfigError::Invalid(
                "SOAP timeouts must be greater than 0".to_string(),
            ));
        }

        if self.advertised_ip.is_some_and(|ip| ip.is_unspecified()) {
            return Err(ConfigError::Invalid(
                "Advertised IP must be a routable address".to_string(),
            ));
        }

        Ok(())
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.callback_port = port;
        self
    }

    pub fn with_bind_address(mut self, address: IpAddr) -> Self {
        self.bind_address = address;
        self
    }

    pub fn with_advertised_ip(mut self, ip: IpAddr) -> Self {
        self.advertised_ip = Some(ip);
        self
    }

    pub fn with_event_buffer_size(mut self, size: usize) -> Self {
        self.event_buffer_size = size;
        self
    }

    pub fn with_handler_timeout(mut self, timeout: Duration) -> Self {
        self.handler_timeout = timeout;
        self
    }

    pub fn with_position_timeout(mut self, timeout: Duration) -> Self {
        self.position_timeout = timeout;
        self
    }

    pub fn with_soap_timeouts(mut self, connect: Duration, read: Duration) -> Self {
        self.soap_connect_timeout = connect;
        self.soap_read_timeout = read;
        self
    }
}
