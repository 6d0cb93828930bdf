//! Error types for the sonos-monitor crate.

use std::net::SocketAddr;
use std::time::Duration;

use callback_server::CallbackServerError;
use sonos_parser::ParseError;

use crate::event::{StateChangeEvent, TransportState};
use crate::types::{EventTypeTag, ServiceIdentity};

/// Errors from turning a notification body into an [`Event`](crate::Event).
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DecodeError {
    /// The payload is not a well-formed document of the expected shape
    #[error("Malformed payload: {0}")]
    Malformed(String),

    /// The declared event type is not one this crate decodes
    #[error("Unsupported event type {event_type} from {service}")]
    UnsupportedType {
        service: ServiceIdentity,
        event_type: EventTypeTag,
    },

    /// Transport fields decoded but the embedded track metadata did not
    #[error("Partial decode of {service} ({transport_state}): track metadata dropped: {reason}")]
    PartialDecode {
        service: ServiceIdentity,
        transport_state: TransportState,
        current_track_uri: String,
        reason: String,
    },
}

impl DecodeError {
    /// The state change that survived a [`DecodeError::PartialDecode`], with
    /// no track metadata.
    pub fn recovered(&self) -> Option<StateChangeEvent> {
        match self {
            DecodeError::PartialDecode {
                service,
                transport_state,
                current_track_uri,
                ..
            } => Some(StateChangeEvent {
                source: service.clone(),
                transport_state: transport_state.clone(),
                current_track_uri: current_track_uri.clone(),
                track_metadata: None,
            }),
            _ => None,
        }
    }
}

impl From<ParseError> for DecodeError {
    fn from(err: ParseError) -> Self {
        DecodeError::Malformed(err.to_string())
    }
}

/// Errors from mapping an event back to a registered device.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CorrelationError {
    #[error("No registered device for service {service}")]
    DeviceUnresolved { service: ServiceIdentity },
}

/// Errors from the inbound notification listener.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("Failed to bind event listener on {addr}: {reason}")]
    BindFailed { addr: SocketAddr, reason: String },

    #[error("Event listener closed: {0}")]
    ListenerClosed(String),
}

impl From<CallbackServerError> for TransportError {
    fn from(err: CallbackServerError) -> Self {
        match err {
            CallbackServerError::Bind { addr, reason } => TransportError::BindFailed { addr, reason },
            CallbackServerError::Task(reason) => TransportError::ListenerClosed(reason),
        }
    }
}

/// Errors returned by event handlers.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HandlerError {
    #[error("{operation} failed: {reason}")]
    RemoteCallFailed { operation: String, reason: String },

    #[error("{operation} timed out after {after:?}")]
    RemoteCallTimedOut { operation: String, after: Duration },
}

/// Invalid [`MonitorConfig`](crate::MonitorConfig) values.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Errors from starting or stopping an [`EventMonitor`](crate::EventMonitor).
#[derive(Debug, thiserror::Error)]
pub enum MonitorError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// Result type for monitor startup and shutdown.
pub type Result<T> = std::result::Result<T, MonitorError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{IpAddr, Ipv4Addr};

    #[test]
    fn test_partial_decode_recovers_state_change() {
        let err = DecodeError::PartialDecode {
            service: ServiceIdentity::new("svcA"),
            transport_state: TransportState::Playing,
            current_track_uri: "x-file:track1".to_string(),
            reason: "no item".to_string(),
        };

        let recovered = err.recovered().unwrap();
        assert_eq!(recovered.source.as_str(), "svcA");
        assert_eq!(recovered.transport_state, TransportState::Playing);
        assert_eq!(recovered.current_track_uri, "x-file:track1");
        assert!(recovered.track_metadata.is_none());
    }

    #[test]
    fn test_other_decode_errors_recover_nothing() {
        assert!(DecodeError::Malformed("bad".to_string()).recovered().is_none());
        assert!(DecodeError::UnsupportedType {
            service: ServiceIdentity::new("svcA"),
            event_type: EventTypeTag::parse("Queue"),
        }
        .recovered()
        .is_none());
    }

    #[test]
    fn test_parse_error_becomes_malformed() {
        let err: DecodeError = ParseError::InvalidXmlStructure("eof".to_string()).into();
        assert!(matches!(err, DecodeError::Malformed(msg) if msg.contains("eof")));
    }

    #[test]
    fn test_callback_bind_error_becomes_bind_failed() {
        let addr = SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 5007);
        let err: TransportError = CallbackServerError::Bind {
            addr,
            reason: "address in use".to_string(),
        }
        .into();

        match err {
            TransportError::BindFailed { addr: got, reason } => {
                assert_eq!(got, addr);
                assert_eq!(reason, "address in use");
            }
            other => panic!("Unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_error_display() {
        let err = HandlerError::RemoteCallTimedOut {
            operation: "GetPositionInfo".to_string(),
            after: Duration::from_secs(3),
        };
        assert_eq!(err.to_string(), "GetPositionInfo timed out after 3s");

        let err = CorrelationError::DeviceUnresolved {
            service: ServiceIdentity::new("svcB"),
        };
        assert_eq!(err.to_string(), "No registered device for service svcB");
    }
}
