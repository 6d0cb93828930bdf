//! Identity types and the monitored device record.

use std::fmt;
use std::net::IpAddr;

/// Default UPnP control port on Sonos players.
pub const DEFAULT_DEVICE_PORT: u16 = 1400;

/// Opaque token naming one device's event-emitting service endpoint.
///
/// This is the correlation key: the transport layer attributes every
/// notification to one, and the registry maps it back to a [`Device`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ServiceIdentity(String);

impl ServiceIdentity {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ServiceIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ServiceIdentity {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for ServiceIdentity {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Stable device identity (the UPnP UDN, e.g. `RINCON_000E58A0123401400`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DeviceId(String);

impl DeviceId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DeviceId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Event classification declared by the subscription layer.
///
/// Only AVTransport changes are decoded; everything else is carried through
/// as [`EventTypeTag::Other`] with the tag exactly as it was declared.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EventTypeTag {
    AVTransport,
    Other(String),
}

impl EventTypeTag {
    /// Classify a declared tag.
    ///
    /// Accepts the bare service name `AVTransport` as well as service type
    /// URNs such as `urn:schemas-upnp-org:service:AVTransport:1`.
    pub fn parse(tag: &str) -> Self {
        let tag = tag.trim();
        if tag == "AVTransport" || tag.contains(":service:AVTransport:") {
            Self::AVTransport
        } else {
            Self::Other(tag.to_string())
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::AVTransport => "AVTransport",
            Self::Other(tag) => tag,
        }
    }
}

impl fmt::Display for EventTypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for EventTypeTag {
    fn from(tag: &str) -> Self {
        Self::parse(tag)
    }
}

/// A monitored player.
///
/// Immutable once registered; a reconnecting player is registered again as a
/// fresh record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Device {
    pub id: DeviceId,
    /// Display name, e.g. "Kitchen"
    pub room_name: String,
    /// The endpoint that appears as `source` on this device's events
    pub service: ServiceIdentity,
    pub ip_address: IpAddr,
    /// Control port used for position queries
    pub port: u16,
}

impl Device {
    pub fn new(
        id: impl Into<DeviceId>,
        room_name: impl Into<String>,
        service: impl Into<ServiceIdentity>,
        ip_address: IpAddr,
    ) -> Self {
        Self {
            id: id.into(),
            room_name: room_name.into(),
            service: service.into(),
            ip_address,
            port: DEFAULT_DEVICE_PORT,
        }
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({} @ {})", self.room_name, self.id, self.ip_address)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::net::Ipv4Addr;

    #[rstest]
    #[case::bare("AVTransport", EventTypeTag::AVTransport)]
    #[case::urn_v1("urn:schemas-upnp-org:service:AVTransport:1", EventTypeTag::AVTransport)]
    #[case::urn_v3("urn:schemas-upnp-org:service:AVTransport:3", EventTypeTag::AVTransport)]
    #[case::padded("  AVTransport ", EventTypeTag::AVTransport)]
    #[case::rendering("RenderingControl", EventTypeTag::Other("RenderingControl".to_string()))]
    #[case::future("SomeFutureEventType", EventTypeTag::Other("SomeFutureEventType".to_string()))]
    #[case::case_sensitive("avtransport", EventTypeTag::Other("avtransport".to_string()))]
    fn test_event_type_tag_parse(#[case] raw: &str, #[case] expected: EventTypeTag) {
        assert_eq!(EventTypeTag::parse(raw), expected);
    }

    #[test]
    fn test_event_type_tag_as_str_keeps_declared_text() {
        assert_eq!(EventTypeTag::AVTransport.as_str(), "AVTransport");
        assert_eq!(EventTypeTag::from("ZoneGroupTopology").to_string(), "ZoneGroupTopology");
    }

    #[test]
    fn test_device_defaults_to_sonos_port() {
        let device = Device::new(
            "RINCON_000E58A0123401400",
            "Kitchen",
            "svcA",
            IpAddr::V4(Ipv4Addr::new(192, 168, 1, 20)),
        );
        assert_eq!(device.port, 1400);
        assert_eq!(device.service, ServiceIdentity::new("svcA"));
        assert_eq!(device.with_port(1443).port, 1443);
    }

    #[test]
    fn test_identity_display() {
        assert_eq!(ServiceIdentity::from("svcA").to_string(), "svcA");
        assert_eq!(DeviceId::from("RINCON_1").to_string(), "RINCON_1");
    }
}
