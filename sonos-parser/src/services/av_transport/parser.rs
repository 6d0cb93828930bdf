//! AVTransport service parser implementation
//!
//! Serde-based parsing for AVTransport UPnP events. The notification body is
//! a GENA `propertyset`; its `LastChange` property holds an escaped XML
//! document that is decoded in a second pass. The DIDL-Lite in
//! `CurrentTrackMetaData` is left as a string so the caller can tell a broken
//! descriptor apart from a broken envelope.

use crate::common::attributes::val_or_empty;
use crate::common::{xml_decode, ValueAttribute};
use crate::error::{ParseError, ParseResult};
use serde::{Deserialize, Serialize};

/// GENA envelope as it arrives in the NOTIFY body:
/// ```xml
/// <e:propertyset xmlns:e="urn:schemas-upnp-org:event-1-0">
///   <e:property>
///     <LastChange>...</LastChange>
///   </e:property>
/// </e:propertyset>
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(rename = "propertyset")]
struct PropertySet {
    #[serde(rename = "property", default)]
    properties: Vec<Property>,
}

#[derive(Debug, Clone, Deserialize)]
struct Property {
    #[serde(rename = "LastChange", default)]
    last_change: Option<String>,
}

/// Parsed AVTransport notification.
#[derive(Debug, Clone, Serialize)]
pub struct AVTransportParser {
    /// The decoded `LastChange` document
    pub last_change: LastChangeEvent,
}

/// The root element for decoded LastChange content.
///
/// ```xml
/// <Event xmlns="urn:schemas-upnp-org:metadata-1-0/AVT/">
///   <InstanceID val="0">
///     <TransportState val="PLAYING"/>
///     ...
///   </InstanceID>
/// </Event>
/// ```
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename = "Event")]
pub struct LastChangeEvent {
    /// The instance containing all state variables
    #[serde(rename = "InstanceID")]
    pub instance: InstanceID,
}

/// Instance containing AVTransport state variables.
///
/// Players only send the variables that changed, so every leaf is optional.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct InstanceID {
    /// Instance ID (usually "0")
    #[serde(rename = "@val", default)]
    pub id: String,

    /// PLAYING, PAUSED_PLAYBACK, STOPPED, TRANSITIONING, ...
    #[serde(rename = "TransportState", default)]
    pub transport_state: Option<ValueAttribute>,

    #[serde(rename = "CurrentTrackURI", default)]
    pub current_track_uri: Option<ValueAttribute>,

    /// Escaped DIDL-Lite for the current track, unescaped once
    #[serde(rename = "CurrentTrackMetaData", default)]
    pub current_track_metadata: Option<ValueAttribute>,
}

impl AVTransportParser {
    /// Parse an AVTransport NOTIFY body.
    ///
    /// The first `property` carrying a `LastChange` is used. A missing
    /// `LastChange` is [`ParseError::MissingRequiredElement`]; a broken
    /// envelope or `LastChange` document fails with the error from that pass.
    pub fn from_xml(xml: &str) -> ParseResult<Self> {
        let envelope: PropertySet = xml_decode::parse(xml)?;

        let last_change = envelope
            .properties
            .into_iter()
            .find_map(|p| p.last_change)
            .ok_or_else(|| ParseError::MissingRequiredElement("LastChange".to_string()))?;

        Ok(Self {
            last_change: LastChangeEvent::from_xml(&last_change)?,
        })
    }

    /// Transport state exactly as sent, empty when absent.
    pub fn transport_state(&self) -> &str {
        val_or_empty(self.last_change.instance.transport_state.as_ref())
    }

    /// Current track URI exactly as sent, empty when absent.
    pub fn current_track_uri(&self) -> &str {
        val_or_empty(self.last_change.instance.current_track_uri.as_ref())
    }

    /// Raw DIDL-Lite descriptor for the current track, empty when absent.
    pub fn current_track_metadata(&self) -> &str {
        val_or_empty(self.last_change.instance.current_track_metadata.as_ref())
    }
}

impl LastChangeEvent {
    /// Parse LastChange XML directly.
    pub fn from_xml(xml: &str) -> ParseResult<Self> {
        xml_decode::parse(xml)
    }
}
