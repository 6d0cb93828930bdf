//! Notification body to typed [`Event`].

use bytes::Bytes;
use sonos_parser::AVTransportParser;

use crate::error::DecodeError;
use crate::event::{Event, StateChangeEvent, TransportState, UnknownEvent};
use crate::metadata;
use crate::types::{EventTypeTag, ServiceIdentity};

/// Decode one notification body.
///
/// `source` and `event_type` come from the subscription the notification was
/// delivered on; nothing about identity is read from the body.
///
/// - [`EventTypeTag::Other`] always yields [`Event::Unknown`] carrying the raw
///   body. [`UnknownEvent::unsupported`] gives the matching error to report.
/// - [`EventTypeTag::AVTransport`] reads `TransportState`, `CurrentTrackURI`
///   and `CurrentTrackMetaData` from the `LastChange` property. Missing fields
///   decode as empty strings. A broken metadata descriptor turns the result
///   into [`DecodeError::PartialDecode`] carrying the transport fields.
pub fn decode(
    source: &ServiceIdentity,
    event_type: &EventTypeTag,
    body: &[u8],
) -> Result<Event, DecodeError> {
    match event_type {
        EventTypeTag::AVTransport => decode_av_transport(source, body).map(Event::StateChange),
        EventTypeTag::Other(_) => Ok(Event::Unknown(UnknownEvent {
            source: source.clone(),
            event_type: event_type.clone(),
            body: Bytes::copy_from_slice(body),
        })),
    }
}

fn decode_av_transport(source: &ServiceIdentity, body: &[u8]) -> Result<StateChangeEvent, DecodeError> {
    let xml = std::str::from_utf8(body)
        .map_err(|e| DecodeError::Malformed(format!("body is not UTF-8: {}", e)))?;

    let parsed = AVTransportParser::from_xml(xml)?;
    let transport_state = TransportState::from(parsed.transport_state());
    let current_track_uri = parsed.current_track_uri().to_string();

    match metadata::decode(parsed.current_track_metadata()) {
        Ok(track_metadata) => Ok(StateChangeEvent {
            source: source.clone(),
            transport_state,
            current_track_uri,
            track_metadata,
        }),
        Err(err) => Err(DecodeError::PartialDecode {
            service: source.clone(),
            transport_state,
            current_track_uri,
            reason: err.to_string(),
        }),
    }
}
