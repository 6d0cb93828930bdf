//! Typed events produced by the decoder.

use bytes::Bytes;
use std::fmt;

use crate::error::DecodeError;
use crate::types::{EventTypeTag, ServiceIdentity};

/// A decoded notification.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// An AVTransport change
    StateChange(StateChangeEvent),
    /// A notification of a type this crate does not decode
    Unknown(UnknownEvent),
}

impl Event {
    /// The service endpoint the transport attributed this event to.
    pub fn source(&self) -> &ServiceIdentity {
        match self {
            Event::StateChange(event) => &event.source,
            Event::Unknown(event) => &event.source,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Event::StateChange(_) => "state_change",
            Event::Unknown(_) => "unknown",
        }
    }
}

/// Transport state and current track of one player.
#[derive(Debug, Clone, PartialEq)]
pub struct StateChangeEvent {
    pub source: ServiceIdentity,
    pub transport_state: TransportState,
    /// May be empty (nothing queued, or the field was not part of this change)
    pub current_track_uri: String,
    pub track_metadata: Option<TrackMetadata>,
}

/// An event of an unrecognised type, kept with its raw body.
#[derive(Debug, Clone, PartialEq)]
pub struct UnknownEvent {
    pub source: ServiceIdentity,
    pub event_type: EventTypeTag,
    pub body: Bytes,
}

impl UnknownEvent {
    /// The error reported alongside this event.
    pub fn unsupported(&self) -> DecodeError {
        DecodeError::UnsupportedType {
            service: self.source.clone(),
            event_type: self.event_type.clone(),
        }
    }
}

/// AVTransport `TransportState`.
///
/// Values outside the UPnP set (and the empty string, when a change omits the
/// field) are kept verbatim in [`TransportState::Other`], so
/// [`as_str`](TransportState::as_str) always gives back what the player sent.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TransportState {
    Playing,
    PausedPlayback,
    PausedRecording,
    Recording,
    Stopped,
    Transitioning,
    NoMediaPresent,
    Other(String),
}

impl TransportState {
    pub fn as_str(&self) -> &str {
        match self {
            TransportState::Playing => "PLAYING",
            TransportState::PausedPlayback => "PAUSED_PLAYBACK",
            TransportState::PausedRecording => "PAUSED_RECORDING",
            TransportState::Recording => "RECORDING",
            TransportState::Stopped => "STOPPED",
            TransportState::Transitioning => "TRANSITIONING",
            TransportState::NoMediaPresent => "NO_MEDIA_PRESENT",
            TransportState::Other(raw) => raw,
        }
    }

    pub fn is_playing(&self) -> bool {
        matches!(self, TransportState::Playing)
    }
}

impl From<&str> for TransportState {
    fn from(raw: &str) -> Self {
        match raw {
            "PLAYING" => TransportState::Playing,
            "PAUSED_PLAYBACK" => TransportState::PausedPlayback,
            "PAUSED_RECORDING" => TransportState::PausedRecording,
            "RECORDING" => TransportState::Recording,
            "STOPPED" => TransportState::Stopped,
            "TRANSITIONING" => TransportState::Transitioning,
            "NO_MEDIA_PRESENT" => TransportState::NoMediaPresent,
            other => TransportState::Other(other.to_string()),
        }
    }
}

impl fmt::Display for TransportState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Track fields taken from the first DIDL-Lite item.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TrackMetadata {
    pub title: Option<String>,
    pub artist: Option<String>,
    pub album: Option<String>,
}
