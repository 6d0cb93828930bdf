//! AVTransport service parser module
//!
//! AVTransport notifications carry the player's transport state and the
//! current track (URI plus DIDL-Lite metadata).
//!
//! ```rust,ignore
//! use sonos_parser::services::av_transport::AVTransportParser;
//!
//! let parsed = AVTransportParser::from_xml(body)?;
//! let state = parsed.transport_state();
//! let didl = parsed.current_track_metadata();
//! ```

pub mod parser;

pub use parser::{AVTransportParser, InstanceID, LastChangeEvent};
