//! # sonos-parser
//!
//! XML parsing for the documents a Sonos player pushes to an event listener:
//! the GENA `propertyset` envelope, the escaped AVTransport `LastChange`
//! document inside it, and the DIDL-Lite track descriptor nested one level
//! deeper still.
//!
//! ## Usage
//!
//! ```rust
//! use sonos_parser::{AVTransportParser, DidlLite};
//!
//! let xml = r#"<e:propertyset xmlns:e="urn:schemas-upnp-org:event-1-0"><e:property><LastChange>&lt;Event&gt;&lt;InstanceID val=&quot;0&quot;&gt;&lt;TransportState val=&quot;PLAYING&quot;/&gt;&lt;/InstanceID&gt;&lt;/Event&gt;</LastChange></e:property></e:propertyset>"#;
//! let parsed = AVTransportParser::from_xml(xml).unwrap();
//! assert_eq!(parsed.transport_state(), "PLAYING");
//! assert_eq!(parsed.current_track_metadata(), "");
//! ```

pub mod common;
pub mod error;
pub mod services;

pub use common::{DidlItem, DidlLite, ValueAttribute};
pub use error::{ParseError, ParseResult};
pub use services::av_transport::AVTransportParser;
