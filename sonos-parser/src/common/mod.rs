//! Parsing utilities shared by the service parsers.
//!
//! - [`xml_decode`]: namespace stripping and serde entry point
//! - [`attributes`]: the `val="..."` leaf pattern used by UPnP state variables
//! - [`didl`]: DIDL-Lite track descriptors

pub mod attributes;
pub mod didl;
pub mod xml_decode;

pub use attributes::ValueAttribute;
pub use didl::{DidlItem, DidlLite};
