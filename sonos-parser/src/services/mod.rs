//! Service-specific parsers organized by UPnP service type.
//!
//! - [`av_transport`]: AVTransport `LastChange` event notifications

pub mod av_transport;
