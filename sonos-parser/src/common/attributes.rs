//! Helper type for the UPnP `val` attribute pattern.
//!
//! State variables inside a `LastChange` document are empty elements whose
//! value lives in a `val` attribute:
//!
//! ```xml
//! <TransportState val="PLAYING"/>
//! <CurrentTrackURI val="x-file-cifs://nas/track.flac"/>
//! ```

use serde::{Deserialize, Serialize};

/// An XML element carrying its value in a `val` attribute.
///
/// Escaped XML in the attribute (for example `CurrentTrackMetaData`) is
/// unescaped once by the deserializer and kept as a plain string; decoding the
/// embedded document is left to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, Default)]
pub struct ValueAttribute {
    /// The value from the `val` attribute
    #[serde(rename = "@val", default)]
    pub val: String,
}

impl ValueAttribute {
    /// The attribute value as a string slice.
    pub fn as_str(&self) -> &str {
        &self.val
    }
}

/// Value of an optional leaf, or the empty string when the element is absent.
pub fn val_or_empty(attr: Option<&ValueAttribute>) -> &str {
    attr.map(ValueAttribute::as_str).unwrap_or("")
}
