//! DIDL-Lite structures for media metadata

use crate::common::xml_decode;
use crate::error::ParseResult;
use serde::{Deserialize, Serialize};

/// DIDL-Lite root structure for media metadata.
///
/// DIDL-Lite format example:
/// ```xml
/// <DIDL-Lite xmlns:dc="http://purl.org/dc/elements/1.1/" ...>
///   <item id="-1" parentID="-1">
///     <dc:title>Song Title</dc:title>
///     <dc:creator>Artist Name</dc:creator>
///     <upnp:album>Album Name</upnp:album>
///   </item>
/// </DIDL-Lite>
/// ```
///
/// A descriptor may list any number of items, and each item may repeat its
/// `title`/`creator`/`album` children. All of them are kept here; picking
/// which one counts is up to the consumer.
#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
#[serde(rename = "DIDL-Lite")]
pub struct DidlLite {
    /// The `item` elements in document order
    #[serde(rename = "item", default)]
    pub items: Vec<DidlItem>,
}

impl DidlLite {
    /// Parse DIDL-Lite XML content directly.
    pub fn from_xml(xml: &str) -> ParseResult<Self> {
        xml_decode::parse(xml)
    }

    /// The first item of the descriptor, if any.
    pub fn first_item(&self) -> Option<&DidlItem> {
        self.items.first()
    }
}

/// Individual item in DIDL-Lite metadata containing track information.
#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
pub struct DidlItem {
    #[serde(rename = "@id", default)]
    pub id: String,

    #[serde(rename = "@parentID", default)]
    pub parent_id: String,

    /// `dc:title` values in document order
    #[serde(rename = "title", default)]
    pub titles: Vec<String>,

    /// `dc:creator` values in document order
    #[serde(rename = "creator", default)]
    pub creators: Vec<String>,

    /// `upnp:album` values in document order
    #[serde(rename = "album", default)]
    pub albums: Vec<String>,
}

impl DidlItem {
    pub fn title(&self) -> Option<&str> {
        self.titles.first().map(String::as_str)
    }

    pub fn creator(&self) -> Option<&str> {
        self.creators.first().map(String::as_str)
    }

    pub fn album(&self) -> Option<&str> {
        self.albums.first().map(String::as_str)
    }
}
