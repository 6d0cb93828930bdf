//! XML decoding utilities for UPnP event parsing.
//!
//! Sonos documents are namespace-heavy (`e:`, `dc:`, `upnp:`, `r:`) and nest
//! escaped XML inside attributes and text nodes. Everything here works one
//! level at a time: strip prefixes, deserialize, and let the caller decide
//! whether an embedded string needs another pass.

use crate::error::{ParseError, ParseResult};
use quick_xml::events::{BytesEnd, BytesStart, Event};
use quick_xml::{Reader, Writer};
use serde::de::DeserializeOwned;

/// Parse XML string into a deserializable type with namespace stripping.
///
/// Malformed markup is reported as [`ParseError::InvalidXmlStructure`], a
/// well-formed document that does not fit `T` as
/// [`ParseError::XmlDeserializationFailed`].
pub fn parse<T: DeserializeOwned>(xml: &str) -> ParseResult<T> {
    let stripped = strip_namespaces(xml)?;
    quick_xml::de::from_str(&stripped)
        .map_err(|e| ParseError::XmlDeserializationFailed(e.to_string()))
}

/// Strip namespace prefixes from element and attribute names and drop
/// `xmlns` declarations.
///
/// Text and attribute values are copied through untouched, so escaped
/// content stays escaped for the deserializer. The input must be a single
/// well-formed document: exactly one root element, every element closed, and
/// nothing but whitespace, comments or processing instructions around the
/// root. Anything else is [`ParseError::InvalidXmlStructure`].
///
/// # Example
///
/// Input: `<e:propertyset><dc:title>Song</dc:title></e:propertyset>`
/// Output: `<propertyset><title>Song</title></propertyset>`
pub fn strip_namespaces(xml: &str) -> ParseResult<String> {
    let mut reader = Reader::from_str(xml);
    let mut writer = Writer::new(Vec::with_capacity(xml.len()));
    let mut depth = 0usize;
    let mut root_closed = false;

    loop {
        let event = reader
            .read_event()
            .map_err(|e| ParseError::InvalidXmlStructure(e.to_string()))?;

        let rewritten = match event {
            Event::Eof => {
                if depth > 0 {
                    return Err(structure("document ends inside an element"));
                }
                if !root_closed {
                    return Err(structure("document has no root element"));
                }
                // The reader reports a bare trailing `<` as a clean end of input
                if !xml.trim_end().ends_with('>') {
                    return Err(structure("unexpected content after the root element"));
                }
                break;
            }
            Event::Start(start) => {
                if root_closed {
                    return Err(structure("more than one root element"));
                }
                depth += 1;
                Event::Start(local_start(&start)?)
            }
            Event::Empty(start) => {
                if root_closed {
                    return Err(structure("more than one root element"));
                }
                root_closed = depth == 0;
                Event::Empty(local_start(&start)?)
            }
            Event::End(end) => {
                depth = depth.saturating_sub(1);
                root_closed = depth == 0;
                let name = String::from_utf8_lossy(end.local_name().as_ref()).into_owned();
                Event::End(BytesEnd::new(name))
            }
            Event::Text(text) if depth == 0 => {
                if !text.iter().all(u8::is_ascii_whitespace) {
                    return Err(structure("text outside the root element"));
                }
                Event::Text(text)
            }
            Event::CData(_) if depth == 0 => {
                return Err(structure("CDATA outside the root element"));
            }
            other => other,
        };

        writer
            .write_event(rewritten)
            .map_err(|e| ParseError::InvalidXmlStructure(e.to_string()))?;
    }

    String::from_utf8(writer.into_inner())
        .map_err(|e| ParseError::InvalidXmlStructure(e.to_string()))
}

fn structure(reason: &str) -> ParseError {
    ParseError::InvalidXmlStructure(reason.to_string())
}

/// Rebuild a start tag using local names only.
fn local_start(start: &BytesStart<'_>) -> ParseResult<BytesStart<'static>> {
    let name = String::from_utf8_lossy(start.local_name().as_ref()).into_owned();
    let mut local = BytesStart::new(name);

    for attr in start.attributes() {
        let attr = attr.map_err(|e| ParseError::InvalidXmlStructure(e.to_string()))?;
        let key = attr.key.as_ref();
        if key == b"xmlns" || key.starts_with(b"xmlns:") {
            continue;
        }
        local.push_attribute((attr.key.local_name().as_ref(), attr.value.as_ref()));
    }

    Ok(local)
}
