//! DIDL-Lite track metadata.
//!
//! Only the first `item` of a descriptor counts, and only the first `title`,
//! `creator` and `album` of that item. Later items and repeated values are
//! ignored.

use sonos_parser::DidlLite;

use crate::error::DecodeError;
use crate::event::TrackMetadata;

/// Decode a `CurrentTrackMetaData` descriptor.
///
/// An empty descriptor means the player had nothing to describe and yields
/// `Ok(None)`. A descriptor that is not well-formed, or lists no items, is
/// [`DecodeError::Malformed`].
pub fn decode(descriptor: &str) -> Result<Option<TrackMetadata>, DecodeError> {
    if descriptor.trim().is_empty() {
        return Ok(None);
    }

    let didl = DidlLite::from_xml(descriptor)?;
    let item = didl
        .first_item()
        .ok_or_else(|| DecodeError::Malformed("metadata descriptor has no item".to_string()))?;

    Ok(Some(TrackMetadata {
        title: item.title().map(str::to_owned),
        artist: item.creator().map(str::to_owned),
        album: item.album().map(str::to_owned),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rstest::rstest;

    const DIDL_OPEN: &str = r#"<DIDL-Lite xmlns:dc="http://purl.org/dc/elements/1.1/" xmlns:upnp="urn:schemas-upnp-org:metadata-1-0/upnp/" xmlns:r="urn:schemas-rinconnetworks-com:metadata-1-0/" xmlns="urn:schemas-upnp-org:metadata-1-0/DIDL-Lite/">"#;

    fn escape_text(text: &str) -> String {
        text.replace('&', "&amp;")
            .replace('<', "&lt;")
            .replace('>', "&gt;")
    }

    fn descriptor(items: &[(Option<&str>, Option<&str>, Option<&str>)]) -> String {
        let mut xml = DIDL_OPEN.to_string();
        for (i, (title, artist, album)) in items.iter().enumerate() {
            xml.push_str(&format!(r#"<item id="{}" parentID="-1" restricted="true">"#, i));
            if let Some(title) = title {
                xml.push_str(&format!("<dc:title>{}</dc:title>", escape_text(title)));
            }
            xml.push_str("<upnp:class>object.item.audioItem.musicTrack</upnp:class>");
            if let Some(artist) = artist {
                xml.push_str(&format!("<dc:creator>{}</dc:creator>", escape_text(artist)));
            }
            if let Some(album) = album {
                xml.push_str(&format!("<upnp:album>{}</upnp:album>", escape_text(album)));
            }
            xml.push_str("</item>");
        }
        xml.push_str("</DIDL-Lite>");
        xml
    }

    #[rstest]
    #[case::empty("")]
    #[case::spaces("   ")]
    #[case::newline("\n\t")]
    fn test_empty_descriptor_is_none(#[case] input: &str) {
        assert_eq!(decode(input), Ok(None));
    }

    #[test]
    fn test_single_item() {
        let xml = descriptor(&[(Some("Song"), Some("Artist"), Some("Album"))]);

        let metadata = decode(&xml).unwrap().unwrap();
        assert_eq!(metadata.title.as_deref(), Some("Song"));
        assert_eq!(metadata.artist.as_deref(), Some("Artist"));
        assert_eq!(metadata.album.as_deref(), Some("Album"));
    }

    #[test]
    fn test_first_item_wins() {
        let xml = descriptor(&[
            (Some("First"), Some("First Artist"), None),
            (Some("Second"), Some("Second Artist"), Some("Second Album")),
        ]);

        let metadata = decode(&xml).unwrap().unwrap();
        assert_eq!(metadata.title.as_deref(), Some("First"));
        assert_eq!(metadata.artist.as_deref(), Some("First Artist"));
        // No fallback to later items
        assert_eq!(metadata.album, None);
    }

    #[test]
    fn test_first_value_of_repeated_field_wins() {
        let xml = r#"<DIDL-Lite><item id="1" parentID="0"><dc:creator>Composer</dc:creator><dc:title>Piece</dc:title><dc:creator>Performer</dc:creator></item></DIDL-Lite>"#;

        let metadata = decode(xml).unwrap().unwrap();
        assert_eq!(metadata.artist.as_deref(), Some("Composer"));
        assert_eq!(metadata.title.as_deref(), Some("Piece"));
    }

    #[test]
    fn test_missing_fields_are_none() {
        let xml = descriptor(&[(None, None, None)]);
        assert_eq!(decode(&xml), Ok(Some(TrackMetadata::default())));
    }

    #[rstest]
    #[case::truncated("<DIDL-Lite><item id=\"1\"><dc:title>Song")]
    #[case::unclosed_item("<DIDL-Lite><item></DIDL-Lite>")]
    #[case::no_items("<DIDL-Lite></DIDL-Lite>")]
    #[case::wrong_root_no_items("<foo/>")]
    #[case::two_roots("<DIDL-Lite><item><dc:title>A</dc:title></item></DIDL-Lite><DIDL-Lite/>")]
    #[case::trailing_text("<DIDL-Lite><item><dc:title>A</dc:title></item></DIDL-Lite>junk")]
    #[case::trailing_lt("<DIDL-Lite><item><dc:title>A</dc:title></item></DIDL-Lite><")]
    fn test_malformed_descriptor(#[case] input: &str) {
        assert!(matches!(decode(input), Err(DecodeError::Malformed(_))));
    }

    fn field() -> impl Strategy<Value = Option<String>> {
        proptest::option::of("[A-Za-z0-9]([A-Za-z0-9 &<>'\"]{0,24}[A-Za-z0-9])?")
    }

    proptest! {
        #[test]
        fn prop_single_item_fields_survive(title in field(), artist in field(), album in field()) {
            let xml = descriptor(&[(title.as_deref(), artist.as_deref(), album.as_deref())]);

            let metadata = decode(&xml).unwrap().unwrap();
            prop_assert_eq!(metadata.title, title);
            prop_assert_eq!(metadata.artist, artist);
            prop_assert_eq!(metadata.album, album);
        }

        #[test]
        fn prop_decode_never_panics(input in ".{0,200}") {
            let _ = decode(&input);
        }
    }
}
