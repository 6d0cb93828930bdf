//! Integration tests for the two-stage AVTransport + DIDL-Lite decode

use sonos_parser::{AVTransportParser, DidlItem, DidlLite};

const EVENT_WITH_TWO_ITEMS: &str = r#"<e:propertyset xmlns:e="urn:schemas-upnp-org:event-1-0"><e:property><LastChange>&lt;Event xmlns=&quot;urn:schemas-upnp-org:metadata-1-0/AVT/&quot; xmlns:r=&quot;urn:schemas-rinconnetworks-com:metadata-1-0/&quot;&gt;&lt;InstanceID val=&quot;0&quot;&gt;&lt;TransportState val=&quot;PLAYING&quot;/&gt;&lt;CurrentTrackURI val=&quot;x-file-cifs://nas/music/a.flac&quot;/&gt;&lt;CurrentTrackMetaData val=&quot;&amp;lt;DIDL-Lite xmlns:dc=&amp;quot;http://purl.org/dc/elements/1.1/&amp;quot; xmlns:upnp=&amp;quot;urn:schemas-upnp-org:metadata-1-0/upnp/&amp;quot;&amp;gt;&amp;lt;item id=&amp;quot;1&amp;quot; parentID=&amp;quot;0&amp;quot;&amp;gt;&amp;lt;dc:title&amp;gt;First Title&amp;lt;/dc:title&amp;gt;&amp;lt;dc:creator&amp;gt;Artist&amp;lt;/dc:creator&amp;gt;&amp;lt;upnp:album&amp;gt;Album&amp;lt;/upnp:album&amp;gt;&amp;lt;/item&amp;gt;&amp;lt;item id=&amp;quot;2&amp;quot; parentID=&amp;quot;0&amp;quot;&amp;gt;&amp;lt;dc:title&amp;gt;Second Title&amp;lt;/dc:title&amp;gt;&amp;lt;/item&amp;gt;&amp;lt;/DIDL-Lite&amp;gt;&quot;/&gt;&lt;r:NextAVTransportURI val=&quot;&quot;/&gt;&lt;/InstanceID&gt;&lt;/Event&gt;</LastChange></e:property></e:propertyset>"#;

#[test]
fn test_event_then_descriptor() {
    let parsed = AVTransportParser::from_xml(EVENT_WITH_TWO_ITEMS).unwrap();
    assert_eq!(parsed.transport_state(), "PLAYING");
    assert_eq!(parsed.current_track_uri(), "x-file-cifs://nas/music/a.flac");

    let didl = DidlLite::from_xml(parsed.current_track_metadata()).unwrap();
    assert_eq!(didl.items.len(), 2);

    let first = didl.first_item().unwrap();
    assert_eq!(first.title(), Some("First Title"));
    assert_eq!(first.creator(), Some("Artist"));
    assert_eq!(first.album(), Some("Album"));
    assert_eq!(didl.items[1].title(), Some("Second Title"));
}

#[test]
fn test_didl_structures_accessible() {
    let _didl_lite: DidlLite;
    let _didl_item: DidlItem;
}
