//! DIDL-Lite parsing and formatting.
//!
//! Browse results and track metadata arrive as DIDL-Lite documents (already
//! unescaped from the SOAP `Result` element). `format_didl_lite` builds the
//! metadata sent alongside `SetAVTransportURI`.

use quick_xml::events::Event;
use quick_xml::reader::Reader;

use super::xml::{escape_xml, get_xml_attr};
use crate::content::{Container, ContentEntry, Item, MediaKind};

/// Values accumulated while inside a `<container>` or `<item>`.
#[derive(Default)]
struct PendingObject {
    is_item: bool,
    id: String,
    parent_id: String,
    child_count: Option<u32>,
    title: Option<String>,
    class: Option<String>,
    uri: Option<String>,
    mime: Option<String>,
    duration: Option<String>,
    artist: Option<String>,
    creator: Option<String>,
}

impl PendingObject {
    fn finish(self) -> ContentEntry {
        let title = self.title.unwrap_or_default();
        if self.is_item {
            ContentEntry::Item(Item {
                id: self.id,
                parent_id: self.parent_id,
                title,
                kind: self
                    .class
                    .as_deref()
                    .map_or(MediaKind::Generic, MediaKind::from_upnp_class),
                mime: self.mime,
                uri: self.uri,
                artist: self.artist.or(self.creator),
                duration: self.duration,
            })
        } else {
            ContentEntry::Container(Container {
                id: self.id,
                parent_id: self.parent_id,
                title,
                child_count: self.child_count,
            })
        }
    }
}

/// Third field of a `protocolInfo` (`http-get:*:audio/mpeg:*`).
fn mime_from_protocol_info(protocol_info: &str) -> Option<String> {
    protocol_info
        .split(':')
        .nth(2)
        .filter(|m| !m.is_empty() && *m != "*")
        .map(str::to_string)
}

/// Parses a DIDL-Lite document into entries, preserving document order.
///
/// Malformed XML ends parsing early; entries completed so far are kept.
pub fn parse_didl(xml: &str) -> Vec<ContentEntry> {
    let mut entries = Vec::new();
    let mut reader = Reader::from_str(xml);
    let mut buf = Vec::new();
    let mut current: Option<PendingObject> = None;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => match e.local_name().as_ref() {
                tag @ (b"container" | b"item") => {
                    current = Some(PendingObject {
                        is_item: tag == b"item",
                        id: get_xml_attr(e, b"id").unwrap_or_default(),
                        parent_id: get_xml_attr(e, b"parentID").unwrap_or_default(),
                        child_count: get_xml_attr(e, b"childCount").and_then(|c| c.parse().ok()),
                        ..Default::default()
                    });
                }
                tag if current.is_some() => {
                    let tag = tag.to_vec();
                    let res_attrs = (tag == b"res").then(|| {
                        (
                            get_xml_attr(e, b"protocolInfo"),
                            get_xml_attr(e, b"duration"),
                        )
                    });
                    let text = match reader.read_text(e.name()) {
                        Ok(t) => html_escape::decode_html_entities(&t).trim().to_string(),
                        Err(err) => {
                            log::debug!("[DIDL] Unreadable element text: {}", err);
                            break;
                        }
                    };
                    let Some(obj) = current.as_mut() else {
                        break;
                    };
                    match tag.as_slice() {
                        b"title" => obj.title = Some(text),
                        b"class" => obj.class = Some(text),
                        b"artist" if obj.artist.is_none() => obj.artist = Some(text),
                        b"creator" => obj.creator = Some(text),
                        // First resource wins
                        b"res" if obj.uri.is_none() => {
                            if let Some((protocol_info, duration)) = res_attrs {
                                obj.mime = protocol_info.as_deref().and_then(mime_from_protocol_info);
                                obj.duration = duration;
                            }
                            obj.uri = Some(text).filter(|u| !u.is_empty());
                        }
                        _ => {}
                    }
                }
                _ => {}
            },
            Ok(Event::Empty(ref e)) => match e.local_name().as_ref() {
                tag @ (b"container" | b"item") => {
                    entries.push(
                        PendingObject {
                            is_item: tag == b"item",
                            id: get_xml_attr(e, b"id").unwrap_or_default(),
                            parent_id: get_xml_attr(e, b"parentID").unwrap_or_default(),
                            child_count: get_xml_attr(e, b"childCount")
                                .and_then(|c| c.parse().ok()),
                            ..Default::default()
                        }
                        .finish(),
                    );
                }
                _ => {}
            },
            Ok(Event::End(ref e))
                if matches!(e.local_name().as_ref(), b"container" | b"item") =>
            {
                if let Some(obj) = current.take() {
                    entries.push(obj.finish());
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                log::warn!("[DIDL] Parse error at {}: {}", reader.buffer_position(), e);
                break;
            }
            _ => {}
        }
        buf.clear();
    }

    entries
}

/// Title and artist of the track described by `TrackMetaData`.
///
/// Renderers report `NOT_IMPLEMENTED` or an empty string when they have no
/// metadata; both yield `(None, None)`.
pub fn parse_track_metadata(xml: &str) -> (Option<String>, Option<String>) {
    if xml.is_empty() || xml == "NOT_IMPLEMENTED" {
        return (None, None);
    }
    match parse_didl(xml).into_iter().next() {
        Some(ContentEntry::Item(item)) => {
            (Some(item.title).filter(|t| !t.is_empty()), item.artist)
        }
        Some(ContentEntry::Container(c)) => (Some(c.title).filter(|t| !t.is_empty()), None),
        None => (None, None),
    }
}

/// Formats DIDL-Lite metadata for `SetAVTransportURI`.
///
/// Renderers use it for their own display; the resource element carries the
/// same URI that is set as the transport URI.
pub fn format_didl_lite(item: &Item) -> String {
    let mime = item.mime.as_deref().unwrap_or("*");

    let mut didl = String::from(
        r#"<DIDL-Lite xmlns:dc="http://purl.org/dc/elements/1.1/" xmlns:upnp="urn:schemas-upnp-org:metadata-1-0/upnp/" xmlns="urn:schemas-upnp-org:metadata-1-0/DIDL-Lite/">"#,
    );
    didl.push_str(&format!(
        r#"<item id="{}" parentID="{}" restricted="1">"#,
        escape_xml(&item.id),
        escape_xml(&item.parent_id)
    ));
    didl.push_str(&format!("<dc:title>{}</dc:title>", escape_xml(&item.title)));
    if let Some(artist) = &item.artist {
        didl.push_str(&format!("<upnp:artist>{}</upnp:artist>", escape_xml(artist)));
    }
    didl.push_str(&format!(
        "<upnp:class>{}</upnp:class>",
        item.kind.upnp_class()
    ));

    let duration = item
        .duration
        .as_deref()
        .map(|d| format!(r#" duration="{}""#, escape_xml(d)))
        .unwrap_or_default();
    didl.push_str(&format!(
        r#"<res protocolInfo="http-get:*:{}:*"{}>{}</res>"#,
        escape_xml(mime),
        duration,
        escape_xml(item.uri.as_deref().unwrap_or_default())
    ));
    didl.push_str("</item></DIDL-Lite>");

    didl
}
