//! Content directory domain types.
//!
//! These mirror the DIDL-Lite object model: a browse returns an ordered list
//! of containers (folders) and items (playable leaves). Entries are immutable
//! once parsed; a new browse replaces the whole listing.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::protocol_constants::{AUDIO_PREFIX, IMAGE_PREFIX, VIDEO_PREFIX};

/// Media kind of an item, derived from its UPnP class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MediaKind {
    Audio,
    Video,
    Image,
    /// Any other `object.item.*` class.
    Generic,
}

impl MediaKind {
    /// Maps a UPnP class (`object.item.audioItem.musicTrack`, ...) to a kind.
    pub fn from_upnp_class(class: &str) -> Self {
        if class.starts_with("object.item.audioItem") {
            Self::Audio
        } else if class.starts_with("object.item.videoItem") {
            Self::Video
        } else if class.starts_with("object.item.imageItem") {
            Self::Image
        } else {
            Self::Generic
        }
    }

    /// UPnP class used when describing a local item of this kind.
    pub fn upnp_class(&self) -> &'static str {
        match self {
            Self::Audio => "object.item.audioItem.musicTrack",
            Self::Video => "object.item.videoItem",
            Self::Image => "object.item.imageItem.photo",
            Self::Generic => "object.item",
        }
    }

    /// Wildcard MIME category used when launching an item locally.
    pub fn mime_category(&self) -> Option<&'static str> {
        match self {
            Self::Audio => Some("audio/*"),
            Self::Image => Some("image/*"),
            Self::Video => Some("video/*"),
            Self::Generic => None,
        }
    }

    /// Media server request path prefix, `None` for generic items.
    pub fn path_prefix(&self) -> Option<&'static str> {
        match self {
            Self::Audio => Some(AUDIO_PREFIX),
            Self::Video => Some(VIDEO_PREFIX),
            Self::Image => Some(IMAGE_PREFIX),
            Self::Generic => None,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Content Identifiers
// ─────────────────────────────────────────────────────────────────────────────

/// Reasons a request identifier could not be interpreted.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ContentIdError {
    #[error("unknown media prefix in {0:?}")]
    UnknownPrefix(String),

    #[error("non-numeric row id in {0:?}")]
    InvalidRow(String),
}

/// Identifier of a locally served item: media kind plus content index row.
///
/// Textual form is `{prefix}{row}`, e.g. `a-42` for audio row 42.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContentId {
    pub kind: MediaKind,
    pub row: u64,
}

impl ContentId {
    /// Creates an identifier. Generic items are never served locally.
    pub fn new(kind: MediaKind, row: u64) -> Option<Self> {
        kind.path_prefix().map(|_| Self { kind, row })
    }
}

impl FromStr for ContentId {
    type Err = ContentIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (kind, rest) = [
            (MediaKind::Audio, AUDIO_PREFIX),
            (MediaKind::Video, VIDEO_PREFIX),
            (MediaKind::Image, IMAGE_PREFIX),
        ]
        .iter()
        .find_map(|(kind, prefix)| s.strip_prefix(prefix).map(|rest| (*kind, rest)))
        .ok_or_else(|| ContentIdError::UnknownPrefix(s.to_string()))?;

        // u64::from_str accepts a leading '+', row ids never carry one
        if rest.is_empty() || !rest.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ContentIdError::InvalidRow(s.to_string()));
        }
        let row = rest
            .parse()
            .map_err(|_| ContentIdError::InvalidRow(s.to_string()))?;

        Ok(Self { kind, row })
    }
}

impl fmt::Display for ContentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prefix = self.kind.path_prefix().unwrap_or_default();
        write!(f, "{}{}", prefix, self.row)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// DIDL Objects
// ─────────────────────────────────────────────────────────────────────────────

/// A browsable folder.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Container {
    pub id: String,
    pub parent_id: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub child_count: Option<u32>,
}

/// A playable leaf.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub id: String,
    pub parent_id: String,
    pub title: String,
    pub kind: MediaKind,
    /// MIME type from the resource's protocolInfo.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mime: Option<String>,
    /// Resource URI a renderer fetches.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artist: Option<String>,
    /// Resource duration as reported (`H:MM:SS[.F]`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
}

/// One node of a content listing.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ContentEntry {
    Container(Container),
    Item(Item),
}

impl ContentEntry {
    pub fn id(&self) -> &str {
        match self {
            Self::Container(c) => &c.id,
            Self::Item(i) => &i.id,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            Self::Container(c) => &c.title,
            Self::Item(i) => &i.title,
        }
    }

    /// Returns the item if this entry is playable.
    pub fn as_item(&self) -> Option<&Item> {
        match self {
            Self::Item(i) => Some(i),
            Self::Container(_) => None,
        }
    }
}

/// Snapshot of the current folder.
///
/// Entries keep the order returned by the remote browse call; next/previous
/// navigation is positional.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentListing {
    pub parent_id: String,
    pub entries: Vec<ContentEntry>,
}

impl ContentListing {
    pub fn new(parent_id: impl Into<String>, entries: Vec<ContentEntry>) -> Self {
        Self {
            parent_id: parent_id.into(),
            entries,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the item at `position` when it exists and is playable.
    pub fn playable_at(&self, position: usize) -> Option<&Item> {
        self.entries.get(position).and_then(ContentEntry::as_item)
    }
}

/// An item together with its index in the listing it was picked from.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderItem {
    pub item: Item,
    pub position: usize,
}

impl RenderItem {
    pub fn new(item: Item, position: usize) -> Self {
        Self { item, position }
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    pub fn item(id: &str, kind: MediaKind) -> Item {
        Item {
            id: id.to_string(),
            parent_id: "0".to_string(),
            title: id.to_string(),
            kind,
            mime: None,
            uri: Some(format!("http://10.0.0.5:8200/{id}")),
            artist: None,
            duration: None,
        }
    }

    pub fn container(id: &str) -> Container {
        Container {
            id: id.to_string(),
            parent_id: "0".to_string(),
            title: id.to_string(),
            child_count: Some(3),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::{container, item};
    use super::*;

    #[test]
    fn content_id_parses_known_prefixes() {
        assert_eq!(
            "a-12".parse::<ContentId>(),
            Ok(ContentId {
                kind: MediaKind::Audio,
                row: 12
            })
        );
        assert_eq!("v-0".parse::<ContentId>().unwrap().kind, MediaKind::Video);
        assert_eq!("i-7".parse::<ContentId>().unwrap().row, 7);
    }

    #[test]
    fn content_id_rejects_unknown_prefix() {
        assert!(matches!(
            "x-12".parse::<ContentId>(),
            Err(ContentIdError::UnknownPrefix(_))
        ));
    }

    #[test]
    fn content_id_rejects_non_numeric_rows() {
        for raw in ["a-", "a-abc", "a-+5", "a-1.5", "a--3"] {
            assert!(
                matches!(raw.parse::<ContentId>(), Err(ContentIdError::InvalidRow(_))),
                "{raw} should be rejected"
            );
        }
    }

    #[test]
    fn content_id_display_matches_parse() {
        let id = ContentId::new(MediaKind::Image, 99).unwrap();
        assert_eq!(id.to_string(), "i-99");
        assert_eq!(id.to_string().parse::<ContentId>(), Ok(id));
    }

    #[test]
    fn generic_items_have_no_content_id() {
        assert!(ContentId::new(MediaKind::Generic, 1).is_none());
    }

    #[test]
    fn media_kind_from_class() {
        assert_eq!(
            MediaKind::from_upnp_class("object.item.audioItem.musicTrack"),
            MediaKind::Audio
        );
        assert_eq!(
            MediaKind::from_upnp_class("object.item.videoItem.movie"),
            MediaKind::Video
        );
        assert_eq!(
            MediaKind::from_upnp_class("object.item.imageItem.photo"),
            MediaKind::Image
        );
        assert_eq!(
            MediaKind::from_upnp_class("object.item.textItem"),
            MediaKind::Generic
        );
    }

    #[test]
    fn playable_at_skips_containers_and_out_of_bounds() {
        let listing = ContentListing::new(
            "0",
            vec![
                ContentEntry::Container(container("Movies")),
                ContentEntry::Item(item("A", MediaKind::Video)),
            ],
        );
        assert!(listing.playable_at(0).is_none());
        assert_eq!(listing.playable_at(1).map(|i| i.id.as_str()), Some("A"));
        assert!(listing.playable_at(2).is_none());
    }
}
