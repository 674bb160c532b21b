//! Event system for status fan-out.
//!
//! This module provides:
//! - [`EventEmitter`] trait the orchestrator publishes through
//! - [`BroadcastEventBridge`] fanning events out to any number of subscribers
//! - Event types for content navigation and playback

mod bridge;
mod emitter;

use std::time::{SystemTime, UNIX_EPOCH};

pub use bridge::BroadcastEventBridge;
pub use emitter::{EventEmitter, LoggingEventEmitter, NoopEventEmitter};

use serde::Serialize;

use crate::content::{ContentListing, MediaKind};
use crate::playback::RendererState;

/// Events published to subscribers.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "category", rename_all = "camelCase")]
pub enum CastEvent {
    /// Navigation in the selected content directory.
    Content(ContentEvent),

    /// Session and renderer status.
    Playback(PlaybackEvent),
}

/// Events related to content directory navigation.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ContentEvent {
    /// The current listing was replaced.
    ListingUpdated {
        listing: ContentListing,
        /// Unix timestamp in milliseconds.
        timestamp: u64,
    },
    /// A different content directory was selected.
    DirectoryChanged {
        udn: String,
        name: String,
        /// Unix timestamp in milliseconds.
        timestamp: u64,
    },
}

/// The item a new session was started for.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderedItem {
    pub id: String,
    pub title: String,
    pub kind: MediaKind,
    pub uri: Option<String>,
    pub position: usize,
}

/// Events related to playback sessions.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum PlaybackEvent {
    /// A renderer status tick for the current session.
    StateChanged {
        state: RendererState,
        /// Unix timestamp in milliseconds.
        timestamp: u64,
    },
    /// A new session started; clients should show this item.
    Rendered {
        item: RenderedItem,
        /// Unix timestamp in milliseconds.
        timestamp: u64,
    },
    /// The local renderer is selected: the client plays the item itself.
    LaunchLocally {
        uri: String,
        /// `audio/*`, `video/*` or `image/*`, absent for generic items.
        #[serde(skip_serializing_if = "Option::is_none")]
        mime: Option<String>,
        /// Unix timestamp in milliseconds.
        timestamp: u64,
    },
}

impl From<ContentEvent> for CastEvent {
    fn from(event: ContentEvent) -> Self {
        CastEvent::Content(event)
    }
}

impl From<PlaybackEvent> for CastEvent {
    fn from(event: PlaybackEvent) -> Self {
        CastEvent::Playback(event)
    }
}

/// Returns the current Unix timestamp in milliseconds.
///
/// Returns 0 if the system clock is before the Unix epoch.
#[must_use]
pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
