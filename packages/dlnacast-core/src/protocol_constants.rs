//! Fixed protocol constants that should NOT be changed.
//!
//! These values are defined by external specifications (UPnP, DLNA) or are
//! part of the URL contract between the control point and the media server.

// ─────────────────────────────────────────────────────────────────────────────
// DLNA Response Headers
// ─────────────────────────────────────────────────────────────────────────────

/// Header announcing real-time information support (`realTimeInfo.dlna.org`).
///
/// Header names are case-insensitive and `http` stores them lowercased.
pub const DLNA_REAL_TIME_INFO_HEADER: &str = "realtimeinfo.dlna.org";

/// Value of the real-time info header (time-based seek lag is unknown).
pub const DLNA_REAL_TIME_INFO_VALUE: &str = "DLNA.ORG_TLAG=*";

/// Header carrying DLNA content features (`contentFeatures.dlna.org`). Sent empty.
pub const DLNA_CONTENT_FEATURES_HEADER: &str = "contentfeatures.dlna.org";

/// Header selecting the DLNA transfer mode (`transferMode.dlna.org`).
pub const DLNA_TRANSFER_MODE_HEADER: &str = "transfermode.dlna.org";

/// Streaming transfer mode: renderer plays while fetching.
pub const DLNA_TRANSFER_MODE_STREAMING: &str = "Streaming";

/// DLNA guidelines version embedded in the `Server` header.
pub const DLNA_DOC_VERSION: &str = "DLNADOC/1.50";

/// UPnP architecture version embedded in the `Server` header.
pub const UPNP_VERSION: &str = "UPnP/1.0";

/// Body of every media server 404 response.
pub const NOT_FOUND_BODY: &str = "Error 404, file not found.";

// ─────────────────────────────────────────────────────────────────────────────
// Content Identifiers
// ─────────────────────────────────────────────────────────────────────────────

/// Request path prefix for audio items (`/a-42.mp3`).
pub const AUDIO_PREFIX: &str = "a-";

/// Request path prefix for video items (`/v-42.mkv`).
pub const VIDEO_PREFIX: &str = "v-";

/// Request path prefix for image items (`/i-42.jpg`).
pub const IMAGE_PREFIX: &str = "i-";

// ─────────────────────────────────────────────────────────────────────────────
// Content Directory
// ─────────────────────────────────────────────────────────────────────────────

/// Object id of a content directory's root container.
pub const ROOT_CONTAINER_ID: &str = "0";

// ─────────────────────────────────────────────────────────────────────────────
// Playback Timing
// ─────────────────────────────────────────────────────────────────────────────

/// Coalescing window for render requests (milliseconds).
pub const RENDER_THROTTLE_MS: u64 = 250;

/// Interval between renderer state polls (milliseconds).
pub const POLL_INTERVAL_MS: u64 = 1000;

/// Default bound on a single remote action (seconds).
pub const ACTION_TIMEOUT_SECS: u64 = 10;

/// Timeout for SOAP HTTP requests (seconds).
pub const SOAP_TIMEOUT_SECS: u64 = 10;

// ─────────────────────────────────────────────────────────────────────────────
// Channels
// ─────────────────────────────────────────────────────────────────────────────

/// Capacity of the event broadcast channel.
pub const EVENT_CHANNEL_CAPACITY: usize = 100;

/// Capacity of the orchestrator command channel.
pub const COMMAND_CHANNEL_CAPACITY: usize = 32;

// ─────────────────────────────────────────────────────────────────────────────
// Application Identity
// ─────────────────────────────────────────────────────────────────────────────

/// Implementation name used in the `Server` header and DIDL-Lite metadata.
pub const APP_NAME: &str = "dlnacast";

/// Service identifier reported by the health endpoint.
pub const SERVICE_ID: &str = "dlnacast";

/// Port range probed when no preferred port is configured.
pub const PORT_RANGE_START: u16 = 49500;

/// Upper end (inclusive) of the probed port range.
pub const PORT_RANGE_END: u16 = 49510;
