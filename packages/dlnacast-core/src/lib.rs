//! dlnacast core - UPnP/DLNA playback orchestration and local media serving.
//!
//! The crate lets one process act as a control point (browsing content
//! directories, commanding renderers) and as a media server for files
//! listed in a content index.
//!
//! # Architecture
//!
//! - [`upnp`]: Devices, SOAP transport, DIDL-Lite and the action bridge
//! - [`playback`]: Orchestrator actor, sessions, poller and throttle
//! - [`content`]: Content model, index boundary and request path resolution
//! - [`events`]: Event fan-out to subscribers
//! - [`api`]: Media server and JSON control API
//! - [`context`]: Network configuration and media URL building
//! - [`error`]: Centralized error types
//!
//! # Abstraction Traits
//!
//! - [`ActionTransport`](upnp::ActionTransport): Callback-based remote actions
//! - [`ControlPoint`](upnp::ControlPoint): Discovery start/stop
//! - [`ContentIndex`](content::ContentIndex): File lookup by media kind and row
//! - [`EventEmitter`](events::EventEmitter): Emitting domain events
//! - [`IpDetector`](context::IpDetector): Local IP detection

#![warn(clippy::all)]

pub mod api;
pub mod bootstrap;
pub mod config;
pub mod content;
pub mod context;
pub mod error;
pub mod events;
pub mod playback;
pub mod protocol_constants;
pub mod upnp;

pub use api::{start_server, AppState, ServerError};
pub use bootstrap::{bootstrap_services, bootstrap_services_with_network, BootstrappedServices};
pub use config::{Config, ConfigError};
pub use content::{
    ContentEntry, ContentId, ContentIndex, ContentListing, IndexRecord, Item, MediaKind,
    MemoryContentIndex,
};
pub use context::{IpDetector, LocalIpDetector, NetworkContext, NetworkError, UrlBuilder};
pub use error::{CastError, CastResult, ErrorCode};
pub use events::{
    now_millis, BroadcastEventBridge, CastEvent, ContentEvent, EventEmitter, PlaybackEvent,
};
pub use playback::{
    OrchestratorStatus, PlayState, PlaybackOrchestrator, RendererState, SessionMode,
};
pub use upnp::{ControlPoint, Device, DeviceRegistry, DeviceRole, ServiceEndpoint, UpnpService};
