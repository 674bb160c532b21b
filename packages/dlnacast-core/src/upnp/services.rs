//! UPnP service definitions.
//!
//! Single source of truth for the service URNs used by SOAP actions. Control
//! URLs are device-specific and live on [`crate::upnp::device::ServiceEndpoint`].

use serde::{Deserialize, Serialize};

/// UPnP services the control point talks to.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, Serialize, Deserialize)]
pub enum UpnpService {
    /// Audio/Video transport control (play, pause, stop, seek, position).
    AVTransport,
    /// Hierarchical media library browsing.
    ContentDirectory,
    /// Renderer volume and mute control.
    RenderingControl,
}

impl UpnpService {
    /// Returns the UPnP service URN for SOAP requests.
    #[must_use]
    pub fn urn(&self) -> &'static str {
        match self {
            Self::AVTransport => "urn:schemas-upnp-org:service:AVTransport:1",
            Self::ContentDirectory => "urn:schemas-upnp-org:service:ContentDirectory:1",
            Self::RenderingControl => "urn:schemas-upnp-org:service:RenderingControl:1",
        }
    }

    /// Returns a human-readable name for this service.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::AVTransport => "AVTransport",
            Self::ContentDirectory => "ContentDirectory",
            Self::RenderingControl => "RenderingControl",
        }
    }
}
