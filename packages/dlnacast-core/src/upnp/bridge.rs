//! Action Invocation Bridge.
//!
//! Turns the callback-based [`ActionTransport`] into awaitable operations
//! with one result each. Failures never reach the caller as errors:
//!
//! - browse failures yield an empty listing
//! - transport commands yield `false`
//! - state queries yield `None`
//!
//! Every failure is logged. No call is retried.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::oneshot;

use super::device::Device;
use super::didl::{format_didl_lite, parse_didl, parse_track_metadata};
use super::services::UpnpService;
use super::time::{format_upnp_time, parse_upnp_time};
use super::transport::{
    ActionCallback, ActionFailure, ActionInvocation, ActionResponse, ActionTransport,
};
use crate::content::{ContentEntry, Item};

type Outcome = Result<ActionResponse, ActionFailure>;

/// Result of `GetPositionInfo`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PositionInfo {
    pub track_duration: Option<Duration>,
    pub rel_time: Option<Duration>,
    pub title: Option<String>,
    pub artist: Option<String>,
}

/// Result of `GetTransportInfo`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportInfo {
    /// `CurrentTransportState`, e.g. `PLAYING` or `STOPPED`.
    pub state: String,
    /// `CurrentTransportStatus`, usually `OK`.
    pub status: String,
}

// ─────────────────────────────────────────────────────────────────────────────
// Completion
// ─────────────────────────────────────────────────────────────────────────────

/// Callback resolving a oneshot at most once.
///
/// The sender is taken on the first completion; later calls find it gone and
/// are dropped.
struct Completion {
    action: &'static str,
    sender: Mutex<Option<oneshot::Sender<Outcome>>>,
}

impl Completion {
    fn new(action: &'static str, sender: oneshot::Sender<Outcome>) -> Self {
        Self {
            action,
            sender: Mutex::new(Some(sender)),
        }
    }

    fn complete(&self, outcome: Outcome) {
        let sender = self.sender.lock().take();
        match sender {
            // Receiver may be gone after a timeout
            Some(tx) => {
                let _ = tx.send(outcome);
            }
            None => log::warn!(
                "[Bridge] Ignoring duplicate completion for {}",
                self.action
            ),
        }
    }
}

impl ActionCallback for Completion {
    fn success(&self, response: ActionResponse) {
        self.complete(Ok(response));
    }

    fn failure(&self, failure: ActionFailure) {
        self.complete(Err(failure));
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Bridge
// ─────────────────────────────────────────────────────────────────────────────

/// Awaitable UPnP actions over an [`ActionTransport`].
#[derive(Clone)]
pub struct ActionBridge {
    transport: Arc<dyn ActionTransport>,
    timeout: Option<Duration>,
}

impl ActionBridge {
    /// Creates a bridge. `timeout` of `None` waits for the transport forever.
    pub fn new(transport: Arc<dyn ActionTransport>, timeout: Option<Duration>) -> Self {
        Self { transport, timeout }
    }

    /// Invokes an action and waits for its single outcome.
    pub async fn invoke(&self, invocation: ActionInvocation) -> Outcome {
        let action = invocation.action;
        let (tx, rx) = oneshot::channel();
        self.transport
            .execute(invocation, Arc::new(Completion::new(action, tx)));

        let received = match self.timeout {
            Some(limit) => match tokio::time::timeout(limit, rx).await {
                Ok(received) => received,
                Err(_) => {
                    return Err(ActionFailure::new(
                        None,
                        format!("no answer within {:?}", limit),
                    ))
                }
            },
            None => rx.await,
        };

        received.unwrap_or_else(|_| {
            Err(ActionFailure::new(
                None,
                "transport dropped the callback without completing",
            ))
        })
    }

    fn prepare(
        &self,
        device: &Device,
        service: UpnpService,
        action: &'static str,
    ) -> Option<ActionInvocation> {
        match device.control_url(service) {
            Some(url) => Some(ActionInvocation::new(url, service, action)),
            None => {
                log::warn!(
                    "[Bridge] {} has no {} service, cannot {}",
                    device.name,
                    service.name(),
                    action
                );
                None
            }
        }
    }

    /// Lists the direct children of `object_id`.
    ///
    /// Returns an empty list when the device does not answer; callers cannot
    /// tell that apart from an empty folder.
    pub async fn browse(&self, device: &Device, object_id: &str) -> Vec<ContentEntry> {
        let Some(invocation) = self.prepare(device, UpnpService::ContentDirectory, "Browse") else {
            return Vec::new();
        };
        let invocation = invocation
            .arg("ObjectID", object_id)
            .arg("BrowseFlag", "BrowseDirectChildren")
            .arg("Filter", "*")
            .arg("StartingIndex", "0")
            .arg("RequestedCount", "0")
            .arg("SortCriteria", "");

        match self.invoke(invocation).await {
            Ok(response) => {
                let entries = response
                    .argument("Result")
                    .map(|didl| parse_didl(&didl))
                    .unwrap_or_default();
                log::debug!(
                    "[Bridge] Browse {} on {}: {} entries",
                    object_id,
                    device.name,
                    entries.len()
                );
                entries
            }
            Err(failure) => {
                log::warn!(
                    "[Bridge] Browse {} on {} failed: {}",
                    object_id,
                    device.name,
                    failure
                );
                Vec::new()
            }
        }
    }

    async fn transport_command(&self, invocation: ActionInvocation, device: &Device) -> bool {
        let action = invocation.action;
        match self.invoke(invocation).await {
            Ok(_) => {
                log::debug!("[Bridge] {} on {} succeeded", action, device.name);
                true
            }
            Err(failure) => {
                log::warn!("[Bridge] {} on {} failed: {}", action, device.name, failure);
                false
            }
        }
    }

    async fn simple_command(&self, device: &Device, action: &'static str) -> bool {
        match self.prepare(device, UpnpService::AVTransport, action) {
            Some(invocation) => {
                self.transport_command(invocation.instance_id(), device)
                    .await
            }
            None => false,
        }
    }

    pub async fn play(&self, device: &Device) -> bool {
        match self.prepare(device, UpnpService::AVTransport, "Play") {
            Some(invocation) => {
                let invocation = invocation.instance_id().arg("Speed", "1");
                self.transport_command(invocation, device).await
            }
            None => false,
        }
    }

    pub async fn pause(&self, device: &Device) -> bool {
        self.simple_command(device, "Pause").await
    }

    pub async fn stop(&self, device: &Device) -> bool {
        self.simple_command(device, "Stop").await
    }

    pub async fn next(&self, device: &Device) -> bool {
        self.simple_command(device, "Next").await
    }

    pub async fn previous(&self, device: &Device) -> bool {
        self.simple_command(device, "Previous").await
    }

    /// Seeks to an absolute position in the current track.
    pub async fn seek(&self, device: &Device, position: Duration) -> bool {
        match self.prepare(device, UpnpService::AVTransport, "Seek") {
            Some(invocation) => {
                let invocation = invocation
                    .instance_id()
                    .arg("Unit", "REL_TIME")
                    .arg("Target", format_upnp_time(position));
                self.transport_command(invocation, device).await
            }
            None => false,
        }
    }

    /// Loads `item` into the renderer, with DIDL-Lite metadata for display.
    pub async fn set_av_transport_uri(&self, device: &Device, item: &Item) -> bool {
        let Some(uri) = item.uri.as_deref() else {
            log::warn!("[Bridge] {} has no resource URI", item.title);
            return false;
        };
        match self.prepare(device, UpnpService::AVTransport, "SetAVTransportURI") {
            Some(invocation) => {
                let invocation = invocation
                    .instance_id()
                    .arg("CurrentURI", uri)
                    .arg("CurrentURIMetaData", format_didl_lite(item));
                self.transport_command(invocation, device).await
            }
            None => false,
        }
    }

    pub async fn position_info(&self, device: &Device) -> Option<PositionInfo> {
        let invocation = self
            .prepare(device, UpnpService::AVTransport, "GetPositionInfo")?
            .instance_id();

        match self.invoke(invocation).await {
            Ok(response) => {
                let (title, artist) = response
                    .argument("TrackMetaData")
                    .map(|m| parse_track_metadata(&m))
                    .unwrap_or((None, None));
                Some(PositionInfo {
                    track_duration: response
                        .argument("TrackDuration")
                        .and_then(|d| parse_upnp_time(&d)),
                    rel_time: response
                        .argument("RelTime")
                        .and_then(|d| parse_upnp_time(&d)),
                    title,
                    artist,
                })
            }
            Err(failure) => {
                log::debug!(
                    "[Bridge] GetPositionInfo on {} failed: {}",
                    device.name,
                    failure
                );
                None
            }
        }
    }

    pub async fn transport_info(&self, device: &Device) -> Option<TransportInfo> {
        let invocation = self
            .prepare(device, UpnpService::AVTransport, "GetTransportInfo")?
            .instance_id();

        match self.invoke(invocation).await {
            Ok(response) => Some(TransportInfo {
                state: response.argument("CurrentTransportState")?,
                status: response
                    .argument("CurrentTransportStatus")
                    .unwrap_or_else(|| "OK".to_string()),
            }),
            Err(failure) => {
                log::debug!(
                    "[Bridge] GetTransportInfo on {} failed: {}",
                    device.name,
                    failure
                );
                None
            }
        }
    }
}
