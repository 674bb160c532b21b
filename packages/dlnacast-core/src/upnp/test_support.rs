//! Scripted transport and payload fixtures for tests.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use super::device::{Device, DeviceRole, ServiceEndpoint};
use super::services::UpnpService;
use super::transport::{
    ActionCallback, ActionFailure, ActionInvocation, ActionResponse, ActionTransport,
};
use super::xml::escape_xml;

/// How the mock answers one action.
#[derive(Clone)]
enum Script {
    Respond(String),
    Fail,
    /// Keep the callback, never complete.
    Silent,
    /// Drop the callback without completing.
    Drop,
    /// Success followed by a failure.
    DoubleFire,
}

/// [`ActionTransport`] answering from a per-action script.
///
/// Completions fire synchronously inside `execute`. Scripts bound to a
/// control URL take precedence over action-wide ones. Unscripted actions
/// succeed with an empty response.
#[derive(Default)]
pub struct MockTransport {
    scripts: Mutex<HashMap<&'static str, Script>>,
    device_scripts: Mutex<HashMap<(String, &'static str), Script>>,
    calls: Mutex<Vec<ActionInvocation>>,
    parked: Mutex<Vec<Arc<dyn ActionCallback>>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(&self, action: &'static str, body: String) {
        self.scripts.lock().insert(action, Script::Respond(body));
    }

    /// Scripts `action` for one device only.
    pub fn respond_for(&self, device: &Device, action: &'static str, body: String) {
        for endpoint in &device.services {
            self.device_scripts
                .lock()
                .insert((endpoint.control_url.clone(), action), Script::Respond(body.clone()));
        }
    }

    /// Calls sent to any service of `device`.
    pub fn calls_to(&self, device: &Device, action: &str) -> usize {
        self.calls
            .lock()
            .iter()
            .filter(|c| c.action == action)
            .filter(|c| device.services.iter().any(|s| s.control_url == c.control_url))
            .count()
    }

    pub fn fail(&self, action: &'static str) {
        self.scripts.lock().insert(action, Script::Fail);
    }

    pub fn silence(&self, action: &'static str) {
        self.scripts.lock().insert(action, Script::Silent);
    }

    pub fn drop_callback(&self, action: &'static str) {
        self.scripts.lock().insert(action, Script::Drop);
    }

    pub fn double_fire(&self, action: &'static str) {
        self.scripts.lock().insert(action, Script::DoubleFire);
    }

    pub fn calls(&self) -> Vec<ActionInvocation> {
        self.calls.lock().clone()
    }

    pub fn actions(&self) -> Vec<&'static str> {
        self.calls.lock().iter().map(|c| c.action).collect()
    }

    pub fn count(&self, action: &str) -> usize {
        self.calls.lock().iter().filter(|c| c.action == action).count()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().clear();
    }
}

impl ActionTransport for MockTransport {
    fn execute(&self, invocation: ActionInvocation, callback: Arc<dyn ActionCallback>) {
        let device_script = self
            .device_scripts
            .lock()
            .get(&(invocation.control_url.clone(), invocation.action))
            .cloned();
        let script = device_script.or_else(|| self.scripts.lock().get(invocation.action).cloned());
        self.calls.lock().push(invocation);

        match script {
            None => callback.success(ActionResponse::new(envelope(""))),
            Some(Script::Respond(body)) => callback.success(ActionResponse::new(body)),
            Some(Script::Fail) => callback.failure(ActionFailure::new(Some(500), "scripted failure")),
            Some(Script::Silent) => self.parked.lock().push(callback),
            Some(Script::Drop) => drop(callback),
            Some(Script::DoubleFire) => {
                callback.success(ActionResponse::new(envelope("")));
                callback.failure(ActionFailure::new(Some(500), "late failure"));
            }
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Fixtures
// ─────────────────────────────────────────────────────────────────────────────

fn envelope(inner: &str) -> String {
    format!(
        r#"<?xml version="1.0"?><s:Envelope xmlns:s="http://schemas.xmlsoap.org/soap/envelope/"><s:Body><u:Response>{}</u:Response></s:Body></s:Envelope>"#,
        inner
    )
}

/// `Browse` response wrapping a DIDL-Lite document.
pub fn browse_response(didl: &str) -> String {
    envelope(&format!(
        "<Result>{}</Result><NumberReturned>0</NumberReturned><TotalMatches>0</TotalMatches>",
        escape_xml(didl)
    ))
}

/// `GetPositionInfo` response, optionally with track metadata.
pub fn position_response(rel_time: &str, duration: &str, track: Option<(&str, &str)>) -> String {
    let metadata = match track {
        Some((title, artist)) => escape_xml(&format!(
            r#"<DIDL-Lite><item id="-1" parentID="-1"><dc:title>{title}</dc:title><upnp:artist>{artist}</upnp:artist></item></DIDL-Lite>"#
        )),
        None => "NOT_IMPLEMENTED".to_string(),
    };
    envelope(&format!(
        "<Track>1</Track><TrackDuration>{duration}</TrackDuration><TrackMetaData>{metadata}</TrackMetaData><RelTime>{rel_time}</RelTime>"
    ))
}

/// `GetTransportInfo` response.
pub fn transport_response(state: &str) -> String {
    envelope(&format!(
        "<CurrentTransportState>{state}</CurrentTransportState><CurrentTransportStatus>OK</CurrentTransportStatus><CurrentSpeed>1</CurrentSpeed>"
    ))
}

/// Remote renderer with an AVTransport service.
pub fn renderer() -> Device {
    named_renderer("uuid:renderer-1", "Living Room TV")
}

pub fn named_renderer(udn: &str, name: &str) -> Device {
    Device {
        udn: udn.to_string(),
        name: name.to_string(),
        role: DeviceRole::Renderer,
        is_local: false,
        services: vec![ServiceEndpoint {
            service: UpnpService::AVTransport,
            control_url: format!("http://10.0.0.20:49152/{udn}/AVTransport/control"),
        }],
    }
}

/// Content directory with a ContentDirectory service.
pub fn media_server() -> Device {
    Device {
        udn: "uuid:nas".to_string(),
        name: "NAS".to_string(),
        role: DeviceRole::ContentDirectory,
        is_local: false,
        services: vec![ServiceEndpoint {
            service: UpnpService::ContentDirectory,
            control_url: "http://10.0.0.30:8200/ctl/ContentDir".to_string(),
        }],
    }
}
