//! Callback-based remote action transport.
//!
//! This is the primitive the UPnP stack offers: fire an action at a device
//! and get told later, through a callback, whether it worked. The
//! [`crate::upnp::bridge::ActionBridge`] turns it into awaitable results.

use std::sync::Arc;

use reqwest::Client;
use tokio::runtime::Handle;

use super::services::UpnpService;
use super::soap::SoapRequestBuilder;
use super::xml::extract_xml_text;

/// A single remote action call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionInvocation {
    pub control_url: String,
    pub service: UpnpService,
    pub action: &'static str,
    /// Arguments in wire order.
    pub args: Vec<(&'static str, String)>,
}

impl ActionInvocation {
    pub fn new(control_url: impl Into<String>, service: UpnpService, action: &'static str) -> Self {
        Self {
            control_url: control_url.into(),
            service,
            action,
            args: Vec::new(),
        }
    }

    #[must_use]
    pub fn arg(mut self, key: &'static str, value: impl Into<String>) -> Self {
        self.args.push((key, value.into()));
        self
    }

    /// Adds the `InstanceID=0` argument every AVTransport action takes.
    #[must_use]
    pub fn instance_id(self) -> Self {
        self.arg("InstanceID", "0")
    }

    /// Looks up an argument value (used by tests and logging).
    pub fn argument(&self, key: &str) -> Option<&str> {
        self.args
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// Successful action response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionResponse {
    /// Raw SOAP response body.
    pub body: String,
}

impl ActionResponse {
    pub fn new(body: impl Into<String>) -> Self {
        Self { body: body.into() }
    }

    /// Value of an output argument, entity-decoded.
    pub fn argument(&self, name: &str) -> Option<String> {
        extract_xml_text(&self.body, name)
    }
}

/// Failed action call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionFailure {
    /// HTTP status, when the device answered at all.
    pub status: Option<u16>,
    pub message: String,
}

impl ActionFailure {
    pub fn new(status: Option<u16>, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ActionFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.status {
            Some(status) => write!(f, "{} (status {})", self.message, status),
            None => write!(f, "{}", self.message),
        }
    }
}

/// Completion handler for one invocation.
///
/// Transports are expected to call exactly one method exactly once, but
/// implementations must tolerate repeated or mixed calls.
pub trait ActionCallback: Send + Sync {
    fn success(&self, response: ActionResponse);
    fn failure(&self, failure: ActionFailure);
}

/// Executes remote actions, reporting completion through a callback.
pub trait ActionTransport: Send + Sync {
    fn execute(&self, invocation: ActionInvocation, callback: Arc<dyn ActionCallback>);
}

// ─────────────────────────────────────────────────────────────────────────────
// SOAP Transport
// ─────────────────────────────────────────────────────────────────────────────

/// [`ActionTransport`] speaking SOAP over HTTP.
///
/// Each invocation runs on its own task; the callback fires from that task.
pub struct SoapTransport {
    client: Client,
    runtime: Handle,
}

impl SoapTransport {
    pub fn new(client: Client, runtime: Handle) -> Self {
        Self { client, runtime }
    }
}

impl ActionTransport for SoapTransport {
    fn execute(&self, invocation: ActionInvocation, callback: Arc<dyn ActionCallback>) {
        let client = self.client.clone();
        self.runtime.spawn(async move {
            let mut request = SoapRequestBuilder::new(&client, &invocation.control_url)
                .service(invocation.service)
                .action(invocation.action);
            for (key, value) in &invocation.args {
                request = request.arg(*key, value.as_str());
            }

            match request.send().await {
                Ok(body) => callback.success(ActionResponse::new(body)),
                Err(e) => {
                    log::debug!(
                        "[SOAP] {} on {} failed: {}",
                        invocation.action,
                        invocation.control_url,
                        e
                    );
                    callback.failure(ActionFailure::new(e.status(), e.to_string()));
                }
            }
        });
    }
}
