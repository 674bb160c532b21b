//! Low-level SOAP protocol implementation for UPnP communication.
//!
//! This module handles the raw SOAP envelope building, HTTP transport,
//! and XML response parsing. Callers normally go through the callback-based
//! [`crate::upnp::transport::SoapTransport`] rather than using this directly.

use std::time::Duration;

use reqwest::Client;
use thiserror::Error;

use super::services::UpnpService;
use super::xml::{escape_xml, extract_xml_text};
use crate::protocol_constants::SOAP_TIMEOUT_SECS;

// ─────────────────────────────────────────────────────────────────────────────
// Error Types
// ─────────────────────────────────────────────────────────────────────────────

/// Errors that can occur during SOAP operations with UPnP devices.
#[derive(Debug, Error)]
pub enum SoapError {
    /// HTTP request to the device failed.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Device returned a non-success HTTP status without a SOAP fault.
    #[error("HTTP error {0}: {1}")]
    HttpStatus(u16, String),

    /// Device returned a SOAP fault response.
    #[error("SOAP fault: {0}")]
    Fault(String),

    /// Request could not be built.
    #[error("Invalid SOAP request: {0}")]
    InvalidRequest(&'static str),
}

/// Convenient Result alias for SOAP operations.
pub type SoapResult<T> = Result<T, SoapError>;

impl SoapError {
    /// HTTP status associated with the failure, if any.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http(e) => e.status().map(|s| s.as_u16()),
            Self::HttpStatus(code, _) => Some(*code),
            // UPnP devices answer faults with 500
            Self::Fault(_) => Some(500),
            Self::InvalidRequest(_) => None,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// SOAP Request/Response
// ─────────────────────────────────────────────────────────────────────────────

/// Builds the SOAP envelope for an action.
///
/// Must be a single line with no leading whitespace: some device SOAP
/// parsers reject XML with whitespace before the root element.
pub fn build_envelope(service_urn: &str, action: &str, args: &[(&str, &str)]) -> String {
    let mut body = format!(
        r#"<?xml version="1.0" encoding="utf-8"?><s:Envelope xmlns:s="http://schemas.xmlsoap.org/soap/envelope/" s:encodingStyle="http://schemas.xmlsoap.org/soap/encoding/"><s:Body><u:{} xmlns:u="{}">"#,
        action, service_urn
    );

    for (k, v) in args {
        body.push_str(&format!("<{k}>{}</{k}>", escape_xml(v)));
    }

    body.push_str(&format!(r#"</u:{}></s:Body></s:Envelope>"#, action));
    body
}

/// Sends a SOAP request to a UPnP device.
///
/// # Arguments
/// * `client` - The HTTP client to use for the request
/// * `control_url` - Absolute control URL of the service on the device
/// * `service_urn` - The UPnP service URN
/// * `action` - The SOAP action name (e.g., "Play", "Browse")
/// * `args` - Key-value pairs for action arguments (order is preserved)
///
/// # Returns
/// The response body on success, or a `SoapError` if the request fails
/// or the device returns a SOAP fault.
pub async fn send_soap_request(
    client: &Client,
    control_url: &str,
    service_urn: &str,
    action: &str,
    args: &[(&str, &str)],
) -> SoapResult<String> {
    let body = build_envelope(service_urn, action, args);

    log::debug!("[SOAP] {} -> {} (body: {} bytes)", action, control_url, body.len());
    log::trace!("[SOAP] Request body: {}", body);

    let start = std::time::Instant::now();
    let res = client
        .post(control_url)
        .header("Content-Type", "text/xml; charset=\"utf-8\"")
        .header("SOAPAction", format!("\"{}#{}\"", service_urn, action))
        .body(body)
        .timeout(Duration::from_secs(SOAP_TIMEOUT_SECS))
        .send()
        .await;

    log::debug!(
        "[SOAP] {} completed in {:?}: {:?}",
        action,
        start.elapsed(),
        res.as_ref().map(|r| r.status())
    );

    let res = res?;

    let status = res.status();
    let response_text = res.text().await?;

    // SOAP faults usually arrive with a 500 status, check them first
    if let Some(fault) = extract_fault(&response_text) {
        return Err(SoapError::Fault(fault));
    }

    if !status.is_success() {
        return Err(SoapError::HttpStatus(status.as_u16(), response_text));
    }

    Ok(response_text)
}

/// Extracts a fault description, preferring the UPnP error code/description.
fn extract_fault(xml: &str) -> Option<String> {
    if !xml.contains(":Fault>") {
        return None;
    }
    let code = extract_xml_text(xml, "errorCode");
    let description = extract_xml_text(xml, "errorDescription")
        .or_else(|| extract_xml_text(xml, "faultstring"))
        .unwrap_or_else(|| "Unknown SOAP fault".to_string());
    Some(match code {
        Some(code) => format!("{} ({})", description, code),
        None => description,
    })
}

// ─────────────────────────────────────────────────────────────────────────────
// SOAP Request Builder
// ─────────────────────────────────────────────────────────────────────────────

/// Builder for constructing and sending SOAP requests.
///
/// # Example
/// ```ignore
/// let response = SoapRequestBuilder::new(&client, "http://10.0.0.9:49152/AVTransport/control")
///     .service(UpnpService::AVTransport)
///     .action("Play")
///     .instance_id()
///     .arg("Speed", "1")
///     .send()
///     .await?;
/// ```
pub struct SoapRequestBuilder<'a> {
    client: &'a Client,
    control_url: &'a str,
    service: Option<UpnpService>,
    action: Option<&'a str>,
    args: Vec<(&'a str, String)>,
}

impl<'a> SoapRequestBuilder<'a> {
    #[must_use]
    pub fn new(client: &'a Client, control_url: &'a str) -> Self {
        Self {
            client,
            control_url,
            service: None,
            action: None,
            args: Vec::new(),
        }
    }

    #[must_use]
    pub fn service(mut self, service: UpnpService) -> Self {
        self.service = Some(service);
        self
    }

    #[must_use]
    pub fn action(mut self, action: &'a str) -> Self {
        self.action = Some(action);
        self
    }

    /// Adds an argument. Arguments keep insertion order.
    #[must_use]
    pub fn arg(mut self, key: &'a str, value: impl Into<String>) -> Self {
        self.args.push((key, value.into()));
        self
    }

    /// Adds the standard InstanceID="0" argument used by AVTransport actions.
    #[must_use]
    pub fn instance_id(self) -> Self {
        self.arg("InstanceID", "0")
    }

    /// Sends the SOAP request and returns the response body.
    ///
    /// # Errors
    /// Returns `SoapError` if the service or action is not set, or if the
    /// request fails.
    pub async fn send(self) -> SoapResult<String> {
        let service = self
            .service
            .ok_or(SoapError::InvalidRequest("service not set"))?;
        let action = self
            .action
            .ok_or(SoapError::InvalidRequest("action not set"))?;

        let args: Vec<(&str, &str)> = self.args.iter().map(|(k, v)| (*k, v.as_str())).collect();

        send_soap_request(self.client, self.control_url, service.urn(), action, &args).await
    }

    /// Returns the request parts without sending (for testing).
    #[cfg(test)]
    pub fn into_parts(self) -> Option<(UpnpService, &'a str, Vec<(&'a str, String)>)> {
        let service = self.service?;
        let action = self.action?;
        Some((service, action, self.args))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const URL: &str = "http://192.168.1.20:49152/upnp/control/AVTransport1";

    #[test]
    fn builder_captures_args_in_order() {
        let client = Client::new();
        let parts = SoapRequestBuilder::new(&client, URL)
            .service(UpnpService::AVTransport)
            .action("Seek")
            .instance_id()
            .arg("Unit", "REL_TIME")
            .arg("Target", "0:01:30")
            .into_parts();

        let (service, action, args) = parts.expect("should have parts");
        assert_eq!(service, UpnpService::AVTransport);
        assert_eq!(action, "Seek");
        assert_eq!(args[0], ("InstanceID", "0".to_string()));
        assert_eq!(args[1], ("Unit", "REL_TIME".to_string()));
        assert_eq!(args[2], ("Target", "0:01:30".to_string()));
    }

    #[test]
    fn into_parts_returns_none_without_service() {
        let client = Client::new();
        assert!(SoapRequestBuilder::new(&client, URL)
            .action("Play")
            .into_parts()
            .is_none());
    }

    #[test]
    fn envelope_escapes_argument_values() {
        let body = build_envelope(
            UpnpService::AVTransport.urn(),
            "SetAVTransportURI",
            &[("CurrentURI", "http://h/a?x=1&y=2")],
        );
        assert!(body.starts_with("<?xml"));
        assert!(body.contains("<CurrentURI>http://h/a?x=1&amp;y=2</CurrentURI>"));
        assert!(body.contains(r#"<u:SetAVTransportURI xmlns:u="urn:schemas-upnp-org:service:AVTransport:1">"#));
        assert!(body.ends_with("</u:SetAVTransportURI></s:Body></s:Envelope>"));
    }

    #[test]
    fn fault_prefers_upnp_error_description() {
        let xml = r#"<s:Envelope><s:Body><s:Fault><faultcode>s:Client</faultcode><faultstring>UPnPError</faultstring><detail><UPnPError><errorCode>701</errorCode><errorDescription>Transition not available</errorDescription></UPnPError></detail></s:Fault></s:Body></s:Envelope>"#;
        assert_eq!(
            extract_fault(xml),
            Some("Transition not available (701)".to_string())
        );
    }

    #[test]
    fn no_fault_in_regular_response() {
        assert_eq!(extract_fault("<s:Envelope><s:Body/></s:Envelope>"), None);
    }
}
