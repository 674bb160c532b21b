//! Network configuration context for the media server.
//!
//! [`NetworkContext`] bundles the address renderers use to reach the media
//! server. It supports both explicit configuration (advertise IP from the
//! config file) and auto-detection from the host's interfaces.

use std::net::IpAddr;
use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::Notify;

use crate::content::ContentId;

/// Network configuration shared across services.
///
/// # Modes
///
/// - **Explicit**: the advertise IP is known from configuration.
///   Use [`NetworkContext::explicit`].
/// - **Auto-detect**: the local IP is detected from the network interfaces.
///   Use [`NetworkContext::auto_detect`].
#[derive(Clone)]
pub struct NetworkContext {
    /// Server port (initially 0 or the preferred port, set when the server binds).
    pub port: Arc<RwLock<u16>>,
    /// Notifier signaled when the port is assigned.
    pub port_notify: Arc<Notify>,
    /// IP address renderers can reach us at.
    pub local_ip: Arc<RwLock<String>>,
    ip_detector: Option<Arc<dyn IpDetector>>,
}

impl NetworkContext {
    /// Creates a `NetworkContext` with a configured advertise IP.
    #[must_use]
    pub fn explicit(bind_port: u16, advertise_ip: IpAddr) -> Self {
        Self {
            port: Arc::new(RwLock::new(bind_port)),
            port_notify: Arc::new(Notify::new()),
            local_ip: Arc::new(RwLock::new(advertise_ip.to_string())),
            ip_detector: None,
        }
    }

    /// Creates a `NetworkContext` whose IP comes from `ip_detector`.
    ///
    /// # Errors
    ///
    /// Returns an error if the initial IP detection fails.
    pub fn auto_detect(
        preferred_port: u16,
        ip_detector: Arc<dyn IpDetector>,
    ) -> Result<Self, NetworkError> {
        let local_ip = ip_detector.detect()?;
        Ok(Self {
            port: Arc::new(RwLock::new(preferred_port)),
            port_notify: Arc::new(Notify::new()),
            local_ip: Arc::new(RwLock::new(local_ip)),
            ip_detector: Some(ip_detector),
        })
    }

    /// Re-runs IP detection. Fails in explicit mode.
    pub fn detect_ip(&self) -> Result<String, NetworkError> {
        match &self.ip_detector {
            Some(detector) => detector.detect(),
            None => Err(NetworkError::NoDetector),
        }
    }

    #[must_use]
    pub fn get_port(&self) -> u16 {
        *self.port.read()
    }

    #[must_use]
    pub fn get_local_ip(&self) -> String {
        self.local_ip.read().clone()
    }

    /// Sets the port and notifies waiters.
    pub fn set_port(&self, port: u16) {
        *self.port.write() = port;
        self.port_notify.notify_waiters();
    }

    pub fn set_local_ip(&self, ip: String) {
        *self.local_ip.write() = ip;
    }

    /// Returns a `UrlBuilder` for the current address.
    #[must_use]
    pub fn url_builder(&self) -> UrlBuilder {
        UrlBuilder::new(self.get_local_ip(), self.get_port())
    }

    /// URL under which the media server serves `id`.
    #[must_use]
    pub fn media_url(&self, id: ContentId, extension: Option<&str>) -> String {
        self.url_builder().media_url(id, extension)
    }
}

/// Strategy for detecting the local IP address.
pub trait IpDetector: Send + Sync {
    fn detect(&self) -> Result<String, NetworkError>;
}

/// IP detector using the system's network interfaces.
#[derive(Debug, Clone, Default)]
pub struct LocalIpDetector;

impl LocalIpDetector {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    #[must_use]
    pub fn arc() -> Arc<dyn IpDetector> {
        Arc::new(Self::new())
    }
}

impl IpDetector for LocalIpDetector {
    fn detect(&self) -> Result<String, NetworkError> {
        local_ip_address::local_ip()
            .map(|ip| ip.to_string())
            .map_err(|e| NetworkError::Detection(e.to_string()))
    }
}

/// Errors that can occur during network operations.
#[derive(Debug, thiserror::Error)]
pub enum NetworkError {
    #[error("Failed to detect local IP: {0}")]
    Detection(String),

    #[error("No IP detector configured (using explicit mode)")]
    NoDetector,
}

/// Builds media server URLs.
pub struct UrlBuilder {
    ip: String,
    port: u16,
}

impl UrlBuilder {
    pub fn new(ip: impl Into<String>, port: u16) -> Self {
        Self {
            ip: ip.into(),
            port,
        }
    }

    /// Base URL of the server (e.g., `http://192.168.1.100:49500`).
    #[must_use]
    pub fn base_url(&self) -> String {
        format!("http://{}:{}", self.ip, self.port)
    }

    /// Media URL such as `http://192.168.1.100:49500/a-42.mp3`.
    ///
    /// The extension is cosmetic; some renderers refuse URLs without one.
    #[must_use]
    pub fn media_url(&self, id: ContentId, extension: Option<&str>) -> String {
        match extension.map(|ext| ext.trim_start_matches('.')) {
            Some(ext) if !ext.is_empty() => format!("{}/{}.{}", self.base_url(), id, ext),
            _ => format!("{}/{}", self.base_url(), id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::MediaKind;
    use std::net::Ipv4Addr;

    struct MockIpDetector {
        ip: String,
    }

    impl IpDetector for MockIpDetector {
        fn detect(&self) -> Result<String, NetworkError> {
            Ok(self.ip.clone())
        }
    }

    #[test]
    fn explicit_context_uses_provided_ip() {
        let ctx = NetworkContext::explicit(49500, IpAddr::V4(Ipv4Addr::new(192, 168, 1, 100)));
        assert_eq!(ctx.get_local_ip(), "192.168.1.100");
        assert_eq!(ctx.get_port(), 49500);
        assert!(matches!(ctx.detect_ip(), Err(NetworkError::NoDetector)));
    }

    #[test]
    fn auto_detect_context_uses_detector() {
        let detector = Arc::new(MockIpDetector {
            ip: "10.0.0.5".to_string(),
        });
        let ctx = NetworkContext::auto_detect(0, detector).unwrap();
        assert_eq!(ctx.get_local_ip(), "10.0.0.5");
        assert_eq!(ctx.detect_ip().unwrap(), "10.0.0.5");
    }

    #[test]
    fn media_urls_follow_bound_port() {
        let ctx = NetworkContext::explicit(0, IpAddr::V4(Ipv4Addr::new(192, 168, 1, 100)));
        ctx.set_port(49502);
        let id = ContentId::new(MediaKind::Audio, 42).unwrap();

        assert_eq!(
            ctx.media_url(id, Some("mp3")),
            "http://192.168.1.100:49502/a-42.mp3"
        );
        assert_eq!(
            ctx.media_url(id, Some(".mp3")),
            "http://192.168.1.100:49502/a-42.mp3"
        );
        assert_eq!(ctx.media_url(id, None), "http://192.168.1.100:49502/a-42");
    }
}
