//! HTTP API layer.
//!
//! One router serves both the media server (`GET|HEAD /{prefix}{id}[.ext]`)
//! and the JSON control API. Handlers are thin and delegate to the
//! orchestrator, registry and resolver.

use std::sync::Arc;

use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::bootstrap::BootstrappedServices;
use crate::config::Config;
use crate::content::ContentResolver;
use crate::context::NetworkContext;
use crate::events::BroadcastEventBridge;
use crate::playback::PlaybackOrchestrator;
use crate::protocol_constants::{DLNA_DOC_VERSION, PORT_RANGE_END, PORT_RANGE_START, UPNP_VERSION};
use crate::upnp::DeviceRegistry;

pub mod http;
pub mod range;
pub mod response;

/// Errors that can occur when starting or running the server.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Failed to bind to a TCP port.
    #[error("Failed to bind to port: {0}")]
    Bind(#[from] std::io::Error),

    /// No available ports in the specified range.
    #[error("No available ports in range {start}-{end}")]
    NoAvailablePort { start: u16, end: u16 },
}

/// Shared application state for the API layer.
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<PlaybackOrchestrator>,
    pub registry: Arc<DeviceRegistry>,
    pub resolver: Arc<ContentResolver>,
    pub event_bridge: BroadcastEventBridge,
    pub network: NetworkContext,
    pub config: Arc<Config>,
    /// Precomputed `Server` header value of media responses.
    pub server_header: Arc<str>,
}

impl AppState {
    pub fn new(services: &BootstrappedServices) -> Self {
        Self {
            orchestrator: Arc::clone(&services.orchestrator),
            registry: Arc::clone(&services.registry),
            resolver: Arc::clone(&services.resolver),
            event_bridge: services.event_bridge.clone(),
            network: services.network.clone(),
            config: Arc::clone(&services.config),
            server_header: server_header(&services.config).into(),
        }
    }
}

/// Builds `DLNADOC/1.50 UPnP/1.0 <name>/<version> <platform>/<platform-version>`.
pub fn server_header(config: &Config) -> String {
    let platform = sysinfo::System::name().unwrap_or_else(|| "Unknown".to_string());
    let platform_version = config
        .platform_version
        .clone()
        .or_else(sysinfo::System::os_version)
        .unwrap_or_else(|| "0".to_string());
    format!(
        "{} {} {}/{} {}/{}",
        DLNA_DOC_VERSION,
        UPNP_VERSION,
        config.server_name,
        env!("CARGO_PKG_VERSION"),
        platform.replace(' ', "_"),
        platform_version.replace(' ', "_"),
    )
}

async fn find_available_port(
    start: u16,
    end: u16,
) -> Result<(u16, tokio::net::TcpListener), ServerError> {
    for port in start..=end {
        let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));
        match tokio::net::TcpListener::bind(&addr).await {
            Ok(listener) => return Ok((port, listener)),
            Err(_) => continue,
        }
    }
    Err(ServerError::NoAvailablePort { start, end })
}

/// Starts the HTTP server on the configured or first free port of the
/// default range, until `cancel` fires.
pub async fn start_server(state: AppState, cancel: CancellationToken) -> Result<(), ServerError> {
    let preferred_port = state.config.preferred_port;
    let (port, listener) = if preferred_port > 0 {
        let addr = std::net::SocketAddr::from(([0, 0, 0, 0], preferred_port));
        (preferred_port, tokio::net::TcpListener::bind(&addr).await?)
    } else {
        find_available_port(PORT_RANGE_START, PORT_RANGE_END).await?
    };

    // Set port and signal waiters
    state.network.set_port(port);

    log::info!("[MediaServer] Listening on http://0.0.0.0:{}", port);
    log::info!("[MediaServer] Server header: {}", state.server_header);
    let app = http::create_router(state);

    axum::serve(listener, app)
        .with_graceful_shutdown(cancel.cancelled_owned())
        .await?;
    log::info!("[MediaServer] Stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_header_embeds_versions() {
        let config = Config {
            platform_version: Some("14".to_string()),
            ..Config::default()
        };
        let header = server_header(&config);
        assert!(header.starts_with("DLNADOC/1.50 UPnP/1.0 dlnacast/"));
        assert!(header.ends_with("/14"));
        assert_eq!(header.split(' ').count(), 4);
    }

    #[tokio::test]
    async fn port_probe_skips_taken_ports() {
        let taken = tokio::net::TcpListener::bind("0.0.0.0:0").await.unwrap();
        let port = taken.local_addr().unwrap().port();

        match find_available_port(port, port).await {
            Err(ServerError::NoAvailablePort { start, end }) => {
                assert_eq!((start, end), (port, port));
            }
            other => panic!("expected exhausted range, got {:?}", other.map(|(p, _)| p)),
        }
    }
}
