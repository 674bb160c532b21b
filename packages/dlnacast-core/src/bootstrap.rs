//! Application bootstrap and dependency wiring.
//!
//! This module contains the composition root - the single place where all
//! services are instantiated and wired together.

use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use tokio::runtime::Handle;
use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::content::{ContentIndex, ContentResolver};
use crate::context::{LocalIpDetector, NetworkContext};
use crate::error::{CastError, CastResult};
use crate::events::{BroadcastEventBridge, LoggingEventEmitter};
use crate::playback::{OrchestratorConfig, PlaybackOrchestrator};
use crate::protocol_constants::SOAP_TIMEOUT_SECS;
use crate::upnp::{
    ActionBridge, ActionTransport, ControlPoint, Device, DeviceRegistry, SoapTransport,
    StaticControlPoint,
};

/// Container for all bootstrapped services.
#[derive(Clone)]
pub struct BootstrappedServices {
    pub orchestrator: Arc<PlaybackOrchestrator>,
    /// Devices currently announced by the control point.
    pub registry: Arc<DeviceRegistry>,
    pub control_point: Arc<dyn ControlPoint>,
    /// Request path resolution for the media server.
    pub resolver: Arc<ContentResolver>,
    pub event_bridge: BroadcastEventBridge,
    /// Network configuration (port, local IP).
    pub network: NetworkContext,
    pub config: Arc<Config>,
    /// Cancellation token for graceful shutdown.
    pub cancel_token: CancellationToken,
}

impl BootstrappedServices {
    /// Starts discovery; configured devices become selectable.
    pub fn start_background_tasks(&self) {
        self.control_point.resume();
    }

    /// Initiates graceful shutdown of all services.
    pub fn shutdown(&self) {
        log::info!("[Bootstrap] Beginning graceful shutdown...");
        self.control_point.pause();
        // Stops the orchestrator, its throttle and every poller
        self.cancel_token.cancel();
        log::info!("[Bootstrap] Shutdown complete");
    }
}

/// Creates the shared HTTP client for all SOAP communication.
fn create_http_client() -> CastResult<Client> {
    Client::builder()
        .timeout(Duration::from_secs(SOAP_TIMEOUT_SECS))
        .build()
        .map_err(|e| CastError::Internal(format!("Failed to create HTTP client: {}", e)))
}

/// Bootstraps all services, detecting the local IP from the host's interfaces.
///
/// Must be called from within a Tokio runtime.
pub fn bootstrap_services(
    config: &Config,
    index: Arc<dyn ContentIndex>,
    devices: Vec<Device>,
) -> CastResult<BootstrappedServices> {
    let network = NetworkContext::auto_detect(config.preferred_port, LocalIpDetector::arc())
        .map_err(|e| CastError::Network(e.to_string()))?;
    bootstrap_services_with_network(config, network, index, devices, Handle::current())
}

/// Bootstraps all services with an explicit network context.
///
/// Wiring order:
///
/// 1. HTTP client and SOAP transport (on `handle`)
/// 2. Event bridge, device registry and control point
/// 3. Action bridge and orchestrator
/// 4. Content resolver
pub fn bootstrap_services_with_network(
    config: &Config,
    network: NetworkContext,
    index: Arc<dyn ContentIndex>,
    devices: Vec<Device>,
    handle: Handle,
) -> CastResult<BootstrappedServices> {
    let transport = Arc::new(SoapTransport::new(create_http_client()?, handle));
    wire_services(config, network, transport, index, devices)
}

pub(crate) fn wire_services(
    config: &Config,
    network: NetworkContext,
    transport: Arc<dyn ActionTransport>,
    index: Arc<dyn ContentIndex>,
    mut devices: Vec<Device>,
) -> CastResult<BootstrappedServices> {
    config.validate()?;

    let cancel_token = CancellationToken::new();

    let event_bridge = BroadcastEventBridge::new(config.event_channel_capacity);
    event_bridge.set_external_emitter(Arc::new(LoggingEventEmitter));

    // The local renderer is always selectable
    if !devices.iter().any(|d| d.is_local) {
        devices.push(Device::local(format!("{} (this device)", config.server_name)));
    }
    let registry = Arc::new(DeviceRegistry::new());
    let control_point: Arc<dyn ControlPoint> =
        Arc::new(StaticControlPoint::new(devices, Arc::clone(&registry)));

    let bridge = ActionBridge::new(transport, config.action_timeout());
    let orchestrator = Arc::new(PlaybackOrchestrator::spawn(
        bridge,
        event_bridge.clone(),
        Arc::clone(&control_point),
        OrchestratorConfig::from(config),
        cancel_token.clone(),
    ));

    let resolver = Arc::new(ContentResolver::new(index));

    Ok(BootstrappedServices {
        orchestrator,
        registry,
        control_point,
        resolver,
        event_bridge,
        network,
        config: Arc::new(config.clone()),
        cancel_token,
    })
}

#[cfg(test)]
mod tests {
    use std::net::{IpAddr, Ipv4Addr};

    use super::*;
    use crate::content::MemoryContentIndex;
    use crate::upnp::test_support::{media_server, MockTransport};
    use crate::upnp::LOCAL_RENDERER_UDN;

    fn network() -> NetworkContext {
        NetworkContext::explicit(0, IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1)))
    }

    #[test]
    fn http_client_builds() {
        let client = create_http_client().unwrap();
        assert!(client.get("http://example.com").build().is_ok());
    }

    #[tokio::test]
    async fn resume_announces_devices_and_local_renderer() {
        let services = wire_services(
            &Config::default(),
            network(),
            Arc::new(MockTransport::new()),
            Arc::new(MemoryContentIndex::new()),
            vec![media_server()],
        )
        .unwrap();
        assert!(services.registry.all().is_empty());

        services.start_background_tasks();
        assert_eq!(services.registry.content_directories().len(), 1);
        assert!(services.registry.get(LOCAL_RENDERER_UDN).is_some());

        services.shutdown();
        assert!(!services.control_point.is_running());
        assert!(services.cancel_token.is_cancelled());
    }

    #[tokio::test]
    async fn invalid_config_is_rejected() {
        let config = Config {
            poll_interval_ms: 0,
            ..Config::default()
        };
        let result = wire_services(
            &config,
            network(),
            Arc::new(MockTransport::new()),
            Arc::new(MemoryContentIndex::new()),
            Vec::new(),
        );
        assert!(matches!(result, Err(CastError::Configuration(_))));
    }
}
