//! Device snapshots and the registry fed by discovery.
//!
//! Discovery itself is an external collaborator: it hands us a stream of
//! [`DeviceEvent`]s. A rediscovered device replaces its previous snapshot
//! wholesale.

use std::sync::Arc;

use dashmap::DashMap;
use futures::{Stream, StreamExt};
use serde::{Deserialize, Serialize};

use super::services::UpnpService;

/// Local renderer UDN. The local device never appears on the network.
pub const LOCAL_RENDERER_UDN: &str = "uuid:local-renderer";

/// Capability role of a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeviceRole {
    Renderer,
    ContentDirectory,
    Undefined,
}

/// Control endpoint of one service on a device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceEndpoint {
    pub service: UpnpService,
    pub control_url: String,
}

/// Immutable device snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Device {
    pub udn: String,
    pub name: String,
    pub role: DeviceRole,
    #[serde(default)]
    pub is_local: bool,
    #[serde(default)]
    pub services: Vec<ServiceEndpoint>,
}

impl Device {
    /// The renderer representing this host. Selecting it plays items locally.
    pub fn local(name: impl Into<String>) -> Self {
        Self {
            udn: LOCAL_RENDERER_UDN.to_string(),
            name: name.into(),
            role: DeviceRole::Renderer,
            is_local: true,
            services: Vec::new(),
        }
    }

    /// Control URL of `service`, if the device exposes it.
    pub fn control_url(&self, service: UpnpService) -> Option<&str> {
        self.services
            .iter()
            .find(|s| s.service == service)
            .map(|s| s.control_url.as_str())
    }
}

/// Appearance or disappearance of a device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceEvent {
    Added(Device),
    Removed(String),
}

/// Devices currently known, keyed by UDN.
#[derive(Default)]
pub struct DeviceRegistry {
    devices: DashMap<String, Device>,
}

impl DeviceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply(&self, event: DeviceEvent) {
        match event {
            DeviceEvent::Added(device) => {
                log::debug!("[Devices] {} ({}) available", device.name, device.udn);
                self.devices.insert(device.udn.clone(), device);
            }
            DeviceEvent::Removed(udn) => {
                if let Some((_, device)) = self.devices.remove(&udn) {
                    log::debug!("[Devices] {} ({}) gone", device.name, udn);
                }
            }
        }
    }

    pub fn get(&self, udn: &str) -> Option<Device> {
        self.devices.get(udn).map(|d| d.value().clone())
    }

    /// All known devices, sorted by name.
    pub fn all(&self) -> Vec<Device> {
        let mut devices: Vec<Device> = self.devices.iter().map(|d| d.value().clone()).collect();
        devices.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.udn.cmp(&b.udn)));
        devices
    }

    pub fn renderers(&self) -> Vec<Device> {
        self.with_role(DeviceRole::Renderer)
    }

    pub fn content_directories(&self) -> Vec<Device> {
        self.with_role(DeviceRole::ContentDirectory)
    }

    fn with_role(&self, role: DeviceRole) -> Vec<Device> {
        self.all().into_iter().filter(|d| d.role == role).collect()
    }

    /// Applies events from a discovery stream until it ends.
    pub async fn run<S>(self: Arc<Self>, events: S)
    where
        S: Stream<Item = DeviceEvent> + Send,
    {
        futures::pin_mut!(events);
        while let Some(event) = events.next().await {
            self.apply(event);
        }
        log::debug!("[Devices] Discovery stream ended");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn renderer(udn: &str, name: &str) -> Device {
        Device {
            udn: udn.into(),
            name: name.into(),
            role: DeviceRole::Renderer,
            is_local: false,
            services: vec![ServiceEndpoint {
                service: UpnpService::AVTransport,
                control_url: format!("http://10.0.0.9:49152/{udn}/AVTransport"),
            }],
        }
    }

    #[test]
    fn control_url_lookup() {
        let device = renderer("uuid:tv", "TV");
        assert_eq!(
            device.control_url(UpnpService::AVTransport),
            Some("http://10.0.0.9:49152/uuid:tv/AVTransport")
        );
        assert_eq!(device.control_url(UpnpService::ContentDirectory), None);
    }

    #[test]
    fn rediscovery_replaces_snapshot() {
        let registry = DeviceRegistry::new();
        registry.apply(DeviceEvent::Added(renderer("uuid:tv", "TV")));
        registry.apply(DeviceEvent::Added(renderer("uuid:tv", "Living Room TV")));

        assert_eq!(registry.all().len(), 1);
        assert_eq!(registry.get("uuid:tv").unwrap().name, "Living Room TV");

        registry.apply(DeviceEvent::Removed("uuid:tv".into()));
        assert!(registry.get("uuid:tv").is_none());
    }

    #[test]
    fn filters_by_role() {
        let registry = DeviceRegistry::new();
        registry.apply(DeviceEvent::Added(renderer("uuid:b", "B")));
        registry.apply(DeviceEvent::Added(Device::local("This device")));
        registry.apply(DeviceEvent::Added(Device {
            role: DeviceRole::ContentDirectory,
            ..renderer("uuid:nas", "NAS")
        }));

        let names: Vec<_> = registry.renderers().into_iter().map(|d| d.name).collect();
        assert_eq!(names, vec!["B", "This device"]);
        assert_eq!(registry.content_directories()[0].udn, "uuid:nas");
    }

    #[tokio::test]
    async fn run_consumes_event_stream() {
        let registry = Arc::new(DeviceRegistry::new());
        let events = futures::stream::iter(vec![
            DeviceEvent::Added(renderer("uuid:a", "A")),
            DeviceEvent::Added(renderer("uuid:b", "B")),
            DeviceEvent::Removed("uuid:a".into()),
        ]);

        Arc::clone(&registry).run(events).await;

        assert_eq!(registry.all().len(), 1);
        assert!(registry.get("uuid:b").is_some());
    }
}
