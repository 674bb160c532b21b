//! Server configuration.
//!
//! Supports loading from YAML files with environment variable overrides.

use std::net::IpAddr;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use dlnacast_core::{Device, IndexRecord, MediaKind, MemoryContentIndex};
use serde::Deserialize;

/// One file of the local library.
#[derive(Debug, Clone, Deserialize)]
pub struct LibraryEntry {
    pub kind: MediaKind,
    /// Content index row; the request path is `/{prefix}{id}.{ext}`.
    pub id: u64,
    pub path: PathBuf,
    /// Guessed from the file extension when absent.
    pub mime: Option<String>,
}

impl LibraryEntry {
    pub fn mime(&self) -> String {
        self.mime.clone().unwrap_or_else(|| {
            mime_guess::from_path(&self.path)
                .first_or_octet_stream()
                .essence_str()
                .to_string()
        })
    }

    /// Extension used in advertised media URLs.
    pub fn extension(&self) -> Option<&str> {
        self.path.extension().and_then(|ext| ext.to_str())
    }
}

/// Server configuration loaded from YAML with environment overrides.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Port to bind the HTTP server to (0 = first free port of 49500-49510).
    /// Override: `DLNACAST_BIND_PORT`
    pub bind_port: u16,

    /// IP address renderers should fetch media from.
    /// If not specified, auto-detection will be attempted.
    /// Override: `DLNACAST_ADVERTISE_IP`
    pub advertise_ip: Option<IpAddr>,

    /// Interval between renderer state polls (milliseconds).
    /// Override: `DLNACAST_POLL_INTERVAL_MS`
    pub poll_interval_ms: u64,

    /// Render request coalescing window (milliseconds).
    pub render_throttle_ms: u64,

    /// Upper bound on one remote action (seconds). 0 waits forever.
    pub action_timeout_secs: u64,

    /// Platform version in the `Server` header. Detected when unset.
    pub platform_version: Option<String>,

    /// Devices announced by the control point.
    pub devices: Vec<Device>,

    /// Files served by the media server.
    pub library: Vec<LibraryEntry>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        let core = dlnacast_core::Config::default();
        Self {
            bind_port: core.preferred_port,
            advertise_ip: None,
            poll_interval_ms: core.poll_interval_ms,
            render_throttle_ms: core.render_throttle_ms,
            action_timeout_secs: core.action_timeout_secs,
            platform_version: None,
            devices: Vec::new(),
            library: Vec::new(),
        }
    }
}

impl ServerConfig {
    /// Loads configuration from a YAML file, then applies environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = if let Some(path) = path {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            Self::from_yaml(&content)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?
        } else {
            Self::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    fn from_yaml(content: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(content)?)
    }

    /// Applies environment variable overrides to the configuration.
    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("DLNACAST_BIND_PORT") {
            if let Ok(port) = val.parse() {
                self.bind_port = port;
            }
        }

        if let Ok(val) = std::env::var("DLNACAST_ADVERTISE_IP") {
            if let Ok(ip) = val.parse() {
                self.advertise_ip = Some(ip);
            }
        }

        if let Ok(val) = std::env::var("DLNACAST_POLL_INTERVAL_MS") {
            if let Ok(interval) = val.parse() {
                self.poll_interval_ms = interval;
            }
        }
    }

    /// Converts to dlnacast-core's Config type.
    pub fn to_core_config(&self) -> dlnacast_core::Config {
        dlnacast_core::Config {
            preferred_port: self.bind_port,
            poll_interval_ms: self.poll_interval_ms,
            render_throttle_ms: self.render_throttle_ms,
            action_timeout_secs: self.action_timeout_secs,
            platform_version: self.platform_version.clone(),
            ..Default::default()
        }
    }

    /// Builds the in-memory content index from the library entries.
    pub fn build_index(&self) -> MemoryContentIndex {
        let index = MemoryContentIndex::new();
        for entry in &self.library {
            let record = IndexRecord::new(&entry.path, entry.mime());
            if !index.insert(entry.kind, entry.id, record) {
                log::warn!(
                    "[Library] Skipping {}: {:?} items cannot be served",
                    entry.path.display(),
                    entry.kind
                );
            }
        }
        index
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use dlnacast_core::{ContentIndex, DeviceRole, UpnpService};

    use super::*;

    const SAMPLE: &str = r#"
bind_port: 49505
advertise_ip: 192.168.1.20
devices:
  - udn: "uuid:tv"
    name: Living Room TV
    role: RENDERER
    services:
      - service: AVTransport
        controlUrl: http://192.168.1.30:49152/AVTransport/control
  - udn: "uuid:nas"
    name: NAS
    role: CONTENT_DIRECTORY
    services:
      - service: ContentDirectory
        controlUrl: http://192.168.1.40:8200/ctl/ContentDir
library:
  - kind: audio
    id: 12
    path: /music/song.mp3
  - kind: video
    id: 3
    path: /video/clip.bin
    mime: video/mp4
  - kind: generic
    id: 9
    path: /docs/readme.txt
"#;

    #[test]
    fn parses_devices_and_library() {
        let config = ServerConfig::from_yaml(SAMPLE).unwrap();
        assert_eq!(config.bind_port, 49505);
        assert_eq!(config.advertise_ip, Some("192.168.1.20".parse().unwrap()));
        assert_eq!(config.poll_interval_ms, 1000);

        assert_eq!(config.devices.len(), 2);
        assert_eq!(config.devices[0].role, DeviceRole::Renderer);
        assert_eq!(
            config.devices[1].control_url(UpnpService::ContentDirectory),
            Some("http://192.168.1.40:8200/ctl/ContentDir")
        );
        assert!(!config.devices[0].is_local);
    }

    #[test]
    fn mime_is_guessed_from_extension() {
        let config = ServerConfig::from_yaml(SAMPLE).unwrap();
        assert_eq!(config.library[0].mime(), "audio/mpeg");
        assert_eq!(config.library[1].mime(), "video/mp4");
        assert_eq!(config.library[0].extension(), Some("mp3"));
    }

    #[tokio::test]
    async fn index_skips_generic_entries() {
        let config = ServerConfig::from_yaml(SAMPLE).unwrap();
        let index = config.build_index();
        assert_eq!(index.len(), 2);

        let record = index.lookup(MediaKind::Audio, 12).await.unwrap().unwrap();
        assert_eq!(record.path, PathBuf::from("/music/song.mp3"));
        assert!(index.lookup(MediaKind::Generic, 9).await.unwrap().is_none());
    }

    #[test]
    fn loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"bind_port: 49501\nrender_throttle_ms: 100\n")
            .unwrap();
        let config = ServerConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.render_throttle_ms, 100);
        assert!(config.devices.is_empty());

        let core = config.to_core_config();
        assert_eq!(core.render_throttle_ms, 100);
        assert!(core.validate().is_ok());
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(ServerConfig::load(Some(&dir.path().join("absent.yaml"))).is_err());
    }
}
