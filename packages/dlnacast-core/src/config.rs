//! Core configuration.
//!
//! [`Config`] carries every tunable of the core library. All fields have
//! defaults taken from [`crate::protocol_constants`]; the server binary
//! overlays values from its YAML file, environment and CLI.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::protocol_constants::{
    ACTION_TIMEOUT_SECS, APP_NAME, COMMAND_CHANNEL_CAPACITY, EVENT_CHANNEL_CAPACITY,
    POLL_INTERVAL_MS, RENDER_THROTTLE_MS,
};

/// Rejected configuration value.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be >= 1")]
    Zero(&'static str),
}

/// Configuration for the dlnacast core.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct Config {
    /// Preferred port for the HTTP server (0 = probe the default range).
    pub preferred_port: u16,

    /// Interval between renderer state polls (milliseconds).
    pub poll_interval_ms: u64,

    /// Render request coalescing window (milliseconds).
    pub render_throttle_ms: u64,

    /// Upper bound on one remote action (seconds). 0 waits forever, except
    /// for the `Stop` sent while tearing a session down.
    pub action_timeout_secs: u64,

    /// Capacity of the event broadcast channel.
    pub event_channel_capacity: usize,

    /// Capacity of the orchestrator command channel.
    pub command_channel_capacity: usize,

    /// Implementation name reported in the `Server` header.
    pub server_name: String,

    /// Platform version reported in the `Server` header.
    /// Detected from the host OS when unset.
    pub platform_version: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            preferred_port: 0,
            poll_interval_ms: POLL_INTERVAL_MS,
            render_throttle_ms: RENDER_THROTTLE_MS,
            action_timeout_secs: ACTION_TIMEOUT_SECS,
            event_channel_capacity: EVENT_CHANNEL_CAPACITY,
            command_channel_capacity: COMMAND_CHANNEL_CAPACITY,
            server_name: APP_NAME.to_string(),
            platform_version: None,
        }
    }
}

impl Config {
    /// Validates values that would cause runtime issues.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.poll_interval_ms == 0 {
            return Err(ConfigError::Zero("poll_interval_ms"));
        }
        if self.render_throttle_ms == 0 {
            return Err(ConfigError::Zero("render_throttle_ms"));
        }
        // broadcast::channel and mpsc::channel panic on 0
        if self.event_channel_capacity == 0 {
            return Err(ConfigError::Zero("event_channel_capacity"));
        }
        if self.command_channel_capacity == 0 {
            return Err(ConfigError::Zero("command_channel_capacity"));
        }
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn render_throttle(&self) -> Duration {
        Duration::from_millis(self.render_throttle_ms)
    }

    /// Bound applied by the action bridge, `None` when disabled.
    pub fn action_timeout(&self) -> Option<Duration> {
        (self.action_timeout_secs > 0).then(|| Duration::from_secs(self.action_timeout_secs))
    }
}
