//! Discovery subsystem control.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use super::device::{Device, DeviceEvent, DeviceRegistry};

/// Start/stop switch of the UPnP discovery subsystem.
pub trait ControlPoint: Send + Sync {
    fn resume(&self);
    fn pause(&self);
    fn is_running(&self) -> bool;
}

/// Control point over a fixed device list.
///
/// Resuming (re)announces every configured device to the registry; pausing
/// stops announcements but leaves known devices in place.
pub struct StaticControlPoint {
    devices: Vec<Device>,
    registry: Arc<DeviceRegistry>,
    running: AtomicBool,
}

impl StaticControlPoint {
    pub fn new(devices: Vec<Device>, registry: Arc<DeviceRegistry>) -> Self {
        Self {
            devices,
            registry,
            running: AtomicBool::new(false),
        }
    }
}

impl ControlPoint for StaticControlPoint {
    fn resume(&self) {
        if self.running.swap(true, Ordering::SeqCst) {
            return;
        }
        for device in &self.devices {
            self.registry.apply(DeviceEvent::Added(device.clone()));
        }
        log::info!(
            "[ControlPoint] Resumed, {} configured device(s) announced",
            self.devices.len()
        );
    }

    fn pause(&self) {
        if self.running.swap(false, Ordering::SeqCst) {
            log::info!("[ControlPoint] Paused");
        }
    }

    fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}
