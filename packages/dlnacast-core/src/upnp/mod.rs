//! UPnP control point plumbing.
//!
//! - `device` - Device snapshots and the registry fed by discovery
//! - `services` - Service URNs
//! - `soap` - SOAP envelopes over HTTP
//! - `didl` - DIDL-Lite parsing and formatting
//! - `transport` - Callback-based action transport
//! - `bridge` - Awaitable actions with failure fallbacks
//! - `control_point` - Discovery start/stop

pub mod bridge;
pub mod control_point;
pub mod device;
pub mod didl;
pub mod services;
pub mod soap;
pub mod time;
pub mod transport;
pub mod xml;

#[cfg(test)]
pub(crate) mod test_support;

pub use bridge::{ActionBridge, PositionInfo, TransportInfo};
pub use control_point::{ControlPoint, StaticControlPoint};
pub use device::{
    Device, DeviceEvent, DeviceRegistry, DeviceRole, ServiceEndpoint, LOCAL_RENDERER_UDN,
};
pub use services::UpnpService;
pub use soap::{SoapError, SoapResult};
pub use transport::{
    ActionCallback, ActionFailure, ActionInvocation, ActionResponse, ActionTransport,
    SoapTransport,
};
