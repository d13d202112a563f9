//! Connectivity resilience layer.
//!
//! Two independent state machines keep the device reachable and remotely
//! controllable:
//!
//! - [`wifi`]: station association with bounded per-candidate polling and a
//!   guaranteed access-point fallback, driven through the
//!   [`WifiRadio`](wifi::WifiRadio) trait;
//! - [`mqtt`]: broker session management with unbounded reconnect, wildcard
//!   re-subscription and suffix-based topic dispatch, driven through the
//!   [`MqttTransport`](mqtt::MqttTransport) session factory.
//!
//! Both convert every failure into a logged event plus a state transition;
//! nothing here returns an error the main loop has to handle beyond reading
//! the resulting state.

pub mod mqtt;
pub mod wifi;

pub use mqtt::{
    Handler, InboundMessage, MqttManager, MqttOptions, MqttSession, MqttState, MqttTransport,
};
pub use wifi::{WifiConfig, WifiManager, WifiRadio, WifiState};
