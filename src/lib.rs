//! Pluggable animation effect engine for addressable LED matrices.
//!
//! A decorative LED matrix runs one animation "effect" at a time, remotely
//! selectable over MQTT. This crate provides the two stateful halves of such
//! a device: the effect engine (a registry of built-in effects plus a timed
//! render/advance state machine per running instance) and the connectivity
//! resilience layer (WiFi station association with access-point fallback,
//! MQTT session management with topic dispatch).
//!
//! # Features
//! - Static effect registry with case-insensitive lookup and generated help
//! - Self-throttling effects: render/advance cadence decoupled from the
//!   outer loop frequency
//! - Atomic effect switching; a failed start never disturbs the running
//!   animation
//! - WiFi candidate iteration with bounded polling and guaranteed AP
//!   fallback
//! - Self-healing MQTT sessions: unbounded reconnect, automatic
//!   re-subscription, per-suffix callback dispatch
//! - Hardware behind traits ([`MatrixSurface`], [`WifiRadio`],
//!   [`connectivity::MqttTransport`]) so everything runs and tests on a host
//!
//! # Quick start
//! ```
//! use neomatrix::{Engine, FrameBuffer, Registry};
//!
//! let registry = Registry::discover().expect("built-in effects are valid");
//! let mut engine = Engine::new(FrameBuffer::new(3, 4), registry);
//! engine.apply_control_json(r#"{ "effect": "cross", "color": [200, 0, 0] }"#);
//!
//! loop {
//!     engine.tick();
//!     // ... poll connectivity, sleep a little ...
//!     # break;
//! }
//! ```
//!
//! # Remote control
//! Messages on the reserved `effect` sub-topic below the configured root
//! topic carry a JSON object with a required `effect` field and optional
//! effect-specific parameters:
//!
//! ```json
//! { "effect": "cross", "color": [200, 0, 0], "wait": 500 }
//! ```

#![warn(missing_docs)]

pub mod color;
pub mod connectivity;
pub mod control;
pub mod effects;
pub mod engine;
pub mod error;
pub mod matrix;
pub mod params;
pub mod registry;
pub mod runner;
pub mod settings;

pub use color::{fade, random_color, wheel, Rgb, RAINBOW};
pub use connectivity::{WifiConfig, WifiManager, WifiRadio, WifiState};
pub use control::ControlMessage;
pub use effects::Effect;
pub use engine::{effect_handler, Engine};
pub use error::{Error, Result};
pub use matrix::{FrameBuffer, MatrixDims, MatrixSurface};
pub use params::EffectParams;
pub use registry::{EffectDescriptor, Registry};
pub use runner::EffectRunner;
pub use settings::Settings;
