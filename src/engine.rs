//! Single active-effect scheduler.
//!
//! The engine owns the matrix, the effect registry and the one slot holding
//! the running effect. Switching is atomic with respect to ticks: a new
//! instance only replaces the slot after its first render succeeded, so a
//! failed start leaves the previous animation untouched.

use std::time::Instant;

use tracing::{error, info, warn};

use crate::connectivity::mqtt::Handler;
use crate::control::ControlMessage;
use crate::matrix::MatrixSurface;
use crate::params::EffectParams;
use crate::registry::Registry;
use crate::runner::EffectRunner;
use crate::settings::Settings;

/// Effect engine: registry, matrix and the active-effect slot.
pub struct Engine<M: MatrixSurface> {
    registry: Registry,
    matrix: M,
    active: Option<EffectRunner>,
}

impl<M: MatrixSurface> Engine<M> {
    /// Create an engine with no active effect.
    pub fn new(matrix: M, registry: Registry) -> Self {
        Self {
            registry,
            matrix,
            active: None,
        }
    }

    /// The effect registry.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// The drawing surface.
    pub fn matrix(&self) -> &M {
        &self.matrix
    }

    /// Mutable access to the drawing surface.
    pub fn matrix_mut(&mut self) -> &mut M {
        &mut self.matrix
    }

    /// Name of the currently running effect, if any.
    pub fn active_effect(&self) -> Option<&str> {
        self.active.as_ref().map(EffectRunner::name)
    }

    /// Switch to a named effect.
    ///
    /// On an unknown name, rejected parameters or a failed first render the
    /// current effect keeps running and `false` is returned; errors never
    /// propagate past this boundary.
    pub fn switch_effect(&mut self, name: &str, params: &EffectParams) -> bool {
        self.switch_effect_at(name, params, Instant::now())
    }

    /// [`switch_effect`](Self::switch_effect) with an explicit clock, for
    /// tests driving synthetic time.
    pub fn switch_effect_at(&mut self, name: &str, params: &EffectParams, now: Instant) -> bool {
        let Some(descriptor) = self.registry.lookup(name) else {
            warn!("Effect not defined: {name}");
            return false;
        };
        let canonical = descriptor.name;
        let default_wait = descriptor.default_wait_ms;
        let build = descriptor.build;

        let wait = match params.wait_or(default_wait) {
            Ok(wait) => wait,
            Err(err) => {
                warn!("Could not start {canonical}: {err}");
                return false;
            }
        };
        let effect = match build(self.matrix.dims(), params) {
            Ok(effect) => effect,
            Err(err) => {
                warn!("Could not start {canonical}: {err}");
                return false;
            }
        };

        let mut runner = EffectRunner::new(canonical, effect, wait);
        match runner.start(&mut self.matrix, now) {
            Ok(()) => {
                self.active = Some(runner);
                true
            }
            Err(err) => {
                warn!("Could not start {canonical}: {err}");
                false
            }
        }
    }

    /// Switch to the effect selected by a parsed control message.
    pub fn apply_control(&mut self, message: &ControlMessage) -> bool {
        self.switch_effect(&message.effect, &message.params)
    }

    /// Parse a control message from JSON text and switch to it.
    ///
    /// Malformed messages are dropped with a warning and `false`.
    pub fn apply_control_json(&mut self, text: &str) -> bool {
        match ControlMessage::from_json(text) {
            Ok(message) => self.apply_control(&message),
            Err(err) => {
                warn!("Could not start: {text}: {err}");
                false
            }
        }
    }

    /// Start the boot-time effect.
    ///
    /// Uses the `initial_effect` control message from the settings when
    /// present, otherwise a randomly picked effect's example config.
    pub fn start_initial_effect(&mut self, settings: &Settings) -> bool {
        let payload = match settings.get("initial_effect") {
            Some(configured) => configured.to_string(),
            None => match self.registry.random_example(&mut rand::rng()) {
                Some(example) => example,
                None => {
                    error!("No initial effect found.");
                    return false;
                }
            },
        };
        let started = self.apply_control_json(&payload);
        if started {
            info!("Started initial effect: {payload}");
            self.tick();
        }
        started
    }

    /// Scheduling step: run the active effect's cadence gate once.
    ///
    /// Callers must invoke this on a steady cadence; nothing inside the
    /// engine self-schedules.
    pub fn tick(&mut self) {
        self.tick_at(Instant::now());
    }

    /// [`tick`](Self::tick) with an explicit clock.
    pub fn tick_at(&mut self, now: Instant) {
        if let Some(runner) = &mut self.active {
            if let Err(err) = runner.poll(&mut self.matrix, now) {
                warn!("Error rendering {}: {err}", runner.name());
            }
        }
    }
}

/// Handler for the reserved `effect` MQTT sub-topic.
///
/// Register it on the connectivity manager to let control messages drive the
/// engine:
///
/// ```
/// use neomatrix::connectivity::mqtt::{MqttManager, MqttOptions};
/// # use neomatrix::connectivity::mqtt::{MqttSession, MqttTransport};
/// use neomatrix::{effect_handler, FrameBuffer};
/// # struct NullTransport;
/// # impl MqttTransport for NullTransport {
/// #     fn connect(
/// #         &mut self,
/// #         _options: &MqttOptions,
/// #     ) -> neomatrix::Result<Box<dyn MqttSession>> {
/// #         Err(neomatrix::Error::NotConnected)
/// #     }
/// # }
/// let mut mqtt = MqttManager::new(Box::new(NullTransport), MqttOptions::default());
/// mqtt.register_callback("effect", effect_handler::<FrameBuffer>());
/// ```
pub fn effect_handler<M: MatrixSurface>() -> Handler<Engine<M>> {
    Box::new(|topic, payload, engine| {
        let message = ControlMessage::from_payload(payload)?;
        info!("From MQTT: {topic} - {}", message.effect);
        engine.apply_control(&message);
        Ok(())
    })
}
