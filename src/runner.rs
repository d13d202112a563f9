//! Cadence state machine wrapping a running effect.
//!
//! Effects themselves are timing-free; the runner owns the wait interval and
//! the tick anchor, and turns an arbitrary outer scheduling frequency into
//! evenly paced render/advance pairs. This is what makes every effect
//! self-throttling regardless of how fast the main loop spins.

use std::time::{Duration, Instant};

use crate::effects::Effect;
use crate::error::Result;
use crate::matrix::MatrixSurface;

/// One running effect instance plus its pacing state.
pub struct EffectRunner {
    name: String,
    effect: Box<dyn Effect>,
    wait: Duration,
    anchor: Instant,
}

impl EffectRunner {
    /// Wrap a constructed effect.
    pub fn new(name: impl Into<String>, effect: Box<dyn Effect>, wait: Duration) -> Self {
        Self {
            name: name.into(),
            effect,
            wait,
            anchor: Instant::now(),
        }
    }

    /// Registered name of the wrapped effect.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Wait interval between animation steps.
    pub fn wait(&self) -> Duration {
        self.wait
    }

    /// Start the effect: anchor the cadence at `now` and render once.
    ///
    /// # Errors
    /// Propagates the first render's failure; the caller treats that as
    /// failed-to-start and discards the runner.
    pub fn start(&mut self, matrix: &mut dyn MatrixSurface, now: Instant) -> Result<()> {
        self.anchor = now;
        self.effect.render(matrix)
    }

    /// Cadence gate: render and advance once when the wait interval has
    /// elapsed since the anchor, otherwise do nothing.
    ///
    /// # Errors
    /// Propagates a render failure; advancing still happens so a single bad
    /// frame does not freeze the animation.
    pub fn poll(&mut self, matrix: &mut dyn MatrixSurface, now: Instant) -> Result<()> {
        if now.duration_since(self.anchor) < self.wait {
            return Ok(());
        }
        let rendered = self.effect.render(matrix);
        self.effect.advance();
        self.anchor = now;
        rendered
    }
}
