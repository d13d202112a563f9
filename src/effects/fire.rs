//! Flickering fire.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::color::Rgb;
use crate::effects::Effect;
use crate::error::Result;
use crate::matrix::{MatrixDims, MatrixSurface};
use crate::params::EffectParams;
use crate::registry::EffectDescriptor;

/// Per-pixel heat map rendered as black-red-yellow, cooled and re-ignited
/// randomly on every step.
pub struct Fire {
    heat: Vec<u8>,
    rng: SmallRng,
}

impl Fire {
    pub(crate) fn descriptor() -> EffectDescriptor {
        EffectDescriptor {
            name: "fire",
            purpose: Some("Display a fire on the matrix."),
            example: None,
            default_wait_ms: 100,
            build: Self::build,
        }
    }

    fn build(dims: MatrixDims, _params: &EffectParams) -> Result<Box<dyn Effect>> {
        Ok(Box::new(Fire {
            heat: vec![0; dims.size()],
            rng: SmallRng::from_os_rng(),
        }))
    }
}

/// Map a heat value to a black-red-yellow gradient.
fn heat_color(temperature: u8) -> Rgb {
    if temperature < 85 {
        Rgb(temperature * 3, 0, 0)
    } else {
        let green = (u16::from(temperature - 85) * 3).min(255) as u8;
        Rgb(255, green, 0)
    }
}

impl Effect for Fire {
    fn render(&self, matrix: &mut dyn MatrixSurface) -> Result<()> {
        for (i, &heat) in self.heat.iter().enumerate() {
            matrix.set_index(i, heat_color(heat));
        }
        matrix.flush();
        Ok(())
    }

    fn advance(&mut self) {
        // Cool everything a little, then spark a few random pixels.
        for heat in &mut self.heat {
            *heat = heat.saturating_sub(self.rng.random_range(0..=32));
        }
        for heat in &mut self.heat {
            if self.rng.random_range(0..=10) < 3 {
                *heat = heat.saturating_add(self.rng.random_range(0..=96));
            }
        }
    }
}
