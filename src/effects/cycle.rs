//! Single pixel walking along the chain.

use crate::color::Rgb;
use crate::effects::Effect;
use crate::error::Result;
use crate::matrix::{MatrixDims, MatrixSurface};
use crate::params::EffectParams;
use crate::registry::EffectDescriptor;

/// Lights one pixel at a time, cycling through the whole matrix.
pub struct Cycle {
    color: Rgb,
    index: usize,
}

impl Cycle {
    pub(crate) fn descriptor() -> EffectDescriptor {
        EffectDescriptor {
            name: "cycle",
            purpose: Some("Cycle through the matrix."),
            example: Some(r#"{ "effect": "cycle", "color": [200, 30, 4] }"#),
            default_wait_ms: 100,
            build: Self::build,
        }
    }

    fn build(_dims: MatrixDims, params: &EffectParams) -> Result<Box<dyn Effect>> {
        Ok(Box::new(Cycle {
            color: params.color_or(Rgb::RED)?,
            index: 0,
        }))
    }
}

impl Effect for Cycle {
    fn render(&self, matrix: &mut dyn MatrixSurface) -> Result<()> {
        let size = matrix.size();
        matrix.clear();
        if size > 0 {
            matrix.set_index(self.index % size, self.color);
        }
        matrix.flush();
        Ok(())
    }

    fn advance(&mut self) {
        self.index = self.index.wrapping_add(1);
    }
}
