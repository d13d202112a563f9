//! Rotating color wheel across the whole matrix.

use crate::color::wheel;
use crate::effects::Effect;
use crate::error::Result;
use crate::matrix::{MatrixDims, MatrixSurface};
use crate::params::EffectParams;
use crate::registry::EffectDescriptor;

/// Spreads the color wheel over the chain and rotates it one step at a time.
pub struct WheelLoop {
    index: usize,
}

impl WheelLoop {
    pub(crate) fn descriptor() -> EffectDescriptor {
        EffectDescriptor {
            name: "wheel_loop",
            purpose: Some("Cycle through the matrix with a wheel effect."),
            example: None,
            default_wait_ms: 100,
            build: Self::build,
        }
    }

    fn build(_dims: MatrixDims, _params: &EffectParams) -> Result<Box<dyn Effect>> {
        Ok(Box::new(WheelLoop { index: 0 }))
    }
}

impl Effect for WheelLoop {
    fn render(&self, matrix: &mut dyn MatrixSurface) -> Result<()> {
        let size = matrix.size();
        for i in 0..size {
            let pos = (i * 256 / size + self.index) & 0xff;
            matrix.set_index(i, wheel(pos as u8));
        }
        matrix.flush();
        Ok(())
    }

    fn advance(&mut self) {
        self.index = self.index.wrapping_add(1);
    }
}
