//! Blinking diagonal cross.

use crate::color::Rgb;
use crate::effects::Effect;
use crate::error::Result;
use crate::matrix::{MatrixDims, MatrixSurface};
use crate::params::EffectParams;
use crate::registry::EffectDescriptor;

/// Toggles a colored diagonal cross on and off.
pub struct Cross {
    color: Rgb,
    is_on: bool,
}

impl Cross {
    pub(crate) fn descriptor() -> EffectDescriptor {
        EffectDescriptor {
            name: "cross",
            purpose: Some("Display a red cross on the matrix."),
            example: Some(r#"{ "effect": "cross", "color": [200, 0, 0], "wait": 500 }"#),
            default_wait_ms: 500,
            build: Self::build,
        }
    }

    fn build(_dims: MatrixDims, params: &EffectParams) -> Result<Box<dyn Effect>> {
        Ok(Box::new(Cross {
            color: params.color_or(Rgb::RED)?,
            is_on: true,
        }))
    }
}

impl Effect for Cross {
    fn render(&self, matrix: &mut dyn MatrixSurface) -> Result<()> {
        if self.is_on {
            matrix.clear();
        } else {
            let last_row = matrix.rows().saturating_sub(1);
            let last_col = matrix.cols().saturating_sub(1);
            matrix.line(0, 0, last_row, last_col, self.color);
            matrix.line(last_row, 0, 0, last_col, self.color);
        }
        matrix.flush();
        Ok(())
    }

    fn advance(&mut self) {
        self.is_on = !self.is_on;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::FrameBuffer;

    #[test]
    fn alternates_between_cross_and_blank() {
        let mut fb = FrameBuffer::new(3, 3);
        let mut cross = Cross {
            color: Rgb(200, 0, 0),
            is_on: true,
        };

        cross.render(&mut fb).unwrap();
        assert_eq!(fb.lit_pixels(), 0);

        cross.advance();
        cross.render(&mut fb).unwrap();
        assert_eq!(fb.pixel(0, 0), Rgb(200, 0, 0));
        assert_eq!(fb.pixel(1, 1), Rgb(200, 0, 0));
        assert_eq!(fb.pixel(2, 0), Rgb(200, 0, 0));
        assert_eq!(fb.pixel(0, 2), Rgb(200, 0, 0));

        cross.advance();
        cross.render(&mut fb).unwrap();
        assert_eq!(fb.lit_pixels(), 0);
    }

    #[test]
    fn render_does_not_mutate_state() {
        let mut fb = FrameBuffer::new(3, 3);
        let cross = Cross {
            color: Rgb::RED,
            is_on: false,
        };
        cross.render(&mut fb).unwrap();
        let first = fb.lit_pixels();
        cross.render(&mut fb).unwrap();
        assert_eq!(fb.lit_pixels(), first);
    }
}
