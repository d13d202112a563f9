//! Alternating two-tone blink.

use crate::color::Rgb;
use crate::effects::Effect;
use crate::error::{Error, Result};
use crate::matrix::{MatrixDims, MatrixSurface};
use crate::params::EffectParams;
use crate::registry::EffectDescriptor;

/// Which pixels form the blinking foreground group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BlinkStyle {
    /// Every other pixel along the chain.
    Patch,
    /// Every other row.
    Row,
}

/// Blinks two pixel groups in counter-phase, rotating the palette every few
/// steps.
pub struct Blink {
    dims: MatrixDims,
    style: BlinkStyle,
    step: u64,
    colors: [Rgb; 4],
}

impl Blink {
    pub(crate) fn descriptor() -> EffectDescriptor {
        EffectDescriptor {
            name: "blink",
            purpose: Some("Blinking lights, choose between patches and rows."),
            example: Some(r#"{ "effect": "blink", "style": "patch", "wait": 500 }"#),
            default_wait_ms: 500,
            build: Self::build,
        }
    }

    fn build(dims: MatrixDims, params: &EffectParams) -> Result<Box<dyn Effect>> {
        let style = match params.str_or("style", "patch")?.as_str() {
            "patch" => BlinkStyle::Patch,
            "row" => BlinkStyle::Row,
            other => {
                return Err(Error::Params(format!(
                    "\"style\" must be \"patch\" or \"row\", not \"{other}\""
                )));
            }
        };
        Ok(Box::new(Blink {
            dims,
            style,
            step: 0,
            colors: [
                Rgb(50, 10, 25),
                Rgb(13, 50, 8),
                Rgb(3, 13, 50),
                Rgb(128, 20, 18),
            ],
        }))
    }

    fn in_foreground(&self, index: usize) -> bool {
        match self.style {
            BlinkStyle::Patch => index % 2 == 0,
            BlinkStyle::Row => (index % self.dims.rows.max(1)) % 2 == 0,
        }
    }
}

impl Effect for Blink {
    fn render(&self, matrix: &mut dyn MatrixSurface) -> Result<()> {
        let even_step = self.step % 2 == 0;
        for i in 0..matrix.size() {
            let color = if self.in_foreground(i) == even_step {
                self.colors[0]
            } else {
                self.colors[1]
            };
            matrix.set_index(i, color);
        }
        matrix.flush();
        Ok(())
    }

    fn advance(&mut self) {
        self.step += 1;
        if self.step % 5 == 0 {
            let [c1, c2, c3, c4] = self.colors;
            self.colors = [c3, c4, c1, c2];
        }
    }
}
