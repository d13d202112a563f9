//! Rainbow sweep over rows, then columns.

use crate::color::RAINBOW;
use crate::effects::Effect;
use crate::error::Result;
use crate::matrix::{MatrixDims, MatrixSurface};
use crate::params::EffectParams;
use crate::registry::EffectDescriptor;

/// Lights one full row or column at a time, alternating orientation and
/// stepping through the rainbow palette on every flip.
pub struct RowCol {
    dims: MatrixDims,
    color_index: usize,
    is_row: bool,
    current: usize,
}

impl RowCol {
    pub(crate) fn descriptor() -> EffectDescriptor {
        EffectDescriptor {
            name: "row_col",
            purpose: Some("Display a row or column of color on the matrix."),
            example: None,
            default_wait_ms: 100,
            build: Self::build,
        }
    }

    fn build(dims: MatrixDims, _params: &EffectParams) -> Result<Box<dyn Effect>> {
        Ok(Box::new(RowCol {
            dims,
            color_index: 0,
            is_row: true,
            current: 0,
        }))
    }

    /// Step to the next row or column; on wrap-around switch orientation
    /// and report the flip.
    fn step_position(&mut self) -> bool {
        self.current += 1;
        let limit = if self.is_row {
            self.dims.rows
        } else {
            self.dims.cols
        };
        if self.current >= limit {
            self.current = 0;
            self.is_row = !self.is_row;
            return true;
        }
        false
    }
}

impl Effect for RowCol {
    fn render(&self, matrix: &mut dyn MatrixSurface) -> Result<()> {
        let color = RAINBOW[self.color_index % RAINBOW.len()];
        matrix.clear();
        let last_row = matrix.rows().saturating_sub(1);
        let last_col = matrix.cols().saturating_sub(1);
        if self.is_row {
            matrix.line(self.current, 0, self.current, last_col, color);
        } else {
            matrix.line(last_row, self.current, 0, self.current, color);
        }
        matrix.flush();
        Ok(())
    }

    fn advance(&mut self) {
        if self.step_position() {
            self.color_index = (self.color_index + 1) % RAINBOW.len();
        }
    }
}
