//! Built-in animation effects.
//!
//! Every effect implements [`Effect`]: a draw step that must not change
//! internal state and a state transition that must not draw. The cadence
//! between the two lives outside the effect, in
//! [`EffectRunner`](crate::runner::EffectRunner), so concrete effects stay
//! free of timing code.
//!
//! New effects are added by implementing the trait and appending a
//! descriptor to [`builtins`].

mod blink;
mod cross;
mod cycle;
mod fire;
mod row_col;
mod wheel_loop;
mod xmas_tree;

pub use blink::Blink;
pub use cross::Cross;
pub use cycle::Cycle;
pub use fire::Fire;
pub use row_col::RowCol;
pub use wheel_loop::WheelLoop;
pub use xmas_tree::XmasTree;

use crate::error::Result;
use crate::matrix::MatrixSurface;
use crate::registry::EffectDescriptor;

/// Animation contract implemented by every effect.
pub trait Effect {
    /// Draw the current state onto the matrix.
    ///
    /// Rendering takes `&self`: the same state must produce the same frame,
    /// which is what makes snapshot testing of effects possible.
    fn render(&self, matrix: &mut dyn MatrixSurface) -> Result<()>;

    /// Move to the next animation step. Performs no drawing.
    fn advance(&mut self);
}

/// Registration table of the compiled-in effects.
pub fn builtins() -> Vec<EffectDescriptor> {
    vec![
        Blink::descriptor(),
        Cross::descriptor(),
        Cycle::descriptor(),
        Fire::descriptor(),
        RowCol::descriptor(),
        WheelLoop::descriptor(),
        XmasTree::descriptor(),
    ]
}
