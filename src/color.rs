//! Color type and palette helpers shared by the built-in effects.

use rand::Rng;
use serde::{Deserialize, Serialize};

/// RGB color triple.
///
/// Serializes as a three-element `[r, g, b]` array, which is also the form
/// color parameters take in control messages. Anything else (strings, wrong
/// arity, out-of-range components) is rejected during parameter decoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    /// All channels off.
    pub const CLEAR: Rgb = Rgb(0, 0, 0);
    /// Full red.
    pub const RED: Rgb = Rgb(255, 0, 0);
    /// Full green.
    pub const GREEN: Rgb = Rgb(0, 255, 0);
    /// Full blue.
    pub const BLUE: Rgb = Rgb(0, 0, 255);
    /// Full cyan.
    pub const CYAN: Rgb = Rgb(0, 255, 255);
    /// Full magenta.
    pub const MAGENTA: Rgb = Rgb(255, 0, 255);
    /// Full yellow.
    pub const YELLOW: Rgb = Rgb(255, 255, 0);
}

/// Dimmed 32-step rainbow palette used by the row/column effect.
pub const RAINBOW: [Rgb; 32] = [
    Rgb(126, 1, 0),
    Rgb(114, 13, 0),
    Rgb(102, 25, 0),
    Rgb(90, 37, 0),
    Rgb(78, 49, 0),
    Rgb(66, 61, 0),
    Rgb(54, 73, 0),
    Rgb(42, 85, 0),
    Rgb(30, 97, 0),
    Rgb(18, 109, 0),
    Rgb(6, 121, 0),
    Rgb(0, 122, 5),
    Rgb(0, 110, 17),
    Rgb(0, 98, 29),
    Rgb(0, 86, 41),
    Rgb(0, 74, 53),
    Rgb(0, 62, 65),
    Rgb(0, 50, 77),
    Rgb(0, 38, 89),
    Rgb(0, 26, 101),
    Rgb(0, 14, 113),
    Rgb(0, 2, 125),
    Rgb(9, 0, 118),
    Rgb(21, 0, 106),
    Rgb(33, 0, 94),
    Rgb(45, 0, 82),
    Rgb(57, 0, 70),
    Rgb(69, 0, 58),
    Rgb(81, 0, 46),
    Rgb(93, 0, 34),
    Rgb(105, 0, 22),
    Rgb(117, 0, 10),
];

/// Map a position on the color wheel to an RGB value.
///
/// The colors are a transition r - g - b - back to r across the full
/// 0..=255 input range.
pub fn wheel(pos: u8) -> Rgb {
    if pos < 85 {
        Rgb(255 - pos * 3, pos * 3, 0)
    } else if pos < 170 {
        let pos = pos - 85;
        Rgb(0, 255 - pos * 3, pos * 3)
    } else {
        let pos = pos - 170;
        Rgb(pos * 3, 0, 255 - pos * 3)
    }
}

/// Interpolate between two colors.
///
/// `index` counts from 0 (all `from`) to `steps` (all `to`); intermediate
/// values are rounded per channel. A zero `steps` yields `to`.
pub fn fade(from: Rgb, to: Rgb, index: u32, steps: u32) -> Rgb {
    if steps == 0 {
        return to;
    }
    let index = index.min(steps);
    let channel = |a: u8, b: u8| -> u8 {
        let mixed = u32::from(a) * (steps - index) + u32::from(b) * index;
        ((mixed + steps / 2) / steps) as u8
    };
    Rgb(
        channel(from.0, to.0),
        channel(from.1, to.1),
        channel(from.2, to.2),
    )
}

/// Pick a random color from a palette.
///
/// Returns [`Rgb::CLEAR`] for an empty palette.
pub fn random_color<R: Rng + ?Sized>(rng: &mut R, palette: &[Rgb]) -> Rgb {
    if palette.is_empty() {
        return Rgb::CLEAR;
    }
    palette[rng.random_range(0..palette.len())]
}
