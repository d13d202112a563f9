//! Decorated tree with fading layers.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::color::{fade, random_color, wheel, Rgb};
use crate::effects::Effect;
use crate::error::Result;
use crate::matrix::{MatrixDims, MatrixSurface};
use crate::params::EffectParams;
use crate::registry::EffectDescriptor;

const TREE_COLORS: [Rgb; 5] = [
    Rgb(0, 128, 0),
    Rgb(0, 100, 0),
    Rgb(17, 139, 17),
    Rgb(23, 139, 43),
    Rgb(0, 107, 60),
];

const TREE_STEPS: u32 = 10;
const OUTLINE_STEPS: u32 = 40;
const ORNAMENT_STEPS: u32 = 10;

/// One color transition in progress.
struct FadeLane {
    index: u32,
    steps: u32,
    from: Rgb,
    to: Rgb,
}

impl FadeLane {
    fn new(from: Rgb, to: Rgb, steps: u32) -> Self {
        Self {
            index: 0,
            steps,
            from,
            to,
        }
    }

    fn color(&self) -> Rgb {
        fade(self.from, self.to, self.index, self.steps)
    }

    /// Advance one step; true once the transition has completed.
    fn step(&mut self) -> bool {
        self.index += 1;
        self.index >= self.steps
    }
}

struct Ornament {
    lane: FadeLane,
    running: bool,
}

/// Layers a slowly shifting tree body, a breathing outline and randomly
/// lighting ornaments on the bottom rows of the matrix.
pub struct XmasTree {
    rng: SmallRng,
    tree: FadeLane,
    outline: FadeLane,
    ornaments: Vec<Ornament>,
}

impl XmasTree {
    pub(crate) fn descriptor() -> EffectDescriptor {
        EffectDescriptor {
            name: "xmas_tree",
            purpose: Some("Display the tree, its outline, and ornaments on the matrix."),
            example: Some(r#"{ "effect": "xmas_tree", "wait": 500 }"#),
            default_wait_ms: 500,
            build: Self::build,
        }
    }

    fn build(dims: MatrixDims, _params: &EffectParams) -> Result<Box<dyn Effect>> {
        let mut rng = SmallRng::from_os_rng();
        let tree_from = random_color(&mut rng, &TREE_COLORS);
        let tree_to = random_color(&mut rng, &TREE_COLORS);
        let ornaments = (0..dims.cols)
            .map(|_| Ornament {
                lane: FadeLane::new(Rgb::CLEAR, Rgb::CLEAR, ORNAMENT_STEPS),
                running: false,
            })
            .collect();
        Ok(Box::new(XmasTree {
            rng,
            tree: FadeLane::new(tree_from, tree_to, TREE_STEPS),
            outline: FadeLane::new(Rgb::GREEN, Rgb(127, 0, 0), OUTLINE_STEPS),
            ornaments,
        }))
    }
}

impl Effect for XmasTree {
    fn render(&self, matrix: &mut dyn MatrixSurface) -> Result<()> {
        let last_col = matrix.cols().saturating_sub(1);

        // Tree body on row 2, outline on row 1, ornaments on row 0. Rows
        // beyond the matrix are dropped by the surface.
        matrix.line(2, 0, 2, last_col, self.tree.color());
        matrix.line(1, 0, 1, last_col, self.outline.color());
        for (col, ornament) in self.ornaments.iter().enumerate() {
            matrix.set(0, col, ornament.lane.color());
        }
        matrix.flush();
        Ok(())
    }

    fn advance(&mut self) {
        if self.tree.step() {
            let next = random_color(&mut self.rng, &TREE_COLORS);
            self.tree = FadeLane::new(self.tree.to, next, TREE_STEPS);
        }

        if self.outline.step() {
            self.outline = FadeLane::new(self.outline.to, self.outline.from, OUTLINE_STEPS);
        }

        for ornament in &mut self.ornaments {
            if ornament.running && ornament.lane.step() {
                ornament.lane = FadeLane::new(Rgb::CLEAR, Rgb::CLEAR, ORNAMENT_STEPS);
                ornament.running = false;
            }
        }

        // Occasionally ignite one ornament with a random wheel color.
        let pick = self.rng.random_range(0..=30usize);
        if pick < self.ornaments.len() {
            let color = wheel(self.rng.random::<u8>());
            self.ornaments[pick] = Ornament {
                lane: FadeLane::new(color, Rgb::CLEAR, ORNAMENT_STEPS),
                running: true,
            };
        }
    }
}
