//! Deterministic 2D coherent noise for turbulence and parameter smoothing.
//!
//! This is OpenSimplex noise: a simplex-style lattice built on a stretched square grid,
//! with 8 gradients picked through a 256-entry permutation table. The table is fixed when
//! the field is constructed, so sampling only needs `&self` and a field can be shared
//! freely between threads.

use rand::Rng;
use rand::seq::SliceRandom;

use crate::math::floor;

/// (1 / sqrt(2 + 1) - 1) / 2
const STRETCH: f64 = -0.211_324_865_405_187;
/// (sqrt(2 + 1) - 1) / 2
const SQUISH: f64 = 0.366_025_403_784_439;
/// Brings the raw sum into about -1 .. 1.
const NORM: f64 = 47.0;

/// Gradients to the vertices of an octagon, as (x, y) pairs.
const GRADIENTS: [f64; 16] = [
    5.0, 2.0, 2.0, 5.0, -5.0, 2.0, -2.0, 5.0, 5.0, -2.0, 2.0, -5.0, -5.0, -2.0, -2.0, -5.0,
];

const LCG_MULTIPLIER: i64 = 6_364_136_223_846_793_005;
const LCG_INCREMENT: i64 = 1_442_695_040_888_963_407;

/// A 2D coherent-noise field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoiseField {
    perm: [u8; 256],
}

impl NoiseField {
    /// Builds the permutation table from a seed with a 64-bit LCG.
    #[must_use]
    pub fn new(seed: i64) -> Self {
        let mut source = [0u8; 256];
        for (i, s) in source.iter_mut().enumerate() {
            *s = i as u8;
        }
        let mut seed = seed;
        for _ in 0..3 {
            seed = lcg(seed);
        }
        let mut perm = [0u8; 256];
        for i in (0..256_usize).rev() {
            seed = lcg(seed);
            let len = i as i64 + 1;
            let r = (seed.wrapping_add(31) % len + len) % len;
            let r = r as usize;
            perm[i] = source[r];
            source[r] = source[i];
        }
        NoiseField { perm }
    }

    /// Builds the permutation table by shuffling with a caller's random number generator.
    pub fn from_rng<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let mut perm = [0u8; 256];
        for (i, p) in perm.iter_mut().enumerate() {
            *p = i as u8;
        }
        perm.shuffle(rng);
        NoiseField { perm }
    }

    /// Returns the noise value at `(x, y)`, within `-1 ..= 1`.
    #[must_use]
    pub fn sample(&self, x: f64, y: f64) -> f64 {
        // Place input coordinates onto the stretched grid.
        let stretch_offset = (x + y) * STRETCH;
        let xs = x + stretch_offset;
        let ys = y + stretch_offset;

        // Floor to get grid coordinates of the rhombus (stretched square) super-cell origin.
        let mut xsb = floor(xs) as i64;
        let mut ysb = floor(ys) as i64;

        // Skew out to get the actual coordinates of the rhombus origin.
        let squish_offset = (xsb + ysb) as f64 * SQUISH;
        let xb = xsb as f64 + squish_offset;
        let yb = ysb as f64 + squish_offset;

        // Position within the super-cell and relative to its origin.
        let xins = xs - xsb as f64;
        let yins = ys - ysb as f64;
        let in_sum = xins + yins;
        let mut dx0 = x - xb;
        let mut dy0 = y - yb;

        let mut value = 0.0;

        // Contribution (1, 0)
        let dx1 = dx0 - 1.0 - SQUISH;
        let dy1 = dy0 - SQUISH;
        value += self.contribution(xsb + 1, ysb, dx1, dy1);

        // Contribution (0, 1)
        let dx2 = dx0 - SQUISH;
        let dy2 = dy0 - 1.0 - SQUISH;
        value += self.contribution(xsb, ysb + 1, dx2, dy2);

        let (xsv_ext, ysv_ext, dx_ext, dy_ext) = if in_sum <= 1.0 {
            // Inside the triangle (2-simplex) at (0, 0)
            let zins = 1.0 - in_sum;
            if zins > xins || zins > yins {
                if xins > yins {
                    (xsb + 1, ysb - 1, dx0 - 1.0, dy0 + 1.0)
                } else {
                    (xsb - 1, ysb + 1, dx0 + 1.0, dy0 - 1.0)
                }
            } else {
                (
                    xsb + 1,
                    ysb + 1,
                    dx0 - 1.0 - 2.0 * SQUISH,
                    dy0 - 1.0 - 2.0 * SQUISH,
                )
            }
        } else {
            // Inside the triangle (2-simplex) at (1, 1)
            let zins = 2.0 - in_sum;
            let ext = if zins < xins || zins < yins {
                if xins > yins {
                    (xsb + 2, ysb, dx0 - 2.0 - 2.0 * SQUISH, dy0 - 2.0 * SQUISH)
                } else {
                    (xsb, ysb + 2, dx0 - 2.0 * SQUISH, dy0 - 2.0 - 2.0 * SQUISH)
                }
            } else {
                (xsb, ysb, dx0, dy0)
            };
            xsb += 1;
            ysb += 1;
            dx0 = dx0 - 1.0 - 2.0 * SQUISH;
            dy0 = dy0 - 1.0 - 2.0 * SQUISH;
            ext
        };

        // Contribution (0, 0) or (1, 1)
        value += self.contribution(xsb, ysb, dx0, dy0);

        // Extra vertex
        value += self.contribution(xsv_ext, ysv_ext, dx_ext, dy_ext);

        (value / NORM).clamp(-1.0, 1.0)
    }

    /// Fills `out` with samples along the row `y`, starting at `x0` and stepping by `dx`.
    pub fn fill(&self, out: &mut [f32], x0: f64, dx: f64, y: f64) {
        for (i, o) in out.iter_mut().enumerate() {
            *o = self.sample(x0 + i as f64 * dx, y) as f32;
        }
    }

    fn contribution(&self, xsb: i64, ysb: i64, dx: f64, dy: f64) -> f64 {
        let attn = 2.0 - dx * dx - dy * dy;
        if attn <= 0.0 {
            return 0.0;
        }
        let attn = attn * attn;
        attn * attn * self.extrapolate(xsb, ysb, dx, dy)
    }

    fn extrapolate(&self, xsb: i64, ysb: i64, dx: f64, dy: f64) -> f64 {
        let inner = i64::from(self.perm[(xsb & 0xFF) as usize]);
        let index = usize::from(self.perm[((inner + ysb) & 0xFF) as usize] & 0x0E);
        GRADIENTS[index] * dx + GRADIENTS[index + 1] * dy
    }
}

impl Default for NoiseField {
    fn default() -> Self {
        NoiseField::new(0)
    }
}

/// Host-facing noise query: `noise2D(x, y)`.
#[must_use]
pub fn noise2d(field: &NoiseField, x: f64, y: f64) -> f64 {
    field.sample(x, y)
}

fn lcg(seed: i64) -> i64 {
    seed.wrapping_mul(LCG_MULTIPLIER).wrapping_add(LCG_INCREMENT)
}
