//! Seeded improved Perlin noise in three dimensions.

use rand::{SeedableRng, rngs::SmallRng, seq::SliceRandom};

use super::{fade, floor_cell};

/// Default permutation seed.
pub const DEFAULT_PERLIN_SEED: u64 = 0;

/// Gradient noise with a seeded permutation table.
///
/// Output is continuous, with continuous first and second derivatives, and
/// stays within roughly `[-1, 1]`. The same seed always yields the same field.
#[derive(Clone)]
pub struct PerlinNoise {
    /// Permutation repeated twice so lookups never wrap
    perm: Vec<u8>,
}

impl Default for PerlinNoise {
    fn default() -> Self {
        Self::new(DEFAULT_PERLIN_SEED)
    }
}

impl core::fmt::Debug for PerlinNoise {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("PerlinNoise").finish_non_exhaustive()
    }
}

impl PerlinNoise {
    /// Build a noise field from a Fisher-Yates shuffled permutation
    pub fn new(seed: u64) -> Self {
        let mut table: Vec<u8> = (0..=u8::MAX).collect();
        let mut rng = SmallRng::seed_from_u64(seed);
        table.shuffle(&mut rng);

        let perm = (0..512).map(|i| table[i & 255]).collect();
        Self { perm }
    }

    /// Sample the field. Result is approximately in `[-1, 1]`.
    pub fn noise(&self, x: f64, y: f64, z: f64) -> f64 {
        let (xi, x) = floor_cell(x);
        let (yi, y) = floor_cell(y);
        let (zi, z) = floor_cell(z);

        let u = fade(x);
        let v = fade(y);
        let w = fade(z);

        let p = |i: usize| usize::from(self.perm[i]);
        let a = p(xi) + yi;
        let aa = p(a) + zi;
        let ab = p(a + 1) + zi;
        let b = p(xi + 1) + yi;
        let ba = p(b) + zi;
        let bb = p(b + 1) + zi;

        let (x1, y1, z1) = (x - 1.0, y - 1.0, z - 1.0);

        let c000 = grad(self.perm[aa], x, y, z);
        let c100 = grad(self.perm[ba], x1, y, z);
        let c010 = grad(self.perm[ab], x, y1, z);
        let c110 = grad(self.perm[bb], x1, y1, z);
        let c001 = grad(self.perm[aa + 1], x, y, z1);
        let c101 = grad(self.perm[ba + 1], x1, y, z1);
        let c011 = grad(self.perm[ab + 1], x, y1, z1);
        let c111 = grad(self.perm[bb + 1], x1, y1, z1);

        let x00 = lerp(u, c000, c100);
        let x10 = lerp(u, c010, c110);
        let x01 = lerp(u, c001, c101);
        let x11 = lerp(u, c011, c111);
        let y0 = lerp(v, x00, x10);
        let y1 = lerp(v, x01, x11);
        lerp(w, y0, y1)
    }

    /// Sample the field remapped to `[0, 1]`
    pub fn noise01(&self, x: f64, y: f64, z: f64) -> f64 {
        ((self.noise(x, y, z) + 1.0) * 0.5).clamp(0.0, 1.0)
    }
}

#[inline]
fn lerp(t: f64, a: f64, b: f64) -> f64 {
    a + t * (b - a)
}

/// Dot product with one of the twelve cube-edge gradients (four repeated).
#[inline]
fn grad(hash: u8, x: f64, y: f64, z: f64) -> f64 {
    match hash & 15 {
        0 | 12 => x + y,
        1 => -x + y,
        2 => x - y,
        3 => -x - y,
        4 => x + z,
        5 => -x + z,
        6 => x - z,
        7 => -x - z,
        8 => y + z,
        9 | 13 => -y + z,
        10 => y - z,
        11 | 15 => -y - z,
        _ => y - x,
    }
}
