//! Cellular (Worley) noise over a jittered lattice.

use rand::{Rng, SeedableRng, rngs::SmallRng};

/// Default lattice seed.
pub const DEFAULT_VORONOI_SEED: u64 = 42;

const LATTICE: usize = 256;
const LATTICE_MASK: i64 = LATTICE as i64 - 1;

/// Result of a cellular noise lookup.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VoronoiSample {
    /// Distance to the nearest feature point
    pub distance: f64,
    /// Second nearest distance minus nearest distance.
    ///
    /// Zero exactly on a cell border, growing toward the cell interior.
    pub edge: f64,
    /// Lattice cell owning the nearest feature point
    pub cell: (i64, i64),
}

/// One jittered feature point per unit cell, tiled every 256 cells.
#[derive(Clone)]
pub struct VoronoiNoise {
    points: Vec<(f64, f64)>,
}

impl Default for VoronoiNoise {
    fn default() -> Self {
        Self::new(DEFAULT_VORONOI_SEED)
    }
}

impl core::fmt::Debug for VoronoiNoise {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("VoronoiNoise").finish_non_exhaustive()
    }
}

impl VoronoiNoise {
    pub fn new(seed: u64) -> Self {
        let mut rng = SmallRng::seed_from_u64(seed);
        let points = (0..LATTICE * LATTICE)
            .map(|_| (rng.r#gen::<f64>(), rng.r#gen::<f64>()))
            .collect();
        Self { points }
    }

    /// Absolute position of the feature point of cell `(cx, cy)`
    #[allow(clippy::cast_precision_loss)]
    pub fn feature_point(&self, cx: i64, cy: i64) -> (f64, f64) {
        let (jx, jy) = self.jitter(cx, cy);
        (cx as f64 + jx, cy as f64 + jy)
    }

    /// Scan the 3 x 3 neighborhood around `(x, y)`
    #[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
    pub fn sample(&self, x: f64, y: f64) -> VoronoiSample {
        let floor_x = libm::floor(x);
        let floor_y = libm::floor(y);
        let cell_x = floor_x as i64;
        let cell_y = floor_y as i64;
        let local_x = x - floor_x;
        let local_y = y - floor_y;

        let mut nearest = f64::MAX;
        let mut second = f64::MAX;
        let mut owner = (cell_x, cell_y);

        for dy in -1..=1_i64 {
            for dx in -1..=1_i64 {
                let (jx, jy) = self.jitter(cell_x + dx, cell_y + dy);
                let px = dx as f64 + jx;
                let py = dy as f64 + jy;
                let dist = libm::hypot(local_x - px, local_y - py);

                if dist < nearest {
                    second = nearest;
                    nearest = dist;
                    owner = (cell_x + dx, cell_y + dy);
                } else if dist < second {
                    second = dist;
                }
            }
        }

        VoronoiSample {
            distance: nearest,
            edge: second - nearest,
            cell: owner,
        }
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn jitter(&self, cx: i64, cy: i64) -> (f64, f64) {
        let ix = (cx & LATTICE_MASK) as usize;
        let iy = (cy & LATTICE_MASK) as usize;
        self.points[ix * LATTICE + iy]
    }
}
