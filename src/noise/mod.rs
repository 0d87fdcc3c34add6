//! Procedural noise fields.

mod perlin;
mod voronoi;

pub use perlin::{DEFAULT_PERLIN_SEED, PerlinNoise};
pub use voronoi::{DEFAULT_VORONOI_SEED, VoronoiNoise, VoronoiSample};

/// Quintic fade curve `6t^5 - 15t^4 + 10t^3`
#[inline]
pub fn fade(t: f64) -> f64 {
    t * t * t * (t * (t * 6.0 - 15.0) + 10.0)
}

/// Cubic Hermite step on `[0, 1]`
#[inline]
pub fn smoothstep(t: f64) -> f64 {
    let t = t.clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

/// Remap `value` from `[from_min, from_max]` to `[to_min, to_max]`, clamping.
pub fn remap(value: f64, from_min: f64, from_max: f64, to_min: f64, to_max: f64) -> f64 {
    let span = from_max - from_min;
    if span.abs() < f64::EPSILON {
        return to_min;
    }
    crate::color::lerp(to_min, to_max, (value - from_min) / span)
}

/// Split a coordinate into its wrapped lattice index and the fractional part.
///
/// Uses a true floor so negative coordinates land in the correct cell.
#[inline]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub(crate) fn floor_cell(x: f64) -> (usize, f64) {
    let floor = libm::floor(x);
    let index = (floor as i64 & 255) as usize;
    (index, x - floor)
}
