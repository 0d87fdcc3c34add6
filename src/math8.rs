//! 8-bit fixed-point helpers for color math.

/// Scale an 8-bit value by a factor (0-255 = 0.0-1.0)
#[inline]
#[allow(clippy::cast_lossless, clippy::cast_possible_truncation)]
pub const fn scale8(value: u8, scale: u8) -> u8 {
    ((value as u16 * (1 + scale as u16)) >> 8) as u8
}

/// Blend two 8-bit values
#[inline]
#[allow(clippy::cast_sign_loss, clippy::cast_possible_truncation)]
pub const fn blend8(a: u8, b: u8, amount_of_b: u8) -> u8 {
    let delta = b as i16 - a as i16;

    let mut partial: u32 = (a as u32) << 16;
    partial = partial.wrapping_add(
        (delta as u32)
            .wrapping_mul(amount_of_b as u32)
            .wrapping_mul(257),
    );
    partial = partial.wrapping_add(0x8000);

    (partial >> 16) as u8
}

/// Convert a `0.0..=1.0` fraction into an 8-bit scale factor, rounding.
///
/// Values outside the unit range are clamped; NaN maps to zero.
#[inline]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn unit8(fraction: f64) -> u8 {
    if fraction.is_nan() {
        return 0;
    }
    libm::round(fraction.clamp(0.0, 1.0) * 255.0) as u8
}

/// Convert a `0..=100` percentage into an 8-bit scale factor.
#[inline]
pub fn percent8(percent: f64) -> u8 {
    unit8(percent / 100.0)
}
