use crate::{
    color::{HsvF, Rgb},
    math8::{blend8, scale8},
};

pub const BLACK: Rgb = Rgb { r: 0, g: 0, b: 0 };
pub const WHITE: Rgb = Rgb {
    r: 255,
    g: 255,
    b: 255,
};

/// Blend two RGB colors
///
/// # Arguments
/// * `a` - First color
/// * `b` - Second color
/// * `amount_of_b` - Blend factor (0 = all a, 255 = all b)
#[inline]
pub fn blend_colors(a: Rgb, b: Rgb, amount_of_b: u8) -> Rgb {
    Rgb {
        r: blend8(a.r, b.r, amount_of_b),
        g: blend8(a.g, b.g, amount_of_b),
        b: blend8(a.b, b.b, amount_of_b),
    }
}

/// Scale every channel of a color by an 8-bit factor.
#[inline]
pub const fn scale_color(color: Rgb, scale: u8) -> Rgb {
    Rgb {
        r: scale8(color.r, scale),
        g: scale8(color.g, scale),
        b: scale8(color.b, scale),
    }
}

/// Create an RGB color from a u32 value (0xRRGGBB format)
pub const fn rgb_from_u32(color: u32) -> Rgb {
    Rgb {
        r: ((color >> 16) & 0xFF) as u8,
        g: ((color >> 8) & 0xFF) as u8,
        b: (color & 0xFF) as u8,
    }
}

/// Pack an RGB color into a u32 value (0xRRGGBB format)
#[allow(clippy::cast_lossless)]
pub const fn rgb_to_u32(color: Rgb) -> u32 {
    ((color.r as u32) << 16) | ((color.g as u32) << 8) | color.b as u32
}

/// Linear interpolation with `t` clamped to `[0, 1]`.
#[inline]
pub fn lerp(a: f64, b: f64, t: f64) -> f64 {
    let t = clamp_unit(t);
    a + (b - a) * t
}

/// Per-channel linear interpolation between two colors.
///
/// `t` is clamped to `[0, 1]`; channels are truncated after blending.
#[inline]
pub fn lerp_color(a: Rgb, b: Rgb, t: f64) -> Rgb {
    let t = clamp_unit(t);
    Rgb {
        r: lerp_channel(a.r, b.r, t),
        g: lerp_channel(a.g, b.g, t),
        b: lerp_channel(a.b, b.b, t),
    }
}

/// Multiply a color by an intensity in `[0, 1]`, truncating.
#[inline]
pub fn dim(color: Rgb, intensity: f64) -> Rgb {
    lerp_color(BLACK, color, intensity)
}

/// Convert a color to floating point HSV.
///
/// Hue lands in `[0, 360)`, saturation and value in `[0, 1]`.
#[allow(clippy::float_cmp)]
pub fn rgb_to_hsv(color: Rgb) -> HsvF {
    let r = f64::from(color.r) / 255.0;
    let g = f64::from(color.g) / 255.0;
    let b = f64::from(color.b) / 255.0;

    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = max - min;

    let mut hue = if delta <= 0.0 {
        0.0
    } else if max == r {
        60.0 * libm::fmod((g - b) / delta, 6.0)
    } else if max == g {
        60.0 * ((b - r) / delta + 2.0)
    } else {
        60.0 * ((r - g) / delta + 4.0)
    };
    if hue < 0.0 {
        hue += 360.0;
    }
    if hue >= 360.0 {
        hue -= 360.0;
    }

    let saturation = if max <= 0.0 { 0.0 } else { delta / max };

    HsvF {
        hue,
        saturation,
        value: max,
    }
}

/// Convert floating point HSV to a color, rounding each channel.
///
/// Hue may be any finite value and is wrapped into `[0, 360)`.
/// Saturation and value are clamped to `[0, 1]`.
pub fn hsv_to_rgb(hue: f64, saturation: f64, value: f64) -> Rgb {
    let hue = if hue.is_finite() {
        hue.rem_euclid(360.0)
    } else {
        0.0
    };
    let saturation = clamp_unit(saturation);
    let value = clamp_unit(value);

    let chroma = value * saturation;
    let sector = hue / 60.0;
    let x = chroma * (1.0 - libm::fabs(libm::fmod(sector, 2.0) - 1.0));
    let m = value - chroma;

    let (r, g, b) = match sector {
        s if s < 1.0 => (chroma, x, 0.0),
        s if s < 2.0 => (x, chroma, 0.0),
        s if s < 3.0 => (0.0, chroma, x),
        s if s < 4.0 => (0.0, x, chroma),
        s if s < 5.0 => (x, 0.0, chroma),
        _ => (chroma, 0.0, x),
    };

    Rgb {
        r: round_channel(r + m),
        g: round_channel(g + m),
        b: round_channel(b + m),
    }
}

#[inline]
fn clamp_unit(t: f64) -> f64 {
    if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) }
}

#[inline]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn lerp_channel(a: u8, b: u8, t: f64) -> u8 {
    let value = f64::from(a) + (f64::from(b) - f64::from(a)) * t;
    value.clamp(0.0, 255.0) as u8
}

#[inline]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn round_channel(unit: f64) -> u8 {
    libm::round(unit.clamp(0.0, 1.0) * 255.0) as u8
}
