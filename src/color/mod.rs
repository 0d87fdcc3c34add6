mod gradient;
mod utils;

pub use gradient::{column_gradient, sample_stops, three_stop};
use smart_leds::RGB8;
pub use utils::{
    BLACK, WHITE, blend_colors, dim, hsv_to_rgb, lerp, lerp_color, rgb_from_u32, rgb_to_hsv,
    rgb_to_u32, scale_color,
};

pub type Rgb = RGB8;

/// Floating point HSV triple.
///
/// Hue is in degrees `[0, 360)`, saturation and value in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HsvF {
    pub hue: f64,
    pub saturation: f64,
    pub value: f64,
}

impl HsvF {
    pub fn to_rgb(self) -> Rgb {
        hsv_to_rgb(self.hue, self.saturation, self.value)
    }
}
