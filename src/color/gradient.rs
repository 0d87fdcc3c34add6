use crate::color::{BLACK, Rgb, lerp_color};

/// Sample a multi-stop gradient at `t`.
///
/// `stops` are `(position, color)` pairs sorted by position. Positions
/// before the first stop take the first color, positions after the last
/// stop take the last one.
pub fn sample_stops(stops: &[(f64, Rgb)], t: f64) -> Rgb {
    let Some(&(first_pos, first)) = stops.first() else {
        return BLACK;
    };
    if t.is_nan() || t <= first_pos {
        return first;
    }

    for pair in stops.windows(2) {
        let (p0, c0) = pair[0];
        let (p1, c1) = pair[1];
        if t <= p1 {
            let span = p1 - p0;
            if span <= f64::EPSILON {
                return c1;
            }
            return lerp_color(c0, c1, (t - p0) / span);
        }
    }

    stops.last().map_or(first, |&(_, last)| last)
}

/// Three evenly spaced stops at 0, 0.5 and 1.
pub fn three_stop(low: Rgb, mid: Rgb, high: Rgb, t: f64) -> Rgb {
    sample_stops(&[(0.0, low), (0.5, mid), (1.0, high)], t)
}

/// Color of column `col` in a left-to-right gradient spanning `cols` columns.
#[allow(clippy::cast_precision_loss)]
pub fn column_gradient(low: Rgb, high: Rgb, col: usize, cols: usize) -> Rgb {
    if cols <= 1 {
        return low;
    }
    lerp_color(low, high, col as f64 / (cols - 1) as f64)
}
