mod tests {
    use myrtio_keylight::color::{
        BLACK, Rgb, WHITE, blend_colors, column_gradient, dim, hsv_to_rgb, lerp, lerp_color,
        rgb_from_u32, rgb_to_hsv, rgb_to_u32, sample_stops, scale_color, three_stop,
    };

    const RED: Rgb = Rgb { r: 255, g: 0, b: 0 };
    const GREEN: Rgb = Rgb { r: 0, g: 255, b: 0 };
    const BLUE: Rgb = Rgb { r: 0, g: 0, b: 255 };

    #[test]
    fn test_blend_colors() {
        assert_eq!(blend_colors(RED, BLUE, 0), RED);
        assert_eq!(blend_colors(RED, BLUE, 255), BLUE);
        assert_eq!(
            blend_colors(RED, BLUE, 128),
            Rgb {
                r: 127,
                g: 0,
                b: 128
            }
        );
        assert_eq!(blend_colors(WHITE, BLACK, 255), BLACK);
        assert_eq!(blend_colors(WHITE, BLACK, 0), WHITE);
    }

    #[test]
    fn test_scale_color() {
        assert_eq!(
            scale_color(Rgb { r: 0, g: 255, b: 255 }, 128),
            Rgb {
                r: 0,
                g: 128,
                b: 128
            }
        );
        assert_eq!(scale_color(WHITE, 0), BLACK);
        assert_eq!(scale_color(WHITE, 255), WHITE);
    }

    #[test]
    fn test_packing() {
        assert_eq!(rgb_from_u32(0x28FF00), Rgb { r: 0x28, g: 0xFF, b: 0 });
        assert_eq!(rgb_to_u32(Rgb { r: 1, g: 2, b: 3 }), 0x010203);
    }

    #[test]
    fn test_lerp_clamps_t() {
        assert_eq!(lerp(0.0, 10.0, 0.5), 5.0);
        assert_eq!(lerp(0.0, 10.0, -1.0), 0.0);
        assert_eq!(lerp(0.0, 10.0, 2.0), 10.0);
        assert_eq!(lerp_color(BLACK, WHITE, 2.0), WHITE);
        assert_eq!(lerp_color(BLACK, WHITE, f64::NAN), BLACK);
        assert_eq!(lerp_color(BLACK, WHITE, 0.5), Rgb { r: 127, g: 127, b: 127 });
    }

    #[test]
    fn test_dim_truncates() {
        assert_eq!(dim(WHITE, 0.12), Rgb { r: 30, g: 30, b: 30 });
        assert_eq!(dim(RED, 0.0), BLACK);
        assert_eq!(dim(RED, 1.0), RED);
    }

    #[test]
    fn test_hsv_primaries() {
        assert_eq!(hsv_to_rgb(0.0, 1.0, 1.0), RED);
        assert_eq!(hsv_to_rgb(120.0, 1.0, 1.0), GREEN);
        assert_eq!(hsv_to_rgb(240.0, 1.0, 1.0), BLUE);
        assert_eq!(hsv_to_rgb(360.0, 1.0, 1.0), RED);
        assert_eq!(hsv_to_rgb(-120.0, 1.0, 1.0), BLUE);
        assert_eq!(hsv_to_rgb(42.0, 0.0, 1.0), WHITE);
        assert_eq!(hsv_to_rgb(42.0, 1.0, 0.0), BLACK);
    }

    #[test]
    fn test_hsv_round_trip() {
        for r in 0..=255_u8 {
            for g in 0..=255_u8 {
                for b in 0..=255_u8 {
                    let color = Rgb { r, g, b };
                    let hsv = rgb_to_hsv(color);
                    assert!((0.0..360.0).contains(&hsv.hue), "{color:?}");
                    let back = hsv.to_rgb();
                    let close = back.r.abs_diff(r) <= 1
                        && back.g.abs_diff(g) <= 1
                        && back.b.abs_diff(b) <= 1;
                    assert!(close, "{color:?} -> {back:?}");
                }
            }
        }
    }

    #[test]
    fn test_sample_stops() {
        let stops = [(0.0, BLACK), (0.5, RED), (1.0, WHITE)];
        assert_eq!(sample_stops(&stops, -1.0), BLACK);
        assert_eq!(sample_stops(&stops, 0.5), RED);
        assert_eq!(sample_stops(&stops, 2.0), WHITE);
        assert_eq!(sample_stops(&stops, 0.25), Rgb { r: 127, g: 0, b: 0 });
        assert_eq!(sample_stops(&[], 0.5), BLACK);
        assert_eq!(three_stop(BLACK, RED, WHITE, 0.75), Rgb { r: 255, g: 127, b: 127 });
    }

    #[test]
    fn test_column_gradient() {
        assert_eq!(column_gradient(RED, BLUE, 0, 17), RED);
        assert_eq!(column_gradient(RED, BLUE, 16, 17), BLUE);
        assert_eq!(column_gradient(RED, BLUE, 3, 1), RED);
    }
}
