mod tests {
    use myrtio_keylight::math8::{blend8, percent8, scale8, unit8};

    #[test]
    fn test_scale8() {
        assert_eq!(scale8(255, 128), 128);
        assert_eq!(scale8(0, 128), 0);
        assert_eq!(scale8(128, 128), 64);
        assert_eq!(scale8(128, 255), 128);
        assert_eq!(scale8(128, 0), 0);
    }

    #[test]
    fn test_blend8() {
        assert_eq!(blend8(255, 128, 128), 191);
        assert_eq!(blend8(0, 128, 255), 128);
        assert_eq!(blend8(255, 0, 128), 127);
        assert_eq!(blend8(255, 128, 0), 255);
    }

    #[test]
    fn test_unit8() {
        assert_eq!(unit8(0.0), 0);
        assert_eq!(unit8(0.5), 128);
        assert_eq!(unit8(1.0), 255);
        assert_eq!(unit8(-3.0), 0);
        assert_eq!(unit8(7.0), 255);
        assert_eq!(unit8(f64::NAN), 0);
    }

    #[test]
    fn test_percent8() {
        assert_eq!(percent8(0.0), 0);
        assert_eq!(percent8(50.0), 128);
        assert_eq!(percent8(100.0), 255);
        assert_eq!(percent8(150.0), 255);
    }
}
