mod tests {
    use myrtio_keylight::{
        GridSize, Instant, KeyMap, KeyPosition, KeyboardState, PeakTracker, PressureField,
    };

    const KEY_G: u16 = 10;
    const KEY_ESC: u16 = 41;
    const G: KeyPosition = KeyPosition::new(3, 5);
    const ESC: KeyPosition = KeyPosition::new(0, 0);

    fn state(keys: &[(u16, f32)]) -> KeyboardState {
        KeyboardState::from_pressures(Instant::from_millis(0), keys.iter().copied())
    }

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_keyboard_state_clamps_pressure() {
        let state = state(&[(KEY_G, 1.7), (KEY_ESC, -0.2), (4, f32::NAN)]);
        assert_eq!(state.pressure(KEY_G), 1.0);
        assert!(!state.is_pressed(KEY_ESC));
        assert!(!state.is_pressed(4));
        assert_eq!(state.len(), 1);
    }

    #[test]
    fn test_positions_skip_unmapped_and_out_of_grid() {
        let keymap = KeyMap::standard();
        let state = state(&[(KEY_G, 0.5), (KEY_ESC, 0.5), (0x7777, 0.5)]);

        let all: Vec<_> = state.positions(&keymap, GridSize::new(6, 17)).collect();
        assert_eq!(all, [(G, 0.5), (ESC, 0.5)]);

        let small: Vec<_> = state.positions(&keymap, GridSize::new(2, 2)).collect();
        assert_eq!(small, [(ESC, 0.5)]);
    }

    #[test]
    fn test_field_removes_non_positive_values() {
        let mut field = PressureField::new();
        field.set(G, 0.5);
        field.raise(G, 0.3);
        assert!(approx(field.get(G), 0.5));
        field.raise(G, 0.9);
        assert!(approx(field.get(G), 0.9));
        field.set(G, 0.0);
        assert!(field.is_empty());
    }

    #[test]
    fn test_fade_released_spares_held_keys() {
        let keymap = KeyMap::standard();
        let mut field = PressureField::new();
        field.set(G, 0.5);
        field.set(ESC, 0.5);

        field.fade_released(&state(&[(KEY_G, 0.5)]), &keymap, 0.2);
        assert!(approx(field.get(G), 0.5));
        assert!(approx(field.get(ESC), 0.3));

        field.fade_released(&state(&[(KEY_G, 0.5)]), &keymap, 0.5);
        assert_eq!(field.len(), 1);
        assert!(approx(field.get(ESC), 0.0));
    }

    #[test]
    fn test_track_pressed_applies_gain_and_limit() {
        let keymap = KeyMap::standard();
        let mut field = PressureField::new();
        field.track_pressed(
            &state(&[(KEY_G, 0.75), (KEY_ESC, 0.25)]),
            &keymap,
            GridSize::new(6, 17),
            2.0,
            1.0,
        );
        assert!(approx(field.get(G), 1.0));
        assert!(approx(field.get(ESC), 0.5));
    }

    #[test]
    fn test_forget_released_and_retain_within() {
        let keymap = KeyMap::standard();
        let mut field = PressureField::new();
        field.set(G, 0.5);
        field.set(ESC, 0.5);

        field.forget_released(&state(&[(KEY_ESC, 0.1)]), &keymap);
        assert_eq!(field.iter().collect::<Vec<_>>(), [(ESC, 0.5)]);

        field.set(G, 0.5);
        field.retain_within(GridSize::new(2, 2));
        assert_eq!(field.iter().collect::<Vec<_>>(), [(ESC, 0.5)]);

        field.fade_all(1.0);
        assert!(field.is_empty());
    }

    #[test]
    fn test_peak_survives_dips_and_fires_on_release() {
        let mut tracker = PeakTracker::new();
        let mut released = Vec::new();

        tracker.update(&state(&[(KEY_G, 0.3)]), |code, peak| released.push((code, peak)));
        tracker.update(&state(&[(KEY_G, 0.9)]), |code, peak| released.push((code, peak)));
        tracker.update(&state(&[(KEY_G, 0.2)]), |code, peak| released.push((code, peak)));
        assert!(released.is_empty());
        assert_eq!(tracker.peak(KEY_G), Some(0.9));

        tracker.update(&state(&[]), |code, peak| released.push((code, peak)));
        assert_eq!(released, [(KEY_G, 0.9)]);
        assert!(tracker.is_empty());
    }

    #[test]
    fn test_peak_ignores_feather_touches() {
        let mut tracker = PeakTracker::new();
        let mut released = Vec::new();
        tracker.update(&state(&[(KEY_G, 0.005)]), |code, peak| released.push((code, peak)));
        assert!(tracker.is_empty());
        tracker.update(&state(&[]), |code, peak| released.push((code, peak)));
        assert!(released.is_empty());
    }
}
