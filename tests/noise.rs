mod tests {
    use myrtio_keylight::noise::{PerlinNoise, VoronoiNoise, fade, remap, smoothstep};

    #[test]
    fn test_perlin_is_zero_on_lattice_points() {
        let noise = PerlinNoise::new(11);
        for (x, y, z) in [(0.0, 0.0, 0.0), (1.0, 2.0, 3.0), (-4.0, 7.0, 250.0)] {
            assert_eq!(noise.noise(x, y, z), 0.0);
        }
    }

    #[test]
    fn test_perlin_stays_in_range() {
        let noise = PerlinNoise::new(5);
        for i in 0..40 {
            for j in 0..40 {
                let (x, y, z) = (f64::from(i) * 0.37 - 7.0, f64::from(j) * 0.23, 0.61);
                let value = noise.noise(x, y, z);
                assert!((-1.1..=1.1).contains(&value), "{value}");
                assert!((0.0..=1.0).contains(&noise.noise01(x, y, z)));
            }
        }
    }

    #[test]
    fn test_perlin_is_continuous() {
        let noise = PerlinNoise::new(5);
        for i in 0..200 {
            let x = f64::from(i) * 0.05 - 5.0;
            let delta = (noise.noise(x, 0.3, 0.7) - noise.noise(x + 1e-4, 0.3, 0.7)).abs();
            assert!(delta < 1e-2);
        }
    }

    #[test]
    fn test_perlin_seed_decides_field() {
        let a = PerlinNoise::new(1);
        let b = PerlinNoise::new(1);
        let c = PerlinNoise::new(2);
        let points: Vec<(f64, f64, f64)> = (0..32)
            .map(|i| (f64::from(i) * 0.41, f64::from(i) * 0.17, 0.5))
            .collect();

        assert!(
            points
                .iter()
                .all(|&(x, y, z)| a.noise(x, y, z) == b.noise(x, y, z))
        );
        assert!(
            points
                .iter()
                .any(|&(x, y, z)| a.noise(x, y, z) != c.noise(x, y, z))
        );
    }

    #[test]
    fn test_voronoi_feature_point_has_zero_distance() {
        let noise = VoronoiNoise::new(42);
        let (x, y) = noise.feature_point(3, 4);
        let sample = noise.sample(x, y);
        assert!(sample.distance < 1e-9);
        assert_eq!(sample.cell, (3, 4));
        assert!(sample.edge > 0.0);
    }

    #[test]
    fn test_voronoi_edge_is_non_negative() {
        let noise = VoronoiNoise::new(9);
        for i in 0..30 {
            for j in 0..30 {
                let sample = noise.sample(f64::from(i) * 0.31 - 4.0, f64::from(j) * 0.29);
                assert!(sample.edge >= 0.0);
                assert!(sample.distance >= 0.0);
            }
        }
    }

    fn distance(a: (f64, f64), b: (f64, f64)) -> f64 {
        (a.0 - b.0).hypot(a.1 - b.1)
    }

    /// Two neighboring feature points whose midpoint has no third point
    /// nearby, so the midpoint lies on their shared border.
    fn bordering_pair(noise: &VoronoiNoise) -> Option<((i64, i64), (i64, i64))> {
        for cx in 0..64_i64 {
            for cy in 0..4_i64 {
                for (dx, dy) in [(1, 0), (0, 1), (1, 1), (1, -1)] {
                    let (a, b) = ((cx, cy), (cx + dx, cy + dy));
                    let p = noise.feature_point(a.0, a.1);
                    let q = noise.feature_point(b.0, b.1);
                    let mid = ((p.0 + q.0) / 2.0, (p.1 + q.1) / 2.0);
                    let half = distance(mid, p);
                    if half >= 0.5 {
                        continue;
                    }
                    let clear = (cx - 3..=cx + 4).all(|ox| {
                        (cy - 3..=cy + 4).all(|oy| {
                            (ox, oy) == a
                                || (ox, oy) == b
                                || distance(mid, noise.feature_point(ox, oy)) > half + 0.05
                        })
                    });
                    if clear {
                        return Some((a, b));
                    }
                }
            }
        }
        None
    }

    #[test]
    fn test_voronoi_edge_vanishes_on_border_and_grows_inward() {
        let noise = VoronoiNoise::new(42);
        let (a, b) = bordering_pair(&noise).unwrap();
        let p = noise.feature_point(a.0, a.1);
        let q = noise.feature_point(b.0, b.1);
        assert_eq!(noise.sample(p.0, p.1).cell, a);
        assert_eq!(noise.sample(q.0, q.1).cell, b);

        let mid = ((p.0 + q.0) / 2.0, (p.1 + q.1) / 2.0);
        let border = noise.sample(mid.0, mid.1);
        assert!(border.edge < 1e-9, "{border:?}");
        assert!((border.distance - distance(mid, p)).abs() < 1e-9);

        // Walking from the border to the feature point
        let edges: Vec<f64> = (0..=10)
            .map(|step| {
                let t = f64::from(step) / 10.0;
                let x = mid.0 + (p.0 - mid.0) * t;
                let y = mid.1 + (p.1 - mid.1) * t;
                noise.sample(x, y).edge
            })
            .collect();
        assert!(edges.windows(2).all(|pair| pair[1] > pair[0]), "{edges:?}");
    }

    #[test]
    fn test_voronoi_tiles_every_256_cells() {
        let noise = VoronoiNoise::new(9);
        let (x, y) = noise.feature_point(1, 2);
        let (wx, wy) = noise.feature_point(257, 2);
        assert!((wx - x - 256.0).abs() < 1e-9);
        assert!((wy - y).abs() < 1e-9);
    }

    #[test]
    fn test_curves() {
        assert_eq!(fade(0.0), 0.0);
        assert_eq!(fade(1.0), 1.0);
        assert_eq!(fade(0.5), 0.5);
        assert_eq!(smoothstep(-1.0), 0.0);
        assert_eq!(smoothstep(2.0), 1.0);
        assert_eq!(smoothstep(0.5), 0.5);
    }

    #[test]
    fn test_remap() {
        assert_eq!(remap(5.0, 0.0, 10.0, 0.0, 100.0), 50.0);
        assert_eq!(remap(20.0, 0.0, 10.0, 0.0, 100.0), 100.0);
        assert_eq!(remap(3.0, 1.0, 1.0, 7.0, 9.0), 7.0);
    }
}
