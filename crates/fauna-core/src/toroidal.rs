//! Toroidal world geometry: shortest-path deltas and wrapping helpers shared
//! by every module that touches a position.

/// Wrap a scalar delta into `(-length/2, length/2]`, the shortest signed path
/// around a ring of the given `length`.
pub fn wrap_delta(d: f64, length: f64) -> f64 {
    let mut d = d.rem_euclid(length);
    if d > length * 0.5 {
        d -= length;
    }
    d
}

/// Wrap a coordinate into `[0, length)`.
pub fn wrap_coord(x: f64, length: f64) -> f64 {
    x.rem_euclid(length)
}

/// Shortest toroidal delta `(dx, dy)` from `a` to `b` on a `width x height` torus.
pub fn delta(a: (f64, f64), b: (f64, f64), width: f64, height: f64) -> (f64, f64) {
    (wrap_delta(b.0 - a.0, width), wrap_delta(b.1 - a.1, height))
}

/// Squared toroidal distance between `a` and `b`.
pub fn dist_sq(a: (f64, f64), b: (f64, f64), width: f64, height: f64) -> f64 {
    let (dx, dy) = delta(a, b, width, height);
    dx * dx + dy * dy
}

/// Wrap an angle into `[0, 2*pi)`.
pub fn wrap_angle(theta: f64) -> f64 {
    theta.rem_euclid(std::f64::consts::TAU)
}

/// Shortest signed angular delta from `a` to `b`, in `(-pi, pi]`.
pub fn angle_delta(a: f64, b: f64) -> f64 {
    wrap_delta(b - a, std::f64::consts::TAU)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrap_delta_is_idempotent() {
        for raw in [-730.0, -365.0, -1.0, 0.0, 1.0, 180.0, 359.9, 10_000.3] {
            let once = wrap_delta(raw, 360.0);
            let twice = wrap_delta(once, 360.0);
            assert!((once - twice).abs() < 1e-9, "raw={raw} once={once} twice={twice}");
        }
    }

    #[test]
    fn delta_is_antisymmetric() {
        let w = 1280.0;
        let h = 720.0;
        let a = (10.0, 700.0);
        let b = (1270.0, 5.0);
        let (dx1, dy1) = delta(a, b, w, h);
        let (dx2, dy2) = delta(b, a, w, h);
        assert!((dx1 + dx2).abs() < 1e-9);
        assert!((dy1 + dy2).abs() < 1e-9);
    }

    #[test]
    fn delta_prefers_short_path_across_seam() {
        let w = 100.0;
        let (dx, _) = delta((1.0, 0.0), (99.0, 0.0), w, w);
        assert!((dx - (-2.0)).abs() < 1e-9, "dx={dx}");
    }

    #[test]
    fn wrap_coord_stays_in_domain() {
        for raw in [-500.0, -0.1, 0.0, 999.9, 1200.0] {
            let w = wrap_coord(raw, 1000.0);
            assert!((0.0..1000.0).contains(&w), "raw={raw} wrapped={w}");
        }
    }
}
