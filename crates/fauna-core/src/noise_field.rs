//! Shared tileable FBM sampler used by `potential` (spawn-density field) and
//! `flow` (curl-noise velocity field). Both fields live on the same toroidal
//! domain, so both need noise that repeats seamlessly across the domain
//! seam; plain Perlin noise sampled at linear world coordinates does not.
//!
//! The trick: map the wrapping coordinate `u in [0,1)` onto a unit circle
//! (`cos(2*pi*u), sin(2*pi*u)`) before sampling. A 4D noise function sampled
//! on circle coordinates for both `u` and `v` is exactly periodic in both —
//! moving `u` or `v` by a full cycle returns to the same point in the 4D
//! embedding.

use noise::{Fbm, NoiseFn, Perlin};
use std::f64::consts::TAU;

pub struct TileableFbm {
    fbm: Fbm<Perlin>,
}

impl TileableFbm {
    pub fn new(seed: u32, octaves: u32, lacunarity: f64, gain: f64) -> Self {
        let mut fbm = Fbm::<Perlin>::new(seed);
        fbm.octaves = octaves.max(1) as usize;
        fbm.lacunarity = lacunarity;
        fbm.persistence = gain;
        Self { fbm }
    }

    /// Sample at normalized toroidal coordinates `(u, v) in [0,1)^2`, with an
    /// extra scalar `w` (time, or a static drift phase) folded into the
    /// embedding. Returns a value in roughly `[-1, 1]`.
    pub fn sample(&self, u: f64, v: f64, w: f64) -> f64 {
        let (su, cu) = (u * TAU).sin_cos();
        let (sv, cv) = (v * TAU).sin_cos();
        self.fbm.get([cu, su, cv + w, sv])
    }
}

/// Reshape a roughly `[-1, 1]` noise value with a contrast curve: values near
/// zero are pushed toward zero, extremes are preserved. `contrast == 1.0` is
/// the identity.
pub fn apply_contrast(v: f64, contrast: f64) -> f64 {
    v.signum() * v.abs().powf(contrast.max(0.01))
}

/// Map a `[-1, 1]` noise value into `[0, 1]`.
pub fn unit_interval(v: f64) -> f64 {
    (v * 0.5 + 0.5).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_is_periodic_in_u_and_v() {
        let f = TileableFbm::new(7, 4, 2.0, 0.5);
        let a = f.sample(0.0, 0.3, 1.0);
        let b = f.sample(1.0, 0.3, 1.0);
        let c = f.sample(0.3, 0.0, 1.0);
        let d = f.sample(0.3, 1.0, 1.0);
        assert!((a - b).abs() < 1e-9);
        assert!((c - d).abs() < 1e-9);
    }

    #[test]
    fn contrast_preserves_sign_and_zero() {
        assert_eq!(apply_contrast(0.0, 2.0), 0.0);
        assert!(apply_contrast(0.5, 2.0) > 0.0);
        assert!(apply_contrast(-0.5, 2.0) < 0.0);
    }
}
