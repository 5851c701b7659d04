//! `ShadowMap`: the light-intensity grid fed by a day/night ambient cycle and
//! by occluding/glowing organisms.

use crate::config::SimConfig;
use crate::grid::{bilinear_sample, bilinear_splat};
use std::f64::consts::TAU;

pub struct ShadowMap {
    width: usize,
    height: usize,
    world_width: f64,
    world_height: f64,
    intensity: Vec<f32>,
    day_length_ticks: u32,
    ambient_min: f32,
    ambient_max: f32,
}

impl ShadowMap {
    pub fn new(config: &SimConfig) -> Self {
        let width = config.shadow_grid_width;
        let height = config.shadow_grid_height;
        Self {
            width,
            height,
            world_width: config.world_width,
            world_height: config.world_height,
            intensity: vec![config.ambient_light_max; width * height],
            day_length_ticks: config.day_length_ticks.max(1),
            ambient_min: config.ambient_light_min,
            ambient_max: config.ambient_light_max,
        }
    }

    /// Ambient light for the current step index, before occlusion/glow.
    pub fn ambient_light(&self, step_index: usize) -> f32 {
        let phase = (step_index % self.day_length_ticks as usize) as f64
            / self.day_length_ticks as f64;
        let cycle = ((phase * TAU).sin() * 0.5 + 0.5) as f32;
        self.ambient_min + (self.ambient_max - self.ambient_min) * cycle
    }

    /// Rebuild the grid from scratch: ambient base, minus occlusion from
    /// armored organisms, plus emission from glowing ones.
    pub fn rebuild(
        &mut self,
        step_index: usize,
        occluders: impl Iterator<Item = (f64, f64, f32)>,
        emitters: impl Iterator<Item = (f64, f64, f32)>,
    ) {
        let ambient = self.ambient_light(step_index);
        self.intensity.fill(ambient);

        for (x, y, strength) in occluders {
            let (cx, cy) = self.world_to_cell(x, y);
            let intensity = &mut self.intensity;
            bilinear_splat(self.width, self.height, cx, cy, strength, |i, w| {
                intensity[i] = (intensity[i] - w).max(0.0);
                w
            });
        }
        for (x, y, strength) in emitters {
            let (cx, cy) = self.world_to_cell(x, y);
            let intensity = &mut self.intensity;
            bilinear_splat(self.width, self.height, cx, cy, strength, |i, w| {
                intensity[i] = (intensity[i] + w).min(1.0);
                w
            });
        }
    }

    fn world_to_cell(&self, x: f64, y: f64) -> (f64, f64) {
        (
            (x / self.world_width) * self.width as f64,
            (y / self.world_height) * self.height as f64,
        )
    }

    pub fn sample(&self, x: f64, y: f64) -> f32 {
        let (cx, cy) = self.world_to_cell(x, y);
        bilinear_sample(&self.intensity, self.width, self.height, cx, cy)
    }

    /// Directional light vector sampled on a small ring around `(x, y)`: the
    /// sum of neighboring-minus-opposite sample deltas, used by
    /// `PolarVision`'s light-gradient sampler.
    pub fn gradient(&self, x: f64, y: f64, ring_radius: f64) -> (f32, f32) {
        const PROBES: usize = 8;
        let mut gx = 0.0f32;
        let mut gy = 0.0f32;
        for i in 0..PROBES {
            let theta = (i as f64 / PROBES as f64) * TAU;
            let sx = x + theta.cos() * ring_radius;
            let sy = y + theta.sin() * ring_radius;
            let sample = self.sample(sx, sy);
            gx += sample * theta.cos() as f32;
            gy += sample * theta.sin() as f32;
        }
        (gx / PROBES as f32, gy / PROBES as f32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ambient_light_cycles_between_min_and_max() {
        let cfg = SimConfig {
            day_length_ticks: 100,
            ambient_light_min: 0.1,
            ambient_light_max: 1.0,
            ..SimConfig::default()
        };
        let map = ShadowMap::new(&cfg);
        let values: Vec<f32> = (0..100).map(|t| map.ambient_light(t)).collect();
        assert!(values.iter().all(|&v| (0.1..=1.0).contains(&v)));
        let min = values.iter().cloned().fold(f32::MAX, f32::min);
        let max = values.iter().cloned().fold(f32::MIN, f32::max);
        assert!(max - min > 0.5);
    }

    #[test]
    fn occluders_reduce_local_intensity() {
        let cfg = SimConfig::default();
        let mut map = ShadowMap::new(&cfg);
        map.rebuild(0, std::iter::once((640.0, 360.0, 0.8)), std::iter::empty());
        let occluded = map.sample(640.0, 360.0);
        let elsewhere = map.sample(0.0, 0.0);
        assert!(occluded < elsewhere);
    }

    #[test]
    fn emitters_increase_local_intensity() {
        let cfg = SimConfig {
            ambient_light_min: 0.0,
            ambient_light_max: 0.0,
            ..SimConfig::default()
        };
        let mut map = ShadowMap::new(&cfg);
        map.rebuild(0, std::iter::empty(), std::iter::once((640.0, 360.0, 0.5)));
        assert!(map.sample(640.0, 360.0) > 0.0);
    }
}
