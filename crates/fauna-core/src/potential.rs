//! `PotentialField`: a slow-evolving scalar grid that biases where
//! `ResourceField` importance-samples new particle spawns. Rebuilt periodically from a contrast-shaped tileable FBM at a
//! drifting offset.

use crate::config::SimConfig;
use crate::noise_field::{apply_contrast, unit_interval, TileableFbm};

pub struct PotentialField {
    width: usize,
    height: usize,
    data: Vec<f32>,
    noise: TileableFbm,
    contrast: f64,
    drift_x: f64,
    drift_y: f64,
    update_sec: f64,
    time_since_update: f64,
    drift_time: f64,
}

impl PotentialField {
    pub fn new(width: usize, height: usize, config: &SimConfig, seed: u64) -> Self {
        let noise = TileableFbm::new(
            (seed ^ 0x9E37_79B1) as u32,
            config.potential_octaves,
            config.potential_lacunarity,
            config.potential_gain,
        );
        let mut field = Self {
            width,
            height,
            data: vec![0.0; width * height],
            noise,
            contrast: config.potential_contrast,
            drift_x: config.potential_drift_x,
            drift_y: config.potential_drift_y,
            update_sec: config.potential_update_sec.max(1e-6),
            time_since_update: 0.0,
            drift_time: 0.0,
        };
        field.rebuild();
        field
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn data(&self) -> &[f32] {
        &self.data
    }

    /// Advance time and rebuild on the configured cadence.
    pub fn step(&mut self, dt: f64) {
        self.drift_time += dt;
        self.time_since_update += dt;
        if self.time_since_update >= self.update_sec {
            self.time_since_update = 0.0;
            self.rebuild();
        }
    }

    fn rebuild(&mut self) {
        let offset_u = self.drift_time * self.drift_x;
        let offset_v = self.drift_time * self.drift_y;
        for row in 0..self.height {
            let v = row as f64 / self.height as f64 + offset_v;
            for col in 0..self.width {
                let u = col as f64 / self.width as f64 + offset_u;
                let raw = self.noise.sample(u, v, 0.0);
                let shaped = unit_interval(apply_contrast(raw, self.contrast));
                self.data[row * self.width + col] = shaped as f32;
            }
        }
    }

    /// Bilinear sample in `[0,1]`, wrapping toroidally, used as a spawn-density
    /// probability by `ResourceField::spawn`.
    pub fn sample(&self, x_norm: f64, y_norm: f64) -> f32 {
        crate::grid::bilinear_sample(
            &self.data,
            self.width,
            self.height,
            x_norm * self.width as f64,
            y_norm * self.height as f64,
        )
    }
}
