//! `FlowField`: the curl-noise velocity field shared by `ResourceField`
//! particles and `Flora`. Double-buffered with smooth temporal interpolation.
//!
//! Generation of the *next* buffer happens on a single background worker
//! thread guarded by two atomics and a mutex: the tick thread never blocks
//! on it, and falls back to synchronous generation if the worker hasn't
//! finished by swap time.

use crate::config::SimConfig;
use crate::grid::bilinear_sample;
use crate::noise_field::TileableFbm;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;

#[derive(Clone)]
struct FlowBuffer {
    u: Vec<f32>,
    v: Vec<f32>,
}

struct GeneratorShared {
    generating: AtomicBool,
    ready: AtomicBool,
    result: Mutex<Option<FlowBuffer>>,
}

pub struct FlowField {
    width: usize,
    height: usize,
    u0: Vec<f32>,
    v0: Vec<f32>,
    u1: Vec<f32>,
    v1: Vec<f32>,
    t: f32,
    update_sec: f64,
    strength: f64,
    evolution: f64,
    noise: Arc<TileableFbm>,
    elapsed: f64,
    shared: Arc<GeneratorShared>,
}

impl FlowField {
    pub fn new(width: usize, height: usize, config: &SimConfig, seed: u64) -> Self {
        let noise = Arc::new(TileableFbm::new(
            (seed ^ 0xC2B2_AE35) as u32,
            config.flow_octaves,
            2.0,
            0.5,
        ));
        let shared = Arc::new(GeneratorShared {
            generating: AtomicBool::new(false),
            ready: AtomicBool::new(false),
            result: Mutex::new(None),
        });
        let (u0, v0) = Self::generate_buffer(&noise, width, height, config.flow_strength, 0.0);
        let (u1, v1) = Self::generate_buffer(&noise, width, height, config.flow_strength, 0.0);
        Self {
            width,
            height,
            u0,
            v0,
            u1,
            v1,
            t: 0.0,
            update_sec: config.flow_update_sec.max(1e-6),
            strength: config.flow_strength,
            evolution: config.flow_evolution,
            noise,
            elapsed: 0.0,
            shared,
        }
    }

    fn generate_buffer(
        noise: &TileableFbm,
        width: usize,
        height: usize,
        strength: f64,
        time: f64,
    ) -> (Vec<f32>, Vec<f32>) {
        let eps = 1.0 / width.max(height).max(1) as f64;
        let mut u = vec![0.0f32; width * height];
        let mut v = vec![0.0f32; width * height];
        for row in 0..height {
            let vv = row as f64 / height as f64;
            for col in 0..width {
                let uu = col as f64 / width as f64;
                let psi = noise.sample(uu, vv, time);
                let psi_v = noise.sample(uu, vv + eps, time);
                let psi_u = noise.sample(uu + eps, vv, time);
                let du = (psi_v - psi) / eps;
                let dv = (psi_u - psi) / eps;
                u[row * width + col] = (du * strength) as f32;
                v[row * width + col] = (-dv * strength) as f32;
            }
        }
        (u, v)
    }

    /// Kick off background generation of the next field, unless one is
    /// already in flight.
    fn spawn_generation(&self) {
        if self
            .shared
            .generating
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return;
        }
        let noise = Arc::clone(&self.noise);
        let shared = Arc::clone(&self.shared);
        let (width, height, strength) = (self.width, self.height, self.strength);
        let time = self.elapsed * self.evolution;
        thread::spawn(move || {
            let (u, v) = Self::generate_buffer(&noise, width, height, strength, time);
            *shared.result.lock().expect("flow generator mutex poisoned") =
                Some(FlowBuffer { u, v });
            shared.ready.store(true, Ordering::Release);
            shared.generating.store(false, Ordering::Release);
        });
    }

    /// Advance the interpolation clock; swap buffers and kick off the next
    /// generation when the blend completes.
    pub fn step(&mut self, dt: f64) {
        self.elapsed += dt;
        self.t += (dt / self.update_sec) as f32;
        if self.t < 1.0 {
            if self.t > 0.5 && !self.shared.generating.load(Ordering::Acquire) {
                self.spawn_generation();
            }
            return;
        }
        self.t = 0.0;
        self.u0 = std::mem::take(&mut self.u1);
        self.v0 = std::mem::take(&mut self.v1);

        if self.shared.ready.swap(false, Ordering::AcqRel) {
            let buffer = self
                .shared
                .result
                .lock()
                .expect("flow generator mutex poisoned")
                .take();
            if let Some(buffer) = buffer {
                self.u1 = buffer.u;
                self.v1 = buffer.v;
                return;
            }
        }
        // Worker wasn't ready: generate synchronously rather than stall.
        let time = self.elapsed * self.evolution;
        let (u, v) = Self::generate_buffer(&self.noise, self.width, self.height, self.strength, time);
        self.u1 = u;
        self.v1 = v;
    }

    fn blend(&self, a: f32, b: f32) -> f32 {
        a * (1.0 - self.t) + b * self.t
    }

    /// Sample world-units-per-tick velocity at world position `(x, y)`,
    /// given the world's `(width, height)` for the cell-space conversion.
    pub fn sample(&self, x: f64, y: f64, world_width: f64, world_height: f64) -> (f32, f32) {
        let gx = (x / world_width) * self.width as f64;
        let gy = (y / world_height) * self.height as f64;
        let u0 = bilinear_sample(&self.u0, self.width, self.height, gx, gy);
        let v0 = bilinear_sample(&self.v0, self.width, self.height, gx, gy);
        let u1 = bilinear_sample(&self.u1, self.width, self.height, gx, gy);
        let v1 = bilinear_sample(&self.v1, self.width, self.height, gx, gy);
        (self.blend(u0, u1), self.blend(v0, v1))
    }

    /// Row-major `(Fw x Fh)` arrays in world-units/tick, for renderers.
    pub fn flow_data(&self) -> (Vec<f32>, Vec<f32>) {
        let u: Vec<f32> = self
            .u0
            .iter()
            .zip(self.u1.iter())
            .map(|(&a, &b)| self.blend(a, b))
            .collect();
        let v: Vec<f32> = self
            .v0
            .iter()
            .zip(self.v1.iter())
            .map(|(&a, &b)| self.blend(a, b))
            .collect();
        (u, v)
    }

    pub fn dims(&self) -> (usize, usize) {
        (self.width, self.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_magnitude_is_bounded_by_strength() {
        let cfg = SimConfig {
            flow_strength: 0.1,
            ..SimConfig::default()
        };
        let field = FlowField::new(16, 16, &cfg, 7);
        for i in 0..16 {
            for j in 0..16 {
                let x = i as f64 * 10.0;
                let y = j as f64 * 10.0;
                let (fx, fy) = field.sample(x, y, 160.0, 160.0);
                assert!(fx.abs() <= 0.6, "fx={fx}");
                assert!(fy.abs() <= 0.6, "fy={fy}");
            }
        }
    }

    #[test]
    fn blend_interpolates_between_buffers_during_window() {
        let cfg = SimConfig {
            flow_update_sec: 1.0,
            ..SimConfig::default()
        };
        let mut field = FlowField::new(8, 8, &cfg, 1);
        field.u0.fill(0.0);
        field.u1.fill(1.0);
        field.t = 0.5;
        let sampled = bilinear_sample(&field.u0, 8, 8, 0.0, 0.0) * 0.5
            + bilinear_sample(&field.u1, 8, 8, 0.0, 0.0) * 0.5;
        assert!((sampled - 0.5).abs() < 1e-6);
    }
}
