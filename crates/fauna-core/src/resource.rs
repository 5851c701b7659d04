//! `ResourceField`: the mass-conserving, curl-noise-advected particle/grid
//! coupled system that produces the food landscape. Owns a
//! `FlowField`, a `PotentialField`, and a fixed-capacity particle pool.

use crate::config::SimConfig;
use crate::flow::FlowField;
use crate::grid::{bilinear_sample, bilinear_splat, tent_weight};
use crate::potential::PotentialField;
use rand::Rng;

#[derive(Clone, Copy, Debug)]
struct Particle {
    x: f64,
    y: f64,
    mass: f32,
}

const DESPAWN_THRESHOLD: f32 = 0.0001;

pub struct ResourceField {
    width: usize,
    height: usize,
    world_width: f64,
    world_height: f64,
    res: Vec<f32>,
    det: Vec<f32>,
    cell_capacity: f32,
    max_particles: usize,

    particles: Vec<Particle>,
    active: Vec<bool>,
    free_list: Vec<usize>,
    active_list: Vec<usize>,

    flow: FlowField,
    potential: PotentialField,

    spawn_rate: f32,
    deposit_rate: f32,
    pickup_rate: f32,
    initial_mass: f32,
    spawn_accumulator: f32,

    decay_rate: f32,
    decay_efficiency: f32,

    pub particle_input_this_tick: f32,
    pub detritus_heat_this_tick: f32,
    pub dropped_spawn_count: u32,
    pub total_heat: f32,
}

impl ResourceField {
    pub fn new(config: &SimConfig, seed: u64) -> Self {
        let width = config.resource_grid_width;
        let height = config.resource_grid_height;
        Self {
            width,
            height,
            world_width: config.world_width,
            world_height: config.world_height,
            res: vec![0.0; width * height],
            det: vec![0.0; width * height],
            cell_capacity: config.cell_capacity,
            max_particles: config.particles_max_count,

            particles: Vec::with_capacity(config.particles_max_count),
            active: Vec::with_capacity(config.particles_max_count),
            free_list: Vec::new(),
            active_list: Vec::new(),

            flow: FlowField::new(config.flow_grid_width, config.flow_grid_height, config, seed),
            potential: PotentialField::new(width, height, config, seed),

            spawn_rate: config.spawn_rate,
            deposit_rate: config.deposit_rate,
            pickup_rate: config.pickup_rate,
            initial_mass: config.initial_mass,
            spawn_accumulator: 0.0,

            decay_rate: config.detritus_decay_rate,
            decay_efficiency: config.detritus_decay_efficiency,

            particle_input_this_tick: 0.0,
            detritus_heat_this_tick: 0.0,
            dropped_spawn_count: 0,
            total_heat: 0.0,
        }
    }

    fn world_to_cell(&self, x: f64, y: f64) -> (f64, f64) {
        (
            (x / self.world_width) * self.width as f64,
            (y / self.world_height) * self.height as f64,
        )
    }

    /// Bilinear lookup on `Res` with toroidal wrap.
    pub fn sample(&self, x: f64, y: f64) -> f32 {
        let (cx, cy) = self.world_to_cell(x, y);
        bilinear_sample(&self.res, self.width, self.height, cx, cy)
    }

    /// Tent-kernel extraction over a `(2r+1)^2` cell neighborhood. Returns the
    /// exact mass removed; never exceeds per-cell availability.
    pub fn graze(&mut self, x: f64, y: f64, rate: f32, dt: f64, radius: f64) -> f32 {
        let (cx, cy) = self.world_to_cell(x, y);
        let cx0 = cx.floor() as i64;
        let cy0 = cy.floor() as i64;
        let r = radius.ceil() as i64;
        let mut removed = 0.0f32;
        for dy in -r..=r {
            for dx in -r..=r {
                let gx = (cx0 + dx).rem_euclid(self.width as i64) as usize;
                let gy = (cy0 + dy).rem_euclid(self.height as i64) as usize;
                let dist = ((dx * dx + dy * dy) as f64).sqrt();
                let weight = tent_weight(dist, radius);
                if weight <= 0.0 {
                    continue;
                }
                let idx = gy * self.width + gx;
                let want = rate * weight * dt as f32;
                let take = want.min(self.res[idx]);
                self.res[idx] -= take;
                removed += take;
            }
        }
        removed
    }

    /// Bilinear splat to `Det`; always accepts the full amount.
    pub fn deposit_detritus(&mut self, x: f64, y: f64, mass: f32) -> f32 {
        let (cx, cy) = self.world_to_cell(x, y);
        let det = &mut self.det;
        bilinear_splat(self.width, self.height, cx, cy, mass, |idx, w| {
            det[idx] += w;
            w
        })
    }

    fn spawn<R: Rng + ?Sized>(&mut self, dt: f64, rng: &mut R) {
        self.spawn_accumulator += self.spawn_rate * dt as f32;
        let target = self.spawn_accumulator.floor() as u32;
        if target == 0 {
            return;
        }
        self.spawn_accumulator -= target as f32;

        const MAX_REJECTIONS_PER_PARTICLE: u32 = 64;
        for _ in 0..target {
            let mut accepted = false;
            for _ in 0..MAX_REJECTIONS_PER_PARTICLE {
                let x = rng.random::<f64>() * self.world_width;
                let y = rng.random::<f64>() * self.world_height;
                let u = x / self.world_width;
                let v = y / self.world_height;
                let p = self.potential.sample(u, v);
                if rng.random::<f32>() <= p {
                    if !self.try_spawn_particle(x, y, self.initial_mass) {
                        self.dropped_spawn_count += 1;
                    }
                    accepted = true;
                    break;
                }
            }
            if !accepted {
                self.dropped_spawn_count += 1;
            }
        }
    }

    fn try_spawn_particle(&mut self, x: f64, y: f64, mass: f32) -> bool {
        let particle = Particle { x, y, mass };
        if let Some(idx) = self.free_list.pop() {
            self.particles[idx] = particle;
            self.active[idx] = true;
            self.active_list.push(idx);
        } else {
            if self.particles.len() >= self.max_particles {
                return false;
            }
            let idx = self.particles.len();
            self.particles.push(particle);
            self.active.push(true);
            self.active_list.push(idx);
        }
        self.particle_input_this_tick += mass;
        true
    }

    /// Advance time, optionally evolve the flow/potential fields, then run
    /// particle dynamics and detritus decay. Takes an
    /// explicit RNG per the crate-wide "no global RNG singleton" design rule
    pub fn step<R: Rng + ?Sized>(&mut self, dt: f64, evolve: bool, rng: &mut R) {
        self.particle_input_this_tick = 0.0;
        self.detritus_heat_this_tick = 0.0;

        if evolve {
            self.potential.step(dt);
            self.flow.step(dt);
        }

        self.spawn(dt, rng);
        self.advect(dt);
        self.deposit_and_pickup(dt);
        self.cleanup_despawned();
        self.decay_detritus(dt);
    }

    fn advect(&mut self, dt: f64) {
        for &idx in &self.active_list {
            let (u, v) = self.flow.sample(
                self.particles[idx].x,
                self.particles[idx].y,
                self.world_width,
                self.world_height,
            );
            let p = &mut self.particles[idx];
            p.x = (p.x + u as f64 * dt).rem_euclid(self.world_width);
            p.y = (p.y + v as f64 * dt).rem_euclid(self.world_height);
        }
    }

    fn deposit_and_pickup(&mut self, dt: f64) {
        let capacity = self.cell_capacity;
        for &idx in &self.active_list {
            let (px, py, mass) = {
                let p = self.particles[idx];
                (p.x, p.y, p.mass)
            };
            let (cx, cy) = self.world_to_cell(px, py);

            let deposit_target = (mass * self.deposit_rate * dt as f32).min(mass);
            let res = &mut self.res;
            let deposited =
                bilinear_splat(self.width, self.height, cx, cy, deposit_target, |i, w| {
                    if capacity > 0.0 {
                        let room = (capacity - res[i]).max(0.0);
                        let take = w.min(room);
                        res[i] += take;
                        take
                    } else {
                        res[i] += w;
                        w
                    }
                });

            let local_density = bilinear_sample(&self.res, self.width, self.height, cx, cy);
            let pickup_target =
                (self.pickup_rate * local_density * dt as f32).min(local_density * 0.5);
            let res = &mut self.res;
            let picked_up = bilinear_splat(self.width, self.height, cx, cy, pickup_target, |i, w| {
                let take = w.min(res[i]);
                res[i] -= take;
                take
            });

            let p = &mut self.particles[idx];
            p.mass = p.mass - deposited + picked_up;
        }
    }

    fn cleanup_despawned(&mut self) {
        for &idx in &self.active_list {
            if self.particles[idx].mass < DESPAWN_THRESHOLD {
                self.active[idx] = false;
                self.free_list.push(idx);
            }
        }
        let active = &self.active;
        self.active_list.retain(|&idx| active[idx]);
    }

    fn decay_detritus(&mut self, dt: f64) {
        let rate = self.decay_rate;
        let eff = self.decay_efficiency;
        for i in 0..self.det.len() {
            let decayed = rate * self.det[i] * dt as f32;
            self.det[i] -= decayed;
            self.res[i] += eff * decayed;
            let heat = (1.0 - eff) * decayed;
            self.detritus_heat_this_tick += heat;
            self.total_heat += heat;
        }
    }

    /// `Sigma(Res) + Sigma(Det) + Sigma(particle mass)`, the conserved
    /// quantity the whole field is built to hold steady absent external
    /// input.
    pub fn total_mass(&self) -> f64 {
        let res_total: f64 = self.res.iter().map(|&v| v as f64).sum();
        let det_total: f64 = self.det.iter().map(|&v| v as f64).sum();
        let particle_total: f64 = self
            .active_list
            .iter()
            .map(|&idx| self.particles[idx].mass as f64)
            .sum();
        res_total + det_total + particle_total
    }

    pub fn active_particle_count(&self) -> usize {
        self.active_list.len()
    }

    pub fn res_data(&self) -> &[f32] {
        &self.res
    }

    pub fn det_data(&self) -> &[f32] {
        &self.det
    }

    pub fn flow_data(&self) -> (Vec<f32>, Vec<f32>) {
        self.flow.flow_data()
    }

    /// The flow field driving particle advection, shared with `Flora` so both
    /// ride the same current.
    pub fn flow(&self) -> &FlowField {
        &self.flow
    }

    pub fn dims(&self) -> (usize, usize) {
        (self.width, self.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha12Rng;

    fn zero_rate_config() -> SimConfig {
        SimConfig {
            resource_grid_width: 8,
            resource_grid_height: 8,
            flow_grid_width: 8,
            flow_grid_height: 8,
            spawn_rate: 0.0,
            ..SimConfig::default()
        }
    }

    #[test]
    fn graze_never_removes_more_than_available() {
        let cfg = zero_rate_config();
        let mut field = ResourceField::new(&cfg, 1);
        field.res.fill(0.01);
        let removed = field.graze(100.0, 100.0, 5.0, 1.0, 1.0);
        let available_before: f32 = 9.0 * 0.01; // 3x3 tent neighborhood upper bound
        assert!(removed <= available_before + 1e-6);
    }

    #[test]
    fn deposit_detritus_is_conserved() {
        let cfg = zero_rate_config();
        let mut field = ResourceField::new(&cfg, 1);
        let accepted = field.deposit_detritus(10.0, 10.0, 5.0);
        assert!((accepted - 5.0).abs() < 1e-4);
        let total: f32 = field.det.iter().sum();
        assert!((total - 5.0).abs() < 1e-4);
    }

    #[test]
    fn mass_conserved_with_zero_spawn_rate() {
        let cfg = zero_rate_config();
        let mut field = ResourceField::new(&cfg, 1);
        field.deposit_detritus(40.0, 40.0, 20.0);
        let mut rng = ChaCha12Rng::seed_from_u64(42);
        let initial = field.total_mass();
        for _ in 0..100 {
            field.step(1.0 / 60.0, true, &mut rng);
        }
        let final_total = field.total_mass() + field.total_heat as f64;
        assert!(
            (initial - final_total).abs() < 1e-3 * initial.max(1.0),
            "initial={initial} final+heat={final_total}"
        );
    }

    #[test]
    fn particle_below_threshold_is_despawned_within_one_tick() {
        let cfg = zero_rate_config();
        let mut field = ResourceField::new(&cfg, 1);
        field.try_spawn_particle(5.0, 5.0, 0.00005);
        let mut rng = ChaCha12Rng::seed_from_u64(1);
        assert_eq!(field.active_particle_count(), 1);
        field.step(1.0 / 60.0, false, &mut rng);
        assert_eq!(field.active_particle_count(), 0);
    }
}
