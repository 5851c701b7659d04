//! `Flora`: lightweight drifting food bodies outside the fauna ECS

use crate::config::SimConfig;
use crate::flow::FlowField;
use crate::toroidal;

#[derive(Clone, Copy, Debug)]
pub struct Flora {
    pub position: (f32, f32),
    pub velocity: (f32, f32),
    pub energy: f32,
    pub max_energy: f32,
    pub size: f32,
    pub spore_timer: i32,
    pub dead: bool,
}

impl Flora {
    pub fn new(position: (f32, f32), max_energy: f32, size: f32) -> Self {
        Self {
            position,
            velocity: (0.0, 0.0),
            energy: max_energy,
            max_energy,
            size,
            spore_timer: 0,
            dead: false,
        }
    }
}

pub struct FloraSystem {
    flora: Vec<Flora>,
    max_flora: usize,
    base_energy_rate: f32,
    flow_force: f32,
    drag: f32,
    max_speed: f32,
    spore_interval: i32,
    collision_speed_threshold: f32,
    world_width: f64,
    world_height: f64,
}

impl FloraSystem {
    pub fn new(config: &SimConfig) -> Self {
        Self {
            flora: Vec::new(),
            max_flora: config.max_flora,
            base_energy_rate: config.flora_base_energy_rate,
            flow_force: config.flora_flow_force,
            drag: config.flora_drag,
            max_speed: config.flora_max_speed,
            spore_interval: config.flora_spore_interval,
            collision_speed_threshold: config.flora_collision_speed_threshold,
            world_width: config.world_width,
            world_height: config.world_height,
        }
    }

    pub fn len(&self) -> usize {
        self.flora.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flora.is_empty()
    }

    pub fn as_slice(&self) -> &[Flora] {
        &self.flora
    }

    pub fn as_mut_slice(&mut self) -> &mut [Flora] {
        &mut self.flora
    }

    /// Adds a new flora body; returns `false` without mutating if at
    /// `max_flora` capacity.
    pub fn spawn(&mut self, flora: Flora) -> bool {
        if self.flora.len() >= self.max_flora {
            return false;
        }
        self.flora.push(flora);
        true
    }

    /// Advances every living flora body by one tick, calling
    /// `spawn_spore_cb(x, y)` whenever one releases a spore. Dead flora are compacted out at the end.
    pub fn update(&mut self, flow: &FlowField, mut spawn_spore_cb: impl FnMut(f32, f32)) {
        for flora in &mut self.flora {
            if flora.dead {
                continue;
            }
            flora.energy = (flora.energy + self.base_energy_rate).min(flora.max_energy);
            if flora.energy < 0.10 * flora.max_energy {
                flora.dead = true;
                continue;
            }

            let (fx, fy) = flow.sample(
                flora.position.0 as f64,
                flora.position.1 as f64,
                self.world_width,
                self.world_height,
            );
            flora.velocity.0 += fx * self.flow_force;
            flora.velocity.1 += fy * self.flow_force;
            flora.velocity.0 *= self.drag;
            flora.velocity.1 *= self.drag;

            let speed = (flora.velocity.0.powi(2) + flora.velocity.1.powi(2)).sqrt();
            if speed > self.max_speed && speed > 0.0 {
                let scale = self.max_speed / speed;
                flora.velocity.0 *= scale;
                flora.velocity.1 *= scale;
            }

            flora.position.0 =
                toroidal::wrap_coord(flora.position.0 as f64, self.world_width) as f32;
            flora.position.1 =
                toroidal::wrap_coord(flora.position.1 as f64, self.world_height) as f32;
            flora.position.0 += flora.velocity.0;
            flora.position.1 += flora.velocity.1;
            flora.position.0 =
                toroidal::wrap_coord(flora.position.0 as f64, self.world_width) as f32;
            flora.position.1 =
                toroidal::wrap_coord(flora.position.1 as f64, self.world_height) as f32;

            flora.spore_timer += 1;
            if flora.spore_timer >= self.spore_interval && flora.energy > 40.0 {
                flora.spore_timer = 0;
                flora.energy -= 15.0;
                spawn_spore_cb(flora.position.0, flora.position.1 - flora.size);
            }
        }
        self.flora.retain(|f| !f.dead);
    }

    /// Pushes flora away from any fast-moving fauna collider, partially
    /// inheriting the fauna's velocity.
    pub fn apply_fauna_collisions(&mut self, colliders: &[((f32, f32), (f32, f32), f32)]) {
        for flora in &mut self.flora {
            for &(pos, vel, radius) in colliders {
                let (dx, dy) = toroidal::delta(
                    (flora.position.0 as f64, flora.position.1 as f64),
                    (pos.0 as f64, pos.1 as f64),
                    self.world_width,
                    self.world_height,
                );
                let dist = (dx * dx + dy * dy).sqrt();
                if dist > radius as f64 || dist < 1e-6 {
                    continue;
                }
                let speed = (vel.0.powi(2) + vel.1.powi(2)).sqrt();
                if speed <= self.collision_speed_threshold {
                    continue;
                }
                let push = speed - self.collision_speed_threshold;
                let (nx, ny) = ((-dx / dist) as f32, (-dy / dist) as f32);
                flora.velocity.0 += nx * push + vel.0 * 0.2;
                flora.velocity.1 += ny * push + vel.1 * 0.2;
                let new_speed = (flora.velocity.0.powi(2) + flora.velocity.1.powi(2)).sqrt();
                if new_speed > self.max_speed * 3.0 && new_speed > 0.0 {
                    let scale = (self.max_speed * 3.0) / new_speed;
                    flora.velocity.0 *= scale;
                    flora.velocity.1 *= scale;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn low_energy_flora_dies_within_one_tick() {
        let cfg = SimConfig::default();
        let mut system = FloraSystem::new(&cfg);
        let mut f = Flora::new((10.0, 10.0), 100.0, 1.0);
        f.energy = 5.0;
        system.spawn(f);
        let flow = FlowField::new(4, 4, &cfg, 1);
        system.update(&flow, |_, _| {});
        assert!(system.is_empty());
    }

    #[test]
    fn spawn_respects_max_flora_capacity() {
        let cfg = SimConfig {
            max_flora: 1,
            ..SimConfig::default()
        };
        let mut system = FloraSystem::new(&cfg);
        assert!(system.spawn(Flora::new((0.0, 0.0), 100.0, 1.0)));
        assert!(!system.spawn(Flora::new((0.0, 0.0), 100.0, 1.0)));
    }

    #[test]
    fn spore_released_after_interval_when_energy_sufficient() {
        let cfg = SimConfig {
            flora_spore_interval: 2,
            flora_base_energy_rate: 0.0,
            ..SimConfig::default()
        };
        let mut system = FloraSystem::new(&cfg);
        system.spawn(Flora::new((10.0, 10.0), 100.0, 1.0));
        let flow = FlowField::new(4, 4, &cfg, 1);
        let mut spore_count = 0;
        for _ in 0..3 {
            system.update(&flow, |_, _| spore_count += 1);
        }
        assert_eq!(spore_count, 1);
    }

    #[test]
    fn fast_collider_pushes_flora_away() {
        let cfg = SimConfig::default();
        let mut system = FloraSystem::new(&cfg);
        system.spawn(Flora::new((10.0, 10.0), 100.0, 1.0));
        system.apply_fauna_collisions(&[((9.0, 10.0), (5.0, 0.0), 5.0)]);
        assert!(system.as_slice()[0].velocity.0 > 0.0);
    }
}
