//! `Organism`: the fauna record carried through every per-tick phase

use crate::cell::{Capabilities, CellVec, Obb};
use crate::config::SimConfig;
use crate::toroidal;
use std::f32::consts::TAU;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AllocationMode {
    Survive,
    Breed,
    Store,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Gender {
    Female,
    Male,
}

impl Gender {
    pub fn opposite(self, other: Gender) -> bool {
        self != other
    }
}

#[derive(Clone, Debug)]
pub struct Organism {
    pub position: (f32, f32),
    pub velocity: (f32, f32),
    pub heading: f32,

    energy: f32,
    max_energy: f32,

    pub cells: CellVec,

    pub allocation_mode: AllocationMode,
    pub desire_angle: f32,
    pub desire_distance: f32,

    pub eat_intent: f32,
    pub breed_intent: f32,
    pub attack_intent: f32,
    pub glow_intent: f32,

    pub active_thrust: f32,
    pub breeding_cooldown: u16,
    pub attack_cooldown: u16,
    pub being_eaten: f32,

    pub species_id: u32,
    pub gender: Gender,

    pub dead: bool,
    /// Ticks remaining before a dead body decomposes past scavenging, or
    /// `None` if carrion scavenging is disabled.
    pub carrion_ticks_remaining: Option<u16>,
}

impl Organism {
    pub fn new(
        position: (f32, f32),
        heading: f32,
        cells: CellVec,
        species_id: u32,
        gender: Gender,
    ) -> Self {
        let cell_count = cells.alive_count();
        let caps = Capabilities::from_cells(&cells);
        let max_energy = Self::compute_max_energy(cell_count, caps.storage_capacity);
        Self {
            position,
            velocity: (0.0, 0.0),
            heading: wrap_heading(heading),
            energy: max_energy,
            max_energy,
            cells,
            allocation_mode: AllocationMode::Store,
            desire_angle: 0.0,
            desire_distance: 0.0,
            eat_intent: 0.0,
            breed_intent: 0.0,
            attack_intent: 0.0,
            glow_intent: 0.0,
            active_thrust: 0.0,
            breeding_cooldown: 0,
            attack_cooldown: 0,
            being_eaten: 0.0,
            species_id,
            gender,
            dead: false,
            carrion_ticks_remaining: None,
        }
    }

    pub fn capabilities(&self) -> Capabilities {
        Capabilities::from_cells(&self.cells)
    }

    pub fn cell_count(&self) -> usize {
        self.cells.alive_count()
    }

    pub fn obb(&self) -> Obb {
        Obb::from_cells(&self.cells, self.position, self.heading)
    }

    pub fn energy(&self) -> f32 {
        self.energy
    }

    pub fn max_energy(&self) -> f32 {
        self.max_energy
    }

    pub fn energy_ratio(&self) -> f32 {
        if self.max_energy <= 0.0 {
            0.0
        } else {
            self.energy / self.max_energy
        }
    }

    /// Sets energy, clamped to `[0, MaxEnergy]`.
    /// Marks `dead` when the clamp lands at zero.
    pub fn set_energy(&mut self, value: f32) {
        if self.dead {
            return;
        }
        self.energy = value.clamp(0.0, self.max_energy);
        if self.energy <= 0.0 {
            self.dead = true;
        }
    }

    pub fn add_energy(&mut self, delta: f32) {
        self.set_energy(self.energy + delta);
    }

    /// `MaxEnergy = 100 + 50*cellCount + storageBonus`.
    fn compute_max_energy(cell_count: usize, storage_capacity: f32) -> f32 {
        100.0 + 50.0 * cell_count as f32 + storage_capacity * cell_count as f32 * 30.0
    }

    pub fn recompute_max_energy(&mut self) {
        let caps = self.capabilities();
        let new_max = Self::compute_max_energy(self.cell_count(), caps.storage_capacity);
        self.max_energy = new_max;
        self.energy = self.energy.min(self.max_energy);
    }

    pub fn has_breeding_trait(&self) -> bool {
        self.capabilities().has_breeding_trait()
    }

    pub fn breeding_eligible(&self) -> bool {
        !self.dead
            && self.allocation_mode == AllocationMode::Breed
            && self.energy_ratio() >= 0.35
            && self.cell_count() >= 1
            && self.breeding_cooldown == 0
            && self.has_breeding_trait()
    }

    /// Marks this organism dead and starts (or skips, per `carrion_ttl`) its
    /// carrion window.
    pub fn kill(&mut self, carrion_ttl_ticks: u16) {
        self.dead = true;
        self.energy = 0.0;
        self.carrion_ticks_remaining = if carrion_ttl_ticks > 0 {
            Some(carrion_ttl_ticks)
        } else {
            None
        };
    }

    /// Advances carrion decomposition by one tick; returns `true` once the
    /// body should be removed from the world.
    pub fn tick_carrion(&mut self) -> bool {
        debug_assert!(self.dead, "tick_carrion called on a live organism");
        match self.carrion_ticks_remaining.as_mut() {
            Some(0) => true,
            Some(remaining) => {
                *remaining -= 1;
                false
            }
            None => true,
        }
    }

    pub fn is_scavengable(&self) -> bool {
        self.dead && matches!(self.carrion_ticks_remaining, Some(r) if r > 0)
    }

    pub fn toroidal_distance(&self, other: &Organism, config: &SimConfig) -> f64 {
        let (dx, dy) = toroidal::delta(
            (self.position.0 as f64, self.position.1 as f64),
            (other.position.0 as f64, other.position.1 as f64),
            config.world_width,
            config.world_height,
        );
        (dx * dx + dy * dy).sqrt()
    }
}

pub fn wrap_heading(theta: f32) -> f32 {
    let wrapped = theta % TAU;
    if wrapped < 0.0 {
        wrapped + TAU
    } else {
        wrapped
    }
}
