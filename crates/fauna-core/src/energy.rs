//! Metabolism: photosynthesis offset, movement cost, death.

use crate::organism::Organism;
use crate::resource::ResourceField;

/// `(base_speed, base_drain)` by cell-count tier. Drifters barely move or
/// eat; apex bodies pay the most upkeep.
fn size_tier(cell_count: usize) -> (f64, f32) {
    match cell_count {
        0..=2 => (1.0, 0.05),
        3..=8 => (2.0, 0.15),
        _ => (3.0, 0.35),
    }
}

pub struct EnergyTick {
    pub photosynthesis_gain: f32,
    pub movement_cost: f32,
}

/// Runs one organism's metabolism step. `light` is the ambient/local light
/// level at the organism's position; the resource field is grazed directly
/// here for photosynthetic organisms below the flora canopy.
pub fn step(organism: &mut Organism, light: f32, config: &crate::config::SimConfig) -> EnergyTick {
    if organism.dead {
        return EnergyTick {
            photosynthesis_gain: 0.0,
            movement_cost: 0.0,
        };
    }

    let caps = organism.capabilities();
    let cell_count = organism.cell_count();
    let (_, base_drain) = size_tier(cell_count);

    let photo = (0.1 * light * caps.photo_weight).min(0.8 * base_drain);

    let thrust_cost = organism.active_thrust
        * config.drag as f32
        * 1.5
        * (cell_count as f32).powf(0.7)
        * (1.0 + caps.structural_armor * 0.4);

    organism.add_energy(-(base_drain - photo + thrust_cost));
    organism.active_thrust = 0.0;

    if organism.energy() <= 0.0 {
        organism.kill(config.carrion_ttl_ticks);
    }

    if organism.breeding_cooldown > 0 {
        organism.breeding_cooldown -= 1;
    }

    organism.recompute_max_energy();

    EnergyTick {
        photosynthesis_gain: photo,
        movement_cost: thrust_cost,
    }
}

/// Grazes the shared resource field on behalf of a photosynthetic/grazing
/// organism, feeding the result back as energy (used by `Tick` alongside
/// `step` for organisms whose diet leans herbivorous).
pub fn graze(organism: &mut Organism, resource: &mut ResourceField, rate: f32, dt: f64, radius: f64) {
    if organism.dead {
        return;
    }
    let removed = resource.graze(
        organism.position.0 as f64,
        organism.position.1 as f64,
        rate,
        dt,
        radius,
    );
    organism.add_energy(removed);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::{Cell, CellVec};
    use crate::config::SimConfig;
    use crate::organism::Gender;

    fn organism_with_photo(cell_count: usize, photo: f32) -> Organism {
        let mut cells = CellVec::new();
        for i in 0..cell_count {
            let mut c = Cell::new((i as i8, 0));
            if i == 0 {
                c.photosynthetic = photo;
            }
            cells.push(c);
        }
        Organism::new((0.0, 0.0), 0.0, cells, 1, Gender::Female)
    }

    #[test]
    fn dies_when_energy_reaches_zero() {
        let cfg = SimConfig::default();
        let mut o = organism_with_photo(1, 0.0);
        o.set_energy(0.01);
        step(&mut o, 0.0, &cfg);
        assert!(o.dead);
    }

    #[test]
    fn photosynthesis_offsets_drain_but_is_capped() {
        let cfg = SimConfig::default();
        let mut o = organism_with_photo(1, 100.0);
        let before = o.energy();
        let tick = step(&mut o, 1.0, &cfg);
        assert!(tick.photosynthesis_gain <= 0.8 * 0.05);
        assert!(o.energy() <= before);
    }

    #[test]
    fn active_thrust_is_reset_after_step() {
        let cfg = SimConfig::default();
        let mut o = organism_with_photo(1, 0.0);
        o.active_thrust = 5.0;
        step(&mut o, 0.0, &cfg);
        assert_eq!(o.active_thrust, 0.0);
    }

    #[test]
    fn breeding_cooldown_decrements() {
        let cfg = SimConfig::default();
        let mut o = organism_with_photo(1, 0.0);
        o.breeding_cooldown = 3;
        step(&mut o, 0.0, &cfg);
        assert_eq!(o.breeding_cooldown, 2);
    }
}
