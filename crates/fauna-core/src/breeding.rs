//! Proximity-gated sexual reproduction with trait inheritance.

use crate::cell::{Cell, CellVec};
use crate::config::SimConfig;
use crate::organism::{AllocationMode, Gender, Organism};
use crate::toroidal;
use rand::Rng;

/// Greedily pairs eligible opposite-gender organisms within `breeding_distance`
/// and appends offspring to `organisms`. Each parent is paired at most once.
/// Returns each offspring's `(parent_a, parent_b)` index pair, in the same
/// order the offspring were appended, so callers that track a parallel
/// per-organism array (e.g. a brain genome) can extend it in lockstep.
pub fn run_tick<R: Rng + ?Sized>(
    organisms: &mut Vec<Organism>,
    config: &SimConfig,
    rng: &mut R,
) -> Vec<(usize, usize)> {
    let eligible: Vec<usize> = organisms
        .iter()
        .enumerate()
        .filter(|(_, o)| o.breeding_eligible())
        .map(|(i, _)| i)
        .collect();

    let mut paired = vec![false; organisms.len()];
    let mut offspring = Vec::new();
    let mut parents = Vec::new();

    for &i in &eligible {
        if paired[i] {
            continue;
        }
        for &j in &eligible {
            if i == j || paired[j] {
                continue;
            }
            if organisms[i].gender == organisms[j].gender {
                continue;
            }
            let (dx, dy) = toroidal::delta(
                (organisms[i].position.0 as f64, organisms[i].position.1 as f64),
                (organisms[j].position.0 as f64, organisms[j].position.1 as f64),
                config.world_width,
                config.world_height,
            );
            if (dx * dx + dy * dy).sqrt() > config.breeding_distance {
                continue;
            }

            paired[i] = true;
            paired[j] = true;
            offspring.push(make_offspring(&organisms[i], &organisms[j], config, rng));
            parents.push((i, j));

            organisms[i].add_energy(-config.breeding_energy_cost);
            organisms[j].add_energy(-config.breeding_energy_cost);
            organisms[i].breeding_cooldown = config.breeding_cooldown_ticks;
            organisms[j].breeding_cooldown = config.breeding_cooldown_ticks;
            break;
        }
    }

    organisms.extend(offspring);
    parents
}

fn make_offspring<R: Rng + ?Sized>(
    a: &Organism,
    b: &Organism,
    config: &SimConfig,
    rng: &mut R,
) -> Organism {
    let midpoint = (
        (a.position.0 + b.position.0) * 0.5,
        (a.position.1 + b.position.1) * 0.5,
    );

    let mut cells = inherit_cells(a, b, rng);
    ensure_diet_trait(&mut cells, rng);

    let gender = if rng.random::<bool>() {
        Gender::Male
    } else {
        Gender::Female
    };
    let species_id = a.species_id;

    let mut offspring = Organism::new(midpoint, rng.random_range(0.0..std::f32::consts::TAU), cells, species_id, gender);
    offspring.allocation_mode = AllocationMode::Store;
    offspring.set_energy(config.breeding_offspring_energy);
    offspring
}

/// Each parent cell is inherited with 50% chance when at least one parent
/// carries a cell at that slot; slots are matched by index
/// since both parents share the fixed-capacity layout.
fn inherit_cells<R: Rng + ?Sized>(a: &Organism, b: &Organism, rng: &mut R) -> CellVec {
    let max_len = a.cells.len().max(b.cells.len());
    let mut cells = CellVec::new();
    for idx in 0..max_len {
        let from_a = a.cells.as_slice().get(idx);
        let from_b = b.cells.as_slice().get(idx);
        let chosen = match (from_a, from_b) {
            (Some(ca), Some(cb)) => {
                if rng.random::<bool>() {
                    Some(*ca)
                } else {
                    Some(*cb)
                }
            }
            (Some(ca), None) if rng.random::<bool>() => Some(*ca),
            (None, Some(cb)) if rng.random::<bool>() => Some(*cb),
            _ => None,
        };
        if let Some(cell) = chosen {
            if !cells.push(cell) {
                break;
            }
        }
    }
    cells
}

/// Ensures the offspring keeps at least one diet-capable (mouth or
/// digestive) cell, defaulting to Herbivore when inheritance dropped it all
fn ensure_diet_trait<R: Rng + ?Sized>(cells: &mut CellVec, rng: &mut R) {
    let has_diet = cells.iter().any(|c| c.alive && (c.mouth > 0.0 || c.digestive > 0.0));
    if has_diet {
        return;
    }
    let mut default_cell = Cell::new((0, 0));
    default_cell.mouth = 0.5;
    default_cell.digestive = 0.0; // herbivore default
    if !cells.push(default_cell) {
        let _ = rng.random::<f32>();
    }
}
