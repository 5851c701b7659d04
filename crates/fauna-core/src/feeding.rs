//! Capability-based edibility matching and two-pass interference-aware
//! predation.

use crate::cell::Capabilities;
use crate::config::SimConfig;
use crate::flora::FloraSystem;
use crate::organism::Organism;
use crate::spatial::SpatialGrid;
use std::collections::HashMap;

/// `1 - |selfDigestive - (1 - targetComposition)|`.
pub fn edibility(self_digestive: f32, target_composition: f32) -> f32 {
    1.0 - (self_digestive - (1.0 - target_composition)).abs()
}

pub fn penetration(self_digestive: f32, target_composition: f32, target_armor: f32) -> f32 {
    (edibility(self_digestive, target_composition) - target_armor).max(0.0)
}

/// `p^CompatK`.
pub fn nutrition(p: f32, compat_k: f32) -> f32 {
    p.powf(compat_k)
}

fn attack_range(caps: &Capabilities, config: &SimConfig) -> f64 {
    config.attack_base_range * (0.5 + caps.mouth_size as f64)
}

fn attack_damage(caps: &Capabilities) -> f32 {
    0.15 * (1.0 + caps.mouth_size)
}

fn attack_cost(caps: &Capabilities) -> f32 {
    2.0 * (1.0 + caps.mouth_size * 0.5)
}

struct PendingAttack {
    predator: usize,
    penetration: f32,
    caps: Capabilities,
}

/// Runs both feeding passes for one tick. `positions` must match
/// `spatial_grid`'s indexing of `organisms`.
pub fn run_tick<R: rand::Rng + ?Sized>(
    organisms: &mut [Organism],
    positions: &[(f64, f64)],
    spatial_grid: &SpatialGrid,
    flora: &mut FloraSystem,
    config: &SimConfig,
    rng: &mut R,
) {
    let mut neighbor_buf = Vec::new();
    let mut pending: HashMap<u32, Vec<PendingAttack>> = HashMap::new();

    // Pass 1: collect.
    for i in 0..organisms.len() {
        if organisms[i].dead {
            continue;
        }
        if organisms[i].attack_cooldown > 0 {
            organisms[i].attack_cooldown -= 1;
        }
        let caps = organisms[i].capabilities();
        let pos = positions[i];

        if caps.digestive_spectrum < 0.7 {
            graze_best_flora(i, pos, flora, &caps, config);
        }

        if organisms[i].attack_intent > 0.5 && organisms[i].attack_cooldown == 0 {
            neighbor_buf.clear();
            let range = attack_range(&caps, config);
            spatial_grid.query_into(&mut neighbor_buf, pos.0, pos.1, range, i as u32, positions);

            let mut best: Option<(usize, f32)> = None;
            for neighbor in &neighbor_buf {
                let target_idx = neighbor.entity as usize;
                let Some(target) = organisms.get(target_idx) else {
                    continue;
                };
                if target.dead {
                    continue;
                }
                if organisms[i].species_id == target.species_id
                    && target.species_id > 0
                    && rng.random::<f32>() < config.kin_avoidance_probability
                {
                    continue;
                }
                let target_caps = target.capabilities();
                let p = penetration(
                    caps.digestive_spectrum,
                    target_caps.composition,
                    target_caps.structural_armor,
                );
                if p <= 0.0 {
                    continue;
                }
                let better = match best {
                    None => true,
                    Some((_, best_p)) if p > best_p => true,
                    Some((best_idx, best_p)) if p == best_p => {
                        neighbor.dist_sq < positions_dist_sq(positions, i, best_idx)
                    }
                    _ => false,
                };
                if better {
                    best = Some((target_idx, p));
                }
            }
            if let Some((target_idx, p)) = best {
                pending.entry(target_idx as u32).or_default().push(PendingAttack {
                    predator: i,
                    penetration: p,
                    caps,
                });
            }
        }
    }

    // Pass 2: resolve predation with interference.
    for (target_idx, attacks) in pending {
        let target_idx = target_idx as usize;
        if organisms[target_idx].dead {
            continue;
        }
        let num_attackers = attacks.len() as f32;
        let crowd_penalty = (config.max_crowd_penalty).min((num_attackers - 2.0).max(0.0) * 0.2);
        let crowd_mult = (1.0 - crowd_penalty).max(0.30);

        let target_max_energy = organisms[target_idx].max_energy();
        let raw_damages: Vec<f32> = attacks
            .iter()
            .map(|a| attack_damage(&a.caps) * a.penetration * target_max_energy)
            .collect();
        let total_damage_uncapped: f32 = raw_damages.iter().sum();
        let total_damage = total_damage_uncapped.min(organisms[target_idx].energy());

        for (attack, &raw_damage) in attacks.iter().zip(raw_damages.iter()) {
            let predator = &mut organisms[attack.predator];
            predator.attack_cooldown = config.attack_cooldown_ticks;
            let share = if total_damage_uncapped > 0.0 {
                (raw_damage / total_damage_uncapped) * total_damage / num_attackers
                    * nutrition(attack.penetration, config.compat_k)
                    * config.feeding_efficiency
                    * crowd_mult
            } else {
                0.0
            };
            predator.add_energy(share);
            predator.add_energy(-attack_cost(&attack.caps));
        }

        let target = &mut organisms[target_idx];
        target.being_eaten = target.being_eaten.max(total_damage / target_max_energy.max(1e-9));
        target.add_energy(-total_damage);
        if target.energy() <= 0.0 {
            target.kill(config.carrion_ttl_ticks);
        }
    }
}

fn positions_dist_sq(positions: &[(f64, f64)], from: usize, to: usize) -> f64 {
    let (ax, ay) = positions[from];
    let (bx, by) = positions[to];
    (bx - ax).powi(2) + (by - ay).powi(2)
}

fn graze_best_flora(
    organism_idx: usize,
    pos: (f64, f64),
    flora: &mut FloraSystem,
    caps: &Capabilities,
    config: &SimConfig,
) {
    let mut best: Option<(usize, f32, f64)> = None;
    for (idx, f) in flora.as_slice().iter().enumerate() {
        if f.dead {
            continue;
        }
        let (dx, dy) = crate::toroidal::delta(
            pos,
            (f.position.0 as f64, f.position.1 as f64),
            config.world_width,
            config.world_height,
        );
        let dist = (dx * dx + dy * dy).sqrt();
        if dist > config.feeding_distance {
            continue;
        }
        // `edibility`'s `(1 - targetComposition)` term anchors "pure plant"
        // at targetComposition = 1.0, not 0.0 - passing 0.0 here would score
        // herbivores as unable to digest flora at all.
        let p = penetration(caps.digestive_spectrum, 1.0, 0.0);
        let better = match best {
            None => true,
            Some((_, best_p, _)) if p > best_p => true,
            Some((_, best_p, best_dist)) if p == best_p && dist < best_dist => true,
            _ => false,
        };
        if better {
            best = Some((idx, p, dist));
        }
    }
    let _ = organism_idx;
    if let Some((idx, p, _)) = best {
        let reward = 1.0 * nutrition(p, config.compat_k) * config.feeding_efficiency;
        flora.as_mut_slice()[idx].energy -= reward.min(flora.as_slice()[idx].energy);
        if flora.as_slice()[idx].energy <= 0.0 {
            flora.as_mut_slice()[idx].dead = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edibility_matches_the_documented_formula() {
        // 1 - |selfDigestive - (1 - targetComposition)|: the formula's "pure
        // plant" anchor is targetComposition = 1.0, not 0.0, so a pure
        // herbivore (digestive 0.0) scores zero against targetComposition
        // 0.0 and full marks against targetComposition 1.0.
        assert!((edibility(0.0, 0.0) - 0.0).abs() < 1e-6);
        assert!((edibility(0.0, 1.0) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn penetration_is_zero_when_armor_exceeds_edibility() {
        assert_eq!(penetration(0.0, 0.0, 2.0), 0.0);
    }

    #[test]
    fn nutrition_follows_power_law() {
        assert!((nutrition(0.5, 3.0) - 0.125).abs() < 1e-6);
    }

    #[test]
    fn predator_interference_resolves_crowd_penalized_shares() {
        use crate::cell::{Cell, CellVec};
        use crate::organism::Gender;
        use rand::SeedableRng;
        use rand_chacha::ChaCha12Rng;

        let cfg = SimConfig::default();

        // Target: no cells, so MaxEnergy = 100 and Capabilities::default()
        // gives composition = 0.0, armor = 0.0.
        let target = Organism::new((50.0, 50.0), 0.0, CellVec::new(), 0, Gender::Female);
        let target_initial_energy = target.energy();

        // Each attacker: digestive = 0.5, mouth = 1.0, so against the
        // target's composition/armor, penetration = edibility(0.5, 0.0) =
        // 1 - |0.5 - 1.0| = 0.5.
        let make_attacker = |pos: (f32, f32)| {
            let mut cells = CellVec::new();
            let mut c = Cell::new((0, 0));
            c.digestive = 0.5;
            c.mouth = 1.0;
            cells.push(c);
            let mut attacker = Organism::new(pos, 0.0, cells, 0, Gender::Male);
            attacker.attack_intent = 0.6;
            attacker
        };
        let penetration_value = 0.5f32;
        let mouth_size = 1.0f32;

        let mut organisms = vec![
            target,
            make_attacker((51.0, 50.0)),
            make_attacker((49.0, 50.0)),
            make_attacker((50.0, 51.0)),
        ];
        let attacker_initial_energy = organisms[1].energy();

        let positions: Vec<(f64, f64)> = organisms
            .iter()
            .map(|o| (o.position.0 as f64, o.position.1 as f64))
            .collect();
        let mut grid = SpatialGrid::new(cfg.world_width, cfg.world_height, cfg.spatial_cell_size);
        grid.rebuild(&positions, |_| true);
        let mut flora = FloraSystem::new(&cfg);
        let mut rng = ChaCha12Rng::seed_from_u64(1);

        run_tick(&mut organisms, &positions, &grid, &mut flora, &cfg, &mut rng);

        let attack_damage = 0.15 * (1.0 + mouth_size);
        let raw_damage_per_attacker = attack_damage * penetration_value * target_initial_energy;
        let total_damage_uncapped = raw_damage_per_attacker * 3.0;
        let total_damage = total_damage_uncapped.min(target_initial_energy);
        let crowd_mult = 1.0 - (3.0f32 - 2.0).max(0.0) * 0.2;
        let expected_share = (raw_damage_per_attacker / total_damage_uncapped) * total_damage / 3.0
            * nutrition(penetration_value, cfg.compat_k)
            * cfg.feeding_efficiency
            * crowd_mult;
        let attack_cost = 2.0 * (1.0 + mouth_size * 0.5);

        assert!(total_damage <= target_initial_energy + 1e-6);
        assert!(
            (organisms[0].energy() - (target_initial_energy - total_damage)).abs() < 1e-3,
            "target should lose exactly total_damage"
        );
        for i in 1..=3 {
            let expected_energy = attacker_initial_energy + expected_share - attack_cost;
            assert!(
                (organisms[i].energy() - expected_energy).abs() < 1e-3,
                "attacker {i} energy {} did not match expected {expected_energy}",
                organisms[i].energy()
            );
            assert_eq!(organisms[i].attack_cooldown, cfg.attack_cooldown_ticks);
        }
    }
}
