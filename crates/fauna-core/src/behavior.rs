//! Parallel worker pool: collect -> compute (parallel) -> apply (serial)

use crate::actuator;
use crate::brain::{decode, Brain, BehaviorOutputs, N_IN};
use crate::cell::Capabilities;
use crate::config::SimConfig;
use crate::error::BrainError;
use crate::flora::FloraSystem;
use crate::organism::Organism;
use crate::pathfinder::{self, TerrainQuerier};
use crate::physics;
use crate::shadow::ShadowMap;
use crate::spatial::SpatialGrid;
use crate::toroidal;
use crate::vision::{PolarVision, SensedEntity};
use rayon::prelude::*;

/// Below this many live organisms, the compute phase runs serially rather
/// than paying worker fan-out overhead.
pub const MIN_ORGANISMS_FOR_PARALLEL: usize = 100;

/// Dead-drift constants.
const DEAD_DRIFT_FLOW_MUL: f32 = 1.5;
const DEAD_DRIFT_SINK: f32 = 0.05;

struct Task {
    index: usize,
    position: (f64, f64),
    heading: f64,
    capabilities: Capabilities,
    energy_ratio: f32,
    species_id: u32,
}

/// Runs one full behavior tick over `organisms`. `flow`/`shadow` are sampled
/// read-only; `spatial_grid` must already be rebuilt for this tick and
/// `positions` must match its indexing. Returns the number of organisms
/// whose `Brain::think` failed this tick.
#[allow(clippy::too_many_arguments)]
pub fn step(
    organisms: &mut [Organism],
    positions: &[(f64, f64)],
    brains: &[Box<dyn Brain>],
    spatial_grid: &SpatialGrid,
    flora: &FloraSystem,
    flow: &crate::flow::FlowField,
    shadow: &ShadowMap,
    terrain: &dyn TerrainQuerier,
    config: &SimConfig,
) -> usize {
    let mut dead_indices = Vec::new();
    let mut tasks = Vec::new();
    for (i, organism) in organisms.iter().enumerate() {
        if organism.dead {
            dead_indices.push(i);
            continue;
        }
        tasks.push(Task {
            index: i,
            position: (organism.position.0 as f64, organism.position.1 as f64),
            heading: organism.heading as f64,
            capabilities: organism.capabilities(),
            energy_ratio: organism.energy_ratio(),
            species_id: organism.species_id,
        });
    }

    for &i in &dead_indices {
        let flow_sample = flow.sample(
            organisms[i].position.0 as f64,
            organisms[i].position.1 as f64,
            config.world_width,
            config.world_height,
        );
        organisms[i].velocity.0 += flow_sample.0 * DEAD_DRIFT_FLOW_MUL;
        organisms[i].velocity.1 += flow_sample.1 * DEAD_DRIFT_FLOW_MUL - DEAD_DRIFT_SINK;
        physics::step_dead(&mut organisms[i], config);
    }

    if tasks.is_empty() {
        return 0;
    }

    let compute_one = |task: &Task| -> (BehaviorOutputs, bool) {
        let Some(brain) = brains.get(task.index) else {
            return (BehaviorOutputs::default(), false);
        };
        let mut neighbor_buf = Vec::new();
        spatial_grid.query_into(
            &mut neighbor_buf,
            task.position.0,
            task.position.1,
            config.sensing_radius,
            task.index as u32,
            positions,
        );

        let fauna_entities = neighbor_buf.iter().filter_map(|n| {
            let other = organisms.get(n.entity as usize)?;
            if other.dead {
                return None;
            }
            let caps = other.capabilities();
            Some(SensedEntity {
                position: (positions[n.entity as usize].0, positions[n.entity as usize].1),
                plant_mass: 0.0,
                meat_mass: caps.composition * other.cell_count() as f32,
                threat_intensity: other.attack_intent,
                kin: other.species_id == task.species_id && task.species_id > 0,
                emitted_light: caps.bioluminescent_weight,
            })
        });

        let flora_entities = flora.as_slice().iter().filter(|f| !f.dead).map(|f| SensedEntity {
            position: (f.position.0 as f64, f.position.1 as f64),
            plant_mass: f.energy / f.max_energy.max(1e-6),
            meat_mass: 0.0,
            threat_intensity: 0.0,
            kin: false,
            emitted_light: 0.0,
        });

        let vision = PolarVision::scan(
            task.position,
            task.heading,
            config.sensing_radius,
            config.vision_cones,
            &task.capabilities,
            fauna_entities.chain(flora_entities),
            config.world_width,
            config.world_height,
            shadow,
        );

        let flow_sample = flow.sample(task.position.0, task.position.1, config.world_width, config.world_height);
        let inputs = compose_inputs(task, &vision, flow_sample, shadow, config);

        match brain.think(&inputs) {
            Ok(raw) => (decode(&raw), false),
            Err(BrainError::EvaluationFailed(_)) => (BehaviorOutputs::default(), true),
        }
    };

    let outputs: Vec<(BehaviorOutputs, bool)> = if tasks.len() >= MIN_ORGANISMS_FOR_PARALLEL {
        tasks.par_iter().map(compute_one).collect()
    } else {
        tasks.iter().map(compute_one).collect()
    };
    let failures = outputs.iter().filter(|(_, failed)| *failed).count();

    for (task, (out, _)) in tasks.iter().zip(outputs.iter()) {
        let i = task.index;
        let flow_sample = flow.sample(
            organisms[i].position.0 as f64,
            organisms[i].position.1 as f64,
            config.world_width,
            config.world_height,
        );
        let steering = pathfinder::navigate(
            (organisms[i].position.0 as f64, organisms[i].position.1 as f64),
            organisms[i].heading as f64,
            out.desire_angle as f64,
            out.desire_distance as f64,
            (flow_sample.0 as f64, flow_sample.1 as f64),
            config,
            terrain,
        );
        let response = actuator::apply(
            organisms[i].heading as f64,
            steering.turn,
            steering.thrust,
            &organisms[i].cells,
            config,
        );

        organisms[i].heading = crate::organism::wrap_heading(
            organisms[i].heading + response.torque as f32,
        );
        let heading = organisms[i].heading as f64;
        organisms[i].velocity.0 += (response.thrust * heading.cos()) as f32 + flow_sample.0;
        organisms[i].velocity.1 += (response.thrust * heading.sin()) as f32 + flow_sample.1;

        let max_speed = config.max_speed
            * (1.0 + organisms[i].capabilities().actuator_weight as f64 * 0.1).min(2.0);
        let speed = (organisms[i].velocity.0 as f64).hypot(organisms[i].velocity.1 as f64);
        if speed > max_speed && speed > 0.0 {
            let scale = (max_speed / speed) as f32;
            organisms[i].velocity.0 *= scale;
            organisms[i].velocity.1 *= scale;
        }

        organisms[i].active_thrust = response.thrust.abs() as f32;
        organisms[i].desire_angle = out.desire_angle;
        organisms[i].desire_distance = out.desire_distance;
        organisms[i].attack_intent = out.attack_intent;
        organisms[i].breed_intent = out.breed_intent;
        organisms[i].eat_intent = out.eat_intent;
        organisms[i].glow_intent = out.glow_intent;
    }

    failures
}

fn compose_inputs(
    task: &Task,
    vision: &PolarVision,
    flow_sample: (f32, f32),
    shadow: &ShadowMap,
    config: &SimConfig,
) -> [f32; N_IN] {
    let mut v = [0.0f32; N_IN];

    // self-state (2)
    v[0] = task.energy_ratio;
    v[1] = 0.0; // speed is written back onto the organism post-apply; unused pre-think

    // body descriptor (6)
    v[2] = (task.capabilities.photo_weight / 16.0).clamp(0.0, 1.0);
    v[3] = (task.capabilities.actuator_weight / 16.0).clamp(0.0, 1.0);
    v[4] = (task.capabilities.structural_armor / 16.0).clamp(0.0, 1.0);
    v[5] = (task.capabilities.mouth_size / 16.0).clamp(0.0, 1.0);
    v[6] = task.capabilities.digestive_spectrum;
    v[7] = task.capabilities.composition;

    // polar fields (17)
    let mean = |s: &[f32]| s.iter().sum::<f32>() / s.len().max(1) as f32;
    let max = |s: &[f32]| s.iter().cloned().fold(0.0f32, f32::max);
    v[8] = mean(vision.plant_mass());
    v[9] = mean(vision.meat_mass());
    v[10] = mean(vision.threat_intensity());
    v[11] = mean(vision.kin_density());
    v[12] = mean(vision.emitted_light());
    v[13] = max(vision.plant_mass());
    v[14] = max(vision.meat_mass());
    v[15] = max(vision.threat_intensity());
    v[16] = max(vision.kin_density());
    v[17] = max(vision.emitted_light());
    v[18] = nearest_dist_norm(vision.nearest_plant, task.position, config.sensing_radius);
    v[19] = nearest_dist_norm(vision.nearest_meat, task.position, config.sensing_radius);
    v[20] = nearest_dist_norm(vision.nearest_threat, task.position, config.sensing_radius);
    v[21] = vision.light_gradient.0;
    v[22] = vision.light_gradient.1;
    v[23] = flow_alignment(task.heading, flow_sample);
    v[24] = shadow.sample(task.position.0, task.position.1);

    // approach bearings (4)
    v[25] = bearing_norm(vision.nearest_plant, task.position, task.heading);
    v[26] = bearing_norm(vision.nearest_meat, task.position, task.heading);
    v[27] = bearing_norm(vision.nearest_threat, task.position, task.heading);
    v[28] = (flow_sample.1.atan2(flow_sample.0) as f64 - task.heading) as f32
        / std::f32::consts::PI;

    // bias (1)
    v[29] = 1.0;

    for x in &mut v {
        if !x.is_finite() {
            *x = 0.0;
        }
    }
    v
}

fn nearest_dist_norm(nearest: Option<(f64, f64)>, from: (f64, f64), radius: f64) -> f32 {
    match nearest {
        Some(p) => {
            let (dx, dy) = (p.0 - from.0, p.1 - from.1);
            (1.0 - (dx * dx + dy * dy).sqrt() / radius.max(1e-9)).clamp(0.0, 1.0) as f32
        }
        None => 0.0,
    }
}

fn bearing_norm(nearest: Option<(f64, f64)>, from: (f64, f64), heading: f64) -> f32 {
    match nearest {
        Some(p) => {
            let bearing = (p.1 - from.1).atan2(p.0 - from.0);
            (toroidal::angle_delta(heading, bearing) / std::f64::consts::PI) as f32
        }
        None => 0.0,
    }
}

fn flow_alignment(heading: f64, flow: (f32, f32)) -> f32 {
    let flow_angle = (flow.1 as f64).atan2(flow.0 as f64);
    (toroidal::angle_delta(heading, flow_angle) / std::f64::consts::PI) as f32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::brain::N_OUT;
    use crate::cell::{Cell, CellVec};
    use crate::organism::Gender;
    use crate::pathfinder::NoTerrain;

    struct ZeroBrain;
    impl Brain for ZeroBrain {
        fn think(&self, _inputs: &[f32; N_IN]) -> Result<[f32; N_OUT], BrainError> {
            Ok([0.0; N_OUT])
        }
    }

    #[test]
    fn dead_organisms_drift_without_calling_the_brain() {
        let cfg = SimConfig::default();
        let mut cells = CellVec::new();
        cells.push(Cell::new((0, 0)));
        let mut organism = Organism::new((10.0, 10.0), 0.0, cells, 1, Gender::Female);
        organism.kill(0);
        let mut organisms = vec![organism];
        let positions = vec![(10.0_f64, 10.0_f64)];
        let brains: Vec<Box<dyn Brain>> = vec![Box::new(ZeroBrain)];
        let grid = SpatialGrid::new(cfg.world_width, cfg.world_height, cfg.spatial_cell_size);
        let flora = FloraSystem::new(&cfg);
        let flow = crate::flow::FlowField::new(4, 4, &cfg, 1);
        let shadow = ShadowMap::new(&cfg);
        step(
            &mut organisms,
            &positions,
            &brains,
            &grid,
            &flora,
            &flow,
            &shadow,
            &NoTerrain,
            &cfg,
        );
        assert!(organisms[0].dead);
    }

    #[test]
    fn live_organism_updates_heading_and_velocity_from_brain_output() {
        let cfg = SimConfig::default();
        let mut cells = CellVec::new();
        let mut c = Cell::new((0, 0));
        c.actuator = 1.0;
        cells.push(c);
        let organism = Organism::new((100.0, 100.0), 0.0, cells, 1, Gender::Female);
        let mut organisms = vec![organism];
        let positions = vec![(100.0_f64, 100.0_f64)];
        let brains: Vec<Box<dyn Brain>> = vec![Box::new(ZeroBrain)];
        let mut grid = SpatialGrid::new(cfg.world_width, cfg.world_height, cfg.spatial_cell_size);
        grid.rebuild(&positions, |_| true);
        let flora = FloraSystem::new(&cfg);
        let flow = crate::flow::FlowField::new(4, 4, &cfg, 1);
        let shadow = ShadowMap::new(&cfg);
        step(
            &mut organisms,
            &positions,
            &brains,
            &grid,
            &flora,
            &flow,
            &shadow,
            &NoTerrain,
            &cfg,
        );
        assert!(organisms[0].position.0.is_finite());
    }
}
