//! `World`: the tick orchestrator tying every module together into a fixed
//! eleven-phase sequence. Nothing outside this module decides phase order.

pub mod metrics;

use crate::arbiter;
use crate::behavior;
use crate::breeding;
use crate::brain::Brain;
use crate::cell::CellVec;
use crate::config::SimConfig;
use crate::energy;
use crate::error::ConfigError;
use crate::feeding;
use crate::flora::{Flora, FloraSystem};
use crate::genome::{Genome, MutationRates};
use crate::organism::{Gender, Organism};
use crate::pathfinder::{NoTerrain, TerrainQuerier};
use crate::resource::ResourceField;
use crate::shadow::ShadowMap;
use crate::spatial::{Neighbor, SpatialGrid};
use rand::SeedableRng;
use rand_chacha::ChaCha12Rng;
use std::sync::Arc;

pub use metrics::TickTelemetry;

/// Herbivore-leaning organisms also graze the ambient resource field
/// directly, not just flora. Grazing radius is in resource-grid cells.
const AMBIENT_GRAZE_RADIUS: f64 = 1.0;
const AMBIENT_GRAZE_RATE_PER_MOUTH: f32 = 0.5;

/// Produces a `Brain` from a `Genome`; supplied by the host at construction
/// time.
pub type BrainFactory = Arc<dyn Fn(&Genome) -> Box<dyn Brain> + Send + Sync>;

/// The whole simulated world: fauna, flora, the shared food/flow fields, and
/// everything needed to advance them one tick at a time.
pub struct World {
    config: SimConfig,

    organisms: Vec<Organism>,
    genomes: Vec<Genome>,
    brains: Vec<Box<dyn Brain>>,

    flora: FloraSystem,
    resource: ResourceField,
    spatial: SpatialGrid,
    shadow: ShadowMap,
    terrain: Box<dyn TerrainQuerier>,

    rng: ChaCha12Rng,
    new_brain: BrainFactory,
    mutation_rates: MutationRates,

    step_index: u64,
    telemetry: TickTelemetry,
}

impl World {
    /// Builds an empty world from a validated config. `new_brain` is called
    /// once per spawned or bred organism to materialize its `Brain` from its
    /// `Genome`.
    pub fn new<F>(config: SimConfig, new_brain: F) -> Result<Self, ConfigError>
    where
        F: Fn(&Genome) -> Box<dyn Brain> + Send + Sync + 'static,
    {
        config.validate()?;
        let seed = config.seed;
        Ok(Self {
            rng: ChaCha12Rng::seed_from_u64(seed),
            flora: FloraSystem::new(&config),
            resource: ResourceField::new(&config, seed),
            spatial: SpatialGrid::new(config.world_width, config.world_height, config.spatial_cell_size),
            shadow: ShadowMap::new(&config),
            terrain: Box::new(NoTerrain),
            organisms: Vec::new(),
            genomes: Vec::new(),
            brains: Vec::new(),
            new_brain: Arc::new(new_brain),
            mutation_rates: MutationRates::default(),
            step_index: 0,
            telemetry: TickTelemetry::default(),
            config,
        })
    }

    /// Replaces the terrain queried by the pathfinder (default: none).
    pub fn with_terrain(mut self, terrain: Box<dyn TerrainQuerier>) -> Self {
        self.terrain = terrain;
        self
    }

    pub fn with_mutation_rates(mut self, rates: MutationRates) -> Self {
        self.mutation_rates = rates;
        self
    }

    /// Adds a fauna individual with its own genome, materializing a `Brain`
    /// for it via the world's brain factory. Returns its index.
    pub fn spawn_organism(
        &mut self,
        position: (f32, f32),
        heading: f32,
        cells: CellVec,
        species_id: u32,
        gender: Gender,
        genome: Genome,
    ) -> usize {
        let brain = (self.new_brain)(&genome);
        self.organisms.push(Organism::new(position, heading, cells, species_id, gender));
        self.genomes.push(genome);
        self.brains.push(brain);
        self.organisms.len() - 1
    }

    /// Adds a flora body; returns `false` if `max_flora` capacity is reached.
    pub fn spawn_flora(&mut self, flora: Flora) -> bool {
        self.flora.spawn(flora)
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn organisms(&self) -> &[Organism] {
        &self.organisms
    }

    pub fn flora(&self) -> &FloraSystem {
        &self.flora
    }

    pub fn resource(&self) -> &ResourceField {
        &self.resource
    }

    pub fn shadow(&self) -> &ShadowMap {
        &self.shadow
    }

    pub fn step_index(&self) -> u64 {
        self.step_index
    }

    pub fn telemetry(&self) -> TickTelemetry {
        self.telemetry
    }

    /// Advances the world by one tick, in a fixed phase order: day/night +
    /// shadows, fields, spatial index, flora, allocation, behavior, physics,
    /// feeding, energy, breeding, cleanup.
    pub fn step(&mut self) {
        self.telemetry.begin_tick();
        self.telemetry.step_index = self.step_index;

        let positions: Vec<(f64, f64)> = self
            .organisms
            .iter()
            .map(|o| (o.position.0 as f64, o.position.1 as f64))
            .collect();

        self.rebuild_shadow(&positions);

        self.resource.step(self.config.dt, true, &mut self.rng);
        self.telemetry.particle_input_this_tick = self.resource.particle_input_this_tick;
        self.telemetry.detritus_heat_this_tick = self.resource.detritus_heat_this_tick;
        self.telemetry.dropped_spawn_count = self.resource.dropped_spawn_count;

        self.spatial.rebuild(&positions, |idx| !self.organisms[idx].dead);

        let flow = self.resource.flow();
        let mut spores: Vec<(f32, f32)> = Vec::new();
        self.flora.update(flow, |x, y| spores.push((x, y)));
        for (x, y) in spores {
            let size = 1.0;
            self.flora.spawn(Flora::new((x, y), 80.0, size));
        }

        self.run_allocation_arbiter(&positions);

        let brain_failures = behavior::step(
            &mut self.organisms,
            &positions,
            &self.brains,
            &self.spatial,
            &self.flora,
            self.resource.flow(),
            &self.shadow,
            self.terrain.as_ref(),
            &self.config,
        );
        self.telemetry.brain_failures_this_tick = brain_failures as u32;

        self.run_physics();

        feeding::run_tick(
            &mut self.organisms,
            &positions,
            &self.spatial,
            &mut self.flora,
            &self.config,
            &mut self.rng,
        );

        self.run_energy();

        self.run_breeding();

        self.run_cleanup();

        self.telemetry.live_organism_count =
            self.organisms.iter().filter(|o| !o.dead).count() as u32;
        self.telemetry.flora_count = self.flora.len() as u32;

        self.step_index += 1;
    }

    fn rebuild_shadow(&mut self, positions: &[(f64, f64)]) {
        let occluders: Vec<(f64, f64, f32)> = self
            .organisms
            .iter()
            .zip(positions.iter())
            .filter(|(o, _)| !o.dead)
            .filter_map(|(o, &(x, y))| {
                let armor = o.capabilities().structural_armor;
                (armor > 0.0).then_some((x, y, (armor / 8.0).min(1.0)))
            })
            .collect();
        let emitters: Vec<(f64, f64, f32)> = self
            .organisms
            .iter()
            .zip(positions.iter())
            .filter(|(o, _)| !o.dead && o.glow_intent > 0.5)
            .filter_map(|(o, &(x, y))| {
                let glow = o.capabilities().bioluminescent_weight;
                (glow > 0.0).then_some((x, y, (glow / 4.0).min(1.0) * o.glow_intent))
            })
            .collect();
        self.shadow.rebuild(
            self.step_index as usize,
            occluders.into_iter(),
            emitters.into_iter(),
        );
    }

    /// Decides each organism's survive/breed/store mode from its energy and
    /// nearby threats.
    fn run_allocation_arbiter(&mut self, positions: &[(f64, f64)]) {
        let mut neighbor_buf: Vec<Neighbor> = Vec::new();
        let perception_radius = self.config.sensing_radius;
        for i in 0..self.organisms.len() {
            if self.organisms[i].dead {
                continue;
            }
            let (x, y) = positions[i];
            let self_caps = self.organisms[i].capabilities();
            let self_energy_ratio = self.organisms[i].energy_ratio();
            let self_cell_count = self.organisms[i].cell_count();

            neighbor_buf.clear();
            self.spatial.query_into(
                &mut neighbor_buf,
                x,
                y,
                perception_radius * 2.0,
                i as u32,
                positions,
            );
            if neighbor_buf.len() >= SpatialGrid::MAX_QUERY_RESULTS {
                self.telemetry.query_overflow_count += 1;
            }

            let threat_nearby = neighbor_buf.iter().any(|n| {
                let Some(other) = self.organisms.get(n.entity as usize) else {
                    return false;
                };
                if other.dead {
                    return false;
                }
                let other_caps = other.capabilities();
                arbiter::is_threat(
                    self_energy_ratio,
                    self_cell_count,
                    self_caps.structural_armor,
                    n.dist_sq.sqrt(),
                    perception_radius,
                    other.cell_count(),
                    other.attack_intent,
                    other_caps.structural_armor,
                )
            });

            self.organisms[i].allocation_mode = arbiter::decide(
                self_energy_ratio,
                threat_nearby,
                self.organisms[i].breeding_cooldown,
            );
        }
    }

    fn run_physics(&mut self) {
        let mut nan_count = 0u32;
        for organism in self.organisms.iter_mut() {
            if organism.dead {
                continue;
            }
            if !organism.position.0.is_finite()
                || !organism.position.1.is_finite()
                || !organism.velocity.0.is_finite()
                || !organism.velocity.1.is_finite()
            {
                nan_count += 1;
            }
            let armor = organism.capabilities().structural_armor;
            crate::physics::step_live(organism, armor, &self.config);
        }
        self.telemetry.nan_corrections_this_tick = nan_count;
    }

    /// Photosynthesis/ambient grazing/movement upkeep, then death. Herbivore-leaning organisms also graze the shared resource
    /// field directly at their post-physics position.
    fn run_energy(&mut self) {
        for organism in self.organisms.iter_mut() {
            if organism.dead {
                continue;
            }
            let caps = organism.capabilities();
            if caps.digestive_spectrum < 0.7 && caps.mouth_size > 0.0 {
                energy::graze(
                    organism,
                    &mut self.resource,
                    caps.mouth_size * AMBIENT_GRAZE_RATE_PER_MOUTH,
                    self.config.dt,
                    AMBIENT_GRAZE_RADIUS,
                );
            }
            let light = self
                .shadow
                .sample(organism.position.0 as f64, organism.position.1 as f64);
            energy::step(organism, light, &self.config);
        }
    }

    /// Pairs eligible organisms and gives each offspring a crossed-over,
    /// mutated genome and a freshly built brain, keeping `organisms`,
    /// `genomes`, and `brains` in lockstep.
    fn run_breeding(&mut self) {
        let parents = breeding::run_tick(&mut self.organisms, &self.config, &mut self.rng);
        for (a, b) in parents {
            let mut genome = Genome::crossover(&self.genomes[a], &self.genomes[b], &mut self.rng);
            genome.mutate(&mut self.rng, &self.mutation_rates);
            let brain = (self.new_brain)(&genome);
            self.genomes.push(genome);
            self.brains.push(brain);
        }
        debug_assert_eq!(self.organisms.len(), self.genomes.len());
        debug_assert_eq!(self.organisms.len(), self.brains.len());
    }

    /// Removes fauna whose carrion window has expired, compacting
    /// `organisms`, `genomes`, and `brains` together.
    fn run_cleanup(&mut self) {
        let keep: Vec<bool> = self
            .organisms
            .iter_mut()
            .map(|o| !(o.dead && o.tick_carrion()))
            .collect();
        let mut i = 0;
        self.organisms.retain(|_| {
            let k = keep[i];
            i += 1;
            k
        });
        let mut i = 0;
        self.genomes.retain(|_| {
            let k = keep[i];
            i += 1;
            k
        });
        let mut i = 0;
        self.brains.retain(|_| {
            let k = keep[i];
            i += 1;
            k
        });
    }
}
