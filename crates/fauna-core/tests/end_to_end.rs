//! Crate-level end-to-end scenarios, each exercising several modules
//! together through their public API rather than a single unit.

use fauna_core::arbiter;
use fauna_core::cell::{Cell, CellVec};
use fauna_core::config::SimConfig;
use fauna_core::organism::{AllocationMode, Gender, Organism};
use fauna_core::pathfinder::{navigate, NoTerrain, TerrainQuerier};
use fauna_core::resource::ResourceField;
use rand::SeedableRng;
use rand_chacha::ChaCha12Rng;

fn scenario_config() -> SimConfig {
    SimConfig {
        world_width: 1280.0,
        world_height: 720.0,
        resource_grid_width: 64,
        resource_grid_height: 64,
        flow_grid_width: 32,
        flow_grid_height: 32,
        spawn_rate: 0.0,
        seed: 42,
        ..SimConfig::default()
    }
}

#[test]
fn mass_conservation_under_grazing() {
    let cfg = scenario_config();
    let mut field = ResourceField::new(&cfg, cfg.seed);
    let mut rng = ChaCha12Rng::seed_from_u64(cfg.seed);

    let initial_total = field.total_mass();
    let mut removed_total = 0.0f64;
    for _ in 0..100 {
        field.step(1.0 / 60.0, true, &mut rng);
        removed_total += field.graze(640.0, 360.0, 0.5, 1.0 / 60.0, 1.0) as f64;
    }
    let final_total = field.total_mass();

    assert!(
        ((initial_total - final_total) - removed_total).abs() < 1e-3 * initial_total.max(1.0),
        "initial={initial_total} final={final_total} removed={removed_total}"
    );
}

#[test]
fn detritus_decay_accounting() {
    let cfg = SimConfig {
        detritus_decay_rate: 0.05,
        detritus_decay_efficiency: 0.8,
        ..scenario_config()
    };
    let mut field = ResourceField::new(&cfg, cfg.seed);
    let mut rng = ChaCha12Rng::seed_from_u64(cfg.seed);
    field.deposit_detritus(640.0, 360.0, 10.0);

    for _ in 0..60 {
        field.step(1.0 / 60.0, false, &mut rng);
    }

    let res_total: f64 = field.res_data().iter().map(|&v| v as f64).sum();
    let det_total: f64 = field.det_data().iter().map(|&v| v as f64).sum();
    let heat = field.total_heat as f64;

    assert!(
        (res_total + heat - (10.0 - det_total)).abs() < 1e-2,
        "res={res_total} det={det_total} heat={heat}"
    );
}

#[test]
fn breeding_deterministic_midpoint() {
    let cfg = scenario_config();
    let mut rng = ChaCha12Rng::seed_from_u64(cfg.seed);

    let mut parent_cells = || {
        let mut cells = CellVec::new();
        let mut c = Cell::new((0, 0));
        c.reproductive = 1.0;
        c.mouth = 1.0;
        cells.push(c);
        cells
    };
    let mut organisms = vec![
        Organism::new((100.0, 100.0), 0.0, parent_cells(), 3, Gender::Female),
        Organism::new((140.0, 140.0), 0.0, parent_cells(), 3, Gender::Male),
    ];
    for o in &mut organisms {
        o.allocation_mode = AllocationMode::Breed;
        o.set_energy(o.max_energy());
    }

    fauna_core::breeding::run_tick(&mut organisms, &cfg, &mut rng);

    assert_eq!(organisms.len(), 3);
    let child = &organisms[2];
    assert!((child.position.0 - 120.0).abs() < 1e-4);
    assert!((child.position.1 - 120.0).abs() < 1e-4);
    assert_eq!(child.energy(), cfg.breeding_offspring_energy);
    assert_eq!(organisms[0].breeding_cooldown, cfg.breeding_cooldown_ticks);
    assert_eq!(organisms[1].breeding_cooldown, cfg.breeding_cooldown_ticks);
}

#[test]
fn allocation_arbiter_decision_table() {
    assert_eq!(arbiter::decide(0.15, true, 0), AllocationMode::Survive);
    assert_eq!(arbiter::decide(0.15, false, 0), AllocationMode::Survive);
    assert_eq!(arbiter::decide(0.80, false, 0), AllocationMode::Breed);
    assert_eq!(arbiter::decide(0.50, false, 10), AllocationMode::Store);
}

struct SolidBelow {
    y: f64,
}

impl TerrainQuerier for SolidBelow {
    fn query(&self, _x: f64, y: f64) -> Option<(f64, (f64, f64))> {
        if y >= self.y {
            Some((0.0, (0.0, -1.0)))
        } else {
            Some((self.y - y, (0.0, -1.0)))
        }
    }
}

#[test]
fn pathfinder_obstacle_avoidance() {
    let cfg = scenario_config();
    let open = navigate((100.0, 80.0), std::f64::consts::FRAC_PI_2, 0.0, 1.0, (0.0, 0.0), &cfg, &NoTerrain);
    assert!((open.thrust - 1.0).abs() < 1e-6);

    let blocked = navigate(
        (100.0, 80.0),
        std::f64::consts::FRAC_PI_2,
        0.0,
        1.0,
        (0.0, 0.0),
        &cfg,
        &SolidBelow { y: 100.0 },
    );
    assert!(blocked.thrust < 0.95 || blocked.turn.abs() >= 0.01);
}
