use fauna_core::brain::NeuralNet;
use fauna_core::cell::{Cell, CellVec};
use fauna_core::genome::Genome;
use fauna_core::organism::Gender;
use fauna_core::{SimConfig, World};
use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha12Rng;
use std::time::Instant;

fn herbivore_cells() -> CellVec {
    let mut cells = CellVec::new();
    let mut head = Cell::new((0, 0));
    head.mouth = 1.0;
    head.sensor = 1.0;
    head.actuator = 1.0;
    cells.push(head);
    let mut tail = Cell::new((-1, 0));
    tail.digestive = 0.2;
    tail.reproductive = 1.0;
    cells.push(tail);
    cells
}

fn populate(world: &mut World, population: usize, rng: &mut ChaCha12Rng) {
    let (width, height) = (world.config().world_width, world.config().world_height);
    for i in 0..population {
        let position = (
            (rng.random::<f64>() * width) as f32,
            (rng.random::<f64>() * height) as f32,
        );
        let heading = rng.random::<f32>() * std::f32::consts::TAU;
        let gender = if i % 2 == 0 { Gender::Female } else { Gender::Male };
        let weights: Vec<f32> = (0..NeuralNet::WEIGHT_COUNT)
            .map(|_| rng.random::<f32>() * 2.0 - 1.0)
            .collect();
        world.spawn_organism(position, heading, herbivore_cells(), 1, gender, Genome::with_nn_weights(weights));
    }
}

fn main() {
    let population = 500;
    println!("Benchmarking a world of {population} organisms");

    let config = SimConfig {
        seed: 42,
        world_width: 1000.0,
        world_height: 1000.0,
        ..SimConfig::default()
    };

    let mut rng = ChaCha12Rng::seed_from_u64(config.seed);
    let mut world = World::new(config, |genome| Box::new(NeuralNet::from_genome(genome)))
        .expect("benchmark config should validate");
    populate(&mut world, population, &mut rng);

    let steps = 100;
    let start = Instant::now();
    for _ in 0..steps {
        world.step();
    }
    let elapsed = start.elapsed();

    println!("Ran {steps} ticks in {elapsed:?}");
    println!("Avg tick time: {:?}", elapsed / steps as u32);
    println!(
        "Live organisms at end: {}",
        world.organisms().iter().filter(|o| !o.dead).count()
    );
    println!("Telemetry at last tick: {:?}", world.telemetry());
}
