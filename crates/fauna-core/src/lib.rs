//! `fauna-core`: a real-time toroidal 2D artificial-life simulation. Owns the
//! fauna/flora/resource-field ecology and its per-tick orchestration; hosts
//! supply rendering, persistence, and the brain decision function itself.

pub mod actuator;
pub mod arbiter;
pub mod behavior;
pub mod breeding;
pub mod brain;
pub mod cell;
pub mod config;
pub mod energy;
pub mod error;
pub mod feeding;
pub mod flora;
pub mod flow;
pub mod genome;
pub mod grid;
pub mod noise_field;
pub mod organism;
pub mod pathfinder;
pub mod physics;
pub mod potential;
pub mod resource;
pub mod shadow;
pub mod spatial;
pub mod toroidal;
pub mod vision;
pub mod world;

pub use brain::Brain;
pub use config::SimConfig;
pub use error::{BrainError, ConfigError};
pub use genome::Genome;
pub use organism::Organism;
pub use world::{TickTelemetry, World};
