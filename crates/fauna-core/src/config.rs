//! `SimConfig`: the single validated, serializable parameter struct covering
//! every recognized tunable. Loading this from YAML/JSON is a host concern;
//! this crate only owns the typed, validated target and the `validate()`
//! gate construction must pass through.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub seed: u64,
    pub dt: f64,

    // world.*
    pub world_width: f64,
    pub world_height: f64,

    // potential.*
    pub potential_scale: f64,
    pub potential_octaves: u32,
    pub potential_lacunarity: f64,
    pub potential_gain: f64,
    pub potential_contrast: f64,
    pub potential_drift_x: f64,
    pub potential_drift_y: f64,
    pub potential_update_sec: f64,

    // particles.*
    pub particles_max_count: usize,
    pub flow_grid_width: usize,
    pub flow_grid_height: usize,
    pub flow_scale: f64,
    pub flow_octaves: u32,
    pub flow_evolution: f64,
    pub flow_strength: f64,
    pub flow_update_sec: f64,
    pub spawn_rate: f32,
    pub deposit_rate: f32,
    pub pickup_rate: f32,
    pub initial_mass: f32,
    pub cell_capacity: f32,

    // resource grid shape, required to construct `ResourceField`;
    // independent of the flow grid's resolution
    pub resource_grid_width: usize,
    pub resource_grid_height: usize,

    // detritus.*
    pub detritus_decay_rate: f32,
    pub detritus_decay_efficiency: f32,

    // capabilities.*
    pub max_speed: f64,
    pub max_accel: f64,
    pub max_turn_rate: f64,
    pub drag: f64,
    pub bite_range: f64,
    pub min_effectiveness: f32,

    // energy.*
    pub feeding_efficiency: f32,
    pub carrion_ttl_ticks: u16,

    // spatial grid
    pub spatial_cell_size: f64,
    pub max_query_results: usize,

    // sensing / vision
    pub sensing_radius: f64,
    pub vision_cones: usize,
    pub vision_radial_bins: usize,

    // flora
    pub max_flora: usize,
    pub flora_base_energy_rate: f32,
    pub flora_flow_force: f32,
    pub flora_drag: f32,
    pub flora_max_speed: f32,
    pub flora_spore_interval: i32,
    pub flora_collision_speed_threshold: f32,

    // pathfinder
    pub pathfinder_max_target_dist: f64,
    pub pathfinder_max_force: f64,
    pub pathfinder_deadzone: f64,
    pub pathfinder_flow_influence: f64,
    pub pathfinder_min_thrust: f64,
    pub pathfinder_obstacle_falloff: f64,

    // actuator
    pub actuator_thrust_mul: f64,
    pub actuator_turn_scale: f64,
    pub actuator_default_turn_scale: f64,

    // feeding
    pub feeding_distance: f64,
    pub attack_base_range: f64,
    pub attack_cooldown_ticks: u16,
    pub max_crowd_penalty: f32,
    pub kin_avoidance_probability: f32,
    pub compat_k: f32,

    // breeding
    pub breeding_distance: f64,
    pub breeding_cooldown_ticks: u16,
    pub breeding_energy_fraction: f32,
    pub breeding_energy_cost: f32,
    pub breeding_offspring_energy: f32,

    // lighting / day-night
    pub shadow_grid_width: usize,
    pub shadow_grid_height: usize,
    pub day_length_ticks: u32,
    pub ambient_light_min: f32,
    pub ambient_light_max: f32,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            dt: 1.0 / 60.0,

            world_width: 1280.0,
            world_height: 720.0,

            potential_scale: 0.01,
            potential_octaves: 4,
            potential_lacunarity: 2.0,
            potential_gain: 0.5,
            potential_contrast: 1.5,
            potential_drift_x: 0.02,
            potential_drift_y: 0.015,
            potential_update_sec: 10.0,

            particles_max_count: 4096,
            flow_grid_width: 64,
            flow_grid_height: 64,
            flow_scale: 0.02,
            flow_octaves: 3,
            flow_evolution: 0.05,
            flow_strength: 0.1,
            flow_update_sec: 4.0,
            spawn_rate: 20.0,
            deposit_rate: 0.5,
            pickup_rate: 0.3,
            initial_mass: 1.0,
            cell_capacity: 0.0,

            resource_grid_width: 64,
            resource_grid_height: 64,

            detritus_decay_rate: 0.05,
            detritus_decay_efficiency: 0.8,

            max_speed: 3.0,
            max_accel: 1.0,
            max_turn_rate: 0.2,
            drag: 0.02,
            bite_range: 4.0,
            min_effectiveness: 0.05,

            feeding_efficiency: 0.7,
            carrion_ttl_ticks: 0,

            spatial_cell_size: 20.0,
            max_query_results: 128,

            sensing_radius: 60.0,
            vision_cones: 12,
            vision_radial_bins: 3,

            max_flora: 2048,
            flora_base_energy_rate: 0.05,
            flora_flow_force: 0.3,
            flora_drag: 0.97,
            flora_max_speed: 1.0,
            flora_spore_interval: 600,
            flora_collision_speed_threshold: 1.5,

            pathfinder_max_target_dist: 80.0,
            pathfinder_max_force: 2.0,
            pathfinder_deadzone: 2.0,
            pathfinder_flow_influence: 0.5,
            pathfinder_min_thrust: 0.05,
            pathfinder_obstacle_falloff: 2.0,

            actuator_thrust_mul: 1.0,
            actuator_turn_scale: 1.0,
            actuator_default_turn_scale: 1.0,

            feeding_distance: 6.0,
            attack_base_range: 5.0,
            attack_cooldown_ticks: 30,
            max_crowd_penalty: 0.7,
            kin_avoidance_probability: 0.92,
            compat_k: 3.0,

            breeding_distance: 60.0,
            breeding_cooldown_ticks: 180,
            breeding_energy_fraction: 0.35,
            breeding_energy_cost: 20.0,
            breeding_offspring_energy: 50.0,

            shadow_grid_width: 32,
            shadow_grid_height: 32,
            day_length_ticks: 3600,
            ambient_light_min: 0.1,
            ambient_light_max: 1.0,
        }
    }
}

impl SimConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.world_width <= 0.0 || self.world_height <= 0.0 {
            return Err(ConfigError::NonPositiveWorldSize {
                width: self.world_width,
                height: self.world_height,
            });
        }
        let positive_usize = [
            ("particles.max_count", self.particles_max_count),
            ("particles.flow_grid_size (width)", self.flow_grid_width),
            ("particles.flow_grid_size (height)", self.flow_grid_height),
            ("resource_grid_width", self.resource_grid_width),
            ("resource_grid_height", self.resource_grid_height),
            ("max_flora", self.max_flora),
            ("shadow_grid_width", self.shadow_grid_width),
            ("shadow_grid_height", self.shadow_grid_height),
        ];
        for (label, value) in positive_usize {
            if value == 0 {
                return Err(ConfigError::NonPositiveGrid {
                    label,
                    value: value as i64,
                });
            }
        }
        let non_negative_rates: [(&'static str, f64); 10] = [
            ("particles.spawn_rate", self.spawn_rate as f64),
            ("particles.deposit_rate", self.deposit_rate as f64),
            ("particles.pickup_rate", self.pickup_rate as f64),
            ("particles.initial_mass", self.initial_mass as f64),
            ("detritus.decay_rate", self.detritus_decay_rate as f64),
            ("capabilities.max_speed", self.max_speed),
            ("capabilities.max_accel", self.max_accel),
            ("capabilities.drag", self.drag),
            ("capabilities.bite_range", self.bite_range),
            ("spatial_cell_size", self.spatial_cell_size),
        ];
        for (label, value) in non_negative_rates {
            if value < 0.0 {
                return Err(ConfigError::NegativeRate { label, value });
            }
        }
        if self.cell_capacity < 0.0 {
            return Err(ConfigError::EmptyCellCapacity);
        }
        let unit_ranges: [(&'static str, f32); 4] = [
            ("capabilities.min_effectiveness", self.min_effectiveness),
            ("energy.feeding_efficiency", self.feeding_efficiency),
            ("detritus.decay_efficiency", self.detritus_decay_efficiency),
            ("kin_avoidance_probability", self.kin_avoidance_probability),
        ];
        for (label, value) in unit_ranges {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::InvalidRange { label, value });
            }
        }
        if self.dt <= 0.0 {
            return Err(ConfigError::NegativeRate {
                label: "dt",
                value: self.dt,
            });
        }
        Ok(())
    }
}
