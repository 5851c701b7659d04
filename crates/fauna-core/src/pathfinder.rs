//! Potential-field navigator: turns a brain's `(desire_angle, desire_dist)`
//! into steering outputs.

use crate::config::SimConfig;

/// Returns a signed distance to the nearest obstacle surface at `(x, y)` and
/// its outward gradient, or `None` where there is no obstacle information.
/// Implementations are chosen at world construction and stay fixed
pub trait TerrainQuerier: Send + Sync {
    fn query(&self, x: f64, y: f64) -> Option<(f64, (f64, f64))>;
}

/// A world with no obstacles at all.
pub struct NoTerrain;

impl TerrainQuerier for NoTerrain {
    fn query(&self, _x: f64, _y: f64) -> Option<(f64, (f64, f64))> {
        None
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SteeringOutput {
    pub turn: f64,
    pub thrust: f64,
}

/// Resolves a desired heading/distance into a steering response, deflecting
/// around obstacles reported by `terrain`. `flow` is the ambient flow sample
/// at `pos`.
pub fn navigate(
    pos: (f64, f64),
    heading: f64,
    desire_angle: f64,
    desire_dist: f64,
    flow: (f64, f64),
    config: &SimConfig,
    terrain: &dyn TerrainQuerier,
) -> SteeringOutput {
    if terrain.query(pos.0, pos.1).is_none() || desire_dist < 0.01 {
        return SteeringOutput {
            turn: (desire_angle / std::f64::consts::PI).clamp(-1.0, 1.0),
            thrust: desire_dist,
        };
    }

    let target_angle = heading + desire_angle;
    let target_dist = config.pathfinder_max_target_dist * desire_dist;
    let target = (
        pos.0 + target_angle.cos() * target_dist,
        pos.1 + target_angle.sin() * target_dist,
    );

    let to_target = (target.0 - pos.0, target.1 - pos.1);
    let dist_to_target = (to_target.0 * to_target.0 + to_target.1 * to_target.1).sqrt();
    let taper = if dist_to_target < config.pathfinder_deadzone {
        dist_to_target / config.pathfinder_deadzone.max(1e-9)
    } else {
        1.0
    };
    let attraction = if dist_to_target > 1e-9 {
        (
            to_target.0 / dist_to_target * taper,
            to_target.1 / dist_to_target * taper,
        )
    } else {
        (0.0, 0.0)
    };

    let mut repulsion = (0.0, 0.0);
    if let Some((signed_dist, gradient)) = terrain.query(pos.0, pos.1) {
        if signed_dist < config.sensing_radius {
            let strength = ((config.sensing_radius - signed_dist) / config.sensing_radius)
                .max(0.0)
                .powf(config.pathfinder_obstacle_falloff);
            repulsion.0 += gradient.0 * strength;
            repulsion.1 += gradient.1 * strength;
        }
    }
    const PERIMETER_PROBES: usize = 8;
    for i in 0..PERIMETER_PROBES {
        let theta = (i as f64 / PERIMETER_PROBES as f64) * std::f64::consts::TAU;
        let probe = (
            pos.0 + theta.cos() * config.sensing_radius,
            pos.1 + theta.sin() * config.sensing_radius,
        );
        if let Some((signed_dist, _)) = terrain.query(probe.0, probe.1) {
            if signed_dist < config.sensing_radius {
                let strength = ((config.sensing_radius - signed_dist) / config.sensing_radius)
                    .max(0.0)
                    .powf(config.pathfinder_obstacle_falloff);
                repulsion.0 += -theta.cos() * strength;
                repulsion.1 += -theta.sin() * strength;
            }
        }
    }

    let mut force = (
        attraction.0 + repulsion.0 + config.pathfinder_flow_influence * flow.0,
        attraction.1 + repulsion.1 + config.pathfinder_flow_influence * flow.1,
    );
    let magnitude = (force.0 * force.0 + force.1 * force.1).sqrt();
    if magnitude > config.pathfinder_max_force && magnitude > 0.0 {
        let scale = config.pathfinder_max_force / magnitude;
        force.0 *= scale;
        force.1 *= scale;
    }
    let magnitude = magnitude.min(config.pathfinder_max_force);

    let force_angle = force.1.atan2(force.0);
    let angle_diff = crate::toroidal::angle_delta(heading, force_angle);
    let turn = (angle_diff / std::f64::consts::PI).clamp(-config.max_turn_rate, config.max_turn_rate);

    let mut thrust = (magnitude / config.pathfinder_max_force.max(1e-9))
        * desire_dist
        * angle_diff.cos().max(0.0);
    if desire_dist > 0.01 {
        thrust = thrust.max(config.pathfinder_min_thrust);
    }

    SteeringOutput { turn, thrust }
}

#[cfg(test)]
mod tests {
    use super::*;

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
    fn passthrough_when_no_terrain_and_small_desire() {
        let cfg = SimConfig::default();
        let out = navigate((0.0, 0.0), 0.0, 0.5, 0.005, (0.0, 0.0), &cfg, &NoTerrain);
        assert!((out.thrust - 0.005).abs() < 1e-9);
    }

    #[test]
    fn obstacle_reduces_thrust_or_forces_a_turn() {
        let cfg = SimConfig::default();
        let terrain = SolidBelow { y: 100.0 };
        let out = navigate(
            (100.0, 80.0),
            std::f64::consts::FRAC_PI_2,
            0.0,
            1.0,
            (0.0, 0.0),
            &cfg,
            &terrain,
        );
        assert!(out.thrust < 0.95 || out.turn.abs() >= 0.01);
    }
}
