//! Actuator model: maps pathfinder `(turn, thrust)` into body-space
//! torque/thrust from cell geometry.

use crate::cell::CellVec;
use crate::config::SimConfig;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ActuatorResponse {
    pub thrust: f64,
    pub torque: f64,
}

/// `cells` supplies per-actuator-cell lateral offsets; with none, falls back
/// to a direct pass-through.
pub fn apply(heading: f64, turn: f64, thrust_output: f64, cells: &CellVec, config: &SimConfig) -> ActuatorResponse {
    let mut total_strength = 0.0f64;
    let mut torque_sum = 0.0f64;

    for cell in cells.iter().filter(|c| c.alive && c.actuator > 0.0) {
        let strength = cell.actuator as f64;
        let (gx, gy) = (cell.offset.0 as f64, cell.offset.1 as f64);
        let lateral = -gx * heading.sin() + gy * heading.cos();
        torque_sum += -lateral * turn * strength;
        total_strength += strength;
    }

    if total_strength <= 0.0 {
        return ActuatorResponse {
            thrust: thrust_output,
            torque: turn * config.actuator_default_turn_scale,
        };
    }

    ActuatorResponse {
        thrust: thrust_output * total_strength * config.actuator_thrust_mul,
        torque: (torque_sum / total_strength) * config.actuator_turn_scale,
    }
}
