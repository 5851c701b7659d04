//! Velocity integration, drag, and toroidal wrap. Heading is
//! state owned by Behavior, never derived here.

use crate::config::SimConfig;
use crate::organism::Organism;
use crate::toroidal;

const LIVE_DRAG_BASE: f64 = 0.98;
const LIVE_STREAMLINE_BONUS: f64 = 0.01;
const DEAD_DRAG: f64 = 0.90;
const DEAD_SPEED_SCALE: f64 = 0.5;

/// Advances one organism's position/velocity by one tick. `armor` feeds the
/// streamlining term: more armor, slightly more drag.
pub fn step_live(organism: &mut Organism, armor: f32, config: &SimConfig) {
    if organism.dead {
        return;
    }
    clamp_nan(organism);

    let max_speed = config.max_speed * (1.0 - (armor as f64 * 0.15).min(0.5));
    clamp_speed(&mut organism.velocity, max_speed);

    organism.position.0 += organism.velocity.0;
    organism.position.1 += organism.velocity.1;

    let friction = LIVE_DRAG_BASE - LIVE_STREAMLINE_BONUS * armor as f64;
    organism.velocity.0 *= friction as f32;
    organism.velocity.1 *= friction as f32;

    wrap_position(organism, config);
}

/// Dead-drift physics: reduced max speed, heavier friction, flow-only motion
/// applied upstream by the caller via `organism.velocity`.
pub fn step_dead(organism: &mut Organism, config: &SimConfig) {
    if !organism.dead {
        return;
    }
    clamp_nan(organism);
    clamp_speed(&mut organism.velocity, config.max_speed * DEAD_SPEED_SCALE);

    organism.position.0 += organism.velocity.0;
    organism.position.1 += organism.velocity.1;

    organism.velocity.0 *= DEAD_DRAG as f32;
    organism.velocity.1 *= DEAD_DRAG as f32;

    wrap_position(organism, config);
}

fn clamp_speed(velocity: &mut (f32, f32), max_speed: f64) {
    let speed = (velocity.0 as f64).hypot(velocity.1 as f64);
    if speed > max_speed && speed > 0.0 {
        let scale = (max_speed / speed) as f32;
        velocity.0 *= scale;
        velocity.1 *= scale;
    }
}

/// Non-finite position/velocity is clamped to zero and logged, never
/// propagated.
fn clamp_nan(organism: &mut Organism) {
    if !organism.position.0.is_finite() || !organism.position.1.is_finite() {
        log::warn!("organism position went non-finite; resetting to origin");
        organism.position = (0.0, 0.0);
    }
    if !organism.velocity.0.is_finite() || !organism.velocity.1.is_finite() {
        log::warn!("organism velocity went non-finite; zeroing");
        organism.velocity = (0.0, 0.0);
    }
}

fn wrap_position(organism: &mut Organism, config: &SimConfig) {
    organism.position.0 =
        toroidal::wrap_coord(organism.position.0 as f64, config.world_width) as f32;
    organism.position.1 =
        toroidal::wrap_coord(organism.position.1 as f64, config.world_height) as f32;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::Cell;
    use crate::cell::CellVec;
    use crate::organism::Gender;

    fn make_organism(pos: (f32, f32), vel: (f32, f32)) -> Organism {
        let mut cells = CellVec::new();
        cells.push(Cell::new((0, 0)));
        let mut o = Organism::new(pos, 0.0, cells, 1, Gender::Female);
        o.velocity = vel;
        o
    }

    #[test]
    fn position_stays_within_world_bounds_after_wrap() {
        let cfg = SimConfig::default();
        let mut o = make_organism((cfg.world_width as f32 - 1.0, 5.0), (10.0, 0.0));
        step_live(&mut o, 0.0, &cfg);
        assert!(o.position.0 >= 0.0 && (o.position.0 as f64) < cfg.world_width);
    }

    #[test]
    fn speed_is_clamped_to_effective_max() {
        let cfg = SimConfig::default();
        let mut o = make_organism((10.0, 10.0), (1000.0, 0.0));
        step_live(&mut o, 0.0, &cfg);
        let speed = (o.velocity.0 as f64).hypot(o.velocity.1 as f64);
        assert!(speed <= cfg.max_speed * (LIVE_DRAG_BASE));
    }

    #[test]
    fn nan_velocity_is_clamped_and_does_not_propagate() {
        let cfg = SimConfig::default();
        let mut o = make_organism((10.0, 10.0), (f32::NAN, 0.0));
        step_live(&mut o, 0.0, &cfg);
        assert!(o.position.0.is_finite());
        assert!(o.velocity.0.is_finite());
    }

    #[test]
    fn dead_organisms_do_not_move_via_step_live() {
        let cfg = SimConfig::default();
        let mut o = make_organism((10.0, 10.0), (5.0, 0.0));
        o.kill(0);
        let before = o.position;
        step_live(&mut o, 0.0, &cfg);
        assert_eq!(o.position, before);
    }
}
