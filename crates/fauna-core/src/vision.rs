//! `PolarVision`: per-agent angular scan packed into the brain's input
//! vector.

use crate::cell::Capabilities;
use crate::shadow::ShadowMap;
use crate::toroidal;
use std::f64::consts::TAU;

/// One sensed entity, already resolved to a world position and the channel
/// it contributes to.
#[derive(Clone, Copy, Debug)]
pub struct SensedEntity {
    pub position: (f64, f64),
    pub plant_mass: f32,
    pub meat_mass: f32,
    pub threat_intensity: f32,
    pub kin: bool,
    pub emitted_light: f32,
}

#[derive(Clone, Copy, Debug, Default)]
struct Cone {
    plant_mass: f32,
    meat_mass: f32,
    threat_intensity: f32,
    kin_density: f32,
    emitted_light: f32,
}

/// Fixed-size angular scan result: `cones` entries per channel, plus
/// nearest-of-class distance/bearing and a light-gradient vector.
#[derive(Clone, Debug)]
pub struct PolarVision {
    pub cones: usize,
    plant_mass: Vec<f32>,
    meat_mass: Vec<f32>,
    threat_intensity: Vec<f32>,
    kin_density: Vec<f32>,
    emitted_light: Vec<f32>,
    pub nearest_plant: Option<(f64, f64)>,
    pub nearest_meat: Option<(f64, f64)>,
    pub nearest_threat: Option<(f64, f64)>,
    pub light_gradient: (f32, f32),
}

impl PolarVision {
    /// Scans `entities` around `(x, y, heading)` out to `radius`, normalizing
    /// each cone by the fixed `sum / (1 + sum)` curve so no single crowded
    /// cone can saturate past 1.0.
    pub fn scan(
        position: (f64, f64),
        heading: f64,
        radius: f64,
        cones: usize,
        _self_caps: &Capabilities,
        entities: impl Iterator<Item = SensedEntity>,
        world_width: f64,
        world_height: f64,
        shadow: &ShadowMap,
    ) -> Self {
        let mut accum = vec![Cone::default(); cones.max(1)];
        let mut nearest_plant: Option<(f64, (f64, f64))> = None;
        let mut nearest_meat: Option<(f64, (f64, f64))> = None;
        let mut nearest_threat: Option<(f64, (f64, f64))> = None;

        for entity in entities {
            let (dx, dy) =
                toroidal::delta(position, entity.position, world_width, world_height);
            let dist = (dx * dx + dy * dy).sqrt();
            if dist > radius || dist < 1e-9 {
                continue;
            }
            let weight = (1.0 - dist / radius).max(0.0) as f32;
            let bearing = toroidal::wrap_angle(dy.atan2(dx) - heading);
            let cone_idx = cone_index(bearing, accum.len());

            let cone = &mut accum[cone_idx];
            cone.plant_mass += entity.plant_mass * weight;
            cone.meat_mass += entity.meat_mass * weight;
            cone.threat_intensity += entity.threat_intensity * weight;
            if entity.kin {
                cone.kin_density += weight;
            }
            cone.emitted_light += entity.emitted_light * weight;

            if entity.plant_mass > 0.0 {
                update_nearest(&mut nearest_plant, dist, entity.position);
            }
            if entity.meat_mass > 0.0 {
                update_nearest(&mut nearest_meat, dist, entity.position);
            }
            if entity.threat_intensity > 0.0 {
                update_nearest(&mut nearest_threat, dist, entity.position);
            }
        }

        let normalize = |v: f32| v / (1.0 + v);
        let plant_mass: Vec<f32> = accum.iter().map(|c| normalize(c.plant_mass)).collect();
        let meat_mass: Vec<f32> = accum.iter().map(|c| normalize(c.meat_mass)).collect();
        let threat_intensity: Vec<f32> =
            accum.iter().map(|c| normalize(c.threat_intensity)).collect();
        let kin_density: Vec<f32> = accum.iter().map(|c| normalize(c.kin_density)).collect();
        let emitted_light: Vec<f32> =
            accum.iter().map(|c| normalize(c.emitted_light)).collect();

        let light_gradient = shadow.gradient(position.0, position.1, radius * 0.25);

        Self {
            cones: accum.len(),
            plant_mass,
            meat_mass,
            threat_intensity,
            kin_density,
            emitted_light,
            nearest_plant: nearest_plant.map(|(_, p)| p),
            nearest_meat: nearest_meat.map(|(_, p)| p),
            nearest_threat: nearest_threat.map(|(_, p)| p),
            light_gradient,
        }
    }

    pub fn plant_mass(&self) -> &[f32] {
        &self.plant_mass
    }

    pub fn meat_mass(&self) -> &[f32] {
        &self.meat_mass
    }

    pub fn threat_intensity(&self) -> &[f32] {
        &self.threat_intensity
    }

    pub fn kin_density(&self) -> &[f32] {
        &self.kin_density
    }

    pub fn emitted_light(&self) -> &[f32] {
        &self.emitted_light
    }
}

fn cone_index(bearing: f64, cones: usize) -> usize {
    let normalized = bearing / TAU;
    ((normalized * cones as f64).floor() as i64).rem_euclid(cones as i64) as usize
}

fn update_nearest(slot: &mut Option<(f64, (f64, f64))>, dist: f64, pos: (f64, f64)) {
    match slot {
        Some((best, _)) if *best <= dist => {}
        _ => *slot = Some((dist, pos)),
    }
}
