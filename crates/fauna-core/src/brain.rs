//! The brain contract: the core fixes input/output shape and
//! normalization and treats the decision function itself as opaque.

use crate::error::BrainError;
use crate::genome::Genome;

/// Self-state(2) + body descriptor(6) + polar fields(≤17) + approach
/// bearings(4) + bias(1).
pub const N_IN: usize = 30;
/// `UTurn, UThrottle, AttackIntent, MateIntent, EatIntent, GlowIntent`; a
/// `Brain` that only models the first four may leave the rest at their
/// configured defaults.
pub const N_OUT: usize = 6;

/// Opaque decision function. Implementations are not required to be
/// deterministic, but the core's own tests rely on a deterministic brain.
pub trait Brain: Send + Sync {
    fn think(&self, inputs: &[f32; N_IN]) -> Result<[f32; N_OUT], BrainError>;
}

/// Decoded, organism-facing brain output.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BehaviorOutputs {
    pub desire_angle: f32,
    pub desire_distance: f32,
    pub attack_intent: f32,
    pub breed_intent: f32,
    pub eat_intent: f32,
    pub glow_intent: f32,
}

impl Default for BehaviorOutputs {
    fn default() -> Self {
        Self {
            desire_angle: 0.0,
            desire_distance: 0.0,
            attack_intent: 0.0,
            breed_intent: 0.0,
            eat_intent: 0.0,
            glow_intent: 1.0,
        }
    }
}

/// Maps raw `[UTurn, UThrottle, AttackIntent, MateIntent, EatIntent,
/// GlowIntent]` into the organism-facing struct.
pub fn decode(raw: &[f32; N_OUT]) -> BehaviorOutputs {
    BehaviorOutputs {
        desire_angle: raw[0].clamp(-1.0, 1.0) * std::f32::consts::PI,
        desire_distance: raw[1].clamp(0.0, 1.0),
        attack_intent: raw[2].clamp(0.0, 1.0),
        breed_intent: raw[3].clamp(0.0, 1.0),
        eat_intent: raw[4].clamp(0.0, 1.0),
        glow_intent: raw[5].clamp(0.0, 1.0),
    }
}

const HIDDEN_SIZE: usize = 32;

/// Default feedforward `Brain`: `N_IN -> HIDDEN_SIZE` (tanh) `-> N_OUT`
/// (tanh), with weights drawn from a `Genome`'s NN segment.
#[derive(Clone, Debug)]
pub struct NeuralNet {
    w_ih: Vec<[f32; HIDDEN_SIZE]>,
    b_h: [f32; HIDDEN_SIZE],
    w_ho: [[f32; N_OUT]; HIDDEN_SIZE],
    b_o: [f32; N_OUT],
}

impl NeuralNet {
    pub const WEIGHT_COUNT: usize = N_IN * HIDDEN_SIZE + HIDDEN_SIZE + HIDDEN_SIZE * N_OUT + N_OUT;

    pub fn from_genome(genome: &Genome) -> Self {
        Self::from_weights(genome.nn_weights().iter().copied())
    }

    pub fn from_weights(mut weights: impl Iterator<Item = f32>) -> Self {
        let mut next = || weights.next().unwrap_or(0.0);

        let mut w_ih = vec![[0.0f32; HIDDEN_SIZE]; N_IN];
        for row in &mut w_ih {
            for w in row.iter_mut() {
                *w = next();
            }
        }
        let mut b_h = [0.0f32; HIDDEN_SIZE];
        for b in &mut b_h {
            *b = next();
        }
        let mut w_ho = [[0.0f32; N_OUT]; HIDDEN_SIZE];
        for row in &mut w_ho {
            for w in row.iter_mut() {
                *w = next();
            }
        }
        let mut b_o = [0.0f32; N_OUT];
        for b in &mut b_o {
            *b = next();
        }

        Self {
            w_ih,
            b_h,
            w_ho,
            b_o,
        }
    }

    fn forward(&self, input: &[f32; N_IN]) -> [f32; N_OUT] {
        let mut hidden = self.b_h;
        for (i, &x) in input.iter().enumerate() {
            for (j, h) in hidden.iter_mut().enumerate() {
                *h += x * self.w_ih[i][j];
            }
        }
        for h in &mut hidden {
            *h = h.tanh();
        }

        let mut output = self.b_o;
        for (i, &h) in hidden.iter().enumerate() {
            for (j, o) in output.iter_mut().enumerate() {
                *o += h * self.w_ho[i][j];
            }
        }
        for o in &mut output {
            *o = o.tanh();
        }
        output
    }
}

impl Brain for NeuralNet {
    fn think(&self, inputs: &[f32; N_IN]) -> Result<[f32; N_OUT], BrainError> {
        let output = self.forward(inputs);
        if output.iter().any(|v| !v.is_finite()) {
            return Err(BrainError::EvaluationFailed(
                "non-finite output from feedforward network".to_string(),
            ));
        }
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_weights_produce_zero_output() {
        let net = NeuralNet::from_weights(std::iter::repeat(0.0));
        let out = net.think(&[0.0; N_IN]).unwrap();
        assert_eq!(out, [0.0; N_OUT]);
    }

    #[test]
    fn outputs_stay_within_tanh_range() {
        let net = NeuralNet::from_weights((0..NeuralNet::WEIGHT_COUNT).map(|i| (i as f32 % 7.0) - 3.0));
        let input = [0.7; N_IN];
        let out = net.think(&input).unwrap();
        assert!(out.iter().all(|&v| (-1.0..=1.0).contains(&v)));
    }

    #[test]
    fn decode_maps_turn_into_radians() {
        let decoded = decode(&[1.0, 0.5, 0.2, 0.0, 0.0, 0.0]);
        assert!((decoded.desire_angle - std::f32::consts::PI).abs() < 1e-5);
        assert_eq!(decoded.desire_distance, 0.5);
    }

    #[test]
    fn from_genome_consumes_nn_segment() {
        let genome = Genome::with_nn_weights(vec![0.1; NeuralNet::WEIGHT_COUNT]);
        let net = NeuralNet::from_genome(&genome);
        assert!(net.think(&[0.0; N_IN]).is_ok());
    }
}
