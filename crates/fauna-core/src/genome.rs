//! `Genome`: the evolvable weight vector behind a `Brain`. The core only cares that it crosses over and mutates; the weights
//! themselves are opaque to everything except whatever `Brain` decodes them.

use rand::Rng;

#[derive(Clone, Debug)]
pub struct Genome {
    weights: Vec<f32>,
}

impl Genome {
    pub fn with_nn_weights(weights: Vec<f32>) -> Self {
        Self { weights }
    }

    pub fn nn_weights(&self) -> &[f32] {
        &self.weights
    }

    /// Per-weight 50/50 crossover, padding the shorter parent with zeros at
    /// matched indices.
    pub fn crossover<R: Rng + ?Sized>(a: &Genome, b: &Genome, rng: &mut R) -> Self {
        let len = a.weights.len().max(b.weights.len());
        let weights = (0..len)
            .map(|i| {
                let from_a = a.weights.get(i).copied().unwrap_or(0.0);
                let from_b = b.weights.get(i).copied().unwrap_or(0.0);
                if rng.random::<bool>() {
                    from_a
                } else {
                    from_b
                }
            })
            .collect();
        Self { weights }
    }

    pub fn mutate<R: Rng + ?Sized>(&mut self, rng: &mut R, rates: &MutationRates) {
        debug_assert!(
            rates.point_rate + rates.reset_rate + rates.scale_rate <= 1.0,
            "mutation probabilities should sum to <= 1.0"
        );
        for v in &mut self.weights {
            let r = rng.random::<f32>();
            if r < rates.point_rate {
                let delta = rng.random_range(-rates.point_scale..=rates.point_scale);
                *v = (*v + delta).clamp(-rates.value_limit, rates.value_limit);
            } else if r < rates.point_rate + rates.reset_rate {
                *v = 0.0;
            } else if r < rates.point_rate + rates.reset_rate + rates.scale_rate {
                let factor = rng.random_range(rates.scale_min..=rates.scale_max);
                *v = (*v * factor).clamp(-rates.value_limit, rates.value_limit);
            }
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct MutationRates {
    pub point_rate: f32,
    pub point_scale: f32,
    pub reset_rate: f32,
    pub scale_rate: f32,
    pub scale_min: f32,
    pub scale_max: f32,
    pub value_limit: f32,
}

impl Default for MutationRates {
    fn default() -> Self {
        Self {
            point_rate: 0.02,
            point_scale: 0.15,
            reset_rate: 0.002,
            scale_rate: 0.002,
            scale_min: 0.8,
            scale_max: 1.2,
            value_limit: 2.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha12Rng;

    #[test]
    fn mutation_is_deterministic_for_fixed_seed() {
        let mut a = Genome::with_nn_weights(vec![0.5; 16]);
        let mut b = Genome::with_nn_weights(vec![0.5; 16]);
        let mut rng_a = ChaCha12Rng::seed_from_u64(123);
        let mut rng_b = ChaCha12Rng::seed_from_u64(123);
        let rates = MutationRates::default();
        a.mutate(&mut rng_a, &rates);
        b.mutate(&mut rng_b, &rates);
        assert_eq!(a.nn_weights(), b.nn_weights());
    }

    #[test]
    fn mutation_respects_value_bounds() {
        let mut g = Genome::with_nn_weights(vec![1.5; 32]);
        let mut rng = ChaCha12Rng::seed_from_u64(42);
        let rates = MutationRates::default();
        for _ in 0..100 {
            g.mutate(&mut rng, &rates);
        }
        assert!(g
            .nn_weights()
            .iter()
            .all(|v| v.is_finite() && (-rates.value_limit..=rates.value_limit).contains(v)));
    }

    #[test]
    fn crossover_only_draws_from_either_parent() {
        let a = Genome::with_nn_weights(vec![1.0; 8]);
        let b = Genome::with_nn_weights(vec![-1.0; 8]);
        let mut rng = ChaCha12Rng::seed_from_u64(7);
        let child = Genome::crossover(&a, &b, &mut rng);
        assert!(child.nn_weights().iter().all(|&v| v == 1.0 || v == -1.0));
    }

    #[test]
    fn crossover_pads_mismatched_lengths_with_zero() {
        let a = Genome::with_nn_weights(vec![1.0; 4]);
        let b = Genome::with_nn_weights(vec![1.0; 8]);
        let mut rng = ChaCha12Rng::seed_from_u64(3);
        let child = Genome::crossover(&a, &b, &mut rng);
        assert_eq!(child.nn_weights().len(), 8);
    }
}
