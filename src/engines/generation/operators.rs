use crate::config::{Crossover, EvolutionConfig, Initializer, Mutation};
use crate::error::{DgaError, Result};
use crate::types::Payload;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};

/// Numeric operator set the selection policy builds candidates with.
pub trait NumericOperators: Send {
    fn initialize(&mut self, iteration: u64) -> Result<Payload>;
    fn mutate(&mut self, payload: Payload) -> Result<Payload>;
    fn crossover(&mut self, parents: &[&Payload], iteration: u64) -> Result<Payload>;
}

/// RNG for one process step: seeded runs derive a distinct stream per step,
/// unseeded runs draw from entropy.
pub fn rng_for(seed: Option<u64>, stream: u64) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed ^ stream.wrapping_mul(0x9E37_79B9_7F4A_7C15)),
        None => StdRng::from_entropy(),
    }
}

/// Operators configured from the `evolution` section.
pub struct GeneOperators {
    shape: Vec<usize>,
    min_val: f64,
    max_val: f64,
    initializer: Initializer,
    mutation: Mutation,
    crossover: Crossover,
    /// Probability for the next `mutate` call; decays after every call.
    mutation_rate: f64,
    rng: StdRng,
}

impl GeneOperators {
    pub fn new(config: &EvolutionConfig, iteration: u64, rng: StdRng) -> Self {
        let decay_steps = i32::try_from(iteration).unwrap_or(i32::MAX);
        Self {
            shape: config.shape.clone(),
            min_val: config.min_val,
            max_val: config.max_val,
            initializer: config.initializer.clone(),
            mutation: config.mutation.clone(),
            crossover: config.crossover,
            mutation_rate: config.mutation.rate() * config.mutation.decay().powi(decay_steps),
            rng,
        }
    }

    pub fn mutation_rate(&self) -> f64 {
        self.mutation_rate
    }

    fn len(&self) -> usize {
        self.shape.iter().product()
    }

    fn normal(loc: f64, scale: f64) -> Result<Normal<f64>> {
        Normal::new(loc, scale)
            .map_err(|e| DgaError::Configuration(format!("Invalid normal distribution: {}", e)))
    }

    fn clamp(&self, mut payload: Payload) -> Payload {
        for value in payload.values.iter_mut() {
            *value = value.clamp(self.min_val, self.max_val);
        }
        payload
    }
}

impl NumericOperators for GeneOperators {
    fn initialize(&mut self, _iteration: u64) -> Result<Payload> {
        let len = self.len();
        let values: Vec<f64> = match self.initializer {
            Initializer::Uniform { min_val, max_val } => {
                if min_val >= max_val || min_val.is_nan() || max_val.is_nan() {
                    return Err(DgaError::Configuration(format!(
                        "Empty initializer range [{}, {})",
                        min_val, max_val
                    )));
                }
                (0..len).map(|_| self.rng.gen_range(min_val..max_val)).collect()
            }
            Initializer::Normal { loc, scale } => {
                let normal = Self::normal(loc, scale)?;
                (0..len).map(|_| normal.sample(&mut self.rng)).collect()
            }
        };
        Ok(self.clamp(Payload::new(self.shape.clone(), values)))
    }

    fn mutate(&mut self, mut payload: Payload) -> Result<Payload> {
        let rate = self.mutation_rate;
        self.mutation_rate *= self.mutation.decay();
        if self.rng.gen::<f64>() >= rate {
            return Ok(payload);
        }
        match self.mutation {
            Mutation::None => {}
            Mutation::Normal { loc, scale, .. } => {
                let normal = Self::normal(loc, scale)?;
                for value in payload.values.iter_mut() {
                    *value += normal.sample(&mut self.rng);
                }
            }
            Mutation::Uniform { min_val, max_val, .. } => {
                if min_val < max_val {
                    for value in payload.values.iter_mut() {
                        *value += self.rng.gen_range(min_val..max_val);
                    }
                }
            }
            Mutation::Splice { mutation_size, loc, scale, .. } => {
                let len = payload.len();
                if len > 0 {
                    let normal = Self::normal(loc, scale)?;
                    let start = self.rng.gen_range(0..len);
                    let end = self.rng.gen_range(start + 1..=start + 1 + mutation_size).min(len);
                    for value in &mut payload.values[start..end] {
                        *value += normal.sample(&mut self.rng);
                    }
                }
            }
        }
        Ok(self.clamp(payload))
    }

    fn crossover(&mut self, parents: &[&Payload], _iteration: u64) -> Result<Payload> {
        let first = *parents
            .first()
            .ok_or_else(|| DgaError::Selection("Crossover needs at least one parent".to_string()))?;
        if parents.iter().any(|p| p.len() != first.len()) {
            return Err(DgaError::Selection(
                "Crossover parents differ in length".to_string()
            ));
        }

        let values = match self.crossover {
            Crossover::Mean => {
                let count = parents.len() as f64;
                (0..first.len())
                    .map(|i| parents.iter().map(|p| p.values[i]).sum::<f64>() / count)
                    .collect()
            }
            Crossover::Splice => {
                let second = parents.get(1).copied().unwrap_or(first);
                let point = if first.is_empty() {
                    0
                } else {
                    self.rng.gen_range(0..first.len())
                };
                first.values[..point]
                    .iter()
                    .chain(&second.values[point..])
                    .copied()
                    .collect()
            }
        };
        Ok(self.clamp(Payload::new(first.shape.clone(), values)))
    }
}

/// Tournament selection: index of the fittest of `tournament_size` random picks.
pub fn tournament_selection<T, R: Rng>(
    population: &[(T, f64)],
    tournament_size: usize,
    rng: &mut R,
) -> usize {
    let mut best_idx = rng.gen_range(0..population.len());
    let mut best_fitness = population[best_idx].1;

    for _ in 1..tournament_size {
        let idx = rng.gen_range(0..population.len());
        if population[idx].1 > best_fitness {
            best_idx = idx;
            best_fitness = population[idx].1;
        }
    }

    best_idx
}
