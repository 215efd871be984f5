use super::traits::ConfigSection;
use crate::error::DgaError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvolutionConfig {
    /// Number of records kept before new children start replacing the worst.
    pub pool_capacity: usize,
    pub num_parents: usize,
    pub tournament_size: usize,
    pub shape: Vec<usize>,
    pub min_val: f64,
    pub max_val: f64,
    pub initializer: Initializer,
    pub mutation: Mutation,
    pub crossover: Crossover,
    pub seed: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Initializer {
    Uniform { min_val: f64, max_val: f64 },
    Normal { loc: f64, scale: f64 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Mutation {
    None,
    Normal { loc: f64, scale: f64, mutation_rate: f64, decay: f64 },
    Uniform { min_val: f64, max_val: f64, mutation_rate: f64, decay: f64 },
    Splice { mutation_size: usize, loc: f64, scale: f64, mutation_rate: f64, decay: f64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Crossover {
    Mean,
    Splice,
}

impl Default for EvolutionConfig {
    fn default() -> Self {
        Self {
            pool_capacity: 10,
            num_parents: 2,
            tournament_size: 3,
            shape: vec![10],
            min_val: -10.0,
            max_val: 10.0,
            initializer: Initializer::Uniform { min_val: -10.0, max_val: 10.0 },
            mutation: Mutation::Normal {
                loc: 0.0,
                scale: 1.0,
                mutation_rate: 0.5,
                decay: 1.0,
            },
            crossover: Crossover::Mean,
            seed: None,
        }
    }
}

impl Mutation {
    pub fn rate(&self) -> f64 {
        match self {
            Mutation::None => 0.0,
            Mutation::Normal { mutation_rate, .. }
            | Mutation::Uniform { mutation_rate, .. }
            | Mutation::Splice { mutation_rate, .. } => *mutation_rate,
        }
    }

    pub fn decay(&self) -> f64 {
        match self {
            Mutation::None => 1.0,
            Mutation::Normal { decay, .. }
            | Mutation::Uniform { decay, .. }
            | Mutation::Splice { decay, .. } => *decay,
        }
    }
}

impl EvolutionConfig {
    /// Total number of values in one payload.
    pub fn payload_len(&self) -> usize {
        self.shape.iter().product()
    }
}

impl ConfigSection for EvolutionConfig {
    fn section_name() -> &'static str {
        "evolution"
    }

    fn validate(&self) -> Result<(), DgaError> {
        if self.num_parents == 0 {
            return Err(DgaError::Configuration(
                "At least one parent is required".to_string()
            ));
        }
        if self.pool_capacity < self.num_parents {
            return Err(DgaError::Configuration(
                "Pool capacity must be at least the number of parents".to_string()
            ));
        }
        if self.tournament_size == 0 {
            return Err(DgaError::Configuration(
                "Tournament size must be positive".to_string()
            ));
        }
        if self.shape.is_empty() || self.payload_len() == 0 {
            return Err(DgaError::Configuration(
                "Payload shape must have a non-zero size".to_string()
            ));
        }
        check_bounds("min_val/max_val", self.min_val, self.max_val)?;
        let rate = self.mutation.rate();
        if !(0.0..=1.0).contains(&rate) {
            return Err(DgaError::Configuration(
                "Mutation rate must be between 0 and 1".to_string()
            ));
        }
        let decay = self.mutation.decay();
        if !decay.is_finite() || decay <= 0.0 {
            return Err(DgaError::Configuration(
                "Mutation decay must be positive".to_string()
            ));
        }
        match self.initializer {
            // An empty range makes every initial candidate identical, and
            // identical payloads share one pool key.
            Initializer::Uniform { min_val, max_val } => {
                check_bounds("initializer", min_val, max_val)?;
                if min_val == max_val {
                    return Err(DgaError::Configuration(
                        "Initializer range must not be empty".to_string()
                    ));
                }
            }
            Initializer::Normal { loc, scale } => check_normal("initializer", loc, scale)?,
        }
        match self.mutation {
            Mutation::None => {}
            Mutation::Uniform { min_val, max_val, .. } => {
                check_bounds("mutation", min_val, max_val)?
            }
            Mutation::Normal { loc, scale, .. } | Mutation::Splice { loc, scale, .. } => {
                check_normal("mutation", loc, scale)?
            }
        }
        Ok(())
    }
}

fn check_bounds(what: &str, min_val: f64, max_val: f64) -> Result<(), DgaError> {
    if !min_val.is_finite() || !max_val.is_finite() {
        return Err(DgaError::Configuration(format!(
            "{} bounds must be finite",
            what
        )));
    }
    if min_val > max_val {
        return Err(DgaError::Configuration(format!(
            "{} lower bound must not exceed upper bound",
            what
        )));
    }
    Ok(())
}

fn check_normal(what: &str, loc: f64, scale: f64) -> Result<(), DgaError> {
    if !loc.is_finite() || !scale.is_finite() || scale < 0.0 {
        return Err(DgaError::Configuration(format!(
            "{} needs a finite loc and a non-negative finite scale",
            what
        )));
    }
    Ok(())
}
