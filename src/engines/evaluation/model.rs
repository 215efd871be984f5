use crate::config::ModelConfig;
use crate::error::{DgaError, Result};
use crate::types::Payload;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};

/// Turns a candidate payload into a fitness score (higher is better).
///
/// Evaluation may take arbitrarily long; callers impose no timeout.
pub trait Model: Send {
    fn evaluate(&mut self, payload: &Payload) -> Result<f64>;
}

/// Negated sum of squares; the optimum is the zero vector.
#[derive(Debug, Clone, Default)]
pub struct SphereModel;

impl Model for SphereModel {
    fn evaluate(&mut self, payload: &Payload) -> Result<f64> {
        Ok(-payload.values.iter().map(|v| v * v).sum::<f64>())
    }
}

/// Estimates a hidden target vector; fitness is the negated squared distance.
#[derive(Debug, Clone)]
pub struct VectorEstimateModel {
    target: Vec<f64>,
}

impl VectorEstimateModel {
    /// Draws a target of `len` values from N(0, target_scale) seeded by
    /// `target_seed`, so every worker process sees the same target.
    pub fn new(len: usize, config: &ModelConfig) -> Result<Self> {
        let normal = Normal::new(0.0, config.target_scale)
            .map_err(|e| DgaError::Configuration(format!("Invalid target scale: {}", e)))?;
        let mut rng = StdRng::seed_from_u64(config.target_seed);
        let target = (0..len).map(|_| normal.sample(&mut rng)).collect();
        Ok(Self { target })
    }

    pub fn with_target(target: Vec<f64>) -> Self {
        Self { target }
    }

    pub fn target(&self) -> &[f64] {
        &self.target
    }
}

impl Model for VectorEstimateModel {
    fn evaluate(&mut self, payload: &Payload) -> Result<f64> {
        if payload.len() != self.target.len() {
            return Err(DgaError::Evaluation(format!(
                "Payload has {} values, target has {}",
                payload.len(),
                self.target.len()
            )));
        }
        let distance: f64 = payload
            .values
            .iter()
            .zip(&self.target)
            .map(|(v, t)| (v - t) * (v - t))
            .sum();
        Ok(-distance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sphere_optimum_at_zero() {
        let mut model = SphereModel;
        assert_eq!(model.evaluate(&Payload::from_values(vec![0.0; 4])).unwrap(), 0.0);
        assert_eq!(model.evaluate(&Payload::from_values(vec![1.0, -2.0])).unwrap(), -5.0);
    }

    #[test]
    fn test_vector_estimate_target_is_deterministic() {
        let config = ModelConfig::default();
        let a = VectorEstimateModel::new(5, &config).unwrap();
        let b = VectorEstimateModel::new(5, &config).unwrap();
        assert_eq!(a.target(), b.target());
    }

    #[test]
    fn test_vector_estimate_scores_distance() {
        let mut model = VectorEstimateModel::with_target(vec![1.0, 1.0]);
        assert_eq!(model.evaluate(&Payload::from_values(vec![1.0, 1.0])).unwrap(), 0.0);
        assert_eq!(model.evaluate(&Payload::from_values(vec![0.0, 3.0])).unwrap(), -5.0);
        assert!(model.evaluate(&Payload::from_values(vec![1.0])).is_err());
    }
}
