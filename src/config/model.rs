use super::traits::ConfigSection;
use crate::error::DgaError;
use serde::{Deserialize, Serialize};

/// Parameters for the built-in evaluators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Spread of the hidden target used by `vector_estimate`.
    pub target_scale: f64,
    pub target_seed: u64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            target_scale: 3.0,
            target_seed: 10,
        }
    }
}

impl ConfigSection for ModelConfig {
    fn section_name() -> &'static str {
        "model"
    }

    fn validate(&self) -> Result<(), DgaError> {
        if self.target_scale < 0.0 {
            return Err(DgaError::Configuration(
                "Target scale must not be negative".to_string()
            ));
        }
        Ok(())
    }
}
