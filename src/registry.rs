use crate::config::AppConfig;
use crate::engines::evaluation::{Model, SphereModel, VectorEstimateModel};
use crate::engines::generation::{genetic, rng_for, GeneOperators, GeneticPolicy, SelectionPolicy};
use crate::error::{DgaError, Result};
use std::collections::HashMap;

/// Builds a policy for one process step at global `iteration`; `stream`
/// distinguishes steps so seeded runs do not repeat the same draws.
pub type PolicyFactory =
    Box<dyn Fn(&AppConfig, u64, u64) -> Result<Box<dyn SelectionPolicy>> + Send + Sync>;
pub type ModelFactory = Box<dyn Fn(&AppConfig) -> Result<Box<dyn Model>> + Send + Sync>;

pub const SPHERE_MODEL: &str = "sphere";
pub const VECTOR_ESTIMATE_MODEL: &str = "vector_estimate";

/// Start-time table of pluggable components keyed by stable ids.
///
/// `config.run.policy` and `config.run.model` name entries here; worker
/// processes resolve them again from their handoff record.
pub struct Registry {
    policies: HashMap<String, PolicyFactory>,
    models: HashMap<String, ModelFactory>,
}

impl Registry {
    pub fn new() -> Self {
        let mut registry = Self::empty();
        registry.register_policies();
        registry.register_models();
        registry
    }

    /// A registry with nothing registered.
    pub fn empty() -> Self {
        Self {
            policies: HashMap::new(),
            models: HashMap::new(),
        }
    }

    pub fn register_policy<F>(&mut self, name: &str, factory: F)
    where
        F: Fn(&AppConfig, u64, u64) -> Result<Box<dyn SelectionPolicy>> + Send + Sync + 'static,
    {
        self.policies.insert(name.to_string(), Box::new(factory));
    }

    pub fn register_model<F>(&mut self, name: &str, factory: F)
    where
        F: Fn(&AppConfig) -> Result<Box<dyn Model>> + Send + Sync + 'static,
    {
        self.models.insert(name.to_string(), Box::new(factory));
    }

    pub fn create_policy(
        &self,
        config: &AppConfig,
        iteration: u64,
        stream: u64,
    ) -> Result<Box<dyn SelectionPolicy>> {
        let factory = self.policies.get(&config.run.policy).ok_or_else(|| {
            DgaError::UnknownComponent {
                kind: "policy",
                name: config.run.policy.clone(),
            }
        })?;
        factory(config, iteration, stream)
    }

    pub fn create_model(&self, config: &AppConfig) -> Result<Box<dyn Model>> {
        let factory = self.models.get(&config.run.model).ok_or_else(|| {
            DgaError::UnknownComponent {
                kind: "model",
                name: config.run.model.clone(),
            }
        })?;
        factory(config)
    }

    /// Fails early if the config names a component that is not registered.
    pub fn check(&self, config: &AppConfig) -> Result<()> {
        if !self.policies.contains_key(&config.run.policy) {
            return Err(DgaError::UnknownComponent {
                kind: "policy",
                name: config.run.policy.clone(),
            });
        }
        if !self.models.contains_key(&config.run.model) {
            return Err(DgaError::UnknownComponent {
                kind: "model",
                name: config.run.model.clone(),
            });
        }
        Ok(())
    }

    pub fn policy_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.policies.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn model_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.models.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    fn register_policies(&mut self) {
        self.register_policy(genetic::POLICY_NAME, |config, iteration, stream| {
            let evolution = &config.evolution;
            let operators = GeneOperators::new(
                evolution,
                iteration,
                rng_for(evolution.seed, stream.wrapping_mul(2)),
            );
            let policy = GeneticPolicy::new(
                evolution,
                Box::new(operators),
                rng_for(evolution.seed, stream.wrapping_mul(2).wrapping_add(1)),
            );
            Ok(Box::new(policy) as Box<dyn SelectionPolicy>)
        });
    }

    fn register_models(&mut self) {
        self.register_model(SPHERE_MODEL, |_| Ok(Box::new(SphereModel) as Box<dyn Model>));
        self.register_model(VECTOR_ESTIMATE_MODEL, |config| {
            let model = VectorEstimateModel::new(config.evolution.payload_len(), &config.model)?;
            Ok(Box::new(model) as Box<dyn Model>)
        });
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}
