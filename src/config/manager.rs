use super::{
    evolution::EvolutionConfig,
    model::ModelConfig,
    run::RunConfig,
    traits::ConfigSection,
};
use crate::error::DgaError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::{Arc, RwLock};

/// Prefix for environment overrides, e.g. `DGA__RUN__ITERATIONS=50`.
pub const ENV_PREFIX: &str = "DGA";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub run: RunConfig,
    pub evolution: EvolutionConfig,
    pub model: ModelConfig,
}

impl AppConfig {
    pub fn validate(&self) -> Result<(), DgaError> {
        validate_section(&self.run)?;
        validate_section(&self.evolution)?;
        validate_section(&self.model)?;
        if self.run.num_parallel_processes > self.evolution.pool_capacity {
            return Err(DgaError::Configuration(format!(
                "num_parallel_processes ({}) exceeds pool_capacity ({})",
                self.run.num_parallel_processes, self.evolution.pool_capacity
            )));
        }
        Ok(())
    }
}

/// Runs a section's checks, tagging failures with the section's table name.
fn validate_section<S: ConfigSection>(section: &S) -> Result<(), DgaError> {
    section.validate().map_err(|e| match e {
        DgaError::Configuration(msg) => {
            DgaError::Configuration(format!("[{}] {}", S::section_name(), msg))
        }
        other => other,
    })
}

pub struct ConfigManager {
    config: Arc<RwLock<AppConfig>>,
}

impl ConfigManager {
    pub fn new() -> Self {
        Self {
            config: Arc::new(RwLock::new(AppConfig::default())),
        }
    }

    /// Loads defaults, then the TOML file, then `DGA__*` environment overrides.
    pub fn load_from_file<P: AsRef<Path>>(&self, path: P) -> Result<(), DgaError> {
        let defaults = config::Config::try_from(&AppConfig::default())
            .map_err(|e| DgaError::Configuration(format!("Failed to build defaults: {}", e)))?;

        let layered = config::Config::builder()
            .add_source(defaults)
            .add_source(config::File::from(path.as_ref()).format(config::FileFormat::Toml))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| DgaError::Configuration(format!("Failed to read config: {}", e)))?;

        let config: AppConfig = layered
            .try_deserialize()
            .map_err(|e| DgaError::Configuration(format!("Failed to parse config: {}", e)))?;

        config.validate()?;

        *self.write_guard()? = config;
        Ok(())
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), DgaError> {
        let config = self.get()?;
        let toml_str = toml::to_string_pretty(&config)
            .map_err(|e| DgaError::Configuration(format!("Failed to serialize: {}", e)))?;

        std::fs::write(path, toml_str)
            .map_err(|e| DgaError::Configuration(format!("Failed to write config: {}", e)))?;

        Ok(())
    }

    pub fn get(&self) -> Result<AppConfig, DgaError> {
        self.config
            .read()
            .map(|c| c.clone())
            .map_err(|_| DgaError::Configuration("Config lock poisoned".to_string()))
    }

    pub fn update<F>(&self, f: F) -> Result<(), DgaError>
    where
        F: FnOnce(&mut AppConfig),
    {
        let mut config = self.write_guard()?;
        let mut candidate = config.clone();
        f(&mut candidate);
        candidate.validate()?;
        *config = candidate;
        Ok(())
    }

    fn write_guard(&self) -> Result<std::sync::RwLockWriteGuard<'_, AppConfig>, DgaError> {
        self.config
            .write()
            .map_err(|_| DgaError::Configuration("Config lock poisoned".to_string()))
    }
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}
