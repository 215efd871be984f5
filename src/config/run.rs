use super::traits::ConfigSection;
use crate::error::DgaError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Run directory; every file of the run lives below it.
    pub run_name: PathBuf,
    pub num_parallel_processes: usize,
    pub iterations: u64,
    pub lock_timeout_secs: u64,
    pub lock_poll_ms: u64,
    pub retry_delay_ms: u64,
    pub policy: String,
    pub model: String,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            run_name: PathBuf::from("dga_run"),
            num_parallel_processes: 4,
            iterations: 100,
            lock_timeout_secs: 100,
            lock_poll_ms: 50,
            retry_delay_ms: 1000,
            policy: "genetic".to_string(),
            model: "sphere".to_string(),
        }
    }
}

impl RunConfig {
    pub fn lock_timeout(&self) -> Duration {
        Duration::from_secs(self.lock_timeout_secs)
    }

    pub fn lock_poll(&self) -> Duration {
        Duration::from_millis(self.lock_poll_ms)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}

impl ConfigSection for RunConfig {
    fn section_name() -> &'static str {
        "run"
    }

    fn validate(&self) -> Result<(), DgaError> {
        if self.run_name.as_os_str().is_empty() {
            return Err(DgaError::Configuration(
                "Run name must not be empty".to_string()
            ));
        }
        if self.num_parallel_processes == 0 {
            return Err(DgaError::Configuration(
                "At least one parallel process is required".to_string()
            ));
        }
        if self.iterations == 0 {
            return Err(DgaError::Configuration(
                "Iteration budget must be at least 1".to_string()
            ));
        }
        if self.lock_poll_ms == 0 {
            return Err(DgaError::Configuration(
                "Lock poll interval must be positive".to_string()
            ));
        }
        Ok(())
    }
}
