use crate::config::AppConfig;
use crate::error::{DgaError, Result};
use crate::pool::RunLayout;
use crate::types::PoolKey;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallType {
    Init,
    RunWorker,
    Callback,
}

/// Everything the next process step needs; written by the previous step
/// and read back by the spawned one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Handoff {
    pub worker_id: usize,
    pub call_type: CallType,
    pub gene_key: Option<PoolKey>,
    pub iteration: u64,
    pub config: AppConfig,
}

impl Handoff {
    pub fn init(config: AppConfig) -> Self {
        Self {
            worker_id: 0,
            call_type: CallType::Init,
            gene_key: None,
            iteration: 0,
            config,
        }
    }

    pub fn run_worker(worker_id: usize, key: PoolKey, iteration: u64, config: AppConfig) -> Self {
        Self {
            worker_id,
            call_type: CallType::RunWorker,
            gene_key: Some(key),
            iteration,
            config,
        }
    }

    pub fn callback(worker_id: usize, key: PoolKey, iteration: u64, config: AppConfig) -> Self {
        Self {
            worker_id,
            call_type: CallType::Callback,
            gene_key: Some(key),
            iteration,
            config,
        }
    }

    pub fn write(&self, layout: &RunLayout) -> Result<()> {
        std::fs::create_dir_all(layout.args_dir())?;
        let path = layout.handoff_path(self.worker_id);
        std::fs::write(&path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    pub fn read(layout: &RunLayout, worker_id: usize) -> Result<Self> {
        let path = layout.handoff_path(worker_id);
        let content = std::fs::read_to_string(&path).map_err(|e| {
            DgaError::Handoff(format!("Cannot read {}: {}", path.display(), e))
        })?;
        let handoff: Handoff = serde_json::from_str(&content).map_err(|e| {
            DgaError::Handoff(format!("Malformed {}: {}", path.display(), e))
        })?;
        if handoff.worker_id != worker_id {
            return Err(DgaError::Handoff(format!(
                "{} belongs to worker {}",
                path.display(),
                handoff.worker_id
            )));
        }
        Ok(handoff)
    }

    /// Key of the candidate this step is bound to.
    pub fn key(&self) -> Result<&PoolKey> {
        self.gene_key.as_ref().ok_or_else(|| {
            DgaError::Handoff(format!(
                "{:?} step for worker {} carries no gene key",
                self.call_type, self.worker_id
            ))
        })
    }
}
