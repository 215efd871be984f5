use crate::error::{DgaError, Result};
use std::path::Path;
use std::process::{Command, Stdio};

/// Starts the next process step for `worker_id` in the run at `run_dir`.
///
/// The step finds its instructions in the worker's handoff record, so a
/// spawner only has to say which run and which worker.
pub trait Spawner {
    fn spawn(&self, run_dir: &Path, worker_id: usize) -> Result<()>;
}

/// Re-executes the current binary as `step --run <dir> --worker <id>`.
///
/// The child is not waited on; the spawning step exits independently.
#[derive(Debug, Clone, Default)]
pub struct ProcessSpawner;

impl Spawner for ProcessSpawner {
    fn spawn(&self, run_dir: &Path, worker_id: usize) -> Result<()> {
        let exe = std::env::current_exe().map_err(|e| DgaError::Spawn {
            worker_id,
            reason: format!("cannot locate current executable: {}", e),
        })?;

        let child = Command::new(&exe)
            .arg("step")
            .arg("--run")
            .arg(run_dir)
            .arg("--worker")
            .arg(worker_id.to_string())
            .stdin(Stdio::null())
            .spawn()
            .map_err(|e| DgaError::Spawn {
                worker_id,
                reason: format!("failed to spawn `{}`: {}", exe.display(), e),
            })?;

        log::info!("Spawned step for worker {} (pid {})", worker_id, child.id());
        Ok(())
    }
}
