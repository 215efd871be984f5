use std::path::{Path, PathBuf};

pub const POOL_DIR: &str = "pool";
pub const LOG_DIR: &str = "logs";
pub const ARGS_DIR: &str = "run_args";
pub const POOL_LOCK_NAME: &str = "POOL_LOCK.lock";
pub const RUN_STATE_NAME: &str = "run_state.json";
pub const RECORD_EXT: &str = "json";

/// File locations of one run, all relative to the run directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunLayout {
    root: PathBuf,
}

impl RunLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn pool_dir(&self) -> PathBuf {
        self.root.join(POOL_DIR)
    }

    pub fn logs_dir(&self) -> PathBuf {
        self.root.join(LOG_DIR)
    }

    pub fn args_dir(&self) -> PathBuf {
        self.root.join(ARGS_DIR)
    }

    pub fn lock_path(&self) -> PathBuf {
        self.root.join(POOL_LOCK_NAME)
    }

    pub fn run_state_path(&self) -> PathBuf {
        self.root.join(RUN_STATE_NAME)
    }

    pub fn record_path(&self, key: &str) -> PathBuf {
        self.pool_dir().join(format!("{key}.{RECORD_EXT}"))
    }

    pub fn handoff_path(&self, worker_id: usize) -> PathBuf {
        self.args_dir().join(format!("worker{worker_id}_args.json"))
    }

    pub fn log_path(&self, log_name: &str) -> PathBuf {
        self.logs_dir().join(format!("{log_name}.log"))
    }

    /// Creates the pool, log and handoff directories.
    pub fn create_dirs(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(self.pool_dir())?;
        std::fs::create_dir_all(self.logs_dir())?;
        std::fs::create_dir_all(self.args_dir())?;
        Ok(())
    }
}
