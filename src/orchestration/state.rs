use crate::error::{DgaError, Result};
use crate::pool::RunLayout;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Run-wide counters; only read or written while holding the pool lock.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunState {
    /// Completed SELECT_NEXT steps. Never decreases.
    pub iteration: u64,
    /// Workers dispatched so far, INIT included.
    pub dispatched: u64,
    pub started_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl RunState {
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            iteration: 0,
            dispatched: 0,
            started_at: now,
            updated_at: now,
        }
    }

    pub fn load(layout: &RunLayout) -> Result<Self> {
        let path = layout.run_state_path();
        let content = std::fs::read_to_string(&path).map_err(|e| {
            DgaError::Handoff(format!("Cannot read run state {}: {}", path.display(), e))
        })?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn exists(layout: &RunLayout) -> bool {
        layout.run_state_path().exists()
    }

    pub fn save(&mut self, layout: &RunLayout) -> Result<()> {
        self.updated_at = Utc::now();
        let path = layout.run_state_path();
        let tmp = path.with_extension(format!("json.tmp-{}", std::process::id()));
        std::fs::write(&tmp, serde_json::to_string_pretty(self)?)?;
        std::fs::rename(&tmp, &path)?;
        Ok(())
    }
}

impl Default for RunState {
    fn default() -> Self {
        Self::new()
    }
}
