use thiserror::Error;

#[derive(Error, Debug)]
pub enum DgaError {
    #[error("Timed out after {waited_secs}s waiting for pool lock {path} (holder: {holder})")]
    LockTimeout {
        path: String,
        waited_secs: u64,
        holder: String,
    },

    #[error("Missing candidate record: {0}")]
    MissingRecord(String),

    #[error("Corrupt candidate record {key}: {reason}")]
    CorruptRecord { key: String, reason: String },

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Handoff error: {0}")]
    Handoff(String),

    #[error("Failed to spawn step for worker {worker_id}: {reason}")]
    Spawn { worker_id: usize, reason: String },

    #[error("Unknown {kind}: {name}")]
    UnknownComponent { kind: &'static str, name: String },

    #[error("Selection error: {0}")]
    Selection(String),

    #[error("Evaluation error: {0}")]
    Evaluation(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serde error: {0}")]
    Serde(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, DgaError>;
