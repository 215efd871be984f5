use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Content address of a candidate, derived from its payload bytes.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PoolKey(String);

impl PoolKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PoolKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Numeric parameter blob: row-major values plus their dimensions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payload {
    pub shape: Vec<usize>,
    pub values: Vec<f64>,
}

impl Payload {
    pub fn new(shape: Vec<usize>, values: Vec<f64>) -> Self {
        Self { shape, values }
    }

    /// A one-dimensional payload.
    pub fn from_values(values: Vec<f64>) -> Self {
        Self {
            shape: vec![values.len()],
            values,
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Little-endian bytes of the values; the shape does not take part.
    pub fn to_bytes(&self) -> Vec<u8> {
        self.values.iter().flat_map(|v| v.to_le_bytes()).collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Pending,
    BeingTested,
    Tested,
}

/// One candidate as persisted in the pool directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateRecord {
    pub payload: Payload,
    pub fitness: Option<f64>,
    pub status: Status,
    pub iteration: u64,
    pub timestamp: DateTime<Utc>,
}

impl CandidateRecord {
    pub fn new(payload: Payload, iteration: u64) -> Self {
        Self {
            payload,
            fitness: None,
            status: Status::Pending,
            iteration,
            timestamp: Utc::now(),
        }
    }

    pub fn being_tested(mut self) -> Self {
        self.status = Status::BeingTested;
        self
    }

    /// Marks the record evaluated with the given score.
    pub fn set_fitness(&mut self, fitness: f64) {
        self.fitness = Some(fitness);
        self.status = Status::Tested;
    }

    pub fn is_tested(&self) -> bool {
        self.status == Status::Tested
    }
}
