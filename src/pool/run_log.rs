use crate::error::Result;
use crate::pool::layout::RunLayout;
use crate::types::{CandidateRecord, PoolKey};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;

/// One line of a worker log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub timestamp: DateTime<Utc>,
    pub worker_id: usize,
    pub iteration: u64,
    pub key: PoolKey,
    pub fitness: Option<f64>,
    pub payload: Vec<f64>,
}

impl LogEntry {
    pub fn from_record(worker_id: usize, iteration: u64, key: &PoolKey, record: &CandidateRecord) -> Self {
        Self {
            timestamp: Utc::now(),
            worker_id,
            iteration,
            key: key.clone(),
            fitness: record.fitness,
            payload: record.payload.values.clone(),
        }
    }
}

/// Append-only JSON-lines log under `<run>/logs/`.
#[derive(Debug, Clone)]
pub struct RunLog {
    path: PathBuf,
}

impl RunLog {
    pub fn new(layout: &RunLayout, log_name: &str) -> Self {
        Self {
            path: layout.log_path(log_name),
        }
    }

    pub fn for_worker(layout: &RunLayout, worker_id: usize) -> Self {
        Self::new(layout, &worker_id.to_string())
    }

    pub fn append(&self, entry: &LogEntry) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut file = OpenOptions::new().create(true).append(true).open(&self.path)?;
        writeln!(file, "{}", serde_json::to_string(entry)?)?;
        Ok(())
    }

    pub fn read_all(&self) -> Result<Vec<LogEntry>> {
        let file = match std::fs::File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        let mut entries = Vec::new();
        for line in BufReader::new(file).lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            entries.push(serde_json::from_str(&line)?);
        }
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::hasher::pool_key;
    use crate::types::Payload;

    #[test]
    fn test_append_and_read_back() {
        let dir = tempfile::tempdir().unwrap();
        let layout = RunLayout::new(dir.path());
        let log = RunLog::for_worker(&layout, 3);

        assert!(log.read_all().unwrap().is_empty());

        let mut record = CandidateRecord::new(Payload::from_values(vec![1.0, 2.0]), 0);
        record.set_fitness(-5.0);
        let key = pool_key(&record.payload);
        log.append(&LogEntry::from_record(3, 1, &key, &record)).unwrap();
        log.append(&LogEntry::from_record(3, 2, &key, &record)).unwrap();

        let entries = log.read_all().unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1].iteration, 2);
        assert_eq!(entries[0].fitness, Some(-5.0));
        assert!(layout.log_path("3").is_file());
    }
}
