use crate::error::{DgaError, Result};
use crate::pool::gene_pool::GenePool;
use crate::pool::layout::{RunLayout, RECORD_EXT};
use crate::types::{CandidateRecord, PoolKey};
use std::collections::BTreeSet;
use std::fs;
use std::io::ErrorKind;

/// File-backed candidate records under `<run>/pool/`.
///
/// Callers must hold the pool lock for every call except `get` on a record
/// already known to be tested. Missing or unreadable records are errors; this
/// layer never repairs them.
#[derive(Debug, Clone)]
pub struct CandidateStore {
    layout: RunLayout,
}

impl CandidateStore {
    pub fn open(layout: &RunLayout) -> Result<Self> {
        fs::create_dir_all(layout.pool_dir())?;
        Ok(Self {
            layout: layout.clone(),
        })
    }

    pub fn layout(&self) -> &RunLayout {
        &self.layout
    }

    /// Writes the record to a temporary sibling, then renames it into place.
    pub fn put(&self, key: &PoolKey, record: &CandidateRecord) -> Result<()> {
        let path = self.layout.record_path(key.as_str());
        let tmp_path = path.with_extension(format!("{RECORD_EXT}.tmp-{}", std::process::id()));
        let bytes = serde_json::to_vec(record)?;
        fs::write(&tmp_path, bytes)?;
        fs::rename(&tmp_path, &path)?;
        Ok(())
    }

    pub fn get(&self, key: &PoolKey) -> Result<CandidateRecord> {
        let path = self.layout.record_path(key.as_str());
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(DgaError::MissingRecord(key.to_string()))
            }
            Err(e) => return Err(e.into()),
        };
        serde_json::from_slice(&bytes).map_err(|e| DgaError::CorruptRecord {
            key: key.to_string(),
            reason: e.to_string(),
        })
    }

    pub fn delete(&self, key: &PoolKey) -> Result<()> {
        match fs::remove_file(self.layout.record_path(key.as_str())) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(DgaError::MissingRecord(key.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    pub fn contains(&self, key: &PoolKey) -> bool {
        self.layout.record_path(key.as_str()).is_file()
    }

    /// Keys of every record file currently in the pool directory.
    pub fn list(&self) -> Result<BTreeSet<PoolKey>> {
        let mut keys = BTreeSet::new();
        for entry in fs::read_dir(self.layout.pool_dir())? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some(RECORD_EXT) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                keys.insert(PoolKey::new(stem));
            }
        }
        Ok(keys)
    }

    /// Rebuilds a pool by scanning every record file.
    pub fn load_pool(&self) -> Result<GenePool> {
        let mut pool = GenePool::new();
        for key in self.list()? {
            let record = self.get(&key)?;
            pool.set(key, record);
        }
        log::debug!("Loaded {} records from {}", pool.len(), self.layout.pool_dir().display());
        Ok(pool)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::hasher::pool_key;
    use crate::types::{Payload, Status};

    fn store() -> (tempfile::TempDir, CandidateStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = CandidateStore::open(&RunLayout::new(dir.path())).unwrap();
        (dir, store)
    }

    #[test]
    fn test_put_get_list() {
        let (_dir, store) = store();
        let record = CandidateRecord::new(Payload::from_values(vec![1.0, 2.0]), 3);
        let key = pool_key(&record.payload);

        store.put(&key, &record).unwrap();

        assert_eq!(store.get(&key).unwrap(), record);
        assert_eq!(store.list().unwrap().into_iter().collect::<Vec<_>>(), vec![key.clone()]);
        assert!(store.contains(&key));
    }

    #[test]
    fn test_overwrite_last_write_wins() {
        let (_dir, store) = store();
        let mut record = CandidateRecord::new(Payload::from_values(vec![1.0, 2.0, 3.0]), 0);
        let key = pool_key(&record.payload);
        store.put(&key, &record).unwrap();

        record.set_fitness(0.25);
        store.put(&key, &record).unwrap();

        assert_eq!(store.list().unwrap().len(), 1);
        let loaded = store.get(&key).unwrap();
        assert_eq!(loaded.status, Status::Tested);
        assert_eq!(loaded.fitness, Some(0.25));
    }

    #[test]
    fn test_missing_record_is_error() {
        let (_dir, store) = store();
        let err = store.get(&PoolKey::new("absent")).unwrap_err();
        assert!(matches!(err, DgaError::MissingRecord(_)));
        assert!(matches!(
            store.delete(&PoolKey::new("absent")).unwrap_err(),
            DgaError::MissingRecord(_)
        ));
    }

    #[test]
    fn test_corrupt_record_is_error() {
        let (_dir, store) = store();
        let key = PoolKey::new("broken");
        fs::write(store.layout().record_path(key.as_str()), b"{not json").unwrap();

        let err = store.get(&key).unwrap_err();
        assert!(matches!(err, DgaError::CorruptRecord { .. }));
        assert!(store.load_pool().is_err());
    }

    #[test]
    fn test_list_skips_foreign_files() {
        let (_dir, store) = store();
        fs::write(store.layout().pool_dir().join("notes.txt"), b"x").unwrap();
        fs::write(store.layout().pool_dir().join("abc.json.tmp-1"), b"x").unwrap();
        assert!(store.list().unwrap().is_empty());
    }

    #[test]
    fn test_load_pool_mirrors_store() {
        let (_dir, store) = store();
        for i in 0..3 {
            let record = CandidateRecord::new(Payload::from_values(vec![i as f64]), i);
            store.put(&pool_key(&record.payload), &record).unwrap();
        }

        let pool = store.load_pool().unwrap();
        assert_eq!(pool.len(), 3);
        for key in store.list().unwrap() {
            assert_eq!(pool.get(&key), Some(&store.get(&key).unwrap()));
        }
    }
}
