use crate::pool::subset::{Predicate, SubsetPool};
use crate::types::{CandidateRecord, PoolKey};
use std::collections::BTreeMap;

/// Contents of a pool or view, keyed by content address.
pub type Members = BTreeMap<PoolKey, CandidateRecord>;

/// Handle to a view registered on a particular pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubsetId(usize);

/// In-process mirror of the candidate store plus the views derived from it.
///
/// Every mutation goes through `set` or `delete`, which push the change into
/// each registered [`SubsetPool`]. A pool rebuilt from disk by another process
/// never saw those incremental updates, so views registered after a reload are
/// seeded from the full contents, and `resync` recomputes every view when the
/// contents changed behind the views' back.
#[derive(Debug, Default)]
pub struct GenePool {
    members: Members,
    subsets: Vec<SubsetPool>,
}

impl GenePool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn get(&self, key: &PoolKey) -> Option<&CandidateRecord> {
        self.members.get(key)
    }

    pub fn contains_key(&self, key: &PoolKey) -> bool {
        self.members.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &PoolKey> {
        self.members.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&PoolKey, &CandidateRecord)> {
        self.members.iter()
    }

    pub fn members(&self) -> &Members {
        &self.members
    }

    /// Inserts or overwrites, then re-tests the key against every view.
    pub fn set(&mut self, key: PoolKey, record: CandidateRecord) {
        self.members.insert(key.clone(), record);
        let record = &self.members[&key];
        for subset in &mut self.subsets {
            subset.offer(&key, record, &self.members);
        }
    }

    /// Removes the key from the pool and from every view holding it.
    pub fn delete(&mut self, key: &PoolKey) -> Option<CandidateRecord> {
        let removed = self.members.remove(key)?;
        for subset in &mut self.subsets {
            subset.delete(key);
        }
        Some(removed)
    }

    /// Creates a view seeded with every current entry the predicate accepts.
    pub fn register(&mut self, predicate: Predicate) -> SubsetId {
        let mut subset = SubsetPool::new(predicate);
        subset.rebuild(&self.members);
        self.subsets.push(subset);
        SubsetId(self.subsets.len() - 1)
    }

    pub fn subset(&self, id: SubsetId) -> Option<&SubsetPool> {
        self.subsets.get(id.0)
    }

    pub fn subset_mut(&mut self, id: SubsetId) -> Option<&mut SubsetPool> {
        self.subsets.get_mut(id.0)
    }

    pub fn subset_count(&self) -> usize {
        self.subsets.len()
    }

    /// Recomputes every view (and the views chained below them) from scratch.
    pub fn resync(&mut self) {
        for subset in &mut self.subsets {
            subset.rebuild(&self.members);
        }
    }

    /// Tested record with the lowest fitness.
    pub fn worst_tested(&self) -> Option<(&PoolKey, &CandidateRecord)> {
        self.tested()
            .min_by(|a, b| fitness_of(a.1).total_cmp(&fitness_of(b.1)))
    }

    /// Tested record with the highest fitness.
    pub fn best_tested(&self) -> Option<(&PoolKey, &CandidateRecord)> {
        self.tested()
            .max_by(|a, b| fitness_of(a.1).total_cmp(&fitness_of(b.1)))
    }

    pub fn tested_count(&self) -> usize {
        self.tested().count()
    }

    fn tested(&self) -> impl Iterator<Item = (&PoolKey, &CandidateRecord)> {
        self.members
            .iter()
            .filter(|(_, r)| r.is_tested() && r.fitness.is_some())
    }

    /// Raw insert with no cascade; callers rebuild views afterwards.
    pub(crate) fn members_insert(&mut self, key: PoolKey, record: CandidateRecord) {
        self.members.insert(key, record);
    }

    pub(crate) fn clear_members(&mut self) {
        self.members.clear();
    }
}

fn fitness_of(record: &CandidateRecord) -> f64 {
    record.fitness.unwrap_or(f64::NEG_INFINITY)
}
