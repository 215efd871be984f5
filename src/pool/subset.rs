use crate::pool::gene_pool::{GenePool, Members, SubsetId};
use crate::types::{CandidateRecord, PoolKey, Status};
use std::fmt;
use std::sync::Arc;

type PredicateFn = dyn Fn(&PoolKey, &CandidateRecord, &Members) -> bool + Send + Sync;

/// Membership rule of a view.
///
/// The third argument is the parent pool's contents when a change cascades
/// down (or the view's own contents on a direct `set`). Rules that look at it,
/// such as [`Predicate::top_by_fitness`], are only re-evaluated for the key
/// being written; call `resync` to bring the rest of the view up to date.
#[derive(Clone)]
pub struct Predicate(Arc<PredicateFn>);

impl Predicate {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&PoolKey, &CandidateRecord) -> bool + Send + Sync + 'static,
    {
        Self(Arc::new(
            move |key: &PoolKey, record: &CandidateRecord, _: &Members| f(key, record),
        ))
    }

    pub fn with_context<F>(f: F) -> Self
    where
        F: Fn(&PoolKey, &CandidateRecord, &Members) -> bool + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    pub fn status(status: Status) -> Self {
        Self::new(move |_, record| record.status == status)
    }

    /// Accepts a record if fewer than `n` other members have a higher
    /// fitness. Ties go to the smaller key; unevaluated records never match.
    pub fn top_by_fitness(n: usize) -> Self {
        Self::with_context(move |key, record, members| {
            let Some(fitness) = record.fitness else {
                return false;
            };
            let better = members
                .iter()
                .filter(|(k, _)| *k != key)
                .filter(|(k, r)| match r.fitness {
                    Some(f) => f > fitness || (f == fitness && *k < key),
                    None => false,
                })
                .count();
            better < n
        })
    }

    pub fn test(&self, key: &PoolKey, record: &CandidateRecord, context: &Members) -> bool {
        (self.0)(key, record, context)
    }
}

impl fmt::Debug for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Predicate(..)")
    }
}

/// Predicate-filtered view kept in step with the pool it is registered on.
///
/// Writes are gated: `set` silently ignores records the predicate rejects, so
/// callers can push every candidate into every view. Views can host views of
/// their own.
#[derive(Debug)]
pub struct SubsetPool {
    predicate: Predicate,
    pool: GenePool,
}

impl SubsetPool {
    pub(crate) fn new(predicate: Predicate) -> Self {
        Self {
            predicate,
            pool: GenePool::new(),
        }
    }

    /// Inserts only if the predicate accepts; returns whether it did.
    pub fn set(&mut self, key: PoolKey, record: CandidateRecord) -> bool {
        if !self.predicate.test(&key, &record, self.pool.members()) {
            return false;
        }
        self.pool.set(key, record);
        true
    }

    /// Removes the key whether or not the predicate still holds.
    pub fn delete(&mut self, key: &PoolKey) -> Option<CandidateRecord> {
        self.pool.delete(key)
    }

    pub fn register(&mut self, predicate: Predicate) -> SubsetId {
        self.pool.register(predicate)
    }

    pub fn subset(&self, id: SubsetId) -> Option<&SubsetPool> {
        self.pool.subset(id)
    }

    pub fn subset_mut(&mut self, id: SubsetId) -> Option<&mut SubsetPool> {
        self.pool.subset_mut(id)
    }

    pub fn resync(&mut self) {
        self.pool.resync();
    }

    /// Read-only access to the view's contents.
    pub fn pool(&self) -> &GenePool {
        &self.pool
    }

    pub fn len(&self) -> usize {
        self.pool.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pool.is_empty()
    }

    pub fn get(&self, key: &PoolKey) -> Option<&CandidateRecord> {
        self.pool.get(key)
    }

    pub fn contains_key(&self, key: &PoolKey) -> bool {
        self.pool.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &PoolKey> {
        self.pool.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&PoolKey, &CandidateRecord)> {
        self.pool.iter()
    }

    /// Applies a parent-side write of `key`.
    pub(crate) fn offer(&mut self, key: &PoolKey, record: &CandidateRecord, parent: &Members) {
        if self.predicate.test(key, record, parent) {
            self.pool.set(key.clone(), record.clone());
        } else if self.pool.contains_key(key) {
            self.pool.delete(key);
        }
    }

    /// Replaces the contents with the parent's accepted entries and rebuilds
    /// chained views.
    pub(crate) fn rebuild(&mut self, parent: &Members) {
        self.pool.clear_members();
        for (key, record) in parent {
            if self.predicate.test(key, record, parent) {
                self.pool.members_insert(key.clone(), record.clone());
            }
        }
        self.pool.resync();
    }
}
