use crate::config::EvolutionConfig;
use crate::engines::generation::operators::{tournament_selection, NumericOperators};
use crate::engines::generation::policy::{FetchOutcome, PolicyContext, SelectionPolicy};
use crate::error::{DgaError, Result};
use crate::pool::{pool_key, GenePool, Predicate, SubsetId};
use crate::types::{CandidateRecord, Payload, PoolKey, Status};
use rand::rngs::StdRng;

pub const POLICY_NAME: &str = "genetic";

/// Steady-state genetic policy.
///
/// Fills the pool with fresh candidates up to capacity, then breeds children
/// from tested parents; each child replaces the lowest-fitness tested record.
pub struct GeneticPolicy {
    pool_capacity: usize,
    num_parents: usize,
    tournament_size: usize,
    operators: Box<dyn NumericOperators>,
    rng: StdRng,
    valid_parents: Option<SubsetId>,
}

impl GeneticPolicy {
    pub fn new(config: &EvolutionConfig, operators: Box<dyn NumericOperators>, rng: StdRng) -> Self {
        Self {
            pool_capacity: config.pool_capacity,
            num_parents: config.num_parents,
            tournament_size: config.tournament_size,
            operators,
            rng,
            valid_parents: None,
        }
    }

    fn valid_parents(&mut self, pool: &mut GenePool) -> SubsetId {
        match self.valid_parents {
            Some(id) if pool.subset(id).is_some() => id,
            _ => {
                let id = pool.register(Predicate::status(Status::Tested));
                self.valid_parents = Some(id);
                id
            }
        }
    }

    /// Draws distinct parents by repeated tournaments over the tested view.
    fn select_parents(&mut self, candidates: Vec<(PoolKey, f64)>) -> Vec<PoolKey> {
        let mut remaining = candidates;
        let mut parents = Vec::with_capacity(self.num_parents);
        while parents.len() < self.num_parents && !remaining.is_empty() {
            let idx = tournament_selection(&remaining, self.tournament_size, &mut self.rng);
            parents.push(remaining.swap_remove(idx).0);
        }
        parents
    }
}

impl SelectionPolicy for GeneticPolicy {
    fn name(&self) -> &str {
        POLICY_NAME
    }

    fn register_views(&mut self, pool: &mut GenePool) {
        self.valid_parents = None;
        self.valid_parents(pool);
    }

    fn fetch_next(&mut self, ctx: &mut PolicyContext<'_>) -> Result<FetchOutcome> {
        let iteration = ctx.iteration;
        if ctx.pool.len() < self.pool_capacity {
            let payload = self.operators.initialize(iteration)?;
            let key = self.admit(ctx, CandidateRecord::new(payload, iteration))?;
            log::debug!("Initialized candidate {} ({} in pool)", key, ctx.pool.len());
            return Ok(FetchOutcome::Ready(key));
        }

        let view_id = self.valid_parents(ctx.pool);
        let view = ctx
            .pool
            .subset(view_id)
            .ok_or_else(|| DgaError::Selection("valid_parents view missing".to_string()))?;
        if view.len() < self.num_parents {
            return Ok(FetchOutcome::NotReady {
                reason: format!(
                    "{} of {} parents evaluated",
                    view.len(),
                    self.num_parents
                ),
            });
        }

        let candidates: Vec<(PoolKey, f64)> = view
            .iter()
            .map(|(k, r)| (k.clone(), r.fitness.unwrap_or(f64::NEG_INFINITY)))
            .collect();
        let parent_keys = self.select_parents(candidates);
        let parents: Vec<Payload> = parent_keys
            .iter()
            .map(|k| {
                ctx.pool
                    .get(k)
                    .map(|r| r.payload.clone())
                    .ok_or_else(|| DgaError::MissingRecord(k.to_string()))
            })
            .collect::<Result<_>>()?;
        let parent_refs: Vec<&Payload> = parents.iter().collect();

        let child = self.operators.crossover(&parent_refs, iteration)?;
        let child = self.operators.mutate(child)?;
        let key = self.admit(ctx, CandidateRecord::new(child, iteration))?;
        log::debug!("Bred candidate {} from {} parents", key, parent_keys.len());
        Ok(FetchOutcome::Ready(key))
    }

    fn admit(&mut self, ctx: &mut PolicyContext<'_>, record: CandidateRecord) -> Result<PoolKey> {
        let key = pool_key(&record.payload);

        if !ctx.pool.contains_key(&key) && ctx.pool.len() >= self.pool_capacity {
            let worst = ctx.pool.worst_tested().map(|(k, r)| (k.clone(), r.fitness));
            if let Some((worst_key, fitness)) = worst {
                ctx.store.delete(&worst_key)?;
                ctx.pool.delete(&worst_key);
                log::debug!("Evicted {} (fitness {:?})", worst_key, fitness);
            }
        }

        let record = record.being_tested();
        ctx.store.put(&key, &record)?;
        ctx.pool.set(key.clone(), record);
        Ok(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engines::generation::operators::{rng_for, GeneOperators};
    use crate::pool::{CandidateStore, RunLayout};

    fn policy(config: &EvolutionConfig) -> GeneticPolicy {
        let operators = GeneOperators::new(config, 0, rng_for(Some(7), 1));
        GeneticPolicy::new(config, Box::new(operators), rng_for(Some(7), 2))
    }

    fn mark_tested(pool: &mut GenePool, store: &CandidateStore, key: &PoolKey, fitness: f64) {
        let mut record = store.get(key).unwrap();
        record.set_fitness(fitness);
        store.put(key, &record).unwrap();
        pool.set(key.clone(), record);
    }

    #[test]
    fn test_fills_then_waits_for_parents_then_evicts_worst() {
        let dir = tempfile::tempdir().unwrap();
        let store = CandidateStore::open(&RunLayout::new(dir.path())).unwrap();
        let config = EvolutionConfig {
            pool_capacity: 3,
            num_parents: 2,
            shape: vec![4],
            ..Default::default()
        };
        let mut policy = policy(&config);
        let mut pool = GenePool::new();
        policy.register_views(&mut pool);

        let mut keys = Vec::new();
        for iteration in 0..3 {
            let mut ctx = PolicyContext { pool: &mut pool, store: &store, iteration };
            match policy.fetch_next(&mut ctx).unwrap() {
                FetchOutcome::Ready(key) => keys.push(key),
                other => panic!("expected a fresh candidate, got {:?}", other),
            }
        }
        assert_eq!(store.list().unwrap().len(), 3);
        assert!(pool.iter().all(|(_, r)| r.status == Status::BeingTested));

        let mut ctx = PolicyContext { pool: &mut pool, store: &store, iteration: 3 };
        assert!(!policy.fetch_next(&mut ctx).unwrap().is_success());
        assert_eq!(store.list().unwrap().len(), 3);

        mark_tested(&mut pool, &store, &keys[0], 0.1);
        mark_tested(&mut pool, &store, &keys[1], 0.9);

        let mut ctx = PolicyContext { pool: &mut pool, store: &store, iteration: 4 };
        let outcome = policy.fetch_next(&mut ctx).unwrap();
        let child = outcome.key().unwrap().clone();

        assert_eq!(pool.len(), 3);
        assert!(!pool.contains_key(&keys[0]));
        assert!(!store.contains(&keys[0]));
        assert!(pool.contains_key(&keys[1]));
        assert!(pool.contains_key(&keys[2]));
        assert_eq!(store.get(&child).unwrap().status, Status::BeingTested);
    }

    #[test]
    fn test_readmitting_same_payload_keeps_one_entry() {
        let dir = tempfile::tempdir().unwrap();
        let store = CandidateStore::open(&RunLayout::new(dir.path())).unwrap();
        let config = EvolutionConfig::default();
        let mut policy = policy(&config);
        let mut pool = GenePool::new();
        policy.register_views(&mut pool);

        let payload = Payload::from_values(vec![1.0, 2.0, 3.0]);
        let mut ctx = PolicyContext { pool: &mut pool, store: &store, iteration: 0 };
        let a = policy.admit(&mut ctx, CandidateRecord::new(payload.clone(), 0)).unwrap();
        let b = policy.admit(&mut ctx, CandidateRecord::new(payload, 1)).unwrap();

        assert_eq!(a, b);
        assert_eq!(pool.len(), 1);
        assert_eq!(store.list().unwrap().len(), 1);
        assert_eq!(store.get(&a).unwrap().iteration, 1);
    }
}
