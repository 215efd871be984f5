use distga::pool::{pool_key, CandidateStore, GenePool, Predicate, RunLayout, SubsetPool};
use distga::types::{CandidateRecord, Payload, PoolKey, Status};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::BTreeMap;

fn candidate(values: Vec<f64>, fitness: Option<f64>) -> (PoolKey, CandidateRecord) {
    let mut record = CandidateRecord::new(Payload::from_values(values), 0);
    if let Some(f) = fitness {
        record.set_fitness(f);
    }
    (pool_key(&record.payload), record)
}

fn fitness_keys(view: &SubsetPool) -> Vec<f64> {
    let mut fitness: Vec<f64> = view.iter().filter_map(|(_, r)| r.fitness).collect();
    fitness.sort_by(|a, b| a.total_cmp(b));
    fitness
}

/// Checks a view against `{k:v in parent | predicate(k,v)}`.
fn assert_view_matches(parent: &GenePool, view: &SubsetPool, predicate: &Predicate) {
    let expected: BTreeMap<&PoolKey, &CandidateRecord> = parent
        .iter()
        .filter(|(k, r)| predicate.test(k, r, parent.members()))
        .collect();
    let actual: BTreeMap<&PoolKey, &CandidateRecord> = view.iter().collect();
    assert_eq!(actual, expected);
}

#[test]
fn test_views_track_random_set_delete_sequences() {
    let mut rng = StdRng::seed_from_u64(2024);
    let tested = Predicate::status(Status::Tested);
    let positive = Predicate::new(|_, r| r.fitness.map_or(false, |f| f > 0.0));

    let mut pool = GenePool::new();
    let tested_id = pool.register(tested.clone());
    let positive_id = pool.register(positive.clone());
    let chained_id = pool
        .subset_mut(tested_id)
        .unwrap()
        .register(positive.clone());

    // Small value range so keys collide and overwrites happen.
    for _ in 0..300 {
        let value = rng.gen_range(0..12) as f64;
        if rng.gen_bool(0.25) {
            let (key, _) = candidate(vec![value], None);
            pool.delete(&key);
        } else {
            let fitness = if rng.gen_bool(0.5) {
                Some(rng.gen_range(-1.0..1.0))
            } else {
                None
            };
            let (key, mut record) = candidate(vec![value], fitness);
            if fitness.is_none() && rng.gen_bool(0.5) {
                record = record.being_tested();
            }
            pool.set(key, record);
        }

        let tested_view = pool.subset(tested_id).unwrap();
        assert_view_matches(&pool, tested_view, &tested);
        assert_view_matches(&pool, pool.subset(positive_id).unwrap(), &positive);
        assert_view_matches(
            tested_view.pool(),
            tested_view.subset(chained_id).unwrap(),
            &positive,
        );
    }
}

#[test]
fn test_top_two_view_selects_best_records() {
    let mut pool = GenePool::new();
    for (value, fitness) in [(1.0, 0.1), (2.0, 0.5), (3.0, 0.9)] {
        let (key, record) = candidate(vec![value], Some(fitness));
        pool.set(key, record);
    }

    let top = pool.register(Predicate::top_by_fitness(2));
    assert_eq!(fitness_keys(pool.subset(top).unwrap()), vec![0.5, 0.9]);
}

#[test]
fn test_top_two_view_after_insert_and_resync() {
    let mut pool = GenePool::new();
    for (value, fitness) in [(1.0, 0.1), (2.0, 0.5), (3.0, 0.9)] {
        let (key, record) = candidate(vec![value], Some(fitness));
        pool.set(key, record);
    }
    let top = pool.register(Predicate::top_by_fitness(2));

    let (key, record) = candidate(vec![4.0], Some(0.7));
    pool.set(key, record);
    pool.resync();

    assert_eq!(fitness_keys(pool.subset(top).unwrap()), vec![0.7, 0.9]);
}

#[test]
fn test_identical_payloads_collapse_to_one_record() {
    let payload = Payload::from_values(vec![1.0, 2.0, 3.0]);
    assert_eq!(pool_key(&payload), pool_key(&payload.clone()));

    let dir = tempfile::tempdir().unwrap();
    let store = CandidateStore::open(&RunLayout::new(dir.path())).unwrap();
    for iteration in 0..2 {
        let record = CandidateRecord::new(payload.clone(), iteration);
        store.put(&pool_key(&payload), &record).unwrap();
    }

    let pool = store.load_pool().unwrap();
    assert_eq!(pool.len(), 1);
    assert_eq!(pool.get(&pool_key(&payload)).unwrap().iteration, 1);
}

#[test]
fn test_tested_view_gates_direct_writes_but_follows_parent() {
    let mut pool = GenePool::new();
    let view = pool.register(Predicate::status(Status::Tested));
    let (key, pending) = candidate(vec![5.0, 6.0], None);

    let accepted = pool.subset_mut(view).unwrap().set(key.clone(), pending.clone());
    assert!(!accepted);
    assert_eq!(pool.subset(view).unwrap().len(), 0);

    pool.set(key.clone(), pending.clone());
    assert!(pool.subset(view).unwrap().is_empty());

    let mut tested = pending;
    tested.set_fitness(1.5);
    pool.set(key.clone(), tested);
    assert!(pool.subset(view).unwrap().contains_key(&key));
    assert_eq!(pool.subset(view).unwrap().len(), 1);
}
