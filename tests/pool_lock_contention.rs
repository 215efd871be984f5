use distga::pool::{pool_key, CandidateStore, PoolLock, RunLayout};
use distga::types::{CandidateRecord, Payload, PoolKey};
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

const WRITERS: usize = 6;
const ROUNDS: usize = 15;

fn shared_keys() -> Vec<(PoolKey, Payload)> {
    [vec![1.0, 1.0], vec![2.0, 2.0]]
        .into_iter()
        .map(|values| {
            let payload = Payload::from_values(values);
            (pool_key(&payload), payload)
        })
        .collect()
}

#[test]
fn test_racing_writers_serialise_read_modify_write() {
    let dir = tempfile::tempdir().unwrap();
    let layout = RunLayout::new(dir.path());
    layout.create_dirs().unwrap();
    let store = CandidateStore::open(&layout).unwrap();

    let keys = shared_keys();
    for (key, payload) in &keys {
        let mut record = CandidateRecord::new(payload.clone(), 0);
        record.set_fitness(0.0);
        store.put(key, &record).unwrap();
    }

    let barrier = Arc::new(Barrier::new(WRITERS));
    let handles: Vec<_> = (0..WRITERS)
        .map(|writer| {
            let layout = layout.clone();
            let keys = keys.clone();
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                let store = CandidateStore::open(&layout).unwrap();
                let lock = PoolLock::new(
                    layout.lock_path(),
                    Duration::from_secs(30),
                    Duration::from_millis(1),
                );
                barrier.wait();
                for round in 0..ROUNDS {
                    let (key, _) = &keys[(writer + round) % keys.len()];
                    let _guard = lock.acquire().unwrap();
                    let mut record = store.get(key).unwrap();
                    let seen = record.fitness.unwrap_or(0.0);
                    thread::sleep(Duration::from_micros(200));
                    record.set_fitness(seen + 1.0);
                    record.iteration += 1;
                    store.put(key, &record).unwrap();
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    // Lost updates would leave the totals short.
    let total: f64 = keys
        .iter()
        .map(|(key, _)| store.get(key).unwrap().fitness.unwrap())
        .sum();
    assert_eq!(total, (WRITERS * ROUNDS) as f64);
    for (key, _) in &keys {
        let record = store.get(key).unwrap();
        assert_eq!(record.fitness, Some(record.iteration as f64));
    }
    assert_eq!(std::fs::read_to_string(layout.lock_path()).unwrap(), "");
}

#[test]
fn test_lock_held_by_other_writer_times_out() {
    let dir = tempfile::tempdir().unwrap();
    let layout = RunLayout::new(dir.path());
    layout.create_dirs().unwrap();

    let lock = PoolLock::new(layout.lock_path(), Duration::from_millis(50), Duration::from_millis(5));
    let _held = lock.acquire().unwrap();

    let contender = PoolLock::new(layout.lock_path(), Duration::from_millis(50), Duration::from_millis(5));
    let err = contender.acquire().unwrap_err();
    assert!(matches!(err, distga::DgaError::LockTimeout { .. }));
}
