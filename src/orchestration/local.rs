use crate::config::AppConfig;
use crate::engines::generation::{FetchOutcome, PolicyContext};
use crate::error::{DgaError, Result};
use crate::orchestration::orchestrator::RunSummary;
use crate::orchestration::state::RunState;
use crate::pool::{CandidateStore, LogEntry, PoolLock, RunLayout, RunLog};
use crate::registry::Registry;

/// Log name used by the single in-process worker.
pub const LOCAL_LOG_NAME: &str = "agent_0";

/// Runs the whole fetch/evaluate/record loop in one process.
///
/// Uses the same store, policy and model as the distributed chain but keeps
/// one GenePool alive for the whole run instead of rebuilding it per step.
pub struct LocalRunner<'a> {
    config: AppConfig,
    registry: &'a Registry,
}

impl<'a> LocalRunner<'a> {
    pub fn new(config: AppConfig, registry: &'a Registry) -> Result<Self> {
        config.validate()?;
        registry.check(&config)?;
        Ok(Self { config, registry })
    }

    pub fn run(&self) -> Result<RunSummary> {
        let layout = RunLayout::new(&self.config.run.run_name);
        layout.create_dirs()?;
        let store = CandidateStore::open(&layout)?;
        let lock = PoolLock::new(
            layout.lock_path(),
            self.config.run.lock_timeout(),
            self.config.run.lock_poll(),
        );
        let log = RunLog::new(&layout, LOCAL_LOG_NAME);
        let budget = self.config.run.iterations;

        let (mut pool, mut state) = {
            let _guard = lock.acquire()?;
            let state = if RunState::exists(&layout) {
                RunState::load(&layout)?
            } else {
                RunState::new()
            };
            (store.load_pool()?, state)
        };

        let mut policy = self.registry.create_policy(&self.config, state.iteration, 0)?;
        policy.register_views(&mut pool);
        let mut model = self.registry.create_model(&self.config)?;
        log::info!(
            "Local run in {} from iteration {} to {}",
            layout.root().display(),
            state.iteration,
            budget
        );

        while state.iteration < budget {
            let iteration = state.iteration;
            let key = {
                let _guard = lock.acquire()?;
                let mut ctx = PolicyContext {
                    pool: &mut pool,
                    store: &store,
                    iteration,
                };
                match policy.fetch_next(&mut ctx)? {
                    FetchOutcome::Ready(key) => key,
                    FetchOutcome::NotReady { reason } => {
                        return Err(DgaError::Selection(format!(
                            "Local run stalled at iteration {}: {}",
                            iteration, reason
                        )));
                    }
                }
            };

            let mut record = pool
                .get(&key)
                .cloned()
                .ok_or_else(|| DgaError::MissingRecord(key.to_string()))?;
            let fitness = model.evaluate(&record.payload)?;
            record.set_fitness(fitness);

            let _guard = lock.acquire()?;
            store.put(&key, &record)?;
            pool.set(key.clone(), record.clone());
            pool.resync();
            log.append(&LogEntry::from_record(0, iteration, &key, &record))?;

            state.iteration += 1;
            state.dispatched += 1;
            state.save(&layout)?;
            log::debug!("Iteration {}: {} scored {:.6}", iteration, key, fitness);
        }

        let summary = RunSummary::from_pool(&layout, &pool, &state, budget);
        log::info!("Local run finished with {} tested candidates", summary.tested);
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(dir: &std::path::Path) -> AppConfig {
        let mut config = AppConfig::default();
        config.run.run_name = dir.join("local");
        config.run.iterations = 25;
        config.evolution.pool_capacity = 5;
        config.evolution.shape = vec![3];
        config.evolution.seed = Some(11);
        config
    }

    #[test]
    fn test_local_run_spends_budget_and_logs_every_iteration() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(dir.path());
        let registry = Registry::new();

        let summary = LocalRunner::new(config.clone(), &registry).unwrap().run().unwrap();

        assert_eq!(summary.iteration, 25);
        assert!(summary.population <= 5);
        assert_eq!(summary.tested, summary.population);
        assert!(summary.best.is_some());

        let layout = RunLayout::new(&config.run.run_name);
        let entries = RunLog::new(&layout, LOCAL_LOG_NAME).read_all().unwrap();
        assert_eq!(entries.len(), 25);
        assert!(entries.iter().all(|e| e.fitness.is_some()));
    }

    #[test]
    fn test_local_run_resumes_from_saved_counter() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config(dir.path());
        let registry = Registry::new();
        config.run.iterations = 10;
        LocalRunner::new(config.clone(), &registry).unwrap().run().unwrap();

        config.run.iterations = 15;
        let summary = LocalRunner::new(config, &registry).unwrap().run().unwrap();
        assert_eq!(summary.iteration, 15);
        assert_eq!(summary.dispatched, 15);
    }
}
