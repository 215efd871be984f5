use crate::config::AppConfig;
use crate::engines::generation::{FetchOutcome, PolicyContext};
use crate::error::{DgaError, Result};
use crate::orchestration::handoff::{CallType, Handoff};
use crate::orchestration::spawner::Spawner;
use crate::orchestration::state::RunState;
use crate::pool::{CandidateStore, GenePool, LogEntry, PoolLock, RunLayout, RunLog};
use crate::registry::Registry;
use crate::types::PoolKey;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// What a single process step did before exiting.
#[derive(Debug, Clone, PartialEq)]
pub enum StepOutcome {
    /// INIT dispatched one worker per slot.
    Started { keys: Vec<PoolKey> },
    /// A continuation step was handed off to `worker_id`.
    Dispatched {
        worker_id: usize,
        call_type: CallType,
        key: PoolKey,
    },
    /// The iteration budget is spent; nothing further was spawned.
    Done { iteration: u64 },
}

/// Snapshot of a run for `distga status`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub run_dir: PathBuf,
    pub population: usize,
    pub tested: usize,
    pub best: Option<(PoolKey, f64)>,
    pub iteration: u64,
    pub dispatched: u64,
    pub budget: u64,
}

impl RunSummary {
    pub fn from_pool(layout: &RunLayout, pool: &GenePool, state: &RunState, budget: u64) -> Self {
        Self {
            run_dir: layout.root().to_path_buf(),
            population: pool.len(),
            tested: pool.tested_count(),
            best: pool
                .best_tested()
                .and_then(|(k, r)| r.fitness.map(|f| (k.clone(), f))),
            iteration: state.iteration,
            dispatched: state.dispatched,
            budget,
        }
    }

    pub fn is_done(&self) -> bool {
        self.iteration >= self.budget
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Run:         {}", self.run_dir.display())?;
        writeln!(f, "Iteration:   {} / {}", self.iteration, self.budget)?;
        writeln!(f, "Dispatched:  {}", self.dispatched)?;
        writeln!(f, "Population:  {} ({} tested)", self.population, self.tested)?;
        match &self.best {
            Some((key, fitness)) => write!(f, "Best:        {:.6} ({})", fitness, key),
            None => write!(f, "Best:        none yet"),
        }
    }
}

/// Drives the INIT → DISPATCH_WORKER → RECORD_RESULT → SELECT_NEXT chain.
///
/// Every method runs inside one short-lived process; state only crosses
/// process boundaries through the run directory.
pub struct Orchestrator<'a> {
    layout: RunLayout,
    config: AppConfig,
    registry: &'a Registry,
    spawner: &'a dyn Spawner,
}

impl<'a> Orchestrator<'a> {
    /// Orchestrator for the run directory named by `config.run.run_name`.
    pub fn new(config: AppConfig, registry: &'a Registry, spawner: &'a dyn Spawner) -> Result<Self> {
        let run_dir = config.run.run_name.clone();
        Self::with_run_dir(run_dir, config, registry, spawner)
    }

    pub fn with_run_dir(
        run_dir: impl Into<PathBuf>,
        config: AppConfig,
        registry: &'a Registry,
        spawner: &'a dyn Spawner,
    ) -> Result<Self> {
        config.validate()?;
        registry.check(&config)?;
        Ok(Self {
            layout: RunLayout::new(run_dir),
            config,
            registry,
            spawner,
        })
    }

    /// Re-opens an existing run using the config carried by worker 0's handoff.
    pub fn open(run_dir: &Path, registry: &'a Registry, spawner: &'a dyn Spawner) -> Result<Self> {
        let handoff = Handoff::read(&RunLayout::new(run_dir), 0)?;
        Self::with_run_dir(run_dir, handoff.config, registry, spawner)
    }

    pub fn layout(&self) -> &RunLayout {
        &self.layout
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Runs the step recorded in `worker_id`'s handoff inside `run_dir`.
    pub fn step(
        run_dir: &Path,
        worker_id: usize,
        registry: &'a Registry,
        spawner: &'a dyn Spawner,
    ) -> Result<StepOutcome> {
        let handoff = Handoff::read(&RunLayout::new(run_dir), worker_id)?;
        let orchestrator = Self::with_run_dir(run_dir, handoff.config.clone(), registry, spawner)?;
        orchestrator.run_step(handoff)
    }

    pub fn run_step(&self, handoff: Handoff) -> Result<StepOutcome> {
        log::debug!(
            "Worker {} running {:?} step (iteration {})",
            handoff.worker_id,
            handoff.call_type,
            handoff.iteration
        );
        match handoff.call_type {
            CallType::Init => self.init(),
            CallType::RunWorker => self.run_worker(&handoff),
            CallType::Callback => self.select_next(handoff.worker_id),
        }
    }

    /// Writes an INIT handoff and lets a spawned step perform it, so the
    /// calling process can exit immediately.
    pub fn launch(&self) -> Result<()> {
        self.layout.create_dirs()?;
        self.dispatch(&Handoff::init(self.config.clone()))
    }

    /// INIT: creates the run directory, produces one candidate per worker
    /// slot and dispatches them.
    pub fn init(&self) -> Result<StepOutcome> {
        self.layout.create_dirs()?;
        let store = CandidateStore::open(&self.layout)?;
        let width = self.config.run.num_parallel_processes;

        let keys = {
            let _guard = self.lock().acquire()?;
            if RunState::exists(&self.layout) {
                return Err(DgaError::Configuration(format!(
                    "Run {} is already initialised",
                    self.layout.root().display()
                )));
            }

            let mut pool = store.load_pool()?;
            let mut policy = self.registry.create_policy(&self.config, 0, policy_stream(0, 0))?;
            policy.register_views(&mut pool);

            let mut keys = Vec::with_capacity(width);
            for worker_id in 0..width {
                let mut ctx = PolicyContext {
                    pool: &mut pool,
                    store: &store,
                    iteration: 0,
                };
                match policy.fetch_next(&mut ctx)? {
                    FetchOutcome::Ready(key) => keys.push(key),
                    FetchOutcome::NotReady { reason } => {
                        return Err(DgaError::Selection(format!(
                            "No initial candidate for worker {}: {}",
                            worker_id, reason
                        )));
                    }
                }
            }

            let mut state = RunState::new();
            state.dispatched = keys.len() as u64;
            state.save(&self.layout)?;
            keys
        };

        log::info!(
            "Initialised run {} with {} workers",
            self.layout.root().display(),
            keys.len()
        );
        for (worker_id, key) in keys.iter().enumerate() {
            self.dispatch(&Handoff::run_worker(worker_id, key.clone(), 0, self.config.clone()))?;
        }
        Ok(StepOutcome::Started { keys })
    }

    /// DISPATCH_WORKER: persists the handoff and starts the next step.
    pub fn dispatch(&self, handoff: &Handoff) -> Result<()> {
        handoff.write(&self.layout)?;
        self.spawner.spawn(self.layout.root(), handoff.worker_id)
    }

    /// Worker evaluation followed by RECORD_RESULT.
    fn run_worker(&self, handoff: &Handoff) -> Result<StepOutcome> {
        let key = handoff.key()?.clone();
        let store = CandidateStore::open(&self.layout)?;

        // Untested records are only mutated by the worker bound to them.
        let record = store.get(&key)?;
        let mut model = self.registry.create_model(&self.config)?;
        let fitness = model.evaluate(&record.payload)?;

        self.record_result(&store, handoff.worker_id, handoff.iteration, &key, fitness)?;
        log::info!(
            "Worker {} evaluated {} at iteration {}: {:.6}",
            handoff.worker_id,
            key,
            handoff.iteration,
            fitness
        );

        self.dispatch(&Handoff::callback(
            handoff.worker_id,
            key.clone(),
            handoff.iteration,
            self.config.clone(),
        ))?;
        Ok(StepOutcome::Dispatched {
            worker_id: handoff.worker_id,
            call_type: CallType::Callback,
            key,
        })
    }

    /// Writes the fitness straight to the store. No GenePool is built here;
    /// the next SELECT_NEXT reloads the pool and rebuilds its views.
    fn record_result(
        &self,
        store: &CandidateStore,
        worker_id: usize,
        iteration: u64,
        key: &PoolKey,
        fitness: f64,
    ) -> Result<()> {
        let _guard = self.lock().acquire()?;
        let mut record = store.get(key)?;
        record.set_fitness(fitness);
        store.put(key, &record)?;
        RunLog::for_worker(&self.layout, worker_id)
            .append(&LogEntry::from_record(worker_id, iteration, key, &record))
    }

    /// SELECT_NEXT: advances the iteration counter, then asks the policy for
    /// a candidate, retrying after `retry_delay` until one is ready.
    fn select_next(&self, worker_id: usize) -> Result<StepOutcome> {
        let budget = self.config.run.iterations;
        let store = CandidateStore::open(&self.layout)?;
        let lock = self.lock();

        let iteration = {
            let _guard = lock.acquire()?;
            let mut state = RunState::load(&self.layout)?;
            state.iteration += 1;
            state.save(&self.layout)?;
            state.iteration
        };
        if iteration >= budget {
            log::info!("Worker {} finished: iteration budget {} reached", worker_id, budget);
            return Ok(StepOutcome::Done { iteration });
        }

        loop {
            let guard = lock.acquire()?;
            let mut state = RunState::load(&self.layout)?;
            if state.iteration >= budget {
                log::info!("Worker {} finished while waiting for a candidate", worker_id);
                return Ok(StepOutcome::Done { iteration: state.iteration });
            }

            let mut pool = store.load_pool()?;
            let mut policy = self.registry.create_policy(
                &self.config,
                iteration,
                policy_stream(iteration, worker_id),
            )?;
            policy.register_views(&mut pool);
            let mut ctx = PolicyContext {
                pool: &mut pool,
                store: &store,
                iteration,
            };

            match policy.fetch_next(&mut ctx)? {
                FetchOutcome::Ready(key) => {
                    state.dispatched += 1;
                    state.save(&self.layout)?;
                    drop(guard);

                    self.dispatch(&Handoff::run_worker(
                        worker_id,
                        key.clone(),
                        iteration,
                        self.config.clone(),
                    ))?;
                    return Ok(StepOutcome::Dispatched {
                        worker_id,
                        call_type: CallType::RunWorker,
                        key,
                    });
                }
                FetchOutcome::NotReady { reason } => {
                    drop(guard);
                    log::debug!("Worker {} waiting: {}", worker_id, reason);
                    std::thread::sleep(self.config.run.retry_delay());
                }
            }
        }
    }

    pub fn status(&self) -> Result<RunSummary> {
        let store = CandidateStore::open(&self.layout)?;
        let _guard = self.lock().acquire()?;
        let state = RunState::load(&self.layout)?;
        let pool = store.load_pool()?;
        Ok(RunSummary::from_pool(&self.layout, &pool, &state, self.config.run.iterations))
    }

    fn lock(&self) -> PoolLock {
        PoolLock::new(
            self.layout.lock_path(),
            self.config.run.lock_timeout(),
            self.config.run.lock_poll(),
        )
    }
}

/// Distinct RNG stream per (iteration, worker) step.
fn policy_stream(iteration: u64, worker_id: usize) -> u64 {
    iteration.wrapping_mul(0x1_0000).wrapping_add(worker_id as u64)
}
