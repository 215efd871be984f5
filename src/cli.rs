use crate::config::{AppConfig, ConfigManager};
use crate::orchestration::{LocalRunner, Orchestrator, ProcessSpawner, StepOutcome};
use crate::registry::Registry;
use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "distga")]
#[command(version, about = "Distributed genetic algorithm coordinator")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialise a run and dispatch the first workers
    Start {
        /// TOML configuration file
        #[arg(short, long)]
        config: PathBuf,

        /// Hand INIT to a spawned step and return immediately
        #[arg(long)]
        detach: bool,
    },

    /// Execute one process step from a worker's handoff record
    Step {
        /// Run directory
        #[arg(short, long)]
        run: PathBuf,

        /// Worker slot whose handoff to load
        #[arg(short, long)]
        worker: usize,
    },

    /// Run the whole loop in this process without spawning workers
    Local {
        /// TOML configuration file
        #[arg(short, long)]
        config: PathBuf,
    },

    /// Print a summary of a run
    Status {
        /// Run directory
        #[arg(short, long)]
        run: PathBuf,
    },
}

/// Parses the command line and runs it against `registry`.
///
/// Embedders with their own policies or models register them and call this
/// from their `main`.
pub fn run_with(registry: Registry) -> anyhow::Result<()> {
    execute(Cli::parse(), &registry)
}

pub fn execute(cli: Cli, registry: &Registry) -> anyhow::Result<()> {
    let spawner = ProcessSpawner;
    match cli.command {
        Commands::Start { config, detach } => {
            let config = load_config(&config)?;
            let orchestrator = Orchestrator::new(config, registry, &spawner)?;
            if detach {
                orchestrator.launch()?;
                println!("Launched run {}", orchestrator.layout().root().display());
            } else if let StepOutcome::Started { keys } = orchestrator.init()? {
                println!(
                    "Started run {} with {} workers",
                    orchestrator.layout().root().display(),
                    keys.len()
                );
            }
        }
        Commands::Step { run, worker } => {
            let outcome = Orchestrator::step(&run, worker, registry, &spawner)
                .with_context(|| format!("Step for worker {} in {} failed", worker, run.display()))?;
            log::debug!("Step outcome: {:?}", outcome);
        }
        Commands::Local { config } => {
            let config = load_config(&config)?;
            let summary = LocalRunner::new(config, registry)?.run()?;
            println!("{}", summary);
        }
        Commands::Status { run } => {
            let orchestrator = Orchestrator::open(&run, registry, &spawner)?;
            println!("{}", orchestrator.status()?);
        }
    }
    Ok(())
}

fn load_config(path: &Path) -> anyhow::Result<AppConfig> {
    let manager = ConfigManager::new();
    manager
        .load_from_file(path)
        .with_context(|| format!("Failed to load config {}", path.display()))?;
    Ok(manager.get()?)
}
