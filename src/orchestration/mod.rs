pub mod handoff;
pub mod local;
pub mod orchestrator;
pub mod spawner;
pub mod state;

pub use handoff::{CallType, Handoff};
pub use local::LocalRunner;
pub use orchestrator::{Orchestrator, RunSummary, StepOutcome};
pub use spawner::{ProcessSpawner, Spawner};
pub use state::RunState;
